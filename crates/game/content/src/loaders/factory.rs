//! Content factory for building rule collaborators from a data directory.

use std::path::{Path, PathBuf};

use anyhow::bail;
use saga_core::{RulesConfig, StaticRuleTables};

use crate::loaders::{ConfigLoader, LoadResult, TablesLoader};

/// Content factory that loads all rule content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml          (optional)
/// └── tables.ron | tables.toml
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load rules configuration from `config.toml`, falling back to the
    /// default rule set when the file is absent.
    pub fn load_config(&self) -> LoadResult<RulesConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using default rules");
            return Ok(RulesConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load rule tables from `tables.ron`, or `tables.toml` if there is no
    /// RON file.
    pub fn load_tables(&self) -> LoadResult<StaticRuleTables> {
        for name in ["tables.ron", "tables.toml"] {
            let path = self.data_dir.join(name);
            if path.exists() {
                return TablesLoader::load(&path);
            }
        }
        bail!("no tables.ron or tables.toml in {}", self.data_dir.display())
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
