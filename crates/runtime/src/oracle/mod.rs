//! Shared read-only rule content.
//!
//! [`OracleBundle`] owns the rule tables and configuration behind `Arc`s so
//! every character worker can build a [`RulesEnv`] on demand without copying
//! content. The data is immutable at runtime; characters live in repositories.

use std::path::Path;
use std::sync::Arc;

use saga_content::ContentFactory;
use saga_core::{RulesConfig, RulesEnv, StaticRuleTables};

use crate::api::Result;

#[derive(Clone, Debug)]
pub struct OracleBundle {
    tables: Arc<StaticRuleTables>,
    config: Arc<RulesConfig>,
}

impl OracleBundle {
    pub fn new(tables: StaticRuleTables, config: RulesConfig) -> Self {
        Self {
            tables: Arc::new(tables),
            config: Arc::new(config),
        }
    }

    /// Loads tables and configuration from a content directory.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let factory = ContentFactory::new(data_dir.as_ref());
        let tables = factory.load_tables()?;
        let config = factory.load_config()?;
        Ok(Self::new(tables, config))
    }

    /// The tables double as the item catalog.
    pub fn env(&self) -> RulesEnv<'_> {
        RulesEnv::from_static(&self.tables, &self.config)
    }

    pub fn tables(&self) -> &StaticRuleTables {
        &self.tables
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }
}
