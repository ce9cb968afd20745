//! Rules configuration loader.

use std::path::Path;

use anyhow::{Context, ensure};
use saga_core::RulesConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`RulesConfig`] from TOML files. Keys left out keep their
/// default values.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<RulesConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<RulesConfig> {
        let config: RulesConfig =
            toml::from_str(content).context("failed to parse config TOML")?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &RulesConfig) -> LoadResult<()> {
    let point_buy = &config.point_buy;
    ensure!(
        point_buy.min_score <= point_buy.max_score,
        "point_buy.min_score {} exceeds max_score {}",
        point_buy.min_score,
        point_buy.max_score
    );
    let span = (point_buy.max_score - point_buy.min_score + 1) as usize;
    ensure!(
        point_buy.costs.len() == span,
        "point_buy.costs has {} entries, expected {span}",
        point_buy.costs.len()
    );
    ensure!(config.feat_interval > 0, "feat_interval must be positive");
    ensure!(
        config.ability_increase_interval > 0,
        "ability_increase_interval must be positive"
    );
    Ok(())
}
