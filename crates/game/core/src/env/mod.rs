//! Read-only rule data injected into the engine.
//!
//! Rule tables, the item catalog and the rules configuration are supplied by
//! the caller at construction time. [`RulesEnv`] bundles borrowed references
//! to them so calculators and the progression engine can reach everything
//! without depending on concrete implementations.
mod items;
mod static_tables;
mod tables;

pub use items::{EmptyCatalog, ItemCatalog};
pub use static_tables::{GearDef, PowerDef, RuleTablesData, StaticRuleTables};
pub use tables::{
    BabProgression, BackgroundDef, ClassDef, ClassDefenses, Defense, DefenseCategory, FeatDef,
    RuleTables, SkillDef, SpeciesDef, TalentDef, split_argument,
};

use crate::config::RulesConfig;

/// Borrowed rule tables, item catalog and configuration.
#[derive(Clone, Copy)]
pub struct RulesEnv<'a> {
    tables: &'a dyn RuleTables,
    items: &'a dyn ItemCatalog,
    config: &'a RulesConfig,
}

impl<'a> RulesEnv<'a> {
    pub fn new(
        tables: &'a dyn RuleTables,
        items: &'a dyn ItemCatalog,
        config: &'a RulesConfig,
    ) -> Self {
        Self {
            tables,
            items,
            config,
        }
    }

    /// Uses one [`StaticRuleTables`] as both tables and item catalog.
    pub fn from_static(tables: &'a StaticRuleTables, config: &'a RulesConfig) -> Self {
        Self::new(tables, tables, config)
    }

    pub fn tables(&self) -> &'a dyn RuleTables {
        self.tables
    }

    pub fn items(&self) -> &'a dyn ItemCatalog {
        self.items
    }

    pub fn config(&self) -> &'a RulesConfig {
        self.config
    }
}

impl std::fmt::Debug for RulesEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesEnv")
            .field("skills", &self.tables.skills().len())
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
