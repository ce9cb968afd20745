//! Data-driven rule content and loaders.
//!
//! This crate turns rule data files into the read-only collaborators the core
//! engine is constructed with:
//! - Rule tables: species, backgrounds, classes, feats, talents, skills,
//!   force powers and gear (RON or TOML)
//! - Rules configuration: point-buy, HP policy, milestones, penalties (TOML)
//!
//! Content is consumed through `saga_core::RuleTables` and
//! `saga_core::ItemCatalog` and never appears in character state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult, TableFormat, TablesLoader};
