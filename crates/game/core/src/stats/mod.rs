//! Derived attribute pipeline.
//!
//! ```text
//! [ primary state ] ──► compute_base ──► [ base block ]
//!        │                                    │
//!        └──► aggregate (modifiers) ──► apply_modifiers ──► [ derived block ]
//! ```
//!
//! ## Principles
//!
//! 1. **Primary is the only truth**: the derived block is rebuilt, never edited
//! 2. **Best-effort**: bad table data yields a warning and a default, not an error
//! 3. **Deterministic**: pure functions over primary state and injected tables
//! 4. **Guarded**: [`Recalculator`] refuses nested recomputes and defers while
//!    a mutation context is open

pub mod conditions;
pub mod derived;
pub mod kind;
pub mod modifiers;
pub mod recalc;
mod warning;

pub use conditions::{ConditionTrack, HELPLESS_STEP};
pub use derived::{
    ActionEntry, AttackEntry, ClassSummary, ConditionSummary, DefenseScore, Defenses, DerivedBlock,
    DerivedHp, Encumbrance, Identity, LoadState, SkillEntry, apply_modifiers, compute_all,
    compute_base, refresh_projections,
};
pub use kind::KindStrategy;
pub use modifiers::{
    Aggregation, Modifier, ModifierCondition, ModifierMap, ModifierMode, ModifierSource,
    ModifierSpec, ModifierStack, SourceKind, TargetPath, aggregate,
};
pub use recalc::{DerivationError, DerivedHook, RecalcGuard, RecalcStatus, Recalculator};
pub use warning::DerivationWarning;
