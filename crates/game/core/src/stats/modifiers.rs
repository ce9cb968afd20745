//! Modifier aggregation.
//!
//! Modifier records are transient: every pass re-collects them from equipped
//! gear, feats, talents, species, the condition track and active effects,
//! groups them by target path and resolves stacking per mode:
//!
//! - `add`: summed
//! - `max`: only the largest contributor counts
//! - `override`: the last one collected wins and replaces everything else
//!
//! When a target mixes modes without an override, the result is
//! `sum(add) + max(max)`. Collection order is fixed (gear, feats, talents,
//! species, condition, effects) so override resolution is deterministic.

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

use super::DerivationWarning;
use crate::env::{Defense, RulesEnv};
use crate::state::{PrimaryState, normalize_key};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModifierMode {
    #[default]
    Add,
    Override,
    Max,
}

/// Gate evaluated against primary state when the modifier is collected.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModifierCondition {
    ConditionStepAtLeast(u8),
    ConditionStepAtMost(u8),
    SkillTrained(String),
}

impl ModifierCondition {
    pub fn holds(&self, primary: &PrimaryState) -> bool {
        match self {
            ModifierCondition::ConditionStepAtLeast(step) => {
                primary.condition_track.current() >= *step
            }
            ModifierCondition::ConditionStepAtMost(step) => {
                primary.condition_track.current() <= *step
            }
            ModifierCondition::SkillTrained(key) => primary.is_trained(key),
        }
    }
}

/// Authored modifier as it appears on a feat, talent, species, item or effect.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSpec {
    /// Dotted target path, e.g. `defenses.reflex` or `skills.pilot`.
    pub target: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: ModifierMode,
    pub value: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub condition: Option<ModifierCondition>,
}

impl ModifierSpec {
    pub fn new(target: impl Into<String>, mode: ModifierMode, value: i32) -> Self {
        Self {
            target: target.into(),
            mode,
            value,
            condition: None,
        }
    }

    pub fn add(target: impl Into<String>, value: i32) -> Self {
        Self::new(target, ModifierMode::Add, value)
    }

    pub fn max(target: impl Into<String>, value: i32) -> Self {
        Self::new(target, ModifierMode::Max, value)
    }

    pub fn with_condition(mut self, condition: ModifierCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Stat a modifier applies to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetPath {
    Defense(Defense),
    AllDefenses,
    Skill(String),
    AllSkills,
    HpMax,
    Bab,
    AttackMelee,
    AttackRanged,
    AttackAll,
    Damage,
    Speed,
}

impl TargetPath {
    /// Parses a dotted path. Returns `None` for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        let (head, tail) = match raw.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (raw.as_str(), None),
        };
        match (head, tail) {
            ("defense" | "defenses", None | Some("all")) => Some(TargetPath::AllDefenses),
            ("defense" | "defenses", Some(which)) => {
                which.parse::<Defense>().ok().map(TargetPath::Defense)
            }
            ("skill" | "skills", None | Some("all")) => Some(TargetPath::AllSkills),
            ("skill" | "skills", Some(key)) => {
                let key = normalize_key(key);
                (!key.is_empty()).then_some(TargetPath::Skill(key))
            }
            ("hp", Some("max")) => Some(TargetPath::HpMax),
            ("bab", None) => Some(TargetPath::Bab),
            ("attack" | "attacks", None | Some("all")) => Some(TargetPath::AttackAll),
            ("attack" | "attacks", Some("melee")) => Some(TargetPath::AttackMelee),
            ("attack" | "attacks", Some("ranged")) => Some(TargetPath::AttackRanged),
            ("damage", None) => Some(TargetPath::Damage),
            ("speed", None) => Some(TargetPath::Speed),
            _ => None,
        }
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetPath::Defense(defense) => write!(f, "defenses.{defense}"),
            TargetPath::AllDefenses => f.write_str("defenses.all"),
            TargetPath::Skill(key) => write!(f, "skills.{key}"),
            TargetPath::AllSkills => f.write_str("skills.all"),
            TargetPath::HpMax => f.write_str("hp.max"),
            TargetPath::Bab => f.write_str("bab"),
            TargetPath::AttackMelee => f.write_str("attack.melee"),
            TargetPath::AttackRanged => f.write_str("attack.ranged"),
            TargetPath::AttackAll => f.write_str("attack.all"),
            TargetPath::Damage => f.write_str("damage"),
            TargetPath::Speed => f.write_str("speed"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
    Equipment,
    Feat,
    Talent,
    Species,
    Condition,
    Effect,
}

/// Where a collected modifier came from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModifierSource {
    pub kind: SourceKind,
    pub id: String,
}

impl fmt::Display for ModifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// One collected, parsed modifier record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modifier {
    pub source: ModifierSource,
    pub target: TargetPath,
    pub mode: ModifierMode,
    pub value: i32,
}

/// Contributions to a single target, resolved by [`ModifierStack::resolve`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModifierStack {
    adds: Vec<i32>,
    maxes: Vec<i32>,
    override_value: Option<i32>,
}

impl ModifierStack {
    pub fn push(&mut self, mode: ModifierMode, value: i32) {
        match mode {
            ModifierMode::Add => self.adds.push(value),
            ModifierMode::Max => self.maxes.push(value),
            ModifierMode::Override => self.override_value = Some(value),
        }
    }

    pub fn resolve(&self) -> i32 {
        if let Some(value) = self.override_value {
            return value;
        }
        let sum: i32 = self.adds.iter().sum();
        let max = self.maxes.iter().copied().max().unwrap_or(0);
        sum + max
    }

    pub fn is_override(&self) -> bool {
        self.override_value.is_some()
    }
}

/// Resolved modifiers per target path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModifierMap {
    stacks: BTreeMap<TargetPath, ModifierStack>,
}

impl ModifierMap {
    pub fn push(&mut self, modifier: &Modifier) {
        self.stacks
            .entry(modifier.target.clone())
            .or_default()
            .push(modifier.mode, modifier.value);
    }

    /// Folds the stacks for `targets` into `base`.
    ///
    /// An override on any of the targets replaces `base` and every other
    /// contribution; earlier targets take precedence over later ones, so the
    /// specific path goes first and the catch-all (`defenses.all`) after it.
    pub fn apply(&self, targets: &[TargetPath], base: i32) -> i32 {
        let stacks: Vec<&ModifierStack> = targets
            .iter()
            .filter_map(|target| self.stacks.get(target))
            .collect();
        if let Some(stack) = stacks.iter().find(|stack| stack.is_override()) {
            return stack.resolve();
        }
        base + stacks.iter().map(|stack| stack.resolve()).sum::<i32>()
    }

    pub fn defense(&self, defense: Defense, base: i32) -> i32 {
        self.apply(&[TargetPath::Defense(defense), TargetPath::AllDefenses], base)
    }

    pub fn skill(&self, key: &str, base: i32) -> i32 {
        self.apply(
            &[TargetPath::Skill(normalize_key(key)), TargetPath::AllSkills],
            base,
        )
    }

    pub fn attack(&self, ranged: bool, base: i32) -> i32 {
        let specific = if ranged {
            TargetPath::AttackRanged
        } else {
            TargetPath::AttackMelee
        };
        self.apply(&[specific, TargetPath::AttackAll], base)
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

/// Output of [`aggregate`].
#[derive(Clone, Debug, Default)]
pub struct Aggregation {
    pub map: ModifierMap,
    pub applied: Vec<Modifier>,
    pub warnings: Vec<DerivationWarning>,
}

struct Collector<'p> {
    primary: &'p PrimaryState,
    seen: BTreeSet<(ModifierSource, usize)>,
    out: Aggregation,
}

impl Collector<'_> {
    fn collect<'s>(
        &mut self,
        source: ModifierSource,
        specs: impl IntoIterator<Item = &'s ModifierSpec>,
    ) {
        for (index, spec) in specs.into_iter().enumerate() {
            if !self.seen.insert((source.clone(), index)) {
                continue;
            }
            if spec
                .condition
                .as_ref()
                .is_some_and(|condition| !condition.holds(self.primary))
            {
                continue;
            }
            let Some(target) = TargetPath::parse(&spec.target) else {
                self.out.warnings.push(DerivationWarning::MalformedModifier {
                    source: source.to_string(),
                    target: spec.target.clone(),
                });
                continue;
            };
            let modifier = Modifier {
                source: source.clone(),
                target,
                mode: spec.mode,
                value: spec.value,
            };
            self.out.map.push(&modifier);
            self.out.applied.push(modifier);
        }
    }
}

/// Collects and resolves every active modifier on `primary`.
pub fn aggregate(primary: &PrimaryState, env: &RulesEnv<'_>) -> Aggregation {
    let tables = env.tables();
    let mut collector = Collector {
        primary,
        seen: BTreeSet::new(),
        out: Aggregation::default(),
    };

    for item in primary
        .items
        .iter()
        .filter(|item| item.item_type.is_gear() && item.equipped)
    {
        collector.collect(
            ModifierSource {
                kind: SourceKind::Equipment,
                id: item.id.to_string(),
            },
            &item.modifiers,
        );
    }

    for (key, grant) in primary.feats.iter() {
        match tables.feat_or_base(&grant.name) {
            Some(def) => collector.collect(
                ModifierSource {
                    kind: SourceKind::Feat,
                    id: key.to_string(),
                },
                &def.modifiers,
            ),
            None => collector.out.warnings.push(DerivationWarning::MissingFeat {
                name: key.to_string(),
            }),
        }
    }

    for (key, _) in primary.talents.iter() {
        match tables.talent(key) {
            Some(def) => collector.collect(
                ModifierSource {
                    kind: SourceKind::Talent,
                    id: key.to_string(),
                },
                &def.modifiers,
            ),
            None => collector.out.warnings.push(DerivationWarning::MissingTalent {
                name: key.to_string(),
            }),
        }
    }

    if let Some(species_id) = primary.species.as_deref() {
        match tables.species(species_id) {
            Some(def) => collector.collect(
                ModifierSource {
                    kind: SourceKind::Species,
                    id: normalize_key(species_id),
                },
                &def.modifiers,
            ),
            None => collector.out.warnings.push(DerivationWarning::MissingSpecies {
                species_id: species_id.to_string(),
            }),
        }
    }

    let penalty = primary
        .condition_track
        .penalty(&env.config().condition_penalties);
    if penalty != 0 {
        let specs = [
            ModifierSpec::add("defenses.all", penalty),
            ModifierSpec::add("skills.all", penalty),
            ModifierSpec::add("attack.all", penalty),
        ];
        collector.collect(
            ModifierSource {
                kind: SourceKind::Condition,
                id: "condition_track".to_string(),
            },
            &specs,
        );
    }

    for (index, effect) in primary.effects.iter().enumerate() {
        if effect.disabled {
            continue;
        }
        // An effect whose granting item is gone no longer applies.
        if effect
            .origin
            .is_some_and(|origin| primary.item(origin).is_none())
        {
            continue;
        }
        collector.collect(
            ModifierSource {
                kind: SourceKind::Effect,
                id: format!("{index}:{}", normalize_key(&effect.label)),
            },
            &effect.modifiers,
        );
    }

    collector.out
}
