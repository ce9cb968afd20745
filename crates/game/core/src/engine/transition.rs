//! Step transition dispatch and per-step validation.
//!
//! Confirm steps never touch primary state directly. Each one runs against a
//! copy of the progression bookkeeping; the engine commits that copy only if
//! every phase passed.

use std::collections::{BTreeMap, BTreeSet};

use strum::IntoEnumIterator;

use crate::env::{ClassDef, RulesEnv};
use crate::prereq::{self, PrereqKind};
use crate::state::{
    Ability, PendingClass, PendingSelections, PendingSkill, PendingSpecies, PrimaryState,
    ProgressionState, Step, normalize_key,
};

use super::action::{
    ConfirmAbilities, ConfirmAbilityIncreases, ConfirmBackground, ConfirmClass, ConfirmFeats,
    ConfirmSkills, ConfirmSpecies, ConfirmTalents, ProgressionAction,
};
use super::errors::{
    PrerequisiteError, PrerequisiteFailure, ProgressionError, TransitionPhase,
    TransitionPhaseError, ValidationError,
};
use super::stage::{budgets, skill_key, stage_selections};

/// Read-only facts a step validates against.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Committed primary state; pending selections live on the progression.
    pub primary: &'a PrimaryState,
    pub env: RulesEnv<'a>,
}

/// How one confirm step validates and records its payload.
///
/// `apply` only writes to the progression copy it is handed. `post_validate`
/// sees the progression with the new pending value in place, which is where
/// checks that depend on the staged character belong.
pub trait StepTransition {
    const STEP: Step;

    fn pre_validate(
        &self,
        _ctx: &StepContext<'_>,
        _progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        Ok(())
    }

    fn apply(
        &self,
        ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError>;

    fn post_validate(
        &self,
        _ctx: &StepContext<'_>,
        _progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        Ok(())
    }
}

/// Runs a transition through pre_validate → apply → post_validate.
#[inline]
fn drive_transition<T>(
    transition: &T,
    ctx: &StepContext<'_>,
    progression: &mut ProgressionState,
) -> Result<(), TransitionPhaseError<ProgressionError>>
where
    T: StepTransition,
{
    transition
        .pre_validate(ctx, progression)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PreValidate, error))?;

    transition
        .apply(ctx, progression)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::Apply, error))?;

    transition
        .post_validate(ctx, progression)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PostValidate, error))
}

/// Routes an action to its transition.
pub(super) fn execute_transition(
    action: &ProgressionAction,
    ctx: &StepContext<'_>,
    progression: &mut ProgressionState,
) -> Result<(), TransitionPhaseError<ProgressionError>> {
    match action {
        ProgressionAction::ConfirmSpecies(step) => drive_transition(step, ctx, progression),
        ProgressionAction::ConfirmBackground(step) => drive_transition(step, ctx, progression),
        ProgressionAction::ConfirmAbilities(step) => drive_transition(step, ctx, progression),
        ProgressionAction::ConfirmClass(step) => drive_transition(step, ctx, progression),
        ProgressionAction::ConfirmSkills(step) => drive_transition(step, ctx, progression),
        ProgressionAction::ConfirmFeats(step) => drive_transition(step, ctx, progression),
        ProgressionAction::ConfirmTalents(step) => drive_transition(step, ctx, progression),
        ProgressionAction::ConfirmAbilityIncreases(step) => {
            drive_transition(step, ctx, progression)
        }
    }
}

/// Class being gained in this progression.
fn pending_class<'a>(
    ctx: &StepContext<'a>,
    pending: &PendingSelections,
    step: Step,
) -> Result<&'a ClassDef, ProgressionError> {
    let class = pending
        .class
        .as_ref()
        .ok_or_else(|| ValidationError::step_order(step, Step::Class))?;
    ctx.env
        .tables()
        .class(&class.class_id)
        .ok_or_else(|| ValidationError::unknown("class", &class.class_id).into())
}

// ---------------------------------------------------------------------------
// species / background / abilities
// ---------------------------------------------------------------------------

impl StepTransition for ConfirmSpecies {
    const STEP: Step = Step::Species;

    fn pre_validate(
        &self,
        ctx: &StepContext<'_>,
        _progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let def = ctx
            .env
            .tables()
            .species(&self.species_id)
            .ok_or_else(|| ValidationError::unknown("species", &self.species_id))?;
        match (def.free_ability_bonus, self.free_ability) {
            (Some(_), None) => Err(ValidationError::malformed(format!(
                "{} requires a free ability choice",
                def.name
            ))
            .into()),
            (None, Some(ability)) => Err(ValidationError::malformed(format!(
                "{} has no free ability bonus to assign to {ability}",
                def.name
            ))
            .into()),
            _ => Ok(()),
        }
    }

    fn apply(
        &self,
        ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError> {
        let def = ctx
            .env
            .tables()
            .species(&self.species_id)
            .ok_or_else(|| ValidationError::unknown("species", &self.species_id))?;
        progression.mark_confirmed(Self::STEP);
        progression.pending.species = Some(PendingSpecies {
            species_id: def.id.clone(),
            free_ability: self.free_ability,
        });
        Ok(())
    }
}

impl StepTransition for ConfirmBackground {
    const STEP: Step = Step::Background;

    fn apply(
        &self,
        ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError> {
        let def = ctx
            .env
            .tables()
            .background(&self.background_id)
            .ok_or_else(|| ValidationError::unknown("background", &self.background_id))?;
        progression.mark_confirmed(Self::STEP);
        progression.pending.background = Some(def.id.clone());
        Ok(())
    }
}

impl StepTransition for ConfirmAbilities {
    const STEP: Step = Step::Abilities;

    fn pre_validate(
        &self,
        ctx: &StepContext<'_>,
        _progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let rules = &ctx.env.config().point_buy;
        let mut spent = 0u32;
        for ability in Ability::iter() {
            let score = *self.scores.get(&ability).ok_or_else(|| {
                ValidationError::malformed(format!("missing score for {ability}"))
            })?;
            let cost = rules.cost_of(score).ok_or_else(|| {
                ValidationError::malformed(format!(
                    "{ability} {score} outside {}..={}",
                    rules.min_score, rules.max_score
                ))
                .with_detail("ability", ability)
            })?;
            spent += cost;
        }
        if spent > rules.budget {
            return Err(ValidationError::budget("point-buy", spent, rules.budget).into());
        }
        Ok(())
    }

    fn apply(
        &self,
        _ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError> {
        progression.mark_confirmed(Self::STEP);
        progression.pending.abilities = Some(self.scores.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// class
// ---------------------------------------------------------------------------

impl ConfirmClass {
    /// Multiclass feat to grant, if any. Only a class new to an already
    /// classed character asks for one.
    fn resolve_multiclass_feat(
        &self,
        def: &ClassDef,
        staged: &PrimaryState,
    ) -> Result<Option<String>, ProgressionError> {
        if staged.class_levels.is_empty() || staged.has_class(&def.id) {
            return match &self.multiclass_feat {
                Some(feat) => Err(ValidationError::not_allowed(format!(
                    "multiclass feat '{feat}' only applies when adding a new class"
                ))
                .into()),
                None => Ok(None),
            };
        }

        let options: Vec<&String> = def
            .multiclass_feats
            .iter()
            .filter(|feat| !staged.feats.contains(feat))
            .collect();
        if options.is_empty() {
            return Ok(None);
        }
        let listed = options
            .iter()
            .map(|feat| feat.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let Some(choice) = &self.multiclass_feat else {
            return Err(ValidationError::malformed(format!(
                "{} requires a multiclass feat: one of {listed}",
                def.name
            ))
            .into());
        };
        let key = normalize_key(choice);
        options
            .iter()
            .find(|feat| normalize_key(feat) == key)
            .map(|feat| Some((*feat).clone()))
            .ok_or_else(|| {
                ValidationError::not_allowed(format!(
                    "'{choice}' is not an available multiclass feat for {} ({listed})",
                    def.name
                ))
                .into()
            })
    }
}

impl StepTransition for ConfirmClass {
    const STEP: Step = Step::Class;

    fn pre_validate(
        &self,
        ctx: &StepContext<'_>,
        progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let def = ctx
            .env
            .tables()
            .class(&self.class_id)
            .ok_or_else(|| ValidationError::unknown("class", &self.class_id))?;

        let mut upstream = progression.pending.clone();
        upstream.clear(Step::Class.downstream() | Step::Class.flag());
        let staged = stage_selections(ctx.primary, &upstream, &ctx.env).staged(ctx.primary);

        if let Some(expression) = def.prerequisites.as_deref() {
            let outcome = prereq::check_staged(PrereqKind::Class, expression, &staged, &ctx.env);
            if !outcome.valid {
                return Err(PrerequisiteError {
                    failures: vec![PrerequisiteFailure {
                        subject: def.name.clone(),
                        missing: outcome.missing,
                    }],
                }
                .into());
            }
        }
        self.resolve_multiclass_feat(def, &staged).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError> {
        let def = ctx
            .env
            .tables()
            .class(&self.class_id)
            .ok_or_else(|| ValidationError::unknown("class", &self.class_id))?;

        progression.mark_confirmed(Self::STEP);
        progression.pending.class = None;
        let staged = stage_selections(ctx.primary, &progression.pending, &ctx.env)
            .staged(ctx.primary);
        let multiclass_feat = self.resolve_multiclass_feat(def, &staged)?;
        let first_class = ctx.primary.class_levels.is_empty();
        let budget = budgets(ctx.primary, &progression.pending, def, &ctx.env);

        progression.pending.class = Some(PendingClass {
            class_id: def.id.clone(),
            skill_points_budget: budget.skill_points,
            starting_feats: if first_class {
                def.starting_feats.clone()
            } else {
                Vec::new()
            },
            multiclass_feat,
        });
        tracing::debug!(
            class = %def.id,
            skill_points = budget.skill_points,
            feats = budget.feats,
            talents = budget.talents,
            "class budgets computed"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// skills
// ---------------------------------------------------------------------------

impl ConfirmSkills {
    /// Folds the mixed input shapes into `{key, ranks}` entries, merging
    /// repeats of the same skill.
    fn normalized(
        &self,
        ctx: &StepContext<'_>,
        class: &ClassDef,
    ) -> Result<Vec<PendingSkill>, ProgressionError> {
        let tables = ctx.env.tables();
        let mut merged: BTreeMap<String, u32> = BTreeMap::new();
        for entry in &self.entries {
            let name = entry.key();
            let def = tables
                .skill(name)
                .ok_or_else(|| ValidationError::unknown("skill", name))?;
            if entry.ranks() == 0 {
                return Err(
                    ValidationError::malformed(format!("{} has zero ranks", def.label)).into(),
                );
            }
            if !class.is_class_skill(&def.key) {
                return Err(ValidationError::not_allowed(format!(
                    "{} is not a class skill for {}",
                    def.label, class.name
                ))
                .into());
            }
            *merged.entry(skill_key(tables, name)).or_default() += entry.ranks();
        }
        Ok(merged
            .into_iter()
            .map(|(key, ranks)| PendingSkill { key, ranks })
            .collect())
    }
}

impl StepTransition for ConfirmSkills {
    const STEP: Step = Step::Skills;

    fn pre_validate(
        &self,
        ctx: &StepContext<'_>,
        progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let class = pending_class(ctx, &progression.pending, Self::STEP)?;
        let budget = progression
            .pending
            .class
            .as_ref()
            .map_or(0, |pending| pending.skill_points_budget);
        let spent: u32 = self
            .normalized(ctx, class)?
            .iter()
            .map(|skill| skill.ranks)
            .sum();
        if spent > budget {
            return Err(ValidationError::budget("skill", spent, budget).into());
        }
        Ok(())
    }

    fn apply(
        &self,
        ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError> {
        let class = pending_class(ctx, &progression.pending, Self::STEP)?;
        let skills = self.normalized(ctx, class)?;
        progression.mark_confirmed(Self::STEP);
        progression.pending.skills = skills;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// feats / talents
// ---------------------------------------------------------------------------

fn feats_of(pending: &mut PendingSelections) -> &mut Vec<String> {
    &mut pending.feats
}

fn talents_of(pending: &mut PendingSelections) -> &mut Vec<String> {
    &mut pending.talents
}

/// Evaluates each pick against the staged character holding every pending
/// selection plus only the picks listed before it.
fn ordered_failures(
    kind: PrereqKind,
    primary: &PrimaryState,
    pending: &PendingSelections,
    env: &RulesEnv<'_>,
    picks: fn(&mut PendingSelections) -> &mut Vec<String>,
) -> Vec<PrerequisiteFailure> {
    let tables = env.tables();
    let mut view = pending.clone();
    let chosen = std::mem::take(picks(&mut view));

    let mut failures = Vec::new();
    for name in &chosen {
        let expression = match kind {
            PrereqKind::Talent => tables
                .talent(name)
                .and_then(|def| def.prerequisites.as_deref()),
            PrereqKind::Feat | PrereqKind::Class => tables
                .feat_or_base(name)
                .and_then(|def| def.prerequisites.as_deref()),
        };
        if let Some(expression) = expression {
            let outcome = prereq::check(kind, expression, primary, &view, env);
            if !outcome.valid {
                failures.push(PrerequisiteFailure {
                    subject: name.clone(),
                    missing: outcome.missing,
                });
            }
        }
        picks(&mut view).push(name.clone());
    }
    failures
}

/// Re-checks every pending feat and talent prerequisite.
pub(super) fn check_choice_prerequisites(
    primary: &PrimaryState,
    pending: &PendingSelections,
    env: &RulesEnv<'_>,
) -> Result<(), PrerequisiteError> {
    let mut failures = ordered_failures(PrereqKind::Feat, primary, pending, env, feats_of);
    failures.extend(ordered_failures(
        PrereqKind::Talent,
        primary,
        pending,
        env,
        talents_of,
    ));
    if failures.is_empty() {
        Ok(())
    } else {
        Err(PrerequisiteError { failures })
    }
}

/// Rejects repeats of non-repeatable picks, within the payload or against
/// what the staged character already has.
fn reject_duplicates<'n>(
    names: impl IntoIterator<Item = (&'n String, bool)>,
    owned: impl Fn(&str) -> bool,
) -> Result<(), ProgressionError> {
    let mut seen = BTreeSet::new();
    for (name, repeatable) in names {
        if repeatable {
            continue;
        }
        if !seen.insert(normalize_key(name)) || owned(name) {
            return Err(ValidationError::malformed(format!("'{name}' is already taken"))
                .with_detail("name", name)
                .into());
        }
    }
    Ok(())
}

impl StepTransition for ConfirmFeats {
    const STEP: Step = Step::Feats;

    fn pre_validate(
        &self,
        ctx: &StepContext<'_>,
        progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let tables = ctx.env.tables();
        let class = pending_class(ctx, &progression.pending, Self::STEP)?;

        let mut picks = Vec::with_capacity(self.feats.len());
        for name in &self.feats {
            let def = tables
                .feat_or_base(name)
                .ok_or_else(|| ValidationError::unknown("feat", name))?;
            picks.push((name, def.repeatable));
        }

        let mut others = progression.pending.clone();
        others.feats.clear();
        let staged = stage_selections(ctx.primary, &others, &ctx.env).staged(ctx.primary);
        reject_duplicates(picks, |name| staged.feats.contains(name))?;

        let budget = budgets(ctx.primary, &progression.pending, class, &ctx.env).feats;
        if self.feats.len() as u32 > budget {
            return Err(ValidationError::budget("feat", self.feats.len(), budget).into());
        }
        Ok(())
    }

    fn apply(
        &self,
        _ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError> {
        progression.mark_confirmed(Self::STEP);
        progression.pending.feats = self.feats.iter().map(|feat| feat.trim().to_string()).collect();
        Ok(())
    }

    fn post_validate(
        &self,
        ctx: &StepContext<'_>,
        progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let failures = ordered_failures(
            PrereqKind::Feat,
            ctx.primary,
            &progression.pending,
            &ctx.env,
            feats_of,
        );
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PrerequisiteError { failures }.into())
        }
    }
}

impl StepTransition for ConfirmTalents {
    const STEP: Step = Step::Talents;

    fn pre_validate(
        &self,
        ctx: &StepContext<'_>,
        progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let tables = ctx.env.tables();
        let class = pending_class(ctx, &progression.pending, Self::STEP)?;

        for name in &self.talents {
            let def = tables
                .talent(name)
                .ok_or_else(|| ValidationError::unknown("talent", name))?;
            if !class.has_talent_tree(&def.tree) {
                return Err(ValidationError::not_allowed(format!(
                    "{} belongs to the {} tree, which {} does not offer",
                    def.name, def.tree, class.name
                ))
                .with_detail("tree", &def.tree)
                .into());
            }
        }

        reject_duplicates(self.talents.iter().map(|name| (name, false)), |name| {
            ctx.primary.talents.contains(name)
        })?;

        let budget = budgets(ctx.primary, &progression.pending, class, &ctx.env).talents;
        if self.talents.len() as u32 > budget {
            return Err(ValidationError::budget("talent", self.talents.len(), budget).into());
        }
        Ok(())
    }

    fn apply(
        &self,
        _ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError> {
        progression.mark_confirmed(Self::STEP);
        progression.pending.talents = self
            .talents
            .iter()
            .map(|talent| talent.trim().to_string())
            .collect();
        Ok(())
    }

    fn post_validate(
        &self,
        ctx: &StepContext<'_>,
        progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let failures = ordered_failures(
            PrereqKind::Talent,
            ctx.primary,
            &progression.pending,
            &ctx.env,
            talents_of,
        );
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PrerequisiteError { failures }.into())
        }
    }
}

// ---------------------------------------------------------------------------
// ability increases
// ---------------------------------------------------------------------------

impl StepTransition for ConfirmAbilityIncreases {
    const STEP: Step = Step::AbilityIncreases;

    fn pre_validate(
        &self,
        ctx: &StepContext<'_>,
        progression: &ProgressionState,
    ) -> Result<(), ProgressionError> {
        let class = pending_class(ctx, &progression.pending, Self::STEP)?;
        let allowed = budgets(ctx.primary, &progression.pending, class, &ctx.env).ability_increases;
        if allowed == 0 {
            return Err(ValidationError::not_allowed(format!(
                "no ability increase at character level {}",
                ctx.primary.character_level() + 1
            ))
            .into());
        }

        let distinct: BTreeSet<Ability> = self.abilities.iter().copied().collect();
        if self.abilities.len() as u32 != allowed || distinct.len() != self.abilities.len() {
            return Err(ValidationError::malformed(format!(
                "pick exactly {allowed} different abilities"
            ))
            .with_detail("picked", self.abilities.len())
            .into());
        }
        Ok(())
    }

    fn apply(
        &self,
        _ctx: &StepContext<'_>,
        progression: &mut ProgressionState,
    ) -> Result<(), ProgressionError> {
        progression.mark_confirmed(Self::STEP);
        progression.pending.ability_increases = self.abilities.clone();
        Ok(())
    }
}
