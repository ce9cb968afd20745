//! End-to-end progression through the runtime.

use std::time::Duration;

use saga_core::stats::ModifierSpec;
use saga_core::testing::{new_character, sample_tables, soldier_level_one};
use saga_core::{
    Ability, ItemType, OwnedItem, ProgressionAction, ProgressionMode, RecalcStatus, SkillInput,
    ValidationKind,
};
use saga_runtime::{
    ActorRepository, DerivedEvent, Event, ProgressionEvent, Runtime, RuntimeError, Topic, logging,
};
use tokio::sync::broadcast;

fn runtime() -> Runtime {
    logging::init("warn");
    Runtime::builder()
        .tables(sample_tables())
        .build()
        .expect("runtime")
}

fn ranks(key: &str, ranks: u32) -> SkillInput {
    SkillInput::Ranks {
        key: key.into(),
        ranks,
    }
}

fn chargen_steps() -> Vec<ProgressionAction> {
    vec![
        ProgressionAction::species("Human", None),
        ProgressionAction::background("spacer"),
        ProgressionAction::abilities([
            (Ability::Str, 16),
            (Ability::Dex, 13),
            (Ability::Con, 12),
            (Ability::Int, 10),
            (Ability::Wis, 8),
            (Ability::Cha, 8),
        ]),
        ProgressionAction::class("Soldier", None),
        ProgressionAction::skills([
            ranks("perception", 5),
            ranks("mechanics", 5),
            ranks("initiative", 5),
            ranks("endurance", 5),
        ]),
        ProgressionAction::feats(["Power Attack", "Cleave"]),
        ProgressionAction::talents(["Armored Defense"]),
    ]
}

async fn next_matching(
    rx: &mut broadcast::Receiver<Event>,
    mut matches: impl FnMut(&Event) -> bool,
) -> Event {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("event bus open");
            if matches(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event in time")
}

#[tokio::test]
async fn chargen_completes_and_applies_modifiers_later() {
    let mut runtime = runtime();
    let mut progression_rx = runtime.subscribe(Topic::Progression);
    let mut derived_rx = runtime.subscribe(Topic::Derived);

    let handle = runtime.spawn_character(new_character()).expect("spawn");
    handle.begin(ProgressionMode::Chargen).await.expect("begin");
    for action in chargen_steps() {
        handle.do_action(action).await.expect("step");
    }
    let outcome = handle.finalize().await.expect("finalize");
    assert!(outcome.finalized);
    assert!(outcome.modifiers_pending);

    let completed = next_matching(&mut progression_rx, |event| {
        matches!(event, Event::Progression(ProgressionEvent::Completed(_)))
    })
    .await;
    let Event::Progression(ProgressionEvent::Completed(completed)) = completed else {
        unreachable!()
    };
    assert_eq!(completed.actor, handle.actor_id());
    assert_eq!(completed.mode, ProgressionMode::Chargen);
    assert_eq!(completed.new_level, 1);

    next_matching(&mut derived_rx, |event| {
        matches!(event, Event::Derived(DerivedEvent::ModifiersApplied { .. }))
    })
    .await;

    let actor = handle.snapshot().await.expect("snapshot");
    assert!(actor.derived().modifiers_applied);
    assert_eq!(actor.derived().hp.max, 11);
    assert_eq!(actor.primary().hp.value, 11);
    assert!(actor.primary().owns_item(ItemType::Feat, "Cleave"));

    let stored = runtime
        .repository()
        .load(handle.actor_id())
        .expect("load")
        .expect("stored");
    assert_eq!(stored.primary(), actor.primary());
    assert_eq!(stored.revision(), actor.revision());

    let again = handle.finalize().await.expect("second finalize");
    assert!(!again.finalized);

    drop(handle);
    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn rejected_step_is_reported_and_leaves_state_alone() {
    let mut runtime = runtime();
    let mut progression_rx = runtime.subscribe(Topic::Progression);
    let handle = runtime.spawn_character(new_character()).expect("spawn");
    handle.begin(ProgressionMode::Chargen).await.expect("begin");

    let before = handle.snapshot().await.expect("snapshot");
    let error = handle
        .do_action(ProgressionAction::background("spacer"))
        .await
        .expect_err("species first");
    let report = error.report().expect("progression error");
    assert_eq!(report.kind, "validation");
    assert!(matches!(
        error,
        RuntimeError::Progression(ref e) if e.validation_kind() == Some(ValidationKind::StepOrder)
    ));

    let rejected = next_matching(&mut progression_rx, |event| {
        matches!(event, Event::Progression(ProgressionEvent::Rejected { .. }))
    })
    .await;
    let Event::Progression(ProgressionEvent::Rejected { action, .. }) = rejected else {
        unreachable!()
    };
    assert_eq!(action, "confirm_background");

    let after = handle.snapshot().await.expect("snapshot");
    assert_eq!(after.primary(), before.primary());
    assert_eq!(after.revision(), before.revision());
}

#[tokio::test]
async fn reopened_character_rebuilds_derived_values() {
    let mut runtime = runtime();
    let handle = runtime.spawn_character(new_character()).expect("spawn");
    handle.begin(ProgressionMode::Chargen).await.expect("begin");
    for action in chargen_steps() {
        handle.do_action(action).await.expect("step");
    }
    handle.finalize().await.expect("finalize");
    let id = handle.actor_id();
    let revision = handle.snapshot().await.expect("snapshot").revision();
    drop(handle);

    let reopened = runtime.open_character(id).expect("open");
    let actor = reopened.snapshot().await.expect("snapshot");
    assert_eq!(actor.revision(), revision);
    assert_eq!(actor.derived().hp.max, 11);
    assert_eq!(actor.derived().bab, 1);
    assert!(actor.derived().modifiers_applied);

    reopened
        .begin(ProgressionMode::LevelUp)
        .await
        .expect("level-up opens");
    let budgets = reopened.budgets().await.expect("budgets");
    assert!(budgets.is_none());
}

#[tokio::test]
async fn unknown_actor_and_missing_content_fail_cleanly() {
    let mut runtime = runtime();
    assert!(matches!(
        runtime.open_character(saga_core::ActorId(99)),
        Err(RuntimeError::UnknownActor(_))
    ));
    assert!(matches!(
        Runtime::builder().build(),
        Err(RuntimeError::MissingOracles)
    ));

    let dir = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        saga_runtime::OracleBundle::load(dir.path()),
        Err(RuntimeError::Content(_))
    ));
}

#[tokio::test]
async fn condition_and_gear_updates_recompute_and_persist() {
    let mut runtime = runtime();
    let mut derived_rx = runtime.subscribe(Topic::Derived);
    let handle = runtime.spawn_character(soldier_level_one()).expect("spawn");
    let healthy = handle.snapshot().await.expect("snapshot").derived().clone();

    handle
        .set_condition_persistent(true)
        .await
        .expect("persistent");
    handle.set_condition_step(3, false).await.expect("step 3");
    let worsened = handle.worsen_condition(10).await.expect("worsen");
    assert!(worsened.changed);
    assert_eq!(worsened.recalc, Some(RecalcStatus::Completed));
    next_matching(&mut derived_rx, |event| {
        matches!(
            event,
            Event::Derived(DerivedEvent::Recomputed { revision, .. }) if *revision == worsened.revision
        )
    })
    .await;

    let refused = handle.improve_condition(2, false).await.expect("improve");
    assert!(!refused.changed);
    assert_eq!(refused.revision, worsened.revision);
    let actor = handle.snapshot().await.expect("snapshot");
    assert_eq!(actor.primary().condition_track.current(), 5);
    assert!(actor.derived().condition.helpless);

    handle.improve_condition(5, true).await.expect("forced");
    let (vest, _) = handle
        .add_item(
            OwnedItem::bare(ItemType::Armor, "Blast Vest")
                .with_modifiers(vec![ModifierSpec::add("defenses.reflex", 2)])
                .equipped(),
        )
        .await
        .expect("add item");
    let armored = handle.snapshot().await.expect("snapshot");
    assert_eq!(
        armored.derived().defenses.reflex.total,
        healthy.defenses.reflex.total + 2
    );

    handle.remove_item(vest).await.expect("remove");
    let actor = handle.snapshot().await.expect("snapshot");
    assert_eq!(actor.derived().defenses.reflex.total, healthy.defenses.reflex.total);

    let error = handle.set_equipped(vest, true).await.unwrap_err();
    assert_eq!(error.report().expect("report").kind, "validation");

    let stored = runtime
        .repository()
        .load(handle.actor_id())
        .expect("load")
        .expect("stored");
    assert_eq!(stored.primary(), actor.primary());
    assert_eq!(stored.revision(), actor.revision());

    drop(handle);
    runtime.shutdown().await.expect("shutdown");
}
