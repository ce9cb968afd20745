//! Sample rule tables and prebuilt actors for tests.
//!
//! The data is a small but self-consistent slice of a saga-style rule set:
//! four core classes, a handful of prestige classes, and enough feats, talents
//! and skills to exercise every prerequisite form.

use std::collections::BTreeMap;

use crate::config::RulesConfig;
use crate::env::{
    BabProgression, BackgroundDef, ClassDef, ClassDefenses, DefenseCategory, FeatDef, GearDef,
    PowerDef, RuleTablesData, SkillDef, SpeciesDef, StaticRuleTables, TalentDef,
};
use crate::state::{
    Ability, AbilityScores, ActionCost, Actor, ActorId, ActorKind, ClassLevel, GrantOrigin,
    ItemType, PrimaryState, Size, WeaponProfile, WeaponRange,
};
use crate::stats::ModifierSpec;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

fn odd_levels() -> Vec<u32> {
    (1..=20).filter(|level| level % 2 == 1).collect()
}

fn even_levels() -> Vec<u32> {
    (1..=20).filter(|level| level % 2 == 0).collect()
}

fn skill(key: &str, label: &str, ability: Ability, armor_check: bool) -> SkillDef {
    SkillDef {
        key: key.to_string(),
        label: label.to_string(),
        ability,
        armor_check,
    }
}

fn feat(name: &str, prerequisites: Option<&str>) -> FeatDef {
    FeatDef {
        id: crate::state::normalize_key(name),
        name: name.to_string(),
        prerequisites: prerequisites.map(str::to_string),
        ..FeatDef::default()
    }
}

fn talent(name: &str, tree: &str, prerequisites: Option<&str>) -> TalentDef {
    TalentDef {
        id: crate::state::normalize_key(name),
        name: name.to_string(),
        tree: tree.to_string(),
        prerequisites: prerequisites.map(str::to_string),
        ..TalentDef::default()
    }
}

const fn defenses(
    fortitude: DefenseCategory,
    reflex: DefenseCategory,
    will: DefenseCategory,
) -> ClassDefenses {
    ClassDefenses {
        fortitude,
        reflex,
        will,
    }
}

const SOLDIER_FEATS: [&str; 5] = [
    "Armor Proficiency (Light)",
    "Armor Proficiency (Medium)",
    "Weapon Proficiency (Pistols)",
    "Weapon Proficiency (Rifles)",
    "Weapon Proficiency (Simple Weapons)",
];

fn skills() -> Vec<SkillDef> {
    use Ability::*;
    vec![
        skill("acrobatics", "Acrobatics", Dex, true),
        skill("climb", "Climb", Str, true),
        skill("deception", "Deception", Cha, false),
        skill("endurance", "Endurance", Con, true),
        skill("gather_information", "Gather Information", Cha, false),
        skill("initiative", "Initiative", Dex, true),
        skill("jump", "Jump", Str, true),
        skill("knowledge", "Knowledge", Int, false),
        skill("mechanics", "Mechanics", Int, false),
        skill("perception", "Perception", Wis, false),
        skill("persuasion", "Persuasion", Cha, false),
        skill("pilot", "Pilot", Dex, false),
        skill("stealth", "Stealth", Dex, true),
        skill("survival", "Survival", Wis, false),
        skill("swim", "Swim", Str, true),
        skill("treat_injury", "Treat Injury", Wis, false),
        skill("use_computer", "Use Computer", Int, false),
        skill("use_the_force", "Use the Force", Cha, false),
    ]
}

fn species() -> Vec<SpeciesDef> {
    vec![
        SpeciesDef {
            id: "human".into(),
            name: "Human".into(),
            speed: 6,
            bonus_feats: 1,
            ..SpeciesDef::default()
        },
        SpeciesDef {
            id: "wookiee".into(),
            name: "Wookiee".into(),
            speed: 6,
            ability_mods: BTreeMap::from([
                (Ability::Str, 4),
                (Ability::Dex, -2),
                (Ability::Wis, -2),
            ]),
            ..SpeciesDef::default()
        },
        SpeciesDef {
            id: "near_human".into(),
            name: "Near-Human".into(),
            speed: 6,
            free_ability_bonus: Some(2),
            ..SpeciesDef::default()
        },
        SpeciesDef {
            id: "ewok".into(),
            name: "Ewok".into(),
            size: Size::Small,
            speed: 4,
            ability_mods: BTreeMap::from([(Ability::Dex, 2), (Ability::Str, -2)]),
            trained_skills: names(&["Survival"]),
            modifiers: vec![ModifierSpec::add("skills.stealth", 5)],
            ..SpeciesDef::default()
        },
    ]
}

fn backgrounds() -> Vec<BackgroundDef> {
    vec![
        BackgroundDef {
            id: "spacer".into(),
            name: "Spacer".into(),
            trained_skills: names(&["Pilot"]),
            ..BackgroundDef::default()
        },
        BackgroundDef {
            id: "veteran".into(),
            name: "Veteran".into(),
            feats: names(&["Weapon Proficiency (Rifles)"]),
            ..BackgroundDef::default()
        },
        BackgroundDef {
            id: "academic".into(),
            name: "Academic".into(),
            trained_skills: names(&["Knowledge"]),
            bonus_feats: 1,
            ..BackgroundDef::default()
        },
    ]
}

fn classes() -> Vec<ClassDef> {
    use DefenseCategory::{High, Low, Medium};
    vec![
        ClassDef {
            id: "soldier".into(),
            name: "Soldier".into(),
            hit_die: 10,
            bab: BabProgression::High,
            defenses: defenses(High, Medium, Low),
            skill_points: 5,
            class_skills: names(&[
                "Climb",
                "Endurance",
                "Initiative",
                "Jump",
                "Knowledge",
                "Mechanics",
                "Perception",
                "Pilot",
                "Swim",
                "Treat Injury",
                "Use Computer",
            ]),
            starting_feats: names(&SOLDIER_FEATS),
            multiclass_feats: names(&SOLDIER_FEATS),
            talent_trees: names(&["Armor Specialist", "Commando", "Weapon Specialist"]),
            talent_levels: odd_levels(),
            bonus_feat_levels: even_levels(),
            ..ClassDef::default()
        },
        ClassDef {
            id: "jedi".into(),
            name: "Jedi".into(),
            hit_die: 10,
            bab: BabProgression::High,
            defenses: defenses(Medium, Medium, Medium),
            skill_points: 2,
            class_skills: names(&[
                "Acrobatics",
                "Endurance",
                "Initiative",
                "Jump",
                "Knowledge",
                "Mechanics",
                "Perception",
                "Pilot",
                "Use the Force",
            ]),
            starting_feats: names(&[
                "Force Sensitivity",
                "Weapon Proficiency (Lightsabers)",
                "Weapon Proficiency (Simple Weapons)",
            ]),
            multiclass_feats: names(&["Force Sensitivity"]),
            talent_trees: names(&["Jedi Guardian", "Jedi Consular"]),
            talent_levels: odd_levels(),
            bonus_feat_levels: even_levels(),
            force_sensitive: true,
            ..ClassDef::default()
        },
        ClassDef {
            id: "scoundrel".into(),
            name: "Scoundrel".into(),
            hit_die: 6,
            bab: BabProgression::Medium,
            defenses: defenses(Low, High, Medium),
            skill_points: 4,
            class_skills: names(&[
                "Acrobatics",
                "Deception",
                "Gather Information",
                "Initiative",
                "Knowledge",
                "Mechanics",
                "Perception",
                "Persuasion",
                "Pilot",
                "Stealth",
                "Use Computer",
            ]),
            starting_feats: names(&[
                "Point-Blank Shot",
                "Weapon Proficiency (Pistols)",
                "Weapon Proficiency (Simple Weapons)",
            ]),
            multiclass_feats: names(&["Point-Blank Shot", "Weapon Proficiency (Pistols)"]),
            talent_trees: names(&["Fortune", "Slicer"]),
            talent_levels: odd_levels(),
            bonus_feat_levels: even_levels(),
            ..ClassDef::default()
        },
        ClassDef {
            id: "noble".into(),
            name: "Noble".into(),
            hit_die: 6,
            bab: BabProgression::Low,
            defenses: defenses(Low, Medium, High),
            skill_points: 6,
            class_skills: names(&[
                "Deception",
                "Gather Information",
                "Knowledge",
                "Perception",
                "Persuasion",
                "Pilot",
                "Treat Injury",
                "Use Computer",
                "Use the Force",
            ]),
            starting_feats: names(&[
                "Linguist",
                "Weapon Proficiency (Pistols)",
                "Weapon Proficiency (Simple Weapons)",
            ]),
            multiclass_feats: names(&["Linguist", "Weapon Proficiency (Pistols)"]),
            talent_trees: names(&["Influence", "Inspiration"]),
            talent_levels: odd_levels(),
            bonus_feat_levels: even_levels(),
            ..ClassDef::default()
        },
        ClassDef {
            id: "elite_trooper".into(),
            name: "Elite Trooper".into(),
            hit_die: 12,
            bab: BabProgression::High,
            defenses: defenses(High, Medium, Low),
            skill_points: 1,
            class_skills: names(&["Climb", "Endurance", "Initiative", "Perception"]),
            talent_trees: names(&["Commando", "Weapon Specialist"]),
            talent_levels: odd_levels(),
            bonus_feat_levels: even_levels(),
            prerequisites: Some(
                "BAB +7, Armor Proficiency (Medium), Point-Blank Shot".to_string(),
            ),
            ..ClassDef::default()
        },
        ClassDef {
            id: "ace_pilot".into(),
            name: "Ace Pilot".into(),
            hit_die: 8,
            bab: BabProgression::Medium,
            defenses: defenses(Low, High, Medium),
            skill_points: 5,
            class_skills: names(&["Mechanics", "Perception", "Pilot", "Use Computer"]),
            talent_trees: names(&["Fortune"]),
            talent_levels: odd_levels(),
            bonus_feat_levels: even_levels(),
            prerequisites: Some(
                "Character Level 7, Trained in Pilot, Vehicular Combat".to_string(),
            ),
            ..ClassDef::default()
        },
        ClassDef {
            id: "jedi_knight".into(),
            name: "Jedi Knight".into(),
            hit_die: 10,
            bab: BabProgression::High,
            defenses: defenses(Medium, Medium, High),
            skill_points: 2,
            class_skills: names(&["Acrobatics", "Perception", "Pilot", "Use the Force"]),
            talent_trees: names(&["Jedi Guardian", "Jedi Consular"]),
            talent_levels: odd_levels(),
            bonus_feat_levels: even_levels(),
            force_sensitive: true,
            prerequisites: Some(
                "BAB +7, Trained in Use the Force, Force Sensitivity, \
                 Weapon Proficiency (Lightsabers)"
                    .to_string(),
            ),
            ..ClassDef::default()
        },
        ClassDef {
            id: "force_adept".into(),
            name: "Force Adept".into(),
            hit_die: 8,
            bab: BabProgression::Medium,
            defenses: defenses(Low, Medium, High),
            skill_points: 3,
            class_skills: names(&["Knowledge", "Perception", "Use the Force"]),
            talent_trees: names(&["Jedi Consular"]),
            talent_levels: odd_levels(),
            force_sensitive: true,
            prerequisites: Some(
                "Trained in Use the Force; Force Sensitive; \
                 two talents from the Jedi Guardian talent tree"
                    .to_string(),
            ),
            ..ClassDef::default()
        },
    ]
}

fn feats() -> Vec<FeatDef> {
    vec![
        feat("Point-Blank Shot", None),
        feat("Precise Shot", Some("Point-Blank Shot, BAB +1")),
        FeatDef {
            feat_type: "Combat".into(),
            ..feat("Power Attack", Some("STR 13"))
        },
        FeatDef {
            feat_type: "Combat".into(),
            ..feat("Cleave", Some("Power Attack"))
        },
        FeatDef {
            modifiers: vec![ModifierSpec::add("hp.max", 5)],
            ..feat("Toughness", None)
        },
        FeatDef {
            modifiers: vec![ModifierSpec::add("defenses.all", 1)],
            ..feat("Improved Defenses", None)
        },
        feat("Skill Training", None),
        feat("Skill Focus", None),
        FeatDef {
            feat_type: "Force".into(),
            ..feat("Force Sensitivity", None)
        },
        FeatDef {
            feat_type: "Force".into(),
            repeatable: true,
            grants_powers: names(&["Move Object"]),
            ..feat(
                "Force Training",
                Some("Force Sensitivity, Trained in Use the Force"),
            )
        },
        feat("Weapon Proficiency (Pistols)", None),
        feat("Weapon Proficiency (Rifles)", None),
        feat("Weapon Proficiency (Simple Weapons)", None),
        feat("Weapon Proficiency (Lightsabers)", None),
        feat("Armor Proficiency (Light)", None),
        feat("Armor Proficiency (Medium)", Some("Armor Proficiency (Light)")),
        feat("Vehicular Combat", Some("Trained in Pilot")),
        FeatDef {
            action: Some(ActionCost::Swift),
            ..feat("Quick Draw", Some("BAB +1"))
        },
        feat("Linguist", Some("INT 13")),
        feat(
            "Rapid Shot",
            Some("Weapon Proficiency (Pistols) or Weapon Proficiency (Rifles), BAB +1"),
        ),
        feat("Dual Weapon Mastery I", Some("DEX 13, BAB +1")),
    ]
}

fn talents() -> Vec<TalentDef> {
    vec![
        TalentDef {
            action: Some(ActionCost::Reaction),
            ..talent("Block", "Jedi Guardian", None)
        },
        TalentDef {
            action: Some(ActionCost::Reaction),
            ..talent("Deflect", "Jedi Guardian", None)
        },
        talent("Riposte", "Jedi Guardian", Some("Block")),
        talent("Adept Negotiator", "Jedi Consular", None),
        talent("Armored Defense", "Armor Specialist", None),
        talent("Improved Armored Defense", "Armor Specialist", Some("Armored Defense")),
        TalentDef {
            modifiers: vec![ModifierSpec::add("defenses.will", 1)],
            ..talent("Indomitable", "Commando", None)
        },
        talent("Devastating Attack", "Weapon Specialist", None),
        talent("Knack", "Fortune", None),
        talent("Lucky Shot", "Fortune", Some("Knack")),
        talent("Gimmick", "Slicer", None),
        talent("Presence", "Influence", None),
        talent("Inspire Confidence", "Inspiration", None),
    ]
}

fn powers() -> Vec<PowerDef> {
    vec![
        PowerDef {
            id: "move_object".into(),
            name: "Move Object".into(),
            descriptor: Some("telekinetic".into()),
            action: Some(ActionCost::Standard),
        },
        PowerDef {
            id: "mind_trick".into(),
            name: "Mind Trick".into(),
            descriptor: Some("mind-affecting".into()),
            action: Some(ActionCost::Standard),
        },
    ]
}

fn gear() -> Vec<GearDef> {
    let weapon = |range, damage: &str| WeaponProfile {
        range,
        damage: damage.to_string(),
        ..WeaponProfile::default()
    };
    vec![
        GearDef {
            id: "blaster_pistol".into(),
            name: "Blaster Pistol".into(),
            item_type: ItemType::Weapon,
            weight: 1,
            weapon: Some(weapon(WeaponRange::Ranged, "3d6")),
            action: Some(ActionCost::Standard),
            modifiers: Vec::new(),
        },
        GearDef {
            id: "blaster_rifle".into(),
            name: "Blaster Rifle".into(),
            item_type: ItemType::Weapon,
            weight: 5,
            weapon: Some(weapon(WeaponRange::Ranged, "3d8")),
            action: Some(ActionCost::Standard),
            modifiers: Vec::new(),
        },
        GearDef {
            id: "vibroblade".into(),
            name: "Vibroblade".into(),
            item_type: ItemType::Weapon,
            weight: 2,
            weapon: Some(weapon(WeaponRange::Melee, "2d6")),
            action: Some(ActionCost::Standard),
            modifiers: Vec::new(),
        },
        GearDef {
            id: "blast_vest".into(),
            name: "Blast Vest".into(),
            item_type: ItemType::Armor,
            weight: 2,
            weapon: None,
            action: None,
            modifiers: vec![ModifierSpec::add("defenses.reflex", 2)],
        },
        GearDef {
            id: "medpac".into(),
            name: "Medpac".into(),
            item_type: ItemType::Equipment,
            weight: 1,
            weapon: None,
            action: Some(ActionCost::FullRound),
            modifiers: Vec::new(),
        },
    ]
}

/// Raw sample tables, for callers that want to tweak them before indexing.
pub fn sample_data() -> RuleTablesData {
    RuleTablesData {
        species: species(),
        backgrounds: backgrounds(),
        classes: classes(),
        feats: feats(),
        talents: talents(),
        skills: skills(),
        powers: powers(),
        gear: gear(),
    }
}

pub fn sample_tables() -> StaticRuleTables {
    StaticRuleTables::new(sample_data())
}

pub fn sample_config() -> RulesConfig {
    RulesConfig::default()
}

/// A fresh character with no progression.
pub fn new_character() -> Actor {
    Actor::new(ActorId(1), "Rookie", ActorKind::Character)
}

/// Human Soldier 1 with STR 16, DEX 13, CON 12, INT 10, WIS 8, CHA 8 and the
/// soldier starting feats. Derived values are not computed yet.
pub fn soldier_level_one() -> Actor {
    let mut primary = PrimaryState {
        species: Some("human".into()),
        abilities: AbilityScores::from_bases(16, 13, 12, 10, 8, 8),
        ..PrimaryState::default()
    };
    primary.class_levels.push(ClassLevel {
        class_id: "soldier".into(),
        level: 1,
        skill_points_budget: 20,
    });
    for name in SOLDIER_FEATS {
        primary.feats.grant(name, GrantOrigin::Starting, false);
    }
    Actor::from_primary(ActorId(1), "Sergeant", ActorKind::Character, primary)
}
