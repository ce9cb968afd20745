//! Rule tables loader.
//!
//! Tables may be authored in RON or TOML; the format is picked from the file
//! extension. Entries without an `id` get one derived from their name, and
//! cross-references that point nowhere are reported as warnings rather than
//! rejected so partially authored content still loads.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, bail};
use saga_core::state::normalize_key;
use saga_core::{RuleTablesData, StaticRuleTables};

use crate::loaders::{LoadResult, read_file};

/// Serialization format of a tables file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Ron,
    Toml,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ron" => Some(TableFormat::Ron),
            "toml" => Some(TableFormat::Toml),
            _ => None,
        }
    }
}

/// Loader for species, class, feat, talent, skill, power and gear tables.
pub struct TablesLoader;

impl TablesLoader {
    /// Load tables from a `.ron` or `.toml` file.
    pub fn load(path: &Path) -> LoadResult<StaticRuleTables> {
        let Some(format) = TableFormat::from_path(path) else {
            bail!("unsupported tables file: {}", path.display());
        };
        let content = read_file(path)?;
        Self::parse(&content, format).with_context(|| format!("in {}", path.display()))
    }

    /// Parse tables from text in the given format.
    pub fn parse(content: &str, format: TableFormat) -> LoadResult<StaticRuleTables> {
        let mut data: RuleTablesData = match format {
            TableFormat::Ron => ron::from_str(content).context("failed to parse tables RON")?,
            TableFormat::Toml => toml::from_str(content).context("failed to parse tables TOML")?,
        };
        fill_ids(&mut data);
        lint(&data);

        tracing::debug!(
            species = data.species.len(),
            classes = data.classes.len(),
            feats = data.feats.len(),
            talents = data.talents.len(),
            skills = data.skills.len(),
            "loaded rule tables"
        );
        Ok(StaticRuleTables::new(data))
    }
}

fn fill_id(id: &mut String, name: &str) {
    if id.trim().is_empty() {
        *id = normalize_key(name);
    }
}

fn fill_ids(data: &mut RuleTablesData) {
    for def in &mut data.species {
        fill_id(&mut def.id, &def.name);
    }
    for def in &mut data.backgrounds {
        fill_id(&mut def.id, &def.name);
    }
    for def in &mut data.classes {
        fill_id(&mut def.id, &def.name);
    }
    for def in &mut data.feats {
        fill_id(&mut def.id, &def.name);
    }
    for def in &mut data.talents {
        fill_id(&mut def.id, &def.name);
    }
    for def in &mut data.powers {
        fill_id(&mut def.id, &def.name);
    }
    for def in &mut data.gear {
        fill_id(&mut def.id, &def.name);
    }
}

/// Names referenced from somewhere in the tables that no entry defines.
fn dangling<'a>(
    known: &BTreeSet<String>,
    references: impl IntoIterator<Item = &'a String>,
) -> Vec<&'a str> {
    references
        .into_iter()
        .filter(|name| !known.contains(&normalize_key(name)))
        .map(String::as_str)
        .collect()
}

fn keys<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> BTreeSet<String> {
    pairs
        .into_iter()
        .flat_map(|(id, name)| [normalize_key(id), normalize_key(name)])
        .collect()
}

fn lint(data: &RuleTablesData) {
    let skills = keys(data.skills.iter().map(|s| (s.key.as_str(), s.label.as_str())));
    let talent_trees: BTreeSet<String> =
        data.talents.iter().map(|t| normalize_key(&t.tree)).collect();

    for class in &data.classes {
        let missing = dangling(&skills, &class.class_skills);
        if !missing.is_empty() {
            tracing::warn!(class = %class.name, ?missing, "class lists unknown skills");
        }
        for tree in &class.talent_trees {
            if !talent_trees.contains(&normalize_key(tree)) {
                tracing::warn!(class = %class.name, %tree, "class offers an empty talent tree");
            }
        }
    }

    let powers = keys(data.powers.iter().map(|p| (p.id.as_str(), p.name.as_str())));
    for feat in &data.feats {
        let missing = dangling(&powers, &feat.grants_powers);
        if !missing.is_empty() {
            tracing::warn!(feat = %feat.name, ?missing, "feat grants unknown powers");
        }
    }

    let mut seen = BTreeSet::new();
    for feat in &data.feats {
        if !seen.insert(normalize_key(&feat.id)) {
            tracing::warn!(id = %feat.id, "duplicate feat id; first entry wins");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_core::{Ability, RuleTables};

    const TOML_TABLES: &str = r#"
[[species]]
name = "Human"
size = "medium"
speed = 6
bonus_feats = 1
free_ability_bonus = 2

[[species]]
id = "wookiee"
name = "Wookiee"
size = "medium"
speed = 6
ability_mods = { STR = 4, DEX = -2, WIS = -2, CHA = -2 }

[[classes]]
name = "Soldier"
hit_die = 10
bab = "high"
skill_points = 3
class_skills = ["pilot", "endurance"]
starting_feats = ["Weapon Proficiency (Rifles)"]
talent_trees = ["Armor Specialist"]
talent_levels = [1, 3, 5]

[[feats]]
name = "Power Attack"
feat_type = "Combat"
prerequisites = "STR 13"

[[talents]]
name = "Armored Defense"
tree = "Armor Specialist"

[[skills]]
key = "pilot"
label = "Pilot"
ability = "DEX"

[[skills]]
key = "endurance"
label = "Endurance"
ability = "CON"
"#;

    #[test]
    fn toml_tables_fill_ids_and_index_names() {
        let tables = TablesLoader::parse(TOML_TABLES, TableFormat::Toml).expect("parse");

        let human = tables.species("human").expect("human by derived id");
        assert_eq!(human.free_ability_bonus, Some(2));
        let wookiee = tables.species("Wookiee").expect("wookiee by name");
        assert_eq!(wookiee.ability_mods.get(&Ability::Str), Some(&4));

        let soldier = tables.class("soldier").expect("soldier");
        assert_eq!(soldier.hit_die, 10);
        assert!(soldier.is_class_skill("Pilot"));

        let feat = tables.feat("power attack").expect("feat");
        assert_eq!(feat.prerequisites.as_deref(), Some("STR 13"));
        assert_eq!(tables.skills().len(), 2);
    }

    #[test]
    fn ron_tables_parse() {
        let ron = r#"(
            backgrounds: [(name: "Spacer", trained_skills: ["pilot"])],
            feats: [(id: "toughness", name: "Toughness", repeatable: true)],
        )"#;
        let tables = TablesLoader::parse(ron, TableFormat::Ron).expect("parse");
        assert_eq!(
            tables.background("spacer").map(|b| b.trained_skills.clone()),
            Some(vec!["pilot".to_string()])
        );
        assert!(tables.feat("Toughness").is_some_and(|f| f.repeatable));
    }

    #[test]
    fn malformed_input_reports_format() {
        let err = TablesLoader::parse("[[classes]]\nhit_die = \"ten\"", TableFormat::Toml)
            .expect_err("bad hit die");
        assert!(format!("{err:#}").contains("tables TOML"));
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tables.toml");
        std::fs::write(&path, TOML_TABLES).expect("write");
        let tables = TablesLoader::load(&path).expect("load");
        assert!(tables.class("Soldier").is_some());

        let json = dir.path().join("tables.json");
        std::fs::write(&json, "{}").expect("write");
        assert!(TablesLoader::load(&json).is_err());
        assert!(TablesLoader::load(&dir.path().join("missing.ron")).is_err());
    }
}
