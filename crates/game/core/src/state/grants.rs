//! Granted feats and talents.
//!
//! Grants are deduplicated by normalized key. Starting (automatic) grants are
//! tracked apart from chosen ones so budgets only ever count the latter.

use std::collections::BTreeMap;

use super::normalize_key;

/// Where a grant came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum GrantOrigin {
    /// Class starting feats granted with the first class level.
    Starting,
    /// Feat picked from a class's multiclass list.
    Multiclass,
    Species,
    Background,
    /// Spent from a feat or talent budget.
    Chosen,
}

impl GrantOrigin {
    pub const fn is_automatic(self) -> bool {
        !matches!(self, GrantOrigin::Chosen)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grant {
    pub name: String,
    pub origin: GrantOrigin,
    /// Number of times taken (repeatable feats only go above 1).
    pub count: u32,
}

/// Set of granted identifiers, deduplicated by identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Grants {
    entries: BTreeMap<String, Grant>,
}

impl Grants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a grant. Re-granting an owned key bumps the count only when
    /// `repeatable`; otherwise it is a no-op. Returns true if anything changed.
    pub fn grant(&mut self, name: &str, origin: GrantOrigin, repeatable: bool) -> bool {
        let key = normalize_key(name);
        if key.is_empty() {
            return false;
        }
        match self.entries.get_mut(&key) {
            Some(existing) if repeatable => {
                existing.count += 1;
                true
            }
            Some(_) => false,
            None => {
                self.entries.insert(
                    key,
                    Grant {
                        name: name.trim().to_string(),
                        origin,
                        count: 1,
                    },
                );
                true
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize_key(name))
    }

    pub fn get(&self, name: &str) -> Option<&Grant> {
        self.entries.get(&normalize_key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(key, grant)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Grant)> {
        self.entries.iter().map(|(key, grant)| (key.as_str(), grant))
    }

    pub fn starting(&self) -> impl Iterator<Item = &Grant> {
        self.entries.values().filter(|g| g.origin.is_automatic())
    }

    pub fn chosen(&self) -> impl Iterator<Item = &Grant> {
        self.entries
            .values()
            .filter(|g| g.origin == GrantOrigin::Chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_deduplicate_by_normalized_key() {
        let mut grants = Grants::new();
        assert!(grants.grant("Point-Blank Shot", GrantOrigin::Chosen, false));
        assert!(!grants.grant("point blank shot", GrantOrigin::Chosen, false));
        assert_eq!(grants.len(), 1);
        assert!(grants.contains("POINT_BLANK_SHOT"));
    }

    #[test]
    fn repeatable_grants_count_up() {
        let mut grants = Grants::new();
        grants.grant("Force Training", GrantOrigin::Chosen, true);
        grants.grant("Force Training", GrantOrigin::Chosen, true);
        assert_eq!(grants.get("force training").map(|g| g.count), Some(2));
    }

    #[test]
    fn starting_and_chosen_are_separated() {
        let mut grants = Grants::new();
        grants.grant("Weapon Proficiency (Pistols)", GrantOrigin::Starting, false);
        grants.grant("Toughness", GrantOrigin::Chosen, false);
        assert_eq!(grants.starting().count(), 1);
        assert_eq!(grants.chosen().count(), 1);
    }
}
