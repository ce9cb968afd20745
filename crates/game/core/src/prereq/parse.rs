//! Free-text prerequisite parsing.
//!
//! Feat and class expressions are lists of clauses separated by `,` or `;`.
//! A clause containing ` or ` becomes an any-of group. Talent expressions are
//! plain comma-separated talent names.

use super::PrereqKind;
use crate::env::RuleTables;
use crate::state::Ability;

/// One structured requirement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Clause {
    Ability { ability: Ability, min: i32 },
    Bab(i32),
    CharacterLevel(u32),
    ClassLevel { class: String, min: u32 },
    TrainedSkill(String),
    ForceSensitive,
    TalentCount { min: u32, tree: Option<String> },
    Species(String),
    Feat(String),
    Talent(String),
    AnyOf(Vec<Clause>),
}

/// Parses an expression into clauses. Empty input yields no clauses.
pub fn parse(kind: PrereqKind, expression: &str, tables: &dyn RuleTables) -> Vec<Clause> {
    match kind {
        PrereqKind::Talent => expression
            .split(',')
            .map(clean)
            .filter(|name| !name.is_empty())
            .map(|name| Clause::Talent(name.to_string()))
            .collect(),
        PrereqKind::Feat | PrereqKind::Class => expression
            .split([',', ';'])
            .map(clean)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut alternatives: Vec<Clause> = split_or(part)
                    .into_iter()
                    .map(|alt| parse_clause(alt, tables))
                    .collect();
                if alternatives.len() == 1 {
                    alternatives.remove(0)
                } else {
                    Clause::AnyOf(alternatives)
                }
            })
            .collect(),
    }
}

fn clean(raw: &str) -> &str {
    raw.trim().trim_end_matches('.').trim()
}

fn split_or(part: &str) -> Vec<&str> {
    let lower = part.to_ascii_lowercase();
    let mut pieces = Vec::new();
    let mut start = 0;
    while let Some(offset) = lower[start..].find(" or ") {
        pieces.push(clean(&part[start..start + offset]));
        start += offset + " or ".len();
    }
    pieces.push(clean(&part[start..]));
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

fn number_word(word: &str) -> Option<u32> {
    let word = word.trim_end_matches('+');
    if let Ok(n) = word.parse::<u32>() {
        return Some(n);
    }
    match word {
        "one" | "a" | "an" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        _ => None,
    }
}

fn parse_signed(raw: &str) -> Option<i32> {
    raw.trim().trim_end_matches('+').trim_start_matches('+').parse().ok()
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| text[prefix.len()..].trim())
}

fn parse_talent_count(text: &str) -> Option<Clause> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let lower: Vec<String> = words.iter().map(|word| word.to_ascii_lowercase()).collect();
    let skip = usize::from(lower.first().is_some_and(|word| word == "any"));
    let min = number_word(lower.get(skip)?)?;
    if !matches!(lower.get(skip + 1)?.as_str(), "talent" | "talents") {
        return None;
    }
    let rest = skip + 2;
    let tree = match lower.get(rest).map(String::as_str) {
        None => None,
        Some("from") => {
            let tail: Vec<&str> = words[rest + 1..]
                .iter()
                .zip(&lower[rest + 1..])
                .filter(|(_, word)| !matches!(word.as_str(), "the" | "talent" | "tree" | "trees"))
                .map(|(original, _)| *original)
                .collect();
            (!tail.is_empty()).then(|| tail.join(" "))
        }
        Some(_) => return None,
    };
    Some(Clause::TalentCount { min, tree })
}

fn parse_clause(text: &str, tables: &dyn RuleTables) -> Clause {
    let lower = text.to_ascii_lowercase();

    if let Some(skill) = strip_prefix_ci(text, "trained in ") {
        return Clause::TrainedSkill(skill.to_string());
    }
    if lower == "force sensitive" {
        return Clause::ForceSensitive;
    }
    for prefix in ["base attack bonus ", "bab "] {
        if let Some(value) = strip_prefix_ci(text, prefix).and_then(parse_signed) {
            return Clause::Bab(value);
        }
    }
    for prefix in ["character level ", "heroic level ", "level "] {
        if let Some(value) = strip_prefix_ci(text, prefix).and_then(number_word) {
            return Clause::CharacterLevel(value);
        }
    }
    if let Some(clause) = parse_talent_count(text) {
        return clause;
    }
    if let Some(species) = strip_prefix_ci(text, "species ") {
        return Clause::Species(species.trim_start_matches(':').trim().to_string());
    }

    if let Some((head, tail)) = text.rsplit_once(' ') {
        if let Some(value) = parse_signed(tail) {
            if let Ok(ability) = head.trim().parse::<Ability>() {
                return Clause::Ability {
                    ability,
                    min: value,
                };
            }
            let class = head.trim();
            let class = strip_suffix_ci(class, " level").unwrap_or(class);
            if value >= 0 && tables.class(class).is_some() {
                return Clause::ClassLevel {
                    class: class.to_string(),
                    min: value as u32,
                };
            }
        }
    }

    if tables.feat(text).is_none() && tables.talent(text).is_some() {
        Clause::Talent(text.to_string())
    } else {
        Clause::Feat(text.to_string())
    }
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    let tail = text.get(split..)?;
    tail.eq_ignore_ascii_case(suffix)
        .then(|| text[..split].trim())
}
