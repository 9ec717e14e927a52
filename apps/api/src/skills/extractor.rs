//! Skill extraction — turns free text into a sorted set of canonical skills.
//!
//! Three phases, always in this order:
//! 1. strict skills: boundary-guarded patterns against the raw text
//! 2. everything else: lowercase substring search over the normalized text
//! 3. alias canonicalization, de-duplication and sorting
//!
//! Phase 2 has no boundary guard, so a skill can match inside a longer word or phrase.

use std::collections::BTreeSet;

use crate::skills::vocabulary::SkillVocabulary;

/// Extracts canonical skills from `text`, sorted lexicographically.
pub fn extract_skills(text: &str, vocabulary: &SkillVocabulary) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![];
    }

    let mut found: BTreeSet<String> = BTreeSet::new();

    for strict in vocabulary.strict_skills() {
        if strict.pattern.is_match(text) {
            found.insert(strict.canonical.clone());
        }
    }

    let normalized = normalize_for_search(text);
    for skill in vocabulary.skills() {
        if vocabulary.is_strict(skill) {
            continue;
        }
        if normalized.contains(&skill.to_lowercase()) {
            found.insert(skill.clone());
        }
    }

    found
        .iter()
        .map(|skill| vocabulary.canonicalize(skill))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Lowercase, `&nbsp;` removed, whitespace runs collapsed to one space.
pub fn normalize_for_search(text: &str) -> String {
    text.to_lowercase()
        .replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
