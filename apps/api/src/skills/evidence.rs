//! Evidence finder — cites the source lines that mention each skill.
//!
//! Every skill is searched by its canonical name and all of its alias phrases, with the
//! same alphanumeric boundary guard the strict extractor uses, so "C" never cites a line
//! that only says "Account" but does cite "C++" or a bare "C".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::skills::vocabulary::{boundary_pattern, SkillVocabulary};

pub const DEFAULT_MAX_LINES_PER_SKILL: usize = 3;

/// Canonical skill → up to N `"L<n>: <line>"` strings, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceMap(pub BTreeMap<String, Vec<String>>);

impl EvidenceMap {
    pub fn get(&self, skill: &str) -> Option<&[String]> {
        self.0.get(skill).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evidence lines for `skill` with their `L<n>:` prefixes removed, joined by spaces.
    pub fn context_text(&self, skill: &str) -> String {
        self.get(skill)
            .unwrap_or_default()
            .iter()
            .map(|line| strip_line_prefix(line))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Finds evidence lines for each requested skill.
///
/// Lines are numbered among the non-empty lines of `text`, starting at 1. Skills with no
/// located line are left out of the result.
pub fn find_evidence(
    text: &str,
    skills: &[String],
    max_lines_per_skill: usize,
    vocabulary: &SkillVocabulary,
) -> EvidenceMap {
    let lines: Vec<String> = text
        .lines()
        .map(normalize_line)
        .filter(|line| !line.is_empty())
        .collect();

    let mut out = BTreeMap::new();
    if max_lines_per_skill == 0 {
        return EvidenceMap(out);
    }

    for skill in skills {
        let pattern = boundary_pattern(&vocabulary.needles_for(skill));
        let evidence: Vec<String> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| pattern.is_match(line))
            .take(max_lines_per_skill)
            .map(|(i, line)| format!("L{}: {}", i + 1, line))
            .collect();

        if !evidence.is_empty() {
            out.insert(skill.clone(), evidence);
        }
    }

    EvidenceMap(out)
}

fn normalize_line(line: &str) -> String {
    line.replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// "L12: shipped it" → "shipped it". Lines without a prefix are returned trimmed.
fn strip_line_prefix(line: &str) -> &str {
    let Some(rest) = line.strip_prefix('L') else {
        return line.trim();
    };
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return line.trim();
    }
    match rest[digits..].strip_prefix(':') {
        Some(content) => content.trim(),
        None => line.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cap_keeps_first_lines_in_order() {
        let text = "Python one\nnothing\nPython two\nPython three\n\nPython four\nPython five";
        let vocab = SkillVocabulary::standard();
        let evidence = find_evidence(text, &skills(&["Python"]), 2, &vocab);
        assert_eq!(
            evidence.get("Python").unwrap(),
            &["L1: Python one".to_string(), "L3: Python two".to_string()]
        );
    }

    #[test]
    fn test_line_numbers_skip_blank_lines() {
        let text = "\n\nintro\n\n   \nDocker   everywhere";
        let evidence = find_evidence(text, &skills(&["Docker"]), 3, &SkillVocabulary::standard());
        assert_eq!(evidence.get("Docker").unwrap(), &["L2: Docker everywhere".to_string()]);
    }

    #[test]
    fn test_strict_boundary_applies_to_evidence() {
        let text = "Account management\nSystems work in C\nModern C++ codebase";
        let evidence = find_evidence(text, &skills(&["C"]), 3, &SkillVocabulary::standard());
        assert_eq!(
            evidence.get("C").unwrap(),
            &["L2: Systems work in C".to_string(), "L3: Modern C++ codebase".to_string()]
        );
    }

    #[test]
    fn test_alias_phrases_count_as_evidence() {
        let text = "Built models in torch\nDeployed with sklearn pipelines";
        let vocab = SkillVocabulary::standard();
        let evidence = find_evidence(text, &skills(&["PyTorch", "scikit-learn"]), 3, &vocab);
        assert_eq!(evidence.get("PyTorch").unwrap(), &["L1: Built models in torch".to_string()]);
        assert_eq!(
            evidence.get("scikit-learn").unwrap(),
            &["L2: Deployed with sklearn pipelines".to_string()]
        );
    }

    #[test]
    fn test_skills_without_evidence_are_omitted() {
        let evidence = find_evidence("Python only", &skills(&["Python", "AWS"]), 3, &SkillVocabulary::standard());
        assert_eq!(evidence.len(), 1);
        assert!(evidence.get("AWS").is_none());
    }

    #[test]
    fn test_empty_text_has_no_evidence() {
        let evidence = find_evidence("", &skills(&["Python"]), 3, &SkillVocabulary::standard());
        assert!(evidence.is_empty());
    }

    #[test]
    fn test_context_text_strips_prefixes() {
        let text = "Python services\nPython tooling";
        let evidence = find_evidence(text, &skills(&["Python"]), 3, &SkillVocabulary::standard());
        assert_eq!(evidence.context_text("Python"), "Python services Python tooling");
        assert_eq!(evidence.context_text("Go"), "");
    }

    #[test]
    fn test_strip_line_prefix() {
        assert_eq!(strip_line_prefix("L12: shipped it"), "shipped it");
        assert_eq!(strip_line_prefix("Lambda functions"), "Lambda functions");
        assert_eq!(strip_line_prefix("L7 no colon"), "L7 no colon");
    }

    #[test]
    fn test_evidence_map_serializes_as_plain_object() {
        let evidence = find_evidence("Go services", &skills(&["Go"]), 3, &SkillVocabulary::standard());
        let json = serde_json::to_value(&evidence).unwrap();
        assert_eq!(json, serde_json::json!({ "Go": ["L1: Go services"] }));
    }
}
