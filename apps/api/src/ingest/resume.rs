//! Resume sectioning and parsing into a `ResumeRecord`.

use std::collections::BTreeMap;

use crate::ingest::text::normalize_text;
use crate::models::ResumeRecord;
use crate::skills::{extract_skills, SkillVocabulary};

pub const CANONICAL_SECTIONS: &[&str] = &[
    "summary",
    "skills",
    "experience",
    "projects",
    "education",
    "certifications",
    "leadership",
    "awards",
    "publications",
    "other",
];

/// Normalized heading text → canonical section.
const HEADING_ALIASES: &[(&str, &str)] = &[
    ("summary", "summary"),
    ("professional summary", "summary"),
    ("profile", "summary"),
    ("objective", "summary"),
    ("skills", "skills"),
    ("technical skills", "skills"),
    ("technologies", "skills"),
    ("tech stack", "skills"),
    ("relevant skills, experiences and accomplishments", "skills"),
    ("experience", "experience"),
    ("work experience", "experience"),
    ("professional experience", "experience"),
    ("employment", "experience"),
    ("employment history", "experience"),
    ("projects", "projects"),
    ("personal projects", "projects"),
    ("selected projects", "projects"),
    ("project experience", "projects"),
    ("education", "education"),
    ("academic background", "education"),
    ("certifications", "certifications"),
    ("certificates", "certifications"),
    ("licenses", "certifications"),
    ("leadership", "leadership"),
    ("leadership experience", "leadership"),
    ("activities", "leadership"),
    ("extracurricular", "leadership"),
    ("awards", "awards"),
    ("honors", "awards"),
    ("honours", "awards"),
    ("publications", "publications"),
];

const BULLET_PREFIXES: &[char] = &['-', '•', '*', '–', '—'];
const SINGLE_WORD_CAPS_HEADINGS: &[&str] = &["education", "projects", "experience", "skills"];

/// Normalizes `raw`, splits it into sections and extracts both skill sets.
pub fn parse_resume(raw: &str, vocabulary: &SkillVocabulary) -> ResumeRecord {
    let text = normalize_text(raw);
    let sections = split_sections(&text);
    let skills_all = extract_skills(&text, vocabulary);
    let skills_section = extract_skills(
        sections.get("skills").map(String::as_str).unwrap_or_default(),
        vocabulary,
    );

    ResumeRecord {
        text,
        sections,
        skills_all,
        skills_section,
    }
}

/// Groups lines under canonical sections. Text before the first heading becomes the
/// summary and unknown headings collect under "other". Empty sections are dropped.
pub fn split_sections(text: &str) -> BTreeMap<String, String> {
    let mut sections: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut preamble: Vec<&str> = Vec::new();
    let mut current: Option<&str> = None;

    for line in text.split('\n') {
        if looks_like_heading(line) {
            current = Some(canonical_section(&normalize_heading(line)));
            continue;
        }
        match current {
            Some(section) => sections.entry(section).or_default().push(line),
            None => preamble.push(line),
        }
    }

    let summary_preamble = preamble
        .iter()
        .filter(|line| !line.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = BTreeMap::new();
    for (section, lines) in sections {
        let body = lines.join("\n").trim().to_string();
        if !body.is_empty() {
            out.insert(section.to_string(), body);
        }
    }

    let summary_preamble = summary_preamble.trim();
    if !summary_preamble.is_empty() {
        let summary = match out.remove("summary") {
            Some(body) => format!("{summary_preamble}\n{body}"),
            None => summary_preamble.to_string(),
        };
        out.insert("summary".to_string(), summary);
    }
    out
}

fn canonical_section(heading: &str) -> &'static str {
    HEADING_ALIASES
        .iter()
        .find(|(alias, _)| *alias == heading)
        .map(|(_, section)| *section)
        .unwrap_or("other")
}

fn normalize_heading(line: &str) -> String {
    let lowered = line.trim().to_lowercase();
    let collapsed = lowered
        .trim_end_matches(':')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    collapsed
        .trim_matches(|c: char| c == ' ' || c == '\t' || BULLET_PREFIXES.contains(&c))
        .to_string()
}

fn looks_like_heading(line: &str) -> bool {
    let raw = line.trim();
    if raw.is_empty() || raw.starts_with(BULLET_PREFIXES) || raw.chars().count() > 60 {
        return false;
    }

    let norm = normalize_heading(raw);
    if HEADING_ALIASES.iter().any(|(alias, _)| *alias == norm) {
        return true;
    }

    let len = raw.chars().count();
    let all_caps = raw.chars().any(char::is_alphabetic) && !raw.chars().any(char::is_lowercase);
    all_caps
        && (3..=30).contains(&len)
        && (raw.split_whitespace().count() >= 2 || SINGLE_WORD_CAPS_HEADINGS.contains(&norm.as_str()))
}
