use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A parsed resume. `sections` only holds non-empty sections, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub text: String,
    #[serde(default)]
    pub sections: BTreeMap<String, String>,
    #[serde(default)]
    pub skills_all: Vec<String>,
    #[serde(default)]
    pub skills_section: Vec<String>,
}

impl ResumeRecord {
    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }
}

/// Which resume skill set feeds the lexical overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillsSource {
    #[default]
    All,
    Section,
}

impl SkillsSource {
    pub fn select<'a>(&self, resume: &'a ResumeRecord) -> &'a [String] {
        match self {
            SkillsSource::All => &resume.skills_all,
            SkillsSource::Section => &resume.skills_section,
        }
    }
}
