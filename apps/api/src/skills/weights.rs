//! Skill importance weights used by the weighted lexical score.

use std::collections::HashMap;

/// Weight for any skill absent from the table.
pub const DEFAULT_WEIGHT: f64 = 1.0;

const STANDARD_WEIGHTS: &[(&str, f64)] = &[
    // Cloud / DevOps
    ("AWS", 3.0),
    ("Docker", 3.0),
    ("Kubernetes", 3.0),
    ("CI/CD", 2.5),
    ("Jenkins", 2.0),
    ("Terraform", 2.5),
    ("Linux", 2.5),
    // Core SWE
    ("Python", 2.5),
    ("Java", 2.5),
    ("C++", 2.5),
    ("C", 2.0),
    ("SQL", 2.0),
    ("Git", 2.0),
    ("Version Control", 2.0),
    ("Unit Testing", 2.0),
    ("Code Review", 1.8),
    // Data / ML
    ("TensorFlow", 2.0),
    ("PyTorch", 2.0),
    ("MLflow", 2.0),
    ("Airflow", 2.0),
    // Process
    ("Agile", 1.0),
    ("Scrum", 1.0),
    ("Shell", 1.2),
    ("Bash", 1.2),
    // Embedded / hardware
    ("Verilog", 1.8),
    ("FPGA", 1.8),
    ("NoSQL", 1.5),
    ("Pip", 1.0),
];

/// Canonical skill → non-negative importance weight.
#[derive(Debug, Clone)]
pub struct SkillWeights {
    weights: HashMap<String, f64>,
}

impl SkillWeights {
    pub fn standard() -> Self {
        Self::from_pairs(STANDARD_WEIGHTS)
    }

    /// Negative weights are clamped to zero.
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self {
            weights: pairs
                .iter()
                .map(|(skill, weight)| (skill.to_string(), weight.max(0.0)))
                .collect(),
        }
    }

    pub fn weight(&self, skill: &str) -> f64 {
        self.weights.get(skill).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Sum of weights over `skills`.
    pub fn total<'a>(&self, skills: impl IntoIterator<Item = &'a String>) -> f64 {
        skills.into_iter().map(|s| self.weight(s)).sum()
    }
}

impl Default for SkillWeights {
    fn default() -> Self {
        Self::standard()
    }
}
