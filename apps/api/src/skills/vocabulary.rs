//! Skill vocabulary — canonical skill list, alias map and the strict-skill pattern table.
//!
//! Everything here is authoring-time data. `SkillVocabulary::standard()` compiles it once
//! at startup and the result is shared read-only (it lives in `AppState`).

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;

/// Canonical skills, grouped the way recruiters tend to group them.
pub const CANONICAL_SKILLS: &[&str] = &[
    // Languages
    "Python", "Java", "C++", "C#", "JavaScript", "TypeScript", "Go", "SQL", "Shell", "Bash", "C",
    "Verilog",
    // ML frameworks
    "TensorFlow", "Torch", "PyTorch", "Keras", "scikit-learn", "XGBoost", "LightGBM",
    // Data frameworks
    "NumPy", "Pandas", "Matplotlib", "Seaborn", "Plotly", "SQLAlchemy", "Spark",
    // NLP
    "spaCy", "NLTK", "Transformers", "HuggingFace", "BERT", "GPT", "Word2Vec",
    // Work practices
    "Test Driven Development", "TDD", "CI/CD", "Git", "Version Control", "Unit Testing",
    "Code Review", "Agile", "Scrum", "Paired Programming",
    // Databases
    "PostgreSQL", "MySQL", "MongoDB", "NoSQL", "Redis", "SQLite",
    // Cloud / DevOps / MLOps
    "AWS", "EC2", "S3", "Lambda", "VPC", "Docker", "Kubernetes", "Terraform", "Jenkins", "MLflow",
    "Kubeflow", "Airflow", "Tecton", "Luigi",
    // Misc
    "REST API", "GraphQL", "Flask", "FastAPI", "Docker Compose", "Pip", "Conda", "Jupyter",
    "VSCode", "Linux", "FPGA", "Testing",
];

/// Variant phrase (lowercase) → canonical skill.
pub const ALIASES: &[(&str, &str)] = &[
    // ML / frameworks
    ("torch", "PyTorch"),
    ("pytorch", "PyTorch"),
    ("huggingface", "HuggingFace"),
    ("hugging face", "HuggingFace"),
    ("mlflow", "MLflow"),
    ("ml flow", "MLflow"),
    ("scikit learn", "scikit-learn"),
    ("sklearn", "scikit-learn"),
    ("scikit-learn", "scikit-learn"),
    // Dev practices
    ("cicd", "CI/CD"),
    ("ci cd", "CI/CD"),
    ("ci/cd", "CI/CD"),
    ("test driven development", "Test Driven Development"),
    ("tdd", "TDD"),
    ("unit tests", "Unit Testing"),
    ("unit-tests", "Unit Testing"),
    ("unit-test", "Unit Testing"),
];

/// Skills too short or symbolic for substring matching: lowercase key → canonical.
pub const STRICT_SKILLS: &[(&str, &str)] = &[
    ("go", "Go"),
    ("sql", "SQL"),
    ("c++", "C++"),
    ("c#", "C#"),
    ("c", "C"),
];

/// A strict skill and its compiled boundary-guarded pattern.
#[derive(Debug, Clone)]
pub struct StrictSkill {
    pub key: String,
    pub canonical: String,
    pub pattern: Regex,
}

/// Immutable, compiled view over the skill tables.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    skills: Vec<String>,
    aliases: HashMap<String, String>,
    reverse_aliases: HashMap<String, Vec<String>>,
    strict: Vec<StrictSkill>,
    strict_keys: HashSet<String>,
}

impl SkillVocabulary {
    /// Builds the vocabulary shipped with the service.
    pub fn standard() -> Self {
        Self::new(CANONICAL_SKILLS, ALIASES, STRICT_SKILLS)
    }

    pub fn new(skills: &[&str], aliases: &[(&str, &str)], strict: &[(&str, &str)]) -> Self {
        let mut seen = HashSet::new();
        let skills: Vec<String> = skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && seen.insert(s.to_string()))
            .map(String::from)
            .collect();

        let aliases: HashMap<String, String> = aliases
            .iter()
            .map(|(alias, canonical)| (normalize_phrase(alias), canonical.to_string()))
            .collect();

        // Sorted so needle order (and therefore evidence output) is reproducible.
        let mut reverse: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (alias, canonical) in &aliases {
            reverse.entry(canonical.clone()).or_default().push(alias.clone());
        }
        let reverse_aliases = reverse
            .into_iter()
            .map(|(canonical, mut phrases)| {
                phrases.sort();
                (canonical, phrases)
            })
            .collect();

        let strict: Vec<StrictSkill> = strict
            .iter()
            .map(|(key, canonical)| StrictSkill {
                key: key.to_string(),
                canonical: canonical.to_string(),
                pattern: boundary_pattern(&[key]),
            })
            .collect();
        let strict_keys = strict.iter().map(|s| s.key.clone()).collect();

        Self {
            skills,
            aliases,
            reverse_aliases,
            strict,
            strict_keys,
        }
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn strict_skills(&self) -> &[StrictSkill] {
        &self.strict
    }

    /// True when `skill` (any casing) must only be matched through its boundary pattern.
    pub fn is_strict(&self, skill: &str) -> bool {
        self.strict_keys.contains(&skill.trim().to_lowercase())
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    /// The only path from a raw skill label to a canonical one.
    /// Unknown labels are returned unchanged.
    pub fn canonicalize(&self, raw: &str) -> String {
        let key = normalize_phrase(raw);
        match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => raw.trim().to_string(),
        }
    }

    /// Alias phrases that resolve to `canonical`.
    pub fn aliases_for(&self, canonical: &str) -> &[String] {
        self.reverse_aliases
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Canonical name plus every alias, lowercased and de-duplicated.
    pub fn needles_for(&self, canonical: &str) -> Vec<String> {
        let mut needles = vec![canonical.to_lowercase()];
        for alias in self.aliases_for(canonical) {
            if !needles.contains(alias) {
                needles.push(alias.clone());
            }
        }
        needles
    }
}

/// Lowercases and collapses internal whitespace.
pub fn normalize_phrase(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case-insensitive pattern matching any needle that is not immediately preceded or
/// followed by an ASCII alphanumeric character.
pub fn boundary_pattern<S: AsRef<str>>(needles: &[S]) -> Regex {
    let alternation = needles
        .iter()
        .map(|n| regex::escape(n.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)(?:^|[^a-zA-Z0-9])(?:{alternation})(?:[^a-zA-Z0-9]|$)");
    Regex::new(&pattern).expect("escaped boundary pattern is always valid")
}
