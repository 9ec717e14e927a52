use serde::{Deserialize, Serialize};

/// One job posting as produced by ingestion. `skills` are canonical labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub text: String,
}
