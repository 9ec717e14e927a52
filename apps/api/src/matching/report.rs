//! The persisted match report: a ranked summary without evidence payloads.

use std::io::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::AppError;
use crate::matching::engine::MatchRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResume {
    pub skills_used: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub rank: usize,
    pub title: String,
    pub company: String,
    pub score: f64,
    pub semantic_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// UTC, RFC 3339.
    pub generated_at: String,
    pub resume: ReportResume,
    pub results: Vec<ReportEntry>,
}

impl MatchReport {
    /// `ranked` must already be in engine rank order; ranks start at 1.
    pub fn build(skills_used: &[String], ranked: &[MatchRecord]) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            resume: ReportResume {
                skills_used: skills_used.to_vec(),
            },
            results: ranked
                .iter()
                .enumerate()
                .map(|(i, record)| ReportEntry {
                    rank: i + 1,
                    title: record.title.clone(),
                    company: record.company.clone(),
                    score: record.score,
                    semantic_score: record.semantic_score,
                    matched_skills: record.matched_skills.clone(),
                    missing_skills: record.missing_skills.clone(),
                })
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Writes the report atomically, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(self.to_json_pretty()?.as_bytes())?;
        file.persist(path).map_err(|e| e.error)?;

        info!("Saved match report ({} results) to {}", self.results.len(), path.display());
        Ok(())
    }

    /// `Ok(None)` when no report has been written yet.
    pub fn load(path: &Path) -> Result<Option<Self>, AppError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Some(Self::from_json(&raw)?))
    }
}
