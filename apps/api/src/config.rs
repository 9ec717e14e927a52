use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::matching::MatchSettings;

/// Which encoder backs the semantic matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Frozen all-MiniLM-L6-v2 via fastembed.
    FastEmbed,
    /// Deterministic offline hashing encoder.
    Hashing,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fastembed" => Ok(Self::FastEmbed),
            "hashing" => Ok(Self::Hashing),
            other => bail!("EMBEDDING_BACKEND must be 'fastembed' or 'hashing', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every variable is optional; invalid values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_cache_dir: Option<PathBuf>,
    pub context_threshold: f64,
    pub context_penalty: f64,
    pub evidence_max_lines: usize,
    pub report_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = MatchSettings::default();
        let config = Config {
            port: parse_or(&lookup, "PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            embedding_backend: parse_or(&lookup, "EMBEDDING_BACKEND", EmbeddingBackend::FastEmbed)?,
            embedding_cache_dir: lookup("EMBEDDING_CACHE_DIR").map(PathBuf::from),
            context_threshold: parse_or(&lookup, "CONTEXT_SIMILARITY_THRESHOLD", defaults.context_threshold)
                .context("CONTEXT_SIMILARITY_THRESHOLD must be a number")?,
            context_penalty: parse_or(&lookup, "CONTEXT_PENALTY_FACTOR", defaults.context_penalty)
                .context("CONTEXT_PENALTY_FACTOR must be a number")?,
            evidence_max_lines: parse_or(&lookup, "EVIDENCE_MAX_LINES", defaults.evidence_max_lines)
                .context("EVIDENCE_MAX_LINES must be a positive integer")?,
            report_path: lookup("REPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/match_report.json")),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.context_threshold) {
            bail!("CONTEXT_SIMILARITY_THRESHOLD must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.context_penalty) {
            bail!("CONTEXT_PENALTY_FACTOR must be within [0, 1]");
        }
        if self.evidence_max_lines == 0 {
            bail!("EVIDENCE_MAX_LINES must be at least 1");
        }
        Ok(())
    }

    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            context_threshold: self.context_threshold,
            context_penalty: self.context_penalty,
            evidence_max_lines: self.evidence_max_lines,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(Into::into),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.embedding_backend, EmbeddingBackend::FastEmbed);
        assert_eq!(config.match_settings(), MatchSettings::default());
        assert_eq!(config.report_path, PathBuf::from("data/match_report.json"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("EMBEDDING_BACKEND", "Hashing"),
            ("CONTEXT_PENALTY_FACTOR", "0.5"),
            ("EVIDENCE_MAX_LINES", "5"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.embedding_backend, EmbeddingBackend::Hashing);
        assert_eq!(config.context_penalty, 0.5);
        assert_eq!(config.evidence_max_lines, 5);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("CONTEXT_SIMILARITY_THRESHOLD", "1.5")]).is_err());
        assert!(config_from(&[("EVIDENCE_MAX_LINES", "0")]).is_err());
        assert!(config_from(&[("EMBEDDING_BACKEND", "openai")]).is_err());
    }
}
