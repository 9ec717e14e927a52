//! Presentation-side filtering of ranked results. Never changes the persisted report.

use serde::{Deserialize, Serialize};

use crate::matching::engine::MatchRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Engine ranking.
    #[default]
    Score,
    Semantic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResultView {
    pub min_score: f64,
    pub sort_by: SortBy,
}

impl ResultView {
    pub fn apply(&self, ranked: &[MatchRecord]) -> Vec<MatchRecord> {
        let mut shown: Vec<MatchRecord> = ranked
            .iter()
            .filter(|r| r.score >= self.min_score)
            .cloned()
            .collect();
        if self.sort_by == SortBy::Semantic {
            shown.sort_by(|a, b| b.semantic_score.total_cmp(&a.semantic_score));
        }
        shown
    }
}
