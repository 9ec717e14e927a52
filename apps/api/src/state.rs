use std::sync::Arc;

use crate::config::Config;
use crate::matching::SemanticMatcher;
use crate::skills::{SkillVocabulary, SkillWeights};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub vocabulary: Arc<SkillVocabulary>,
    pub weights: Arc<SkillWeights>,
    /// Loaded once at startup; read-only afterwards.
    pub matcher: Arc<SemanticMatcher>,
}

impl AppState {
    pub fn new(config: Config, matcher: SemanticMatcher) -> Self {
        Self {
            config,
            vocabulary: Arc::new(SkillVocabulary::standard()),
            weights: Arc::new(SkillWeights::standard()),
            matcher: Arc::new(matcher),
        }
    }
}
