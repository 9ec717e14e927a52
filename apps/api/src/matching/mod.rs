// Matching engine: context verification, semantic scoring, ranking and the report artifact.
// CPU-bound; HTTP handlers run it inside tokio::task::spawn_blocking.

pub mod context;
pub mod engine;
pub mod handlers;
pub mod report;
pub mod semantic;
pub mod view;

pub use engine::MatchSettings;
pub use semantic::{FastEmbedEncoder, HashingEncoder, SemanticMatcher};
