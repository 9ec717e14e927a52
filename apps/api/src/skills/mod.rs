// Skill vocabulary, extraction, evidence and weights.
// Every skill label the service emits passes through `SkillVocabulary::canonicalize`.

pub mod evidence;
pub mod extractor;
pub mod vocabulary;
pub mod weights;

pub use evidence::{find_evidence, EvidenceMap, DEFAULT_MAX_LINES_PER_SKILL};
pub use extractor::extract_skills;
pub use vocabulary::SkillVocabulary;
pub use weights::SkillWeights;
