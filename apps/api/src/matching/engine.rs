//! Matching engine — weighted lexical overlap with context verification, a three-signal
//! semantic score, and a deterministic ranking over all jobs.
//!
//! `MatchEngine` borrows everything it needs (vocabulary, weights, encoder) so one
//! instance per request is free to build; the heavy pieces live in `AppState`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::matching::context::context_similarity;
use crate::matching::semantic::{Embedding, EncoderError, SemanticMatcher};
use crate::models::{JobRecord, ResumeRecord};
use crate::skills::{find_evidence, EvidenceMap, SkillVocabulary, SkillWeights};

/// Denominator floor for jobs whose skills carry no weight.
const WEIGHT_EPSILON: f64 = 1e-9;

// ────────────────────────────────────────────────────────────────────────────
// Settings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    /// Evidence similarity below this discounts the skill.
    pub context_threshold: f64,
    /// Multiplier applied to a discounted skill's weight.
    pub context_penalty: f64,
    pub evidence_max_lines: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            context_threshold: 0.4,
            context_penalty: 0.8,
            evidence_max_lines: crate::skills::DEFAULT_MAX_LINES_PER_SKILL,
        }
    }
}

/// Weights of the three semantic signals; they sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticWeights {
    pub experience: f64,
    pub full: f64,
    pub skills: f64,
}

impl Default for SemanticWeights {
    fn default() -> Self {
        Self {
            experience: 0.5,
            full: 0.3,
            skills: 0.2,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchEvidence {
    pub job: EvidenceMap,
    pub resume: EvidenceMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub job_id: u32,
    pub title: String,
    pub company: String,
    pub score: f64,
    pub semantic_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub job_skill_count: usize,
    pub matched_count: usize,
    pub matched_weight: f64,
    pub total_weight: f64,
    pub evidence: MatchEvidence,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

pub struct MatchEngine<'a> {
    vocabulary: &'a SkillVocabulary,
    weights: &'a SkillWeights,
    matcher: &'a SemanticMatcher,
    settings: MatchSettings,
    semantic_weights: SemanticWeights,
}

/// Resume-side embeddings, computed once per run.
struct ResumeEmbeddings {
    experience: Embedding,
    full: Embedding,
    skills: Embedding,
}

impl<'a> MatchEngine<'a> {
    pub fn new(
        vocabulary: &'a SkillVocabulary,
        weights: &'a SkillWeights,
        matcher: &'a SemanticMatcher,
    ) -> Self {
        Self {
            vocabulary,
            weights,
            matcher,
            settings: MatchSettings::default(),
            semantic_weights: SemanticWeights::default(),
        }
    }

    pub fn with_settings(mut self, settings: MatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_semantic_weights(mut self, semantic_weights: SemanticWeights) -> Self {
        self.semantic_weights = semantic_weights;
        self
    }

    /// Scores every job against the resume and returns the records in rank order.
    pub fn match_jobs(
        &self,
        jobs: &[JobRecord],
        resume_skills: &[String],
        resume: &ResumeRecord,
    ) -> Result<Vec<MatchRecord>, EncoderError> {
        self.match_jobs_with_progress(jobs, resume_skills, resume, |completed, total| {
            debug!("Scored job {completed}/{total}");
        })
    }

    /// Like `match_jobs`, calling `on_progress(completed, total)` after each job.
    pub fn match_jobs_with_progress(
        &self,
        jobs: &[JobRecord],
        resume_skills: &[String],
        resume: &ResumeRecord,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<Vec<MatchRecord>, EncoderError> {
        let resume_skill_set: BTreeSet<&str> = resume_skills.iter().map(String::as_str).collect();
        let resume_embeddings = self.embed_resume(resume, resume_skills)?;

        let mut records = Vec::with_capacity(jobs.len());
        for (i, job) in jobs.iter().enumerate() {
            records.push(self.match_job(job, &resume_skill_set, resume, &resume_embeddings)?);
            on_progress(i + 1, jobs.len());
        }

        rank(&mut records);
        info!(
            "Matched {} jobs against {} resume skills using {}",
            records.len(),
            resume_skill_set.len(),
            self.matcher.model_name()
        );
        Ok(records)
    }

    fn embed_resume(
        &self,
        resume: &ResumeRecord,
        resume_skills: &[String],
    ) -> Result<ResumeEmbeddings, EncoderError> {
        let joined_skills = resume_skills.join(" ");
        let skills_text = match resume.section("skills") {
            Some(section) if !section.trim().is_empty() => section,
            _ => joined_skills.as_str(),
        };
        let experience_text = resume.section("experience").unwrap_or_default();

        let mut embedded = self
            .matcher
            .encode_many(&[experience_text, resume.text.as_str(), skills_text])?
            .into_iter();
        let mut next = || embedded.next().unwrap_or_default();
        Ok(ResumeEmbeddings {
            experience: next(),
            full: next(),
            skills: next(),
        })
    }

    fn match_job(
        &self,
        job: &JobRecord,
        resume_skill_set: &BTreeSet<&str>,
        resume: &ResumeRecord,
        resume_embeddings: &ResumeEmbeddings,
    ) -> Result<MatchRecord, EncoderError> {
        let job_skills: BTreeSet<&str> = job.skills.iter().map(String::as_str).collect();
        let (matched, missing): (Vec<String>, Vec<String>) = job_skills
            .iter()
            .map(|s| s.to_string())
            .partition(|s| resume_skill_set.contains(s.as_str()));

        let cap = self.settings.evidence_max_lines;
        let job_evidence = find_evidence(&job.text, &matched, cap, self.vocabulary);
        let resume_evidence = find_evidence(&resume.text, &matched, cap, self.vocabulary);

        let total_weight: f64 = job_skills.iter().map(|s| self.weights.weight(s)).sum();
        let matched_weight: f64 = matched
            .iter()
            .map(|skill| self.verified_weight(skill, &job_evidence, &resume_evidence))
            .sum();
        let score = if total_weight > 0.0 {
            (matched_weight / total_weight.max(WEIGHT_EPSILON)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let semantic_score = self.semantic_score(job, resume_embeddings)?;
        debug!(
            "Job {} '{}': score {:.3}, semantic {:.3}",
            job.id, job.title, score, semantic_score
        );

        Ok(MatchRecord {
            job_id: job.id,
            title: job.title.clone(),
            company: job.company.clone(),
            score: round_to(score, 3),
            semantic_score: round_to(semantic_score, 3),
            job_skill_count: job_skills.len(),
            matched_count: matched.len(),
            matched_weight: round_to(matched_weight, 2),
            total_weight: round_to(total_weight, 2),
            matched_skills: matched,
            missing_skills: missing,
            evidence: MatchEvidence {
                job: job_evidence,
                resume: resume_evidence,
            },
        })
    }

    /// Base weight, discounted when both sides cite evidence whose context disagrees.
    fn verified_weight(&self, skill: &str, job: &EvidenceMap, resume: &EvidenceMap) -> f64 {
        let base = self.weights.weight(skill);
        if job.get(skill).is_none() || resume.get(skill).is_none() {
            return base;
        }

        match context_similarity(&job.context_text(skill), &resume.context_text(skill)) {
            Some(similarity) if similarity < self.settings.context_threshold => {
                debug!("Context for {skill} below threshold ({similarity:.3}), discounting");
                base * self.settings.context_penalty
            }
            _ => base,
        }
    }

    fn semantic_score(
        &self,
        job: &JobRecord,
        resume: &ResumeEmbeddings,
    ) -> Result<f64, EncoderError> {
        let job_skills_text = job.skills.join(", ");
        let embedded = self.matcher.encode_many(&[job.text.as_str(), job_skills_text.as_str()])?;
        let (job_full, job_skills) = match embedded.as_slice() {
            [full, skills] => (full, skills),
            _ => {
                return Err(EncoderError::BatchMismatch {
                    expected: 2,
                    got: embedded.len(),
                })
            }
        };

        let signal = |a: &[f32], b: &[f32]| f64::from(SemanticMatcher::similarity(a, b)).max(0.0);
        let w = self.semantic_weights;
        Ok(w.experience * signal(&resume.experience, job_full)
            + w.full * signal(&resume.full, job_full)
            + w.skills * signal(&resume.skills, job_skills))
    }
}

/// Stable descending sort by (score, semantic_score, matched_weight, matched_count).
pub fn rank(records: &mut [MatchRecord]) {
    records.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.semantic_score.total_cmp(&a.semantic_score))
            .then_with(|| b.matched_weight.total_cmp(&a.matched_weight))
            .then_with(|| b.matched_count.cmp(&a.matched_count))
    });
}

/// Rounds to `places` decimals, ties to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::semantic::{Encoder, HashingEncoder};

    struct Fixture {
        vocabulary: SkillVocabulary,
        weights: SkillWeights,
        matcher: SemanticMatcher,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                vocabulary: SkillVocabulary::standard(),
                weights: SkillWeights::standard(),
                matcher: SemanticMatcher::new(HashingEncoder::default()),
            }
        }

        fn with_encoder(encoder: impl Encoder + 'static) -> Self {
            Self {
                matcher: SemanticMatcher::new(encoder),
                ..Self::new()
            }
        }

        fn engine(&self) -> MatchEngine<'_> {
            MatchEngine::new(&self.vocabulary, &self.weights, &self.matcher)
        }
    }

    fn job(id: u32, skills: &[&str], text: &str) -> JobRecord {
        JobRecord {
            id,
            title: format!("Job {id}"),
            company: "Acme".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            text: text.to_string(),
        }
    }

    fn resume(text: &str, skills: &[&str]) -> ResumeRecord {
        ResumeRecord {
            text: text.to_string(),
            skills_all: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_weighted_score_without_penalty() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &["Python", "AWS"], "Python services\nAWS infrastructure")];
        let resume = resume("Python services", &["Python"]);

        let records = fx.engine().match_jobs(&jobs, &resume.skills_all, &resume).unwrap();
        let record = &records[0];
        assert_eq!(record.total_weight, 5.5);
        assert_eq!(record.matched_weight, 2.5);
        assert_eq!(record.score, 0.455);
        assert_eq!(record.matched_skills, vec!["Python"]);
        assert_eq!(record.missing_skills, vec!["AWS"]);
    }

    #[test]
    fn test_empty_resume_skills_score_zero() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &["Python", "AWS"], "Python services\nAWS infrastructure")];
        let resume = resume("", &[]);

        let records = fx.engine().match_jobs(&jobs, &[], &resume).unwrap();
        assert!(records[0].matched_skills.is_empty());
        assert_eq!(records[0].missing_skills, vec!["AWS", "Python"]);
        assert_eq!(records[0].score, 0.0);
    }

    #[test]
    fn test_job_without_skills_scores_zero() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &[], "We value curiosity")];
        let resume = resume("Python services", &["Python"]);

        let records = fx.engine().match_jobs(&jobs, &resume.skills_all, &resume).unwrap();
        assert_eq!(records[0].score, 0.0);
        assert_eq!(records[0].total_weight, 0.0);
        assert_eq!(records[0].job_skill_count, 0);
    }

    #[test]
    fn test_context_mismatch_discounts_weight() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &["Python", "AWS"], "Python notebooks for analytics\nAWS")];
        let resume = resume("Python backend services", &["Python"]);

        let records = fx.engine().match_jobs(&jobs, &resume.skills_all, &resume).unwrap();
        assert_eq!(records[0].matched_weight, 2.0);
        assert_eq!(records[0].score, 0.364);
    }

    #[test]
    fn test_missing_resume_evidence_keeps_base_weight() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &["Python"], "Python notebooks")];
        let resume = resume("Backend engineer", &["Python"]);

        let records = fx.engine().match_jobs(&jobs, &resume.skills_all, &resume).unwrap();
        assert_eq!(records[0].matched_weight, 2.5);
        assert_eq!(records[0].score, 1.0);
        assert!(records[0].evidence.resume.is_empty());
    }

    #[test]
    fn test_settings_override_penalty() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &["Python"], "Python notebooks")];
        let resume = resume("Python services", &["Python"]);
        let settings = MatchSettings {
            context_penalty: 0.5,
            ..MatchSettings::default()
        };

        let records = fx
            .engine()
            .with_settings(settings)
            .match_jobs(&jobs, &resume.skills_all, &resume)
            .unwrap();
        assert_eq!(records[0].matched_weight, 1.25);
    }

    #[test]
    fn test_matched_and_missing_partition_job_skills() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &["Docker", "Go", "Python", "SQL"], "Go and SQL with Docker")];
        let resume = resume("Go services, Docker", &["Docker", "Go"]);

        let record = &fx.engine().match_jobs(&jobs, &resume.skills_all, &resume).unwrap()[0];
        let mut union: Vec<String> = record
            .matched_skills
            .iter()
            .chain(&record.missing_skills)
            .cloned()
            .collect();
        union.sort();
        assert_eq!(union, vec!["Docker", "Go", "Python", "SQL"]);
        assert!(record.matched_skills.iter().all(|s| !record.missing_skills.contains(s)));
        assert_eq!(record.matched_count, 2);
        assert_eq!(record.job_skill_count, 4);
    }

    #[test]
    fn test_scores_are_bounded() {
        let fx = Fixture::new();
        let jobs = vec![
            job(1, &["Python", "AWS"], "Python and AWS for data"),
            job(2, &["Kubernetes"], "Kubernetes operators"),
            job(3, &[], ""),
        ];
        let resume = resume("Python and AWS for data", &["AWS", "Python"]);

        for record in fx.engine().match_jobs(&jobs, &resume.skills_all, &resume).unwrap() {
            assert!((0.0..=1.0).contains(&record.score));
            assert!((-1.0..=1.0).contains(&record.semantic_score));
        }
    }

    #[test]
    fn test_ranking_is_deterministic_and_ordered() {
        let fx = Fixture::new();
        let jobs = vec![
            job(1, &["Kubernetes"], "Kubernetes operators"),
            job(2, &["Python"], "Python services"),
            job(3, &["Python", "AWS"], "Python services\nAWS"),
            job(4, &["Python"], "Python services"),
        ];
        let resume = resume("Python services", &["Python"]);
        let engine = fx.engine();

        let first = engine.match_jobs(&jobs, &resume.skills_all, &resume).unwrap();
        let second = engine.match_jobs(&jobs, &resume.skills_all, &resume).unwrap();
        let ids: Vec<u32> = first.iter().map(|r| r.job_id).collect();
        assert_eq!(ids, second.iter().map(|r| r.job_id).collect::<Vec<_>>());
        // Identical jobs 2 and 4 keep input order.
        assert_eq!(ids[..2], [2, 4]);
        assert_eq!(*ids.last().unwrap(), 1);
    }

    #[test]
    fn test_progress_reports_every_job() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &["Python"], "Python"), job(2, &["AWS"], "AWS")];
        let resume = resume("Python", &["Python"]);
        let mut seen = Vec::new();

        fx.engine()
            .match_jobs_with_progress(&jobs, &resume.skills_all, &resume, |done, total| {
                seen.push((done, total))
            })
            .unwrap();
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_rank_breaks_ties_by_matched_count() {
        let record = |job_id, matched_count| MatchRecord {
            job_id,
            title: String::new(),
            company: String::new(),
            score: 0.5,
            semantic_score: 0.2,
            matched_skills: vec![],
            missing_skills: vec![],
            job_skill_count: 4,
            matched_count,
            matched_weight: 2.0,
            total_weight: 4.0,
            evidence: MatchEvidence::default(),
        };
        let mut records = vec![record(1, 1), record(2, 3)];
        rank(&mut records);
        assert_eq!(records[0].job_id, 2);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.5 / 5.5, 3), 0.455);
        assert_eq!(round_to(1.996, 2), 2.0);
    }

    #[test]
    fn test_round_to_breaks_exact_halves_to_even() {
        assert_eq!(round_to(1.0 / 16.0, 3), 0.062);
        assert_eq!(round_to(5.0 / 16.0, 3), 0.312);
        assert_eq!(round_to(3.0 / 16.0, 3), 0.188);
    }

    #[test]
    fn test_stop_word_only_context_keeps_base_weight() {
        let fx = Fixture::new();
        let jobs = vec![job(1, &["Go"], "Go")];
        let resume = resume("we go", &["Go"]);

        let record = &fx.engine().match_jobs(&jobs, &resume.skills_all, &resume).unwrap()[0];
        assert!(record.evidence.job.get("Go").is_some());
        assert!(record.evidence.resume.get("Go").is_some());
        assert_eq!(record.matched_weight, 1.0);
        assert_eq!(record.score, 1.0);
    }

    /// "exp" → [1, 0], "neg" → [-1, 0], anything else → [0, 1].
    struct AxisEncoder;

    impl Encoder for AxisEncoder {
        fn model_name(&self) -> &str {
            "axis"
        }
        fn dimension(&self) -> usize {
            2
        }
        fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncoderError> {
            Ok(texts
                .iter()
                .map(|t| match *t {
                    "exp" => vec![1.0, 0.0],
                    "neg" => vec![-1.0, 0.0],
                    _ => vec![0.0, 1.0],
                })
                .collect())
        }
    }

    fn axis_resume(skills_section: Option<&str>) -> ResumeRecord {
        let mut sections = std::collections::BTreeMap::new();
        sections.insert("experience".to_string(), "exp".to_string());
        if let Some(body) = skills_section {
            sections.insert("skills".to_string(), body.to_string());
        }
        ResumeRecord {
            text: "full resume".to_string(),
            sections,
            skills_all: vec!["Python".to_string()],
            skills_section: vec![],
        }
    }

    fn semantic_for(fx: &Fixture, job_text: &str, resume: &ResumeRecord) -> f64 {
        let jobs = vec![job(1, &["Python"], job_text)];
        fx.engine().match_jobs(&jobs, &resume.skills_all, resume).unwrap()[0].semantic_score
    }

    #[test]
    fn test_semantic_score_weights_three_signals() {
        let fx = Fixture::with_encoder(AxisEncoder);
        let resume = axis_resume(None);
        // experience 1.0 × 0.5, full 0.0 × 0.3, joined skills 1.0 × 0.2
        assert_eq!(semantic_for(&fx, "exp", &resume), 0.7);
    }

    #[test]
    fn test_semantic_score_clamps_negative_similarity() {
        let fx = Fixture::with_encoder(AxisEncoder);
        let resume = axis_resume(None);
        // experience cosine is -1 and counts as 0; only the skills signal remains.
        assert_eq!(semantic_for(&fx, "neg", &resume), 0.2);
    }

    #[test]
    fn test_semantic_score_prefers_skills_section() {
        let fx = Fixture::with_encoder(AxisEncoder);
        // The section ("neg") replaces the joined skill list and opposes the job skills.
        let resume = axis_resume(Some("neg"));
        assert_eq!(semantic_for(&fx, "exp", &resume), 0.5);
    }

    #[test]
    fn test_semantic_weights_are_configurable() {
        let fx = Fixture::with_encoder(AxisEncoder);
        let resume = axis_resume(None);
        let jobs = vec![job(1, &["Python"], "exp")];
        let weights = SemanticWeights {
            experience: 0.0,
            full: 0.0,
            skills: 1.0,
        };
        let record = &fx
            .engine()
            .with_semantic_weights(weights)
            .match_jobs(&jobs, &resume.skills_all, &resume)
            .unwrap()[0];
        assert_eq!(record.semantic_score, 1.0);
    }
}
