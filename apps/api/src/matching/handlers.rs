//! Axum route handlers for skill extraction and job matching.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::ingest::{parse_postings, parse_resume, read_upload};
use crate::matching::engine::{MatchEngine, MatchRecord};
use crate::matching::report::MatchReport;
use crate::matching::view::{ResultView, SortBy};
use crate::models::SkillsSource;
use crate::skills::{extract_skills, find_evidence, EvidenceMap};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractSkillsRequest {
    pub text: String,
    pub max_lines_per_skill: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ExtractSkillsResponse {
    pub skills: Vec<String>,
    pub evidence: EvidenceMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchOptions {
    #[serde(default)]
    pub skills_source: SkillsSource,
    pub min_score: Option<f64>,
    #[serde(default)]
    pub sort_by: SortBy,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub resume_text: String,
    pub postings_text: String,
    #[serde(flatten)]
    pub options: MatchOptions,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub resume_skills: Vec<String>,
    pub job_count: usize,
    pub results: Vec<MatchRecord>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/skills/extract
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    Json(request): Json<ExtractSkillsRequest>,
) -> Result<Json<ExtractSkillsResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    let max_lines = request
        .max_lines_per_skill
        .unwrap_or(state.config.evidence_max_lines);
    if max_lines == 0 {
        return Err(AppError::Validation(
            "max_lines_per_skill must be at least 1".to_string(),
        ));
    }

    let skills = extract_skills(&request.text, &state.vocabulary);
    let evidence = find_evidence(&request.text, &skills, max_lines, &state.vocabulary);
    Ok(Json(ExtractSkillsResponse { skills, evidence }))
}

/// POST /api/v1/match
///
/// Scores every posting in `postings_text` against the resume and persists the report.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let response = run_match(state, request.resume_text, request.postings_text, request.options).await?;
    Ok(Json(response))
}

/// POST /api/v1/match/upload
///
/// Multipart form: `resume` (.txt or .pdf) and `postings` (.txt) files, plus optional
/// `skills_source`, `min_score` and `sort_by` text fields.
pub async fn handle_match_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchResponse>, AppError> {
    let mut resume_upload = None;
    let mut postings_upload = None;
    let mut options = MatchOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read field '{name}': {e}")))?;

        match name.as_str() {
            "resume" => resume_upload = Some((file_name, bytes.to_vec())),
            "postings" => postings_upload = Some((file_name, bytes.to_vec())),
            "skills_source" | "min_score" | "sort_by" => {
                let value = String::from_utf8_lossy(&bytes).trim().to_string();
                apply_option(&mut options, &name, &value)?;
            }
            _ => {}
        }
    }

    let resume_upload =
        resume_upload.ok_or_else(|| AppError::Validation("missing 'resume' file".to_string()))?;
    let postings_upload =
        postings_upload.ok_or_else(|| AppError::Validation("missing 'postings' file".to_string()))?;

    let (resume_text, postings_text) = decode_uploads(resume_upload, postings_upload).await?;
    let response = run_match(state, resume_text, postings_text, options).await?;
    Ok(Json(response))
}

/// GET /api/v1/match/report
pub async fn handle_get_report(
    State(state): State<AppState>,
) -> Result<Json<MatchReport>, AppError> {
    let path = state.config.report_path.clone();
    let report = tokio::task::spawn_blocking(move || MatchReport::load(&path))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed loading report: {e}")))??;

    report
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no match report has been generated yet".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared matching flow
// ────────────────────────────────────────────────────────────────────────────

fn apply_option(options: &mut MatchOptions, name: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Ok(());
    }
    let invalid = || AppError::Validation(format!("invalid value '{value}' for '{name}'"));
    match name {
        "skills_source" => {
            options.skills_source = serde_json::from_value(serde_json::json!(value)).map_err(|_| invalid())?
        }
        "sort_by" => options.sort_by = serde_json::from_value(serde_json::json!(value)).map_err(|_| invalid())?,
        "min_score" => options.min_score = Some(value.parse().map_err(|_| invalid())?),
        _ => {}
    }
    Ok(())
}

/// Decodes both uploads on the blocking pool; PDF extraction is CPU-bound.
async fn decode_uploads(
    resume: (String, Vec<u8>),
    postings: (String, Vec<u8>),
) -> Result<(String, String), AppError> {
    tokio::task::spawn_blocking(move || {
        let resume_text = read_upload(&resume.0, &resume.1)?;
        let postings_text = read_upload(&postings.0, &postings.1)?;
        Ok::<_, AppError>((resume_text, postings_text))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed decoding uploads: {e}")))?
}

/// Parses both inputs, scores on the blocking pool, persists the report and applies
/// the requested view.
async fn run_match(
    state: AppState,
    resume_text: String,
    postings_text: String,
    options: MatchOptions,
) -> Result<MatchResponse, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    if postings_text.trim().is_empty() {
        return Err(AppError::Validation("postings_text cannot be empty".to_string()));
    }
    let min_score = options.min_score.unwrap_or(0.0);
    if !(0.0..=1.0).contains(&min_score) {
        return Err(AppError::Validation("min_score must be within [0, 1]".to_string()));
    }

    let MatchOptions {
        skills_source,
        sort_by,
        ..
    } = options;

    let (resume_skills, ranked) = tokio::task::spawn_blocking(move || {
        let resume = parse_resume(&resume_text, &state.vocabulary);
        let jobs = parse_postings(&postings_text, &state.vocabulary);
        if jobs.is_empty() {
            return Err(AppError::UnprocessableEntity(
                "no job postings with a recognizable title and company were found".to_string(),
            ));
        }

        let resume_skills = skills_source.select(&resume).to_vec();
        let ranked = MatchEngine::new(&state.vocabulary, &state.weights, &state.matcher)
            .with_settings(state.config.match_settings())
            .match_jobs(&jobs, &resume_skills, &resume)?;

        MatchReport::build(&resume_skills, &ranked).save(&state.config.report_path)?;
        Ok((resume_skills, ranked))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in matching: {e}")))??;

    info!("Ranked {} jobs", ranked.len());
    let view = ResultView {
        min_score,
        sort_by,
    };
    Ok(MatchResponse {
        resume_skills,
        job_count: ranked.len(),
        results: view.apply(&ranked),
    })
}
