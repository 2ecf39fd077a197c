//! Axum route handlers for the Extraction API.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::dates::{range_from_spans, DateSpan};
use crate::extraction::export::{batch_to_csv, results_to_csv, ExportFormat};
use crate::extraction::locale::LangCode;
use crate::extraction::pipeline::{
    AnalysisResult, BatchDocument, BatchItem, ExtractionPipeline, LanguageChoice,
};
use crate::extraction::skills::{categorize_skills, SkillCategories, SkillMatch};
use crate::models::document::AnnotatedDocument;
use crate::models::record::DateRange;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub document: AnnotatedDocument,
    /// Language tag or "auto". Defaults to auto.
    pub language: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchExtractRequest {
    pub documents: Vec<BatchDocument>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchExtractResponse {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct DateRangeResponse {
    #[serde(flatten)]
    pub range: DateRange,
    pub dates: Vec<DateSpan>,
}

#[derive(Debug, Serialize)]
pub struct SkillMatchResponse {
    pub matches: Vec<SkillMatch>,
    pub categories: SkillCategories,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn export_format(query: &ExportQuery) -> Result<ExportFormat, AppError> {
    Ok(query
        .format
        .as_deref()
        .map(str::parse::<ExportFormat>)
        .transpose()?
        .unwrap_or_default())
}

/// Parses the language choice and rejects fixed tags that are not enabled.
fn language_choice(
    pipeline: &ExtractionPipeline,
    tag: Option<&str>,
) -> Result<LanguageChoice, AppError> {
    let choice = LanguageChoice::parse_optional(tag)?;
    if let LanguageChoice::Fixed(lang) = choice {
        pipeline.ensure_enabled(lang)?;
    }
    Ok(choice)
}

fn fixed_language(state: &AppState, tag: &str) -> Result<LangCode, AppError> {
    let lang: LangCode = tag.parse()?;
    Ok(state.pipeline.ensure_enabled(lang)?)
}

fn csv_response(body: String) -> Response {
    let filename = format!("cv_results_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/extract
///
/// Runs the full pipeline on one annotated document.
/// `?format=csv` returns a one-row CSV instead of JSON.
pub async fn handle_extract(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    Json(request): Json<ExtractRequest>,
) -> Result<Response, AppError> {
    let format = export_format(&query)?;
    let choice = language_choice(&state.pipeline, request.language.as_deref())?;

    let pipeline = Arc::clone(&state.pipeline);
    let result: AnalysisResult = tokio::task::spawn_blocking(move || {
        pipeline.analyze(&request.document, request.filename, choice)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}")))??;

    match format {
        ExportFormat::Json => Ok(Json(result).into_response()),
        ExportFormat::Csv => Ok(csv_response(results_to_csv([&result])?)),
    }
}

/// POST /api/v1/extract/batch
///
/// Bulk mode. Each document succeeds or fails on its own; order is preserved.
pub async fn handle_extract_batch(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    Json(request): Json<BatchExtractRequest>,
) -> Result<Response, AppError> {
    let format = export_format(&query)?;

    if request.documents.is_empty() {
        return Err(AppError::Validation("documents cannot be empty".to_string()));
    }
    if request.documents.len() > state.config.max_batch_size {
        return Err(AppError::Validation(format!(
            "batch of {} documents exceeds the limit of {}",
            request.documents.len(),
            state.config.max_batch_size
        )));
    }

    let choice = language_choice(&state.pipeline, request.language.as_deref())?;
    let results = state
        .pipeline
        .analyze_batch(request.documents, choice, state.config.parallel_workers)
        .await;

    match format {
        ExportFormat::Json => {
            let succeeded = results.iter().filter(|r| r.result().is_some()).count();
            Ok(Json(BatchExtractResponse {
                total: results.len(),
                succeeded,
                failed: results.len() - succeeded,
                results,
            })
            .into_response())
        }
        ExportFormat::Csv => Ok(csv_response(batch_to_csv(&results)?)),
    }
}

/// POST /api/v1/dates/range
pub async fn handle_date_range(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<DateRangeResponse>, AppError> {
    let lang = fixed_language(&state, &request.language)?;

    let dates = state.dates.extract_dates(&request.text, lang);
    Ok(Json(DateRangeResponse {
        range: range_from_spans(&request.text, &dates),
        dates,
    }))
}

/// POST /api/v1/skills/match
///
/// Fuzzy matching is CPU-bound, so it runs on the blocking pool.
pub async fn handle_skill_match(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<SkillMatchResponse>, AppError> {
    let lang = fixed_language(&state, &request.language)?;

    let skills = Arc::clone(&state.skills);
    let matches = tokio::task::spawn_blocking(move || skills.extract_skills(&request.text, lang))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in skill matching: {e}"))
        })?;

    let categories = categorize_skills(&matches);
    Ok(Json(SkillMatchResponse {
        matches,
        categories,
    }))
}
