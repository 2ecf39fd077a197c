//! Analysis pipeline — document check, language resolution, extraction,
//! skill matching and validation for one document or a bulk batch.
//!
//! # Concurrency
//! A pipeline holds only read-only state, so one `Arc<ExtractionPipeline>` is
//! shared by every request. Bulk mode runs each document on the blocking pool,
//! with a `Semaphore` capping how many are in flight.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ExtractionError;
use crate::extraction::entities::EntityExtractor;
use crate::extraction::language::{LanguageDetector, LanguageGuess};
use crate::extraction::locale::LangCode;
use crate::extraction::skills::{categorize_skills, SkillCategories, SkillMatch};
use crate::extraction::validation::Validator;
use crate::models::document::AnnotatedDocument;
use crate::models::record::ValidatedRecord;

/// Explicit language tag, or `auto` to ask the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageChoice {
    #[default]
    Auto,
    Fixed(LangCode),
}

impl FromStr for LanguageChoice {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(LanguageChoice::Auto)
        } else {
            s.parse().map(LanguageChoice::Fixed)
        }
    }
}

impl LanguageChoice {
    /// `None` means auto.
    pub fn parse_optional(tag: Option<&str>) -> Result<Self, ExtractionError> {
        tag.map_or(Ok(LanguageChoice::Auto), str::parse)
    }
}

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub document_id: Uuid,
    pub filename: Option<String>,
    pub language: LangCode,
    pub language_name: String,
    pub language_confidence: f64,
    pub extracted_info: ValidatedRecord,
    pub skill_matches: Vec<SkillMatch>,
    pub skill_categories: SkillCategories,
    pub processed_at: DateTime<Utc>,
}

/// One document of a bulk request.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchDocument {
    #[serde(default)]
    pub filename: Option<String>,
    pub document: AnnotatedDocument,
}

/// Outcome of one bulk document. A failure never affects its neighbours.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItem {
    Success(AnalysisResult),
    Failed {
        filename: Option<String>,
        error: String,
    },
}

impl BatchItem {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            BatchItem::Success(result) => Some(result),
            BatchItem::Failed { .. } => None,
        }
    }
}

pub struct ExtractionPipeline {
    extractor: EntityExtractor,
    validator: Validator,
    detector: Arc<dyn LanguageDetector>,
    enabled: Vec<LangCode>,
}

impl ExtractionPipeline {
    pub fn new(
        extractor: EntityExtractor,
        detector: Arc<dyn LanguageDetector>,
        enabled: Vec<LangCode>,
    ) -> Self {
        Self {
            extractor,
            validator: Validator::new(),
            detector,
            enabled,
        }
    }

    pub fn enabled_languages(&self) -> &[LangCode] {
        &self.enabled
    }

    /// Rejects tags outside the enabled set.
    pub fn ensure_enabled(&self, lang: LangCode) -> Result<LangCode, ExtractionError> {
        if self.enabled.contains(&lang) {
            Ok(lang)
        } else {
            Err(ExtractionError::UnsupportedLanguage(lang.to_string()))
        }
    }

    fn resolve_language(
        &self,
        doc: &AnnotatedDocument,
        choice: LanguageChoice,
    ) -> Result<LanguageGuess, ExtractionError> {
        match choice {
            LanguageChoice::Fixed(lang) => Ok(LanguageGuess {
                lang: self.ensure_enabled(lang)?,
                confidence: 1.0,
            }),
            LanguageChoice::Auto => {
                let guess = self.detector.detect(&doc.text);
                debug!(
                    "Detected language {} ({:.2}) via {}",
                    guess.lang,
                    guess.confidence,
                    self.detector.backend_id()
                );
                Ok(guess)
            }
        }
    }

    /// Synchronous, CPU-bound. Call from `spawn_blocking` inside async code.
    pub fn analyze(
        &self,
        doc: &AnnotatedDocument,
        filename: Option<String>,
        choice: LanguageChoice,
    ) -> Result<AnalysisResult, ExtractionError> {
        doc.check()?;
        let guess = self.resolve_language(doc, choice)?;

        let extraction = self.extractor.extract_entities(doc, guess.lang);
        let skill_categories = categorize_skills(&extraction.skill_matches);
        let extracted_info = self.validator.validate_extracted_data(&extraction.record);

        debug!(
            "Analyzed {} ({}): {} skills, overall validation {:.2}",
            filename.as_deref().unwrap_or("<unnamed>"),
            guess.lang,
            extracted_info.skills.len(),
            extracted_info.validation.overall_score
        );

        Ok(AnalysisResult {
            document_id: Uuid::new_v4(),
            filename,
            language: guess.lang,
            language_name: guess.lang.display_name(LangCode::Eng).to_string(),
            language_confidence: guess.confidence,
            extracted_info,
            skill_matches: extraction.skill_matches,
            skill_categories,
            processed_at: Utc::now(),
        })
    }

    /// Analyzes every document with at most `workers` running at once.
    /// Results come back in input order.
    pub async fn analyze_batch(
        self: &Arc<Self>,
        documents: Vec<BatchDocument>,
        choice: LanguageChoice,
        workers: usize,
    ) -> Vec<BatchItem> {
        let filenames: Vec<Option<String>> =
            documents.iter().map(|d| d.filename.clone()).collect();
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut tasks = JoinSet::new();

        for (index, item) in documents.into_iter().enumerate() {
            let pipeline = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = tokio::task::spawn_blocking(move || {
                    pipeline.analyze(&item.document, item.filename, choice)
                })
                .await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<BatchItem>> = filenames.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!("Batch task failed: {e}");
                    continue;
                }
            };
            let error = match outcome {
                Ok(Ok(result)) => {
                    slots[index] = Some(BatchItem::Success(result));
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("worker failed: {e}"),
            };
            warn!(
                "Batch document {} failed: {error}",
                filenames[index].as_deref().unwrap_or("<unnamed>")
            );
            slots[index] = Some(BatchItem::Failed {
                filename: filenames[index].clone(),
                error,
            });
        }

        slots
            .into_iter()
            .zip(filenames)
            .map(|(slot, filename)| {
                slot.unwrap_or_else(|| BatchItem::Failed {
                    filename,
                    error: "worker aborted".to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::dates::DateNormalizer;
    use crate::extraction::language::StopwordLanguageDetector;
    use crate::extraction::skills::SkillsMatcher;
    use crate::models::document::{EntityLabel, EntitySpan, Sentence};
    use std::collections::{BTreeSet, HashMap};

    fn test_pipeline(enabled: Vec<LangCode>) -> Arc<ExtractionPipeline> {
        let dict: BTreeSet<String> = ["Python", "Docker", "Leadership"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let matcher = SkillsMatcher::new(
            HashMap::from([(LangCode::Eng, dict.clone()), (LangCode::Ind, dict)]),
            80,
        );
        let extractor = EntityExtractor::new(Arc::new(matcher), DateNormalizer::new());
        Arc::new(ExtractionPipeline::new(
            extractor,
            Arc::new(StopwordLanguageDetector::new(enabled.clone())),
            enabled,
        ))
    }

    fn doc(text: &str) -> AnnotatedDocument {
        AnnotatedDocument {
            text: text.to_string(),
            sentences: vec![Sentence {
                text: text.to_string(),
                start: 0,
                end: text.len(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_language_choice_parsing() {
        assert_eq!("auto".parse::<LanguageChoice>(), Ok(LanguageChoice::Auto));
        assert_eq!("IND".parse::<LanguageChoice>(), Ok(LanguageChoice::Fixed(LangCode::Ind)));
        assert!("xx".parse::<LanguageChoice>().is_err());
        assert_eq!(LanguageChoice::parse_optional(None), Ok(LanguageChoice::Auto));
    }

    #[test]
    fn test_analyze_fixed_language() {
        let pipeline = test_pipeline(LangCode::ALL.to_vec());
        let result = pipeline
            .analyze(&doc("Skilled in Python and Docker with strong leadership."), Some("cv.pdf".into()), LanguageChoice::Fixed(LangCode::Eng))
            .unwrap();
        assert_eq!(result.language, LangCode::Eng);
        assert_eq!(result.language_confidence, 1.0);
        assert_eq!(result.filename.as_deref(), Some("cv.pdf"));
        assert!(result.extracted_info.skills.contains("Docker"));
        assert_eq!(result.skill_categories.soft_skills, vec!["Leadership".to_string()]);
        assert_eq!(result.skill_matches.len(), 3);
    }

    #[test]
    fn test_analyze_auto_detects_indonesian() {
        let pipeline = test_pipeline(LangCode::ALL.to_vec());
        let result = pipeline
            .analyze(&doc("Saya bekerja sebagai insinyur di Jakarta dengan Python."), None, LanguageChoice::Auto)
            .unwrap();
        assert_eq!(result.language, LangCode::Ind);
        assert_eq!(result.language_name, "Indonesian");
    }

    #[test]
    fn test_disabled_language_is_rejected() {
        let pipeline = test_pipeline(vec![LangCode::Eng]);
        let err = pipeline
            .analyze(&doc("Saya bekerja di Jakarta."), None, LanguageChoice::Fixed(LangCode::Ind))
            .unwrap_err();
        assert_eq!(err, ExtractionError::UnsupportedLanguage("ind".into()));
    }

    #[test]
    fn test_invalid_spans_are_rejected() {
        let pipeline = test_pipeline(LangCode::ALL.to_vec());
        let mut bad = doc("short");
        bad.entities.push(EntitySpan {
            text: "x".into(),
            start: 3,
            end: 40,
            label: EntityLabel::Person,
        });
        let err = pipeline.analyze(&bad, None, LanguageChoice::Auto).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let pipeline = test_pipeline(LangCode::ALL.to_vec());
        let mut broken = doc("broken");
        broken.sentences[0].end = 99;

        let documents = vec![
            BatchDocument { filename: Some("a.pdf".into()), document: doc("Python developer at the bank.") },
            BatchDocument { filename: Some("b.pdf".into()), document: broken },
            BatchDocument { filename: Some("c.pdf".into()), document: doc("Docker and Python in production.") },
        ];

        let items = pipeline.analyze_batch(documents, LanguageChoice::Auto, 2).await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].result().and_then(|r| r.filename.as_deref()), Some("a.pdf"));
        match &items[1] {
            BatchItem::Failed { filename, error } => {
                assert_eq!(filename.as_deref(), Some("b.pdf"));
                assert!(error.starts_with("Invalid document"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(items[2].result().and_then(|r| r.filename.as_deref()), Some("c.pdf"));
    }

    #[tokio::test]
    async fn test_batch_with_zero_workers_still_runs() {
        let pipeline = test_pipeline(LangCode::ALL.to_vec());
        let documents = vec![BatchDocument { filename: None, document: doc("Python") }];
        let items = pipeline.analyze_batch(documents, LanguageChoice::Fixed(LangCode::Eng), 0).await;
        assert!(items[0].result().is_some());
    }
}
