use std::sync::Arc;

use crate::config::Config;
use crate::extraction::dates::DateNormalizer;
use crate::extraction::entities::EntityExtractor;
use crate::extraction::language::StopwordLanguageDetector;
use crate::extraction::pipeline::ExtractionPipeline;
use crate::extraction::skills::SkillsMatcher;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ExtractionPipeline>,
    /// Same matcher the pipeline uses, exposed for the standalone skills endpoint.
    pub skills: Arc<SkillsMatcher>,
    pub dates: DateNormalizer,
    pub config: Config,
}

impl AppState {
    /// Wires the pipeline around an already-loaded skills matcher.
    pub fn new(config: Config, skills: SkillsMatcher) -> Self {
        let skills = Arc::new(skills);
        let dates = DateNormalizer::new();
        let extractor = EntityExtractor::new(Arc::clone(&skills), dates.clone());
        let detector = Arc::new(StopwordLanguageDetector::new(config.supported_languages.clone()));
        let pipeline = Arc::new(ExtractionPipeline::new(
            extractor,
            detector,
            config.supported_languages.clone(),
        ));

        Self {
            pipeline,
            skills,
            dates,
            config,
        }
    }
}
