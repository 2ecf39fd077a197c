//! CV entity extraction and normalization.
//!
//! Flow: AnnotatedDocument → language → EntityExtractor (dates, skills) →
//! Validator → AnalysisResult, optionally flattened by `export`.

pub mod dates;
pub mod entities;
pub mod export;
pub mod handlers;
pub mod language;
pub mod locale;
pub mod pipeline;
pub mod skills;
pub mod validation;
