//! Tabular export — flattens analysis results into one CSV row per document.

use std::str::FromStr;

use thiserror::Error;

use crate::extraction::pipeline::{AnalysisResult, BatchItem};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer flush failed: {0}")]
    Flush(String),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub const COLUMNS: [&str; 20] = [
    "Filename",
    "Language",
    "Language Confidence",
    "Name",
    "Email",
    "Phone",
    "Address",
    "Skills",
    "Languages",
    "Certifications",
    "Summary",
    "Education Institution",
    "Education Degree",
    "Education Dates",
    "Experience Company",
    "Experience Title",
    "Experience Dates",
    "Overall Confidence",
    "Personal Info Confidence",
    "Skills Confidence",
];

const LIST_SEPARATOR: &str = ", ";

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// One analysis result as a flat row, in `COLUMNS` order.
/// Only the first education and experience entries are exported.
pub fn flatten(result: &AnalysisResult) -> [String; 20] {
    let info = &result.extracted_info;
    let personal = &info.personal_info.info;
    let education = info.education.first().map(|e| &e.entry);
    let experience = info.work_experience.first().map(|e| &e.entry);
    let scores = &info.confidence_scores;

    [
        text(&result.filename),
        result.language.display_name(result.language).to_string(),
        result.language_confidence.to_string(),
        text(&personal.name),
        text(&personal.email),
        text(&personal.phone),
        text(&personal.address),
        join(&info.skills),
        join(&info.languages),
        join(&info.certifications),
        text(&info.summary),
        education.map(|e| text(&e.institution)).unwrap_or_default(),
        education.map(|e| text(&e.degree)).unwrap_or_default(),
        education
            .and_then(|e| e.dates.as_ref())
            .map(|dates| join(dates))
            .unwrap_or_default(),
        experience.map(|e| text(&e.company)).unwrap_or_default(),
        experience.map(|e| text(&e.title)).unwrap_or_default(),
        experience
            .and_then(|e| e.dates.as_ref())
            .map(|dates| join(dates))
            .unwrap_or_default(),
        scores.overall.to_string(),
        scores.personal_info.to_string(),
        scores.skills.to_string(),
    ]
}

pub fn results_to_csv<'a>(
    results: impl IntoIterator<Item = &'a AnalysisResult>,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for result in results {
        writer.write_record(flatten(result))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Failed batch items have no row.
pub fn batch_to_csv(items: &[BatchItem]) -> Result<String, ExportError> {
    results_to_csv(items.iter().filter_map(BatchItem::result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::locale::LangCode;
    use crate::extraction::skills::SkillCategories;
    use crate::models::record::{
        ConfidenceScores, EducationEntry, PersonalInfo, ValidatedEducation, ValidatedPersonalInfo,
        ValidatedRecord,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn result(filename: &str) -> AnalysisResult {
        AnalysisResult {
            document_id: Uuid::new_v4(),
            filename: Some(filename.to_string()),
            language: LangCode::Ind,
            language_name: "Indonesian".into(),
            language_confidence: 0.75,
            extracted_info: ValidatedRecord {
                personal_info: ValidatedPersonalInfo {
                    info: PersonalInfo {
                        name: Some("Budi Santoso".into()),
                        email: Some("budi@example.co.id".into()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                skills: ["Python", "SQL"].iter().map(|s| s.to_string()).collect(),
                education: vec![ValidatedEducation {
                    entry: EducationEntry {
                        institution: Some("Institut Teknologi Bandung".into()),
                        dates: Some(vec!["2010".into(), "2014".into()]),
                        ..Default::default()
                    },
                    ..Default::default()
                }],
                confidence_scores: ConfidenceScores {
                    overall: 0.7,
                    personal_info: 1.0,
                    skills: 0.85,
                    ..Default::default()
                },
                ..Default::default()
            },
            skill_matches: vec![],
            skill_categories: SkillCategories::default(),
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(f)) if f == "xlsx"
        ));
    }

    #[test]
    fn test_flatten_row() {
        let row = flatten(&result("budi.pdf"));
        assert_eq!(row[0], "budi.pdf");
        assert_eq!(row[1], "Bahasa Indonesia");
        assert_eq!(row[2], "0.75");
        assert_eq!(row[3], "Budi Santoso");
        assert_eq!(row[5], "");
        assert_eq!(row[7], "Python, SQL");
        assert_eq!(row[11], "Institut Teknologi Bandung");
        assert_eq!(row[13], "2010, 2014");
        assert_eq!(row[14], "");
        assert_eq!(row[17], "0.7");
    }

    #[test]
    fn test_batch_csv_skips_failures() {
        let items = vec![
            BatchItem::Success(result("a.pdf")),
            BatchItem::Failed {
                filename: Some("b.pdf".into()),
                error: "Invalid document".into(),
            },
            BatchItem::Success(result("c.pdf")),
        ];
        let csv = batch_to_csv(&items).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Filename,Language,Language Confidence"));
        assert!(lines[1].starts_with("a.pdf,"));
        assert!(lines[2].starts_with("c.pdf,"));
        // list cells contain commas and are quoted
        assert!(lines[1].contains("\"Python, SQL\""));
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let csv = results_to_csv(std::iter::empty()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
