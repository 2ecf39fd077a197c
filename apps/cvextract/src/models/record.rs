use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Start/end of an education or work period. Either side may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field: Option<String>,
    /// Up to two raw DATE entity texts from the same sentence.
    pub dates: Option<Vec<String>>,
    #[serde(default)]
    pub period: DateRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperienceEntry {
    pub company: Option<String>,
    pub title: Option<String>,
    pub dates: Option<Vec<String>>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub period: DateRange,
}

/// Heuristic confidence attached by the extractor (not the validator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub overall: f64,
    pub personal_info: f64,
    pub skills: f64,
    pub education: f64,
    pub work_experience: f64,
}

/// Raw extraction output for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub personal_info: PersonalInfo,
    pub skills: BTreeSet<String>,
    pub education: Vec<EducationEntry>,
    pub work_experience: Vec<WorkExperienceEntry>,
    pub languages: BTreeSet<String>,
    pub certifications: BTreeSet<String>,
    pub summary: Option<String>,
    pub confidence_scores: ConfidenceScores,
}

// ────────────────────────────────────────────────────────────────────────────
// Validated shapes — the extracted fields plus validity flags
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPersonalInfo {
    #[serde(flatten)]
    pub info: PersonalInfo,
    pub name_valid: bool,
    pub email_valid: bool,
    pub phone_valid: bool,
    pub address_valid: bool,
}

impl ValidatedPersonalInfo {
    pub fn valid_field_count(&self) -> usize {
        [self.name_valid, self.email_valid, self.phone_valid, self.address_valid]
            .iter()
            .filter(|&&v| v)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedEducation {
    #[serde(flatten)]
    pub entry: EducationEntry,
    pub institution_valid: bool,
    pub degree_valid: bool,
    pub dates_valid: bool,
    /// Mirrors `institution_valid`.
    pub valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedExperience {
    #[serde(flatten)]
    pub entry: WorkExperienceEntry,
    pub company_valid: bool,
    pub title_valid: bool,
    pub dates_valid: bool,
    pub responsibilities_valid: bool,
    /// Mirrors `company_valid`.
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationScores {
    pub overall_score: f64,
    pub personal_info_score: f64,
    pub education_score: f64,
    pub experience_score: f64,
    pub skills_score: f64,
}

/// An `ExtractedRecord` after field validation, with scores attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub personal_info: ValidatedPersonalInfo,
    pub skills: BTreeSet<String>,
    pub education: Vec<ValidatedEducation>,
    pub work_experience: Vec<ValidatedExperience>,
    pub languages: BTreeSet<String>,
    pub certifications: BTreeSet<String>,
    pub summary: Option<String>,
    pub confidence_scores: ConfidenceScores,
    pub validation: ValidationScores,
}
