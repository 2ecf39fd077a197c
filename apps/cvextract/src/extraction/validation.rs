//! Validator — per-field validity flags and weighted completeness scores.
//!
//! Validation never fails and never mutates its input; it returns a fresh
//! `ValidatedRecord` carrying the original values next to their flags.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::record::{
    EducationEntry, ExtractedRecord, PersonalInfo, ValidatedEducation, ValidatedExperience,
    ValidatedPersonalInfo, ValidatedRecord, ValidationScores, WorkExperienceEntry,
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+\d{1,3}[-.\s]?)?\(?\d{3,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{3,4}$").unwrap()
});

const MIN_NAME_CHARS: usize = 3;
const MIN_PHONE_DIGITS: usize = 7;
const MIN_ADDRESS_CHARS: usize = 10;
const MIN_INSTITUTION_CHARS: usize = 3;
const MIN_COMPANY_CHARS: usize = 2;
const MIN_SKILL_CHARS: usize = 2;

const PERSONAL_INFO_WEIGHT: f64 = 0.4;
const EDUCATION_WEIGHT: f64 = 0.2;
const EXPERIENCE_WEIGHT: f64 = 0.2;
const SKILLS_WEIGHT: f64 = 0.2;

/// Skill-count thresholds and their scores, highest first.
const SKILL_SCORE_STEPS: &[(usize, f64)] = &[(5, 1.0), (3, 0.8), (1, 0.5)];

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_extracted_data(&self, record: &ExtractedRecord) -> ValidatedRecord {
        let personal_info = self.validate_personal_info(&record.personal_info);
        let education: Vec<ValidatedEducation> =
            record.education.iter().map(|e| self.validate_education(e)).collect();
        let work_experience: Vec<ValidatedExperience> = record
            .work_experience
            .iter()
            .map(|e| self.validate_work_experience(e))
            .collect();
        let skills = self.validate_skills(&record.skills);

        let personal_info_score = compute_personal_info_score(&personal_info);
        let education_score = compute_education_score(&education);
        let experience_score = compute_experience_score(&work_experience);
        let skills_score = compute_skills_score(&skills);

        let validation = ValidationScores {
            overall_score: personal_info_score * PERSONAL_INFO_WEIGHT
                + education_score * EDUCATION_WEIGHT
                + experience_score * EXPERIENCE_WEIGHT
                + skills_score * SKILLS_WEIGHT,
            personal_info_score,
            education_score,
            experience_score,
            skills_score,
        };

        ValidatedRecord {
            personal_info,
            skills,
            education,
            work_experience,
            languages: record.languages.clone(),
            certifications: record.certifications.clone(),
            summary: record.summary.clone(),
            confidence_scores: record.confidence_scores,
            validation,
        }
    }

    pub fn validate_personal_info(&self, info: &PersonalInfo) -> ValidatedPersonalInfo {
        ValidatedPersonalInfo {
            name_valid: present(&info.name).is_some_and(is_valid_name),
            email_valid: present(&info.email).is_some_and(|e| EMAIL_RE.is_match(e)),
            phone_valid: present(&info.phone).is_some_and(is_valid_phone),
            address_valid: present(&info.address)
                .is_some_and(|a| a.chars().count() >= MIN_ADDRESS_CHARS),
            info: info.clone(),
        }
    }

    pub fn validate_education(&self, entry: &EducationEntry) -> ValidatedEducation {
        let institution_valid = present(&entry.institution)
            .is_some_and(|i| i.chars().count() >= MIN_INSTITUTION_CHARS);
        ValidatedEducation {
            institution_valid,
            degree_valid: present(&entry.degree).is_some(),
            dates_valid: has_dates(entry.dates.as_deref()),
            valid: institution_valid,
            entry: entry.clone(),
        }
    }

    pub fn validate_work_experience(&self, entry: &WorkExperienceEntry) -> ValidatedExperience {
        let company_valid =
            present(&entry.company).is_some_and(|c| c.chars().count() >= MIN_COMPANY_CHARS);
        ValidatedExperience {
            company_valid,
            title_valid: present(&entry.title).is_some(),
            dates_valid: has_dates(entry.dates.as_deref()),
            responsibilities_valid: !entry.responsibilities.is_empty(),
            valid: company_valid,
            entry: entry.clone(),
        }
    }

    /// Drops skills shorter than two characters.
    pub fn validate_skills(&self, skills: &BTreeSet<String>) -> BTreeSet<String> {
        skills
            .iter()
            .filter(|s| s.chars().count() >= MIN_SKILL_CHARS)
            .cloned()
            .collect()
    }
}

/// Treats empty strings like missing values.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn has_dates(dates: Option<&[String]>) -> bool {
    dates.is_some_and(|d| !d.is_empty())
}

fn is_valid_name(name: &str) -> bool {
    name.split_whitespace().next().is_some() && name.chars().count() >= MIN_NAME_CHARS
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    PHONE_RE.is_match(phone) && digits >= MIN_PHONE_DIGITS
}

/// Name and email together dominate: with both valid, three valid fields already score 1.0.
pub fn compute_personal_info_score(info: &ValidatedPersonalInfo) -> f64 {
    let valid = info.valid_field_count() as f64;
    if info.name_valid && info.email_valid {
        (valid / 3.0).min(1.0)
    } else {
        valid / 4.0
    }
}

pub fn compute_education_score(entries: &[ValidatedEducation]) -> f64 {
    presence_score(entries.iter().any(|e| e.valid))
}

pub fn compute_experience_score(entries: &[ValidatedExperience]) -> f64 {
    presence_score(entries.iter().any(|e| e.valid))
}

pub fn compute_skills_score(skills: &BTreeSet<String>) -> f64 {
    SKILL_SCORE_STEPS
        .iter()
        .find(|(min, _)| skills.len() >= *min)
        .map_or(0.0, |(_, score)| *score)
}

fn presence_score(any_valid: bool) -> f64 {
    if any_valid {
        1.0
    } else {
        0.0
    }
}
