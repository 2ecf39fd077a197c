//! Entity Extractor — turns an annotated document into a raw `ExtractedRecord`.
//!
//! Each field extractor is independent and total: it returns the field's
//! "not found" value (None / empty) instead of failing, so one field never
//! blocks the others.

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::extraction::dates::DateNormalizer;
use crate::extraction::locale::{contains_any, LangCode, COMMON_LANGUAGES, TECH_SKILLS};
use crate::extraction::skills::{SkillMatch, SkillsMatcher};
use crate::models::document::{AnnotatedDocument, EntityLabel, PosTag, Sentence};
use crate::models::record::{
    ConfidenceScores, DateRange, EducationEntry, ExtractedRecord, PersonalInfo,
    WorkExperienceEntry,
};

pub(crate) static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap()
});
pub(crate) static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\+\d{1,3}[-.\s]?)?\(?\d{3,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b").unwrap()
});
static POSTAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{5}\b").unwrap());

/// Characters of text taken after a summary header.
const SUMMARY_WINDOW_CHARS: usize = 300;
/// Sentences inspected by the summary fallback.
const SUMMARY_FALLBACK_SENTENCES: usize = 3;
/// A fallback summary sentence needs more words than this.
const SUMMARY_MIN_WORDS: usize = 10;
/// Confidence for a non-empty skills / education / experience section.
const SECTION_CONFIDENCE: f64 = 0.85;

// ────────────────────────────────────────────────────────────────────────────
// Overall confidence ladder
// ────────────────────────────────────────────────────────────────────────────

/// One rung of the overall-confidence ladder.
pub struct ConfidenceRule {
    pub name: &'static str,
    pub applies: fn(&ExtractedRecord) -> bool,
    pub score: f64,
}

/// Checked top to bottom; the first rule that applies sets the score.
pub const OVERALL_CONFIDENCE_RULES: &[ConfidenceRule] = &[
    ConfidenceRule {
        name: "missing_name_or_email",
        applies: missing_name_or_email,
        score: 0.5,
    },
    ConfidenceRule {
        name: "fewer_than_two_skills",
        applies: fewer_than_two_skills,
        score: 0.6,
    },
    ConfidenceRule {
        name: "missing_education_or_experience",
        applies: missing_education_or_experience,
        score: 0.7,
    },
];

/// Score when no ladder rule applies.
pub const COMPLETE_RECORD_CONFIDENCE: f64 = 0.9;

fn is_missing(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn missing_name_or_email(r: &ExtractedRecord) -> bool {
    is_missing(&r.personal_info.name) || is_missing(&r.personal_info.email)
}

fn fewer_than_two_skills(r: &ExtractedRecord) -> bool {
    r.skills.len() < 2
}

fn missing_education_or_experience(r: &ExtractedRecord) -> bool {
    r.education.is_empty() || r.work_experience.is_empty()
}

pub fn overall_confidence(record: &ExtractedRecord) -> f64 {
    OVERALL_CONFIDENCE_RULES
        .iter()
        .find(|rule| (rule.applies)(record))
        .map_or(COMPLETE_RECORD_CONFIDENCE, |rule| rule.score)
}

/// Mean of per-field points over the fields that earned points.
/// name 1.0, email 1.0 (if well-formed), phone 1.0 (if well-formed), address 0.8.
pub fn personal_info_confidence(info: &PersonalInfo) -> f64 {
    let mut score = 0.0;
    let mut count = 0u32;

    if !is_missing(&info.name) {
        score += 1.0;
        count += 1;
    }
    if matches_at_start(&EMAIL_RE, info.email.as_deref()) {
        score += 1.0;
        count += 1;
    }
    if matches_at_start(&PHONE_RE, info.phone.as_deref()) {
        score += 1.0;
        count += 1;
    }
    if !is_missing(&info.address) {
        score += 0.8;
        count += 1;
    }

    if count > 0 {
        score / f64::from(count)
    } else {
        0.0
    }
}

fn matches_at_start(re: &Regex, value: Option<&str>) -> bool {
    value
        .and_then(|v| re.find(v))
        .is_some_and(|m| m.start() == 0)
}

fn section_confidence(non_empty: bool) -> f64 {
    if non_empty {
        SECTION_CONFIDENCE
    } else {
        0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extractor
// ────────────────────────────────────────────────────────────────────────────

/// Raw record plus the detailed skill matches that fed it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: ExtractedRecord,
    pub skill_matches: Vec<SkillMatch>,
}

#[derive(Debug, Clone)]
pub struct EntityExtractor {
    skills: Arc<SkillsMatcher>,
    dates: DateNormalizer,
}

impl EntityExtractor {
    pub fn new(skills: Arc<SkillsMatcher>, dates: DateNormalizer) -> Self {
        Self { skills, dates }
    }

    /// Runs every field extractor and attaches the heuristic confidence scores.
    pub fn extract_entities(&self, doc: &AnnotatedDocument, lang: LangCode) -> Extraction {
        let skill_matches = self.skills.extract_skills(&doc.text, lang);

        let mut record = ExtractedRecord {
            personal_info: extract_personal_info(doc),
            skills: extract_skills(doc, &skill_matches),
            education: self.extract_education(doc, lang),
            work_experience: self.extract_work_experience(doc, lang),
            languages: extract_languages(doc, lang),
            certifications: extract_certifications(doc, lang),
            summary: extract_summary(doc, lang),
            confidence_scores: ConfidenceScores::default(),
        };

        record.confidence_scores = ConfidenceScores {
            overall: overall_confidence(&record),
            personal_info: personal_info_confidence(&record.personal_info),
            skills: section_confidence(!record.skills.is_empty()),
            education: section_confidence(!record.education.is_empty()),
            work_experience: section_confidence(!record.work_experience.is_empty()),
        };

        Extraction {
            record,
            skill_matches,
        }
    }

    /// Sentences with an education keyword and an ORG entity.
    /// Degree and field are not populated by this heuristic.
    pub fn extract_education(&self, doc: &AnnotatedDocument, lang: LangCode) -> Vec<EducationEntry> {
        section_hits(doc, lang.tables().education_keywords)
            .into_iter()
            .map(|hit| EducationEntry {
                institution: Some(hit.organization),
                degree: None,
                field: None,
                period: self.period(hit.dates.as_deref(), lang),
                dates: hit.dates,
            })
            .collect()
    }

    /// Sentences with an experience keyword and an ORG entity.
    /// Title and responsibilities are not populated by this heuristic.
    pub fn extract_work_experience(
        &self,
        doc: &AnnotatedDocument,
        lang: LangCode,
    ) -> Vec<WorkExperienceEntry> {
        section_hits(doc, lang.tables().experience_keywords)
            .into_iter()
            .map(|hit| WorkExperienceEntry {
                company: Some(hit.organization),
                title: None,
                period: self.period(hit.dates.as_deref(), lang),
                dates: hit.dates,
                responsibilities: Vec::new(),
            })
            .collect()
    }

    fn period(&self, dates: Option<&[String]>, lang: LangCode) -> DateRange {
        match dates {
            Some(dates) if !dates.is_empty() => {
                self.dates.extract_date_range(&dates.join(" - "), lang)
            }
            _ => DateRange::default(),
        }
    }
}

/// An ORG (and up to two DATEs) found in a keyword-bearing sentence.
struct SectionHit {
    organization: String,
    dates: Option<Vec<String>>,
}

fn section_hits(doc: &AnnotatedDocument, keywords: &[&str]) -> Vec<SectionHit> {
    doc.sentences
        .iter()
        .filter(|sent| contains_any(&sent.text.to_lowercase(), keywords))
        .filter_map(|sent| {
            let organization = doc
                .entities_in(sent)
                .find(|e| e.label == EntityLabel::Org)?
                .text
                .clone();
            let dates: Vec<String> = doc
                .entities_in(sent)
                .filter(|e| e.label == EntityLabel::Date)
                .take(2)
                .map(|e| e.text.clone())
                .collect();
            Some(SectionHit {
                organization,
                dates: (!dates.is_empty()).then_some(dates),
            })
        })
        .collect()
}

/// Email and phone by regex over the whole text, name from the first PERSON entity.
pub fn extract_personal_info(doc: &AnnotatedDocument) -> PersonalInfo {
    PersonalInfo {
        name: doc.entity_texts(EntityLabel::Person).next().map(str::to_string),
        email: EMAIL_RE.find(&doc.text).map(|m| m.as_str().to_string()),
        phone: PHONE_RE.find(&doc.text).map(|m| m.as_str().to_string()),
        address: extract_address(doc),
    }
}

/// First two GPE/LOC entities, plus the first 5-digit postal code when one exists.
/// Without a location entity there is no address, postal code or not.
pub fn extract_address(doc: &AnnotatedDocument) -> Option<String> {
    let mut parts: Vec<&str> = doc
        .entities
        .iter()
        .filter(|e| e.label.is_location())
        .take(2)
        .map(|e| e.text.as_str())
        .collect();
    if parts.is_empty() {
        return None;
    }
    if let Some(postal) = POSTAL_RE.find(&doc.text) {
        parts.push(postal.as_str());
    }
    Some(parts.join(", "))
}

/// SKILL entities, known technology names, and dictionary matches.
pub fn extract_skills(doc: &AnnotatedDocument, matches: &[SkillMatch]) -> BTreeSet<String> {
    let text_lower = doc.text.to_lowercase();
    let mut skills: BTreeSet<String> = doc
        .entity_texts(EntityLabel::Skill)
        .map(str::to_string)
        .collect();
    skills.extend(
        TECH_SKILLS
            .iter()
            .filter(|s| text_lower.contains(&s.to_lowercase()))
            .map(|s| s.to_string()),
    );
    skills.extend(matches.iter().map(|m| m.skill.clone()));
    skills
}

fn keyword_sentences<'a>(
    doc: &'a AnnotatedDocument,
    keywords: &'a [&'a str],
) -> impl Iterator<Item = (&'a Sentence, String)> + 'a {
    doc.sentences
        .iter()
        .map(|s| (s, s.text.to_lowercase()))
        .filter(move |(_, lower)| contains_any(lower, keywords))
}

pub fn extract_languages(doc: &AnnotatedDocument, lang: LangCode) -> BTreeSet<String> {
    let mut languages = BTreeSet::new();
    for (_, lower) in keyword_sentences(doc, lang.tables().language_keywords) {
        for name in COMMON_LANGUAGES {
            if lower.contains(&name.to_lowercase()) {
                languages.insert(name.to_string());
            }
        }
    }
    languages
}

/// Proper nouns longer than two characters inside certification sentences.
pub fn extract_certifications(doc: &AnnotatedDocument, lang: LangCode) -> BTreeSet<String> {
    keyword_sentences(doc, lang.tables().certification_keywords)
        .flat_map(|(sent, _)| doc.tokens_in(sent))
        .filter(|t| t.pos == PosTag::Propn && t.text.chars().count() > 2)
        .map(|t| t.text.clone())
        .collect()
}

/// Text following the first summary header found (headers tried in list order),
/// cut at any other header. Falls back to the first long sentence among the first three.
pub fn extract_summary(doc: &AnnotatedDocument, lang: LangCode) -> Option<String> {
    let headers = lang.tables().summary_headers;

    for &header in headers {
        let Some(pos) = find_ignore_ascii_case(&doc.text, header) else {
            continue;
        };
        let mut section: String = doc.text[pos..].chars().take(SUMMARY_WINDOW_CHARS).collect();
        for &other in headers.iter().filter(|&&h| h != header) {
            if let Some(end) = find_ignore_ascii_case(&section, other) {
                section.truncate(end);
            }
        }
        if let Some(at) = find_ignore_ascii_case(&section, header) {
            section.replace_range(at..at + header.len(), "");
        }
        let cleaned = section.trim();
        return (!cleaned.is_empty()).then(|| cleaned.to_string());
    }

    doc.sentences
        .iter()
        .take(SUMMARY_FALLBACK_SENTENCES)
        .find(|s| s.text.split_whitespace().count() > SUMMARY_MIN_WORDS)
        .map(|s| s.text.clone())
}

/// Byte offset of an ASCII `needle` in `haystack`, ignoring ASCII case.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}
