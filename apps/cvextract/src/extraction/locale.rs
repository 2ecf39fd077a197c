//! Static per-language keyword and pattern tables.
//!
//! Every table is immutable and keyed by `LangCode`; nothing here is mutated at runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ExtractionError;

/// Supported document languages (ISO 639-3 style tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LangCode {
    Eng,
    Ind,
}

impl LangCode {
    pub const ALL: [LangCode; 2] = [LangCode::Eng, LangCode::Ind];

    pub fn as_str(self) -> &'static str {
        match self {
            LangCode::Eng => "eng",
            LangCode::Ind => "ind",
        }
    }

    /// Human-readable name of `self`, written in the `ui` language.
    pub fn display_name(self, ui: LangCode) -> &'static str {
        match (ui, self) {
            (LangCode::Eng, LangCode::Eng) => "English",
            (LangCode::Eng, LangCode::Ind) => "Indonesian",
            (LangCode::Ind, LangCode::Eng) => "Bahasa Inggris",
            (LangCode::Ind, LangCode::Ind) => "Bahasa Indonesia",
        }
    }

    pub fn tables(self) -> &'static LocaleTables {
        match self {
            LangCode::Eng => &ENG,
            LangCode::Ind => &IND,
        }
    }
}

impl FromStr for LangCode {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eng" => Ok(LangCode::Eng),
            "ind" => Ok(LangCode::Ind),
            other => Err(ExtractionError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword and pattern tables for one language.
#[derive(Debug)]
pub struct LocaleTables {
    /// Regex alternation of month names, used inside the date patterns.
    pub month_alternation: &'static str,
    /// Month-name substrings → month number. Checked in order.
    pub month_names: &'static [(&'static str, u32)],
    pub present_indicators: &'static [&'static str],
    pub education_keywords: &'static [&'static str],
    pub experience_keywords: &'static [&'static str],
    pub language_keywords: &'static [&'static str],
    pub certification_keywords: &'static [&'static str],
    /// Summary section headers, in priority order.
    pub summary_headers: &'static [&'static str],
    /// Month/day order for ambiguous `A/B/YYYY` dates.
    pub month_first: bool,
}

static ENG: LocaleTables = LocaleTables {
    month_alternation: "Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:tember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?",
    month_names: &[
        ("jan", 1),
        ("january", 1),
        ("feb", 2),
        ("february", 2),
        ("mar", 3),
        ("march", 3),
        ("apr", 4),
        ("april", 4),
        ("may", 5),
        ("jun", 6),
        ("june", 6),
        ("jul", 7),
        ("july", 7),
        ("aug", 8),
        ("august", 8),
        ("sep", 9),
        ("september", 9),
        ("oct", 10),
        ("october", 10),
        ("nov", 11),
        ("november", 11),
        ("dec", 12),
        ("december", 12),
    ],
    present_indicators: &["present", "current", "now", "ongoing"],
    education_keywords: &[
        "education",
        "university",
        "college",
        "degree",
        "bachelor",
        "master",
        "phd",
        "diploma",
    ],
    experience_keywords: &[
        "experience",
        "work",
        "employment",
        "job",
        "position",
        "role",
        "career",
    ],
    language_keywords: &["language", "languages", "speak", "fluent"],
    certification_keywords: &["certification", "certificate", "certified"],
    summary_headers: &["summary", "profile", "professional summary", "about me"],
    month_first: true,
};

static IND: LocaleTables = LocaleTables {
    month_alternation: "Januari|Februari|Maret|April|Mei|Juni|Juli|Agustus|September|Oktober|November|Desember",
    month_names: &[
        ("januari", 1),
        ("februari", 2),
        ("maret", 3),
        ("april", 4),
        ("mei", 5),
        ("juni", 6),
        ("juli", 7),
        ("agustus", 8),
        ("september", 9),
        ("oktober", 10),
        ("november", 11),
        ("desember", 12),
    ],
    present_indicators: &["sekarang", "saat ini", "hingga kini", "sampai sekarang"],
    education_keywords: &[
        "pendidikan",
        "universitas",
        "kuliah",
        "gelar",
        "sarjana",
        "magister",
        "doktor",
        "diploma",
    ],
    experience_keywords: &["pengalaman", "kerja", "pekerjaan", "posisi", "jabatan", "karir"],
    language_keywords: &["bahasa", "berbicara", "fasih"],
    certification_keywords: &["sertifikasi", "sertifikat", "bersertifikat"],
    summary_headers: &["ringkasan", "profil", "tentang saya"],
    month_first: false,
};

// ────────────────────────────────────────────────────────────────────────────
// Locale-independent tables
// ────────────────────────────────────────────────────────────────────────────

/// Substrings that mark a consecutive date pair as a range.
pub const RANGE_SEPARATORS: &[&str] = &["-", "to", "hingga"];

/// Bilingual soft-skill keywords, already lower-cased.
pub const SOFT_SKILL_KEYWORDS: &[&str] = &[
    "communication",
    "leadership",
    "teamwork",
    "management",
    "organization",
    "problem solving",
    "creativity",
    "critical thinking",
    "adaptability",
    "komunikasi",
    "kepemimpinan",
    "kerja tim",
    "manajemen",
    "organisasi",
    "pemecahan masalah",
    "kreativitas",
    "berpikir kritis",
    "adaptasi",
];

/// Technology names picked up by plain substring search regardless of language.
pub const TECH_SKILLS: &[&str] = &["Python", "Java", "JavaScript", "HTML", "CSS", "SQL"];

pub const COMMON_LANGUAGES: &[&str] = &[
    "English",
    "Indonesian",
    "French",
    "Spanish",
    "German",
    "Chinese",
];

/// Case-insensitive substring test against a keyword list.
pub fn contains_any(haystack_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| haystack_lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lang_code() {
        assert_eq!("eng".parse::<LangCode>(), Ok(LangCode::Eng));
        assert_eq!(" IND ".parse::<LangCode>(), Ok(LangCode::Ind));
        assert_eq!(
            "fra".parse::<LangCode>(),
            Err(ExtractionError::UnsupportedLanguage("fra".into()))
        );
    }

    #[test]
    fn test_display_names_follow_ui_language() {
        assert_eq!(LangCode::Ind.display_name(LangCode::Eng), "Indonesian");
        assert_eq!(LangCode::Ind.display_name(LangCode::Ind), "Bahasa Indonesia");
        assert_eq!(LangCode::Eng.display_name(LangCode::Ind), "Bahasa Inggris");
    }

    #[test]
    fn test_serde_uses_lowercase_tags() {
        assert_eq!(serde_json::to_string(&LangCode::Ind).unwrap(), "\"ind\"");
    }

    #[test]
    fn test_month_order_depends_only_on_language() {
        assert!(LangCode::Eng.tables().month_first);
        assert!(!LangCode::Ind.tables().month_first);
    }

    #[test]
    fn test_soft_keywords_are_lowercase() {
        assert!(SOFT_SKILL_KEYWORDS.iter().all(|k| *k == k.to_lowercase()));
    }
}
