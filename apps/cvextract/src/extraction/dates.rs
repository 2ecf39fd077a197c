//! Date Normalizer — finds date expressions in free text and turns them into ISO dates.
//!
//! Pattern categories are tried in a fixed order per language:
//! 1. month-name first (`Jan 5, 2019`)
//! 2. day first (`5 Maret 2019`)
//! 3. `D/M/Y` numeric (month-first for English, day-first otherwise)
//! 4. `Y/M/D` numeric
//! 5. bare year 1900–2099
//! 6. present indicators (`Present`, `Sekarang`, ...)
//!
//! `extract_dates` keeps matches from every category, overlaps included, and
//! range assembly works on all of them.

use std::collections::HashMap;
use std::num::ParseIntError;
use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::extraction::locale::{LangCode, RANGE_SEPARATORS};
use crate::models::record::DateRange;

#[derive(Debug, Error, PartialEq)]
pub enum DateError {
    #[error("invalid number in date: {0}")]
    Number(#[from] ParseIntError),

    #[error("{year:04}-{month:02}-{day:02} is not a calendar date")]
    OutOfRange { year: i32, month: u32, day: u32 },
}

/// One date expression found in text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateSpan {
    pub original: String,
    pub normalized: Option<NaiveDate>,
    pub is_present_indicator: bool,
    /// Byte offsets of the match in the searched text.
    pub position: (usize, usize),
}

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static DAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,2})\b").unwrap());
static DMY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})").unwrap());
static YMD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})").unwrap());

/// Ordered pattern list per language, built from the locale tables.
static DATE_PATTERNS: LazyLock<HashMap<LangCode, Vec<Regex>>> = LazyLock::new(|| {
    LangCode::ALL
        .iter()
        .map(|&lang| (lang, build_patterns(lang)))
        .collect()
});

fn build_patterns(lang: LangCode) -> Vec<Regex> {
    let tables = lang.tables();
    let months = tables.month_alternation;
    let present = tables
        .present_indicators
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");

    [
        format!(r"(?i)(?:{months})[,.\s]+(\d{{1,2}})[,.\s]+(\d{{4}})"),
        format!(r"(?i)(\d{{1,2}})[,.\s]+(?:{months})[,.\s]+(\d{{4}})"),
        DMY_RE.as_str().to_string(),
        YMD_RE.as_str().to_string(),
        YEAR_RE.as_str().to_string(),
        format!(r"(?i)\b(?:{present})\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
}

/// Stateless normalizer. "Present" resolves against `reference_date`, or today (UTC) when unset.
#[derive(Debug, Clone, Default)]
pub struct DateNormalizer {
    reference_date: Option<NaiveDate>,
}

impl DateNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the date that present indicators resolve to.
    #[cfg(test)]
    pub fn with_reference_date(date: NaiveDate) -> Self {
        Self {
            reference_date: Some(date),
        }
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Finds every date expression in `text`. Malformed matches are logged and skipped.
    pub fn extract_dates(&self, text: &str, lang: LangCode) -> Vec<DateSpan> {
        if text.is_empty() {
            return Vec::new();
        }

        let today = self.today();
        let mut spans = Vec::new();
        for pattern in &DATE_PATTERNS[&lang] {
            for m in pattern.find_iter(text) {
                let original = m.as_str();
                match normalize_date(original, lang, today) {
                    Ok(normalized) => spans.push(DateSpan {
                        original: original.to_string(),
                        normalized,
                        is_present_indicator: is_present_indicator(original, lang),
                        position: (m.start(), m.end()),
                    }),
                    Err(e) => warn!("Dropping date '{original}': {e}"),
                }
            }
        }
        spans
    }

    /// Reduces the dates found in `text` to a start/end pair. See [`range_from_spans`].
    pub fn extract_date_range(&self, text: &str, lang: LangCode) -> DateRange {
        range_from_spans(text, &self.extract_dates(text, lang))
    }
}

/// Range assembly over spans already found in `text`.
///
/// - one date: present indicators become `end_date`, anything else `start_date`
/// - several: the first consecutive pair separated by `-`, `to` or `hingga` wins,
///   otherwise the first and last dates by position
pub fn range_from_spans(text: &str, spans: &[DateSpan]) -> DateRange {
    let mut dates: Vec<(&DateSpan, NaiveDate)> = spans
        .iter()
        .filter_map(|span| span.normalized.map(|d| (span, d)))
        .collect();

    match dates.len() {
        0 => DateRange::default(),
        1 => {
            let (span, date) = &dates[0];
            if span.is_present_indicator {
                DateRange {
                    start_date: None,
                    end_date: Some(*date),
                }
            } else {
                DateRange {
                    start_date: Some(*date),
                    end_date: None,
                }
            }
        }
        _ => {
            dates.sort_by_key(|(span, _)| span.position.0);

            for pair in dates.windows(2) {
                let (left, start) = &pair[0];
                let (right, end) = &pair[1];
                let between = text
                    .get(left.position.1..right.position.0)
                    .unwrap_or("")
                    .to_lowercase();
                if RANGE_SEPARATORS.iter().any(|sep| between.contains(sep)) {
                    return DateRange {
                        start_date: Some(*start),
                        end_date: Some(*end),
                    };
                }
            }

            DateRange {
                start_date: dates.first().map(|(_, d)| *d),
                end_date: dates.last().map(|(_, d)| *d),
            }
        }
    }
}

pub fn is_present_indicator(text: &str, lang: LangCode) -> bool {
    let lower = text.to_lowercase();
    lang.tables()
        .present_indicators
        .iter()
        .any(|indicator| lower.contains(indicator))
}

/// Converts one matched date expression to a calendar date.
///
/// `Ok(None)` means the text carries no recognisable date; `Err` means it looked
/// like one but the numbers do not form a valid date.
pub fn normalize_date(
    text: &str,
    lang: LangCode,
    today: NaiveDate,
) -> Result<Option<NaiveDate>, DateError> {
    if is_present_indicator(text, lang) {
        return Ok(Some(today));
    }

    let year_match = YEAR_RE.find(text);

    // Bare year, possibly padded with a little whitespace.
    if let Some(year) = year_match {
        if text.trim().chars().count() <= 5 {
            return ymd(year.as_str().parse()?, 1, 1).map(Some);
        }
    }

    let lower = text.to_lowercase();
    for &(name, month) in lang.tables().month_names {
        if !lower.contains(name) {
            continue;
        }
        if let Some(year) = year_match {
            let day = match DAY_RE.find(text) {
                Some(d) => d.as_str().parse::<u32>()?,
                None => 1,
            };
            return ymd(year.as_str().parse()?, month, day.min(28)).map(Some);
        }
    }

    if let Some(caps) = DMY_RE.captures(text) {
        let a: u32 = caps[1].parse()?;
        let b: u32 = caps[2].parse()?;
        let year: i32 = caps[3].parse()?;
        let (month, day) = if lang.tables().month_first { (a, b) } else { (b, a) };
        return ymd(year, month.min(12), day.min(28)).map(Some);
    }

    if let Some(caps) = YMD_RE.captures(text) {
        let year: i32 = caps[1].parse()?;
        let month: u32 = caps[2].parse()?;
        let day: u32 = caps[3].parse()?;
        return ymd(year, month.min(12), day.min(28)).map(Some);
    }

    Ok(None)
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::OutOfRange { year, month, day })
}
