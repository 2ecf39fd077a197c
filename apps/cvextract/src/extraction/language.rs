//! Document language identification.
//!
//! Provides a `LanguageDetector` trait so a statistical detector can be
//! swapped in, and a built-in function-word detector for English / Indonesian.

use crate::extraction::locale::LangCode;

/// Texts shorter than this (after trimming) are not classified.
const MIN_DETECTABLE_CHARS: usize = 10;
/// Confidence reported with the fallback guess.
const FALLBACK_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanguageGuess {
    pub lang: LangCode,
    pub confidence: f64,
}

impl LanguageGuess {
    /// English at 0.5, used whenever detection has nothing to go on.
    pub fn fallback() -> Self {
        Self {
            lang: LangCode::Eng,
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}

/// Trait for pluggable language identification backends.
pub trait LanguageDetector: Send + Sync {
    /// Short backend identifier (e.g. "stopwords").
    fn backend_id(&self) -> &str;

    fn detect(&self, text: &str) -> LanguageGuess;
}

// ────────────────────────────────────────────────────────────────────────────
// StopwordLanguageDetector
// ────────────────────────────────────────────────────────────────────────────

const ENG_FUNCTION_WORDS: &[&str] = &[
    "the", "and", "of", "to", "in", "with", "for", "is", "at", "on", "my", "as", "was", "from",
    "have", "an", "by",
];

const IND_FUNCTION_WORDS: &[&str] = &[
    "dan", "yang", "di", "ke", "dari", "dengan", "untuk", "pada", "adalah", "saya", "sebagai",
    "ini", "itu", "dalam", "tahun", "oleh",
];

fn function_words(lang: LangCode) -> &'static [&'static str] {
    match lang {
        LangCode::Eng => ENG_FUNCTION_WORDS,
        LangCode::Ind => IND_FUNCTION_WORDS,
    }
}

/// Counts English and Indonesian function words; the winner's share of all
/// hits is the confidence.
#[derive(Debug, Clone)]
pub struct StopwordLanguageDetector {
    enabled: Vec<LangCode>,
}

impl StopwordLanguageDetector {
    pub fn new(enabled: Vec<LangCode>) -> Self {
        Self { enabled }
    }
}

impl Default for StopwordLanguageDetector {
    fn default() -> Self {
        Self::new(LangCode::ALL.to_vec())
    }
}

impl LanguageDetector for StopwordLanguageDetector {
    fn backend_id(&self) -> &str {
        "stopwords"
    }

    fn detect(&self, text: &str) -> LanguageGuess {
        if text.trim().chars().count() < MIN_DETECTABLE_CHARS {
            return LanguageGuess::fallback();
        }

        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        let counts: Vec<(LangCode, usize)> = LangCode::ALL
            .iter()
            .map(|&lang| {
                let vocab = function_words(lang);
                let hits = words.iter().filter(|w| vocab.contains(&w.as_str())).count();
                (lang, hits)
            })
            .collect();

        let total: usize = counts.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return LanguageGuess::fallback();
        }

        // Ties go to the earlier language in `LangCode::ALL`.
        let (lang, hits) = counts
            .iter()
            .copied()
            .fold((LangCode::Eng, 0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if !self.enabled.contains(&lang) {
            return LanguageGuess::fallback();
        }

        LanguageGuess {
            lang,
            confidence: hits as f64 / total as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_falls_back() {
        let guess = StopwordLanguageDetector::default().detect("  saya   ");
        assert_eq!(guess, LanguageGuess::fallback());
    }

    #[test]
    fn test_detects_indonesian() {
        let guess = StopwordLanguageDetector::default()
            .detect("Saya bekerja sebagai insinyur di Jakarta dan lulus dari Universitas Indonesia pada tahun 2016.");
        assert_eq!(guess.lang, LangCode::Ind);
        assert_eq!(guess.confidence, 1.0);
    }

    #[test]
    fn test_detects_english_with_share_as_confidence() {
        let guess = StopwordLanguageDetector::default()
            .detect("Worked at the bank in Jakarta, dan more.");
        assert_eq!(guess.lang, LangCode::Eng);
        // at, the, in vs dan
        assert!((guess.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_no_function_words_falls_back() {
        let guess = StopwordLanguageDetector::default().detect("Python Rust Kubernetes Docker");
        assert_eq!(guess, LanguageGuess::fallback());
    }

    #[test]
    fn test_disabled_winner_falls_back() {
        let guess = StopwordLanguageDetector::new(vec![LangCode::Eng])
            .detect("Saya bekerja di Jakarta dengan tim yang hebat.");
        assert_eq!(guess, LanguageGuess::fallback());
    }
}
