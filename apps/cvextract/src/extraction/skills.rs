//! Skills Matcher — dictionary lookup plus fuzzy n-gram matching.
//!
//! Dictionaries are loaded once at startup and never mutated. A missing or
//! unreadable dictionary leaves that language with an empty skill set.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use similar::TextDiff;
use thiserror::Error;
use tracing::{info, warn};

use crate::extraction::locale::{LangCode, SOFT_SKILL_KEYWORDS};

/// Longest phrase (in words) considered as a fuzzy candidate.
const MAX_NGRAM_WORDS: usize = 4;
/// Shorter candidates are skipped.
const MIN_CANDIDATE_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read skill dictionary: {0}")]
    Io(#[from] std::io::Error),

    #[error("skill dictionary is not a JSON array of strings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    /// 1.0 for exact matches, normalized similarity for fuzzy ones.
    pub confidence: f64,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillCategories {
    pub hard_skills: Vec<String>,
    pub soft_skills: Vec<String>,
}

/// Precomputed comparison keys for one canonical skill.
#[derive(Debug, Clone)]
struct SkillEntry {
    canonical: String,
    lower: String,
    sorted_tokens: String,
}

impl SkillEntry {
    fn new(canonical: String) -> Self {
        let lower = canonical.to_lowercase();
        let sorted_tokens = sort_tokens(&lower);
        Self {
            canonical,
            lower,
            sorted_tokens,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkillsMatcher {
    dictionaries: HashMap<LangCode, Vec<SkillEntry>>,
    fuzzy_threshold: u8,
}

impl SkillsMatcher {
    /// `fuzzy_threshold` is on a 0–100 scale; values above 100 are clamped.
    pub fn new(dictionaries: HashMap<LangCode, BTreeSet<String>>, fuzzy_threshold: u8) -> Self {
        let dictionaries = dictionaries
            .into_iter()
            .map(|(lang, skills)| (lang, skills.into_iter().map(SkillEntry::new).collect()))
            .collect();
        Self {
            dictionaries,
            fuzzy_threshold: fuzzy_threshold.min(100),
        }
    }

    /// Loads one dictionary per language. Failures are logged and leave that language empty.
    pub fn from_paths<P: AsRef<Path>>(paths: &[(LangCode, P)], fuzzy_threshold: u8) -> Self {
        let mut dictionaries = HashMap::new();
        for (lang, path) in paths {
            let path = path.as_ref();
            let skills = match load_dictionary(path) {
                Ok(skills) => {
                    info!("Loaded {} {} skills from {}", skills.len(), lang, path.display());
                    skills
                }
                Err(e) => {
                    warn!("Skill dictionary for {lang} unavailable ({}): {e}", path.display());
                    BTreeSet::new()
                }
            };
            dictionaries.insert(*lang, skills);
        }
        Self::new(dictionaries, fuzzy_threshold)
    }

    pub fn fuzzy_threshold(&self) -> u8 {
        self.fuzzy_threshold
    }

    pub fn dictionary_size(&self, lang: LangCode) -> usize {
        self.dictionaries.get(&lang).map_or(0, Vec::len)
    }

    /// Exact substring hits first, then fuzzy n-gram hits for skills not found exactly.
    /// Each canonical skill appears once, with its highest confidence.
    pub fn extract_skills(&self, text: &str, lang: LangCode) -> Vec<SkillMatch> {
        if text.is_empty() {
            return Vec::new();
        }
        let skills = match self.dictionaries.get(&lang) {
            Some(skills) if !skills.is_empty() => skills,
            _ => {
                warn!("No skills dictionary available for {lang}");
                return Vec::new();
            }
        };

        let text_lower = text.to_lowercase();

        let exact: Vec<SkillMatch> = skills
            .iter()
            .filter(|s| text_lower.contains(&s.lower))
            .map(|s| SkillMatch {
                skill: s.canonical.clone(),
                confidence: 1.0,
                match_type: MatchType::Exact,
            })
            .collect();
        let exact_names: HashSet<&str> = exact.iter().map(|m| m.skill.as_str()).collect();

        let mut fuzzy = Vec::new();
        for phrase in candidate_phrases(&text_lower) {
            if phrase.chars().count() < MIN_CANDIDATE_CHARS {
                continue;
            }
            if let Some((entry, similarity)) = self.best_match(&phrase, skills) {
                if !exact_names.contains(entry.canonical.as_str()) {
                    fuzzy.push(SkillMatch {
                        skill: entry.canonical.clone(),
                        confidence: similarity,
                        match_type: MatchType::Fuzzy,
                    });
                }
            }
        }

        merge_matches(exact.into_iter().chain(fuzzy))
    }

    /// Best-scoring skill for `phrase`, if it clears the threshold. Ties keep the first skill.
    fn best_match<'a>(&self, phrase: &str, skills: &'a [SkillEntry]) -> Option<(&'a SkillEntry, f64)> {
        let sorted_phrase = sort_tokens(phrase);
        let mut best: Option<(&SkillEntry, f64)> = None;
        for entry in skills {
            let similarity = indel_ratio(&sorted_phrase, &entry.sorted_tokens);
            if best.map_or(true, |(_, b)| similarity > b) {
                best = Some((entry, similarity));
            }
        }
        best.filter(|&(_, similarity)| similarity * 100.0 >= f64::from(self.fuzzy_threshold))
    }
}

/// Splits matched skills into soft skills (bilingual keyword hit) and hard skills.
pub fn categorize_skills(matches: &[SkillMatch]) -> SkillCategories {
    let mut categories = SkillCategories::default();
    for m in matches {
        let lower = m.skill.to_lowercase();
        if SOFT_SKILL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            categories.soft_skills.push(m.skill.clone());
        } else {
            categories.hard_skills.push(m.skill.clone());
        }
    }
    categories
}

/// Reads a JSON array of canonical skill names.
pub fn load_dictionary(path: &Path) -> Result<BTreeSet<String>, DictionaryError> {
    let raw = std::fs::read_to_string(path)?;
    let skills: Vec<String> = serde_json::from_str(&raw)?;
    Ok(skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Token-order-insensitive key: whitespace tokens sorted and re-joined.
fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Indel similarity in [0, 1]: twice the matching chars over the combined length.
/// Applied to token-sorted keys this is the token-sort ratio.
fn indel_ratio(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Every contiguous run of 1–4 whitespace-delimited words.
fn candidate_phrases(text_lower: &str) -> Vec<String> {
    let words: Vec<&str> = text_lower.split_whitespace().collect();
    let mut phrases = Vec::new();
    for i in 0..words.len() {
        for len in 1..=MAX_NGRAM_WORDS.min(words.len() - i) {
            phrases.push(words[i..i + len].join(" "));
        }
    }
    phrases
}

/// Collapses duplicate skills to the highest-confidence entry, keeping first-seen order.
fn merge_matches(matches: impl IntoIterator<Item = SkillMatch>) -> Vec<SkillMatch> {
    let mut merged: Vec<SkillMatch> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for m in matches {
        match index.get(&m.skill) {
            Some(&i) => {
                if m.confidence > merged[i].confidence {
                    merged[i] = m;
                }
            }
            None => {
                index.insert(m.skill.clone(), merged.len());
                merged.push(m);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    fn matcher(skills: &[&str], threshold: u8) -> SkillsMatcher {
        let set: BTreeSet<String> = skills.iter().map(|s| s.to_string()).collect();
        SkillsMatcher::new(HashMap::from([(LangCode::Eng, set)]), threshold)
    }

    #[test]
    fn test_single_exact_match() {
        let m = matcher(&["Python"], 80);
        let found = m.extract_skills("I use Python daily", LangCode::Eng);
        assert_eq!(
            found,
            vec![SkillMatch {
                skill: "Python".into(),
                confidence: 1.0,
                match_type: MatchType::Exact,
            }]
        );
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let m = matcher(&["PostgreSQL"], 80);
        let found = m.extract_skills("worked with postgresql", LangCode::Eng);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].skill, "PostgreSQL");
    }

    #[test]
    fn test_fuzzy_match_for_misspelling() {
        let m = matcher(&["JavaScript", "Python"], 80);
        let found = m.extract_skills("Skilled in javascrpt", LangCode::Eng);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].skill, "JavaScript");
        assert_eq!(found[0].match_type, MatchType::Fuzzy);
        assert!((found[0].confidence - 18.0 / 19.0).abs() < 1e-6);
    }

    #[test]
    fn test_fuzzy_score_is_indel_ratio() {
        // 9 of 9 + 10 chars line up: 18 / 19
        assert!((indel_ratio("javascrpt", "javascript") - 0.947).abs() < 1e-3);
        assert!((indel_ratio("learning machine", "learning machine") - 1.0).abs() < 1e-9);

        let m = matcher(&["JavaScript"], 92);
        let found = m.extract_skills("Skilled in javascrpt", LangCode::Eng);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].skill, "JavaScript");
        assert_eq!(found[0].match_type, MatchType::Fuzzy);
    }

    #[test]
    fn test_fuzzy_is_token_order_insensitive() {
        let m = matcher(&["Machine Learning"], 90);
        let found = m.extract_skills("learning machine", LangCode::Eng);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].match_type, MatchType::Fuzzy);
        assert!((found[0].confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_wins_over_fuzzy() {
        let m = matcher(&["Python"], 80);
        let found = m.extract_skills("python and pythn", LangCode::Eng);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].match_type, MatchType::Exact);
        assert_eq!(found[0].confidence, 1.0);
    }

    #[test]
    fn test_threshold_blocks_weak_candidates() {
        let m = matcher(&["Kubernetes"], 95);
        assert!(m.extract_skills("kubernets", LangCode::Eng).is_empty());
    }

    #[test]
    fn test_missing_dictionary_degrades_to_empty() {
        let m = SkillsMatcher::from_paths(&[(LangCode::Ind, "/nonexistent/skills_ind.json")], 80);
        assert_eq!(m.dictionary_size(LangCode::Ind), 0);
        assert!(m.extract_skills("Python", LangCode::Ind).is_empty());
        assert!(m.extract_skills("Python", LangCode::Eng).is_empty());
    }

    #[test]
    fn test_load_dictionary_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["Python", " SQL ", "", "Python"]"#).unwrap();
        let skills = load_dictionary(file.path()).unwrap();
        assert_eq!(skills.into_iter().collect::<Vec<_>>(), vec!["Python", "SQL"]);
    }

    #[test]
    fn test_load_dictionary_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"skills": []}}"#).unwrap();
        assert!(matches!(load_dictionary(file.path()), Err(DictionaryError::Json(_))));
    }

    #[test]
    fn test_threshold_clamped_to_100() {
        assert_eq!(matcher(&[], 250).fuzzy_threshold(), 100);
    }

    #[test]
    fn test_categorize_soft_and_hard() {
        let matches = vec![
            SkillMatch { skill: "Team Leadership".into(), confidence: 1.0, match_type: MatchType::Exact },
            SkillMatch { skill: "Rust".into(), confidence: 1.0, match_type: MatchType::Exact },
            SkillMatch { skill: "Kerja Tim".into(), confidence: 0.9, match_type: MatchType::Fuzzy },
        ];
        let c = categorize_skills(&matches);
        assert_eq!(c.soft_skills, vec!["Team Leadership", "Kerja Tim"]);
        assert_eq!(c.hard_skills, vec!["Rust"]);
    }

    #[test]
    fn test_candidate_phrases_cover_up_to_four_words() {
        let phrases = candidate_phrases("a b c d e");
        assert!(phrases.contains(&"a b c d".to_string()));
        assert!(!phrases.contains(&"a b c d e".to_string()));
        assert_eq!(phrases.len(), 4 + 4 + 3 + 2 + 1);
    }

    proptest! {
        #[test]
        fn test_fuzzy_matches_respect_threshold(
            threshold in 50u8..=100,
            words in proptest::collection::vec("[a-z]{2,9}", 0..12),
        ) {
            let m = matcher(&["python", "javascript", "project management", "docker"], threshold);
            let text = words.join(" ");
            for found in m.extract_skills(&text, LangCode::Eng) {
                if found.match_type == MatchType::Fuzzy {
                    prop_assert!(found.confidence * 100.0 >= f64::from(threshold));
                }
            }
        }
    }
}
