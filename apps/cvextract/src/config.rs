use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::extraction::locale::LangCode;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Fuzzy skill-match acceptance threshold, 0–100.
    pub fuzzy_match_threshold: u8,
    pub skills_dict_eng: PathBuf,
    pub skills_dict_ind: PathBuf,
    /// Bulk-mode concurrency.
    pub parallel_workers: usize,
    pub supported_languages: Vec<LangCode>,
    pub max_batch_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let fuzzy_match_threshold = var("FUZZY_MATCH_THRESHOLD", "80")
            .trim()
            .parse::<u8>()
            .context("FUZZY_MATCH_THRESHOLD must be an integer between 0 and 100")?;
        if fuzzy_match_threshold > 100 {
            bail!("FUZZY_MATCH_THRESHOLD must be an integer between 0 and 100, got {fuzzy_match_threshold}");
        }

        let parallel_workers = var("PARALLEL_WORKERS", "4")
            .trim()
            .parse::<usize>()
            .context("PARALLEL_WORKERS must be a positive integer")?;
        if parallel_workers == 0 {
            bail!("PARALLEL_WORKERS must be at least 1");
        }

        Ok(Config {
            port: var("PORT", "8080")
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
            fuzzy_match_threshold,
            skills_dict_eng: PathBuf::from(var("SKILLS_DICT_ENG", "data/skills_eng.json")),
            skills_dict_ind: PathBuf::from(var("SKILLS_DICT_IND", "data/skills_ind.json")),
            parallel_workers,
            supported_languages: parse_languages(&var("SUPPORTED_LANGUAGES", "eng,ind"))?,
            max_batch_size: var("MAX_BATCH_SIZE", "100")
                .trim()
                .parse::<usize>()
                .context("MAX_BATCH_SIZE must be a positive integer")?,
        })
    }

    /// Dictionary path per enabled language.
    pub fn dictionary_paths(&self) -> Vec<(LangCode, PathBuf)> {
        self.supported_languages
            .iter()
            .map(|&lang| {
                let path = match lang {
                    LangCode::Eng => self.skills_dict_eng.clone(),
                    LangCode::Ind => self.skills_dict_ind.clone(),
                };
                (lang, path)
            })
            .collect()
    }
}

fn parse_languages(raw: &str) -> Result<Vec<LangCode>> {
    let mut languages = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let lang: LangCode = tag
            .parse()
            .with_context(|| format!("SUPPORTED_LANGUAGES contains an unknown tag '{tag}'"))?;
        if !languages.contains(&lang) {
            languages.push(lang);
        }
    }
    if languages.is_empty() {
        bail!("SUPPORTED_LANGUAGES must name at least one language");
    }
    Ok(languages)
}
