//! Local CEFR word bank.
//!
//! The bank is a JSON object mapping level tags to plain English words:
//!
//! ```json
//! { "A1": ["cat", "dog"], "B2": ["negotiate"] }
//! ```
//!
//! An embedded copy ships with the binary; `WORD_BANK_PATH` can point at a
//! replacement file.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::{sample_distinct, DictionaryClient, WordEntry, WordProvider, NO_DEFINITION};
use crate::errors::{AppError, AppResult};
use crate::level::CefrLevel;
use crate::translator::{Language, Translator};

const EMBEDDED_WORD_BANK: &str = include_str!("../../data/words_cefr.json");

/// Level → candidate words, duplicates removed
#[derive(Debug, Clone, Default)]
pub struct WordBank {
    words: HashMap<CefrLevel, Vec<String>>,
}

impl WordBank {
    /// Parse a bank from JSON text. Unknown level keys are skipped.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| AppError::Validation(format!("Invalid word bank JSON: {}", e)))?;

        let mut words = HashMap::new();
        for (key, list) in raw {
            match key.parse::<CefrLevel>() {
                Ok(level) => {
                    words.insert(level, normalize_words(list));
                }
                Err(_) => warn!(key = %key, "Skipping unknown level in word bank"),
            }
        }

        Ok(Self { words })
    }

    /// Load a bank from a JSON file on disk
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read word bank {}: {}", path.display(), e))
        })?;
        let bank = Self::from_json(&content)?;
        info!(path = %path.display(), words = bank.total_words(), "Word bank loaded from file");
        Ok(bank)
    }

    /// The bank compiled into the binary
    pub fn embedded() -> AppResult<Self> {
        Self::from_json(EMBEDDED_WORD_BANK)
    }

    /// Candidate words for `level`, falling back to the base level when the
    /// level is missing or empty
    pub fn candidates(&self, level: CefrLevel) -> AppResult<&[String]> {
        let own = self.words.get(&level).filter(|list| !list.is_empty());
        let base = self
            .words
            .get(&CefrLevel::BASE)
            .filter(|list| !list.is_empty());

        own.or(base)
            .map(Vec::as_slice)
            .ok_or_else(|| AppError::Validation(format!("Word bank has no words for {}", level)))
    }

    pub fn total_words(&self) -> usize {
        self.words.values().map(Vec::len).sum()
    }
}

fn normalize_words(list: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    list.into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(w.to_lowercase()))
        .collect()
}

/// Samples the local bank and enriches each word with a translation and,
/// when a dictionary is configured, a definition
pub struct LocalBankProvider {
    bank: WordBank,
    translator: Arc<Translator>,
    dictionary: Option<DictionaryClient>,
}

impl LocalBankProvider {
    pub fn new(
        bank: WordBank,
        translator: Arc<Translator>,
        dictionary: Option<DictionaryClient>,
    ) -> Self {
        Self {
            bank,
            translator,
            dictionary,
        }
    }
}

#[async_trait]
impl WordProvider for LocalBankProvider {
    fn name(&self) -> &str {
        "local_bank"
    }

    async fn fetch(&self, level: CefrLevel, count: usize) -> AppResult<Vec<WordEntry>> {
        let chosen = sample_distinct(self.bank.candidates(level)?, count);

        let mut entries = Vec::with_capacity(chosen.len());
        for word in chosen {
            let translation = self.translator.translate(&word, Language::Russian).await;
            let definition = match &self.dictionary {
                Some(dictionary) => dictionary.lookup_word(&word).await,
                None => None,
            }
            .unwrap_or_else(|| NO_DEFINITION.to_string());

            entries.push(WordEntry {
                word,
                definition,
                translation,
            });
        }

        Ok(entries)
    }
}
