//! # Word Source
//!
//! Resolves a CEFR level to a bounded batch of vocabulary entries. The source
//! is an ordered chain of [`WordProvider`] strategies: each is asked once, in
//! order, and the first non-empty answer wins. There are no retries.
//!
//! ```text
//! LocalBankProvider ──err/empty──► FallbackProvider ──err/empty──► []
//! ```

pub mod bank;
pub mod dictionary;
pub mod fallback;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::AppResult;
use crate::level::CefrLevel;
use crate::observability;

pub use bank::{LocalBankProvider, WordBank};
pub use dictionary::DictionaryClient;
pub use fallback::FallbackProvider;

/// Upper bound on words returned by a single fetch
pub const MAX_WORDS_PER_REQUEST: usize = 10;

/// Definition placeholder used when none is available
pub const NO_DEFINITION: &str = "-";

/// A vocabulary item shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub definition: String,
    pub translation: String,
}

impl WordEntry {
    pub fn new(
        word: impl Into<String>,
        definition: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
            translation: translation.into(),
        }
    }

    pub fn has_definition(&self) -> bool {
        !self.definition.is_empty() && self.definition != NO_DEFINITION
    }
}

/// One strategy in the word-fetching chain
#[async_trait]
pub trait WordProvider: Send + Sync {
    /// Short name used in logs and metrics
    fn name(&self) -> &str;

    /// Return up to `count` distinct entries for `level`
    async fn fetch(&self, level: CefrLevel, count: usize) -> AppResult<Vec<WordEntry>>;
}

/// Ordered chain of word providers
pub struct WordSource {
    providers: Vec<Arc<dyn WordProvider>>,
}

impl WordSource {
    pub fn new(providers: Vec<Arc<dyn WordProvider>>) -> Self {
        Self { providers }
    }

    /// Fetch up to `count` (capped at [`MAX_WORDS_PER_REQUEST`]) distinct entries
    pub async fn fetch_words(&self, level: CefrLevel, count: usize) -> Vec<WordEntry> {
        let count = count.min(MAX_WORDS_PER_REQUEST);
        if count == 0 {
            return Vec::new();
        }

        for provider in &self.providers {
            match provider.fetch(level, count).await {
                Ok(words) if !words.is_empty() => {
                    let words = distinct_by_word(words, count);
                    debug!(
                        provider = %provider.name(),
                        level = %level,
                        returned = words.len(),
                        "Fetched words"
                    );
                    observability::record_words_fetched(provider.name(), words.len());
                    return words;
                }
                Ok(_) => {
                    warn!(provider = %provider.name(), level = %level, "Word provider returned nothing");
                }
                Err(e) => {
                    warn!(provider = %provider.name(), level = %level, error = %e, "Word provider failed, trying next");
                }
            }
        }

        warn!(level = %level, "All word providers came back empty");
        Vec::new()
    }
}

/// Uniform random sample of up to `count` items without replacement
pub fn sample_distinct<T: Clone>(candidates: &[T], count: usize) -> Vec<T> {
    let mut rng = rand::rng();
    candidates
        .choose_multiple(&mut rng, count)
        .cloned()
        .collect()
}

/// Drop repeated words (first occurrence wins) and cap the length
fn distinct_by_word(words: Vec<WordEntry>, count: usize) -> Vec<WordEntry> {
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter(|entry| seen.insert(entry.word.clone()))
        .take(count)
        .collect()
}
