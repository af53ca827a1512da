//! Static fallback table, used when the word bank cannot answer.

use async_trait::async_trait;

use super::{sample_distinct, WordEntry, WordProvider};
use crate::errors::AppResult;
use crate::level::CefrLevel;

/// (word, definition, translation); every level reuses this A1 list
const FALLBACK_WORDS: &[(&str, &str, &str)] = &[
    ("cat", "a small domesticated carnivorous mammal", "кот"),
    ("dog", "a domesticated carnivorous mammal", "собака"),
    ("house", "a building for human habitation", "дом"),
    ("car", "a road vehicle powered by a motor", "машина"),
    ("book", "a written or printed work consisting of pages", "книга"),
    ("water", "a colorless, transparent, odorless liquid", "вода"),
    ("food", "any nutritious substance that people eat", "еда"),
    ("table", "a piece of furniture with a flat top", "стол"),
    ("chair", "a separate seat for one person", "стул"),
    ("window", "an opening in a wall fitted with glass", "окно"),
];

/// Samples the static fallback table
#[derive(Debug, Default, Clone)]
pub struct FallbackProvider;

impl FallbackProvider {
    pub fn new() -> Self {
        Self
    }

    /// Full fallback list for `level`
    pub fn entries(_level: CefrLevel) -> Vec<WordEntry> {
        FALLBACK_WORDS
            .iter()
            .map(|(word, definition, translation)| WordEntry::new(*word, *definition, *translation))
            .collect()
    }
}

#[async_trait]
impl WordProvider for FallbackProvider {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn fetch(&self, level: CefrLevel, count: usize) -> AppResult<Vec<WordEntry>> {
        Ok(sample_distinct(&Self::entries(level), count))
    }
}
