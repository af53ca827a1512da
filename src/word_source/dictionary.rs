//! Remote English dictionary lookups for word definitions.
//!
//! Speaks the `dictionaryapi.dev` format:
//! `GET {base_url}/{word}` → `[{"meanings":[{"definitions":[{"definition":"..."}]}]}]`.

use serde::Deserialize;
use tracing::debug;

use crate::errors::{error_logging, AppError, AppResult};

/// Public free dictionary endpoint
pub const DEFAULT_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    #[serde(default)]
    meanings: Vec<Meaning>,
}

#[derive(Debug, Deserialize)]
struct Meaning {
    #[serde(default)]
    definitions: Vec<Definition>,
}

#[derive(Debug, Deserialize)]
struct Definition {
    definition: String,
}

#[derive(Debug, Clone)]
pub struct DictionaryClient {
    client: reqwest::Client,
    base_url: String,
}

impl DictionaryClient {
    /// `client` is expected to carry the bounded request timeout
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// First definition of `word`, or `None` when unknown or on any failure
    pub async fn lookup_word(&self, word: &str) -> Option<String> {
        match self.try_lookup(word).await {
            Ok(definition) => definition,
            Err(e) => {
                error_logging::log_network_error(&e, "lookup_word", Some(&self.base_url));
                None
            }
        }
    }

    async fn try_lookup(&self, word: &str) -> AppResult<Option<String>> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), word.trim());
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(word = %word, "Dictionary has no entry");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "dictionary service returned HTTP {}",
                response.status()
            )));
        }

        let entries: Vec<DictionaryEntry> = response.json().await?;
        Ok(first_definition(&entries))
    }
}

fn first_definition(entries: &[DictionaryEntry]) -> Option<String> {
    entries
        .iter()
        .flat_map(|entry| entry.meanings.iter())
        .flat_map(|meaning| meaning.definitions.iter())
        .map(|d| d.definition.trim())
        .find(|d| !d.is_empty())
        .map(str::to_string)
}
