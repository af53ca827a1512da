//! # Translator
//!
//! Maps a word or short phrase between English and Russian. The call never
//! fails: the static table is tried first, then the remote service (when one is
//! configured and its circuit breaker is closed), and anything left unresolved
//! becomes a sentinel string naming the original text.

pub mod mymemory;
pub mod static_table;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::circuit_breaker::CircuitBreaker;
use crate::errors::{error_logging, AppResult};
use crate::observability;

pub use mymemory::MyMemoryClient;

/// The two languages of the swapped translation pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Russian,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
        }
    }

    /// The other side of the pair
    pub fn counterpart(&self) -> Language {
        match self {
            Language::English => Language::Russian,
            Language::Russian => Language::English,
        }
    }
}

/// Decide which language `text` should be translated into.
///
/// Text containing any non-ASCII character is treated as Russian input and
/// translated to English; plain ASCII is translated to Russian.
pub fn infer_target_language(text: &str) -> Language {
    if text.chars().any(|c| !c.is_ascii()) {
        Language::English
    } else {
        Language::Russian
    }
}

const SENTINEL_PREFIX: &str = "Перевод для '";
const SENTINEL_SUFFIX: &str = "' недоступен";

/// Placeholder returned when no translation could be obtained for `text`
pub fn unavailable_sentinel(text: &str) -> String {
    format!("{}{}{}", SENTINEL_PREFIX, text, SENTINEL_SUFFIX)
}

/// Whether `translation` is the placeholder rather than a real translation
pub fn is_unavailable(translation: &str) -> bool {
    translation.starts_with(SENTINEL_PREFIX) && translation.ends_with(SENTINEL_SUFFIX)
}

/// Remote translation backend
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Short name used in logs and metrics
    fn name(&self) -> &str;

    /// Translate `text`; `Ok(None)` means the service had no answer
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> AppResult<Option<String>>;
}

/// Static table → remote service → sentinel
pub struct Translator {
    remote: Option<Arc<dyn TranslationService>>,
    breaker: CircuitBreaker,
}

impl Translator {
    pub fn new(remote: Option<Arc<dyn TranslationService>>, breaker: CircuitBreaker) -> Self {
        Self { remote, breaker }
    }

    /// Translator that only consults the static table
    pub fn offline() -> Self {
        Self::new(
            None,
            CircuitBreaker::new(1, std::time::Duration::from_secs(60)),
        )
    }

    pub async fn translate(&self, text: &str, target: Language) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return unavailable_sentinel(text);
        }

        if let Some(hit) = static_table::lookup(trimmed, target) {
            observability::record_translation_metrics("static");
            return hit.to_string();
        }

        if let Some(remote) = &self.remote {
            if self.breaker.is_open() {
                debug!(service = %remote.name(), "Translation circuit open, skipping remote lookup");
            } else {
                match remote.translate(trimmed, target.counterpart(), target).await {
                    Ok(Some(translation)) if !translation.trim().is_empty() => {
                        self.record_remote_outcome(true);
                        observability::record_translation_metrics("remote");
                        return translation;
                    }
                    Ok(_) => {
                        self.record_remote_outcome(true);
                        debug!(text = %trimmed, "Remote translation returned no result");
                    }
                    Err(e) => {
                        self.record_remote_outcome(false);
                        error_logging::log_network_error(&e, "translate", Some(remote.name()));
                    }
                }
            }
        }

        observability::record_translation_metrics("unavailable");
        unavailable_sentinel(trimmed)
    }

    /// Feed the breaker and publish its state
    fn record_remote_outcome(&self, success: bool) {
        if success {
            self.breaker.record_success();
        } else {
            self.breaker.record_failure();
        }
        observability::update_circuit_breaker_state(self.breaker.is_open());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_target_language() {
        assert_eq!(infer_target_language("cat"), Language::Russian);
        assert_eq!(infer_target_language("кот"), Language::English);
        assert_eq!(infer_target_language("hello мир"), Language::English);
    }

    #[test]
    fn test_sentinel_is_recognisable() {
        let sentinel = unavailable_sentinel("quokka");
        assert!(sentinel.contains("quokka"));
        assert!(is_unavailable(&sentinel));
        assert!(!is_unavailable("квокка"));
    }

    #[test]
    fn test_breaker_gauge_follows_every_outcome() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let translator = Translator::new(
            None,
            CircuitBreaker::new(1, std::time::Duration::from_secs(60)),
        );

        metrics::with_local_recorder(&recorder, || translator.record_remote_outcome(false));
        assert!(handle.render().contains("translation_circuit_breaker_open 1"));

        metrics::with_local_recorder(&recorder, || translator.record_remote_outcome(true));
        assert!(handle.render().contains("translation_circuit_breaker_open 0"));
    }

    #[tokio::test]
    async fn test_offline_translator_uses_table_then_sentinel() {
        let translator = Translator::offline();
        assert_eq!(translator.translate("dog", Language::Russian).await, "собака");
        assert_eq!(translator.translate(" хлеб ", Language::English).await, "bread");

        let missing = translator.translate("quokka", Language::Russian).await;
        assert!(is_unavailable(&missing));
    }
}
