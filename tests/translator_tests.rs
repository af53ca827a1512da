//! # Translator Tests
//!
//! The translator never fails: static table first, then the remote service
//! behind a circuit breaker, then the sentinel.


use daily_words_bot::circuit_breaker::CircuitBreaker;
use daily_words_bot::translator::{
    infer_target_language, is_unavailable, Language, TranslationService, Translator,
};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{EchoTranslationService, FailingTranslationService};

fn translator_with(service: Arc<dyn TranslationService>, threshold: u32) -> Translator {
    Translator::new(
        Some(service),
        CircuitBreaker::new(threshold, Duration::from_secs(60)),
    )
}

#[tokio::test]
async fn test_static_word_skips_remote() {
    let service = Arc::new(FailingTranslationService::default());
    let translator = translator_with(service.clone(), 5);

    assert_eq!(translator.translate("cat", Language::Russian).await, "кот");
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_unknown_word_with_failing_remote_returns_sentinel() {
    let service = Arc::new(FailingTranslationService::default());
    let translator = translator_with(service.clone(), 5);

    let result = translator.translate("serendipity", Language::Russian).await;

    assert!(is_unavailable(&result));
    assert!(result.contains("serendipity"));
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_open_breaker_stops_calling_remote() {
    let service = Arc::new(FailingTranslationService::default());
    let translator = translator_with(service.clone(), 2);

    for word in ["alpha", "beta", "gamma", "delta"] {
        let result = translator.translate(word, Language::Russian).await;
        assert!(is_unavailable(&result));
    }

    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn test_remote_answer_is_used() {
    let translator = translator_with(Arc::new(EchoTranslationService), 5);
    assert_eq!(
        translator.translate("quokka", Language::Russian).await,
        "QUOKKA"
    );
}

#[tokio::test]
async fn test_blank_input_returns_sentinel() {
    let translator = Translator::offline();
    assert!(is_unavailable(&translator.translate("   ", Language::English).await));
}

#[tokio::test]
async fn test_free_text_direction() {
    let translator = Translator::offline();

    let text = "кот";
    let result = translator.translate(text, infer_target_language(text)).await;
    assert_eq!(result, "cat");

    let text = "dog";
    let result = translator.translate(text, infer_target_language(text)).await;
    assert_eq!(result, "собака");
}
