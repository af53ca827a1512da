//! # Word Source Tests
//!
//! Provider chain ordering, fallback behaviour and batch bounds.


use daily_words_bot::level::CefrLevel;
use daily_words_bot::translator::Translator;
use daily_words_bot::word_source::{
    FallbackProvider, LocalBankProvider, WordBank, WordProvider, WordSource, MAX_WORDS_PER_REQUEST,
};
use std::collections::HashSet;
use std::sync::Arc;
use test_helpers::{EmptyProvider, FailingProvider, SequentialProvider};

fn unique_words(words: &[daily_words_bot::WordEntry]) -> usize {
    words.iter().map(|w| w.word.as_str()).collect::<HashSet<_>>().len()
}

#[tokio::test]
async fn test_first_non_empty_provider_wins() {
    let primary = Arc::new(SequentialProvider::new(20));
    let secondary = Arc::new(SequentialProvider::from_words(vec!["other".to_string()]));
    let source = WordSource::new(vec![
        primary.clone() as Arc<dyn WordProvider>,
        secondary.clone(),
    ]);

    let words = source.fetch_words(CefrLevel::B1, 5).await;

    assert_eq!(words.len(), 5);
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn test_failing_and_empty_providers_fall_through() {
    let failing = Arc::new(FailingProvider::default());
    let source = WordSource::new(vec![
        failing.clone() as Arc<dyn WordProvider>,
        Arc::new(EmptyProvider),
        Arc::new(FallbackProvider::new()),
    ]);

    let words = source.fetch_words(CefrLevel::C1, 5).await;

    // Each provider is asked once, no retries
    assert_eq!(failing.calls(), 1);
    assert_eq!(words.len(), 5);
    assert_eq!(unique_words(&words), 5);
}

#[tokio::test]
async fn test_all_providers_failing_yields_empty_batch() {
    let source = WordSource::new(vec![
        Arc::new(FailingProvider::default()) as Arc<dyn WordProvider>,
        Arc::new(EmptyProvider),
    ]);

    assert!(source.fetch_words(CefrLevel::A2, 5).await.is_empty());
}

#[tokio::test]
async fn test_count_is_capped() {
    let source = WordSource::new(vec![
        Arc::new(SequentialProvider::new(50)) as Arc<dyn WordProvider>
    ]);

    let words = source.fetch_words(CefrLevel::A1, 100).await;
    assert_eq!(words.len(), MAX_WORDS_PER_REQUEST);
    assert!(source.fetch_words(CefrLevel::A1, 0).await.is_empty());
}

#[tokio::test]
async fn test_small_pool_returns_whole_pool_without_padding() {
    let bank = WordBank::from_json(r#"{"A1": ["cat", "dog", "sun"]}"#).unwrap();
    let provider = LocalBankProvider::new(bank, Arc::new(Translator::offline()), None);
    let source = WordSource::new(vec![Arc::new(provider) as Arc<dyn WordProvider>]);

    let words = source.fetch_words(CefrLevel::A1, 5).await;

    assert_eq!(words.len(), 3);
    assert_eq!(unique_words(&words), 3);
}

#[tokio::test]
async fn test_embedded_bank_batches_are_distinct_for_every_level() {
    let provider =
        LocalBankProvider::new(WordBank::embedded().unwrap(), Arc::new(Translator::offline()), None);
    let source = WordSource::new(vec![Arc::new(provider) as Arc<dyn WordProvider>]);

    for level in CefrLevel::ALL {
        let words = source.fetch_words(level, 5).await;
        assert_eq!(words.len(), 5, "level {}", level);
        assert_eq!(unique_words(&words), 5, "level {}", level);
        assert!(words.iter().all(|w| !w.translation.is_empty()));
    }
}

#[tokio::test]
async fn test_local_bank_uses_static_translations_and_placeholder_definition() {
    let bank = WordBank::from_json(r#"{"A1": ["dog"]}"#).unwrap();
    let provider = LocalBankProvider::new(bank, Arc::new(Translator::offline()), None);

    let words = provider.fetch(CefrLevel::B2, 1).await.unwrap();

    assert_eq!(words.len(), 1);
    assert_eq!(words[0].word, "dog");
    assert_eq!(words[0].translation, "собака");
    assert!(!words[0].has_definition());
}
