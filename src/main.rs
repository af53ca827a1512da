use anyhow::Result;
use daily_words_bot::bot::{self, BotContext};
use daily_words_bot::circuit_breaker::CircuitBreaker;
use daily_words_bot::clock::SystemClock;
use daily_words_bot::config::{AppConfig, POLLING_TIMEOUT_SECS};
use daily_words_bot::delivery::TelegramDelivery;
use daily_words_bot::errors::error_logging;
use daily_words_bot::localization;
use daily_words_bot::observability;
use daily_words_bot::rotation::RotationEngine;
use daily_words_bot::scheduler::{DailyTrigger, Scheduler};
use daily_words_bot::store::{postgres, InMemoryUserStore, PgUserStore, UserStore};
use daily_words_bot::translator::{MyMemoryClient, TranslationService, Translator};
use daily_words_bot::word_source::{
    DictionaryClient, FallbackProvider, LocalBankProvider, WordBank, WordProvider, WordSource,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let startup = Instant::now();

    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "startup", "validate_configuration");
        return Err(e.into());
    }

    let pool = match &config.database {
        Some(database) => Some(
            PgPoolOptions::new()
                .max_connections(database.max_connections)
                .acquire_timeout(Duration::from_secs(database.connect_timeout_secs))
                .connect(&database.url)
                .await?,
        ),
        None => None,
    };

    observability::init_observability_with_health_checks(&config.observability, pool.clone())
        .await?;
    info!("{}", config.summary());

    let store = build_store(pool).await?;

    // Short timeout for translation and dictionary lookups only
    let http_client = config.bot.outbound_client()?;

    let remote: Option<Arc<dyn TranslationService>> =
        config.translation.api_url.as_ref().map(|url| {
            Arc::new(MyMemoryClient::new(http_client.clone(), url.clone()))
                as Arc<dyn TranslationService>
        });
    let translator = Arc::new(Translator::new(
        remote,
        CircuitBreaker::new(
            config.translation.failure_threshold,
            Duration::from_secs(config.translation.reset_secs),
        ),
    ));

    let bank = match &config.words.bank_path {
        Some(path) => WordBank::from_path(path)?,
        None => WordBank::embedded()?,
    };
    info!(words = bank.total_words(), "Word bank loaded");

    let dictionary = config
        .translation
        .dictionary_url
        .as_ref()
        .map(|url| DictionaryClient::new(http_client.clone(), url.clone()));

    let providers: Vec<Arc<dyn WordProvider>> = vec![
        Arc::new(LocalBankProvider::new(bank, Arc::clone(&translator), dictionary)),
        Arc::new(FallbackProvider::new()),
    ];
    let source = Arc::new(WordSource::new(providers));

    let clock = Arc::new(SystemClock);
    let engine = Arc::new(RotationEngine::new(
        store,
        source,
        clock.clone(),
        config.schedule.utc_offset,
        config.words.batch_size,
    ));

    let localization_manager = localization::create_localization_manager()?;

    let bot = Bot::with_client(config.bot.token.clone(), config.bot.telegram_client()?);

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&engine),
        Arc::new(TelegramDelivery::new(bot.clone())),
        Arc::clone(&localization_manager),
        clock,
        DailyTrigger::new(config.schedule.send_time, config.schedule.utc_offset),
    ));
    let shutdown = CancellationToken::new();
    let scheduler_handle = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown.clone();
        async move { scheduler.run(shutdown).await }
    });

    let context = BotContext {
        engine,
        translator,
        localization: localization_manager,
        send_time: config.schedule.display_send_time(),
    };

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let context = context.clone();
            move |bot: Bot, msg: Message| {
                let context = context.clone();
                async move { bot::message_handler(bot, msg, context).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let context = context.clone();
            move |bot: Bot, q: CallbackQuery| {
                let context = context.clone();
                async move { bot::callback_handler(bot, q, context).await }
            }
        }));

    observability::record_startup_metrics(startup.elapsed());
    info!("Bot initialized, starting dispatcher");

    // The Bot API client timeout stays above this long-poll timeout
    let listener = Polling::builder(bot.clone())
        .timeout(Duration::from_secs(POLLING_TIMEOUT_SECS))
        .delete_webhook()
        .await
        .build();

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    // Dispatcher returns on Ctrl-C; stop the scheduler between passes
    shutdown.cancel();
    scheduler_handle.await?;
    info!("Shutdown complete");

    Ok(())
}

async fn build_store(pool: Option<PgPool>) -> Result<Arc<dyn UserStore>> {
    match pool {
        Some(pool) => {
            postgres::init_database_schema(&pool).await?;
            info!("Using PostgreSQL user store");
            Ok(Arc::new(PgUserStore::new(pool)))
        }
        None => {
            info!("DATABASE_URL not set, keeping user state in memory");
            Ok(Arc::new(InMemoryUserStore::new()))
        }
    }
}
