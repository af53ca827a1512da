//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};
use tracing::{debug, warn, Instrument};

use super::ui_builder::{
    create_back_keyboard, create_level_keyboard, create_words_keyboard, format_words_text,
    WordsTitle,
};
use super::{user_key, BotContext};
use crate::errors::{error_logging, AppError};
use crate::level::CefrLevel;
use crate::observability;

const LEVEL_PREFIX: &str = "level_";

/// Every button the bot puts on a keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    SelectLevel(CefrLevel),
    MoreWords,
    TranslateMode,
    BackToWords,
    ChangeLevel,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "more_words" => Some(Self::MoreWords),
            "translate_mode" => Some(Self::TranslateMode),
            "back_to_words" => Some(Self::BackToWords),
            "change_level" => Some(Self::ChangeLevel),
            _ => data
                .strip_prefix(LEVEL_PREFIX)
                .and_then(|level| level.parse().ok())
                .map(Self::SelectLevel),
        }
    }

    pub fn to_data(self) -> String {
        match self {
            Self::SelectLevel(level) => format!("{}{}", LEVEL_PREFIX, level.as_str()),
            Self::MoreWords => "more_words".to_string(),
            Self::TranslateMode => "translate_mode".to_string(),
            Self::BackToWords => "back_to_words".to_string(),
            Self::ChangeLevel => "change_level".to_string(),
        }
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: BotContext) -> Result<()> {
    let span = observability::telegram_span("callback_handler", Some(user_key(&q.from)));
    handle_callback(bot, q, ctx).instrument(span).await
}

async fn handle_callback(bot: Bot, q: CallbackQuery, ctx: BotContext) -> Result<()> {
    let user_id = user_key(&q.from);
    let start_time = std::time::Instant::now();

    // Answer first so the button stops spinning even if the work below is slow
    bot.answer_callback_query(q.id.clone()).await?;

    let data = q.data.as_deref().unwrap_or("");
    let Some(action) = CallbackAction::parse(data) else {
        warn!(user_id = %user_id, data = %data, "Unknown callback data");
        return Ok(());
    };

    let Some(message) = q.message.as_ref() else {
        debug!(user_id = %user_id, "Callback without an attached message");
        return Ok(());
    };

    let screen = Screen {
        bot: &bot,
        chat_id: message.chat().id,
        message_id: message.id(),
    };
    let language_code = q.from.language_code.as_deref();

    let result = handle_action(&screen, action, user_id, &ctx, language_code).await;

    let duration = start_time.elapsed();
    observability::record_request_metrics("telegram_callback", 200, duration);

    result
}

/// The message a callback edits in place
struct Screen<'a> {
    bot: &'a Bot,
    chat_id: ChatId,
    message_id: MessageId,
}

impl Screen<'_> {
    async fn show(&self, text: String, keyboard: Option<InlineKeyboardMarkup>) -> Result<()> {
        let request = self
            .bot
            .edit_message_text(self.chat_id, self.message_id, text)
            .parse_mode(ParseMode::Html);

        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
        Ok(())
    }
}

async fn handle_action(
    screen: &Screen<'_>,
    action: CallbackAction,
    user_id: i64,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    let loc = &ctx.localization;

    match action {
        CallbackAction::SelectLevel(level) => {
            let words = ctx.engine.select_level(user_id, level).await?;
            let text = format!(
                "{}\n\n{}",
                loc.t_args("level-set", &[("level", level.as_str())], language_code),
                format_words_text(&words, level, WordsTitle::Today, loc, language_code)
            );
            screen
                .show(text, Some(create_words_keyboard(loc, language_code)))
                .await
        }
        CallbackAction::MoreWords => {
            screen.show(loc.t("loading-words", language_code), None).await?;
            match ctx.engine.refresh(user_id).await {
                Ok(words) => {
                    let text =
                        more_words_text(ctx, user_id, &words, language_code).await?;
                    screen
                        .show(text, Some(create_words_keyboard(loc, language_code)))
                        .await
                }
                Err(e) => show_error(screen, e, user_id, ctx, language_code).await,
            }
        }
        CallbackAction::TranslateMode => {
            screen
                .show(
                    loc.t("translate-mode", language_code),
                    Some(create_back_keyboard(loc, language_code)),
                )
                .await
        }
        CallbackAction::BackToWords => match ctx.engine.current(user_id).await {
            Ok(words) => {
                let level = ctx.engine.level(user_id).await?.unwrap_or(CefrLevel::BASE);
                let text =
                    format_words_text(&words, level, WordsTitle::Default, loc, language_code);
                screen
                    .show(text, Some(create_words_keyboard(loc, language_code)))
                    .await
            }
            Err(e) => show_error(screen, e, user_id, ctx, language_code).await,
        },
        CallbackAction::ChangeLevel => {
            screen
                .show(
                    loc.t("choose-level", language_code),
                    Some(create_level_keyboard(loc, language_code)),
                )
                .await
        }
    }
}

/// Body of the "more words" answer: new list plus the learned counter
pub async fn more_words_text(
    ctx: &BotContext,
    user_id: i64,
    words: &[crate::word_source::WordEntry],
    language_code: Option<&str>,
) -> Result<String> {
    let loc = &ctx.localization;
    if words.is_empty() {
        return Ok(loc.t("no-words", language_code));
    }

    let level = ctx.engine.level(user_id).await?.unwrap_or(CefrLevel::BASE);
    let learned = ctx.engine.learned_count(user_id).await?;

    Ok(format!(
        "🆕 {}\n{}",
        format_words_text(words, level, WordsTitle::New, loc, language_code),
        loc.t_args("learned-count", &[("count", learned.to_string().as_str())], language_code)
    ))
}

async fn show_error(
    screen: &Screen<'_>,
    error: AppError,
    user_id: i64,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    let loc = &ctx.localization;
    match error {
        AppError::LevelNotSelected(_) => {
            screen.show(loc.t("level-required", language_code), None).await
        }
        other => {
            error_logging::log_internal_error(
                &other,
                "callback_handler",
                "handle_action",
                Some(user_id),
            );
            screen.show(loc.t("error-generic", language_code), None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        assert_eq!(CallbackAction::parse("more_words"), Some(CallbackAction::MoreWords));
        assert_eq!(
            CallbackAction::parse("level_B2"),
            Some(CallbackAction::SelectLevel(CefrLevel::B2))
        );
        assert_eq!(
            CallbackAction::parse("change_level"),
            Some(CallbackAction::ChangeLevel)
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(CallbackAction::parse("level_Z9"), None);
        assert_eq!(CallbackAction::parse("select_word:cat"), None);
        assert_eq!(CallbackAction::parse(""), None);
    }

    #[test]
    fn test_data_fits_telegram_limit() {
        for level in CefrLevel::ALL {
            let data = CallbackAction::SelectLevel(level).to_data();
            assert!(data.len() <= 64);
            assert_eq!(CallbackAction::parse(&data), Some(CallbackAction::SelectLevel(level)));
        }
    }
}
