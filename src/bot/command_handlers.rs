//! Command Handlers module for processing bot commands

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use super::callback_handler::more_words_text;
use super::ui_builder::{
    create_level_keyboard, create_words_keyboard, format_test_daily_message, format_welcome,
    format_words_text, WordsTitle,
};
use super::BotContext;
use crate::errors::{error_logging, AppError};
use crate::level::CefrLevel;

/// Slash commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Level,
    More,
    Translate,
    TestDaily,
    Words,
}

impl Command {
    /// Parse the first token of a message, accepting the `/cmd@BotName` form
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "level" => Some(Self::Level),
            "more" => Some(Self::More),
            "translate" => Some(Self::Translate),
            "test_daily" => Some(Self::TestDaily),
            "words" => Some(Self::Words),
            _ => None,
        }
    }
}

/// Run one command for the message author
pub async fn handle_command(
    bot: &Bot,
    msg: &Message,
    command: Command,
    user_id: i64,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    debug!(user_id = %user_id, command = ?command, "Handling command");

    match command {
        Command::Start => handle_start_command(bot, msg, ctx, language_code).await,
        Command::Level => handle_level_command(bot, msg, ctx, language_code).await,
        Command::More => handle_more_command(bot, msg, user_id, ctx, language_code).await,
        Command::Translate => {
            bot.send_message(msg.chat.id, ctx.localization.t("translate-prompt", language_code))
                .await?;
            Ok(())
        }
        Command::TestDaily => {
            handle_test_daily_command(bot, msg, user_id, ctx, language_code).await
        }
        Command::Words => handle_words_command(bot, msg, user_id, ctx, language_code).await,
    }
}

/// Handle the /start command
pub async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    let welcome = format_welcome(&ctx.send_time, &ctx.localization, language_code);
    bot.send_message(msg.chat.id, welcome)
        .parse_mode(ParseMode::Html)
        .reply_markup(create_level_keyboard(&ctx.localization, language_code))
        .await?;
    Ok(())
}

/// Handle the /level command
pub async fn handle_level_command(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    bot.send_message(msg.chat.id, ctx.localization.t("choose-level", language_code))
        .reply_markup(create_level_keyboard(&ctx.localization, language_code))
        .await?;
    Ok(())
}

/// Handle the /more command: retire the current batch and show a new one
pub async fn handle_more_command(
    bot: &Bot,
    msg: &Message,
    user_id: i64,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    if ctx.engine.level(user_id).await?.is_none() {
        return reply_level_required(bot, msg, ctx, language_code).await;
    }

    let loading = bot
        .send_message(msg.chat.id, ctx.localization.t("loading-words", language_code))
        .await?;

    let text = match ctx.engine.refresh(user_id).await {
        Ok(words) => more_words_text(ctx, user_id, &words, language_code).await?,
        Err(e) => error_text(e, user_id, ctx, language_code),
    };

    bot.edit_message_text(msg.chat.id, loading.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(create_words_keyboard(&ctx.localization, language_code))
        .await?;
    Ok(())
}

/// Handle the /test_daily command: build today's batch now and show the broadcast text
pub async fn handle_test_daily_command(
    bot: &Bot,
    msg: &Message,
    user_id: i64,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(level) = ctx.engine.level(user_id).await? else {
        return reply_level_required(bot, msg, ctx, language_code).await;
    };

    let loading = bot
        .send_message(msg.chat.id, ctx.localization.t("loading-test", language_code))
        .await?;

    let text = match ctx.engine.force_daily(user_id).await {
        Ok(words) if words.is_empty() => ctx.localization.t("no-words", language_code),
        Ok(words) => format_test_daily_message(&words, level, &ctx.localization, language_code),
        Err(e) => error_text(e, user_id, ctx, language_code),
    };

    bot.edit_message_text(msg.chat.id, loading.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle the /words command: show the current batch unchanged
pub async fn handle_words_command(
    bot: &Bot,
    msg: &Message,
    user_id: i64,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    match ctx.engine.current(user_id).await {
        Ok(words) => {
            let level = ctx.engine.level(user_id).await?.unwrap_or(CefrLevel::BASE);
            let text = format_words_text(
                &words,
                level,
                WordsTitle::Default,
                &ctx.localization,
                language_code,
            );
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(create_words_keyboard(&ctx.localization, language_code))
                .await?;
            Ok(())
        }
        Err(AppError::LevelNotSelected(_)) => {
            reply_level_required(bot, msg, ctx, language_code).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn reply_level_required(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> Result<()> {
    bot.send_message(msg.chat.id, ctx.localization.t("level-required", language_code))
        .await?;
    Ok(())
}

fn error_text(
    error: AppError,
    user_id: i64,
    ctx: &BotContext,
    language_code: Option<&str>,
) -> String {
    match error {
        AppError::LevelNotSelected(_) => ctx.localization.t("level-required", language_code),
        other => {
            error_logging::log_internal_error(
                &other,
                "command_handlers",
                "handle_command",
                Some(user_id),
            );
            ctx.localization.t("error-generic", language_code)
        }
    }
}
