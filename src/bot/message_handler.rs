//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, Instrument};

use super::command_handlers::{handle_command, Command};
use super::ui_builder::format_translation;
use super::{message_language, user_key, BotContext};
use crate::observability;
use crate::translator::infer_target_language;

pub async fn message_handler(bot: Bot, msg: Message, ctx: BotContext) -> Result<()> {
    let span = observability::telegram_span("message_handler", msg.from.as_ref().map(user_key));
    handle_message(bot, msg, ctx).instrument(span).await
}

async fn handle_message(bot: Bot, msg: Message, ctx: BotContext) -> Result<()> {
    let start_time = std::time::Instant::now();

    let Some(text) = msg.text() else {
        observability::record_telegram_message("unsupported");
        debug!(chat_id = %msg.chat.id, "Ignoring non-text message");
        return Ok(());
    };
    let Some(user_id) = msg.from.as_ref().map(user_key) else {
        return Ok(());
    };
    let language_code = message_language(&msg);

    let result = if let Some(command) = Command::parse(text) {
        observability::record_telegram_message("command");
        handle_command(&bot, &msg, command, user_id, &ctx, language_code).await
    } else if text.starts_with('/') {
        observability::record_telegram_message("unknown_command");
        debug!(user_id = %user_id, "Unknown command");
        bot.send_message(msg.chat.id, ctx.localization.t("welcome-commands", language_code))
            .await?;
        Ok(())
    } else {
        observability::record_telegram_message("text");
        handle_translation_request(&bot, &msg, text, &ctx).await
    };

    observability::record_request_metrics("telegram_message", 200, start_time.elapsed());

    result
}

/// Any free text is a translation request; the direction follows the script
async fn handle_translation_request(
    bot: &Bot,
    msg: &Message,
    text: &str,
    ctx: &BotContext,
) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }

    let target = infer_target_language(text);
    debug!(chat_id = %msg.chat.id, target = ?target, "Translating free text");

    let translation = ctx.translator.translate(text, target).await;
    bot.send_message(msg.chat.id, format_translation(text, &translation))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
