//! Outbound message delivery used by the daily broadcast.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use crate::errors::AppResult;
use crate::observability;

/// Sends one already formatted message to one user
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send(&self, user_id: i64, text: &str) -> AppResult<()>;
}

/// Delivery through the Telegram Bot API, HTML parse mode
#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn send(&self, user_id: i64, text: &str) -> AppResult<()> {
        let start = std::time::Instant::now();

        self.bot
            .send_message(ChatId(user_id), text)
            .parse_mode(ParseMode::Html)
            .await?;

        debug!(user_id = %user_id, chars = text.len(), "Message delivered");
        observability::record_request_metrics("telegram_send", 200, start.elapsed());
        Ok(())
    }
}
