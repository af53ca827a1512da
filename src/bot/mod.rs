//! Bot module for handling Telegram interactions
//!
//! - `command_handlers`: slash commands (`/start`, `/more`, `/test_daily`, ...)
//! - `callback_handler`: inline keyboard buttons
//! - `message_handler`: entry point for messages, routes commands and free-text translation
//! - `ui_builder`: keyboards and HTML message formatting

pub mod callback_handler;
pub mod command_handlers;
pub mod message_handler;
pub mod ui_builder;

use std::sync::Arc;
use teloxide::types::{Message, User};

use crate::localization::LocalizationManager;
use crate::rotation::RotationEngine;
use crate::translator::Translator;

/// Shared dependencies handed to every handler
#[derive(Clone)]
pub struct BotContext {
    pub engine: Arc<RotationEngine>,
    pub translator: Arc<Translator>,
    pub localization: Arc<LocalizationManager>,
    /// Daily send time as shown to users, e.g. "10:00"
    pub send_time: String,
}

/// Telegram user id as the store key
pub fn user_key(user: &User) -> i64 {
    user.id.0 as i64
}

/// Language code of the message author
pub fn message_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

pub use callback_handler::callback_handler;
pub use message_handler::message_handler;
