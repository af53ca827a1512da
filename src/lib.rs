//! # Daily Words Telegram Bot
//!
//! A Telegram bot that teaches English vocabulary by CEFR level: a small
//! batch of words with Russian translations every morning, more on demand,
//! and free-text translation between English and Russian.

pub mod bot;
pub mod circuit_breaker;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod level;
pub mod localization;
pub mod observability;
pub mod observability_config;
pub mod rotation;
pub mod scheduler;
pub mod store;
pub mod translator;
pub mod word_source;

// Re-export types for easier access
pub use errors::{AppError, AppResult};
pub use level::CefrLevel;
pub use rotation::RotationEngine;
pub use word_source::{WordEntry, WordSource};
