//! UI Builder module for creating keyboards and formatting messages
//!
//! Every text produced here is Telegram HTML; user-supplied and remote
//! content is escaped before it is embedded.

use std::sync::Arc;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html::{bold, escape, italic};

use crate::level::CefrLevel;
use crate::localization::LocalizationManager;
use crate::word_source::WordEntry;

use super::callback_handler::CallbackAction;

/// Title variants for the word list header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordsTitle {
    Default,
    Today,
    New,
    Daily,
}

impl WordsTitle {
    fn key(self) -> &'static str {
        match self {
            WordsTitle::Default => "words-title-default",
            WordsTitle::Today => "words-title-today",
            WordsTitle::New => "words-title-new",
            WordsTitle::Daily => "words-title-daily",
        }
    }
}

/// Format a batch as a numbered list: `N. <b>word</b> (translation)`,
/// followed by an italic definition line when the dictionary supplied one
pub fn format_words_text(
    words: &[WordEntry],
    level: CefrLevel,
    title: WordsTitle,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    let mut result = localization.t_args(
        "words-header",
        &[
            ("title", localization.t(title.key(), language_code).as_str()),
            ("level", level.as_str()),
        ],
        language_code,
    );
    result.push_str("\n\n");

    for (i, entry) in words.iter().enumerate() {
        let translation = if entry.translation.trim().is_empty() {
            localization.t("no-translation", language_code)
        } else {
            entry.translation.clone()
        };

        result.push_str(&format!(
            "{}. {} ({})\n",
            i + 1,
            bold(&escape(&entry.word)),
            escape(&translation)
        ));
        if entry.has_definition() {
            result.push_str(&format!("   {}\n", italic(&escape(&entry.definition))));
        }
    }

    result
}

/// The morning broadcast message
pub fn format_daily_message(
    words: &[WordEntry],
    level: CefrLevel,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    format!(
        "{} {}\n{}",
        localization.t("daily-greeting", language_code),
        format_words_text(words, level, WordsTitle::Daily, localization, language_code),
        localization.t("daily-farewell", language_code)
    )
}

/// The `/test_daily` message, same list as the broadcast
pub fn format_test_daily_message(
    words: &[WordEntry],
    level: CefrLevel,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    format!(
        "{} {}\n{}",
        localization.t("test-daily-prefix", language_code),
        format_words_text(words, level, WordsTitle::Daily, localization, language_code),
        localization.t("test-daily-footer", language_code)
    )
}

/// Answer to a free-text translation request
pub fn format_translation(text: &str, translation: &str) -> String {
    format!("🔄 {} → {}", bold(&escape(text)), escape(translation))
}

/// Welcome text shown by `/start`
pub fn format_welcome(
    send_time: &str,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    [
        bold(&escape(&localization.t("welcome-title", language_code))),
        escape(&localization.t("welcome-choose-level", language_code)),
        escape(&localization.t("welcome-levels", language_code)),
        escape(&localization.t_args(
            "welcome-schedule",
            &[("time", send_time)],
            language_code,
        )),
        escape(&localization.t("welcome-translations", language_code)),
        escape(&localization.t("welcome-commands", language_code)),
    ]
    .join("\n\n")
}

/// Create a localized inline keyboard button
fn localized_button(
    localization: &LocalizationManager,
    text_key: &str,
    action: CallbackAction,
    language_code: Option<&str>,
) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(localization.t(text_key, language_code), action.to_data())
}

/// One button per CEFR level, one per row
pub fn create_level_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let buttons = CefrLevel::ALL
        .iter()
        .map(|level| {
            vec![localized_button(
                localization,
                level.description_key(),
                CallbackAction::SelectLevel(*level),
                language_code,
            )]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(buttons)
}

/// Actions under a word list
pub fn create_words_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![localized_button(
            localization,
            "button-more-words",
            CallbackAction::MoreWords,
            language_code,
        )],
        vec![localized_button(
            localization,
            "button-translate",
            CallbackAction::TranslateMode,
            language_code,
        )],
        vec![localized_button(
            localization,
            "button-change-level",
            CallbackAction::ChangeLevel,
            language_code,
        )],
    ])
}

/// Single "back to words" button shown in translation mode
pub fn create_back_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![localized_button(
        localization,
        "button-back",
        CallbackAction::BackToWords,
        language_code,
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localization() -> Arc<LocalizationManager> {
        Arc::new(LocalizationManager::new().unwrap())
    }

    #[test]
    fn test_format_words_text_numbers_and_bolds() {
        let loc = localization();
        let words = vec![
            WordEntry::new("cat", "a small animal", "кот"),
            WordEntry::new("dog", "-", ""),
        ];

        let text = format_words_text(&words, CefrLevel::A1, WordsTitle::Today, &loc, None);

        assert!(text.starts_with("📚 Ваши слова на сегодня (A1):\n\n"));
        assert!(text.contains("1. <b>cat</b> (кот)\n"));
        assert!(text.contains("2. <b>dog</b> (нет перевода)\n"));
    }

    #[test]
    fn test_format_words_text_shows_definitions() {
        let loc = localization();
        let words = vec![
            WordEntry::new("cat", "a small <furry> animal", "кот"),
            WordEntry::new("dog", "-", "собака"),
        ];

        let text = format_words_text(&words, CefrLevel::A1, WordsTitle::Today, &loc, None);

        assert!(text.contains("1. <b>cat</b> (кот)\n   <i>a small &lt;furry&gt; animal</i>\n"));
        assert!(text.ends_with("2. <b>dog</b> (собака)\n"));
    }

    #[test]
    fn test_format_words_text_escapes_html() {
        let loc = localization();
        let words = vec![WordEntry::new("<b>", "-", "a & b")];

        let text = format_words_text(&words, CefrLevel::B2, WordsTitle::New, &loc, Some("en"));

        assert!(text.contains("<b>&lt;b&gt;</b>"));
        assert!(text.contains("(a &amp; b)"));
    }

    #[test]
    fn test_daily_message_wraps_list() {
        let loc = localization();
        let words = vec![WordEntry::new("house", "-", "дом")];

        let text = format_daily_message(&words, CefrLevel::A2, &loc, None);

        assert!(text.starts_with("🌅 Доброе утро! 📚 Ваши слова на сегодня (A2)"));
        assert!(text.ends_with("Удачного изучения! 📚"));
    }

    #[test]
    fn test_level_keyboard_has_six_rows() {
        let keyboard = create_level_keyboard(&localization(), None);
        assert_eq!(keyboard.inline_keyboard.len(), 6);
    }

    #[test]
    fn test_format_translation() {
        assert_eq!(format_translation("cat", "кот"), "🔄 <b>cat</b> → кот");
    }
}
