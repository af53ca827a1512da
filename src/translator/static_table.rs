//! Bounded English ↔ Russian table for common words.
//!
//! Consulted before any remote lookup. The reverse direction is derived from
//! the same pairs, so every entry works both ways.

use super::Language;

/// (english, russian) pairs
const PAIRS: &[(&str, &str)] = &[
    ("cat", "кот"),
    ("dog", "собака"),
    ("house", "дом"),
    ("car", "машина"),
    ("book", "книга"),
    ("water", "вода"),
    ("food", "еда"),
    ("table", "стол"),
    ("chair", "стул"),
    ("window", "окно"),
    ("door", "дверь"),
    ("friend", "друг"),
    ("family", "семья"),
    ("mother", "мать"),
    ("father", "отец"),
    ("school", "школа"),
    ("work", "работа"),
    ("city", "город"),
    ("street", "улица"),
    ("money", "деньги"),
    ("time", "время"),
    ("day", "день"),
    ("night", "ночь"),
    ("morning", "утро"),
    ("evening", "вечер"),
    ("sun", "солнце"),
    ("rain", "дождь"),
    ("tree", "дерево"),
    ("apple", "яблоко"),
    ("bread", "хлеб"),
    ("milk", "молоко"),
    ("tea", "чай"),
    ("coffee", "кофе"),
    ("hello", "привет"),
    ("goodbye", "до свидания"),
    ("thank you", "спасибо"),
    ("please", "пожалуйста"),
    ("yes", "да"),
    ("no", "нет"),
    ("good", "хороший"),
    ("bad", "плохой"),
    ("big", "большой"),
    ("small", "маленький"),
    ("happy", "счастливый"),
    ("love", "любовь"),
    ("language", "язык"),
    ("word", "слово"),
    ("teacher", "учитель"),
    ("student", "студент"),
    ("english", "английский"),
];

/// Look up `text` (already trimmed) and return its counterpart in `target`
pub fn lookup(text: &str, target: Language) -> Option<&'static str> {
    let needle = text.to_lowercase();
    match target {
        Language::Russian => PAIRS
            .iter()
            .find(|(en, _)| *en == needle)
            .map(|(_, ru)| *ru),
        Language::English => PAIRS
            .iter()
            .find(|(_, ru)| *ru == needle)
            .map(|(en, _)| *en),
    }
}

/// Number of entries in the table
pub fn len() -> usize {
    PAIRS.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_directions() {
        assert_eq!(lookup("cat", Language::Russian), Some("кот"));
        assert_eq!(lookup("кот", Language::English), Some("cat"));
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(lookup("Window", Language::Russian), Some("окно"));
        assert_eq!(lookup("Окно", Language::English), Some("window"));
    }

    #[test]
    fn test_lookup_wrong_direction_misses() {
        assert_eq!(lookup("cat", Language::English), None);
        assert_eq!(lookup("serendipity", Language::Russian), None);
    }

    #[test]
    fn test_table_has_no_duplicate_keys() {
        let mut english: Vec<&str> = PAIRS.iter().map(|(en, _)| *en).collect();
        english.sort_unstable();
        english.dedup();
        assert_eq!(english.len(), len());
    }
}
