// Prompt cleaner - strips action and filler words to isolate the visual subject
// Author: kelexine (https://github.com/kelexine)

use regex::Regex;
use std::sync::OnceLock;

/// Words removed from user prompts, in removal order.
///
/// Extension users phrase prompts as instructions ("please detect X and
/// redirect"); only the subject matters to the vision model.
pub const STOP_WORDS: &[&str] = &[
    // actions the extension performs, not things to look for
    "detect", "detected", "detecting", "redirect", "redirecting", "block", "blocking",
    "skip", "stop", "pause", "close", "leave", "go", "check", "find", "identify",
    "look", "watch", "tell", "me",
    // connectives
    "and", "or", "if", "then", "when", "whenever", "for", "to", "of",
    // filler
    "please", "kindly", "the", "a", "an", "is", "are", "there", "any", "video",
    "this", "that", "it", "in",
];

/// Lazily initialized word-boundary patterns, one per stop word
static STOP_WORD_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

static WHITESPACE: OnceLock<Regex> = OnceLock::new();

fn stop_word_patterns() -> &'static [Regex] {
    STOP_WORD_PATTERNS.get_or_init(|| {
        STOP_WORDS
            .iter()
            .map(|word| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))
                    .expect("Invalid stop word pattern")
            })
            .collect()
    })
}

fn whitespace() -> &'static Regex {
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"))
}

/// Lower-case `raw`, remove every whole-word stop word, and collapse whitespace.
///
/// Words that merely contain a stop word (`android`, `detective`) survive.
pub fn clean(raw: &str) -> String {
    let mut text = raw.to_lowercase();

    for pattern in stop_word_patterns() {
        if pattern.is_match(&text) {
            text = pattern.replace_all(&text, " ").into_owned();
        }
    }

    whitespace().replace_all(text.trim(), " ").into_owned()
}

/// Subject handed to the classifier for the prompt `raw`.
///
/// A prompt made only of stop words keeps its trimmed original wording, so
/// only an empty prompt falls back to the default classifier question.
pub fn subject(raw: &str) -> String {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        raw.trim().to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn test_isolates_subject() {
        let cleaned = clean("please detect shahrukh and redirect");
        assert!(cleaned.contains("shahrukh"));
        for removed in ["detect", "redirect", "please", "and"] {
            assert!(!words(&cleaned).contains(&removed), "{} survived", removed);
        }
        assert_eq!(cleaned, "shahrukh");
    }

    #[test]
    fn test_subject_keeps_prompt_made_of_stop_words() {
        assert_eq!(
            subject("  please detect if there is any video "),
            "please detect if there is any video"
        );
        assert_eq!(subject("please detect shahrukh and redirect"), "shahrukh");
        assert_eq!(subject("   "), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   "), "");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(clean("Please DETECT Snake Game"), "snake game");
    }

    #[test]
    fn test_substrings_are_preserved() {
        assert_eq!(clean("detective android"), "detective android");
        assert_eq!(clean("brandon andrews"), "brandon andrews");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(clean("  snake\t\tand   ladders  "), "snake ladders");
    }

    #[test]
    fn test_punctuation_is_kept() {
        assert_eq!(clean("detect violence, gore"), "violence, gore");
    }
}
