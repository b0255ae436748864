//! Heuristic parser for vocabulary text captured from documents.
//!
//! # Format
//! The default mode recognizes, in priority order:
//! ```text
//! Abundant - Present in great quantity
//! Benevolent: Well-meaning and kindly
//! Ephemeral
//! Lasting for a very short time
//! ```
//! i.e. inline `word <dash|colon> definition` lines first, then a
//! word-on-one-line / definition-on-the-next fallback. A numbered-list pass
//! (`1. word - definition`) runs over the whole input only when neither of
//! those produced anything. A caller-supplied separator replaces all of the
//! built-in patterns.
//!
//! Parsing never fails: text with no recognizable structure yields an empty
//! result, and the decision to surface that to a user belongs to the caller.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::WordDefinitionPair;

/// Word candidates at or above this length are rejected by the two-line
/// pattern.
const MAX_TWO_LINE_WORD_LEN: usize = 50;

// The lazy word group keeps the word as the shortest leading token, so the
// split lands on the first dash/colon in the line.
static INLINE_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*[-–—:]\s*(.+)$").expect("inline pair pattern is valid"));

static NUMBERED_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\s*(.+?)\s*[-–—:]\s*(.+)$").expect("numbered pair pattern is valid")
});

/// Parse loosely structured text into ordered word/definition pairs.
///
/// When `separator` is given, each line is split on its first occurrence and
/// the built-in patterns are not consulted. Duplicate words are kept; entries
/// whose word or definition trims to empty are silently skipped.
pub fn parse_vocabulary(text: &str, separator: Option<&str>) -> Vec<WordDefinitionPair> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Vec::new();
    }

    match separator {
        Some(sep) => parse_with_separator(&lines, sep),
        None => parse_default(&lines),
    }
}

fn parse_with_separator(lines: &[&str], separator: &str) -> Vec<WordDefinitionPair> {
    if separator.is_empty() {
        return Vec::new();
    }

    lines
        .iter()
        .filter_map(|line| {
            let (word, definition) = line.split_once(separator)?;
            make_pair(word, definition)
        })
        .collect()
}

fn parse_default(lines: &[&str]) -> Vec<WordDefinitionPair> {
    let mut pairs = Vec::new();
    let mut cursor = 0;

    while cursor < lines.len() {
        let line = lines[cursor];

        // Pattern 1 claims the line even when one side trims to empty.
        if INLINE_PAIR.is_match(line) {
            if let Some(pair) = inline_pair(line) {
                pairs.push(pair);
            }
            cursor += 1;
            continue;
        }

        if let Some(next) = lines.get(cursor + 1) {
            if let Some(pair) = two_line_pair(line, next) {
                pairs.push(pair);
                cursor += 2;
                continue;
            }
        }

        cursor += 1;
    }

    // Numbered-list fallback, a full second pass that only runs when the
    // line-by-line patterns found nothing at all.
    if pairs.is_empty() {
        pairs = lines.iter().filter_map(|line| numbered_pair(line)).collect();
    }

    pairs
}

/// Pattern 1: `word <dash|colon> definition` on a single line.
fn inline_pair(line: &str) -> Option<WordDefinitionPair> {
    let caps = INLINE_PAIR.captures(line)?;
    make_pair(&caps[1], &caps[2])
}

/// Pattern 2: word on one line, a strictly longer definition on the next.
fn two_line_pair(word_line: &str, definition_line: &str) -> Option<WordDefinitionPair> {
    let word_len = word_line.chars().count();
    if word_len >= MAX_TWO_LINE_WORD_LEN {
        return None;
    }
    if definition_line.chars().count() <= word_len {
        return None;
    }
    make_pair(word_line, definition_line)
}

/// Pattern 3: `<number>. word <dash|colon> definition`, used by the fallback
/// pass.
fn numbered_pair(line: &str) -> Option<WordDefinitionPair> {
    let caps = NUMBERED_PAIR.captures(line)?;
    make_pair(&caps[1], &caps[2])
}

fn make_pair(word: &str, definition: &str) -> Option<WordDefinitionPair> {
    let word = word.trim();
    let definition = definition.trim();
    if word.is_empty() || definition.is_empty() {
        return None;
    }
    Some(WordDefinitionPair {
        word: word.to_string(),
        definition: definition.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair(word: &str, definition: &str) -> WordDefinitionPair {
        WordDefinitionPair {
            word: word.to_string(),
            definition: definition.to_string(),
        }
    }

    #[test]
    fn parse_dash_separated_lines() {
        let text = "Abundant - Present in great quantity\nBenevolent - Well-meaning and kindly";
        assert_eq!(
            parse_vocabulary(text, None),
            vec![
                pair("Abundant", "Present in great quantity"),
                pair("Benevolent", "Well-meaning and kindly"),
            ]
        );
    }

    #[test]
    fn parse_colon_separated_lines() {
        let text = "Candid: Truthful and straightforward\nDiligent: Showing care in one's work";
        assert_eq!(
            parse_vocabulary(text, None),
            vec![
                pair("Candid", "Truthful and straightforward"),
                pair("Diligent", "Showing care in one's work"),
            ]
        );
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(parse_vocabulary("", None).is_empty());
        assert!(parse_vocabulary("   \n  ", None).is_empty());
    }

    #[test]
    fn custom_separator_splits_on_first_occurrence() {
        assert_eq!(
            parse_vocabulary("Abundant | Present in great quantity", Some("|")),
            vec![pair("Abundant", "Present in great quantity")]
        );
        assert_eq!(
            parse_vocabulary("Set | A collection | of things", Some("|")),
            vec![pair("Set", "A collection | of things")]
        );
    }

    #[test]
    fn custom_separator_disables_default_patterns() {
        let text = "Abundant - Present in great quantity";
        assert!(parse_vocabulary(text, Some("|")).is_empty());
    }

    #[test]
    fn custom_separator_requires_both_sides() {
        assert!(parse_vocabulary("Abundant |", Some("|")).is_empty());
        assert!(parse_vocabulary("| Present in great quantity", Some("|")).is_empty());
    }

    #[test]
    fn lazy_word_match_splits_at_first_separator() {
        // The word group is the shortest valid leading token, so the first
        // dash in the line wins.
        assert_eq!(
            parse_vocabulary("well-known - widely recognized", None),
            vec![pair("well", "known - widely recognized")]
        );
    }

    #[test]
    fn two_line_pairs() {
        let text = "Ephemeral\nLasting for a very short time";
        assert_eq!(
            parse_vocabulary(text, None),
            vec![pair("Ephemeral", "Lasting for a very short time")]
        );
    }

    #[test]
    fn two_line_consumes_both_lines() {
        let text = "Cat\nA small domesticated feline\nDog\nA loyal domesticated companion";
        assert_eq!(
            parse_vocabulary(text, None),
            vec![
                pair("Cat", "A small domesticated feline"),
                pair("Dog", "A loyal domesticated companion"),
            ]
        );
    }

    #[test]
    fn two_line_rejected_when_definition_not_longer() {
        // "Brief" is shorter than "Ephemeral", so no pair forms.
        assert!(parse_vocabulary("Ephemeral\nBrief", None).is_empty());
    }

    #[test]
    fn two_line_rejected_for_long_word_candidate() {
        let word_line = "a".repeat(50);
        let definition_line = "b".repeat(60);
        let text = format!("{word_line}\n{definition_line}");
        assert!(parse_vocabulary(&text, None).is_empty());
    }

    #[test]
    fn mixed_inline_and_two_line() {
        let text = "Abundant - Plentiful in supply\nEphemeral\nLasting for a very short time";
        assert_eq!(
            parse_vocabulary(text, None),
            vec![
                pair("Abundant", "Plentiful in supply"),
                pair("Ephemeral", "Lasting for a very short time"),
            ]
        );
    }

    #[test]
    fn duplicate_words_are_kept() {
        let text = "Set - A collection of things\nSet - To place something down";
        assert_eq!(
            parse_vocabulary(text, None),
            vec![
                pair("Set", "A collection of things"),
                pair("Set", "To place something down"),
            ]
        );
    }

    #[test]
    fn inline_pair_requires_a_separator() {
        assert!(inline_pair("Ephemeral").is_none());
        assert!(inline_pair("Word -").is_none());
    }

    #[test]
    fn two_line_pair_checks_lengths() {
        assert!(two_line_pair("Cat", "A small feline").is_some());
        assert!(two_line_pair("Ephemeral", "Brief").is_none());
        assert!(two_line_pair(&"a".repeat(50), &"b".repeat(60)).is_none());
        assert!(two_line_pair(&"a".repeat(49), &"b".repeat(60)).is_some());
    }

    #[test]
    fn numbered_pair_strips_list_prefix() {
        assert_eq!(
            numbered_pair("12. Gregarious - Fond of company").unwrap(),
            pair("Gregarious", "Fond of company")
        );
        assert_eq!(
            numbered_pair("3. Candid: Truthful").unwrap(),
            pair("Candid", "Truthful")
        );
        assert!(numbered_pair("Gregarious - Fond of company").is_none());
    }
}
