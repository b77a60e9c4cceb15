//! Splitting a user query into individual questions.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_CONNECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:also|and)\b[,\s]*").expect("valid connective pattern"));

static CONJUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:also|and)\s+").expect("valid conjunction pattern"));

/// Splits `query` into questions, each ending in `?`.
///
/// Fragments between question marks come first; a leading "also"/"and" is
/// dropped from each. When that yields a single question the query is split
/// on the words "also"/"and" instead. Blank input yields nothing.
pub fn split_questions(query: &str) -> Vec<String> {
    let text = query.trim().replace(['\r', '\n'], " ");

    let questions: Vec<String> = text
        .split('?')
        .map(strip_connective)
        .filter(|part| !part.is_empty())
        .map(|part| with_question_mark(&part))
        .collect();

    if questions.len() != 1 {
        return questions;
    }
    CONJUNCTION
        .split(&text)
        .map(strip_connective)
        .filter(|part| !part.is_empty())
        .map(|part| with_question_mark(&part))
        .collect()
}

fn strip_connective(part: &str) -> String {
    LEADING_CONNECTIVE.replace(part.trim(), "").trim().to_string()
}

fn with_question_mark(s: &str) -> String {
    if s.ends_with('?') { s.to_string() } else { format!("{s}?") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_question_marks_and_drops_connective() {
        assert_eq!(split_questions("What is X? Also what is Y?"), vec!["What is X?", "what is Y?"]);
    }

    #[test]
    fn single_question_untouched() {
        assert_eq!(split_questions("  What is the warranty period?  "), vec!["What is the warranty period?"]);
    }

    #[test]
    fn falls_back_to_conjunctions() {
        assert_eq!(
            split_questions("Who signed the lease and when does it expire"),
            vec!["Who signed the lease?", "when does it expire?"]
        );
        assert_eq!(split_questions("list the fees ALSO the penalties"), vec!["list the fees?", "the penalties?"]);
    }

    #[test]
    fn newlines_and_missing_marks() {
        assert_eq!(split_questions("What is X?\nand what is Y"), vec!["What is X?", "what is Y?"]);
        assert_eq!(split_questions("summarize the report"), vec!["summarize the report?"]);
    }

    #[test]
    fn words_starting_with_connectives_are_kept() {
        assert_eq!(split_questions("Who is Andrew? Alsoton is where?"), vec!["Who is Andrew?", "Alsoton is where?"]);
    }

    #[test]
    fn leading_connective_dropped_in_single_question() {
        assert_eq!(split_questions("Also, what is Y?"), vec!["what is Y?"]);
    }

    #[test]
    fn blank_input_has_no_questions() {
        assert!(split_questions("").is_empty());
        assert!(split_questions("  ?? \n").is_empty());
    }
}
