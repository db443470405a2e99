//! Field extraction helpers shared by the channel parsers.

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::is_numeric_token;
use crate::error::ParseError;

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+\.[0-9]+|[0-9]+").expect("number pattern is valid"))
}

/// Every ASCII decimal or integer substring, in encounter order.
pub fn numbers(text: &str) -> Vec<String> {
    number_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Numeric tokens following the first `keyword`, up to the first token that
/// is not a number. Tokens are kept as written.
pub fn numeric_run(text: &str, keyword: &str) -> Result<Vec<String>, ParseError> {
    let (_, rest) = text
        .split_once(keyword)
        .ok_or_else(|| ParseError::tokenization(format!("keyword '{keyword}' not found")))?;
    Ok(rest
        .split_whitespace()
        .take_while(|word| is_numeric_token(word))
        .map(str::to_string)
        .collect())
}

/// Leading ASCII digits of `text`.
pub fn leading_digits(text: &str) -> &str {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    &text[..end]
}

/// Digits right after the first `marker`; `None` if the marker is absent,
/// an empty string if it is not followed by digits.
pub fn digits_after<'t>(text: &'t str, marker: &str) -> Option<&'t str> {
    text.find(marker)
        .map(|at| leading_digits(&text[at + marker.len()..]))
}

/// Last run of consecutive ASCII digits in `text`.
pub fn last_digit_run(text: &str) -> Option<&str> {
    let end = text.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = text[..end]
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + 1);
    Some(&text[start..end])
}

/// Month number for an English month abbreviation (`Jan`..`Dec`, any case).
pub fn month_from_abbrev(token: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    let upper = token.trim().to_ascii_uppercase();
    MONTHS
        .iter()
        .position(|m| *m == upper)
        .map(|i| i as u32 + 1)
}

/// Case-insensitive check for any of `keywords` in `text`.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let upper = text.to_uppercase();
    keywords.iter().any(|k| upper.contains(&k.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_keep_order_and_decimals() {
        assert_eq!(numbers("120 130.5"), vec!["120", "130.5"]);
        assert_eq!(numbers(" 120-130 "), vec!["120", "130"]);
        assert_eq!(numbers("no digits"), Vec::<String>::new());
    }

    #[test]
    fn numeric_run_stops_at_first_word() {
        let run = numeric_run("TARGET 150 160.5 170 SL 100", "TARGET").unwrap();
        assert_eq!(run, vec!["150", "160.5", "170"]);
    }

    #[test]
    fn numeric_run_keeps_leading_and_trailing_points() {
        let run = numeric_run("TARGET .5 150 160. ENJOY", "TARGET").unwrap();
        assert_eq!(run, vec![".5", "150", "160."]);
    }

    #[test]
    fn numbers_ignore_non_ascii_digits() {
        assert_eq!(numbers("@ ٣٠٠ 120"), vec!["120"]);
    }

    #[test]
    fn numeric_run_requires_keyword() {
        assert!(numeric_run("150 160", "TARGET").is_err());
        assert!(numeric_run("TARGET", "TARGET").unwrap().is_empty());
    }

    #[test]
    fn digits_after_marker() {
        assert_eq!(digits_after("150 SL-100", "SL-"), Some("100"));
        assert_eq!(digits_after("150 SL-", "SL-"), Some(""));
        assert_eq!(digits_after("150 SL 100", "SL-"), None);
    }

    #[test]
    fn last_digit_run_examples() {
        assert_eq!(last_digit_run("25TH"), Some("25"));
        assert_eq!(last_digit_run("1ST-31"), Some("31"));
        assert_eq!(last_digit_run("7"), Some("7"));
        assert_eq!(last_digit_run("JAN"), None);
    }

    #[test]
    fn month_abbreviations() {
        assert_eq!(month_from_abbrev("Jan"), Some(1));
        assert_eq!(month_from_abbrev("dec"), Some(12));
        assert_eq!(month_from_abbrev("January"), None);
    }

    #[test]
    fn keyword_search_ignores_case() {
        assert!(contains_any("please exit now", &["CANCEL", "EXIT"]));
        assert!(!contains_any("hold", &["CANCEL", "EXIT"]));
    }
}
