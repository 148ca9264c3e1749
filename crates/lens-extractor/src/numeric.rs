//! Recover integers from noisy text (prices, counts, ratings)

use regex::Regex;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d\s]*").expect("hardcoded regex pattern is valid"));

static RATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d(?:[.,]\d)?)\s?(?:/|из)\s?5\b").expect("hardcoded regex pattern is valid")
});

/// Strip every non-digit character and parse what remains as a base-10 integer
///
/// Returns `None` for empty input, input without digits, or a digit run too
/// long to fit in a `u64`.
///
/// ```
/// use lens_extractor::extract_number;
///
/// assert_eq!(extract_number("1 298 ₽"), Some(1298));
/// assert_eq!(extract_number("abc"), None);
/// ```
pub fn extract_number(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Split text into digit runs that may contain grouping whitespace
///
/// `"1 298,00 ₽"` yields `["1 298", "00"]`: the decimal part is its own
/// candidate, so the integer part is tried first. Each candidate is meant to be
/// fed to [`extract_number`] one at a time.
pub fn numeric_candidates(text: &str) -> Vec<&str> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str().trim_end())
        .collect()
}

/// Recover a 1-5 star rating from fragments such as `4/5`, `4,5 / 5` or `5 из 5`
///
/// The fractional part is truncated. Matches outside 1..=5 are skipped.
pub fn extract_rating(text: &str) -> Option<u8> {
    RATING
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().chars().next()?.to_digit(10))
        .find(|value| (1..=5).contains(value))
        .map(|value| value as u8)
}
