use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}_]+").expect("valid regex");
}

/// Shortest token kept by the knowledge-base index.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Tokenize text for the knowledge base: NFKC normalization, lowercase, split on
/// non-word runs, drop tokens of two characters or fewer. Repeats are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}
