//! Rust rendition of the index's `autocomplete` analyzer.
//!
//! The in-memory backend uses this to answer term queries the same way the
//! Elasticsearch index does: documents are indexed with edge n-grams, queries
//! are split on whitespace, lowercased and truncated to the longest gram.

/// Shortest prefix emitted by the `engram` filter.
pub const MIN_GRAM: usize = 1;
/// Longest prefix emitted by the `engram` filter.
pub const MAX_GRAM: usize = 10;

/// Index-time analysis: whitespace tokenizer, lowercase, edge n-grams.
///
/// Gram lengths are counted in characters, not bytes.
#[must_use]
pub fn autocomplete_grams(text: &str) -> Vec<String> {
    let mut grams = Vec::new();
    for token in text.split_whitespace() {
        let lower = token.to_lowercase();
        let chars: Vec<char> = lower.chars().collect();
        let max = chars.len().min(MAX_GRAM);
        for len in MIN_GRAM..=max {
            grams.push(chars[..len].iter().collect());
        }
    }
    grams
}

/// Search-time analysis: whitespace tokenizer, lowercase, truncate.
///
/// Tokens are cut to [`MAX_GRAM`] characters, the longest gram stored at
/// index time, so whole words longer than that still match.
#[must_use]
pub fn query_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.to_lowercase().chars().take(MAX_GRAM).collect())
        .collect()
}
