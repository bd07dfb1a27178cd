// Title tokenization — whitespace split plus case folding and a fixed
// punctuation trim. Deliberately not a general tokenizer.

/// Characters stripped from both ends of every token.
pub const TRIMMED_PUNCTUATION: &[char] = &['(', ')', '"', ',', '{', '}', '/'];

/// Lowercase `token` and trim the fixed punctuation set from both ends.
/// May return an empty string.
pub fn normalize_token(token: &str) -> String {
    token
        .to_lowercase()
        .trim_matches(TRIMMED_PUNCTUATION)
        .to_string()
}

/// Split a title on whitespace and normalize each token, dropping empties.
/// Repeated words are kept, one entry per occurrence.
pub fn tokenize(title: &str) -> Vec<String> {
    title
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize_token("(Central"), "central");
        assert_eq!(normalize_token("\"Park\","), "park");
        assert_eq!(normalize_token("{/}"), "");
    }

    #[test]
    fn test_inner_punctuation_is_kept() {
        assert_eq!(normalize_token("St.-Germain"), "st.-germain");
        assert_eq!(normalize_token("a/b"), "a/b");
    }

    #[test]
    fn test_tokenize_drops_empties_and_keeps_repeats() {
        assert_eq!(
            tokenize("  New ( New  York ) "),
            vec!["new", "new", "york"]
        );
    }

    #[test]
    fn test_blank_title_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }
}
