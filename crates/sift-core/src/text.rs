//! Word tokenization shared by the hashing embedder, the in-memory lexical
//! index, and overlap scoring.

/// Split `text` into lowercase alphanumeric terms.
pub fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_lowercase_and_split_on_punctuation() {
        assert_eq!(terms("Dominant-7th, CHORD!"), vec!["dominant", "7th", "chord"]);
    }

    #[test]
    fn test_terms_empty() {
        assert!(terms("  --  ").is_empty());
    }

    #[test]
    fn test_terms_unicode_letters() {
        assert_eq!(terms("Modulación armónica"), vec!["modulación", "armónica"]);
    }
}
