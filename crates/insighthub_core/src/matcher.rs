//! crates/insighthub_core/src/matcher.rs
//!
//! Token-overlap scoring used to rank pages against a query.
//!
//! Typed questions use the whitespace tokenizer with a raw overlap count.
//! OCR output is noisy and its length is unrelated to page length, so it uses
//! the strict keyword tokenizer with a Jaccard ratio instead.

use std::collections::HashSet;

/// Minimum length of a keyword token.
pub const MIN_KEYWORD_LEN: usize = 3;

/// Lowercases and splits on whitespace. Punctuation is kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Lowercases and keeps only ASCII alphanumeric runs of at least three characters.
pub fn keyword_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|run| run.len() >= MIN_KEYWORD_LEN)
        .map(str::to_string)
        .collect()
}

/// Counts the query tokens, with repetition, that occur anywhere in the document.
pub fn overlap_score(query_tokens: &[String], doc_tokens: &[String]) -> usize {
    if query_tokens.is_empty() || doc_tokens.is_empty() {
        return 0;
    }
    let doc_set: HashSet<&str> = doc_tokens.iter().map(String::as_str).collect();
    query_tokens
        .iter()
        .filter(|t| doc_set.contains(t.as_str()))
        .count()
}

/// Jaccard similarity of the unique tokens on each side.
pub fn keyword_overlap_ratio(tokens_a: &[String], tokens_b: &[String]) -> f64 {
    let a: HashSet<&str> = tokens_a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = tokens_b.iter().map(String::as_str).collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn tokenize_lowercases_and_keeps_punctuation() {
        assert_eq!(tokenize("  The Cat,  sat\n"), toks(&["the", "cat,", "sat"]));
        assert!(tokenize(" \t ").is_empty());
    }

    #[test]
    fn keyword_tokens_drop_short_runs_and_symbols() {
        assert_eq!(
            keyword_tokens("An OCR'd line: x1 ab ABC-123 café"),
            toks(&["ocr", "line", "abc", "123", "caf"])
        );
    }

    #[test]
    fn overlap_is_zero_when_either_side_is_empty() {
        assert_eq!(overlap_score(&[], &toks(&["a"])), 0);
        assert_eq!(overlap_score(&toks(&["a"]), &[]), 0);
    }

    #[test]
    fn overlap_counts_repeated_query_tokens() {
        let doc = toks(&["the", "cat", "sat"]);
        assert_eq!(overlap_score(&toks(&["cat"]), &doc), 1);
        assert_eq!(overlap_score(&toks(&["cat", "cat"]), &doc), 2);
        assert_eq!(overlap_score(&toks(&["cat", "cat", "dog"]), &doc), 2);
    }

    #[test]
    fn question_against_cat_page() {
        let q = tokenize("where did the cat sit");
        let d = tokenize("the cat sat on the mat");
        // "the" and "cat" match; "sit" is not stemmed to "sat".
        assert_eq!(overlap_score(&q, &d), 2);
    }

    #[test]
    fn ratio_is_symmetric_and_bounded() {
        let a = toks(&["alpha", "beta", "gamma"]);
        let b = toks(&["beta", "gamma", "delta", "delta"]);
        let ab = keyword_overlap_ratio(&a, &b);
        assert_eq!(ab, keyword_overlap_ratio(&b, &a));
        assert!((ab - 0.5).abs() < f64::EPSILON);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn ratio_is_one_only_for_identical_sets() {
        let a = toks(&["alpha", "beta"]);
        assert_eq!(keyword_overlap_ratio(&a, &toks(&["beta", "alpha", "beta"])), 1.0);
        assert!(keyword_overlap_ratio(&a, &toks(&["alpha"])) < 1.0);
        assert_eq!(keyword_overlap_ratio(&[], &[]), 0.0);
    }
}
