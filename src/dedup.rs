//! Prompt/body paraphrase deduplication.
//!
//! When the body paragraph immediately before an interaction restates the
//! interaction's own prompt (same question with a trailing instruction or
//! minor rewording), the paragraph is removed so the question is asked once.
//! A paragraph that adds content the prompt lacks must survive.
//!
//! The metric is containment: the share of the paragraph's normalized content
//! tokens that also appear in the prompt's. Normalization lowercases, strips
//! punctuation, drops stopwords and instruction boilerplate, and folds simple
//! plurals. [`PARAPHRASE_THRESHOLD`] is the documented cut-off.

use std::collections::BTreeSet;

/// Minimum containment of body tokens in prompt tokens for the body
/// paragraph to count as a paraphrase of the prompt.
pub const PARAPHRASE_THRESHOLD: f64 = 0.8;

/// Function words and instruction boilerplate that carry no question content.
const STOPWORDS: [&str; 58] = [
    "a", "an", "the", "in", "on", "of", "at", "to", "from", "for", "with", "by", "as", "is",
    "are", "was", "were", "be", "been", "it", "its", "this", "that", "these", "those", "which",
    "where", "who", "whom", "what", "when", "how", "why", "they", "them", "their", "there",
    "you", "your", "do", "does", "did", "and", "or", "not", "no", "if", "then", "than", "one",
    // instruction boilerplate
    "select", "choose", "pick", "answer", "correct", "following", "apply", "all",
];

/// Split, lowercase, strip punctuation, drop stopwords, fold plurals.
pub fn normalize_tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .map(|w| fold_plural(&w))
        .collect()
}

/// Trailing-`s` folding for words longer than three characters, so
/// "pieces"/"piece" and "experiments"/"experiment" compare equal.
fn fold_plural(word: &str) -> String {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Share of `body` content tokens contained in `prompt` content tokens.
///
/// Returns 0 when the body has no content tokens; an empty paragraph is
/// never treated as a paraphrase.
pub fn containment(body: &str, prompt: &str) -> f64 {
    let body_tokens = normalize_tokens(body);
    if body_tokens.is_empty() {
        return 0.0;
    }
    let prompt_tokens = normalize_tokens(prompt);
    let shared = body_tokens.intersection(&prompt_tokens).count();
    shared as f64 / body_tokens.len() as f64
}

/// Whether the body paragraph is a close paraphrase of the prompt.
pub fn is_paraphrase(body: &str, prompt: &str) -> bool {
    containment(body, prompt) >= PARAPHRASE_THRESHOLD
}
