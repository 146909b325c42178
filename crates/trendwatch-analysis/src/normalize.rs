//! Text normalization for topic modeling.

use std::sync::LazyLock;

use regex::Regex;

use crate::lemma::lemmatize;
use crate::stopwords::is_stop_word;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?|www)\S+").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[@#]\w+").expect("valid regex"));
static NON_ALPHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z\s]").expect("valid regex"));

/// Clean raw post text into a space-joined sequence of lemmatized tokens.
///
/// Strips URLs, `@mentions` and `#hashtags`, drops every character that is
/// not an ASCII letter or whitespace, lower-cases, removes tokens of two
/// characters or fewer and English stop-words, then lemmatizes. Lemmas that
/// land on a stop-word are dropped too, so the output is stop-word free and
/// `normalize(normalize(t)) == normalize(t)`.
///
/// Empty or whitespace-only input yields an empty string.
#[must_use]
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let text = URL_RE.replace_all(text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = NON_ALPHA_RE.replace_all(&text, "");
    let lowered = text.to_lowercase();

    lowered
        .split_whitespace()
        .filter(|token| token.len() > 2 && !is_stop_word(token))
        // Letter stripping can glue fragments into a URL-looking token.
        .filter(|token| !URL_RE.is_match(token))
        .map(lemmatize)
        .filter(|lemma| lemma.len() > 2 && !is_stop_word(lemma))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of whitespace-delimited tokens in normalized text.
#[must_use]
pub fn token_count(normalized: &str) -> usize {
    normalized.split_whitespace().count()
}
