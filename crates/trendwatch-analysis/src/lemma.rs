//! Dictionary-free noun lemmatizer.
//!
//! Reduces plural nouns to their singular base form using the detachment
//! rules of `WordNet`'s morphological processor plus a table of irregular
//! forms. Every output is a fixed point: `lemmatize(lemmatize(w)) == lemmatize(w)`.

/// Irregular plural → singular forms. No value is itself a key or ends in
/// a detachable suffix.
const IRREGULAR: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("children", "child"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("indices", "index"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("mice", "mouse"),
    ("phenomena", "phenomenon"),
    ("shelves", "shelf"),
    ("teeth", "tooth"),
    ("theses", "thesis"),
    ("vertices", "vertex"),
    ("wives", "wife"),
    ("wolves", "wolf"),
    ("women", "woman"),
];

/// Words ending in `s` that are already base forms.
const INVARIANT: &[&str] = &[
    "afterwards", "alias", "always", "atlas", "besides", "bias", "canvas", "chaos", "christmas",
    "economics", "kudos", "lens", "mathematics", "means", "news", "perhaps", "physics",
    "politics", "series", "sometimes", "species", "texas", "towards", "whereas",
];

/// Reduce a lower-case ASCII token to its base form.
///
/// Tokens of three characters or fewer are returned unchanged.
#[must_use]
pub fn lemmatize(word: &str) -> String {
    if let Some(base) = irregular(word) {
        return base.to_string();
    }
    if word.len() <= 3 || INVARIANT.contains(&word) {
        return word.to_string();
    }
    if ["ss", "us", "is", "ous"].iter().any(|s| word.ends_with(s)) {
        return word.to_string();
    }

    let stem = if word.len() >= 5 && word.ends_with("ies") {
        format!("{}y", &word[..word.len() - 3])
    } else if word.len() >= 5
        && ["sses", "ches", "shes", "xes", "zes"]
            .iter()
            .any(|s| word.ends_with(s))
    {
        word[..word.len() - 2].to_string()
    } else if let Some(stripped) = word.strip_suffix('s') {
        stripped.to_string()
    } else {
        return word.to_string();
    };

    match irregular(&stem) {
        Some(base) => base.to_string(),
        None => stem,
    }
}

fn irregular(word: &str) -> Option<&'static str> {
    IRREGULAR
        .iter()
        .find(|(plural, _)| *plural == word)
        .map(|(_, base)| *base)
}
