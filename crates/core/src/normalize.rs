use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Comparison form of `input`: lowercased, trimmed, inner whitespace runs
/// collapsed to one space. The caller keeps the original for output.
pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Same as [`normalize_text`], optionally folding diacritics away.
pub fn normalize_for_compare(input: &str, fold_diacritics: bool) -> String {
    let normalized = normalize_text(input);
    if fold_diacritics {
        strip_diacritics(&normalized)
    } else {
        normalized
    }
}

/// NFKD decomposition with combining marks removed.
///
/// Indic vowel signs are combining marks too, so folding is only useful for
/// Latin-script options.
pub fn strip_diacritics(input: &str) -> String {
    input.nfkd().filter(|ch| !is_combining_mark(*ch)).collect()
}
