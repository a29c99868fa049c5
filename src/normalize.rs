//! Name normalization for answer matching.
//!
//! Free-text guesses arrive with arbitrary casing, diacritics, and competing
//! transliteration conventions ("Omar Sharif", "umar shareef", "Umar Sharīf").
//! `normalize_name` canonicalizes all of them into one comparable form so the
//! fuzzy scorer only has to deal with genuine spelling distance.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Multi-word spellings that collapse into a single canonical token.
/// Applied before single-word equivalences so "abd allah" wins over "abd al".
const PHRASE_EQUIVALENTS: &[(&str, &str)] = &[
    ("abd allah", "abdullah"),
    ("abd al", "abdul"),
    ("abd el", "abdul"),
];

/// Transliteration pairs of the same underlying name, keyed in post-fold
/// spelling. Values are never keys and survive the rest of the pipeline
/// unchanged, which keeps normalization idempotent.
const NAME_EQUIVALENTS: &[(&str, &str)] = &[
    ("mohammed", "muhammad"),
    ("mohamed", "muhammad"),
    ("mohammad", "muhammad"),
    ("ahmed", "ahmad"),
    ("omar", "umar"),
    ("hassan", "hasan"),
    ("hussein", "husayn"),
    ("hussain", "husayn"),
    ("abdallah", "abdullah"),
    ("abdel", "abdul"),
    ("nasser", "nasir"),
    // "khaled"/"khalid" both fold kh->h first, so the key is the folded form
    ("haled", "halid"),
];

/// Honorific/particle markers that may be glued to the following name with a
/// hyphen ("al-jazeera", "ibn-sina").
const PARTICLES: &[&str] = &[
    "al", "el", "ad", "ar", "as", "at", "an", "abd", "abdul", "abu", "abou", "bin", "ibn", "ben",
];

/// Canonicalize a subject name, alias, or user guess for comparison.
///
/// Pure and idempotent: `normalize_name(normalize_name(s)) == normalize_name(s)`.
/// Empty input yields an empty string, never an error.
pub fn normalize_name(raw: &str) -> String {
    // Lowercase, decompose, drop combining marks, restrict the charset to
    // letters/digits/hyphen/space.
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        for lower in ch.to_lowercase() {
            if lower.is_alphanumeric() || lower == '-' {
                cleaned.push(lower);
            } else {
                cleaned.push(' ');
            }
        }
    }

    // Fold transliteration digraphs and doubled vowels until stable.
    let folded = fold_transliteration(&cleaned);

    let mut tokens = apply_equivalences(&folded);

    // A leading hyphenated particle becomes its own token ("al-jazira" ->
    // "al jazira") so both joined and spaced spellings converge.
    if let Some(first) = tokens.first() {
        if let Some((particle, rest)) = split_leading_particle(first) {
            tokens[0] = particle;
            tokens.insert(1, rest);
            // the split exposed tokens the tables have not seen yet
            // ("al-hussein" -> "al hussein" -> "al husayn")
            tokens = apply_equivalences(&tokens.join(" "));
        }
    }

    tokens.join(" ")
}

/// Phrase equivalences operate on the whole string, word equivalences on
/// individual tokens. Values are never keys, so applying this twice is the
/// same as applying it once.
fn apply_equivalences(s: &str) -> Vec<String> {
    let mut replaced = s.to_string();
    for (variant, canonical) in PHRASE_EQUIVALENTS {
        replaced = replaced.replace(variant, canonical);
    }
    replaced
        .split_whitespace()
        .map(|word| {
            NAME_EQUIVALENTS
                .iter()
                .find(|(variant, _)| *variant == word)
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or_else(|| word.to_string())
        })
        .collect()
}

fn split_leading_particle(word: &str) -> Option<(String, String)> {
    let (head, rest) = word.split_once('-')?;
    if !rest.is_empty() && PARTICLES.contains(&head) {
        Some((head.to_string(), rest.to_string()))
    } else {
        None
    }
}

/// Apply digraph and doubled-vowel folds until the string stops changing.
/// A single pass is not enough: folds can expose new foldable pairs
/// ("kkh" -> "kh" -> "h").
fn fold_transliteration(s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let folded = fold_once(&current);
        if folded == current {
            return current;
        }
        current = folded;
    }
}

fn fold_once(s: &str) -> String {
    let digraphed = s.replace("ph", "f").replace("kh", "h").replace("gh", "g");

    // Collapse runs of the same vowel: "ee" -> "i", "oo" -> "u", repeated
    // a/i/u to a single character.
    let mut out = String::with_capacity(digraphed.len());
    let mut chars = digraphed.chars().peekable();
    while let Some(c) = chars.next() {
        if matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') {
            let mut run = 1usize;
            while chars.peek() == Some(&c) {
                chars.next();
                run += 1;
            }
            if run == 1 {
                out.push(c);
            } else {
                out.push(match c {
                    'e' => 'i',
                    'o' => 'u',
                    other => other,
                });
            }
        } else {
            out.push(c);
        }
    }
    out
}
