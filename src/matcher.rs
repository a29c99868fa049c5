//! Fuzzy confidence scoring for free-text answers.
//!
//! A single similarity measure misses either reordering (surname-first input)
//! or partial overlap (one given name only), so the scorer runs a fixed
//! pipeline of strategies over normalized strings and takes the maximum:
//! plain edit-distance ratio, best-substring ratio, order-insensitive
//! token-sort ratio, set-based token ratio, and pairwise token ratios.
//! Deterministic: fixed inputs always produce the same score.

use crate::normalize::normalize_name;
use crate::types::Subject;
use std::collections::BTreeSet;

/// Edit-distance similarity of two strings, scaled to 0..=100.
/// Equal strings (including two empty strings) score 100.
pub fn simple_ratio(a: &str, b: &str) -> u8 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    ratio_chars(&a_chars, &b_chars)
}

/// Best `simple_ratio` of the shorter string against every equal-length
/// window of the longer one. An exact substring scores 100.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };
    if short.is_empty() {
        return if long.is_empty() { 100 } else { 0 };
    }

    let mut best = 0u8;
    for start in 0..=(long.len() - short.len()) {
        let window = &long[start..start + short.len()];
        best = best.max(ratio_chars(short, window));
        if best == 100 {
            break;
        }
    }
    best
}

/// Ratio of the two strings with their whitespace tokens sorted, which makes
/// "sharif omar" match "omar sharif".
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    simple_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Set-based token ratio: compares the shared token core against each side's
/// full token set, so a guess that is a subset of the candidate ("umar" for
/// "umar sharif") still scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    let core = intersection.join(" ");
    let full_a = join_nonempty(&core, &only_a.join(" "));
    let full_b = join_nonempty(&core, &only_b.join(" "));

    simple_ratio(&core, &full_a)
        .max(simple_ratio(&core, &full_b))
        .max(simple_ratio(&full_a, &full_b))
}

/// Maximum over all whole-string strategies for two normalized strings.
pub fn similarity(a: &str, b: &str) -> u8 {
    simple_ratio(a, b)
        .max(partial_ratio(a, b))
        .max(token_sort_ratio(a, b))
        .max(token_set_ratio(a, b))
}

/// Confidence in 0..=100 that `guess` names the given subject, taking the
/// maximum over the subject's deduplicated candidate set (canonical name,
/// aliases, native name).
pub fn score_subject(guess: &str, subject: &Subject) -> u8 {
    let guess_norm = normalize_name(guess);
    if guess_norm.is_empty() {
        return 0;
    }

    let mut candidates: BTreeSet<String> = BTreeSet::new();
    candidates.insert(normalize_name(&subject.name));
    for alias in &subject.aliases {
        candidates.insert(normalize_name(alias));
    }
    if let Some(native) = &subject.native_name {
        candidates.insert(normalize_name(native));
    }
    candidates.remove("");

    candidates
        .iter()
        .map(|candidate| score_candidate(&guess_norm, candidate))
        .max()
        .unwrap_or(0)
}

/// Score one normalized candidate: whole-string strategies plus pairwise
/// edit-distance ratios between individual guess and candidate tokens, which
/// tolerates answers giving only part of a name.
fn score_candidate(guess_norm: &str, candidate_norm: &str) -> u8 {
    let mut best = similarity(guess_norm, candidate_norm);
    for guess_token in guess_norm.split_whitespace() {
        for candidate_token in candidate_norm.split_whitespace() {
            best = best.max(simple_ratio(guess_token, candidate_token));
            if best == 100 {
                return 100;
            }
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}

fn ratio_chars(a: &[char], b: &[char]) -> u8 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 100;
    }
    let distance = levenshtein(a, b);
    ((max_len - distance) * 100 / max_len) as u8
}

/// Levenshtein edit distance, two-row dynamic programming.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(name: &str, aliases: &[&str], native: Option<&str>) -> Subject {
        Subject {
            id: "s1".to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            native_name: native.map(|n| n.to_string()),
            category: None,
            portrait_ref: None,
            summary: None,
        }
    }

    #[test]
    fn test_levenshtein() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(levenshtein(&chars(""), &chars("")), 0);
        assert_eq!(levenshtein(&chars("abc"), &chars("")), 3);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("abc"), &chars("abc")), 0);
        assert_eq!(levenshtein(&chars("abc"), &chars("abd")), 1);
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
    }

    #[test]
    fn test_identical_strings_score_100() {
        assert_eq!(simple_ratio("umar sharif", "umar sharif"), 100);
        assert_eq!(similarity("umar sharif", "umar sharif"), 100);
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let pairs = [
            ("", ""),
            ("", "umar"),
            ("completely unrelated", "umar sharif"),
            ("umar", "umar sharif"),
            ("x", "yyyyyyyyyyyyyyyy"),
        ];
        for (a, b) in pairs {
            assert!(similarity(a, b) <= 100);
        }
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("sharif", "umar sharif"), 100);
        assert_eq!(partial_ratio("umar sharif", "sharif"), 100);
    }

    #[test]
    fn test_token_sort_tolerates_reordering() {
        assert_eq!(token_sort_ratio("sharif umar", "umar sharif"), 100);
    }

    #[test]
    fn test_token_set_tolerates_subset() {
        assert_eq!(token_set_ratio("umar", "umar sharif"), 100);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        let s = subject("Omar Sharif", &[], None);
        assert!(score_subject("fairuz", &s) < 60);
    }

    #[test]
    fn test_transliteration_variant_hits_threshold() {
        let s = subject("Ahmed Ali", &["Ahmad Ali"], None);
        assert!(score_subject("Ahmed Ali", &s) >= 80);
        assert!(score_subject("ahmad ali", &s) >= 80);
    }

    #[test]
    fn test_alias_set_is_consulted() {
        let s = subject("Omar Sharif", &["Umar Sharif"], Some("عمر الشريف"));
        assert_eq!(score_subject("umar shareef", &s), 100);
        assert_eq!(score_subject("Omar Sharif", &s), 100);
    }

    #[test]
    fn test_typo_still_matches() {
        let s = subject("Omar Sharif", &[], None);
        assert!(score_subject("omar sherif", &s) >= 80);
    }

    #[test]
    fn test_empty_guess_scores_zero() {
        let s = subject("Omar Sharif", &[], None);
        assert_eq!(score_subject("", &s), 0);
        assert_eq!(score_subject("   ", &s), 0);
    }

    #[test]
    fn test_determinism() {
        let s = subject("Omar Sharif", &["Umar Sharif"], None);
        let first = score_subject("umar shareef", &s);
        for _ in 0..10 {
            assert_eq!(score_subject("umar shareef", &s), first);
        }
    }
}
