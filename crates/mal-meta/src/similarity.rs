//! Title similarity and ranking.
//!
//! Scores are Sørensen–Dice bigram coefficients. They are only ever used to
//! order candidates, never to decide equality.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-zA-Z]+").expect("valid slug pattern"));

/// Similarity in `[0, 1]`; symmetric, callers normalize case.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(a, b)
}

/// Search slug for a title: every non-alphanumeric run becomes one space.
pub fn slugify(title: &str) -> String {
    NON_ALPHANUMERIC.replace_all(title, " ").into_owned()
}

/// Order `items` by similarity of `key(item)` to `target`, best first.
///
/// The sort is stable, so candidates with equal scores keep their input order.
pub fn rank_by_similarity<T, F>(items: Vec<T>, target: &str, key: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let mut scored: Vec<(f64, T)> = items
        .into_iter()
        .map(|item| (similarity(target, &key(&item)), item))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, item)| item).collect()
}
