//! Did-you-mean suggestions for unrecognized names.
//!
//! Ranks a set of known names by similarity to a mistyped token. Used by the
//! framework's error path to enrich unrecognized-option and unknown-command
//! errors, but has no dependency on it; the input is just strings.
//!
//! # Quick Start
//!
//! ```rust
//! use tiller_suggest::suggest;
//!
//! let candidates = ["send-after", "retry-count", "dryrun"];
//! let hints = suggest(candidates, "rety-count", 3);
//! assert_eq!(hints[0], "retry-count");
//! ```
//!
//! Ranking rules:
//! - only candidates sharing at least one character with the typo are
//!   eligible;
//! - eligible candidates are ordered by ascending edit distance
//!   (insert/delete/substitute);
//! - ties keep the candidates' relative order in the input;
//! - at most `max_results` entries are returned.

mod distance;

pub use distance::edit_distance;

/// Ranks `candidates` by similarity to `typo`.
pub fn suggest<I, S>(candidates: I, typo: &str, max_results: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ranked: Vec<(usize, String)> = candidates
        .into_iter()
        .filter(|c| shares_a_character(c.as_ref(), typo))
        .map(|c| (edit_distance(typo, c.as_ref()), c.as_ref().to_string()))
        .collect();

    // Stable sort: equal distances keep input order.
    ranked.sort_by_key(|(distance, _)| *distance);
    ranked.truncate(max_results);
    ranked.into_iter().map(|(_, name)| name).collect()
}

fn shares_a_character(candidate: &str, typo: &str) -> bool {
    typo.chars().any(|c| candidate.contains(c))
}
