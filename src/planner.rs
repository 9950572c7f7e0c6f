// src/planner.rs
//! Turns a raw comma-separated keyword string into independent search terms.

use crate::model::{CombinationMode, SearchTerm};

/// Plan the search terms for `raw` under `mode`.
///
/// OR keeps one term per non-empty piece, in input order. AND joins every
/// trimmed piece, blank ones included, with a single space into one term.
/// Never returns an empty list: an OR input with no usable pieces yields
/// one empty term.
pub fn plan(raw: &str, mode: CombinationMode) -> Vec<SearchTerm> {
    let pieces = raw.split(',').map(str::trim);

    match mode {
        CombinationMode::And => vec![SearchTerm::new(pieces.collect::<Vec<_>>().join(" "))],
        CombinationMode::Or => {
            let terms: Vec<SearchTerm> = pieces
                .filter(|p| !p.is_empty())
                .map(SearchTerm::new)
                .collect();
            if terms.is_empty() {
                vec![SearchTerm::new("")]
            } else {
                terms
            }
        }
    }
}
