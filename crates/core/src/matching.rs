//! Fuzzy name matching for customer resolution.
//!
//! The priority order is part of the contract: exact normalized match, then
//! prefix/superstring, then substring, then a character-overlap ratio. The
//! overlap score is a crude character-set intersection, not edit distance.

use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;

pub const MAX_SUGGESTIONS: usize = 5;
const MIN_SUGGESTION_SCORE: f64 = 0.4;

/// Lowercase, trim, and fold common Latin accents so "camarón" and "Camaron"
/// compare equal. Colloquial input routinely drops the accents.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().chars().map(fold_accent).collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Similarity between a query and a candidate name, on the documented scale:
/// 1.0 exact (normalized), 0.9 prefix/superstring, 0.7 substring, otherwise
/// the best character-overlap ratio across the whole name and its tokens.
pub fn similarity(query: &str, candidate: &str) -> f64 {
    let query = normalize(query);
    let candidate = normalize(candidate);
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let mut best = score_against(&query, &candidate);
    for token in candidate.split_whitespace() {
        best = best.max(score_against(&query, token));
    }
    best
}

fn score_against(query: &str, candidate: &str) -> f64 {
    if query == candidate {
        return 1.0;
    }
    if candidate.starts_with(query) || query.starts_with(candidate) {
        return 0.9;
    }
    if candidate.contains(query) || query.contains(candidate) {
        return 0.7;
    }
    char_overlap_ratio(query, candidate)
}

fn char_overlap_ratio(a: &str, b: &str) -> f64 {
    let set_a: std::collections::BTreeSet<char> =
        a.chars().filter(|c| !c.is_whitespace()).collect();
    let set_b: std::collections::BTreeSet<char> =
        b.chars().filter(|c| !c.is_whitespace()).collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    intersection / union
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerSuggestion {
    pub name: String,
    pub score: f64,
}

/// Outcome of resolving a free-text customer name against the directory.
#[derive(Clone, Debug, PartialEq)]
pub enum CustomerMatch {
    Resolved(Customer),
    /// Nothing matched confidently; ranked suggestions instead of a silent
    /// failure.
    Suggestions(Vec<CustomerSuggestion>),
}

/// Resolve a name in the documented order: exact/substring case-insensitive,
/// then accent-normalized fuzzy, then up to five ranked suggestions. When
/// several directory entries qualify at the same stage the first in listing
/// order wins.
pub fn resolve_customer(name: &str, directory: &[Customer]) -> CustomerMatch {
    let raw = name.trim().to_lowercase();
    if !raw.is_empty() {
        if let Some(found) = directory.iter().find(|customer| {
            let candidate = customer.name.to_lowercase();
            candidate == raw || candidate.contains(&raw) || raw.contains(&candidate)
        }) {
            return CustomerMatch::Resolved(found.clone());
        }
    }

    let folded = normalize(name);
    if !folded.is_empty() {
        if let Some(found) = directory.iter().find(|customer| {
            let candidate = normalize(&customer.name);
            candidate == folded || candidate.contains(&folded) || folded.contains(&candidate)
        }) {
            return CustomerMatch::Resolved(found.clone());
        }
    }

    let mut suggestions: Vec<CustomerSuggestion> = directory
        .iter()
        .map(|customer| CustomerSuggestion {
            name: customer.name.clone(),
            score: similarity(name, &customer.name),
        })
        .filter(|suggestion| suggestion.score >= MIN_SUGGESTION_SCORE)
        .collect();
    suggestions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    suggestions.truncate(MAX_SUGGESTIONS);

    CustomerMatch::Suggestions(suggestions)
}
