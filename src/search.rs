//! Direct lookup of a single Pokemon by name or Pokedex number.

use std::fmt;
use std::sync::Arc;

use crate::detail::{DetailCache, FetchOptions, PokemonDetail, PokemonRef};

/// Why a lookup produced no Pokemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The query was empty after trimming.
    EmptyQuery,
    /// The catalog has no entry for the normalized term.
    NotFound,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::EmptyQuery => {
                write!(f, "Please enter a Pokémon name or Pokédex number.")
            }
            SearchError::NotFound => {
                write!(f, "Pokémon not found. Try a different name or number.")
            }
        }
    }
}

impl std::error::Error for SearchError {}

/// A successful lookup: the reference card plus the full detail record.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub pokemon: PokemonRef,
    pub detail: Arc<PokemonDetail>,
}

/// Lowercases a query and joins its words with hyphens, matching the
/// catalog's slug convention ("mr mime" becomes "mr-mime").
pub fn normalize_term(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Looks up one Pokemon by name or number, bypassing any cached record so
/// the result is fresh.
pub async fn search(cache: &DetailCache, raw: &str) -> Result<SearchHit, SearchError> {
    let term = normalize_term(raw);
    if term.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    tracing::debug!("Searching catalog for term: {}", term);
    match cache.fetch_detail(&term, FetchOptions::forced()).await {
        Some(detail) => Ok(SearchHit {
            pokemon: PokemonRef::from_detail(&detail),
            detail,
        }),
        None => Err(SearchError::NotFound),
    }
}
