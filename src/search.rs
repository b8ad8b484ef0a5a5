//! Case-insensitive name matching shared by the catalog pages and the
//! entry form suggestions.

use serde::Deserialize;

/// The `?q=` search box on the catalog pages.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Whether `name` contains `query`, ignoring case. An empty query matches
/// everything.
pub fn matches_query(name: &str, query: &str) -> bool {
    let query = query.trim();

    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

/// Whether `name` and `query` are the same once case and surrounding
/// whitespace are ignored.
pub fn is_exact_match(name: &str, query: &str) -> bool {
    name.trim().to_lowercase() == query.trim().to_lowercase()
}
