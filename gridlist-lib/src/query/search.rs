//! Search term matching

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::Field;
use super::Filter;
use crate::error::ConfigurationError;

/// How a multi-word search term is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Every word must appear in some searched field.
    #[default]
    All,
    /// Any word in any searched field is enough.
    Any,
    /// The whole term must appear in a searched field.
    Exact,
}

impl SearchMode {
    /// Parses `all`, `any` or `exact`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "all" => Some(SearchMode::All),
            "any" => Some(SearchMode::Any),
            "exact" => Some(SearchMode::Exact),
            _ => None,
        }
    }
}

/// Current search settings of a list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub term: Option<String>,
    pub mode: SearchMode,
    /// Name of a registered [`SearchScope`] replacing the word matcher.
    pub scope: Option<String>,
}

impl SearchState {
    /// The trimmed term, or `None` when searching is off.
    pub fn active_term(&self) -> Option<&str> {
        self.term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// A named search predicate builder: receives the term and the fields to
/// search and returns the condition to apply.
pub type SearchScope = Arc<dyn Fn(&str, &[Field]) -> Filter>;

/// Search scopes by name.
#[derive(Clone, Default)]
pub struct SearchScopes {
    scopes: HashMap<String, SearchScope>,
}

impl SearchScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scope under `name`.
    pub fn register(&mut self, name: impl Into<String>, scope: SearchScope) {
        self.scopes.insert(name.into(), scope);
    }

    /// Returns the scope or an unknown scope error.
    pub fn get(&self, name: &str) -> Result<&SearchScope, ConfigurationError> {
        self.scopes
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownSearchScope {
                scope: name.to_string(),
            })
    }
}

impl std::fmt::Debug for SearchScopes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.scopes.keys()).finish()
    }
}

/// Builds the word-matching condition for `term` over `fields`.
///
/// Returns `None` when there is nothing to match.
///
/// # Example
///
/// ```
/// use gridlist_lib::query::{match_term, Field, Filter, SearchMode};
///
/// let fields = [Field::text("movies", "title")];
/// let filter = match_term("dark star", &fields, SearchMode::Exact).unwrap();
/// assert_eq!(filter, Filter::or([Filter::contains(fields[0].clone(), "dark star")]));
/// ```
pub fn match_term(term: &str, fields: &[Field], mode: SearchMode) -> Option<Filter> {
    let term = term.trim();
    if term.is_empty() || fields.is_empty() {
        return None;
    }

    let any_field = |word: &str| {
        Filter::or(
            fields
                .iter()
                .map(|field| Filter::contains(field.clone(), word)),
        )
    };

    let filter = match mode {
        SearchMode::Exact => any_field(term),
        SearchMode::All => Filter::and(term.split_whitespace().map(any_field)),
        SearchMode::Any => Filter::or(term.split_whitespace().map(any_field)),
    };
    Some(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_mode_requires_each_word() {
        let fields = [Field::text("movies", "title"), Field::text("movies", "director")];
        let filter = match_term("alien scott", &fields, SearchMode::All).unwrap();
        let Filter::And(words) = filter else {
            panic!("expected and");
        };
        assert_eq!(words.len(), 2);
        assert!(matches!(&words[0], Filter::Or(f) if f.len() == 2));
    }

    #[test]
    fn test_empty_term_or_fields() {
        let fields = [Field::text("movies", "title")];
        assert!(match_term("  ", &fields, SearchMode::Any).is_none());
        assert!(match_term("alien", &[], SearchMode::Any).is_none());
    }

    #[test]
    fn test_unknown_scope() {
        let scopes = SearchScopes::new();
        assert!(matches!(
            scopes.get("fuzzy"),
            Err(ConfigurationError::UnknownSearchScope { .. })
        ));
    }

    #[test]
    fn test_active_term() {
        let state = SearchState {
            term: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(state.active_term(), None);
    }
}
