use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized scope set: trimmed, deduplicated, sorted.
///
/// Its text form is the canonical space-joined `target` stored on access
/// tokens, so two requests for the same scopes in any order share a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScopeSet {
    scopes: BTreeSet<String>,
}

impl ScopeSet {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scopes = scopes
            .into_iter()
            .map(|scope| scope.as_ref().trim().to_string())
            .filter(|scope| !scope.is_empty())
            .collect();
        Self { scopes }
    }

    /// Parse a space-delimited scope string.
    pub fn from_scope_string(value: &str) -> Self {
        Self::new(value.split_whitespace())
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Case-insensitive membership.
    pub fn contains_scope(&self, scope: &str) -> bool {
        let scope = scope.trim();
        self.scopes.iter().any(|own| own.eq_ignore_ascii_case(scope))
    }

    /// Whether every scope in `other` is present here.
    pub fn contains_scope_set(&self, other: &ScopeSet) -> bool {
        other.scopes.iter().all(|scope| self.contains_scope(scope))
    }

    pub fn union(&self, other: &ScopeSet) -> ScopeSet {
        Self {
            scopes: self.scopes.union(&other.scopes).cloned().collect(),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.scopes.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    /// Space-joined canonical form.
    pub fn print_scopes(&self) -> String {
        self.to_vec().join(" ")
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print_scopes())
    }
}

impl From<String> for ScopeSet {
    fn from(value: String) -> Self {
        Self::from_scope_string(&value)
    }
}

impl From<ScopeSet> for String {
    fn from(value: ScopeSet) -> Self {
        value.print_scopes()
    }
}
