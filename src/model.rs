//! Domain records exchanged with the inspected document.

use serde::{Deserialize, Serialize};

// =============================================================================
// SITE PROPERTY
// =============================================================================

/// One entry of a site's property bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProperty {
    pub key: String,
    pub value: String,
    /// Whether the property is flagged for search indexing.
    #[serde(default)]
    pub indexed: bool,
}

impl SiteProperty {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into(), indexed: false }
    }

    #[must_use]
    pub fn with_indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }
}

// =============================================================================
// SITE
// =============================================================================

/// A site the panel can inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Stable key, used as the argument for property operations.
    pub key: String,
    pub title: String,
    pub url: String,
}

impl Site {
    pub fn new(key: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self { key: key.into(), title: title.into(), url: url.into() }
    }
}

// =============================================================================
// TESTS
// =============================================================================
