//! Diagnostics producer adapter.

use crate::problem::diagnostic::Diagnostic;
use crate::problem::{DEFAULT_PROBLEM_OWNER, PROBLEM_KIND};
use crate::registry::collection::MarkerCollection;
use crate::registry::marker_registry::{MarkerRegistry, MarkerRegistryError};

/// Named diagnostics sink backed by one problem-kind marker collection.
#[derive(Debug)]
pub struct DiagnosticCollection {
    collection: MarkerCollection<Diagnostic>,
}

impl DiagnosticCollection {
    /// Creates the problem collection for `name`.
    ///
    /// A missing or blank `name` maps to `DEFAULT_PROBLEM_OWNER`.
    ///
    /// # Errors
    /// - `DuplicateOwner` when a live collection already uses the owner.
    pub fn new(
        registry: &MarkerRegistry<Diagnostic>,
        name: Option<&str>,
    ) -> Result<Self, MarkerRegistryError> {
        let owner = name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_PROBLEM_OWNER);
        let collection = registry.create_collection(owner, PROBLEM_KIND)?;
        Ok(Self { collection })
    }

    pub fn name(&self) -> &str {
        self.collection.owner()
    }

    /// Replaces all diagnostics reported for `uri`.
    pub fn set(&self, uri: &str, diagnostics: Vec<Diagnostic>) {
        self.collection.set_markers(uri, diagnostics);
    }

    /// Removes all diagnostics reported for `uri`.
    pub fn clear(&self, uri: &str) {
        self.collection.set_markers(uri, Vec::new());
    }

    pub fn dispose(&self) {
        self.collection.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.collection.is_disposed()
    }
}
