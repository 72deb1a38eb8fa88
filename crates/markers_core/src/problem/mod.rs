//! Problem markers: diagnostics contributed by language tooling.
//!
//! # Responsibility
//! - Define the LSP-shaped diagnostic payload stored in problem markers.
//! - Adapt a named diagnostics producer onto one marker collection.
//!
//! # Invariants
//! - Every problem marker has kind `PROBLEM_KIND`.
//! - An unnamed producer owns the `DEFAULT_PROBLEM_OWNER` collection.

pub mod collection;
pub mod diagnostic;

use crate::model::marker::Marker;

/// Marker kind used for diagnostics.
pub const PROBLEM_KIND: &str = "problem";
/// Owner used by producers that do not name their collection.
pub const DEFAULT_PROBLEM_OWNER: &str = "default";

/// A marker carrying one diagnostic.
pub type ProblemMarker = Marker<diagnostic::Diagnostic>;

/// Returns whether `marker` belongs to the problem kind.
pub fn is_problem_marker<T>(marker: &Marker<T>) -> bool {
    marker.kind == PROBLEM_KIND
}
