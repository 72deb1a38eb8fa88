//! Lazy marker tree materialization.
//!
//! # Responsibility
//! - Turn registry aggregates into root -> group -> leaf nodes on demand.
//! - Preserve per-node UI state across full rebuilds.
//!
//! # See also
//! - `registry::marker_registry::MarkerSource`

pub mod materializer;
pub mod node;
