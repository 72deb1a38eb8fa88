//! Marker storage and aggregation.
//!
//! # Responsibility
//! - Hold per-owner marker collections.
//! - Aggregate queries across owners and broadcast changes.
//!
//! # Invariants
//! - Only the registry creates collections; owners are unique among live ones.
//! - Every `set_markers` call fires exactly one change notification.

pub mod collection;
pub mod marker_registry;
