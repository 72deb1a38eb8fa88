//! Marker domain model.
//!
//! # Responsibility
//! - Define the immutable marker record shared by collections, registry and tree.
//! - Define derived read models returned by aggregate queries.
//!
//! # Invariants
//! - A `Marker` never changes after it is minted by its collection.
//! - Derived read models are recomputed per query and never stored.

pub mod marker;
