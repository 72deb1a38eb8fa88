//! Core marker indexing for problem-style views.
//! This crate owns the marker registry and the lazy tree derived from it.

pub mod logging;
pub mod model;
pub mod notify;
pub mod problem;
pub mod registry;
pub mod tree;

pub use logging::{
    active_logging_config, default_log_level, init_logging, LoggingConfig, LoggingConfigError,
};
pub use model::marker::{Marker, MarkerInfo};
pub use notify::{ChangeNotifier, Subscription, SubscriptionId};
pub use problem::collection::DiagnosticCollection;
pub use problem::diagnostic::{
    Diagnostic, DiagnosticSeverity, InvalidSeverity, Position, Range,
};
pub use problem::{is_problem_marker, ProblemMarker, DEFAULT_PROBLEM_OWNER, PROBLEM_KIND};
pub use registry::collection::MarkerCollection;
pub use registry::marker_registry::{MarkerRegistry, MarkerRegistryError, MarkerSource};
pub use tree::materializer::{MarkerTree, TreeOptions, DEFAULT_ROOT_ID, DEFAULT_ROOT_NAME};
pub use tree::node::{resource_display_name, GroupNode, LeafNode, RootNode, TreeNode};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
