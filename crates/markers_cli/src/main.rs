//! CLI smoke entry point.
//!
//! # Responsibility
//! - Construct the process-wide marker registry and hand it to a producer and a view.
//! - Print the materialized problems tree for a quick local sanity check.
//!
//! Usage: `markers_cli [ABSOLUTE_LOG_DIR]`. Logging stays off without a directory.

use log::info;
use markers_core::{
    core_version, init_logging, Diagnostic, DiagnosticCollection, DiagnosticSeverity,
    LoggingConfig, MarkerRegistry, MarkerTree, Position, Range, TreeNode, TreeOptions,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Some(log_dir) = std::env::args().nth(1) {
        let started = LoggingConfig::with_default_level(&log_dir)
            .map_err(|err| err.to_string())
            .and_then(|config| init_logging(&config));
        if let Err(err) = started {
            eprintln!("markers_cli: {err}");
            return ExitCode::FAILURE;
        }
    }

    let registry = MarkerRegistry::new();
    let producer = match DiagnosticCollection::new(&registry, Some("demo")) {
        Ok(producer) => producer,
        Err(err) => {
            eprintln!("markers_cli: {err}");
            return ExitCode::FAILURE;
        }
    };
    let tree = MarkerTree::new(registry.clone(), TreeOptions::problems());

    producer.set(
        "file:///workspace/src/main.rs",
        vec![
            diagnostic(3, DiagnosticSeverity::Error, "mismatched types"),
            diagnostic(12, DiagnosticSeverity::Warning, "unused variable `x`"),
        ],
    );
    producer.set(
        "file:///workspace/src/lib.rs",
        vec![diagnostic(1, DiagnosticSeverity::Hint, "consider `#[must_use]`")],
    );
    info!("event=cli_tree_ready module=cli generation={}", tree.generation());

    println!("markers_core version={}", core_version());
    print_tree(&tree);

    producer.dispose();
    ExitCode::SUCCESS
}

fn diagnostic(line: u32, severity: DiagnosticSeverity, message: &str) -> Diagnostic {
    Diagnostic::new(
        Range::new(Position::new(line, 0), Position::new(line, 1)),
        message,
    )
    .with_severity(severity)
    .with_source("demo")
}

fn print_tree(tree: &MarkerTree<MarkerRegistry<Diagnostic>>) {
    let root = tree.root_node();
    println!("{}", tree.root().name);
    for group in tree.children(&root) {
        let TreeNode::Group(file) = &group else {
            continue;
        };
        println!("  {} ({})", file.name, file.count);
        for leaf in tree.children(&group) {
            if let TreeNode::Leaf(leaf) = leaf {
                let line = leaf.marker.data.range.start.line + 1;
                println!("    {}:{} {}", file.name, line, leaf.marker.data.label());
            }
        }
    }
}
