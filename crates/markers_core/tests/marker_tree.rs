use markers_core::{MarkerRegistry, MarkerTree, TreeNode, TreeOptions};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn setup() -> MarkerRegistry<&'static str> {
    MarkerRegistry::new()
}

#[test]
fn root_resolves_one_group_per_resource() {
    let registry = setup();
    let owner_a = registry.create_collection("A", "problem").unwrap();
    let owner_b = registry.create_collection("B", "problem").unwrap();
    owner_a.set_markers("file:///src/a.ts", vec!["x", "y"]);
    owner_b.set_markers("file:///src/a.ts", vec!["z"]);
    owner_b.set_markers("file:///src/b.ts", vec!["w"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    let children = tree.children(&tree.root_node());

    assert_eq!(children.len(), 2);
    let first = children[0].as_group().expect("group node");
    assert_eq!(first.resource_id, "file:///src/a.ts");
    assert_eq!(first.name, "a.ts");
    assert_eq!(first.count, 3);
    assert!(!first.expanded);
}

#[test]
fn group_resolves_one_leaf_per_marker() {
    let registry = setup();
    let collection = registry.create_collection("A", "problem").unwrap();
    collection.set_markers("file.ts", vec!["x", "y"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    let groups = tree.children(&tree.root_node());
    let leaves = tree.children(&groups[0]);

    let ids: Vec<_> = leaves.iter().map(TreeNode::id).collect();
    assert_eq!(ids, vec!["A_file.ts_0", "A_file.ts_1"]);
    let leaf = leaves[1].as_leaf().expect("leaf node");
    assert_eq!(leaf.marker.data, "y");
    assert!(!leaf.selected);
    assert!(tree.children(&leaves[0]).is_empty());
}

#[test]
fn expanded_state_survives_refresh() {
    let registry = setup();
    let collection = registry.create_collection("A", "problem").unwrap();
    collection.set_markers("file.ts", vec!["x"]);
    collection.set_markers("other.ts", vec!["y"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    let before = tree.groups();
    assert!(tree.set_expanded("file.ts", true));

    collection.set_markers("file.ts", vec!["x", "x2"]);
    let after = tree.groups();

    let file = after
        .iter()
        .find(|group| group.resource_id == "file.ts")
        .expect("file.ts group");
    assert!(file.expanded);
    assert_eq!(file.count, 2);
    assert!(!after[1].expanded);
    assert_ne!(before[0], *file);
}

#[test]
fn refresh_is_lazy_and_invalidates_cached_children() {
    let registry = setup();
    let collection = registry.create_collection("A", "problem").unwrap();
    collection.set_markers("file.ts", vec!["x"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    assert_eq!(tree.groups().len(), 1);

    collection.set_markers("new.ts", vec!["y"]);
    assert_eq!(tree.generation(), 2);
    assert_eq!(tree.groups().len(), 2);
}

#[test]
fn handler_registered_before_tree_sees_fresh_children() {
    let registry = setup();
    let collection = registry.create_collection("A", "problem").unwrap();
    collection.set_markers("file.ts", vec!["x"]);

    let tree = Rc::new(RefCell::new(None::<MarkerTree<MarkerRegistry<&'static str>>>));
    let seen_groups = Rc::new(Cell::new(0usize));
    let seen_leaves = Rc::new(Cell::new(0usize));
    let handler_tree = Rc::clone(&tree);
    let handler_groups = Rc::clone(&seen_groups);
    let handler_leaves = Rc::clone(&seen_leaves);
    let _renderer = registry.on_markers_changed(move || {
        if let Some(tree) = handler_tree.borrow().as_ref() {
            let groups = tree.groups();
            handler_groups.set(groups.len());
            handler_leaves.set(tree.leaves(&groups[0]).len());
        }
    });

    *tree.borrow_mut() = Some(MarkerTree::new(
        registry.clone(),
        TreeOptions::new("problem"),
    ));
    {
        let tree = tree.borrow();
        let tree = tree.as_ref().unwrap();
        let groups = tree.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(tree.leaves(&groups[0]).len(), 1);
    }

    collection.set_markers("new.ts", vec!["y"]);
    assert_eq!(seen_groups.get(), 2);

    collection.set_markers("file.ts", vec!["x", "z"]);
    assert_eq!(seen_groups.get(), 2);
    assert_eq!(seen_leaves.get(), 2);
}

#[test]
fn selected_state_is_matched_by_resource() {
    let registry = setup();
    let collection = registry.create_collection("A", "problem").unwrap();
    collection.set_markers("file.ts", vec!["x", "y"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    let group = tree.groups().remove(0);
    let leaves = tree.leaves(&group);
    assert!(tree.set_selected("file.ts", &leaves[0].id, true));

    collection.set_markers("file.ts", vec!["y", "x"]);
    let group = tree.groups().remove(0);
    let refreshed = tree.leaves(&group);

    // Both markers share the resource, so both inherit the first previous leaf's state.
    assert!(refreshed.iter().all(|leaf| leaf.selected));
    assert_eq!(refreshed[0].marker.data, "y");
}

#[test]
fn selecting_unknown_marker_reports_false() {
    let registry = setup();
    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    assert!(!tree.set_selected("file.ts", "A_file.ts_0", true));
    assert!(!tree.set_expanded("file.ts", true));
}

#[test]
fn selection_write_back_is_scoped_to_resource() {
    let registry = setup();
    let owner_a = registry.create_collection("a", "problem").unwrap();
    let owner_ab = registry.create_collection("a_b", "problem").unwrap();
    owner_a.set_markers("b_c", vec!["first"]);
    owner_ab.set_markers("c", vec!["second"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    let groups = tree.groups();
    let on_b_c = tree.leaves(&groups[0]);
    let on_c = tree.leaves(&groups[1]);
    assert_eq!(on_b_c[0].id, "a_b_c_0");
    assert_eq!(on_c[0].id, "a_b_c_0");

    assert!(tree.set_selected("c", "a_b_c_0", true));
    assert!(!tree.set_selected("missing.ts", "a_b_c_0", true));

    owner_ab.set_markers("c", vec!["second"]);
    let groups = tree.groups();
    assert!(!tree.leaves(&groups[0])[0].selected);
    assert!(tree.leaves(&groups[1])[0].selected);
}

#[test]
fn resolving_stale_group_yields_no_children() {
    let registry = setup();
    let collection = registry.create_collection("A", "problem").unwrap();
    collection.set_markers("file.ts", vec!["x"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    let groups = tree.children(&tree.root_node());
    collection.dispose();

    assert!(tree.children(&groups[0]).is_empty());
    assert!(tree.children(&tree.root_node()).is_empty());
}

#[test]
fn tree_only_shows_its_kind() {
    let registry = setup();
    let problems = registry.create_collection("A", "problem").unwrap();
    let todos = registry.create_collection("B", "todo").unwrap();
    problems.set_markers("file.ts", vec!["p"]);
    todos.set_markers("notes.md", vec!["t"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("todo"));
    let groups = tree.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].resource_id, "notes.md");
    assert_eq!(tree.root().kind, "todo");
}

#[test]
fn resolve_children_is_immediately_ready() {
    let registry = setup();
    let collection = registry.create_collection("A", "problem").unwrap();
    collection.set_markers("file.ts", vec!["x"]);

    let tree = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    let groups = futures::executor::block_on(tree.resolve_children(&tree.root_node()));
    let leaves = futures::executor::block_on(tree.resolve_children(&groups[0]));
    assert_eq!(groups.len(), 1);
    assert_eq!(leaves.len(), 1);
}

#[test]
fn two_views_keep_independent_state() {
    let registry = setup();
    let collection = registry.create_collection("A", "problem").unwrap();
    collection.set_markers("file.ts", vec!["x"]);

    let left = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    let right = MarkerTree::new(registry.clone(), TreeOptions::new("problem"));
    left.groups();
    right.groups();
    left.set_expanded("file.ts", true);

    collection.set_markers("file.ts", vec!["x"]);
    assert!(left.groups()[0].expanded);
    assert!(!right.groups()[0].expanded);
}
