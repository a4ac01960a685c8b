//! Quantified invariants, round-trip/idempotence and boundary behaviors,
//! exercised directly against `tree`/`host_config`/`serializer` rather
//! than through a full `mount`.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use agentree::host_config::HostConfig;
use agentree::node::{NodeKey, TEXT_TYPE};
use agentree::prop::PropValue;
use agentree::serializer;
use agentree::tree::{self, Tree};

fn host() -> (HostConfig, agentree::NodeId) {
    let tree = Rc::new(RefCell::new(Tree::new()));
    let root = tree.borrow().root();
    (HostConfig::new(tree), root)
}

/// Property 1: for every attached node, `parent.children` contains it
/// exactly once, across a sequence of inserts, moves, and removals.
#[test]
fn parent_children_consistency_across_mutations() {
    let mut tree = Tree::new();
    let root = tree.root();
    let a = tree::create_element(&mut tree, "a");
    let b = tree::create_element(&mut tree, "b");
    let c = tree::create_element(&mut tree, "c");

    tree::insert(&mut tree, root, a, None);
    tree::insert(&mut tree, root, b, None);
    tree::insert(&mut tree, root, c, Some(b));
    tree::remove(&mut tree, root, a);
    tree::insert(&mut tree, root, a, None);

    let children = &tree.get(root).unwrap().children;
    for &id in &[a, b, c] {
        assert_eq!(children.iter().filter(|&&x| x == id).count(), 1);
        assert_eq!(tree.get(id).unwrap().parent, Some(root));
    }
}

/// Property 2: applying a prepared patch reproduces `old_props` with
/// the patch's non-sentinel entries inserted and sentinel entries
/// deleted.
#[test]
fn commit_update_applies_patch_exactly() {
    let (hc, root) = host();
    let mut initial = IndexMap::new();
    initial.insert("a".to_string(), PropValue::from(1i64));
    initial.insert("b".to_string(), PropValue::from("x"));
    let node = hc.create_instance("t", initial.clone());
    hc.append_child_to_container(root, node);

    let mut new_props = IndexMap::new();
    new_props.insert("a".to_string(), PropValue::from(1i64));
    new_props.insert("c".to_string(), PropValue::from(true));

    let patch = hc.prepare_update(&initial, &new_props).unwrap();
    hc.commit_update(node, patch);

    let tree = hc.tree_handle();
    let tree = tree.borrow();
    let props = &tree.get(node).unwrap().props;
    assert_eq!(props.get("a"), Some(&PropValue::from(1i64)));
    assert_eq!(props.get("c"), Some(&PropValue::from(true)));
    assert!(!props.contains_key("b"));
}

/// Property 5: every `TEXT` node has empty children and a `props` bag
/// containing only `value`, string-typed.
#[test]
fn text_node_shape_invariant() {
    let mut tree = Tree::new();
    let t = tree::create_text(&mut tree, "hi");
    let node = tree.get(t).unwrap();
    assert_eq!(node.node_type, TEXT_TYPE);
    assert!(node.children.is_empty());
    assert_eq!(node.props.len(), 1);
    assert!(matches!(node.props.get("value"), Some(PropValue::Str(_))));
}

/// Round-trip: insert then immediately remove restores prior structure
/// and clears the child's `parent`.
#[test]
fn insert_then_remove_is_a_no_op_on_structure() {
    let mut tree = Tree::new();
    let root = tree.root();
    let before = tree.get(root).unwrap().children.clone();

    let child = tree::create_element(&mut tree, "phase");
    tree::insert(&mut tree, root, child, None);
    tree::remove(&mut tree, root, child);

    assert_eq!(tree.get(root).unwrap().children, before);
    assert!(tree.get(child).unwrap().parent.is_none());
}

/// Round-trip: `key` set via `set_property` serializes as the first
/// attribute, ahead of any prop.
#[test]
fn key_serializes_before_props() {
    let mut tree = Tree::new();
    let root = tree.root();
    let n = tree::create_element(&mut tree, "t");
    tree::set_property(&mut tree, n, "zeta", PropValue::from("z"));
    tree::set_property(&mut tree, n, "key", PropValue::from("k1"));
    tree::insert(&mut tree, root, n, None);

    let xml = serializer::serialize_tree(&mut tree, root);
    assert_eq!(xml, r#"<t key="k1" zeta="z" />"#);
}

/// Round-trip: every escape character, concatenated, escapes without
/// double-escaping the ampersand.
#[test]
fn escaping_every_reserved_character_is_single_pass() {
    let mut tree = Tree::new();
    let root = tree.root();
    let n = tree::create_element(&mut tree, "t");
    tree::set_property(&mut tree, n, "v", PropValue::from("&<>\"'"));
    tree::insert(&mut tree, root, n, None);

    let xml = serializer::serialize_tree(&mut tree, root);
    assert_eq!(xml, r#"<t v="&amp;&lt;&gt;&quot;&apos;" />"#);
}

/// Boundary: an empty root serializes to the empty string.
#[test]
fn empty_root_is_empty_string() {
    let mut tree = Tree::new();
    let root = tree.root();
    assert_eq!(serializer::serialize_tree(&mut tree, root), "");
}

/// Boundary: a root containing only a `TEXT` child has no wrapping tag.
#[test]
fn root_with_only_text_has_no_tag() {
    let mut tree = Tree::new();
    let root = tree.root();
    let t = tree::create_text(&mut tree, "hello & welcome");
    tree::insert(&mut tree, root, t, None);

    assert_eq!(
        serializer::serialize_tree(&mut tree, root),
        "hello &amp; welcome"
    );
}

/// NodeKey variants round-trip through their display form the way the
/// serializer's attribute formatting expects.
#[test]
fn node_key_display_matches_both_variants() {
    assert_eq!(NodeKey::Str("abc".into()).to_string(), "abc");
    assert_eq!(NodeKey::Int(42).to_string(), "42");
}
