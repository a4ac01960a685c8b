//! Tree operations.
//!
//! Pure, synchronous primitives over a [`Tree`] arena. No persistent
//! identifiers are allocated beyond the arena key itself — node identity
//! is the `NodeId`, backed by a `slotmap` arena (the same choice
//! dioxus-core makes for its own node storage) with anchor-aware
//! insertion on top.

use slotmap::SlotMap;

use crate::node::{Node, NodeId, NodeKey, CHILDREN_PROP, KEY_PROP, ROOT_TYPE, TEXT_TYPE};
use crate::prop::PropValue;

/// Owns every node reachable from, or recently detached from, `root`.
pub struct Tree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Tree {
    /// Create a tree containing only its `ROOT` node.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(ROOT_TYPE));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Iterate over every node currently in the arena (attached or not).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    fn insert_detached(&mut self, node: Node) -> NodeId {
        self.nodes.insert(node)
    }

    /// Drop a node from the arena outright. Callers must have already
    /// detached it (cleared its `parent` and removed it from the
    /// parent's `children`) — use [`remove`] for the normal path.
    fn drop_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(id)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a fresh detached node with the given tag, empty props, empty
/// children, no parent, no key.
pub fn create_element(tree: &mut Tree, node_type: impl Into<String>) -> NodeId {
    let node_type = node_type.into();
    debug_assert!(!node_type.is_empty(), "create_element: empty type name");
    tree.insert_detached(Node::new(node_type))
}

/// Returns a fresh `TEXT` node with `props["value"] = value`.
pub fn create_text(tree: &mut Tree, value: impl Into<String>) -> NodeId {
    let mut node = Node::new(TEXT_TYPE);
    node.props.insert("value".to_string(), PropValue::Str(value.into()));
    tree.insert_detached(node)
}

/// `name == "children"` is a no-op. `name == "key"` assigns `node.key`.
/// Otherwise assigns `node.props[name] = value`.
pub fn set_property(tree: &mut Tree, node: NodeId, name: &str, value: PropValue) {
    if name == CHILDREN_PROP {
        return;
    }
    if name == KEY_PROP {
        let key = match value {
            PropValue::Str(s) => Some(NodeKey::Str(s)),
            PropValue::Int(i) => Some(NodeKey::Int(i)),
            PropValue::Float(f) => Some(NodeKey::Int(f as i64)),
            PropValue::Null => None,
            other => Some(NodeKey::Str(other.format().unwrap_or_default())),
        };
        if let Some(n) = tree.get_mut(node) {
            n.key = key;
        }
        return;
    }
    if let Some(n) = tree.get_mut(node) {
        n.props.insert(name.to_string(), value);
    }
}

/// Set `node.props["value"] = value`. Precondition: `node.type == TEXT`.
pub fn replace_text(tree: &mut Tree, node: NodeId, value: impl Into<String>) {
    let value = value.into();
    if let Some(n) = tree.get_mut(node) {
        debug_assert!(n.is_text(), "replace_text: node {node:?} is not TEXT");
        n.props.insert("value".to_string(), PropValue::Str(value));
    }
}

/// Set `child.parent = parent`. If `anchor` is given and is a current
/// child of `parent` (checked by identity), insert `child` immediately
/// before it; otherwise append.
pub fn insert(tree: &mut Tree, parent: NodeId, child: NodeId, anchor: Option<NodeId>) {
    if let Some(existing_parent) = tree.get(child).and_then(|n| n.parent) {
        remove(tree, existing_parent, child);
    }

    let insert_at = anchor.and_then(|anchor| {
        tree.get(parent)
            .and_then(|p| p.children.iter().position(|&c| c == anchor))
    });

    if let Some(p) = tree.get_mut(parent) {
        match insert_at {
            Some(index) => p.children.insert(index, child),
            None => p.children.push(child),
        }
    }
    if let Some(c) = tree.get_mut(child) {
        c.parent = Some(parent);
    }
}

/// Remove `child` from `parent.children` if present (identity search).
/// Sets `child.parent = None`. Does not recurse into `child`'s own
/// subtree or drop it from the arena — callers that want the subtree
/// gone entirely should use [`remove_subtree`].
pub fn remove(tree: &mut Tree, parent: NodeId, child: NodeId) {
    if let Some(p) = tree.get_mut(parent) {
        p.children.retain(|&c| c != child);
    }
    if let Some(c) = tree.get_mut(child) {
        c.parent = None;
    }
}

/// Recursively detach and drop `id` and its entire subtree, invoking
/// each node's unmount handlers on the way (deepest first has no
/// particular semantic significance here beyond guaranteeing every
/// handler fires before its ancestors are dropped).
pub fn remove_subtree(tree: &mut Tree, parent: NodeId, id: NodeId) {
    remove(tree, parent, id);
    drop_subtree(tree, id);
}

fn drop_subtree(tree: &mut Tree, id: NodeId) {
    let children = tree.get(id).map(|n| n.children.clone()).unwrap_or_default();
    for child in children {
        drop_subtree(tree, child);
    }
    if let Some(mut node) = tree.drop_node(id) {
        for handler in node.unmount_handlers.drain(..) {
            handler.call();
        }
    }
}

/// Reset the container's children to empty. Parent pointers of the
/// removed children are not nulled — those nodes are detached from the
/// arena entirely — but their unmount handlers still fire, and their
/// own subtrees are dropped along with them.
pub fn clear_container(tree: &mut Tree, container: NodeId) {
    let children = tree
        .get_mut(container)
        .map(|n| std::mem::take(&mut n.children))
        .unwrap_or_default();
    for child in children {
        drop_subtree(tree, child);
    }
}
