//! A minimal, synchronous reference reconciler.
//!
//! A real embedding swaps this out for a full upstream reconciliation
//! library (fiber diffing, hook storage, scheduling); this module is
//! just capable enough to drive [`host_config`](crate::host_config)
//! from declared element trees and to exercise the keyed-remount
//! pattern end to end. It matches old children against newly declared
//! ones with a key map plus a positional queue for unkeyed leftovers,
//! run per composition frame rather than as one batch-collect-then-diff
//! pass, since composition here is immediate-mode rather than against a
//! retained virtual-DOM snapshot.
//!
//! A render pass is one call to [`render`]. There is no internal
//! scheduler coordinating repeated passes — a caller that wants a state
//! change to produce a new commit calls `render` again.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::host_config::HostConfig;
use crate::node::{NodeId, NodeKey};
use crate::prop::PropValue;
use crate::scope;

/// A declared element: what a component wants the tree to look like
/// this render, before reconciliation decides which of it is new and
/// which is a reused node carrying forward its hook state.
pub enum Element {
    Text(String),
    Node(ElementNode),
}

pub struct ElementNode {
    pub node_type: String,
    pub key: Option<NodeKey>,
    pub body: Body,
}

/// What produces an element's props and children. `Static` values are
/// already-computed data with no hook scope of their own (they were
/// built inside whatever frame declared them). `Component` defers to a
/// closure invoked inside *this* element's own frame, once reconciliation
/// has decided whether this call site is new or reused this render —
/// so hooks called inside `render` see the correct mount/remount state.
pub enum Body {
    Static {
        props: IndexMap<String, PropValue>,
        children: Vec<Element>,
    },
    Component(Rc<dyn Fn() -> (IndexMap<String, PropValue>, Vec<Element>)>),
}

/// Start building a plain (non-component) element with tag `node_type`.
pub fn el(node_type: impl Into<String>) -> ElementNode {
    ElementNode {
        node_type: node_type.into(),
        key: None,
        body: Body::Static {
            props: IndexMap::new(),
            children: Vec::new(),
        },
    }
}

/// Declare a function component: `render` recomputes this element's
/// props and children every time it is reached, inside its own hook
/// scope.
pub fn component(
    node_type: impl Into<String>,
    render: impl Fn() -> (IndexMap<String, PropValue>, Vec<Element>) + 'static,
) -> ElementNode {
    ElementNode {
        node_type: node_type.into(),
        key: None,
        body: Body::Component(Rc::new(render)),
    }
}

pub fn text(value: impl Into<String>) -> Element {
    Element::Text(value.into())
}

impl ElementNode {
    pub fn key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add a prop. No-op on a [`Body::Component`] element — its props
    /// come from `render`, not from the declaring call site.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        if let Body::Static { props, .. } = &mut self.body {
            props.insert(name.into(), value.into());
        }
        self
    }

    /// Append a child. No-op on a [`Body::Component`] element, for the
    /// same reason as [`Self::prop`].
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        if let Body::Static { children, .. } = &mut self.body {
            children.push(child.into());
        }
        self
    }
}

impl From<ElementNode> for Element {
    fn from(node: ElementNode) -> Self {
        Element::Node(node)
    }
}

impl Element {
    /// Extract `(props, children)` from a declared static element. Used
    /// by the `#[component]` macro (`agentree-macros`) to adapt a
    /// function that returns a plain `Element` into the `(props,
    /// children)` shape [`component`] expects from its render closure.
    ///
    /// Panics if called on `Element::Text` or on an `Element::Node`
    /// whose body is itself `Body::Component` — a `#[component]`
    /// function must return a literal element (`el(...).into()`), not
    /// forward another component's output directly.
    pub fn into_parts(self) -> (IndexMap<String, PropValue>, Vec<Element>) {
        match self {
            Element::Node(ElementNode {
                body: Body::Static { props, children },
                ..
            }) => (props, children),
            Element::Node(ElementNode {
                body: Body::Component(_),
                ..
            }) => panic!(
                "#[component] function must return a plain element (el(...).into()), \
                 not another component's output"
            ),
            Element::Text(_) => panic!("#[component] function must return an element, not bare text"),
        }
    }
}

/// Run one synchronous render pass: `component()` describes the
/// container's sole declared child, reconciled against whatever the
/// container currently holds.
pub fn render(host: &HostConfig, container: NodeId, component: &dyn Fn() -> Element) {
    reconcile_children(host, container, vec![component()]);
}

/// Reconcile `declared` against `parent`'s current children, in
/// declaration order. Matches by key where given, else by position
/// among the remaining unkeyed old children (`composition/reconciler.rs`'s
/// "key map plus positional queue" shape). Unmatched old children are
/// removed (and their unmount handlers fire via `tree::remove_subtree`).
pub fn reconcile_children(host: &HostConfig, parent: NodeId, declared: Vec<Element>) {
    let (mut keyed, mut positional) = split_old_children(host, parent);

    let mut new_order = Vec::with_capacity(declared.len());
    for element in declared {
        new_order.push(reconcile_one(host, element, &mut keyed, &mut positional));
    }

    for leftover in keyed.into_values().chain(positional) {
        host.remove_child(parent, leftover);
    }

    // Re-append every surviving child in declared order; `insert` moves
    // a child to the end of `parent.children` rather than duplicating
    // it, so this settles the final order in one pass per child.
    for id in new_order {
        host.append_child(parent, id);
    }
}

fn split_old_children(
    host: &HostConfig,
    parent: NodeId,
) -> (HashMap<NodeKey, NodeId>, VecDeque<NodeId>) {
    let tree = host.tree_handle();
    let tree = tree.borrow();
    let mut keyed = HashMap::new();
    let mut positional = VecDeque::new();
    if let Some(node) = tree.get(parent) {
        for &child in &node.children {
            match tree.get(child).and_then(|c| c.key.clone()) {
                Some(key) => {
                    keyed.insert(key, child);
                }
                None => positional.push_back(child),
            }
        }
    }
    (keyed, positional)
}

fn reconcile_one(
    host: &HostConfig,
    element: Element,
    keyed: &mut HashMap<NodeKey, NodeId>,
    positional: &mut VecDeque<NodeId>,
) -> NodeId {
    match element {
        Element::Text(value) => {
            let matched = positional.pop_front();
            let is_new = matched.is_none();
            let node_id = matched.unwrap_or_else(|| host.create_text_instance(&value));
            if !is_new {
                host.commit_text_update(node_id, &value);
            }
            node_id
        }
        Element::Node(ElementNode { node_type, key, body }) => {
            let matched = match &key {
                Some(k) => keyed.remove(k),
                None => positional.pop_front(),
            };
            let is_new = matched.is_none();
            let node_id = matched.unwrap_or_else(|| host.create_instance(&node_type, IndexMap::new()));

            // A freshly created node's `key` has to be stamped on here:
            // it's read straight off `ElementNode`, never routed through
            // `props`, so nothing else assigns `node.key`. A reused node
            // (matched out of `keyed`) already carries the same key from
            // its own creation and never needs restamping.
            if is_new {
                if let Some(k) = &key {
                    let tree = host.tree_handle();
                    if let Some(node) = tree.borrow_mut().get_mut(node_id) {
                        node.key = Some(k.clone());
                    }
                }
            }

            scope::enter_frame(node_id, is_new);
            let (props, children) = match body {
                Body::Static { props, children } => (props, children),
                Body::Component(render) => render(),
            };
            apply_props(host, node_id, props, is_new);
            reconcile_children(host, node_id, children);
            scope::exit_frame();
            node_id
        }
    }
}

fn apply_props(host: &HostConfig, node_id: NodeId, props: IndexMap<String, PropValue>, is_new: bool) {
    if is_new {
        if props.is_empty() {
            return;
        }
        if let Some(patch) = host.prepare_update(&IndexMap::new(), &props) {
            host.commit_update(node_id, patch);
        }
        return;
    }
    let old_props = {
        let tree = host.tree_handle();
        let tree = tree.borrow();
        tree.get(node_id).map(|n| n.props.clone()).unwrap_or_default()
    };
    if let Some(patch) = host.prepare_update(&old_props, &props) {
        host.commit_update(node_id, patch);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::tree::Tree;

    fn host() -> (HostConfig, NodeId) {
        let tree = Rc::new(RefCell::new(Tree::new()));
        let root = tree.borrow().root();
        (HostConfig::new(tree), root)
    }

    #[test]
    fn renders_a_single_static_element() {
        let (host, root) = host();
        render(&host, root, &|| el("phase").prop("name", "build").into());

        let tree = host.tree_handle();
        let tree = tree.borrow();
        let child = tree.get(root).unwrap().children[0];
        let node = tree.get(child).unwrap();
        assert_eq!(node.node_type, "phase");
        assert_eq!(node.props.get("name"), Some(&PropValue::from("build")));
    }

    #[test]
    fn keyed_remount_replaces_node_identity() {
        let (host, root) = host();
        render(&host, root, &|| el("agent").key(0i64).into());
        let first_id = {
            let tree = host.tree_handle();
            let tree = tree.borrow();
            tree.get(root).unwrap().children[0]
        };

        render(&host, root, &|| el("agent").key(1i64).into());
        let second_id = {
            let tree = host.tree_handle();
            let tree = tree.borrow();
            tree.get(root).unwrap().children[0]
        };

        assert_ne!(first_id, second_id);
        let tree = host.tree_handle();
        assert!(tree.borrow().get(first_id).is_none());
    }

    #[test]
    fn keyed_element_keeps_identity_when_key_is_unchanged() {
        let (host, root) = host();
        render(&host, root, &|| el("agent").key(0i64).prop("name", "a").into());
        let first_id = {
            let tree = host.tree_handle();
            let tree = tree.borrow();
            tree.get(root).unwrap().children[0]
        };

        render(&host, root, &|| el("agent").key(0i64).prop("name", "b").into());
        let second_id = {
            let tree = host.tree_handle();
            let tree = tree.borrow();
            tree.get(root).unwrap().children[0]
        };

        assert_eq!(first_id, second_id, "unchanged key must preserve node identity");
        let tree = host.tree_handle();
        let tree = tree.borrow();
        assert_eq!(
            tree.get(first_id).unwrap().props.get("name"),
            Some(&PropValue::from("b"))
        );
    }

    #[test]
    fn created_node_carries_its_declared_key() {
        let (host, root) = host();
        render(&host, root, &|| el("agent").key(0i64).into());
        let tree = host.tree_handle();
        let tree = tree.borrow();
        let child = tree.get(root).unwrap().children[0];
        assert_eq!(tree.get(child).unwrap().key, Some(NodeKey::Int(0)));
    }

    #[test]
    fn unkeyed_static_element_is_reused_across_renders() {
        let (host, root) = host();
        render(&host, root, &|| el("phase").prop("name", "build").into());
        let first_id = host.tree_handle().borrow().get(root).unwrap().children[0];

        render(&host, root, &|| el("phase").prop("name", "test").into());
        let second_id = host.tree_handle().borrow().get(root).unwrap().children[0];

        assert_eq!(first_id, second_id);
        let tree = host.tree_handle();
        let tree = tree.borrow();
        assert_eq!(
            tree.get(first_id).unwrap().props.get("name"),
            Some(&PropValue::from("test"))
        );
    }
}
