//! XML-shaped serializer.
//!
//! Two-pass: a warning pre-pass over the whole tree, then recursive
//! emission with key-first attribute ordering, entity escaping, and a
//! reserved known-tag set. `serde_json` backs compound-value formatting
//! (`PropValue::format`).

use crate::node::{Node, NodeId, ROOT_TYPE};
use crate::prop::PropValue;
use crate::tree::Tree;

/// Callback/validator prop names the filter excludes regardless of
/// value.
const RESERVED_CALLBACK_NAMES: &[&str] = &[
    "onFinished",
    "onError",
    "onStreamStart",
    "onStreamDelta",
    "onStreamEnd",
    "validate",
];

/// The reserved known-tag set treated as authoritative for the
/// unknown-parent warning. Adding a tag requires updating this list.
const KNOWN_TAGS: &[&str] = &[
    "claude",
    "ralph",
    "phase",
    "step",
    "task",
    "persona",
    "constraints",
    "human",
    "smithers-stop",
    "subagent",
    "orchestration",
    "review",
    "text",
    "root",
    "messages",
    "message",
    "tool-call",
];

fn is_known_tag(lowered: &str) -> bool {
    KNOWN_TAGS.contains(&lowered)
}

/// Serialize `node` (typically the tree's `ROOT`) to the XML-shaped
/// document this crate produces for human review. Does not run the
/// warning pre-pass first — callers that already ran it (or don't care
/// about warnings) and just want the text can use this directly; see
/// [`serialize_tree`] for the full two-pass sequence used by
/// `Root::to_xml`.
pub fn serialize(tree: &Tree, node: &Node) -> String {
    render_node(tree, node)
}

/// Run the warning pre-pass over the whole tree rooted at `root_id`,
/// then render it. Use this (not [`serialize`]) when `warnings` must be
/// up to date, e.g. from `Root::to_xml`.
pub fn serialize_tree(tree: &mut Tree, root_id: NodeId) -> String {
    annotate_warnings(tree, root_id);
    let tree = &*tree;
    let node = tree.get(root_id).expect("serialize_tree: root vanished");
    render_node(tree, node)
}

/// Clear every node's `warnings`, then walk the tree attaching a
/// warning to any known-tag node whose nearest non-ROOT ancestor is not
/// itself a known tag. Idempotent: clearing at the start of each run is
/// what makes repeated serializations byte-identical.
fn annotate_warnings(tree: &mut Tree, root_id: NodeId) {
    let all_ids: Vec<NodeId> = tree.iter().map(|(id, _)| id).collect();
    for id in all_ids {
        if let Some(n) = tree.get_mut(id) {
            n.warnings = None;
        }
    }
    walk_warnings(tree, root_id, None);
}

/// `nearest_known_ancestor_tag` is the lowercased tag of the closest
/// non-ROOT ancestor that is itself a known tag, or `None` if no such
/// ancestor exists (including "we are at or above ROOT").
fn walk_warnings(tree: &mut Tree, id: NodeId, nearest_known_ancestor_tag: Option<String>) {
    let (node_type, children) = match tree.get(id) {
        Some(n) => (n.node_type.clone(), n.children.clone()),
        None => return,
    };
    let lowered = node_type.to_lowercase();
    let is_root = node_type == ROOT_TYPE;
    let this_is_known = !is_root && is_known_tag(&lowered);

    // The check is against the *immediate* parent's tag, not the
    // nearest known ancestor carried through the walk.
    if !is_root {
        if let Some(parent_id) = tree.get(id).and_then(|n| n.parent) {
            if let Some(parent) = tree.get(parent_id) {
                let parent_is_root = parent.node_type == ROOT_TYPE;
                if this_is_known && !parent_is_root {
                    let parent_lowered = parent.node_type.to_lowercase();
                    if !is_known_tag(&parent_lowered) {
                        if let Some(n) = tree.get_mut(id) {
                            n.warnings = Some(vec![format!(
                                "unknown parent tag: {parent_lowered}"
                            )]);
                        }
                    }
                }
            }
        }
    }

    let next_ancestor = if this_is_known {
        Some(lowered)
    } else {
        nearest_known_ancestor_tag
    };
    for child in children {
        walk_warnings(tree, child, next_ancestor.clone());
    }
}

/// Recursively render `node`. The empty/untyped case doesn't arise in
/// practice since every live `Node` carries a `node_type`; `Node::new`
/// never constructs one without it, but rendering still degrades
/// gracefully rather than panicking if it ever did.
fn render_node(tree: &Tree, node: &Node) -> String {
    if node.is_root() {
        return node
            .children
            .iter()
            .filter_map(|&id| tree.get(id))
            .map(|child| render_node(tree, child))
            .collect::<Vec<_>>()
            .join("\n");
    }

    if node.is_text() {
        let value = match node.props.get("value") {
            Some(PropValue::Str(s)) => s.clone(),
            Some(other) => other.format().unwrap_or_default(),
            None => String::new(),
        };
        return escape(&value);
    }

    if node.node_type.is_empty() {
        tracing::warn!("serializing a node with an empty type; emitting empty string");
        return String::new();
    }

    let tag = node.node_type.to_lowercase();
    let attrs = render_attrs(node);

    if node.children.is_empty() {
        return if attrs.is_empty() {
            format!("<{tag} />")
        } else {
            format!("<{tag} {attrs} />")
        };
    }

    let children: Vec<String> = node
        .children
        .iter()
        .filter_map(|&id| tree.get(id))
        .map(|child| indent(&render_node(tree, child)))
        .collect();

    let open = if attrs.is_empty() {
        format!("<{tag}>")
    } else {
        format!("<{tag} {attrs}>")
    };
    format!("{open}\n{}\n</{tag}>", children.join("\n"))
}

fn render_attrs(node: &Node) -> String {
    let mut parts = Vec::new();
    if let Some(key) = &node.key {
        parts.push(format!("key=\"{}\"", escape(&key.to_string())));
    }
    for (name, value) in &node.props {
        if !keeps_prop(name, value) {
            continue;
        }
        let formatted = value.format().unwrap_or_default();
        parts.push(format!("{name}=\"{}\"", escape(&formatted)));
    }
    parts.join(" ")
}

/// Attribute filter: drop `children`/`key` (handled separately by the
/// caller), functions, `null`/absent, and the reserved callback/
/// validator names.
fn keeps_prop(name: &str, value: &PropValue) -> bool {
    if name == "children" || name == "key" {
        return false;
    }
    if value.is_callback() || value.is_null() {
        return false;
    }
    if RESERVED_CALLBACK_NAMES.contains(&name) {
        return false;
    }
    true
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Entity-escape a string for use inside a double-quoted attribute or as
/// text content. `&` must be replaced first or the later replacements'
/// own output would be re-escaped.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
