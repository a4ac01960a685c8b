//! Node model.
//!
//! A [`Node`] is the single entity type of the orchestration tree: the
//! `ROOT` container, a `TEXT` leaf carrying a string payload, or a
//! user-defined component tag.

use std::fmt;

use indexmap::IndexMap;
use slotmap::new_key_type;

use crate::prop::PropValue;
use crate::scope::{HookSlot, UnmountHandler};

new_key_type! {
    /// Arena identity for a [`Node`]. Stable across moves, never reused
    /// for a live node, and cheap to copy.
    pub struct NodeId;
}

/// Reserved tag marking the tree's single container node. Never itself
/// serialized with an enclosing tag.
pub const ROOT_TYPE: &str = "ROOT";

/// Reserved tag marking a leaf that carries a string payload in
/// `props["value"]` and has no children.
pub const TEXT_TYPE: &str = "TEXT";

/// The key prop name under `children`; never appears in [`Node::props`].
pub const CHILDREN_PROP: &str = "children";

/// The key prop name for [`Node::key`]; never appears in [`Node::props`].
pub const KEY_PROP: &str = "key";

/// Identity token for keyed reconciliation. A change in `key` between
/// renders is a remount signal, not a prop update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Str(String),
    Int(i64),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Str(s) => f.write_str(s),
            NodeKey::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        NodeKey::Str(value.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        NodeKey::Str(value)
    }
}

impl From<i64> for NodeKey {
    fn from(value: i64) -> Self {
        NodeKey::Int(value)
    }
}

impl From<i32> for NodeKey {
    fn from(value: i32) -> Self {
        NodeKey::Int(value as i64)
    }
}

impl From<usize> for NodeKey {
    fn from(value: usize) -> Self {
        NodeKey::Int(value as i64)
    }
}

/// Status of the opaque runtime state an external agent component
/// attaches to a node. The core never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Complete,
    Error,
}

/// Opaque slot for runtime state attached by external collaborators,
/// e.g. an agent component's own status/result tracking. The core
/// neither reads nor writes its contents beyond preserving it across
/// commits, and the serializer never emits it.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    pub status: ExecutionStatus,
    pub result: Option<PropValue>,
    pub error: Option<String>,
    pub content_hash: Option<String>,
}

impl ExecutionState {
    pub fn new(status: ExecutionStatus) -> Self {
        Self {
            status,
            result: None,
            error: None,
            content_hash: None,
        }
    }
}

/// A node in the orchestration tree. Fields are public because both
/// components and the serializer inspect them directly rather than
/// going through an accessor layer.
pub struct Node {
    /// Case-sensitive tag. `ROOT_TYPE` and `TEXT_TYPE` are reserved.
    pub node_type: String,
    /// Unordered mapping; callbacks, children, and `key` never appear
    /// here. Stored as an `IndexMap` purely for deterministic iteration
    /// order, not for any ordering semantics the spec assigns meaning to.
    pub props: IndexMap<String, PropValue>,
    /// Ordered; order equals source-render order modified by keyed
    /// reconciliation.
    pub children: Vec<NodeId>,
    /// Absent for the root and for detached nodes.
    pub parent: Option<NodeId>,
    /// Identity token surfaced separately from `props`.
    pub key: Option<NodeKey>,
    /// Populated at serialization time; absent when empty.
    pub warnings: Option<Vec<String>>,
    /// Opaque runtime state; never read or written by the core itself.
    pub execution: Option<ExecutionState>,

    /// Per-node lifecycle-hook call-site storage.
    /// Not part of the public contract: neither serialized nor copied
    /// across a remount (a remount gets a fresh `NodeId`, i.e. fresh,
    /// empty hook storage).
    pub(crate) hooks: Vec<HookSlot>,
    pub(crate) unmount_handlers: Vec<UnmountHandler>,
}

/// Hand-written: `hooks`/`unmount_handlers` hold `dyn Any`/`dyn FnMut`
/// trait objects with no meaningful `Debug` impl, so they're omitted
/// rather than deriving and failing to compile.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("node_type", &self.node_type)
            .field("props", &self.props)
            .field("children", &self.children)
            .field("parent", &self.parent)
            .field("key", &self.key)
            .field("warnings", &self.warnings)
            .field("execution", &self.execution)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub(crate) fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            props: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            key: None,
            warnings: None,
            execution: None,
            hooks: Vec::new(),
            unmount_handlers: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.node_type == ROOT_TYPE
    }

    pub fn is_text(&self) -> bool {
        self.node_type == TEXT_TYPE
    }
}
