//! # agentree
//!
//! A host renderer for a declarative agent-orchestration framework. A
//! user writes components with ordinary function calls and lifecycle
//! hooks (`[on_mount]`, `[effect_on_value_change]`, ...); this crate
//! intercepts a mutation-mode reconciler's host-config calls and
//! materializes a persistent [`Node`] tree — both the live state that
//! mount/unmount lifecycles drive side effects from, and, via
//! [`serialize`]/[`Root::to_xml`], a stable XML-shaped document for
//! human review.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use agentree::prelude::*;
//!
//! # async fn run() {
//! let root = create_root();
//! root.mount(|| -> Element {
//!     el("phase").prop("name", "build").into()
//! })
//! .await
//! .unwrap();
//!
//! println!("{}", root.to_xml());
//! # }
//! ```
//!
//! The six core components mirror the spec this crate implements: the
//! [`node`] model, [`tree`] operations, the [`host_config`] adapter
//! surface, [`root`]'s mount lifecycle, [`hooks`] built on [`scope`],
//! and the [`serializer`].

pub mod engine;
pub mod error;
pub mod host_config;
pub mod hooks;
pub mod node;
pub mod prop;
pub mod root;
pub mod scope;
pub mod serializer;
pub mod signal;
pub mod tree;

/// Re-export the `#[component]` attribute macro.
pub use agentree_macros::component;

pub use error::{MountError, TreeError};
pub use hooks::{
    effect_once, effect_on_value_change, first_mount, mounted_predicate, on_mount, on_unmount,
    Mounted,
};
pub use node::{ExecutionState, ExecutionStatus, Node, NodeId, NodeKey};
pub use prop::PropValue;
pub use root::{create_root, current_tree_xml, request_rerender, resolve_completion, Root};
pub use signal::{completion_channel, CompletionResolver, CompletionResult, CompletionSignal};

/// Serialize a single node (not necessarily `ROOT`) to the XML-shaped
/// document this crate produces for human review, without running the
/// warning pre-pass. Use [`Root::to_xml`] when warnings must be up to
/// date.
pub fn serialize(tree: &tree::Tree, node: &Node) -> String {
    serializer::serialize(tree, node)
}

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::component;

    pub use crate::engine::{component as declare_component, el, text, Body, Element, ElementNode};

    pub use crate::hooks::{
        effect_once, effect_on_value_change, first_mount, mounted_predicate, on_mount, on_unmount,
        Mounted,
    };

    pub use crate::node::{ExecutionState, ExecutionStatus, Node, NodeId, NodeKey};

    pub use crate::prop::PropValue;

    pub use crate::root::{create_root, current_tree_xml, request_rerender, resolve_completion, Root};

    pub use crate::serialize;

    pub use crate::error::{MountError, TreeError};
}
