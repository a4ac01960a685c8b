//! Error taxonomy.
//!
//! Programmer contract violations are asserted in `tree`/`host_config`
//! and never constructed in a well-behaved reconciliation pass; these
//! types exist so a caller exercising tree operations directly (without
//! going through a reconciler) can assert on them, and so the one
//! recoverable failure mode — a completion signal resolving with an
//! error — has somewhere to land.

use crate::node::NodeId;

/// Violations of `tree`'s preconditions. Debug builds `debug_assert!`
/// before these would ever need constructing; release builds degrade to
/// a no-op rather than panicking — these operations are infallible for
/// well-formed inputs.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("{child:?} is not a child of {parent:?}")]
    ChildNotFound { parent: NodeId, child: NodeId },
    #[error("replace_text called on non-TEXT node {0:?}")]
    NotText(NodeId),
    #[error("create_instance requires a non-empty type name")]
    EmptyType,
}

/// Failure surfaced from `Root::mount`: the completion signal resolved
/// with an error rather than success.
#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("completion signal resolved with an error: {0}")]
    CompletionFailed(String),
    #[error("completion signal was dropped before resolving")]
    CompletionDropped,
}
