//! Root container and mount lifecycle.
//!
//! Follows the familiar "allocate a container, evaluate a component,
//! flush a commit" shape of a composition root, generalized here to an
//! async `mount` that awaits an external completion signal rather than
//! running a single synchronous pass.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use tokio::sync::Notify;
use tracing::{info, warn};

use crate::engine::{self, Element};
use crate::error::MountError;
use crate::host_config::HostConfig;
use crate::node::{Node, NodeId};
use crate::scope;
use crate::serializer;
use crate::signal::{self, CompletionResolver};
use crate::tree::Tree;

pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// What a user-supplied component function is allowed to return:
/// either the declared element tree directly, or a future that
/// resolves to one. `mount` awaits it either way — "the result may
/// itself be a deferred value; if so, await it before proceeding."
pub trait ComponentOutput {
    fn into_element(self) -> LocalBoxFuture<'static, Element>;
}

impl ComponentOutput for Element {
    fn into_element(self) -> LocalBoxFuture<'static, Element> {
        Box::pin(async move { self })
    }
}

impl<F> ComponentOutput for F
where
    F: Future<Output = Element> + 'static,
{
    fn into_element(self) -> LocalBoxFuture<'static, Element> {
        Box::pin(self)
    }
}

thread_local! {
    /// The process-wide "most recently created root": set on
    /// `create_root`, overwritten by the next `create_root`, never
    /// cleared by `dispose`. A `thread_local!` rather than a `static`
    /// because `Root` is `Rc`-based (not `Send`) like the rest of the
    /// crate's single-threaded design.
    static CURRENT: RefCell<Option<Root>> = const { RefCell::new(None) };

    /// The active root's rerender bell, bound for the duration of a
    /// `mount` call so `request_rerender` can reach it without a handle
    /// threaded through every component closure.
    static ACTIVE_NOTIFY: RefCell<Option<Rc<Notify>>> = const { RefCell::new(None) };
}

/// Ask the active root to run another render pass once the current one
/// finishes. A no-op if called with no `mount` in progress.
pub fn request_rerender() {
    ACTIVE_NOTIFY.with(|cell| {
        if let Some(notify) = cell.borrow().as_ref() {
            notify.notify_one();
        } else {
            warn!("request_rerender called with no active mount");
        }
    });
}

/// Resolve the active root's completion signal. A no-op if no `mount`
/// is in progress, or if it has already been resolved.
pub fn resolve_completion(result: signal::CompletionResult) {
    CURRENT.with(|cell| {
        if let Some(root) = cell.borrow().as_ref() {
            if let Some(resolver) = root.resolver.borrow().as_ref() {
                resolver.resolve(result);
                return;
            }
        }
        warn!("resolve_completion called with no active mount");
    });
}

/// Snapshot the process-wide current root as XML, or `""` if no root
/// has ever been created.
pub fn current_tree_xml() -> String {
    CURRENT.with(|cell| match cell.borrow().as_ref() {
        Some(root) => root.to_xml(),
        None => String::new(),
    })
}

type BoxedComponent = Rc<dyn Fn() -> LocalBoxFuture<'static, Element>>;

/// A mounted container: the single entry point for rendering an
/// orchestration tree and observing it as XML. Cheap to clone (every
/// field is `Rc`/`RefCell`-backed); the copy stored behind [`CURRENT`]
/// and the one returned to the caller of
/// [`create_root`] share the same underlying tree and state.
#[derive(Clone)]
pub struct Root {
    tree: Rc<RefCell<Tree>>,
    host: HostConfig,
    root_node: NodeId,
    component: Rc<RefCell<Option<BoxedComponent>>>,
    resolver: Rc<RefCell<Option<CompletionResolver>>>,
    notify: Rc<Notify>,
}

/// Allocate the `ROOT` node and register this as the process-wide
/// current root.
pub fn create_root() -> Root {
    let tree = Rc::new(RefCell::new(Tree::new()));
    let root_node = tree.borrow().root();
    let host = HostConfig::new(tree.clone());
    let root = Root {
        tree,
        host,
        root_node,
        component: Rc::new(RefCell::new(None)),
        resolver: Rc::new(RefCell::new(None)),
        notify: Rc::new(Notify::new()),
    };
    CURRENT.with(|cell| *cell.borrow_mut() = Some(root.clone()));
    root
}

impl Root {
    /// Mount `component`, drive the first synchronous commit, then
    /// await the completion signal — awaiting further render passes
    /// requested by [`request_rerender`] along the way, so a component's
    /// own state update (calling `request_rerender` from, say, an
    /// `on_mount` callback) produces the next commit without the caller
    /// re-invoking `mount`.
    pub async fn mount<C, Out>(&self, component: C) -> Result<(), MountError>
    where
        C: Fn() -> Out + 'static,
        Out: ComponentOutput,
    {
        let boxed: BoxedComponent = Rc::new(move || component().into_element());
        *self.component.borrow_mut() = Some(boxed);

        let (resolver, mut signal) = signal::completion_channel();
        *self.resolver.borrow_mut() = Some(resolver);

        ACTIVE_NOTIFY.with(|cell| *cell.borrow_mut() = Some(self.notify.clone()));

        self.render_once().await;
        info!(root = ?self.root_node, "initial commit complete");

        let result = loop {
            tokio::select! {
                biased;
                recv = &mut signal => {
                    break recv;
                }
                _ = self.notify.notified() => {
                    self.render_once().await;
                }
            }
        };

        ACTIVE_NOTIFY.with(|cell| *cell.borrow_mut() = None);
        *self.resolver.borrow_mut() = None;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(MountError::CompletionFailed(message)),
            Err(_) => Err(MountError::CompletionDropped),
        }
    }

    async fn render_once(&self) {
        let component = self
            .component
            .borrow()
            .clone()
            .expect("render_once called before mount stored a component");
        scope::set_current_tree(self.tree.clone());
        let element = component().await;
        engine::reconcile_children(&self.host, self.root_node, vec![element]);
        scope::clear_current_tree();
    }

    /// The `ROOT` node, for inspecting the tree directly in tests.
    pub fn tree(&self) -> NodeRef<'_> {
        NodeRef { root: self }
    }

    pub fn to_xml(&self) -> String {
        let mut tree = self.tree.borrow_mut();
        serializer::serialize_tree(&mut tree, self.root_node)
    }

    /// Tear the container down. The completion signal is left exactly as
    /// it was — its resolver (and the `oneshot::Sender` behind it) is
    /// *not* dropped here, deliberately: dropping it would make the
    /// receiver resolve with an error, which is a settled outcome, not
    /// the "permanently unresolved" one the spec calls for. An
    /// outstanding `mount` simply never hears from anyone again and
    /// stays pending forever.
    pub fn dispose(&self) {
        let mut tree = self.tree.borrow_mut();
        crate::tree::clear_container(&mut tree, self.root_node);
    }
}

/// A short-lived borrow of the root node, so callers can inspect the
/// tree without holding the `RefCell` borrow open past the expression
/// that needs it.
pub struct NodeRef<'a> {
    root: &'a Root,
}

impl NodeRef<'_> {
    pub fn with<R>(&self, f: impl FnOnce(&Tree, &Node) -> R) -> R {
        let tree = self.root.tree.borrow();
        let node = tree
            .get(self.root.root_node)
            .expect("root node missing from its own tree");
        f(&tree, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::el;

    #[tokio::test]
    async fn mounts_a_single_static_element_and_awaits_completion() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let root = create_root();
                let mounting = root.clone();
                let handle = tokio::task::spawn_local(async move {
                    mounting
                        .mount(|| -> Element { el("phase").prop("name", "build").into() })
                        .await
                });

                // Let `mount` reach its first commit and start waiting on
                // the completion signal before we resolve it.
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;

                assert!(root.to_xml().contains("phase"));
                resolve_completion(Ok(()));

                handle.await.unwrap().unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn dispose_leaves_the_mount_future_unresolved() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let root = create_root();
                let mounting = root.clone();
                let handle = tokio::task::spawn_local(async move {
                    mounting
                        .mount(|| -> Element { el("phase").into() })
                        .await
                });

                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                root.dispose();

                // Poll repeatedly rather than racing a single yield
                // against the handle: with the sender kept alive across
                // `dispose`, the mount future must never settle, not just
                // fail to settle on this particular tick.
                for _ in 0..50 {
                    tokio::task::yield_now().await;
                    assert!(!handle.is_finished(), "mount must stay pending after dispose");
                }
                handle.abort();
            })
            .await;
    }
}
