//! Per-node hook-slot storage and the thread-local composition stack
//! that the reference reconciler (`engine`) pushes to and pops from
//! while composing each node.
//!
//! A thread-local current-context cell holding a node stack, fused with
//! a cursor-indexed slot vector — except the slot vector lives on the
//! `Node` itself (`Node::hooks`) rather than on a single context-wide
//! manager, so hook state survives prop updates but never survives a
//! remount.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::node::NodeId;
use crate::tree::Tree;

/// One call-site's worth of hook storage. `Value` backs `remember`-style
/// hooks (`first_mount`, `previous`, `effect_on_value_change`'s sentinel);
/// `Unmount` backs `on_unmount`'s "most recent closure" cell, which is
/// also registered in `Node::unmount_handlers` so `tree::remove_subtree`
/// can find and call it without re-deriving call-site order.
pub(crate) enum HookSlot {
    Value(Box<dyn Any>),
    Unmount(Rc<RefCell<Box<dyn FnMut()>>>),
}

/// A handle `tree::drop_subtree` invokes when a node is actually torn
/// down. Wraps the same cell `on_unmount` keeps updating every render,
/// so the closure invoked at unmount time is always the latest one.
#[derive(Clone)]
pub(crate) struct UnmountHandler(pub(crate) Rc<RefCell<Box<dyn FnMut()>>>);

impl UnmountHandler {
    pub(crate) fn call(self) {
        (self.0.borrow_mut())();
    }
}

struct Frame {
    node: NodeId,
    cursor: usize,
    /// Whether this frame's node was freshly created this render (vs.
    /// matched/reused from a previous render) — hooks like `on_mount`
    /// only act on creation.
    is_new: bool,
}

thread_local! {
    static STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
    static CURRENT_TREE: RefCell<Option<Rc<RefCell<Tree>>>> = const { RefCell::new(None) };
}

/// Bind the tree a render pass is composing against, so hooks (`hooks`
/// module) can reach it without a `&mut Tree` parameter threaded through
/// every component call.
pub(crate) fn set_current_tree(tree: Rc<RefCell<Tree>>) {
    CURRENT_TREE.with(|c| *c.borrow_mut() = Some(tree));
}

pub(crate) fn clear_current_tree() {
    CURRENT_TREE.with(|c| *c.borrow_mut() = None);
}

/// Run `f` against the tree currently bound by the active render pass.
/// Panics if called outside of one — a hook invoked outside component
/// composition is a programmer error in the caller.
pub(crate) fn with_tree<R>(f: impl FnOnce(&mut Tree) -> R) -> R {
    let tree = CURRENT_TREE.with(|c| {
        c.borrow()
            .clone()
            .expect("hook called with no active render pass")
    });
    let mut tree = tree.borrow_mut();
    f(&mut tree)
}

/// Push a new composition frame for `node`. Called by `engine` when it
/// begins composing a node, whether newly created or reused across a
/// re-render.
pub(crate) fn enter_frame(node: NodeId, is_new: bool) {
    STACK.with(|s| {
        s.borrow_mut().push(Frame {
            node,
            cursor: 0,
            is_new,
        })
    });
}

/// Pop the current composition frame. Panics (via `expect`) if called
/// with no frame active — a reconciler bug, not a recoverable state.
pub(crate) fn exit_frame() {
    STACK.with(|s| {
        s.borrow_mut()
            .pop()
            .expect("scope::exit_frame called with no active frame")
    });
}

/// Is a composition frame currently active? Hooks called outside of one
/// are a programmer error in the calling component.
pub(crate) fn in_frame() -> bool {
    STACK.with(|s| !s.borrow().is_empty())
}

/// Whether the node owning the current frame was freshly created this
/// render (as opposed to matched/reused from a previous render).
pub(crate) fn current_is_new() -> bool {
    STACK.with(|s| {
        s.borrow()
            .last()
            .map(|f| f.is_new)
            .expect("no active composition frame")
    })
}

pub(crate) fn current_node() -> NodeId {
    STACK.with(|s| {
        s.borrow()
            .last()
            .map(|f| f.node)
            .expect("no active composition frame")
    })
}

/// Claim the next hook slot index at the current call site, creating it
/// via `init` if this is the first time this slot has been reached for
/// this node.
fn next_slot(tree: &mut Tree, init: impl FnOnce() -> HookSlot) -> (NodeId, usize) {
    let node_id = current_node();
    let index = STACK.with(|s| {
        let mut stack = s.borrow_mut();
        let frame = stack.last_mut().expect("no active composition frame");
        let index = frame.cursor;
        frame.cursor += 1;
        index
    });
    if let Some(node) = tree.get_mut(node_id) {
        if index >= node.hooks.len() {
            node.hooks.push(init());
        }
    }
    (node_id, index)
}

/// Read-or-initialize a `Value` hook slot as `T`, mutating it in place
/// via `update`. Returns whatever `update` returns.
pub(crate) fn with_value_slot<T, R>(
    tree: &mut Tree,
    init: impl FnOnce() -> T,
    update: impl FnOnce(&mut T) -> R,
) -> R
where
    T: 'static,
{
    let (node_id, index) = next_slot(tree, || HookSlot::Value(Box::new(init())));
    let node = tree
        .get_mut(node_id)
        .expect("hook slot's owning node vanished mid-render");
    match &mut node.hooks[index] {
        HookSlot::Value(v) => {
            let typed = v
                .downcast_mut::<T>()
                .expect("hook call order changed between renders (slot type mismatch)");
            update(typed)
        }
        HookSlot::Unmount(_) => panic!("hook call order changed between renders (slot kind mismatch)"),
    }
}

/// Register (or update) the `on_unmount` cell at the current call site.
/// Returns the cell so `hooks::on_unmount` can overwrite its contents
/// every render.
pub(crate) fn unmount_cell(tree: &mut Tree) -> Rc<RefCell<Box<dyn FnMut()>>> {
    let (node_id, index) = next_slot(tree, || {
        let cell: Rc<RefCell<Box<dyn FnMut()>>> = Rc::new(RefCell::new(Box::new(|| {})));
        HookSlot::Unmount(cell)
    });
    let node = tree
        .get_mut(node_id)
        .expect("hook slot's owning node vanished mid-render");
    let cell = match &node.hooks[index] {
        HookSlot::Unmount(cell) => cell.clone(),
        HookSlot::Value(_) => panic!("hook call order changed between renders (slot kind mismatch)"),
    };
    if current_is_new() {
        node.unmount_handlers.push(UnmountHandler(cell.clone()));
    }
    cell
}
