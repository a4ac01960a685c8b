//! Host config: the adapter surface an upstream mutation-mode
//! reconciler calls into.
//!
//! Modeled as a single concrete struct with one inherent method per
//! named operation rather than a trait: every operation has exactly one
//! obvious implementation, so a vtable-shaped struct is the idiomatic
//! choice here, the same surface a react-reconciler/dioxus-core-style
//! host config exposes.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::node::{NodeId, CHILDREN_PROP};
use crate::prop::PropValue;
use crate::tree::{self, Tree};

/// A prepared update: changed prop keys mapped to their new value, or
/// to [`PatchValue::Delete`] for keys present before and absent now.
pub type Patch = IndexMap<String, PatchValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Set(PropValue),
    Delete,
}

/// Fixed default scheduling priority. The host declares a single
/// priority tier — there is no concurrent-mode priority scheme beyond
/// this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub u8);

pub const DEFAULT_PRIORITY: Priority = Priority(0);

/// The adapter the upstream reconciler calls into. Cheap to clone (an
/// `Rc` handle), so embedders can hand it to multiple call sites of a
/// real upstream library without threading a `&mut` through them.
#[derive(Clone)]
pub struct HostConfig {
    tree: Rc<RefCell<Tree>>,
}

impl HostConfig {
    pub fn new(tree: Rc<RefCell<Tree>>) -> Self {
        Self { tree }
    }

    pub fn tree_handle(&self) -> Rc<RefCell<Tree>> {
        self.tree.clone()
    }

    // -- capabilities --------------------------------------------------

    pub fn supports_mutation(&self) -> bool {
        true
    }

    pub fn supports_persistence(&self) -> bool {
        false
    }

    pub fn supports_hydration(&self) -> bool {
        false
    }

    pub fn is_primary_renderer(&self) -> bool {
        true
    }

    // -- context --------------------------------------------------------

    /// The core carries no host context; root and child host context are
    /// both the empty value.
    pub fn get_root_host_context(&self) {}

    pub fn get_child_host_context(&self) {}

    // -- instance creation ------------------------------------------------

    /// `create_element(type)`, then `set_property` for every prop other
    /// than the literal name `"children"`.
    pub fn create_instance(&self, node_type: &str, props: IndexMap<String, PropValue>) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let id = tree::create_element(&mut tree, node_type);
        for (key, value) in props {
            if key == CHILDREN_PROP {
                continue;
            }
            tree::set_property(&mut tree, id, &key, value);
        }
        trace!(node_type, ?id, "create_instance");
        id
    }

    pub fn create_text_instance(&self, text: &str) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let id = tree::create_text(&mut tree, text);
        trace!(?id, "create_text_instance");
        id
    }

    // -- child attachment -------------------------------------------------

    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        tree::insert(&mut self.tree.borrow_mut(), parent, child, None);
    }

    pub fn append_initial_child(&self, parent: NodeId, child: NodeId) {
        self.append_child(parent, child);
    }

    pub fn append_child_to_container(&self, container: NodeId, child: NodeId) {
        self.append_child(container, child);
    }

    pub fn insert_before(&self, parent: NodeId, child: NodeId, anchor: NodeId) {
        tree::insert(&mut self.tree.borrow_mut(), parent, child, Some(anchor));
    }

    pub fn insert_in_container_before(&self, container: NodeId, child: NodeId, anchor: NodeId) {
        self.insert_before(container, child, anchor);
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) {
        let mut tree = self.tree.borrow_mut();
        tree::remove_subtree(&mut tree, parent, child);
        trace!(?parent, ?child, "remove_child");
    }

    pub fn remove_child_from_container(&self, container: NodeId, child: NodeId) {
        self.remove_child(container, child);
    }

    // -- updates ----------------------------------------------------------

    /// `None` if `old_props` and `new_props` are identically equal
    /// key-by-key (ignoring `"children"`); otherwise the map of changed
    /// keys to their new values, with removed keys bound to
    /// [`PatchValue::Delete`].
    pub fn prepare_update(
        &self,
        old_props: &IndexMap<String, PropValue>,
        new_props: &IndexMap<String, PropValue>,
    ) -> Option<Patch> {
        let mut patch = Patch::new();

        for (key, new_value) in new_props {
            if key == CHILDREN_PROP {
                continue;
            }
            match old_props.get(key) {
                Some(old_value) if old_value == new_value => {}
                _ => {
                    patch.insert(key.clone(), PatchValue::Set(new_value.clone()));
                }
            }
        }
        for key in old_props.keys() {
            if key == CHILDREN_PROP {
                continue;
            }
            if !new_props.contains_key(key) {
                patch.insert(key.clone(), PatchValue::Delete);
            }
        }

        if patch.is_empty() {
            None
        } else {
            Some(patch)
        }
    }

    pub fn commit_update(&self, node: NodeId, patch: Patch) {
        let mut tree = self.tree.borrow_mut();
        for (key, value) in patch {
            match value {
                PatchValue::Delete => {
                    if let Some(n) = tree.get_mut(node) {
                        n.props.shift_remove(&key);
                    }
                }
                PatchValue::Set(value) => tree::set_property(&mut tree, node, &key, value),
            }
        }
        trace!(?node, "commit_update");
    }

    pub fn commit_text_update(&self, node: NodeId, text: &str) {
        tree::replace_text(&mut self.tree.borrow_mut(), node, text);
    }

    // -- container lifecycle ----------------------------------------------

    pub fn clear_container(&self, container: NodeId) {
        tree::clear_container(&mut self.tree.borrow_mut(), container);
        trace!(?container, "clear_container");
    }

    // -- commit hooks -------------------------------------------------------

    /// Nothing to do after initial mount.
    pub fn finalize_initial_children(&self, _node: NodeId) -> bool {
        false
    }

    pub fn prepare_for_commit(&self) {}

    pub fn reset_after_commit(&self) {}

    pub fn get_public_instance(&self, node: NodeId) -> NodeId {
        node
    }

    // -- priority and timing -------------------------------------------------

    pub fn get_current_update_priority(&self) -> Priority {
        DEFAULT_PRIORITY
    }

    /// Suspense, offscreen hide/unhide, transitions, and form resets are
    /// no-ops — present so an embedding library that expects the full
    /// mutation-mode surface has something to call.
    pub fn hide_instance(&self, _node: NodeId) {}
    pub fn unhide_instance(&self, _node: NodeId) {}
    pub fn clear_suspense_boundary(&self, _node: NodeId) {}
    pub fn reset_form_instance(&self, _node: NodeId) {}
}
