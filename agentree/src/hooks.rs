//! Lifecycle hooks.
//!
//! Built on the per-node slot storage of `scope`: `effect_once`/
//! `on_mount` generalize the familiar "run an effect, optionally return
//! a cleanup" shape; `on_unmount` adds latest-closure semantics so a
//! stale callback captured at mount time is never the one that fires;
//! `effect_on_value_change` adds NaN-safe change detection.
//!
//! None of these functions take an explicit tree handle: they reach the
//! tree currently being composed through `scope::with_tree`, so a
//! component body can call them without threading a handle through
//! every call site. Calling any of them outside of an active component
//! composition is a programmer error and panics.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::scope;

enum Seen<T> {
    Never,
    Value(T),
}

/// NaN-safe equality: floats compare by bit pattern, everything else by
/// `PartialEq`. Implemented via a runtime `Any` downcast rather than
/// specialization (stable Rust has none) — only `f64`/`f32` are types
/// where `==` and identity diverge, so that's the only case that needs
/// special handling.
fn values_equal<T: PartialEq + 'static>(a: &T, b: &T) -> bool {
    let any_a: &dyn Any = a;
    let any_b: &dyn Any = b;
    if let (Some(a), Some(b)) = (any_a.downcast_ref::<f64>(), any_b.downcast_ref::<f64>()) {
        return a.to_bits() == b.to_bits();
    }
    if let (Some(a), Some(b)) = (any_a.downcast_ref::<f32>(), any_b.downcast_ref::<f32>()) {
        return a.to_bits() == b.to_bits();
    }
    a == b
}

/// Run `f` exactly once, the first time this call site is reached after
/// a (re)mount. Any cleanup `f` returns runs when the owning node is
/// unmounted.
pub fn effect_once<F>(f: F)
where
    F: FnOnce() -> Option<Box<dyn FnOnce()>> + 'static,
{
    scope::with_tree(|tree| {
        let first = scope::with_value_slot(tree, || false, |ran: &mut bool| {
            let first = !*ran;
            *ran = true;
            first
        });
        // Always claim the unmount slot so call-site index stays stable
        // across renders regardless of whether `f` runs this time.
        let cell = scope::unmount_cell(tree);
        if first {
            if let Some(cleanup) = f() {
                let cleanup = RefCell::new(Some(cleanup));
                *cell.borrow_mut() = Box::new(move || {
                    if let Some(cleanup) = cleanup.borrow_mut().take() {
                        cleanup();
                    }
                });
            }
        }
    });
}

/// `effect_once` with no cleanup forwarded.
pub fn on_mount<F>(f: F)
where
    F: FnOnce() + 'static,
{
    effect_once(move || {
        f();
        None
    });
}

/// On unmount, invoke the most recent `f` ever passed to this call
/// site — not the one captured at mount. `f` is stored in a cell
/// overwritten on every render; the cleanup registered with the tree
/// closes over the cell, not over `f` itself.
pub fn on_unmount<F>(f: F)
where
    F: FnMut() + 'static,
{
    scope::with_tree(|tree| {
        let cell = scope::unmount_cell(tree);
        *cell.borrow_mut() = Box::new(f);
    });
}

/// `true` only on the first render of the component at this call site;
/// `false` on every subsequent render. No commit involvement — this is
/// purely a render-time counter, unlike `effect_once`.
pub fn first_mount() -> bool {
    scope::with_tree(|tree| {
        scope::with_value_slot(tree, || true, |first: &mut bool| {
            let value = *first;
            *first = false;
            value
        })
    })
}

/// A closure-like guard answering "is this component currently
/// mounted?" — for guarding state updates after awaited work. Rust has
/// no ergonomic way to return an anonymous callable implementing `Fn`
/// from a library function on stable, so this is a named newtype with
/// an `is_mounted` method rather than a literal closure; callers use it
/// the same way.
#[derive(Clone)]
pub struct Mounted(Rc<Cell<bool>>);

impl Mounted {
    pub fn is_mounted(&self) -> bool {
        self.0.get()
    }
}

/// Returns a [`Mounted`] guard set to `true` on mount and flipped to
/// `false` on unmount.
pub fn mounted_predicate() -> Mounted {
    let cell = scope::with_tree(|tree| {
        scope::with_value_slot(
            tree,
            || Rc::new(Cell::new(false)),
            |cell: &mut Rc<Cell<bool>>| cell.clone(),
        )
    });
    cell.set(true);
    let flag = cell.clone();
    on_unmount(move || flag.set(false));
    Mounted(cell)
}

/// The value of `value` from the previous render, or `None` on the
/// first render. The slot updates after the read, so the current
/// render's own call sees the *previous* value, not the one just
/// passed in.
pub fn previous<T>(value: &T) -> Option<T>
where
    T: Clone + 'static,
{
    scope::with_tree(|tree| {
        scope::with_value_slot(
            tree,
            || None::<T>,
            |slot: &mut Option<T>| {
                let prev = slot.clone();
                *slot = Some(value.clone());
                prev
            },
        )
    })
}

/// Runs `f` the first time this call site is reached, and on any
/// subsequent render where `value` differs from the last observed value
/// (NaN-safe). The "last seen" value updates *before* `f` runs, so a
/// re-render `f` triggers re-entrantly will not double-fire.
pub fn effect_on_value_change<T, F>(value: T, f: F)
where
    T: PartialEq + Clone + 'static,
    F: FnOnce() + 'static,
{
    let should_run = scope::with_tree(|tree| {
        scope::with_value_slot(
            tree,
            || Seen::Never::<T>,
            |slot: &mut Seen<T>| {
                let changed = match slot {
                    Seen::Never => true,
                    Seen::Value(prev) => !values_equal(prev, &value),
                };
                if changed {
                    *slot = Seen::Value(value.clone());
                }
                changed
            },
        )
    });
    if should_run {
        f();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::tree::Tree;

    /// Runs `render` once inside a fresh frame over `node`, bound to
    /// `tree`, mimicking what `engine::reconcile_one` does for a single
    /// call site across repeated renders.
    fn with_render<R>(tree: &Rc<RefCell<Tree>>, node: crate::node::NodeId, is_new: bool, render: impl FnOnce() -> R) -> R {
        scope::set_current_tree(tree.clone());
        scope::enter_frame(node, is_new);
        let result = render();
        scope::exit_frame();
        scope::clear_current_tree();
        result
    }

    fn fresh_node() -> (Rc<RefCell<Tree>>, crate::node::NodeId) {
        let tree = Rc::new(RefCell::new(Tree::new()));
        let node = {
            let mut t = tree.borrow_mut();
            crate::tree::create_element(&mut t, "t")
        };
        (tree, node)
    }

    #[test]
    fn first_mount_is_true_once_then_false() {
        let (tree, node) = fresh_node();
        let first = with_render(&tree, node, true, first_mount);
        let second = with_render(&tree, node, false, first_mount);
        let third = with_render(&tree, node, false, first_mount);
        assert!(first);
        assert!(!second);
        assert!(!third);
    }

    #[test]
    fn previous_sees_prior_render_value_not_current() {
        let (tree, node) = fresh_node();
        let p1 = with_render(&tree, node, true, || previous(&1i64));
        let p2 = with_render(&tree, node, false, || previous(&2i64));
        let p3 = with_render(&tree, node, false, || previous(&3i64));
        assert_eq!(p1, None);
        assert_eq!(p2, Some(1));
        assert_eq!(p3, Some(2));
    }

    #[test]
    fn effect_on_value_change_fires_once_per_distinct_value() {
        let (tree, node) = fresh_node();
        let runs = Rc::new(RefCell::new(Vec::new()));

        let r = runs.clone();
        with_render(&tree, node, true, || {
            effect_on_value_change(1i64, move || r.borrow_mut().push(1i64))
        });
        // Same value again: must not re-fire.
        let r = runs.clone();
        with_render(&tree, node, false, || {
            effect_on_value_change(1i64, move || r.borrow_mut().push(1i64))
        });
        // Different value: fires.
        let r = runs.clone();
        with_render(&tree, node, false, || {
            effect_on_value_change(2i64, move || r.borrow_mut().push(2i64))
        });
        // Back to a previously-seen value: still fires (only the *last*
        // observed value is compared against, not a history).
        let r = runs.clone();
        with_render(&tree, node, false, || {
            effect_on_value_change(1i64, move || r.borrow_mut().push(1i64))
        });

        assert_eq!(*runs.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn effect_on_value_change_is_nan_safe() {
        let (tree, node) = fresh_node();
        let fire_count = Rc::new(RefCell::new(0u32));

        let c = fire_count.clone();
        with_render(&tree, node, true, || {
            effect_on_value_change(f64::NAN, move || *c.borrow_mut() += 1)
        });
        let c = fire_count.clone();
        with_render(&tree, node, false, || {
            effect_on_value_change(f64::NAN, move || *c.borrow_mut() += 1)
        });

        // Both renders observe bit-identical NAN, so the second is not a
        // change: ordinary `==` on f64 would have reported a change every
        // time since NaN != NaN.
        assert_eq!(*fire_count.borrow(), 1);
    }

    #[test]
    fn on_unmount_invokes_latest_closure_not_the_one_from_mount() {
        let (tree, node) = fresh_node();
        let observed = Rc::new(RefCell::new(String::new()));

        let o = observed.clone();
        with_render(&tree, node, true, || on_unmount(move || *o.borrow_mut() = "stale".into()));
        let o = observed.clone();
        with_render(&tree, node, false, || on_unmount(move || *o.borrow_mut() = "latest".into()));

        // Fire the node's registered unmount handler the way
        // `tree::drop_subtree` does, without dropping the node itself so
        // the test can still inspect `observed` afterwards.
        let handlers = {
            let mut t = tree.borrow_mut();
            std::mem::take(&mut t.get_mut(node).unwrap().unmount_handlers)
        };
        for handler in handlers {
            handler.call();
        }

        assert_eq!(*observed.borrow(), "latest");
    }

    #[test]
    fn mounted_predicate_flips_false_on_unmount() {
        let (tree, node) = fresh_node();
        let guard = with_render(&tree, node, true, mounted_predicate);
        assert!(guard.is_mounted());

        let handlers = {
            let mut t = tree.borrow_mut();
            std::mem::take(&mut t.get_mut(node).unwrap().unmount_handlers)
        };
        for handler in handlers {
            handler.call();
        }
        assert!(!guard.is_mounted());
    }

    #[test]
    fn effect_once_runs_exactly_once_across_renders() {
        let (tree, node) = fresh_node();
        let runs = Rc::new(RefCell::new(0u32));

        let r = runs.clone();
        with_render(&tree, node, true, || {
            effect_once(move || {
                *r.borrow_mut() += 1;
                None
            })
        });
        let r = runs.clone();
        with_render(&tree, node, false, || {
            effect_once(move || {
                *r.borrow_mut() += 1;
                None
            })
        });

        assert_eq!(*runs.borrow(), 1);
    }
}
