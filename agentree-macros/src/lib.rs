//! Procedural macros for the `agentree` orchestration-tree renderer.
//!
//! `#[component]` wraps a function body so it runs inside its own
//! group/frame rather than the caller's. The frame push/pop
//! (`scope::enter_frame`/`exit_frame`) is owned by
//! `engine::reconcile_one`, not the macro itself — the macro's job is
//! instead to defer the function body into the closure `engine::component`
//! expects, so any lifecycle hooks it calls (`on_mount`, `previous`, ...)
//! run once the engine has entered *this* node's own frame, not the
//! frame of whichever node is being composed when the function is
//! called to build its `Element`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, FnArg, Pat, Type, ItemFn};

/// Marks a function as a component: a call to it returns an [`Element`]
/// whose props/children are computed lazily, inside the frame the
/// reconciler enters for this call site, rather than eagerly at the
/// point the function is called.
///
/// The function must return `agentree::engine::Element`. Every argument
/// is captured into the deferred closure as an owned value, since the
/// closure must be `'static` — the render pass may invoke it on a later
/// tick after the caller's own stack frame is gone. A by-reference
/// argument (`&str`, `&[T]`, ...) is captured via `ToOwned::to_owned`
/// into its owned form (`String`, `Vec<T>`, ...) and a fresh reference
/// back into that owned value is rebound on every invocation (deref
/// coercion turns `&String` back into `&str` at each use in the
/// function body); a by-value argument is captured as-is and `Clone`d
/// on every invocation instead.
///
/// # Example
///
/// ```ignore
/// use agentree::prelude::*;
///
/// #[component]
/// fn phase(name: &str) -> Element {
///     on_mount(|| println!("phase {name} mounted"));
///     el("phase").prop("name", name).into()
/// }
/// ```
#[proc_macro_attribute]
pub fn component(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    TokenStream::from(expand_component(input))
}

fn expand_component(input: ItemFn) -> TokenStream2 {
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    let fn_name = &sig.ident;
    let inputs = &sig.inputs;
    let output = &sig.output;
    let generics = &sig.generics;
    let where_clause = &sig.generics.where_clause;
    let tag_name = fn_name.to_string();

    // Two passes are needed because `engine::component` requires a `Fn`
    // closure, callable more than once in principle, even though the
    // engine only ever invokes it once per declaration: capture each
    // argument as an owned value outside the closure, then produce a
    // fresh value from it *inside* the closure body on every call before
    // moving that into the original block — the outer closure itself
    // never moves out of its own captures, which is what `Fn` (as
    // opposed to `FnOnce`) requires.
    //
    // A reference-typed argument (`ident: &str`) needs different
    // treatment from a by-value one: `ToOwned::to_owned(&ident)` where
    // `ident: &str` calls the blanket `impl<T: Clone> ToOwned for T`
    // instead of `str`'s own impl (the extra `&` makes the receiver
    // `&&str`, and `&str: Clone` satisfies the blanket impl first),
    // producing another `&str` borrowed from the caller's stack rather
    // than an owned `String` — not `'static`, so it can't live past the
    // call the macro is deferring. Passing `ident` itself (already a
    // `&str`) to `ToOwned::to_owned` reaches `str`'s own impl and yields
    // a `String`; the per-call rebinding then just takes `&` of that
    // owned value, relying on deref coercion to satisfy whatever the
    // original reference type was.
    let mut capture_bindings = Vec::new();
    let mut clone_bindings = Vec::new();
    for arg in inputs {
        if let FnArg::Typed(pat_type) = arg {
            if let Pat::Ident(pat_ident) = pat_type.pat.as_ref() {
                let ident = &pat_ident.ident;
                if matches!(pat_type.ty.as_ref(), Type::Reference(_)) {
                    capture_bindings
                        .push(quote! { let #ident = ::std::borrow::ToOwned::to_owned(#ident); });
                    clone_bindings.push(quote! { let #ident = &#ident; });
                } else {
                    capture_bindings.push(
                        quote! { let #ident = ::std::borrow::ToOwned::to_owned(&#ident); },
                    );
                    clone_bindings
                        .push(quote! { let #ident = ::std::clone::Clone::clone(&#ident); });
                }
            }
        }
    }

    quote! {
        #(#attrs)*
        #vis fn #fn_name #generics (#inputs) #output #where_clause {
            #(#capture_bindings)*
            ::agentree::engine::component(#tag_name, move || {
                #(#clone_bindings)*
                let __element: ::agentree::engine::Element = (move || #block)();
                ::agentree::engine::Element::into_parts(__element)
            })
            .into()
        }
    }
}
