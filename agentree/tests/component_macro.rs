//! Exercises `#[component]` end to end, including a by-reference (`&str`)
//! argument — the capture case that previously failed to compile because
//! the macro captured it as another borrowed `&str` instead of an owned
//! `String`.

use agentree::prelude::*;

#[component]
fn phase(name: &str, step: i64) -> Element {
    on_mount(|| {});
    el("phase").prop("name", name).prop("step", step).into()
}

#[tokio::test]
async fn component_with_str_argument_renders_its_props() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let root = create_root();
            let mounting = root.clone();
            let handle = tokio::task::spawn_local(async move {
                mounting.mount(|| -> Element { phase("build", 1) }).await
            });

            tokio::task::yield_now().await;
            tokio::task::yield_now().await;

            assert_eq!(root.to_xml(), r#"<phase name="build" step="1" />"#);

            resolve_completion(Ok(()));
            handle.await.unwrap().unwrap();
        })
        .await;
}
