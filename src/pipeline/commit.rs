//! Commit - Apply a finished pending tree to the host in one pass.
//!
//! # Order
//!
//! 1. Deletions, in the order the reconciler recorded them
//! 2. Live tree effects in pre-order (parent before children, siblings left
//!    to right): CREATE appends, UPDATE patches, REPLACE swaps
//! 3. Root swap: the pending tree becomes the committed tree, unreachable
//!    fibers are freed
//! 4. Hooks, with the runtime released:
//!    - `on_destroy` for deleted and superseded subtrees (children first)
//!    - `on_mount` / `after_update` and ref callbacks in post-order
//!
//! Hooks may write state; the cycle such a write seeds is rooted at the tree
//! that was just committed.

use super::runtime::{flush_pending_dispatch, with_runtime, Runtime};
use crate::engine::{EffectTag, FiberId, FiberTree};
use crate::error::RenderError;
use crate::host::{update_host_node, HostSurface};
use crate::state::ControllerRef;
use crate::types::{HostNode, RefCallback};

/// Deferred user callback collected during commit.
pub(crate) enum CommitCallback {
    Mount(ControllerRef),
    Update(ControllerRef),
    Destroy(ControllerRef),
    Ref(RefCallback, HostNode),
}

impl CommitCallback {
    fn run(self) {
        match self {
            Self::Mount(controller) => controller.on_mount(),
            Self::Update(controller) => controller.after_update(),
            Self::Destroy(controller) => controller.on_destroy(),
            Self::Ref(callback, node) => callback(node),
        }
    }
}

fn malformed(what: &str, id: FiberId) -> RenderError {
    RenderError::MalformedTree(format!("{what} (fiber {id:?})"))
}

/// Commit the pending tree, then run the collected hooks.
pub(crate) fn commit_root() -> Result<(), RenderError> {
    let callbacks = with_runtime(|runtime| {
        let result = runtime.commit();
        if let Err(err) = &result {
            runtime.abort(err);
        }
        result
    })??;

    for callback in callbacks {
        callback.run();
    }
    flush_pending_dispatch();
    Ok(())
}

impl Runtime {
    fn commit(&mut self) -> Result<Vec<CommitCallback>, RenderError> {
        let Some(root) = self.wip_root else {
            return Ok(Vec::new());
        };
        let Runtime {
            host,
            tree,
            removals,
            ..
        } = self;
        let host = host.as_deref_mut().ok_or(RenderError::HostNotInstalled)?;
        let mut callbacks = Vec::new();

        for &deleted in &removals.deletions {
            let parent = tree
                .host_parent(deleted)
                .ok_or_else(|| malformed("deleted fiber has no host ancestor", deleted))?;
            remove_host_nodes(host, tree, deleted, parent)?;
            collect_destroy(tree, deleted, &mut callbacks);
        }
        for &superseded in &removals.superseded {
            collect_destroy(tree, superseded, &mut callbacks);
        }

        let mut cursor = tree.next_unit(root);
        while let Some(id) = cursor {
            apply_effect(host, tree, id)?;
            cursor = tree.next_unit(id);
        }

        for id in tree.subtree_post_order(root) {
            let fiber = &tree[id];
            match (fiber.effect_tag, &fiber.controller) {
                (Some(EffectTag::Create | EffectTag::Replace), Some(controller)) => {
                    callbacks.push(CommitCallback::Mount(controller.clone()));
                }
                (Some(EffectTag::Update), Some(controller)) => {
                    callbacks.push(CommitCallback::Update(controller.clone()));
                }
                _ => {}
            }
            if fiber.effect_tag == Some(EffectTag::Create) {
                if let (Some(callback), Some(node)) = (fiber.props.ref_callback(), fiber.dom) {
                    callbacks.push(CommitCallback::Ref(callback.clone(), node));
                }
            }
        }

        let deleted = removals.deletions.len();
        removals.clear();
        self.current_root = Some(root);
        self.wip_root = None;
        self.next_unit = None;
        let freed = self.tree.retain_reachable(root);
        self.stats.commits += 1;
        log::debug!(
            "commit {}: {deleted} deletions, {} hooks, {freed} fibers freed",
            self.stats.commits,
            callbacks.len()
        );
        Ok(callbacks)
    }
}

/// Apply one live fiber's effect.
fn apply_effect(host: &mut dyn HostSurface, tree: &FiberTree, id: FiberId) -> Result<(), RenderError> {
    let fiber = &tree[id];
    let Some(tag) = fiber.effect_tag else {
        return Ok(());
    };
    if tag == EffectTag::Deletion {
        return Ok(());
    }

    let dom = fiber.dom.ok_or_else(|| malformed("fiber reached commit without a host node", id))?;
    match tag {
        EffectTag::Create => {
            let parent = tree
                .host_parent(id)
                .ok_or_else(|| malformed("no ancestor owns a host node", id))?;
            host.append_child(parent, dom)?;
        }
        EffectTag::Update => {
            // Component wrappers carry no props on the host side.
            if !fiber.is_component() {
                let previous = fiber
                    .alternate
                    .and_then(|alternate| tree.get(alternate))
                    .ok_or_else(|| malformed("UPDATE without a previous fiber", id))?;
                update_host_node(host, dom, &previous.props, &fiber.props)?;
            }
        }
        EffectTag::Replace => {
            let old = fiber
                .replace_node
                .ok_or_else(|| malformed("REPLACE without a node to replace", id))?;
            let parent = tree
                .host_parent(id)
                .ok_or_else(|| malformed("no ancestor owns a host node", id))?;
            host.replace_child(parent, dom, old)?;
        }
        EffectTag::Deletion => {}
    }
    log::trace!("commit {tag:?} {dom}");
    Ok(())
}

/// Detach the host nodes of a deleted fiber from `parent`. A fiber without
/// a node of its own hands the job to its children.
fn remove_host_nodes(
    host: &mut dyn HostSurface,
    tree: &FiberTree,
    id: FiberId,
    parent: HostNode,
) -> Result<(), RenderError> {
    match tree[id].dom {
        Some(dom) => host.remove_child(parent, dom)?,
        None => {
            for child in tree.children(id) {
                remove_host_nodes(host, tree, child, parent)?;
            }
        }
    }
    Ok(())
}

fn collect_destroy(tree: &FiberTree, id: FiberId, callbacks: &mut Vec<CommitCallback>) {
    for fiber in tree.subtree_post_order(id) {
        if let Some(controller) = &tree[fiber].controller {
            callbacks.push(CommitCallback::Destroy(controller.clone()));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use crate::engine::{connect, reset_registry, Fiber};
    use crate::host::{MemoryHost, Mutation};
    use crate::pipeline::runtime::{install_host, render, render_stats, reset_runtime, with_committed_tree};
    use crate::pipeline::scheduler::Unbounded;
    use crate::pipeline::work_loop::work_loop;
    use crate::primitives::{component, create_element, Component};
    use crate::state::{Controller, Observable};
    use crate::types::{Element, Props};
    use std::cell::RefCell;
    use std::rc::Rc;

    thread_local! {
        static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn record(event: String) {
        EVENTS.with(|events| events.borrow_mut().push(event));
    }

    fn take_events() -> Vec<String> {
        EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
    }

    struct Named(&'static str);

    impl Controller for Named {
        fn on_mount(this: &Observable<Self>) {
            record(format!("mount {}", this.with(|n| n.0)));
        }

        fn after_update(this: &Observable<Self>) {
            record(format!("update {}", this.with(|n| n.0)));
        }

        fn on_destroy(this: &Observable<Self>) {
            record(format!("destroy {}", this.with(|n| n.0)));
        }
    }

    fn named(name: &'static str, render: impl Fn(&crate::primitives::RenderProps<'_>) -> Element + 'static) -> Component {
        connect(&component(name, render), move |_| Named(name))
    }

    fn setup() -> (MemoryHost, HostNode) {
        reset_runtime();
        reset_registry();
        take_events();
        let host = MemoryHost::new();
        let container = host.create_container("main");
        install_host(host.clone()).unwrap();
        (host, container)
    }

    fn drain(element: Element, container: HostNode) {
        render(element, container).unwrap();
        work_loop(&Unbounded).unwrap();
    }

    #[test]
    fn test_hooks_fire_children_first() {
        let (_, container) = setup();
        let leaf = named("Leaf", |_| create_element("span", None, children![]));
        let leaf_for_outer = leaf.clone();
        let outer = named("Outer", move |_| {
            create_element("div", None, children![create_element(&leaf_for_outer, None, children![])])
        });
        let app = create_element(&outer, None, children![]);

        drain(app.clone(), container);
        assert_eq!(take_events(), vec!["mount Leaf", "mount Outer"]);

        drain(app, container);
        assert_eq!(take_events(), vec!["update Leaf", "update Outer"]);
    }

    #[test]
    fn test_deletion_removes_nodes_and_destroys_subtree() {
        let (host, container) = setup();
        let item = named("Item", |_| create_element("li", None, children!["x"]));

        drain(
            create_element(
                "ul",
                None,
                children![create_element(&item, None, children![]), create_element(&item, None, children![])],
            ),
            container,
        );
        take_events();
        host.take_journal();

        drain(create_element("ul", None, children![create_element(&item, None, children![])]), container);

        assert_eq!(take_events(), vec!["destroy Item", "update Item"]);
        let removals: Vec<_> = host
            .take_journal()
            .into_iter()
            .filter(|m| matches!(m, Mutation::Remove { .. }))
            .collect();
        assert_eq!(removals.len(), 1);
        assert_eq!(host.to_markup(container), "<main><ul><item><li>x</li></item></ul></main>");
    }

    #[test]
    fn test_replace_swaps_node_in_place() {
        let (host, container) = setup();
        let old = named("Old", |_| create_element("p", None, children![]));

        drain(
            create_element("div", None, children![create_element(&old, None, children![]), "tail"]),
            container,
        );
        take_events();

        drain(
            create_element("div", None, children![create_element("section", None, children![]), "tail"]),
            container,
        );

        assert_eq!(take_events(), vec!["destroy Old"]);
        assert_eq!(host.to_markup(container), "<main><div><section></section>tail</div></main>");
    }

    #[test]
    fn test_ref_callback_gets_created_node() {
        let (host, container) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let element = create_element("input", Props::new().node_ref(move |node| sink.borrow_mut().push(node)), children![]);

        drain(element.clone(), container);
        drain(element, container);

        let nodes = seen.borrow().clone();
        assert_eq!(nodes.len(), 1, "ref fires on creation only");
        assert_eq!(host.tag(nodes[0]).as_deref(), Some("input"));
    }

    #[test]
    fn test_commit_sweeps_previous_generation() {
        let (_, container) = setup();
        let app = create_element("div", None, children!["a", "b"]);

        drain(app.clone(), container);
        let first = with_committed_tree(|tree, _| tree.len());
        drain(app, container);
        let second = with_committed_tree(|tree, _| tree.len());

        assert_eq!(first, Some(4));
        assert_eq!(second, Some(4));
        assert_eq!(render_stats().commits, 2);
    }

    #[test]
    fn test_fiber_without_host_node_aborts_commit() {
        let (host, container) = setup();
        drain(create_element("div", None, children![]), container);
        let committed = with_committed_tree(|tree, root| (root, tree.len()));
        host.take_journal();

        // Seed a cycle, then hand the commit a CREATE fiber that never got a node.
        render(create_element("div", None, children![]), container).unwrap();
        with_runtime(|runtime| {
            let root = runtime.wip_root.unwrap();
            let orphan = Fiber::from_element(&create_element("p", None, children![]), root, EffectTag::Create);
            let orphan = runtime.tree.insert(orphan);
            runtime.tree[root].child = Some(orphan);
            runtime.next_unit = None;
        })
        .unwrap();

        let result = commit_root();

        assert!(matches!(result, Err(RenderError::MalformedTree(_))), "{result:?}");
        assert_eq!(with_committed_tree(|tree, root| (root, tree.len())), committed);
        assert_eq!(render_stats().aborted, 1);
        assert_eq!(render_stats().commits, 1);
        assert!(host.take_journal().is_empty());
        assert_eq!(host.to_markup(container), "<main><div></div></main>");
    }

    #[test]
    fn test_component_update_leaves_wrapper_untouched() {
        let (host, container) = setup();
        let plain = component("Plain", |_| create_element("b", None, children![]));

        drain(create_element(&plain, Props::new().with("title", "1"), children![]), container);
        host.take_journal();
        drain(create_element(&plain, Props::new().with("title", "2"), children![]), container);

        assert!(host.take_journal().iter().all(|m| !m.is_prop_change()));
    }
}
