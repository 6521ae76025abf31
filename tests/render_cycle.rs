//! End-to-end render cycles against the in-memory host.
//!
//! Each test installs a fresh `MemoryHost`, registers the work loop with an
//! `IdleQueue` and pumps the queue the way an event loop would.
//!
//! Run with: cargo test --test render_cycle -- --nocapture

use std::cell::RefCell;
use std::rc::Rc;

use luna::*;

// =============================================================================
// HARNESS
// =============================================================================

struct Harness {
    host: MemoryHost,
    container: HostNode,
    queue: IdleQueue,
}

impl Harness {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        reset_runtime();
        reset_registry();
        set_config(RuntimeConfig::default());

        let host = MemoryHost::new();
        let container = host.create_container("main");
        install_host(host.clone()).unwrap();

        let queue = IdleQueue::new();
        start(Rc::new(queue.clone()));
        Self { host, container, queue }
    }

    fn render(&self, element: Element) {
        render(element, self.container).unwrap();
    }

    /// Pump slices until no cycle is in flight.
    fn drain(&self) -> usize {
        self.queue.run_until_idle(&Unbounded, 256)
    }

    fn markup(&self) -> String {
        self.host.to_markup(self.container)
    }

    /// Host node at a child-index path below the container.
    fn node_at(&self, path: &[usize]) -> HostNode {
        path.iter()
            .fold(self.container, |node, &i| self.host.children(node)[i])
    }
}

/// Committed fibers in walk order (root excluded) with their tags.
fn committed_tags() -> Vec<(String, Option<EffectTag>)> {
    with_committed_tree(|tree, root| {
        let mut out = Vec::new();
        let mut cursor = tree.next_unit(root);
        while let Some(id) = cursor {
            let fiber = &tree[id];
            let label = match &fiber.kind {
                Some(ElementKind::Host(tag)) => tag.clone(),
                Some(ElementKind::Text) => format!("\"{}\"", fiber.props.get(NODE_VALUE).map(PropValue::to_attribute_string).unwrap_or_default()),
                Some(ElementKind::Component(component)) => component.name().to_string(),
                None => "root".to_string(),
            };
            out.push((label, fiber.effect_tag));
            cursor = tree.next_unit(id);
        }
        out
    })
    .unwrap_or_default()
}

// =============================================================================
// COUNTER
// =============================================================================

struct Counter {
    count: i64,
}

impl Counter {
    fn increment(&mut self) {
        self.count += 1;
    }

    fn label(&self) -> String {
        format!("count: {}", self.count)
    }
}

impl Controller for Counter {}

fn counter_component() -> Component {
    let view = component("Counter", |props| {
        let Some(state) = props.controller::<Counter>() else {
            return create_text_element("no controller");
        };
        let label = state.with(Counter::label);
        create_element(
            "div",
            None,
            children![
                create_element("p", None, children![label]),
                create_element(
                    "button",
                    Props::new().on("onClick", move |_| state.update(Counter::increment)),
                    children!["+"]
                ),
            ],
        )
    });
    connect(&view, |_| Counter { count: 0 })
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_render_text_in_div() {
    let h = Harness::new();
    h.render(create_element("div", None, children!["hi"]));

    assert!(h.drain() >= 1);

    assert_eq!(h.markup(), "<main><div>hi</div></main>");
    let div = h.node_at(&[0]);
    assert_eq!(h.host.children(div).len(), 1);
    assert_eq!(h.host.tag(h.node_at(&[0, 0])), None);
    assert_eq!(h.host.listener_count(div, "click"), 0);
    assert_eq!(render_stats().commits, 1);
}

#[test]
fn test_counter_click_rerenders_once() {
    let h = Harness::new();
    let counter = counter_component();
    h.render(create_element(&counter, None, children![]));
    h.drain();
    assert_eq!(h.markup(), "<main><counter><div><p>count: 0</p><button>+</button></div></counter></main>");

    let before = render_stats();
    let button = h.node_at(&[0, 0, 1]);
    assert_eq!(h.host.dispatch_event(button, "click"), 1);

    // One write, one seeded cycle, nothing on screen yet.
    assert_eq!(render_stats().cycles_started, before.cycles_started + 1);
    assert!(!is_idle());
    assert!(h.markup().contains("count: 0"));

    h.drain();

    assert_eq!(render_stats().commits, before.commits + 1);
    assert!(h.markup().contains("<p>count: 1</p>"));
    let tags = committed_tags();
    assert!(tags.contains(&("Counter".to_string(), Some(EffectTag::Update))));
    assert!(tags.contains(&("\"count: 1\"".to_string(), Some(EffectTag::Update))));
    assert!(tags.iter().all(|(_, tag)| *tag == Some(EffectTag::Update)));
}

#[test]
fn test_removing_listener_prop() {
    let h = Harness::new();
    h.render(create_element("button", Props::new().with("id", "go").on("onClick", |_| {}), children![]));
    h.drain();
    h.host.take_journal();

    h.render(create_element("button", Props::new().with("id", "go"), children![]));
    h.drain();

    let journal = h.host.take_journal();
    let removed = journal
        .iter()
        .filter(|m| matches!(m, Mutation::RemoveListener { event, .. } if event == "click"))
        .count();
    let added = journal
        .iter()
        .filter(|m| matches!(m, Mutation::AddListener { .. }))
        .count();
    assert_eq!((removed, added), (1, 0));
    assert_eq!(h.host.listener_count(h.node_at(&[0]), "click"), 0);
}

#[test]
fn test_unchanged_tree_is_idempotent() {
    let h = Harness::new();
    let app = create_element(
        "section",
        Props::new()
            .with("class", "app")
            .with(STYLE, PropValue::style([("color", "red")]))
            .on("onClick", |_| {}),
        children![create_element("h1", None, children!["title"]), "body", 0],
    );

    h.render(app.clone());
    h.drain();
    h.host.take_journal();

    h.render(app);
    h.drain();

    assert!(h.host.take_journal().is_empty());
    assert!(committed_tags().iter().all(|(_, tag)| *tag == Some(EffectTag::Update)));
    assert_eq!(
        h.markup(),
        "<main><section class=\"app\" style=\"color: red\"><h1>title</h1>body0</section></main>"
    );
}

#[test]
fn test_nothing_attached_before_commit() {
    let h = Harness::new();
    set_config(RuntimeConfig {
        yield_threshold_ms: 1.0,
        max_units_per_slice: Some(1),
    });
    let items: Vec<Element> = (0..4).map(|i| create_element("li", None, children![i])).collect();
    h.render(create_element("ul", None, children![items]));

    let mut slices = 0;
    while !is_idle() {
        assert_eq!(h.markup(), "<main></main>");
        assert!(h.queue.run_next(&Unbounded));
        slices += 1;
    }

    // root, ul, 4 x (li, text): one unit per slice, commit rides the last.
    assert_eq!(slices, 10);
    assert_eq!(h.host.text_content(h.container), "0123");
}

#[test]
fn test_host_failure_keeps_committed_tree() {
    let h = Harness::new();
    h.render(create_element("p", None, children!["stable"]));
    h.drain();
    let committed_root = with_committed_tree(|_, root| root);

    h.host.reject_tag("em");
    h.render(create_element("p", None, children![create_element("em", None, children!["boom"])]));
    h.drain();

    assert_eq!(render_stats().aborted, 1);
    assert_eq!(with_committed_tree(|_, root| root), committed_root);
    assert_eq!(h.markup(), "<main><p>stable</p></main>");

    h.host.accept_tag("em");
    h.render(create_element("p", None, children![create_element("em", None, children!["ok"])]));
    h.drain();
    assert_eq!(h.markup(), "<main><p><em>ok</em></p></main>");
}

#[test]
fn test_surplus_children_deleted_from_tail() {
    let h = Harness::new();
    let list = |n: usize| {
        let items: Vec<Element> = (0..n).map(|i| create_element("li", None, children![i])).collect();
        create_element("ol", None, children![items])
    };

    h.render(list(5));
    h.drain();
    h.host.take_journal();

    h.render(list(2));
    h.drain();

    let removed = h
        .host
        .take_journal()
        .into_iter()
        .filter(|m| matches!(m, Mutation::Remove { .. }))
        .count();
    assert_eq!(removed, 3);
    assert_eq!(h.markup(), "<main><ol><li>0</li><li>1</li></ol></main>");
}

#[test]
fn test_rerender_abandons_cycle_in_flight() {
    let h = Harness::new();
    set_config(RuntimeConfig {
        yield_threshold_ms: 1.0,
        max_units_per_slice: Some(1),
    });

    h.render(create_element("div", None, children!["first"]));
    h.queue.run_next(&Unbounded);
    h.render(create_element("div", None, children!["second"]));
    h.drain();

    assert_eq!(h.markup(), "<main><div>second</div></main>");
    let stats = render_stats();
    assert_eq!((stats.cycles_started, stats.commits), (2, 1));
}

// =============================================================================
// LIFECYCLE
// =============================================================================

thread_local! {
    static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn log_event(event: impl Into<String>) {
    LOG.with(|log| log.borrow_mut().push(event.into()));
}

fn take_log() -> Vec<String> {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

struct Clock {
    ticks: u32,
}

impl Controller for Clock {
    fn on_mount(this: &Observable<Self>) {
        log_event("mount");
        // Writing from a hook seeds a cycle rooted at the fresh commit.
        this.update(|clock| clock.ticks += 1);
    }

    fn after_update(this: &Observable<Self>) {
        log_event(format!("update {}", this.with(|clock| clock.ticks)));
    }

    fn on_destroy(_this: &Observable<Self>) {
        log_event("destroy");
    }
}

#[test]
fn test_hook_write_starts_next_cycle() {
    let h = Harness::new();
    take_log();
    let clock = connect(
        &component("Clock", |props| {
            let ticks = props.controller::<Clock>().map(|c| c.with(|c| c.ticks)).unwrap_or(0);
            create_element("time", None, children![format!("ticks: {ticks}")])
        }),
        |_| Clock { ticks: 0 },
    );

    h.render(create_element(&clock, None, children![]));
    h.drain();

    assert_eq!(take_log(), vec!["mount", "update 1"]);
    assert_eq!(h.markup(), "<main><clock><time>ticks: 1</time></clock></main>");
    assert_eq!(render_stats().commits, 2);

    h.render(create_element("p", None, children![]));
    h.drain();
    assert_eq!(take_log(), vec!["destroy"]);
    assert_eq!(h.markup(), "<main><p></p></main>");
}

struct Alpha;

impl Controller for Alpha {
    fn on_mount(_this: &Observable<Self>) {
        log_event("mount alpha");
    }

    fn on_destroy(_this: &Observable<Self>) {
        log_event("destroy alpha");
    }
}

struct Beta {
    label: Option<String>,
}

impl Controller for Beta {
    fn on_mount(this: &Observable<Self>) {
        log_event(format!("mount beta {}", this.with(|b| b.label.clone()).unwrap_or_default()));
    }
}

fn label_context(label: &str) -> Context {
    create_context([("label", ContextValue::new(label.to_string()))])
}

#[test]
fn test_replaced_component_mounts_with_old_context() {
    let h = Harness::new();
    take_log();
    let alpha = connect(&component("Alpha", |_| create_element("b", None, children![])), |_| Alpha);
    let beta = connect(&component("Beta", |_| create_element("i", None, children![])), |context| Beta {
        label: context.and_then(|c| c.get::<String>("label")).map(|label| label.get()),
    });

    h.render(create_element(
        "div",
        Props::new().context(label_context("old")),
        children![create_element(&alpha, None, children![])],
    ));
    h.drain();
    assert_eq!(take_log(), vec!["mount alpha"]);

    h.render(create_element(
        "div",
        Props::new().context(label_context("new")),
        children![create_element(&beta, None, children![])],
    ));
    h.drain();

    // The superseded controller goes first; the newcomer keeps the old context.
    assert_eq!(take_log(), vec!["destroy alpha", "mount beta old"]);
    assert_eq!(h.markup(), "<main><div><beta><i></i></beta></div></main>");
    let tags = committed_tags();
    assert!(tags.contains(&("Beta".to_string(), Some(EffectTag::Replace))));
}

// =============================================================================
// CONTEXT
// =============================================================================

#[test]
fn test_context_write_rerenders_consumers() {
    let h = Harness::new();
    let theme = Observable::new("dark".to_string());
    let context = create_context([("theme", ContextValue::from_observable(theme.clone()))]);

    let badge = component("ThemeBadge", |props| {
        let name = props
            .context()
            .and_then(|c| c.get::<String>("theme"))
            .map(|t| t.get())
            .unwrap_or_default();
        create_element("span", Props::new().with("data-theme", name.as_str()), children![name])
    });

    h.render(create_element(
        "div",
        Props::new().context(context),
        children![create_element(&badge, None, children![])],
    ));
    h.drain();
    assert!(h.markup().contains("<span data-theme=\"dark\">dark</span>"));

    theme.set("light".to_string());
    h.drain();
    assert!(h.markup().contains("<span data-theme=\"light\">light</span>"));
}

#[test]
fn test_writes_during_render_are_deferred() {
    let h = Harness::new();
    let noisy = Observable::new(0_u32);
    let source = noisy.clone();
    let chatty = component("Chatty", move |_| {
        // Only the first render writes, so the deferred cycle settles.
        if source.with(|n| *n == 0) {
            source.set(1);
        }
        create_element("i", None, children![source.get()])
    });

    h.render(create_element(&chatty, None, children![]));
    h.drain();

    assert_eq!(noisy.get(), 1);
    assert_eq!(h.markup(), "<main><chatty><i>1</i></chatty></main>");
    assert!(is_idle());
}
