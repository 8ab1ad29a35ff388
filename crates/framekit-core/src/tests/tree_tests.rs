use super::*;
use crate::memory_host::MemoryHost;
use crate::template::{ElementTemplate, TemplateNode};
use crate::{apply_disabled, component_config_table, ConfigTable};
use std::cell::RefCell;

const PANEL_FRAME: &str = "dh-2-2-2-2-1-1-1-1-3-3-3-3";

thread_local! {
    static TITLE_CALLS: RefCell<Vec<(String, Option<String>, RenderState)>> =
        RefCell::new(Vec::new());
    static DISABLED_CALLS: RefCell<Vec<RenderState>> = RefCell::new(Vec::new());
}

fn reset_calls() {
    TITLE_CALLS.with(|calls| calls.borrow_mut().clear());
    DISABLED_CALLS.with(|calls| calls.borrow_mut().clear());
}

fn title_calls() -> Vec<(String, Option<String>, RenderState)> {
    TITLE_CALLS.with(|calls| calls.borrow().clone())
}

fn disabled_calls() -> Vec<RenderState> {
    DISABLED_CALLS.with(|calls| calls.borrow().clone())
}

fn apply_title(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    previous: Option<&Value>,
) -> Result<(), RenderError> {
    TITLE_CALLS.with(|calls| {
        calls.borrow_mut().push((
            value.to_string(),
            previous.map(ToString::to_string),
            cx.node.state(),
        ))
    });
    match cx.reference("titleEl") {
        Some(el) => Ok(cx.host.set_text(el, &value.to_string())?),
        None => Ok(()),
    }
}

fn counted_disabled(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    previous: Option<&Value>,
) -> Result<(), RenderError> {
    DISABLED_CALLS.with(|calls| calls.borrow_mut().push(cx.node.state()));
    apply_disabled(cx, value, previous)
}

crate::config_table! {
    fn leaf_config() extends component_config_table {
        "title" => (Rendered, apply_title),
        "disabled" => (Rendered, counted_disabled),
    }
}

/// Title element plus content.
struct Leaf;

impl Widget for Leaf {
    fn xtype(&self) -> &'static str {
        "leaf"
    }

    fn base_cls(&self) -> &'static str {
        "leaf"
    }

    fn config_table(&self) -> &'static ConfigTable {
        leaf_config()
    }

    fn render_template(&self) -> Rc<Template> {
        thread_local! {
            static TEMPLATE: Rc<Template> = Rc::new(Template::new(vec![
                ElementTemplate::new("span")
                    .reference("titleEl")
                    .class("{baseCls}-title")
                    .into(),
                Slot::Content.into(),
            ]));
        }
        TEMPLATE.with(Rc::clone)
    }

    fn child_els(&self) -> &'static [&'static str] {
        &["titleEl"]
    }
}

/// Items between docked items, inside a body element.
struct Boxy {
    framed: bool,
}

impl Widget for Boxy {
    fn xtype(&self) -> &'static str {
        "boxy"
    }

    fn base_cls(&self) -> &'static str {
        "boxy"
    }

    fn always_framed(&self) -> bool {
        self.framed
    }

    fn render_template(&self) -> Rc<Template> {
        thread_local! {
            static TEMPLATE: Rc<Template> = Rc::new(Template::new(vec![
                Slot::DockedBefore.into(),
                ElementTemplate::new("div")
                    .reference("body")
                    .class("{baseCls}-body")
                    .slot(Slot::Content)
                    .slot(Slot::Items)
                    .into(),
                Slot::DockedAfter.into(),
            ]));
        }
        TEMPLATE.with(Rc::clone)
    }

    fn content_target(&self) -> Option<&'static str> {
        Some("body")
    }
}

/// Declares a reference its template never emits.
struct Broken;

impl Widget for Broken {
    fn xtype(&self) -> &'static str {
        "broken"
    }

    fn child_els(&self) -> &'static [&'static str] {
        &["iconEl"]
    }
}

fn tree() -> ComponentTree<MemoryHost> {
    reset_calls();
    ComponentTree::new(MemoryHost::new())
}

fn legacy_tree() -> ComponentTree<MemoryHost> {
    reset_calls();
    let mut host = MemoryHost::without_rounded_corners();
    host.add_rule("x-boxy-default-frameInfo", "font-family", PANEL_FRAME);
    ComponentTree::new(host)
}

fn event_log(tree: &mut ComponentTree<MemoryHost>) -> Rc<RefCell<Vec<(String, LifecycleEventKind, RenderState)>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    tree.observe(move |event| {
        sink.borrow_mut()
            .push((event.key.to_string(), event.kind, event.state));
        Flow::Continue
    });
    log
}

#[test]
fn leaf_walks_every_state_and_shows_title_set_before_render() {
    let mut tree = tree();
    let leaf = tree.create_with_id(Leaf, "leaf");
    tree.set_deferred(leaf, "title", "x").unwrap();
    let log = event_log(&mut tree);

    assert_eq!(tree.render_to_body(leaf).unwrap(), RenderOutcome::Rendered);

    assert_eq!(
        *log.borrow(),
        vec![
            ("leaf".to_string(), LifecycleEventKind::BeforeRender, RenderState::Unrendered),
            ("leaf".to_string(), LifecycleEventKind::Render, RenderState::Rendered),
            ("leaf".to_string(), LifecycleEventKind::AfterRender, RenderState::AfterRender),
        ]
    );
    assert_eq!(title_calls(), vec![("x".to_string(), None, RenderState::Rendered)]);
    let node = tree.node(leaf).unwrap();
    let title = node.reference("titleEl").unwrap();
    assert_eq!(tree.host().text(title), "x");
    assert_eq!(node.config_str("title"), Some("x"));
}

#[test]
fn deferred_disabled_applies_once_when_rendered() {
    let mut tree = tree();
    let leaf = tree.create(Leaf);
    tree.set_deferred_at(leaf, "disabled", true, RenderState::Rendered)
        .unwrap();

    assert!(disabled_calls().is_empty());
    assert_eq!(tree.node(leaf).unwrap().pending("disabled"), Some(&Value::Bool(true)));
    assert_eq!(tree.node(leaf).unwrap().config("disabled"), None);

    tree.render_to_body(leaf).unwrap();

    assert_eq!(disabled_calls(), vec![RenderState::Rendered]);
    let el = tree.element(leaf).unwrap().unwrap();
    assert!(tree.host().has_class(el, "x-item-disabled"));
    assert_eq!(tree.host().attribute(el, "aria-disabled"), Some("true"));
    assert_eq!(tree.node(leaf).unwrap().pending_count(), 0);
}

#[test]
fn veto_leaves_node_unrendered_and_retry_succeeds() {
    let mut tree = tree();
    let leaf = tree.create(Leaf);
    let vetoes = Rc::new(RefCell::new(1));
    let remaining = Rc::clone(&vetoes);
    tree.on(leaf, LifecycleEventKind::BeforeRender, move |_| {
        let mut remaining = remaining.borrow_mut();
        if *remaining > 0 {
            *remaining -= 1;
            Flow::Veto
        } else {
            Flow::Continue
        }
    })
    .unwrap();

    assert_eq!(tree.render_to_body(leaf).unwrap(), RenderOutcome::Vetoed);
    assert_eq!(tree.state(leaf).unwrap(), RenderState::Unrendered);
    assert_eq!(tree.element(leaf).unwrap(), None);
    assert_eq!(tree.host().len(), 1);

    assert_eq!(tree.render_to_body(leaf).unwrap(), RenderOutcome::Rendered);
    assert_eq!(tree.state(leaf).unwrap(), RenderState::AfterRender);
}

#[test]
fn rendering_twice_creates_one_element() {
    let mut tree = tree();
    let leaf = tree.create(Leaf);
    tree.render_to_body(leaf).unwrap();
    let elements = tree.host().len();

    assert_eq!(tree.render_to_body(leaf).unwrap(), RenderOutcome::AlreadyRendered);
    assert_eq!(tree.begin_render(leaf).unwrap(), BeginRender::AlreadyStarted);
    assert_eq!(tree.host().len(), elements);
    let body = tree.host().body();
    assert_eq!(tree.host().children(body).len(), 1);
}

#[test]
fn container_renders_children_in_order_before_its_after_render() {
    let mut tree = tree();
    let owner = tree.create_with_id(Boxy { framed: false }, "owner");
    let first = tree.create_with_id(Leaf, "first");
    let second = tree.create_with_id(Leaf, "second");
    tree.add_child(owner, first).unwrap();
    tree.add_child(owner, second).unwrap();
    let log = event_log(&mut tree);

    tree.render_to_body(owner).unwrap();

    let body = tree.node(owner).unwrap().reference("body").unwrap();
    let first_el = tree.element(first).unwrap().unwrap();
    let second_el = tree.element(second).unwrap().unwrap();
    assert_eq!(tree.host().children(body), vec![first_el, second_el]);

    let order: Vec<(String, LifecycleEventKind)> = log
        .borrow()
        .iter()
        .filter(|(_, kind, _)| *kind != LifecycleEventKind::BeforeRender)
        .map(|(key, kind, _)| (key.clone(), *kind))
        .collect();
    assert_eq!(
        order,
        vec![
            ("owner".to_string(), LifecycleEventKind::Render),
            ("first".to_string(), LifecycleEventKind::Render),
            ("second".to_string(), LifecycleEventKind::Render),
            ("first".to_string(), LifecycleEventKind::AfterRender),
            ("second".to_string(), LifecycleEventKind::AfterRender),
            ("owner".to_string(), LifecycleEventKind::AfterRender),
        ]
    );
}

#[test]
fn vetoed_child_is_left_out_of_the_owner() {
    let mut tree = tree();
    let owner = tree.create(Boxy { framed: false });
    let kept = tree.create(Leaf);
    let vetoed = tree.create(Leaf);
    tree.add_child(owner, kept).unwrap();
    tree.add_child(owner, vetoed).unwrap();
    tree.on(vetoed, LifecycleEventKind::BeforeRender, |_| Flow::Veto)
        .unwrap();

    tree.render_to_body(owner).unwrap();

    assert_eq!(tree.state(kept).unwrap(), RenderState::AfterRender);
    assert_eq!(tree.state(vetoed).unwrap(), RenderState::Unrendered);
    let body = tree.node(owner).unwrap().reference("body").unwrap();
    assert_eq!(tree.host().children(body).len(), 1);
}

#[test]
fn buffered_writes_coalesce_to_the_last_value() {
    let mut tree = tree();
    let leaf = tree.create(Leaf);
    tree.set_deferred(leaf, "title", "a").unwrap();
    tree.set_deferred(leaf, "title", "b").unwrap();
    tree.set_deferred(leaf, "title", "c").unwrap();
    assert_eq!(tree.node(leaf).unwrap().config("title"), None);

    tree.render_to_body(leaf).unwrap();
    assert_eq!(title_calls(), vec![("c".to_string(), None, RenderState::Rendered)]);

    tree.set_deferred(leaf, "title", "d").unwrap();
    assert_eq!(
        title_calls().last(),
        Some(&("d".to_string(), Some("c".to_string()), RenderState::AfterRender))
    );
}

#[test]
fn operations_out_of_order_fail_fast() {
    let mut tree = tree();
    let leaf = tree.create_with_id(Leaf, "early");

    let err = tree.materialize(leaf).unwrap_err();
    assert_eq!(
        err,
        RenderError::InvalidStateTransition {
            node: "early".into(),
            operation: "materialize",
            state: RenderState::Unrendered,
        }
    );
    assert!(matches!(
        tree.finalize(leaf),
        Err(RenderError::InvalidStateTransition { operation: "finalize", .. })
    ));
    assert!(matches!(tree.flush(99, RenderState::Rendered), Err(RenderError::UnknownNode { id: 99 })));
}

#[test]
fn missing_structural_reference_is_an_error() {
    let mut tree = tree();
    let broken = tree.create_with_id(Broken, "broken");
    let err = tree.render_to_body(broken).unwrap_err();
    assert_eq!(
        err,
        RenderError::StructuralReferenceMissing {
            node: "broken".into(),
            reference: "iconEl".into(),
        }
    );
}

#[test]
fn classes_set_before_render_reach_the_root_element() {
    let mut tree = tree();
    let leaf = tree.create(Leaf);
    tree.add_cls(leaf, "custom").unwrap();
    tree.set_deferred(leaf, "ui", "dark").unwrap();
    tree.set_deferred(leaf, "width", 120).unwrap();
    tree.render_to_body(leaf).unwrap();

    let el = tree.element(leaf).unwrap().unwrap();
    let host = tree.host();
    assert!(host.has_class(el, "x-leaf"));
    assert!(host.has_class(el, "custom"));
    assert!(host.has_class(el, "x-leaf-dark"));
    assert!(!host.has_class(el, "x-leaf-default"));
    assert_eq!(host.inline_style(el, "width"), Some("120px"));
}

#[test]
fn framed_node_composes_frame_and_keeps_content_inside() {
    let mut tree = legacy_tree();
    let panel = tree.create_with_id(Boxy { framed: true }, "panel");
    tree.set_deferred(panel, "html", "hello").unwrap();
    tree.render_to_body(panel).unwrap();

    let node = tree.node(panel).unwrap();
    let frame = node.frame().unwrap();
    assert_eq!(frame.radius.to_array(), [2, 2, 2, 2]);
    assert_eq!(frame.border.to_array(), [1, 1, 1, 1]);
    assert_eq!(frame.padding.to_array(), [3, 3, 3, 3]);
    assert_eq!(frame.extent.to_array(), [2, 2, 2, 2]);
    assert_eq!(node.frame_generation(), 1);

    let host = tree.host();
    let el = node.element().unwrap();
    assert!(host.has_class(el, "x-boxy-default-framed"));
    let frame_body = node.reference("frameBody").unwrap();
    assert_eq!(host.dom_id(frame_body), Some("panel-frame1Body"));
    let body = node.reference("body").unwrap();
    assert_eq!(host.parent(body), Some(frame_body));
    assert_eq!(host.text(body), "hello");
    assert!(node.reference("frameTL").is_some());
}

#[test]
fn hosts_with_rounded_corners_never_frame() {
    let mut tree = tree();
    tree.host_mut()
        .add_rule("x-boxy-default-frameInfo", "font-family", PANEL_FRAME);
    let panel = tree.create(Boxy { framed: true });
    tree.render_to_body(panel).unwrap();
    assert!(!tree.node(panel).unwrap().is_framed());
    assert!(tree.frame_cache().is_empty());
}

#[test]
fn missing_encoding_disables_framing_and_is_not_retried() {
    let mut tree = tree();
    tree.host_mut().set_rounded_corners(false);
    let first = tree.create(Leaf);
    tree.set_deferred(first, "frame", true).unwrap();
    tree.render_to_body(first).unwrap();
    assert!(!tree.node(first).unwrap().is_framed());

    tree.host_mut()
        .add_rule("x-leaf-default-frameInfo", "font-family", PANEL_FRAME);
    let second = tree.create(Leaf);
    tree.set_deferred(second, "frame", true).unwrap();
    tree.render_to_body(second).unwrap();
    assert!(!tree.node(second).unwrap().is_framed());
    assert_eq!(tree.frame_cache().len(), 1);
}

#[test]
fn frame_geometry_is_shared_per_style() {
    let mut tree = legacy_tree();
    let a = tree.create(Boxy { framed: true });
    let b = tree.create(Boxy { framed: true });
    tree.render_to_body(a).unwrap();
    tree.render_to_body(b).unwrap();
    let fa = tree.node(a).unwrap().frame.clone().unwrap();
    let fb = tree.node(b).unwrap().frame.clone().unwrap();
    assert!(Rc::ptr_eq(&fa, &fb));
    assert_eq!(tree.frame_cache().len(), 1);
}

#[test]
fn docked_items_surround_the_body_and_mirror_under_rtl() {
    for rtl in [false, true] {
        let mut tree = tree();
        let owner = tree.create(Boxy { framed: false });
        let top = tree.create_with_id(Leaf, "top");
        let left = tree.create_with_id(Leaf, "left");
        let bottom = tree.create_with_id(Leaf, "bottom");
        tree.add_docked(owner, top, Dock::Top).unwrap();
        tree.add_docked(owner, left, Dock::Left).unwrap();
        tree.add_docked(owner, bottom, Dock::Bottom).unwrap();
        tree.set_deferred(owner, "rtl", rtl).unwrap();
        tree.render_to_body(owner).unwrap();

        let host = tree.host();
        let el = tree.element(owner).unwrap().unwrap();
        let order: Vec<String> = host
            .children(el)
            .into_iter()
            .filter_map(|child| host.dom_id(child).map(str::to_string))
            .collect();
        let body = tree.node(owner).unwrap().reference("body").unwrap();
        let body_id = host.dom_id(body).unwrap().to_string();
        let expected = if rtl {
            vec!["top".to_string(), body_id, "left".into(), "bottom".into()]
        } else {
            vec!["top".to_string(), "left".into(), body_id, "bottom".into()]
        };
        assert_eq!(order, expected);
    }
}

#[test]
fn framed_owner_renders_docked_items_once() {
    let mut tree = legacy_tree();
    let owner = tree.create(Boxy { framed: true });
    let header = tree.create_with_id(Leaf, "header");
    tree.add_docked(owner, header, Dock::Top).unwrap();
    tree.render_to_body(owner).unwrap();

    let el = tree.element(owner).unwrap().unwrap();
    let header_el = tree.element(header).unwrap().unwrap();
    assert_eq!(tree.host().parent(header_el), Some(el));
    assert_eq!(tree.host().children(el).first().copied(), Some(header_el));
}

#[test]
fn presupplied_child_element_replaces_its_placeholder() {
    let mut tree = tree();
    let owner = tree.create(Boxy { framed: false });
    let first = tree.create(Leaf);
    let adopted = tree.create_with_id(Leaf, "adopted");
    tree.add_child(owner, first).unwrap();
    tree.add_child(owner, adopted).unwrap();
    let existing = tree
        .host_mut()
        .create(&ElementMarkup::new("section").with_id("adopted").with_child(Markup::text("kept")).into())
        .unwrap();
    tree.adopt_element(adopted, existing).unwrap();

    tree.render_to_body(owner).unwrap();

    let host = tree.host();
    assert_eq!(host.element_by_id("adopted-placeholder"), None);
    let body = tree.node(owner).unwrap().reference("body").unwrap();
    let first_el = tree.element(first).unwrap().unwrap();
    assert_eq!(host.children(body), vec![first_el, existing]);
    assert!(host.has_class(existing, "x-leaf"));
    let title = tree.node(adopted).unwrap().reference("titleEl").unwrap();
    assert_eq!(host.children(existing).first().copied(), Some(title));
    assert_eq!(host.text(existing), "kept");
    assert_eq!(tree.state(adopted).unwrap(), RenderState::AfterRender);
}

#[test]
fn presupplied_root_is_framed_on_finalize() {
    let mut tree = legacy_tree();
    let panel = tree.create_with_id(Boxy { framed: true }, "legacy");
    let existing = tree
        .host_mut()
        .create(&ElementMarkup::new("div").with_id("legacy").with_child(Markup::text("old")).into())
        .unwrap();
    tree.adopt_element(panel, existing).unwrap();
    tree.render_to_body(panel).unwrap();

    let node = tree.node(panel).unwrap();
    let host = tree.host();
    let tl = node.reference("frameTL").unwrap();
    assert_eq!(host.children(existing).first().copied(), Some(tl));
    let frame_body = node.reference("frameBody").unwrap();
    let body = node.reference("body").unwrap();
    assert_eq!(host.parent(body), Some(frame_body));
    assert_eq!(host.text(frame_body), "old");
    assert_eq!(host.parent(existing), Some(host.body()));
}

#[test]
fn adopting_after_render_started_is_rejected() {
    let mut tree = tree();
    let leaf = tree.create(Leaf);
    tree.render_to_body(leaf).unwrap();
    let other = tree.host_mut().create(&Markup::text("x")).unwrap();
    assert!(matches!(
        tree.adopt_element(leaf, other),
        Err(RenderError::InvalidStateTransition { operation: "adopt_element", .. })
    ));
}

#[test]
fn content_template_and_content_el_fill_the_content_target() {
    let mut tree = tree();
    let panel = tree.create(Boxy { framed: false });
    let mut data = RenderData::new();
    data.insert("name".into(), Value::from("Ada"));
    tree.set_content_template(
        panel,
        Rc::new(Template::new(vec![TemplateNode::text("Hello {name}")])),
        data,
    )
    .unwrap();
    let content = tree
        .host_mut()
        .create(&ElementMarkup::new("p").with_class("x-hidden").with_class("keep").into())
        .unwrap();
    tree.set_content_el(panel, content).unwrap();
    tree.render_to_body(panel).unwrap();

    let host = tree.host();
    let body = tree.node(panel).unwrap().reference("body").unwrap();
    assert_eq!(host.parent(content), Some(body));
    assert!(!host.has_class(content, "x-hidden"));
    assert!(host.has_class(content, "keep"));
    assert_eq!(host.text(body), "Hello Ada");

    let mut data = RenderData::new();
    data.insert("name".into(), Value::from("Grace"));
    tree.set_content_template(
        panel,
        Rc::new(Template::new(vec![TemplateNode::text("Bye {name}")])),
        data,
    )
    .unwrap();
    assert_eq!(tree.host().text(body), "Bye Grace");
}

#[test]
fn position_and_last_box_are_recorded() {
    let mut tree = tree();
    let leaf = tree.create(Leaf);
    tree.set_deferred(leaf, "x", 10).unwrap();
    tree.set_deferred(leaf, "y", 20).unwrap();
    tree.set_deferred(leaf, "height", 40).unwrap();
    tree.render_to_body(leaf).unwrap();

    let el = tree.element(leaf).unwrap().unwrap();
    assert_eq!(tree.host().inline_style(el, "left"), Some("10px"));
    assert_eq!(tree.host().inline_style(el, "top"), Some("20px"));
    assert_eq!(
        tree.node(leaf).unwrap().last_box(),
        Some(LastBox {
            x: Some(10),
            y: Some(20),
            width: None,
            height: Some(40),
        })
    );
    tree.set_deferred(leaf, "x", 15).unwrap();
    assert_eq!(tree.host().inline_style(el, "left"), Some("15px"));
}

#[test]
fn render_respects_insert_position_and_ct_cls() {
    let mut tree = tree();
    let body = tree.host().body();
    let first = tree.create(Leaf);
    tree.render(first, body, None).unwrap();
    let second = tree.create(Leaf);
    tree.set_deferred(second, "ctCls", "has-leaves").unwrap();
    tree.render(second, body, Some(InsertPosition::Index(0))).unwrap();

    let host = tree.host();
    let second_el = tree.element(second).unwrap().unwrap();
    let first_el = tree.element(first).unwrap().unwrap();
    assert_eq!(host.children(body), vec![second_el, first_el]);
    assert!(host.has_class(body, "has-leaves"));
}

#[test]
fn child_ct_cls_reaches_the_owner_body() {
    let mut tree = tree();
    let owner = tree.create(Boxy { framed: false });
    let leaf = tree.create(Leaf);
    tree.set_deferred(leaf, "ctCls", "has-leaves").unwrap();
    tree.add_child(owner, leaf).unwrap();

    tree.render_to_body(owner).unwrap();

    let body = tree.node(owner).unwrap().reference("body").unwrap();
    let leaf_el = tree.element(leaf).unwrap().unwrap();
    assert_eq!(tree.host().children(body), vec![leaf_el]);
    assert!(tree.host().has_class(body, "has-leaves"));
    assert_eq!(tree.node(leaf).unwrap().container(), Some(body));
}

#[test]
fn root_layouts_run_once_per_render_pass() {
    reset_calls();
    let batches = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&batches);
    let gate = LayoutGate::new(move |roots: &[NodeId]| sink.borrow_mut().push(roots.to_vec()));
    let mut tree = ComponentTree::with_services(
        MemoryHost::new(),
        EngineConfig::default(),
        FrameInfoCache::new(),
        gate.clone(),
    );
    let owner = tree.create(Boxy { framed: false });
    let child = tree.create(Leaf);
    tree.add_child(owner, child).unwrap();
    tree.render_to_body(owner).unwrap();
    assert_eq!(*batches.borrow(), vec![vec![owner]]);

    let a = tree.create(Leaf);
    let b = tree.create(Leaf);
    {
        let _batch = tree.suspend_layouts();
        tree.render_to_body(a).unwrap();
        tree.render_to_body(b).unwrap();
        assert_eq!(batches.borrow().len(), 1);
    }
    assert_eq!(batches.borrow().last(), Some(&vec![a, b]));
    assert!(!gate.is_suspended());
}

#[test]
fn layout_runner_may_suspend_its_own_gate() {
    reset_calls();
    let slot: Rc<RefCell<Option<LayoutGate>>> = Rc::default();
    let runs = Rc::new(RefCell::new(Vec::new()));
    let (handle, sink) = (Rc::clone(&slot), Rc::clone(&runs));
    let gate = LayoutGate::new(move |roots: &[NodeId]| {
        let gate = handle.borrow().clone();
        let _nested = gate.as_ref().map(LayoutGate::suspend);
        sink.borrow_mut().push(roots.to_vec());
    });
    *slot.borrow_mut() = Some(gate.clone());
    let mut tree = ComponentTree::with_services(
        MemoryHost::new(),
        EngineConfig::default(),
        FrameInfoCache::new(),
        gate.clone(),
    );
    let leaf = tree.create(Leaf);

    assert_eq!(tree.render_to_body(leaf).unwrap(), RenderOutcome::Rendered);

    assert_eq!(*runs.borrow(), vec![vec![leaf]]);
    assert_eq!(gate.runs(), 1);
    assert!(!gate.is_suspended());
    slot.borrow_mut().take();
}

#[test]
fn failed_render_still_releases_layouts() {
    let mut tree = tree();
    let broken = tree.create(Broken);
    assert!(tree.render_to_body(broken).is_err());
    assert!(!tree.layout_gate().is_suspended());
}

#[test]
fn child_added_after_render_is_rendered_in_place() {
    let mut tree = tree();
    let owner = tree.create(Boxy { framed: false });
    let first = tree.create(Leaf);
    let last = tree.create(Leaf);
    tree.add_child(owner, first).unwrap();
    tree.add_child(owner, last).unwrap();
    tree.render_to_body(owner).unwrap();

    let middle = tree.create(Leaf);
    tree.insert_child(owner, 1, middle).unwrap();

    let body = tree.node(owner).unwrap().reference("body").unwrap();
    let ids: Vec<ElementId> = [first, middle, last]
        .iter()
        .map(|&id| tree.element(id).unwrap().unwrap())
        .collect();
    assert_eq!(tree.host().children(body), ids);
    assert_eq!(tree.state(middle).unwrap(), RenderState::AfterRender);
}

#[test]
fn hierarchy_cycles_and_second_owners_are_rejected() {
    let mut tree = tree();
    let a = tree.create(Boxy { framed: false });
    let b = tree.create(Boxy { framed: false });
    let c = tree.create(Leaf);
    tree.add_child(a, b).unwrap();
    assert!(matches!(tree.add_child(b, a), Err(RenderError::InvalidHierarchy { .. })));
    assert!(matches!(tree.add_child(a, a), Err(RenderError::InvalidHierarchy { .. })));
    tree.add_child(b, c).unwrap();
    assert!(matches!(tree.add_child(a, c), Err(RenderError::InvalidHierarchy { .. })));
    assert_eq!(tree.root_of(c).unwrap(), a);
}

#[test]
fn destroy_removes_elements_and_keeps_frame_cache() {
    let mut tree = legacy_tree();
    let owner = tree.create(Boxy { framed: true });
    let child = tree.create(Leaf);
    tree.add_child(owner, child).unwrap();
    tree.on(child, LifecycleEventKind::Render, |_| Flow::Continue)
        .unwrap();
    tree.render_to_body(owner).unwrap();
    let child_el = tree.element(child).unwrap().unwrap();

    tree.destroy(child).unwrap();
    assert!(tree.node(child).is_err());
    assert!(tree.children(owner).unwrap().is_empty());
    assert_eq!(tree.host().tag(child_el), None);

    tree.destroy(owner).unwrap();
    assert!(tree.is_empty());
    let body = tree.host().body();
    // Only the offscreen style proxy is left.
    assert_eq!(tree.host().children(body).len(), 1);
    assert_eq!(tree.frame_cache().len(), 1);
}

#[test]
fn flush_never_runs_ahead_of_the_node_state() {
    let mut tree = tree();
    let leaf = tree.create(Leaf);
    tree.set_deferred(leaf, "title", "early").unwrap();
    assert_eq!(tree.flush(leaf, RenderState::AfterRender).unwrap(), 0);
    assert_eq!(tree.node(leaf).unwrap().pending("title"), Some(&Value::from("early")));
}

thread_local! {
    static HOOKS: RefCell<Vec<(&'static str, RenderState, Option<String>)>> =
        RefCell::new(Vec::new());
}

/// Records when its hooks run and what configuration they see.
struct Hooked;

impl Widget for Hooked {
    fn xtype(&self) -> &'static str {
        "hooked"
    }

    fn before_render(&self, node: &mut ComponentNode) {
        let ui = node.config_str("ui").map(str::to_string);
        HOOKS.with(|hooks| hooks.borrow_mut().push(("before", node.state(), ui)));
        node.proto_mut().add_class("hooked-early");
    }

    fn after_render(&self, cx: &mut ApplyContext<'_>) -> Result<(), RenderError> {
        let ui = cx.node.config_str("ui").map(str::to_string);
        HOOKS.with(|hooks| hooks.borrow_mut().push(("after", cx.node.state(), ui)));
        cx.add_cls("hooked-late")
    }
}

#[test]
fn widget_hooks_run_after_their_state_is_entered() {
    HOOKS.with(|hooks| hooks.borrow_mut().clear());
    let mut tree = tree();
    let node = tree.create(Hooked);
    tree.set_deferred(node, "ui", "plain").unwrap();
    tree.render_to_body(node).unwrap();

    assert_eq!(
        HOOKS.with(|hooks| hooks.borrow().clone()),
        vec![
            ("before", RenderState::BeforeRender, Some("plain".to_string())),
            ("after", RenderState::AfterRender, Some("plain".to_string())),
        ]
    );
    let el = tree.element(node).unwrap().unwrap();
    assert!(tree.host().has_class(el, "hooked-early"));
    assert!(tree.host().has_class(el, "hooked-late"));
    assert!(tree.host().has_class(el, "x-component-plain"));
}
