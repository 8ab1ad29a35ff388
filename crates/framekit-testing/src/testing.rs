use std::cell::{Cell, RefCell};
use std::rc::Rc;

use framekit_core::{
    ComponentTree, EngineConfig, Flow, Host, LifecycleEvent, LifecycleEventKind, ListenerId,
    MemoryHost, NodeId, RenderError, RenderState, StyleKey,
};

/// Installs a test logger once; later calls are no-ops.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Owned copy of a lifecycle notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub node: NodeId,
    pub key: String,
    pub xtype: &'static str,
    pub kind: LifecycleEventKind,
    pub state: RenderState,
}

impl From<&LifecycleEvent<'_>> for RecordedEvent {
    fn from(event: &LifecycleEvent<'_>) -> Self {
        Self {
            node: event.node,
            key: event.key.to_string(),
            xtype: event.xtype,
            kind: event.kind,
            state: event.state,
        }
    }
}

/// Records every lifecycle notification of a tree, in delivery order.
#[derive(Clone)]
pub struct LifecycleRecorder {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
    listener: ListenerId,
}

impl LifecycleRecorder {
    pub fn attach<H: Host>(tree: &mut ComponentTree<H>) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let listener = tree.observe(move |event| {
            sink.borrow_mut().push(RecordedEvent::from(event));
            Flow::Continue
        });
        Self { events, listener }
    }

    pub fn detach<H: Host>(&self, tree: &mut ComponentTree<H>) -> bool {
        tree.off(self.listener)
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Keys of the nodes that received `kind`, in order.
    pub fn keys(&self, kind: LifecycleEventKind) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.kind == kind)
            .map(|event| event.key.clone())
            .collect()
    }

    /// `(key, kind)` pairs in delivery order.
    pub fn sequence(&self) -> Vec<(String, LifecycleEventKind)> {
        self.events
            .borrow()
            .iter()
            .map(|event| (event.key.clone(), event.kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Vetoes the next `times` "before render" notifications of `id`.
/// Returns a counter of the vetoes still outstanding.
pub fn veto_renders<H: Host>(
    tree: &mut ComponentTree<H>,
    id: NodeId,
    times: usize,
) -> Result<Rc<Cell<usize>>, RenderError> {
    let remaining = Rc::new(Cell::new(times));
    let counter = Rc::clone(&remaining);
    tree.on(id, LifecycleEventKind::BeforeRender, move |_| {
        match counter.get() {
            0 => Flow::Continue,
            left => {
                counter.set(left - 1);
                Flow::Veto
            }
        }
    })?;
    Ok(remaining)
}

/// Publishes `encoding` as the frame geometry of the `base_cls`/`ui` style,
/// the way a style sheet for hosts without rounded corners would.
pub fn register_frame_encoding(
    host: &mut MemoryHost,
    config: &EngineConfig,
    base_cls: &str,
    ui: &str,
    encoding: &str,
) {
    let key = StyleKey::new(&config.prefixed(base_cls), ui);
    host.add_rule(&key.proxy_class(), &config.frame_info_property, encoding);
}

/// Host without rounded corners publishing the given frame encodings,
/// keyed by `(base_cls, ui)`.
pub fn legacy_host(frames: &[(&str, &str, &str)]) -> MemoryHost {
    let config = EngineConfig::default();
    let mut host = MemoryHost::without_rounded_corners();
    for (base_cls, ui, encoding) in frames {
        register_frame_encoding(&mut host, &config, base_cls, ui, encoding);
    }
    host
}

/// Tree over a legacy host, with a recorder attached.
pub fn recorded_tree(frames: &[(&str, &str, &str)]) -> (ComponentTree<MemoryHost>, LifecycleRecorder) {
    init_test_logging();
    let mut tree = ComponentTree::new(legacy_host(frames));
    let recorder = LifecycleRecorder::attach(&mut tree);
    (tree, recorder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use framekit_core::{ElementMarkup, Widget};

    struct Plain;

    impl Widget for Plain {
        fn xtype(&self) -> &'static str {
            "plain"
        }
    }

    #[test]
    fn recorder_sees_every_notification() {
        let (mut tree, recorder) = recorded_tree(&[]);
        let node = tree.create_with_id(Plain, "plain");
        tree.render_to_body(node).unwrap();
        assert_eq!(
            recorder.sequence(),
            vec![
                ("plain".to_string(), LifecycleEventKind::BeforeRender),
                ("plain".to_string(), LifecycleEventKind::Render),
                ("plain".to_string(), LifecycleEventKind::AfterRender),
            ]
        );
        assert!(recorder.detach(&mut tree));
    }

    #[test]
    fn vetoes_run_out() {
        let mut tree = ComponentTree::new(MemoryHost::new());
        let node = tree.create(Plain);
        let remaining = veto_renders(&mut tree, node, 2).unwrap();
        assert_eq!(tree.render_to_body(node).unwrap(), framekit_core::RenderOutcome::Vetoed);
        assert_eq!(tree.render_to_body(node).unwrap(), framekit_core::RenderOutcome::Vetoed);
        assert_eq!(remaining.get(), 0);
        assert_eq!(tree.render_to_body(node).unwrap(), framekit_core::RenderOutcome::Rendered);
    }

    #[test]
    fn frame_encoding_lands_on_the_proxy_class() {
        let mut host = legacy_host(&[("panel", "default", "dh-1-1-1-1-1-1-1-1-0-0-0-0")]);
        let proxy = host
            .create(&ElementMarkup::new("div").with_class("x-panel-default-frameInfo").into())
            .unwrap();
        assert_eq!(
            host.computed_style(proxy, "font-family").as_deref(),
            Some("dh-1-1-1-1-1-1-1-1-0-0-0-0")
        );
    }
}
