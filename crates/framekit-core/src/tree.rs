//! The component tree: node arena, lifecycle driver and composition glue.

use std::rc::Rc;

use crate::composer::{
    frame_render_data, frame_template, NoSlots, ReferenceLog, SlotDelegate, TemplateComposer,
};
use crate::config::{ApplyContext, DEFAULT_UI};
use crate::engine_config::EngineConfig;
use crate::frame::{FrameGeometryResolver, FrameInfoCache, StyleKey};
use crate::layout::{LayoutGate, LayoutSuspension};
use crate::lifecycle::{LifecycleEventKind, RenderState};
use crate::markup::{ElementMarkup, Markup};
use crate::node::{ComponentNode, Dock, LastBox, Placement};
use crate::observer::{Flow, LifecycleEvent, ListenerId, Listeners};
use crate::platform::{ElementId, Host, Selector};
use crate::template::{Slot, Template};
use crate::value::{RenderData, Value};
use crate::walker;
use crate::widget::Widget;
use crate::{FrameInfo, NodeId, RenderError};

/// Where a rendered root lands inside its container.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsertPosition {
    /// Before the container's child at this index; appended when out of range.
    Index(usize),
    /// Before this element.
    Before(ElementId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// A "before render" listener declined. The node is still unrendered.
    Vetoed,
    /// The node was already past the unrendered state; nothing was done.
    AlreadyRendered,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BeginRender {
    Proceed,
    Vetoed,
    AlreadyStarted,
}

fn node_ref(nodes: &[Option<ComponentNode>], id: NodeId) -> Result<&ComponentNode, RenderError> {
    nodes
        .get(id)
        .and_then(Option::as_ref)
        .ok_or(RenderError::UnknownNode { id })
}

fn node_mut(
    nodes: &mut [Option<ComponentNode>],
    id: NodeId,
) -> Result<&mut ComponentNode, RenderError> {
    nodes
        .get_mut(id)
        .and_then(Option::as_mut)
        .ok_or(RenderError::UnknownNode { id })
}

fn invalid(node: &ComponentNode, operation: &'static str) -> RenderError {
    RenderError::InvalidStateTransition {
        node: node.key.clone(),
        operation,
        state: node.state,
    }
}

fn missing(node: &str, reference: &str) -> RenderError {
    RenderError::StructuralReferenceMissing {
        node: node.to_string(),
        reference: reference.to_string(),
    }
}

fn frame_data(
    config: &EngineConfig,
    node: &ComponentNode,
    data: &RenderData,
    frame: &FrameInfo,
    frame_id: &str,
) -> RenderData {
    let base = config.prefixed(node.widget.base_cls());
    let ui = node.config_str("ui").unwrap_or(DEFAULT_UI);
    frame_render_data(
        data,
        frame,
        frame_id,
        &config.prefixed("frame"),
        &base,
        ui,
        node.widget.ui_cls(),
    )
}

/// Owns every node of a component hierarchy and drives their rendering
/// against one host.
pub struct ComponentTree<H: Host> {
    nodes: Vec<Option<ComponentNode>>,
    host: H,
    config: EngineConfig,
    resolver: FrameGeometryResolver,
    layouts: LayoutGate,
    listeners: Listeners,
    next_auto_id: usize,
}

impl<H: Host> ComponentTree<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: H, config: EngineConfig) -> Self {
        Self::with_services(host, config, FrameInfoCache::new(), LayoutGate::default())
    }

    /// Builds a tree around shared services, e.g. one frame cache and one
    /// layout gate for several trees.
    pub fn with_services(
        host: H,
        config: EngineConfig,
        frames: FrameInfoCache,
        layouts: LayoutGate,
    ) -> Self {
        let resolver = FrameGeometryResolver::new(frames, &config);
        Self {
            nodes: Vec::new(),
            host,
            next_auto_id: config.auto_id_base,
            config,
            resolver,
            layouts,
            listeners: Listeners::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn frame_cache(&self) -> &FrameInfoCache {
        self.resolver.cache()
    }

    pub fn layout_gate(&self) -> &LayoutGate {
        &self.layouts
    }

    pub fn suspend_layouts(&self) -> LayoutSuspension {
        self.layouts.suspend()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Result<&ComponentNode, RenderError> {
        node_ref(&self.nodes, id)
    }

    pub fn state(&self, id: NodeId) -> Result<RenderState, RenderError> {
        Ok(self.node(id)?.state)
    }

    pub fn element(&self, id: NodeId) -> Result<Option<ElementId>, RenderError> {
        Ok(self.node(id)?.element)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], RenderError> {
        Ok(self.node(id)?.children())
    }

    /// Node with the given key.
    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.as_ref().is_some_and(|node| node.key == key))
    }

    pub fn create(&mut self, widget: impl Widget + 'static) -> NodeId {
        self.create_shared(Rc::new(widget), None)
    }

    pub fn create_with_id(&mut self, widget: impl Widget + 'static, key: impl Into<String>) -> NodeId {
        self.create_shared(Rc::new(widget), Some(key.into()))
    }

    pub fn create_shared(&mut self, widget: Rc<dyn Widget>, key: Option<String>) -> NodeId {
        let key = key.unwrap_or_else(|| {
            let key = format!("{}-{}", widget.xtype(), self.next_auto_id);
            self.next_auto_id += 1;
            key
        });
        let id = self.nodes.len();
        log::trace!("created {key} ({})", widget.xtype());
        self.nodes.push(Some(ComponentNode::new(key, widget)));
        id
    }

    pub fn add_child(&mut self, owner: NodeId, child: NodeId) -> Result<(), RenderError> {
        self.attach(owner, child, Placement::Item, None)
    }

    pub fn insert_child(
        &mut self,
        owner: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), RenderError> {
        self.attach(owner, child, Placement::Item, Some(index))
    }

    pub fn add_docked(&mut self, owner: NodeId, child: NodeId, dock: Dock) -> Result<(), RenderError> {
        self.attach(owner, child, Placement::Docked(dock), None)
    }

    fn attach(
        &mut self,
        owner: NodeId,
        child: NodeId,
        placement: Placement,
        index: Option<usize>,
    ) -> Result<(), RenderError> {
        if owner == child || self.is_ancestor(child, owner)? {
            return Err(RenderError::InvalidHierarchy {
                message: format!("node {child} cannot own its own ancestor {owner}"),
            });
        }
        let node = node_mut(&mut self.nodes, child)?;
        if let Some(current) = node.owner {
            return Err(RenderError::InvalidHierarchy {
                message: format!("{} already belongs to node {current}", node.key),
            });
        }
        node.owner = Some(owner);
        node.placement = placement;
        let child_state = node.state;

        let owner_node = node_mut(&mut self.nodes, owner)?;
        let index = index
            .unwrap_or(owner_node.children.len())
            .min(owner_node.children.len());
        owner_node.children.insert(index, child);

        if owner_node.state == RenderState::AfterRender && child_state == RenderState::Unrendered {
            self.render_into_owner(owner, child, index)?;
        }
        Ok(())
    }

    /// Renders a child added to an owner that is already rendered.
    fn render_into_owner(
        &mut self,
        owner: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), RenderError> {
        let owner_node = self.node(owner)?;
        let placement = self.node(child)?.placement;
        let (target, position) = match placement {
            Placement::Item => {
                let target = owner_node
                    .content_target()
                    .ok_or_else(|| missing(&owner_node.key, "el"))?;
                let next_sibling = owner_node.children[index + 1..]
                    .iter()
                    .filter_map(|&sibling| node_ref(&self.nodes, sibling).ok())
                    .filter(|sibling| sibling.placement == Placement::Item)
                    .find_map(|sibling| sibling.element);
                (target, next_sibling.map(InsertPosition::Before))
            }
            Placement::Docked(dock) => {
                let target = owner_node
                    .element
                    .ok_or_else(|| missing(&owner_node.key, "el"))?;
                let before = self.effective_dock(owner, dock)?.renders_before();
                (target, before.then_some(InsertPosition::Index(0)))
            }
        };
        let _suspension = self.layouts.suspend();
        self.render(child, target, position)?;
        let root = self.root_of(owner)?;
        self.layouts.request(root);
        Ok(())
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> Result<bool, RenderError> {
        let mut current = self.node(node)?.owner;
        while let Some(id) = current {
            if id == candidate {
                return Ok(true);
            }
            current = self.node(id)?.owner;
        }
        Ok(false)
    }

    pub fn root_of(&self, id: NodeId) -> Result<NodeId, RenderError> {
        let mut current = id;
        while let Some(owner) = self.node(current)?.owner {
            current = owner;
        }
        Ok(current)
    }

    /// Dock edge after right-to-left mirroring by the owner.
    pub fn effective_dock(&self, owner: NodeId, dock: Dock) -> Result<Dock, RenderError> {
        Ok(if self.node(owner)?.config_flag("rtl") {
            dock.mirrored()
        } else {
            dock
        })
    }

    /// Sets a configuration value using the threshold registered for `key`.
    pub fn set_deferred(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), RenderError> {
        let threshold = self.node(id)?.widget.config_table().threshold(key);
        self.set_deferred_at(id, key, value, threshold)
    }

    /// Applies now when the node has reached `threshold`, otherwise buffers
    /// the value until it does.
    pub fn set_deferred_at(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<Value>,
        threshold: RenderState,
    ) -> Result<(), RenderError> {
        let value = value.into();
        let node = node_mut(&mut self.nodes, id)?;
        let current = node.config.get(key).cloned();
        if node.state >= threshold {
            node.pending.discard(key);
            return self.apply_config(id, key, value, current);
        }
        log::trace!("{}: deferring {key} until {threshold}", node.key);
        node.pending.buffer(key, value, threshold, current);
        Ok(())
    }

    /// Applies buffered configuration for every threshold up to `upto`,
    /// never beyond the node's current state. Returns the number applied.
    pub fn flush(&mut self, id: NodeId, upto: RenderState) -> Result<usize, RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        let upto = upto.min(node.state);
        let drained = node.pending.drain_upto(upto);
        if !drained.is_empty() {
            log::trace!("{}: flushing {} deferred value(s) up to {upto}", node.key, drained.len());
        }
        let count = drained.len();
        for (key, entry) in drained {
            self.apply_config(id, &key, entry.value, entry.previous)?;
        }
        Ok(count)
    }

    fn apply_config(
        &mut self,
        id: NodeId,
        key: &str,
        value: Value,
        previous: Option<Value>,
    ) -> Result<(), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        let setter = node.widget.config_table().setter(key);
        node.config.insert(key.to_string(), value.clone());
        let mut cx = ApplyContext {
            node,
            host: &mut self.host,
            css_prefix: &self.config.css_prefix,
        };
        setter(&mut cx, &value, previous.as_ref())
    }

    /// Runs `f` with mutable access to a node and the host.
    pub fn with_context<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut ApplyContext<'_>) -> Result<R, RenderError>,
    ) -> Result<R, RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        let mut cx = ApplyContext {
            node,
            host: &mut self.host,
            css_prefix: &self.config.css_prefix,
        };
        f(&mut cx)
    }

    pub fn add_cls(&mut self, id: NodeId, cls: &str) -> Result<(), RenderError> {
        self.with_context(id, |cx| cx.add_cls(cls))
    }

    pub fn remove_cls(&mut self, id: NodeId, cls: &str) -> Result<(), RenderError> {
        self.with_context(id, |cx| cx.remove_cls(cls))
    }

    /// Sets the content template and its data. A rendered node recomposes
    /// its content target right away.
    pub fn set_content_template(
        &mut self,
        id: NodeId,
        template: Rc<Template>,
        data: RenderData,
    ) -> Result<(), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        node.content_template = Some(Rc::clone(&template));
        node.data = data;
        if !node.is_rendered() {
            return Ok(());
        }
        let target = node
            .content_target()
            .ok_or_else(|| missing(&node.key, "el"))?;
        let markup =
            TemplateComposer::new(template).compose(&node.data, &mut NoSlots, &mut ReferenceLog::default())?;
        self.host.set_text(target, "")?;
        for child in &markup {
            let created = self.host.create(child)?;
            self.host.append(target, created)?;
        }
        Ok(())
    }

    /// Renders the node into an existing element instead of creating one.
    pub fn adopt_element(&mut self, id: NodeId, element: ElementId) -> Result<(), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        if node.state != RenderState::Unrendered {
            return Err(invalid(node, "adopt_element"));
        }
        node.element = Some(element);
        node.needs_render_tpl = true;
        Ok(())
    }

    /// Element moved into the content target when the node is finalized.
    pub fn set_content_el(&mut self, id: NodeId, element: ElementId) -> Result<(), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        node.content_el = Some(element);
        if node.state == RenderState::AfterRender {
            self.inject_content_el(id)?;
        }
        Ok(())
    }

    /// Listens to one lifecycle event of one node.
    pub fn on(
        &mut self,
        id: NodeId,
        kind: LifecycleEventKind,
        listener: impl FnMut(&LifecycleEvent<'_>) -> Flow + 'static,
    ) -> Result<ListenerId, RenderError> {
        self.node(id)?;
        Ok(self.listeners.on_node(id, kind, Box::new(listener)))
    }

    /// Listens to every lifecycle event of every node.
    pub fn observe(
        &mut self,
        listener: impl FnMut(&LifecycleEvent<'_>) -> Flow + 'static,
    ) -> ListenerId {
        self.listeners.on_tree(Box::new(listener))
    }

    pub fn off(&mut self, listener: ListenerId) -> bool {
        self.listeners.remove(listener)
    }

    fn fire(&mut self, id: NodeId, kind: LifecycleEventKind) -> Result<Flow, RenderError> {
        let node = node_ref(&self.nodes, id)?;
        let event = LifecycleEvent {
            kind,
            node: id,
            key: &node.key,
            xtype: node.widget.xtype(),
            state: node.state,
            owner: node.owner,
        };
        Ok(self.listeners.dispatch(&event))
    }

    fn transition(&mut self, id: NodeId, to: RenderState) -> Result<(), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        let from = node.state;
        match from.advance(to) {
            Ok(next) => node.state = next,
            Err(_) => return Err(invalid(node, to.name())),
        }
        log::trace!("{}: {from} -> {to}", node.key);
        Ok(())
    }

    /// Renders `id` and its subtree into `container`.
    ///
    /// Layouts stay suspended for the whole pass and run once afterwards,
    /// whether or not the pass succeeds.
    pub fn render(
        &mut self,
        id: NodeId,
        container: ElementId,
        position: Option<InsertPosition>,
    ) -> Result<RenderOutcome, RenderError> {
        let _suspension = self.layouts.suspend();
        match self.begin_render(id)? {
            BeginRender::Vetoed => return Ok(RenderOutcome::Vetoed),
            BeginRender::AlreadyStarted => return Ok(RenderOutcome::AlreadyRendered),
            BeginRender::Proceed => {}
        }
        let node = node_mut(&mut self.nodes, id)?;
        node.container = Some(container);
        if node.element.is_none() {
            let markup = self.element_markup(id, true)?;
            node_mut(&mut self.nodes, id)?.description = Some(markup.into());
        }
        walker::finish_render(self, id, position)?;
        walker::finish_after_render(self, id)?;
        Ok(RenderOutcome::Rendered)
    }

    pub fn render_to_body(&mut self, id: NodeId) -> Result<RenderOutcome, RenderError> {
        let body = self.host.body();
        self.render(id, body, None)
    }

    /// Fires "before render" and, unless vetoed, moves the node through
    /// the before-render state into rendering.
    pub fn begin_render(&mut self, id: NodeId) -> Result<BeginRender, RenderError> {
        let node = self.node(id)?;
        if node.state != RenderState::Unrendered {
            log::trace!("{} is already {}", node.key, node.state);
            return Ok(BeginRender::AlreadyStarted);
        }
        if self.fire(id, LifecycleEventKind::BeforeRender)? == Flow::Veto {
            log::debug!("render of {} vetoed", self.node(id)?.key);
            return Ok(BeginRender::Vetoed);
        }
        self.transition(id, RenderState::BeforeRender)?;
        self.flush(id, RenderState::BeforeRender)?;
        let node = node_mut(&mut self.nodes, id)?;
        let widget = Rc::clone(&node.widget);
        widget.before_render(node);
        self.init_frame(id)?;
        self.transition(id, RenderState::Rendering)?;
        self.flush(id, RenderState::Rendering)?;
        Ok(BeginRender::Proceed)
    }

    fn init_frame(&mut self, id: NodeId) -> Result<(), RenderError> {
        let node = node_ref(&self.nodes, id)?;
        let explicit = node.config_flag("frame");
        if !(explicit || node.widget.always_framed()) || self.host.supports_rounded_corners() {
            return Ok(());
        }
        let key = StyleKey::new(
            &self.config.prefixed(node.widget.base_cls()),
            node.config_str("ui").unwrap_or(DEFAULT_UI),
        );
        let frame = self.resolver.resolve(&mut self.host, &key, explicit)?;
        node_mut(&mut self.nodes, id)?.frame = frame;
        Ok(())
    }

    /// Data the node's templates are evaluated against.
    pub fn render_data(&self, id: NodeId) -> Result<RenderData, RenderError> {
        let node = self.node(id)?;
        let widget = &node.widget;
        let base = self.config.prefixed(widget.base_cls());
        let mut data: RenderData = node
            .config
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        data.insert("id".into(), Value::from(node.key.as_str()));
        data.insert(
            "ui".into(),
            Value::from(node.config_str("ui").unwrap_or(DEFAULT_UI)),
        );
        data.insert(
            "uiCls".into(),
            Value::List(widget.ui_cls().iter().map(|cls| Value::from(*cls)).collect()),
        );
        data.insert(
            "componentCls".into(),
            Value::from(
                widget
                    .component_cls()
                    .map(|cls| self.config.prefixed(cls))
                    .unwrap_or_else(|| base.clone()),
            ),
        );
        data.insert("baseCls".into(), Value::from(base));
        data.insert("prefix".into(), Value::from(self.config.css_prefix.as_str()));
        data.insert("frame".into(), Value::from(node.frame.is_some()));
        data.insert("role".into(), Value::from(widget.aria_role().unwrap_or("")));
        let owner = node.owner.and_then(|owner| node_ref(&self.nodes, owner).ok());
        widget.template_args(node, owner, &mut data);
        Ok(data)
    }

    /// Structural description of the node, or `None` if it was vetoed or
    /// had already started rendering. A node with a pre-supplied element is
    /// represented by a placeholder that is swapped for the element later.
    pub fn render_tree(&mut self, id: NodeId) -> Result<Option<Markup>, RenderError> {
        if self.begin_render(id)? != BeginRender::Proceed {
            return Ok(None);
        }
        let node = node_mut(&mut self.nodes, id)?;
        if node.element.is_some() {
            let placeholder = format!("{}-placeholder", node.key);
            node.placeholder = Some(placeholder.clone());
            return Ok(Some(ElementMarkup::new("div").with_id(placeholder).into()));
        }
        Ok(Some(self.element_markup(id, true)?.into()))
    }

    fn element_markup(&mut self, id: NodeId, allow_frame: bool) -> Result<ElementMarkup, RenderError> {
        let data = self.render_data(id)?;
        let (children, refs) = self.compose_inner(id, &data, allow_frame)?;
        let node = node_mut(&mut self.nodes, id)?;
        let widget = Rc::clone(&node.widget);
        let base = self.config.prefixed(widget.base_cls());
        let mut markup = ElementMarkup::new(widget.auto_el()).with_id(node.key.as_str());
        markup.add_class(base.as_str());
        if let Some(cls) = widget.component_cls() {
            markup.add_class(self.config.prefixed(cls));
        }
        if node.config("ui").is_none() {
            markup.add_class(format!("{base}-{DEFAULT_UI}"));
        }
        if allow_frame && node.frame.is_some() {
            let ui = node.config_str("ui").unwrap_or(DEFAULT_UI);
            markup.add_class(format!("{base}-{ui}-framed"));
        }
        if let Some(role) = widget.aria_role() {
            markup.attrs.insert("role".into(), role.into());
        }
        node.proto.write_to_markup(&mut markup);
        node.emitted.extend(refs);
        markup.children = children;
        Ok(markup)
    }

    fn compose_inner(
        &mut self,
        id: NodeId,
        data: &RenderData,
        allow_frame: bool,
    ) -> Result<(Vec<Markup>, ReferenceLog), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        let mut refs = ReferenceLog::default();
        let frame = node.frame.clone().filter(|_| allow_frame);
        let markup = match frame {
            Some(frame) => {
                node.frame_generation += 1;
                node.frame_applied = true;
                let frame_id = format!("{}-frame{}", node.key, node.frame_generation);
                let data = frame_data(&self.config, node, data, &frame, &frame_id);
                let composer = TemplateComposer::new(frame_template(&frame));
                let mut slots = NodeSlots::new(self, id, SlotMode::Framed);
                composer.compose(&data, &mut slots, &mut refs)?
            }
            None => {
                let composer = TemplateComposer::new(node.widget.render_template());
                let mut slots = NodeSlots::new(self, id, SlotMode::Plain);
                composer.compose(data, &mut slots, &mut refs)?
            }
        };
        Ok((markup, refs))
    }

    fn render_content(&mut self, id: NodeId, out: &mut Vec<Markup>) -> Result<(), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        if node.content_consumed {
            return Ok(());
        }
        node.content_consumed = true;
        if let Some(html) = node.config.get("html").filter(|html| html.is_truthy()) {
            out.push(Markup::text(html.to_string()));
        }
        if let Some(template) = node.content_template.clone() {
            let composer = TemplateComposer::new(template);
            out.extend(composer.compose(&node.data, &mut NoSlots, &mut ReferenceLog::default())?);
        }
        Ok(())
    }

    /// Produces or locates the node's element and puts it where it
    /// belongs: into its container for a render root, in place of its
    /// placeholder for a pre-supplied element.
    pub(crate) fn place_element(
        &mut self,
        id: NodeId,
        position: Option<InsertPosition>,
    ) -> Result<ElementId, RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        if node.state != RenderState::Rendering {
            return Err(invalid(node, "finish_render"));
        }
        if let (true, Some(element)) = (node.placed, node.element) {
            return Ok(element);
        }
        let element = match (node.element, node.description.take()) {
            (Some(element), _) => element,
            (None, Some(description)) => self.host.create(&description)?,
            (None, None) => self
                .host
                .element_by_id(&node.key)
                .ok_or_else(|| missing(&node.key, "el"))?,
        };
        node.element = Some(element);
        node.placed = true;
        let placeholder = node.placeholder.take();
        let needs_render_tpl = std::mem::take(&mut node.needs_render_tpl);
        let container = node.container;
        let ct_cls = node.config_str("ctCls").map(str::to_string);

        if let Some(placeholder) = placeholder {
            let stand_in = self
                .host
                .element_by_id(&placeholder)
                .ok_or_else(|| missing(&placeholder, "placeholder"))?;
            self.host.insert_before(element, stand_in)?;
            self.host.remove(stand_in)?;
        } else if let Some(container) = container {
            self.insert_into(container, element, position)?;
        }
        // Children composed into their owner find their container through
        // the element's parent.
        if let Some(container) = container.or_else(|| self.host.parent(element)) {
            node_mut(&mut self.nodes, id)?.container = Some(container);
            if let Some(ct_cls) = ct_cls {
                self.host.add_class(container, &ct_cls)?;
            }
        }
        if needs_render_tpl {
            self.apply_render_tpl(id, element)?;
        }
        Ok(element)
    }

    fn insert_into(
        &mut self,
        container: ElementId,
        element: ElementId,
        position: Option<InsertPosition>,
    ) -> Result<(), RenderError> {
        match position {
            None => self.host.append(container, element)?,
            Some(InsertPosition::Index(index)) => {
                match self.host.children(container).get(index).copied() {
                    Some(reference) if reference == element => {}
                    Some(reference) => self.host.insert_before(element, reference)?,
                    None => self.host.append(container, element)?,
                }
            }
            Some(InsertPosition::Before(reference)) => self.host.insert_before(element, reference)?,
        }
        Ok(())
    }

    /// Writes the composed root attributes onto a pre-supplied element and
    /// inserts the composed children ahead of what it already holds. The
    /// frame, if any, is added on finalize.
    fn apply_render_tpl(&mut self, id: NodeId, element: ElementId) -> Result<(), RenderError> {
        let markup = self.element_markup(id, false)?;
        for cls in &markup.classes {
            self.host.add_class(element, cls)?;
        }
        for (name, value) in &markup.attrs {
            self.host.set_attribute(element, name, value)?;
        }
        for (property, value) in &markup.styles {
            self.host.set_style(element, property, value)?;
        }
        self.prepend(element, &markup.children)?;
        Ok(())
    }

    fn prepend(&mut self, element: ElementId, children: &[Markup]) -> Result<(), RenderError> {
        let first = self.host.children(element).first().copied();
        for child in children {
            let created = self.host.create(child)?;
            match first {
                Some(first) => self.host.insert_before(created, first)?,
                None => self.host.append(element, created)?,
            }
        }
        Ok(())
    }

    /// Binds structural references, enters the rendered state, replays
    /// configuration waiting for it and fires "render".
    pub fn materialize(&mut self, id: NodeId) -> Result<(), RenderError> {
        let node = self.node(id)?;
        if node.state != RenderState::Rendering {
            return Err(invalid(node, "materialize"));
        }
        if !node.placed {
            self.place_element(id, None)?;
        }
        self.bind_references(id)?;
        self.transition(id, RenderState::Rendered)?;
        self.flush(id, RenderState::Rendered)?;
        self.record_last_box(id)?;
        self.fire(id, LifecycleEventKind::Render)?;
        Ok(())
    }

    fn bind_references(&mut self, id: NodeId) -> Result<(), RenderError> {
        let node = node_ref(&self.nodes, id)?;
        let element = node.element.ok_or_else(|| missing(&node.key, "el"))?;
        let mut bound = Vec::new();
        for (name, dom_id) in node.emitted.iter() {
            let found = self
                .host
                .element_by_id(dom_id)
                .ok_or_else(|| missing(&node.key, name))?;
            bound.push((name.to_string(), found));
        }
        for name in node.widget.child_els() {
            if node.emitted.contains(name) {
                continue;
            }
            let found = self
                .host
                .element_by_id(&format!("{}-{name}", node.key))
                .ok_or_else(|| missing(&node.key, name))?;
            bound.push((name.to_string(), found));
        }
        for (name, selector) in node.widget.render_selectors() {
            match self.host.query(element, &Selector::parse(selector)) {
                Some(found) => bound.push((name.to_string(), found)),
                None => log::trace!("{}: {selector} matched nothing for {name}", node.key),
            }
        }
        node_mut(&mut self.nodes, id)?.references.extend(bound);
        Ok(())
    }

    fn record_last_box(&mut self, id: NodeId) -> Result<(), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        let int = |key: &str| node.config(key).and_then(Value::as_int);
        let framed = node.frame.is_some();
        let last_box = LastBox {
            x: int("x"),
            y: int("y"),
            width: if framed { None } else { int("width") },
            height: if framed { None } else { int("height") },
        };
        node.last_box = Some(last_box);
        Ok(())
    }

    /// Completes the node once its subtree is done: frame, injected
    /// content, late classes and position. Then enters the after-render
    /// state and fires "after render".
    pub fn finalize(&mut self, id: NodeId) -> Result<(), RenderError> {
        let node = self.node(id)?;
        if node.state != RenderState::Rendered {
            return Err(invalid(node, "finalize"));
        }
        let element = node.element.ok_or_else(|| missing(&node.key, "el"))?;
        if node.frame.is_some() && !node.frame_applied {
            self.wrap_in_frame(id, element)?;
        }
        self.inject_content_el(id)?;

        let node = node_mut(&mut self.nodes, id)?;
        node.proto.write_to_host(&mut self.host, element)?;
        let x = node.config("x").and_then(Value::as_int);
        let y = node.config("y").and_then(Value::as_int);
        if let Some(x) = x {
            self.host.set_style(element, "left", &format!("{x}px"))?;
        }
        if let Some(y) = y {
            self.host.set_style(element, "top", &format!("{y}px"))?;
        }

        self.transition(id, RenderState::AfterRender)?;
        self.flush(id, RenderState::AfterRender)?;
        let node = self.node(id)?;
        let widget = Rc::clone(&node.widget);
        let is_root = node.owner.is_none();
        self.with_context(id, |cx| widget.after_render(cx))?;
        if is_root {
            self.layouts.request(id);
        }
        self.fire(id, LifecycleEventKind::AfterRender)?;
        Ok(())
    }

    /// Frames a node whose element was pre-supplied: the frame markup is
    /// inserted first and the existing children move into the frame body.
    fn wrap_in_frame(&mut self, id: NodeId, element: ElementId) -> Result<(), RenderError> {
        let data = self.render_data(id)?;
        let node = node_mut(&mut self.nodes, id)?;
        let Some(frame) = node.frame.clone() else {
            return Ok(());
        };
        node.frame_generation += 1;
        node.frame_applied = true;
        let frame_id = format!("{}-frame{}", node.key, node.frame_generation);
        let data = frame_data(&self.config, node, &data, &frame, &frame_id);

        let mut refs = ReferenceLog::default();
        let markup = {
            let composer = TemplateComposer::new(frame_template(&frame));
            let mut slots = NodeSlots::new(self, id, SlotMode::FrameOnly);
            composer.compose(&data, &mut slots, &mut refs)?
        };
        let existing = self.host.children(element);
        self.prepend(element, &markup)?;
        node_mut(&mut self.nodes, id)?.emitted.extend(refs);
        self.bind_references(id)?;

        let node = self.node(id)?;
        let body = node
            .reference("frameBody")
            .or_else(|| node.reference("frameMC"))
            .ok_or_else(|| missing(&node.key, "frameBody"))?;
        log::debug!("{}: framed pre-supplied element as {frame_id}", node.key);
        for child in existing {
            self.host.append(body, child)?;
        }
        Ok(())
    }

    fn inject_content_el(&mut self, id: NodeId) -> Result<(), RenderError> {
        let node = node_mut(&mut self.nodes, id)?;
        let Some(content) = node.content_el.take() else {
            return Ok(());
        };
        let target = node
            .content_target()
            .ok_or_else(|| missing(&node.key, "el"))?;
        self.host.append(target, content)?;
        for cls in ["hidden", "hide-display", "hide-offsets", "hide-visibility"] {
            self.host.remove_class(content, &self.config.prefixed(cls))?;
        }
        Ok(())
    }

    /// Tears down the node and its subtree, removing their elements and
    /// detaching it from its owner. Cached frame geometry is kept.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), RenderError> {
        let node = self.node(id)?;
        if let Some(owner) = node.owner {
            if let Ok(owner) = node_mut(&mut self.nodes, owner) {
                owner.children.retain(|child| *child != id);
            }
        }
        log::debug!("destroying {}", self.node(id)?.key);
        self.release(id)
    }

    fn release(&mut self, id: NodeId) -> Result<(), RenderError> {
        let Some(node) = self.nodes.get_mut(id).and_then(Option::take) else {
            return Ok(());
        };
        self.listeners.remove_node(id);
        self.layouts.forget(id);
        for &child in &node.children {
            self.release(child)?;
        }
        if let Some(element) = node.element {
            self.host.remove(element)?;
        }
        Ok(())
    }
}

impl<H: Host> walker::Walk for ComponentTree<H> {
    fn walk_children(&self, id: NodeId) -> Result<Vec<(NodeId, RenderState)>, RenderError> {
        let node = self.node(id)?;
        node.children
            .iter()
            .map(|&child| Ok((child, self.node(child)?.state)))
            .collect()
    }

    fn place(&mut self, id: NodeId, position: Option<InsertPosition>) -> Result<(), RenderError> {
        self.place_element(id, position).map(|_| ())
    }

    fn materialize(&mut self, id: NodeId) -> Result<(), RenderError> {
        ComponentTree::materialize(self, id)
    }

    fn finalize(&mut self, id: NodeId) -> Result<(), RenderError> {
        ComponentTree::finalize(self, id)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SlotMode {
    /// Composing the widget's render template directly.
    Plain,
    /// Composing the frame template; docked items belong to the frame.
    Framed,
    /// The render template nested in a frame; docked items are skipped.
    FrameInner,
    /// Frame markup only, wrapped around existing content.
    FrameOnly,
}

/// Resolves template slots for one node of the tree.
struct NodeSlots<'t, H: Host> {
    tree: &'t mut ComponentTree<H>,
    id: NodeId,
    mode: SlotMode,
}

impl<'t, H: Host> NodeSlots<'t, H> {
    fn new(tree: &'t mut ComponentTree<H>, id: NodeId, mode: SlotMode) -> Self {
        Self { tree, id, mode }
    }

    /// Composes children: items when `docked` is `None`, otherwise the
    /// docked items on the requested side of the content.
    fn render_children(
        &mut self,
        docked: Option<bool>,
        out: &mut Vec<Markup>,
    ) -> Result<(), RenderError> {
        let children = self.tree.node(self.id)?.children.clone();
        for child in children {
            let include = match (docked, self.tree.node(child)?.placement) {
                (None, Placement::Item) => true,
                (Some(before), Placement::Docked(dock)) => {
                    self.tree.effective_dock(self.id, dock)?.renders_before() == before
                }
                _ => false,
            };
            if include {
                if let Some(markup) = self.tree.render_tree(child)? {
                    out.push(markup);
                }
            }
        }
        Ok(())
    }
}

impl<H: Host> SlotDelegate for NodeSlots<'_, H> {
    fn render_slot(
        &mut self,
        slot: Slot,
        data: &RenderData,
        refs: &mut ReferenceLog,
        out: &mut Vec<Markup>,
    ) -> Result<(), RenderError> {
        match slot {
            Slot::Content => self.tree.render_content(self.id, out),
            Slot::Items => self.render_children(None, out),
            Slot::DockedBefore | Slot::DockedAfter => match self.mode {
                SlotMode::Plain | SlotMode::Framed => {
                    self.render_children(Some(slot == Slot::DockedBefore), out)
                }
                SlotMode::FrameInner | SlotMode::FrameOnly => Ok(()),
            },
            Slot::RenderTemplate => {
                if self.mode != SlotMode::Framed {
                    return Ok(());
                }
                let template = self.tree.node(self.id)?.widget.render_template();
                let mut inner = NodeSlots::new(&mut *self.tree, self.id, SlotMode::FrameInner);
                out.extend(TemplateComposer::new(template).compose(data, &mut inner, refs)?);
                Ok(())
            }
            Slot::Custom(name) => {
                let node = self.tree.node(self.id)?;
                let widget = Rc::clone(&node.widget);
                widget.render_slot(name, node, data, out)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
