//! The component node stored in the tree arena.

use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use crate::composer::ReferenceLog;
use crate::config::DeferredConfigQueue;
use crate::lifecycle::RenderState;
use crate::markup::{ElementMarkup, Markup};
use crate::platform::{ElementId, Host};
use crate::template::Template;
use crate::value::{RenderData, Value};
use crate::widget::Widget;
use crate::{FrameInfo, NodeId, RenderError};

/// Edge of the owner a docked child attaches to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dock {
    Top,
    Right,
    Bottom,
    Left,
}

impl Dock {
    /// The edge used under right-to-left direction.
    pub fn mirrored(self) -> Self {
        match self {
            Dock::Left => Dock::Right,
            Dock::Right => Dock::Left,
            other => other,
        }
    }

    /// Docked items on the top and left edges precede the main content.
    pub fn renders_before(self) -> bool {
        matches!(self, Dock::Top | Dock::Left)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dock::Top => "top",
            Dock::Right => "right",
            Dock::Bottom => "bottom",
            Dock::Left => "left",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    Item,
    Docked(Dock),
}

/// Classes and styles collected before the element exists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProtoElement {
    classes: IndexSet<String>,
    removed: IndexSet<String>,
    styles: IndexMap<String, String>,
}

impl ProtoElement {
    pub fn add_class(&mut self, cls: &str) {
        for cls in cls.split_whitespace() {
            self.removed.shift_remove(cls);
            self.classes.insert(cls.to_string());
        }
    }

    pub fn remove_class(&mut self, cls: &str) {
        for cls in cls.split_whitespace() {
            self.classes.shift_remove(cls);
            self.removed.insert(cls.to_string());
        }
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        self.styles.insert(property.to_string(), value.to_string());
    }

    pub fn has_class(&self, cls: &str) -> bool {
        self.classes.contains(cls)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.removed.is_empty() && self.styles.is_empty()
    }

    pub fn clear(&mut self) {
        self.classes.clear();
        self.removed.clear();
        self.styles.clear();
    }

    /// Merges into a root description and empties the proto.
    pub fn write_to_markup(&mut self, markup: &mut ElementMarkup) {
        markup.classes.retain(|cls| !self.removed.contains(cls));
        for cls in self.classes.drain(..) {
            markup.add_class(cls);
        }
        for (property, value) in self.styles.drain(..) {
            if value.is_empty() {
                markup.styles.shift_remove(&property);
            } else {
                markup.styles.insert(property, value);
            }
        }
        self.removed.clear();
    }

    /// Applies to a live element and empties the proto.
    pub fn write_to_host(
        &mut self,
        host: &mut dyn Host,
        element: ElementId,
    ) -> Result<(), RenderError> {
        for cls in self.removed.drain(..) {
            host.remove_class(element, &cls)?;
        }
        for cls in self.classes.drain(..) {
            host.add_class(element, &cls)?;
        }
        for (property, value) in self.styles.drain(..) {
            host.set_style(element, &property, &value)?;
        }
        Ok(())
    }
}

/// Position and size recorded when the element was materialized.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LastBox {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// One element of the component hierarchy.
pub struct ComponentNode {
    pub(crate) key: String,
    pub(crate) widget: Rc<dyn Widget>,
    pub(crate) state: RenderState,
    pub(crate) config: IndexMap<String, Value>,
    pub(crate) pending: DeferredConfigQueue,
    pub(crate) owner: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) placement: Placement,
    pub(crate) element: Option<ElementId>,
    pub(crate) container: Option<ElementId>,
    pub(crate) placed: bool,
    pub(crate) description: Option<Markup>,
    pub(crate) frame: Option<Rc<FrameInfo>>,
    pub(crate) frame_generation: u32,
    pub(crate) frame_applied: bool,
    pub(crate) proto: ProtoElement,
    pub(crate) emitted: ReferenceLog,
    pub(crate) references: IndexMap<String, ElementId>,
    pub(crate) placeholder: Option<String>,
    pub(crate) needs_render_tpl: bool,
    pub(crate) content_template: Option<Rc<Template>>,
    pub(crate) data: RenderData,
    pub(crate) content_consumed: bool,
    pub(crate) content_el: Option<ElementId>,
    pub(crate) last_box: Option<LastBox>,
}

impl ComponentNode {
    pub(crate) fn new(key: String, widget: Rc<dyn Widget>) -> Self {
        Self {
            key,
            widget,
            state: RenderState::Unrendered,
            config: IndexMap::new(),
            pending: DeferredConfigQueue::new(),
            owner: None,
            children: SmallVec::new(),
            placement: Placement::Item,
            element: None,
            container: None,
            placed: false,
            description: None,
            frame: None,
            frame_generation: 0,
            frame_applied: false,
            proto: ProtoElement::default(),
            emitted: ReferenceLog::default(),
            references: IndexMap::new(),
            placeholder: None,
            needs_render_tpl: false,
            content_template: None,
            data: RenderData::new(),
            content_consumed: false,
            content_el: None,
            last_box: None,
        }
    }

    /// Stable string id, also used as the element id.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn widget(&self) -> &dyn Widget {
        &*self.widget
    }

    pub fn xtype(&self) -> &'static str {
        self.widget.xtype()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn is_rendered(&self) -> bool {
        self.state.is_rendered()
    }

    /// Applied configuration value. Buffered values are not visible here.
    pub fn config(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config(key).and_then(Value::as_str)
    }

    pub fn config_flag(&self, key: &str) -> bool {
        self.config(key).map(Value::is_truthy).unwrap_or(false)
    }

    /// Value waiting in the deferred queue for `key`.
    pub fn pending(&self, key: &str) -> Option<&Value> {
        self.pending.pending(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn container(&self) -> Option<ElementId> {
        self.container
    }

    pub fn frame(&self) -> Option<&FrameInfo> {
        self.frame.as_deref()
    }

    pub fn is_framed(&self) -> bool {
        self.frame.is_some()
    }

    pub fn frame_generation(&self) -> u32 {
        self.frame_generation
    }

    /// Bound structural reference.
    pub fn reference(&self, name: &str) -> Option<ElementId> {
        self.references.get(name).copied()
    }

    pub fn references(&self) -> impl Iterator<Item = (&str, ElementId)> {
        self.references.iter().map(|(name, el)| (name.as_str(), *el))
    }

    /// Reference names recorded while composing.
    pub fn emitted_references(&self) -> &ReferenceLog {
        &self.emitted
    }

    pub fn proto(&self) -> &ProtoElement {
        &self.proto
    }

    pub fn proto_mut(&mut self) -> &mut ProtoElement {
        &mut self.proto
    }

    pub fn data(&self) -> &RenderData {
        &self.data
    }

    pub fn last_box(&self) -> Option<LastBox> {
        self.last_box
    }

    /// Element that receives items and injected content.
    pub fn content_target(&self) -> Option<ElementId> {
        self.widget
            .content_target()
            .and_then(|name| self.reference(name))
            .or(self.element)
    }
}

impl std::fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentNode")
            .field("key", &self.key)
            .field("xtype", &self.widget.xtype())
            .field("state", &self.state)
            .field("owner", &self.owner)
            .field("children", &self.children)
            .field("element", &self.element)
            .finish()
    }
}
