//! Host platform abstraction.
//!
//! The engine never touches a concrete element tree. Everything it needs
//! from the host (materializing descriptions, moving elements, reading
//! computed styles and mutating classes) goes through [`Host`], so the same
//! lifecycle runs against a browser binding, a native toolkit or the
//! in-memory [`crate::MemoryHost`] used by tests.

use std::fmt;

use crate::markup::Markup;

/// Opaque handle to a host element.
pub type ElementId = usize;

/// Element lookup understood by every host.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    Id(String),
    Class(String),
    Tag(String),
}

impl Selector {
    /// Parses `#id`, `.class` or a bare tag name.
    pub fn parse(selector: &str) -> Self {
        let selector = selector.trim();
        if let Some(id) = selector.strip_prefix('#') {
            Selector::Id(id.to_string())
        } else if let Some(class) = selector.strip_prefix('.') {
            Selector::Class(class.to_string())
        } else {
            Selector::Tag(selector.to_string())
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "#{id}"),
            Selector::Class(class) => write!(f, ".{class}"),
            Selector::Tag(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    MissingElement { element: ElementId },
    NotAChild { parent: ElementId, child: ElementId },
    Unsupported { operation: &'static str },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::MissingElement { element } => write!(f, "element {element} missing"),
            HostError::NotAChild { parent, child } => {
                write!(f, "element {child} is not a child of {parent}")
            }
            HostError::Unsupported { operation } => {
                write!(f, "host does not support {operation}")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Capabilities the rendering engine requires from the host platform.
pub trait Host {
    /// Whether the host draws rounded corners natively. When it does, frame
    /// decoration is never composed.
    fn supports_rounded_corners(&self) -> bool;

    /// Root element new top-level elements may be attached to.
    fn body(&self) -> ElementId;

    /// Materializes a structural description into a detached element.
    fn create(&mut self, markup: &Markup) -> Result<ElementId, HostError>;

    fn insert_before(&mut self, element: ElementId, reference: ElementId)
        -> Result<(), HostError>;

    fn append(&mut self, container: ElementId, element: ElementId) -> Result<(), HostError>;

    /// Inserts `element` as the first child of `container`.
    fn insert_first(&mut self, container: ElementId, element: ElementId) -> Result<(), HostError> {
        match self.children(container).first().copied() {
            Some(first) => self.insert_before(element, first),
            None => self.append(container, element),
        }
    }

    /// Detaches and destroys `element` and its subtree.
    fn remove(&mut self, element: ElementId) -> Result<(), HostError>;

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    fn children(&self, element: ElementId) -> Vec<ElementId>;

    /// Global id lookup.
    fn element_by_id(&self, id: &str) -> Option<ElementId>;

    /// First element matching `selector` in `root`'s subtree, `root` included.
    fn query(&self, root: ElementId, selector: &Selector) -> Option<ElementId>;

    fn computed_style(&self, element: ElementId, property: &str) -> Option<String>;

    fn add_class(&mut self, element: ElementId, class: &str) -> Result<(), HostError>;

    fn remove_class(&mut self, element: ElementId, class: &str) -> Result<(), HostError>;

    /// Replaces the full class list.
    fn set_class_name(&mut self, element: ElementId, class_name: &str) -> Result<(), HostError>;

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str)
        -> Result<(), HostError>;

    fn remove_attribute(&mut self, element: ElementId, name: &str) -> Result<(), HostError>;

    fn set_style(&mut self, element: ElementId, property: &str, value: &str)
        -> Result<(), HostError>;

    fn set_text(&mut self, element: ElementId, text: &str) -> Result<(), HostError>;
}
