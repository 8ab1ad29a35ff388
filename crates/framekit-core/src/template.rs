//! Structural templates with named delegation slots.
//!
//! A [`Template`] is an immutable value shared by every node of the same
//! shape. Places where a node must contribute markup of its own (content,
//! items, docked items, the inner render template of a frame) are
//! [`Slot`]s; the composer resolves them through a delegate supplied at
//! composition time instead of baking node behavior into the template.

use std::rc::Rc;

use crate::value::{lookup, RenderData};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// String with `{field}` placeholders resolved against render data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Interp {
    segments: Vec<Segment>,
}

impl Interp {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start + 1..].find('}') else {
                break;
            };
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let field = &rest[start + 1..start + 1 + len];
            segments.push(Segment::Field(field.trim().to_string()));
            rest = &rest[start + len + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Self { segments }
    }

    pub fn render(&self, data: &RenderData) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => {
                    if let Some(value) = lookup(data, field) {
                        out.push_str(&value.to_string());
                    }
                }
            }
        }
        out
    }

    /// Field names referenced by this string.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(field) => Some(field.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<&str> for Interp {
    fn from(source: &str) -> Self {
        Interp::parse(source)
    }
}

/// A delegation point inside a template.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Literal html or the node's content template.
    Content,
    /// Child items, each composed recursively.
    Items,
    /// Docked items rendered ahead of the main content.
    DockedBefore,
    /// Docked items rendered after the main content.
    DockedAfter,
    /// The widget's own render template, used inside frame templates.
    RenderTemplate,
    /// Widget-defined slot.
    Custom(&'static str),
}

impl Slot {
    pub fn name(self) -> &'static str {
        match self {
            Slot::Content => "content",
            Slot::Items => "items",
            Slot::DockedBefore => "docked-before",
            Slot::DockedAfter => "docked-after",
            Slot::RenderTemplate => "render-template",
            Slot::Custom(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateNode {
    Element(ElementTemplate),
    Text(Interp),
    /// Children emitted only when `field` is truthy.
    If {
        field: String,
        children: Vec<TemplateNode>,
    },
    /// `element` wraps its children only when `field` is truthy; otherwise
    /// the children are emitted in its place.
    WrapIf {
        field: String,
        element: ElementTemplate,
    },
    Slot(Slot),
}

impl TemplateNode {
    pub fn text(source: &str) -> Self {
        TemplateNode::Text(Interp::parse(source))
    }

    pub fn when(field: &str, children: Vec<TemplateNode>) -> Self {
        TemplateNode::If {
            field: field.to_string(),
            children,
        }
    }

    pub fn wrap_if(field: &str, element: ElementTemplate) -> Self {
        TemplateNode::WrapIf {
            field: field.to_string(),
            element,
        }
    }
}

impl From<ElementTemplate> for TemplateNode {
    fn from(element: ElementTemplate) -> Self {
        TemplateNode::Element(element)
    }
}

impl From<Slot> for TemplateNode {
    fn from(slot: Slot) -> Self {
        TemplateNode::Slot(slot)
    }
}

/// Element node of a template.
///
/// An element carrying a `reference` is a structural reference: its id
/// defaults to `{id}-{reference}` and the composer records it so the node
/// can bind the element after materialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementTemplate {
    pub tag: String,
    pub id: Option<Interp>,
    pub reference: Option<String>,
    pub classes: Vec<Interp>,
    pub attrs: Vec<(String, Interp)>,
    pub styles: Vec<(String, Interp)>,
    pub children: Vec<TemplateNode>,
}

impl ElementTemplate {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(Interp::parse(id));
        self
    }

    pub fn reference(mut self, name: &str) -> Self {
        self.reference = Some(name.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(Interp::parse(class));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), Interp::parse(value)));
        self
    }

    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.styles.push((property.to_string(), Interp::parse(value)));
        self
    }

    pub fn child(mut self, child: impl Into<TemplateNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn text(self, source: &str) -> Self {
        self.child(TemplateNode::text(source))
    }

    pub fn slot(self, slot: Slot) -> Self {
        self.child(slot)
    }
}

/// An ordered list of root template nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Template {
    roots: Vec<TemplateNode>,
}

impl Template {
    pub fn new(roots: Vec<TemplateNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[TemplateNode] {
        &self.roots
    }

    /// Whether any node of the template resolves `slot`.
    pub fn uses_slot(&self, slot: Slot) -> bool {
        fn visit(nodes: &[TemplateNode], slot: Slot) -> bool {
            nodes.iter().any(|node| match node {
                TemplateNode::Slot(found) => *found == slot,
                TemplateNode::Element(element) => visit(&element.children, slot),
                TemplateNode::WrapIf { element, .. } => visit(&element.children, slot),
                TemplateNode::If { children, .. } => visit(children, slot),
                TemplateNode::Text(_) => false,
            })
        }
        visit(&self.roots, slot)
    }

    /// Template of a plain component: its content and nothing else.
    pub fn content_only() -> Rc<Template> {
        thread_local! {
            static CONTENT_ONLY: Rc<Template> =
                Rc::new(Template::new(vec![TemplateNode::Slot(Slot::Content)]));
        }
        CONTENT_ONLY.with(Rc::clone)
    }

    /// Template of a plain container: its items.
    pub fn items_only() -> Rc<Template> {
        thread_local! {
            static ITEMS_ONLY: Rc<Template> = Rc::new(Template::new(vec![
                TemplateNode::Slot(Slot::DockedBefore),
                TemplateNode::Slot(Slot::Content),
                TemplateNode::Slot(Slot::Items),
                TemplateNode::Slot(Slot::DockedAfter),
            ]));
        }
        ITEMS_ONLY.with(Rc::clone)
    }
}

impl From<Vec<TemplateNode>> for Template {
    fn from(roots: Vec<TemplateNode>) -> Self {
        Template::new(roots)
    }
}
