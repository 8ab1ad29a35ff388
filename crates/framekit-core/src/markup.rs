//! Structural descriptions handed to the host for materialization.

use std::fmt::Write;

use indexmap::IndexMap;

/// A tree describing what the host should build. Produced fresh for every
/// render and consumed once.
#[derive(Clone, Debug, PartialEq)]
pub enum Markup {
    Element(ElementMarkup),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementMarkup {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: IndexMap<String, String>,
    pub styles: IndexMap<String, String>,
    pub children: Vec<Markup>,
}

impl ElementMarkup {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Markup) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !class.is_empty() && !self.classes.contains(&class) {
            self.classes.push(class);
        }
    }
}

impl From<ElementMarkup> for Markup {
    fn from(element: ElementMarkup) -> Self {
        Markup::Element(element)
    }
}

impl Markup {
    pub fn text(text: impl Into<String>) -> Self {
        Markup::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&ElementMarkup> {
        match self {
            Markup::Element(element) => Some(element),
            Markup::Text(_) => None,
        }
    }

    /// Depth-first search for an element carrying `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&ElementMarkup> {
        let element = self.as_element()?;
        if element.id.as_deref() == Some(id) {
            return Some(element);
        }
        element.children.iter().find_map(|child| child.find_by_id(id))
    }

    /// Serializes to an HTML-like string, mostly for diagnostics.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_markup(&mut out, self);
        out
    }
}

fn write_markup(out: &mut String, markup: &Markup) {
    match markup {
        Markup::Text(text) => out.push_str(text),
        Markup::Element(element) => {
            let _ = write!(out, "<{}", element.tag);
            if let Some(id) = &element.id {
                let _ = write!(out, " id=\"{id}\"");
            }
            if !element.classes.is_empty() {
                let _ = write!(out, " class=\"{}\"", element.classes.join(" "));
            }
            for (name, value) in &element.attrs {
                let _ = write!(out, " {name}=\"{value}\"");
            }
            if !element.styles.is_empty() {
                out.push_str(" style=\"");
                for (property, value) in &element.styles {
                    let _ = write!(out, "{property}:{value};");
                }
                out.push('"');
            }
            out.push('>');
            for child in &element.children {
                write_markup(out, child);
            }
            let _ = write!(out, "</{}>", element.tag);
        }
    }
}
