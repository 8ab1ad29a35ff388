//! In-memory [`Host`] used by tests, benches and headless tooling.

use std::fmt::Write;

use ahash::RandomState;
use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};

use crate::markup::Markup;
use crate::platform::{ElementId, Host, HostError, Selector};

#[derive(Clone, Debug, Default)]
struct ElementData {
    tag: String,
    id: Option<String>,
    classes: IndexSet<String>,
    attrs: IndexMap<String, String>,
    styles: IndexMap<String, String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

#[derive(Clone, Debug)]
struct StyleRule {
    class: String,
    property: String,
    value: String,
}

/// Arena-backed element tree with a tiny class-keyed stylesheet.
///
/// Computed styles resolve inline styles first and then stylesheet rules
/// whose class the element carries; the last matching rule wins.
pub struct MemoryHost {
    elements: Vec<Option<ElementData>>,
    ids: HashMap<String, ElementId, RandomState>,
    rules: Vec<StyleRule>,
    rounded_corners: bool,
    body: ElementId,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let body = ElementData {
            tag: "body".to_string(),
            ..ElementData::default()
        };
        Self {
            elements: vec![Some(body)],
            ids: HashMap::default(),
            rules: Vec::new(),
            rounded_corners: true,
            body: 0,
        }
    }

    /// A host that cannot draw rounded corners, so frame decoration applies.
    pub fn without_rounded_corners() -> Self {
        let mut host = Self::new();
        host.rounded_corners = false;
        host
    }

    pub fn set_rounded_corners(&mut self, supported: bool) {
        self.rounded_corners = supported;
    }

    /// Registers a stylesheet rule `.class { property: value }`.
    pub fn add_rule(&mut self, class: &str, property: &str, value: &str) {
        self.rules.push(StyleRule {
            class: class.to_string(),
            property: property.to_string(),
            value: value.to_string(),
        });
    }

    /// Number of live elements, the body included.
    pub fn len(&self) -> usize {
        self.elements.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tag(&self, element: ElementId) -> Option<&str> {
        self.data(element).ok().map(|d| d.tag.as_str())
    }

    pub fn dom_id(&self, element: ElementId) -> Option<&str> {
        self.data(element).ok().and_then(|d| d.id.as_deref())
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.data(element)
            .map(|d| d.classes.contains(class))
            .unwrap_or(false)
    }

    pub fn classes(&self, element: ElementId) -> Vec<String> {
        self.data(element)
            .map(|d| d.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.data(element)
            .ok()
            .and_then(|d| d.attrs.get(name))
            .map(String::as_str)
    }

    pub fn inline_style(&self, element: ElementId, property: &str) -> Option<&str> {
        self.data(element)
            .ok()
            .and_then(|d| d.styles.get(property))
            .map(String::as_str)
    }

    /// Text content of the element and its descendants.
    pub fn text(&self, element: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(element, &mut out);
        out
    }

    fn collect_text(&self, element: ElementId, out: &mut String) {
        if let Ok(data) = self.data(element) {
            out.push_str(&data.text);
            for &child in &data.children {
                self.collect_text(child, out);
            }
        }
    }

    pub fn is_attached(&self, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Indented dump of the subtree rooted at `element`.
    pub fn dump_tree(&self, element: ElementId) -> String {
        let mut out = String::new();
        self.dump_into(element, 0, &mut out);
        out
    }

    fn dump_into(&self, element: ElementId, depth: usize, out: &mut String) {
        let Ok(data) = self.data(element) else {
            return;
        };
        let _ = write!(out, "{}<{}", "  ".repeat(depth), data.tag);
        if let Some(id) = &data.id {
            let _ = write!(out, " #{id}");
        }
        if !data.classes.is_empty() {
            let classes: Vec<&str> = data.classes.iter().map(String::as_str).collect();
            let _ = write!(out, " .{}", classes.join("."));
        }
        out.push('>');
        if !data.text.is_empty() {
            let _ = write!(out, " {:?}", data.text);
        }
        out.push('\n');
        for &child in &data.children {
            self.dump_into(child, depth + 1, out);
        }
    }

    fn data(&self, element: ElementId) -> Result<&ElementData, HostError> {
        self.elements
            .get(element)
            .and_then(Option::as_ref)
            .ok_or(HostError::MissingElement { element })
    }

    fn data_mut(&mut self, element: ElementId) -> Result<&mut ElementData, HostError> {
        self.elements
            .get_mut(element)
            .and_then(Option::as_mut)
            .ok_or(HostError::MissingElement { element })
    }

    fn build(&mut self, markup: &Markup, parent: Option<ElementId>) -> ElementId {
        let id = self.elements.len();
        match markup {
            Markup::Text(text) => {
                self.elements.push(Some(ElementData {
                    tag: "#text".to_string(),
                    text: text.clone(),
                    parent,
                    ..ElementData::default()
                }));
            }
            Markup::Element(element) => {
                self.elements.push(Some(ElementData {
                    tag: element.tag.clone(),
                    id: element.id.clone(),
                    classes: element.classes.iter().cloned().collect(),
                    attrs: element.attrs.clone(),
                    styles: element.styles.clone(),
                    parent,
                    ..ElementData::default()
                }));
                if let Some(dom_id) = &element.id {
                    self.ids.insert(dom_id.clone(), id);
                }
                let children: Vec<ElementId> = element
                    .children
                    .iter()
                    .map(|child| self.build(child, Some(id)))
                    .collect();
                if let Some(Some(data)) = self.elements.get_mut(id) {
                    data.children = children;
                }
            }
        }
        id
    }

    fn detach(&mut self, element: ElementId) -> Result<(), HostError> {
        if let Some(parent) = self.data(element)?.parent {
            let parent_data = self.data_mut(parent)?;
            parent_data.children.retain(|&c| c != element);
        }
        self.data_mut(element)?.parent = None;
        Ok(())
    }

    fn matches(&self, element: ElementId, selector: &Selector) -> bool {
        let Ok(data) = self.data(element) else {
            return false;
        };
        match selector {
            Selector::Id(id) => data.id.as_deref() == Some(id.as_str()),
            Selector::Class(class) => data.classes.contains(class.as_str()),
            Selector::Tag(tag) => data.tag.eq_ignore_ascii_case(tag),
        }
    }
}

impl Host for MemoryHost {
    fn supports_rounded_corners(&self) -> bool {
        self.rounded_corners
    }

    fn body(&self) -> ElementId {
        self.body
    }

    fn create(&mut self, markup: &Markup) -> Result<ElementId, HostError> {
        Ok(self.build(markup, None))
    }

    fn insert_before(
        &mut self,
        element: ElementId,
        reference: ElementId,
    ) -> Result<(), HostError> {
        let parent = self
            .data(reference)?
            .parent
            .ok_or(HostError::MissingElement { element: reference })?;
        self.detach(element)?;
        let parent_data = self.data_mut(parent)?;
        let index = parent_data
            .children
            .iter()
            .position(|&c| c == reference)
            .ok_or(HostError::NotAChild {
                parent,
                child: reference,
            })?;
        parent_data.children.insert(index, element);
        self.data_mut(element)?.parent = Some(parent);
        Ok(())
    }

    fn append(&mut self, container: ElementId, element: ElementId) -> Result<(), HostError> {
        self.data(container)?;
        self.detach(element)?;
        self.data_mut(container)?.children.push(element);
        self.data_mut(element)?.parent = Some(container);
        Ok(())
    }

    fn remove(&mut self, element: ElementId) -> Result<(), HostError> {
        self.detach(element)?;
        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.elements.get_mut(id).and_then(Option::take) {
                if let Some(dom_id) = data.id {
                    if self.ids.get(&dom_id) == Some(&id) {
                        self.ids.remove(&dom_id);
                    }
                }
                stack.extend(data.children);
            }
        }
        Ok(())
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.data(element).ok().and_then(|d| d.parent)
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.data(element)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.ids.get(id).copied()
    }

    fn query(&self, root: ElementId, selector: &Selector) -> Option<ElementId> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.matches(id, selector) {
                return Some(id);
            }
            if let Ok(data) = self.data(id) {
                stack.extend(data.children.iter().rev());
            }
        }
        None
    }

    fn computed_style(&self, element: ElementId, property: &str) -> Option<String> {
        let data = self.data(element).ok()?;
        if let Some(value) = data.styles.get(property) {
            return Some(value.clone());
        }
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.property == property && data.classes.contains(rule.class.as_str()))
            .map(|rule| rule.value.clone())
    }

    fn add_class(&mut self, element: ElementId, class: &str) -> Result<(), HostError> {
        for class in class.split_whitespace() {
            self.data_mut(element)?.classes.insert(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, element: ElementId, class: &str) -> Result<(), HostError> {
        for class in class.split_whitespace() {
            self.data_mut(element)?.classes.shift_remove(class);
        }
        Ok(())
    }

    fn set_class_name(&mut self, element: ElementId, class_name: &str) -> Result<(), HostError> {
        let data = self.data_mut(element)?;
        data.classes = class_name.split_whitespace().map(str::to_string).collect();
        Ok(())
    }

    fn set_attribute(
        &mut self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.data_mut(element)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) -> Result<(), HostError> {
        self.data_mut(element)?.attrs.shift_remove(name);
        Ok(())
    }

    fn set_style(
        &mut self,
        element: ElementId,
        property: &str,
        value: &str,
    ) -> Result<(), HostError> {
        let data = self.data_mut(element)?;
        if value.is_empty() {
            data.styles.shift_remove(property);
        } else {
            data.styles.insert(property.to_string(), value.to_string());
        }
        Ok(())
    }

    fn set_text(&mut self, element: ElementId, text: &str) -> Result<(), HostError> {
        let data = self.data_mut(element)?;
        let children = std::mem::take(&mut data.children);
        data.text = text.to_string();
        for child in children {
            let _ = self.remove_subtree(child);
        }
        Ok(())
    }
}

impl MemoryHost {
    fn remove_subtree(&mut self, element: ElementId) -> Result<(), HostError> {
        self.data_mut(element)?.parent = None;
        self.remove(element)
    }
}
