//! Turns templates into structural descriptions.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::markup::{ElementMarkup, Markup};
use crate::template::{ElementTemplate, Slot, Template, TemplateNode};
use crate::value::{lookup, RenderData, Value};
use crate::{FrameInfo, RenderError};

/// Resolves the slots of a template on behalf of one node.
pub trait SlotDelegate {
    fn render_slot(
        &mut self,
        slot: Slot,
        data: &RenderData,
        refs: &mut ReferenceLog,
        out: &mut Vec<Markup>,
    ) -> Result<(), RenderError>;
}

/// Delegate that leaves every slot empty.
pub struct NoSlots;

impl SlotDelegate for NoSlots {
    fn render_slot(
        &mut self,
        _slot: Slot,
        _data: &RenderData,
        _refs: &mut ReferenceLog,
        _out: &mut Vec<Markup>,
    ) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Structural reference names emitted during composition, with the element
/// id each one was given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceLog {
    entries: IndexMap<String, String>,
}

impl ReferenceLog {
    pub fn record(&mut self, name: impl Into<String>, element_id: impl Into<String>) {
        self.entries.insert(name.into(), element_id.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, id)| (name.as_str(), id.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn extend(&mut self, other: ReferenceLog) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Composes one template. The template is shared; node specific behavior
/// arrives through the [`SlotDelegate`] passed to [`TemplateComposer::compose`].
#[derive(Clone, Debug)]
pub struct TemplateComposer {
    template: Rc<Template>,
}

impl TemplateComposer {
    pub fn new(template: Rc<Template>) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn compose(
        &self,
        data: &RenderData,
        slots: &mut dyn SlotDelegate,
        refs: &mut ReferenceLog,
    ) -> Result<Vec<Markup>, RenderError> {
        let mut out = Vec::new();
        compose_nodes(self.template.roots(), data, slots, refs, &mut out)?;
        Ok(out)
    }
}

fn compose_nodes(
    nodes: &[TemplateNode],
    data: &RenderData,
    slots: &mut dyn SlotDelegate,
    refs: &mut ReferenceLog,
    out: &mut Vec<Markup>,
) -> Result<(), RenderError> {
    for node in nodes {
        match node {
            TemplateNode::Element(element) => {
                out.push(compose_element(element, data, slots, refs)?.into());
            }
            TemplateNode::Text(text) => {
                let text = text.render(data);
                if !text.is_empty() {
                    out.push(Markup::Text(text));
                }
            }
            TemplateNode::If { field, children } => {
                if is_set(data, field) {
                    compose_nodes(children, data, slots, refs, out)?;
                }
            }
            TemplateNode::WrapIf { field, element } => {
                if is_set(data, field) {
                    out.push(compose_element(element, data, slots, refs)?.into());
                } else {
                    compose_nodes(&element.children, data, slots, refs, out)?;
                }
            }
            TemplateNode::Slot(slot) => slots.render_slot(*slot, data, refs, out)?,
        }
    }
    Ok(())
}

fn is_set(data: &RenderData, field: &str) -> bool {
    lookup(data, field).map(Value::is_truthy).unwrap_or(false)
}

fn compose_element(
    template: &ElementTemplate,
    data: &RenderData,
    slots: &mut dyn SlotDelegate,
    refs: &mut ReferenceLog,
) -> Result<ElementMarkup, RenderError> {
    let mut element = ElementMarkup::new(template.tag.as_str());
    let id = match (&template.id, &template.reference) {
        (Some(id), _) => Some(id.render(data)),
        (None, Some(reference)) => {
            let owner = lookup(data, "id").map(ToString::to_string).unwrap_or_default();
            Some(format!("{owner}-{reference}"))
        }
        (None, None) => None,
    };
    if let (Some(reference), Some(id)) = (&template.reference, &id) {
        refs.record(reference.as_str(), id.as_str());
    }
    element.id = id.filter(|id| !id.is_empty());
    for class in &template.classes {
        for class in class.render(data).split_whitespace() {
            element.add_class(class);
        }
    }
    for (name, value) in &template.attrs {
        let value = value.render(data);
        if !value.is_empty() {
            element.attrs.insert(name.clone(), value);
        }
    }
    for (property, value) in &template.styles {
        let value = value.render(data);
        if !value.is_empty() {
            element.styles.insert(property.clone(), value);
        }
    }
    compose_nodes(&template.children, data, slots, refs, &mut element.children)?;
    Ok(element)
}

const REGIONS: [&str; 9] = ["tl", "tc", "tr", "ml", "mc", "mr", "bl", "bc", "br"];

/// Extends `data` with what the frame templates read: the frame id root,
/// which sides exist, their extents and the region classes.
pub fn frame_render_data(
    data: &RenderData,
    frame: &FrameInfo,
    frame_id: &str,
    frame_cls: &str,
    base_cls: &str,
    ui: &str,
    ui_cls: &[&str],
) -> RenderData {
    let mut out = data.clone();
    out.insert("fgid".into(), Value::from(frame_id));
    out.insert("frameCls".into(), Value::from(frame_cls));
    out.insert("top".into(), Value::from(frame.has_top()));
    out.insert("right".into(), Value::from(frame.has_right()));
    out.insert("bottom".into(), Value::from(frame.has_bottom()));
    out.insert("left".into(), Value::from(frame.has_left()));
    out.insert("frameTop".into(), Value::from(frame.extent.top));
    out.insert("frameRight".into(), Value::from(frame.extent.right));
    out.insert("frameBottom".into(), Value::from(frame.extent.bottom));
    out.insert("frameLeft".into(), Value::from(frame.extent.left));
    for region in REGIONS {
        let mut classes = vec![
            format!("{frame_cls}-{region}"),
            format!("{base_cls}-{region}"),
            format!("{base_cls}-{ui}-{region}"),
        ];
        classes.extend(
            ui_cls
                .iter()
                .map(|cls| format!("{base_cls}-{ui}-{cls}-{region}")),
        );
        out.insert(format!("{region}Cls"), Value::from(classes.join(" ")));
    }
    out
}

/// Frame template matching the frame's shape.
pub fn frame_template(frame: &FrameInfo) -> Rc<Template> {
    if frame.is_table() {
        TABLE_FRAME.with(Rc::clone)
    } else {
        DIV_FRAME.with(Rc::clone)
    }
}

thread_local! {
    static DIV_FRAME: Rc<Template> = Rc::new(div_frame());
    static TABLE_FRAME: Rc<Template> = Rc::new(table_frame());
}

fn region(suffix: &str, cls: &str) -> ElementTemplate {
    ElementTemplate::new("div")
        .id(&format!("{{fgid}}{suffix}"))
        .reference(&format!("frame{suffix}"))
        .class(&format!("{{{cls}}}"))
        .attr("role", "presentation")
}

fn cell(suffix: &str, cls: &str) -> ElementTemplate {
    ElementTemplate::new("td")
        .id(&format!("{{fgid}}{suffix}"))
        .reference(&format!("frame{suffix}"))
        .class(&format!("{{{cls}}}"))
        .attr("role", "presentation")
}

fn div_frame() -> Template {
    let top = TemplateNode::wrap_if(
        "left",
        region("TL", "tlCls").child(TemplateNode::wrap_if(
            "right",
            region("TR", "trCls").child(region("TC", "tcCls").style("height", "{frameTop}px")),
        )),
    );
    let middle = TemplateNode::wrap_if(
        "left",
        region("ML", "mlCls")
            .style("padding-left", "{frameLeft}px")
            .child(TemplateNode::wrap_if(
                "right",
                region("MR", "mrCls")
                    .style("padding-right", "{frameRight}px")
                    .child(region("Body", "mcCls").slot(Slot::RenderTemplate)),
            )),
    );
    let bottom = TemplateNode::wrap_if(
        "left",
        region("BL", "blCls").child(TemplateNode::wrap_if(
            "right",
            region("BR", "brCls").child(region("BC", "bcCls").style("height", "{frameBottom}px")),
        )),
    );
    Template::new(vec![
        Slot::DockedBefore.into(),
        TemplateNode::when("top", vec![top]),
        middle,
        TemplateNode::when("bottom", vec![bottom]),
        Slot::DockedAfter.into(),
    ])
}

fn table_frame() -> Template {
    let row = |cells: Vec<TemplateNode>| {
        let mut tr = ElementTemplate::new("tr");
        tr.children = cells;
        tr
    };
    let top = row(vec![
        TemplateNode::when("left", vec![cell("TL", "tlCls").into()]),
        cell("TC", "tcCls").style("height", "{frameTop}px").into(),
        TemplateNode::when("right", vec![cell("TR", "trCls").into()]),
    ]);
    let middle = row(vec![
        TemplateNode::when(
            "left",
            vec![cell("ML", "mlCls").style("width", "{frameLeft}px").into()],
        ),
        cell("MC", "mcCls").slot(Slot::RenderTemplate).into(),
        TemplateNode::when(
            "right",
            vec![cell("MR", "mrCls").style("width", "{frameRight}px").into()],
        ),
    ]);
    let bottom = row(vec![
        TemplateNode::when("left", vec![cell("BL", "blCls").into()]),
        cell("BC", "bcCls").style("height", "{frameBottom}px").into(),
        TemplateNode::when("right", vec![cell("BR", "brCls").into()]),
    ]);
    let table = ElementTemplate::new("table")
        .id("{fgid}Table")
        .reference("frameTable")
        .class("{frameCls}")
        .attr("cellpadding", "0")
        .attr("role", "presentation")
        .child(
            ElementTemplate::new("tbody")
                .child(TemplateNode::when("top", vec![top.into()]))
                .child(middle)
                .child(TemplateNode::when("bottom", vec![bottom.into()])),
        );
    Template::new(vec![
        Slot::DockedBefore.into(),
        table.into(),
        Slot::DockedAfter.into(),
    ])
}

#[cfg(test)]
#[path = "tests/composer_tests.rs"]
mod tests;
