//! Button widget implementation

use std::rc::Rc;

use framekit_core::{
    component_config_table, ApplyContext, ConfigTable, ElementTemplate, RenderError, Template,
    TemplateNode, Value, Widget,
};

/// Clickable button with a text and an icon element.
#[derive(Clone, Copy, Debug, Default)]
pub struct Button;

const BUTTON_CHILD_ELS: [&str; 4] = ["btnWrap", "btnEl", "btnInnerEl", "btnIconEl"];

/// Structure shared by every button: a wrap around the button element
/// holding the text and icon elements, followed by `extra`.
pub(crate) fn button_template(extra: Vec<TemplateNode>) -> Template {
    let mut roots: Vec<TemplateNode> = vec![ElementTemplate::new("span")
        .reference("btnWrap")
        .class("{baseCls}-wrap")
        .child(
            ElementTemplate::new("span")
                .reference("btnEl")
                .class("{baseCls}-button")
                .child(
                    ElementTemplate::new("span")
                        .reference("btnInnerEl")
                        .class("{baseCls}-inner")
                        .class("{baseCls}-inner-{ui}"),
                )
                .child(
                    ElementTemplate::new("span")
                        .reference("btnIconEl")
                        .class("{baseCls}-icon-el")
                        .attr("role", "presentation"),
                ),
        )
        .into()];
    roots.extend(extra);
    Template::new(roots)
}

pub(crate) fn apply_text(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    match cx.reference("btnInnerEl") {
        Some(inner) => Ok(cx.host.set_text(inner, &value.to_string())?),
        None => Ok(()),
    }
}

pub(crate) fn apply_icon_cls(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    previous: Option<&Value>,
) -> Result<(), RenderError> {
    let Some(icon) = cx.reference("btnIconEl") else {
        return Ok(());
    };
    if let Some(previous) = previous.and_then(Value::as_str) {
        cx.host.remove_class(icon, previous)?;
    }
    if let Some(cls) = value.as_str() {
        cx.host.add_class(icon, cls)?;
    }
    Ok(())
}

pub(crate) fn apply_tooltip(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    let Some(el) = cx.element() else {
        return Ok(());
    };
    match value.as_str().filter(|tip| !tip.is_empty()) {
        Some(tip) => cx.host.set_attribute(el, "title", tip)?,
        None => cx.host.remove_attribute(el, "title")?,
    }
    Ok(())
}

framekit_core::config_table! {
    pub fn button_config() extends component_config_table {
        "text" => (Rendered, apply_text),
        "iconCls" => (Rendered, apply_icon_cls),
        "tooltip" => (Rendered, apply_tooltip),
        "tabIndex" => (Unrendered, framekit_core::store_only),
    }
}

/// Tab index of a rendered button: its own, or `0`.
pub(crate) fn tab_index(cx: &ApplyContext<'_>) -> String {
    cx.node
        .config("tabIndex")
        .map(ToString::to_string)
        .unwrap_or_else(|| "0".to_string())
}

impl Widget for Button {
    fn xtype(&self) -> &'static str {
        "button"
    }

    fn base_cls(&self) -> &'static str {
        "btn"
    }

    fn auto_el(&self) -> &'static str {
        "a"
    }

    fn aria_role(&self) -> Option<&'static str> {
        Some("button")
    }

    fn config_table(&self) -> &'static ConfigTable {
        button_config()
    }

    fn render_template(&self) -> Rc<Template> {
        thread_local! {
            static TEMPLATE: Rc<Template> = Rc::new(button_template(Vec::new()));
        }
        TEMPLATE.with(Rc::clone)
    }

    fn child_els(&self) -> &'static [&'static str] {
        &BUTTON_CHILD_ELS
    }

    fn after_render(&self, cx: &mut ApplyContext<'_>) -> Result<(), RenderError> {
        let tab_index = tab_index(cx);
        if let Some(el) = cx.element() {
            cx.host.set_attribute(el, "tabindex", &tab_index)?;
        }
        Ok(())
    }
}
