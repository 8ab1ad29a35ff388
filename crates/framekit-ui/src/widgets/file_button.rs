//! File selection button

use std::rc::Rc;

use framekit_core::{
    apply_disabled, store_only, ApplyContext, ComponentNode, ConfigTable, ElementTemplate,
    RenderData, RenderError, Template, Value, Widget,
};

use super::button::{button_config, button_template};

/// A button overlaid with a native file input. The input takes focus in
/// place of the button, so it carries the tab index.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileButton;

/// Disabling also disables the native input, which does not inherit the
/// state from the button classes.
fn apply_file_disabled(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    previous: Option<&Value>,
) -> Result<(), RenderError> {
    apply_disabled(cx, value, previous)?;
    let Some(input) = cx.reference("fileInputEl") else {
        return Ok(());
    };
    if value.is_truthy() {
        cx.host.set_attribute(input, "disabled", "disabled")?;
    } else {
        cx.host.remove_attribute(input, "disabled")?;
    }
    Ok(())
}

const FILE_BUTTON_CHILD_ELS: [&str; 5] =
    ["btnWrap", "btnEl", "btnInnerEl", "btnIconEl", "fileInputEl"];

framekit_core::config_table! {
    pub fn file_button_config() extends button_config {
        "disabled" => (Rendered, apply_file_disabled),
        "name" => (Unrendered, store_only),
        "accept" => (Unrendered, store_only),
    }
}

impl Widget for FileButton {
    fn xtype(&self) -> &'static str {
        "filebutton"
    }

    fn base_cls(&self) -> &'static str {
        "btn"
    }

    fn component_cls(&self) -> Option<&'static str> {
        Some("file-button")
    }

    fn auto_el(&self) -> &'static str {
        "a"
    }

    fn aria_role(&self) -> Option<&'static str> {
        Some("button")
    }

    fn config_table(&self) -> &'static ConfigTable {
        file_button_config()
    }

    fn render_template(&self) -> Rc<Template> {
        thread_local! {
            static TEMPLATE: Rc<Template> = Rc::new(button_template(vec![
                ElementTemplate::new("input")
                    .reference("fileInputEl")
                    .class("{inputCls}")
                    .attr("type", "file")
                    .attr("name", "{inputName}")
                    .attr("accept", "{accept}")
                    .attr("tabindex", "{tabIndex}")
                    .into(),
            ]));
        }
        TEMPLATE.with(Rc::clone)
    }

    fn child_els(&self) -> &'static [&'static str] {
        &FILE_BUTTON_CHILD_ELS
    }

    /// The owning field decides the tab order, so its tab index wins over
    /// the button's own.
    fn template_args(
        &self,
        node: &ComponentNode,
        owner: Option<&ComponentNode>,
        data: &mut RenderData,
    ) {
        let prefix = data
            .get("prefix")
            .map(ToString::to_string)
            .unwrap_or_default();
        data.insert(
            "inputCls".into(),
            Value::from(format!("{prefix}form-file-input")),
        );
        data.insert(
            "inputName".into(),
            Value::from(node.config_str("name").unwrap_or(node.key())),
        );
        let tab_index = owner
            .and_then(|owner| owner.config("tabIndex"))
            .or_else(|| node.config("tabIndex"))
            .cloned();
        if let Some(tab_index) = tab_index {
            data.insert("tabIndex".into(), tab_index);
        }
    }

    fn after_render(&self, cx: &mut ApplyContext<'_>) -> Result<(), RenderError> {
        if let Some(el) = cx.element() {
            cx.host.set_attribute(el, "tabindex", "-1")?;
        }
        Ok(())
    }
}
