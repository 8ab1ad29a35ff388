//! Panel header

use std::rc::Rc;

use framekit_core::{
    component_config_table, ApplyContext, ComponentNode, ConfigTable, Dock, ElementTemplate,
    Placement, RenderData, RenderError, Slot, Template, Value, Widget,
};

/// Title bar docked to one edge of a panel.
#[derive(Clone, Copy, Debug, Default)]
pub struct Header;

/// Writes the title into the title element once it exists; before that the
/// value waits in the deferred queue.
fn apply_title(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    match cx.reference("titleEl") {
        Some(title) => Ok(cx.host.set_text(title, &value.to_string())?),
        None => Ok(()),
    }
}

framekit_core::config_table! {
    pub fn header_config() extends component_config_table {
        "title" => (Rendered, apply_title),
    }
}

/// Edge the header ends up on once its owner's text direction is applied.
pub fn header_dock(node: &ComponentNode, owner: Option<&ComponentNode>) -> Dock {
    let dock = match node.placement() {
        Placement::Docked(dock) => dock,
        Placement::Item => Dock::Top,
    };
    if owner.is_some_and(|owner| owner.config_flag("rtl")) {
        dock.mirrored()
    } else {
        dock
    }
}

impl Widget for Header {
    fn xtype(&self) -> &'static str {
        "header"
    }

    fn base_cls(&self) -> &'static str {
        "header"
    }

    fn aria_role(&self) -> Option<&'static str> {
        Some("heading")
    }

    fn config_table(&self) -> &'static ConfigTable {
        header_config()
    }

    fn render_template(&self) -> Rc<Template> {
        thread_local! {
            static TEMPLATE: Rc<Template> = Rc::new(Template::new(vec![
                ElementTemplate::new("div")
                    .reference("titleEl")
                    .class("{baseCls}-title")
                    .class("{baseCls}-title-{dock}")
                    .into(),
                Slot::Content.into(),
            ]));
        }
        TEMPLATE.with(Rc::clone)
    }

    fn child_els(&self) -> &'static [&'static str] {
        &["titleEl"]
    }

    fn template_args(
        &self,
        node: &ComponentNode,
        owner: Option<&ComponentNode>,
        data: &mut RenderData,
    ) {
        data.insert("dock".into(), Value::from(header_dock(node, owner).name()));
    }
}
