//! Panel widget implementation

use std::rc::Rc;

use framekit_core::{
    ComponentTree, Dock, ElementTemplate, Host, NodeId, RenderError, Slot, Template, Widget,
};

use super::header::Header;

/// Container with a body element and docked items around it.
///
/// Frames itself when configured with `frame` on hosts without rounded
/// corners.
#[derive(Clone, Copy, Debug, Default)]
pub struct Panel;

impl Widget for Panel {
    fn xtype(&self) -> &'static str {
        "panel"
    }

    fn base_cls(&self) -> &'static str {
        "panel"
    }

    fn render_template(&self) -> Rc<Template> {
        thread_local! {
            static TEMPLATE: Rc<Template> = Rc::new(Template::new(vec![
                Slot::DockedBefore.into(),
                ElementTemplate::new("div")
                    .reference("body")
                    .class("{baseCls}-body")
                    .class("{baseCls}-body-{ui}")
                    .slot(Slot::Content)
                    .slot(Slot::Items)
                    .into(),
                Slot::DockedAfter.into(),
            ]));
        }
        TEMPLATE.with(Rc::clone)
    }

    fn child_els(&self) -> &'static [&'static str] {
        &["body"]
    }

    fn content_target(&self) -> Option<&'static str> {
        Some("body")
    }
}

/// Creates a panel with a header docked on `dock` showing `title`.
/// Returns the panel and its header.
pub fn panel_with_header<H: Host>(
    tree: &mut ComponentTree<H>,
    title: &str,
    dock: Dock,
) -> Result<(NodeId, NodeId), RenderError> {
    let panel = tree.create(Panel);
    let header = tree.create(Header);
    tree.set_deferred(header, "title", title)?;
    tree.add_docked(panel, header, dock)?;
    Ok((panel, header))
}
