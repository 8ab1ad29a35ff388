//! Container widget implementation

use std::rc::Rc;

use framekit_core::{ComponentTree, Host, NodeId, RenderError, Template, Widget};

/// Lays its items out directly inside its own element, docked items
/// around them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Container;

impl Widget for Container {
    fn xtype(&self) -> &'static str {
        "container"
    }

    fn base_cls(&self) -> &'static str {
        "container"
    }

    fn render_template(&self) -> Rc<Template> {
        Template::items_only()
    }
}

/// Creates a container owning `items`, in order.
pub fn container_with<H: Host>(
    tree: &mut ComponentTree<H>,
    items: &[NodeId],
) -> Result<NodeId, RenderError> {
    let container = tree.create(Container);
    for &item in items {
        tree.add_child(container, item)?;
    }
    Ok(container)
}
