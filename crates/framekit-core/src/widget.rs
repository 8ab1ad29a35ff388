//! Per-type behavior plugged into the engine.

use std::rc::Rc;

use crate::config::{component_config_table, ApplyContext, ConfigTable};
use crate::markup::Markup;
use crate::node::ComponentNode;
use crate::template::Template;
use crate::value::RenderData;
use crate::RenderError;

/// Describes one kind of component.
///
/// Class names returned here are unprefixed; the engine adds the css prefix
/// of its [`crate::EngineConfig`].
pub trait Widget {
    fn xtype(&self) -> &'static str;

    fn base_cls(&self) -> &'static str {
        "component"
    }

    fn component_cls(&self) -> Option<&'static str> {
        None
    }

    /// Extra ui modifiers appended to frame region classes.
    fn ui_cls(&self) -> &'static [&'static str] {
        &[]
    }

    /// Tag of the root element.
    fn auto_el(&self) -> &'static str {
        "div"
    }

    fn aria_role(&self) -> Option<&'static str> {
        None
    }

    fn config_table(&self) -> &'static ConfigTable {
        component_config_table()
    }

    fn render_template(&self) -> Rc<Template> {
        Template::content_only()
    }

    /// Structural references every rendered instance must expose. Each is
    /// looked up as `{id}-{name}` unless the template recorded another id.
    fn child_els(&self) -> &'static [&'static str] {
        &[]
    }

    /// Optional references bound by selector query after materialization.
    fn render_selectors(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Frame even without a `frame` configuration.
    fn always_framed(&self) -> bool {
        false
    }

    /// Reference receiving items and injected content, if not the root.
    fn content_target(&self) -> Option<&'static str> {
        None
    }

    /// Adds widget specific template arguments.
    fn template_args(
        &self,
        _node: &ComponentNode,
        _owner: Option<&ComponentNode>,
        _data: &mut RenderData,
    ) {
    }

    /// Resolves a [`crate::Slot::Custom`] slot.
    fn render_slot(
        &self,
        _name: &str,
        _node: &ComponentNode,
        _data: &RenderData,
        _out: &mut Vec<Markup>,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    /// Runs once the node has entered the before-render state.
    fn before_render(&self, _node: &mut ComponentNode) {}

    /// Runs once the node has entered the after-render state, before the
    /// "after render" notification.
    fn after_render(&self, _cx: &mut ApplyContext<'_>) -> Result<(), RenderError> {
        Ok(())
    }
}
