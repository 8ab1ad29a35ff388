//! Plain component

use framekit_core::Widget;

/// A component with nothing but its own content.
#[derive(Clone, Copy, Debug, Default)]
pub struct Component;

impl Widget for Component {
    fn xtype(&self) -> &'static str {
        "component"
    }
}
