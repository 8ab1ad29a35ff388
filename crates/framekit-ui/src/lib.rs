//! Widget catalog built on the framekit rendering engine.

mod debug;
pub mod widgets;

pub use framekit_core::{ComponentTree, Dock, MemoryHost, RenderError, RenderOutcome, RenderState};
pub use widgets::*;

// Debug utilities
pub use debug::{
    component_summary, format_component_tree, format_element_tree, log_component_tree,
};

/// Convenience alias used in demos and tests.
pub type TestTree = ComponentTree<MemoryHost>;

/// Builds a tree over an in-memory host, lets `build` populate it and
/// renders the returned root into the body.
pub fn render_test_tree(
    build: impl FnOnce(&mut TestTree) -> Result<framekit_core::NodeId, RenderError>,
) -> Result<(TestTree, framekit_core::NodeId), RenderError> {
    let mut tree = ComponentTree::new(MemoryHost::new());
    let root = build(&mut tree)?;
    tree.render_to_body(root)?;
    Ok((tree, root))
}
