//! The two traversals that complete a render pass.
//!
//! `finish_render` goes top-down: a node is placed and materialized before
//! any of its children. `finish_after_render` goes bottom-up: every child
//! is finalized before its owner.

use crate::lifecycle::RenderState;
use crate::tree::InsertPosition;
use crate::{NodeId, RenderError};

/// What the traversals need from a tree.
pub trait Walk {
    /// Children in order, with their current state.
    fn walk_children(&self, id: NodeId) -> Result<Vec<(NodeId, RenderState)>, RenderError>;

    fn place(&mut self, id: NodeId, position: Option<InsertPosition>) -> Result<(), RenderError>;

    fn materialize(&mut self, id: NodeId) -> Result<(), RenderError>;

    fn finalize(&mut self, id: NodeId) -> Result<(), RenderError>;
}

/// Places and materializes `id`, then recurses into the children that
/// were composed with it. Children that were vetoed or rendered earlier
/// are not in the rendering state and are skipped.
pub fn finish_render<W: Walk + ?Sized>(
    tree: &mut W,
    id: NodeId,
    position: Option<InsertPosition>,
) -> Result<(), RenderError> {
    tree.place(id, position)?;
    tree.materialize(id)?;
    for (child, state) in tree.walk_children(id)? {
        if state == RenderState::Rendering {
            finish_render(tree, child, None)?;
        }
    }
    Ok(())
}

/// Finalizes every rendered child of `id`, then `id` itself.
pub fn finish_after_render<W: Walk + ?Sized>(tree: &mut W, id: NodeId) -> Result<(), RenderError> {
    for (child, state) in tree.walk_children(id)? {
        if state == RenderState::Rendered {
            finish_after_render(tree, child)?;
        }
    }
    tree.finalize(id)
}
