//! Debug formatting for component trees and their host elements.

use std::fmt::Write;

use framekit_core::{ComponentTree, Host, MemoryHost, NodeId, Placement, RenderState};
use framekit_ui_graphics::FrameInfo;
use indexmap::IndexMap;

fn describe_frame(frame: &FrameInfo) -> String {
    format!(
        "frame {} {}x{}",
        frame.encode(),
        frame.width(),
        frame.height()
    )
}

/// One line per node, indented by depth: key, type, state, placement and
/// frame geometry.
pub fn format_component_tree<H: Host>(tree: &ComponentTree<H>, root: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, root, 0, &mut out);
    out
}

fn write_node<H: Host>(tree: &ComponentTree<H>, id: NodeId, depth: usize, out: &mut String) {
    let Ok(node) = tree.node(id) else {
        return;
    };
    let _ = write!(
        out,
        "{}{} ({}) [{}]",
        "  ".repeat(depth),
        node.key(),
        node.xtype(),
        node.state()
    );
    if let Placement::Docked(dock) = node.placement() {
        let _ = write!(out, " docked {}", dock.name());
    }
    if let Some(frame) = node.frame() {
        let _ = write!(out, " {}", describe_frame(frame));
    }
    if node.pending_count() > 0 {
        let _ = write!(out, " pending {}", node.pending_count());
    }
    out.push('\n');
    for &child in node.children() {
        write_node(tree, child, depth + 1, out);
    }
}

/// Element subtree of a rendered node.
pub fn format_element_tree(tree: &ComponentTree<MemoryHost>, id: NodeId) -> String {
    match tree.element(id) {
        Ok(Some(element)) => tree.host().dump_tree(element),
        _ => String::new(),
    }
}

/// Number of nodes per type and how many of them finished rendering.
pub fn component_summary<H: Host>(
    tree: &ComponentTree<H>,
    root: NodeId,
) -> IndexMap<&'static str, (usize, usize)> {
    let mut summary = IndexMap::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Ok(node) = tree.node(id) else {
            continue;
        };
        let entry = summary.entry(node.xtype()).or_insert((0, 0));
        entry.0 += 1;
        if node.state() == RenderState::AfterRender {
            entry.1 += 1;
        }
        stack.extend(node.children().iter().rev());
    }
    summary
}

pub fn log_component_tree<H: Host>(tree: &ComponentTree<H>, root: NodeId) {
    for line in format_component_tree(tree, root).lines() {
        log::debug!("{line}");
    }
    for (xtype, (total, rendered)) in component_summary(tree, root) {
        log::debug!("{xtype}: {rendered}/{total} rendered");
    }
}

#[cfg(test)]
#[path = "tests/debug_tests.rs"]
mod tests;
