use super::*;
use crate::widgets::{panel_with_header, Button, Panel};
use framekit_core::Dock;

#[test]
fn component_tree_lists_nodes_by_depth() {
    let mut tree = ComponentTree::new(MemoryHost::new());
    let (panel, _header) = panel_with_header(&mut tree, "Inbox", Dock::Top).unwrap();
    let button = tree.create_with_id(Button, "send");
    tree.add_child(panel, button).unwrap();
    tree.render_to_body(panel).unwrap();

    let formatted = format_component_tree(&tree, panel);
    let lines: Vec<&str> = formatted.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("panel-"));
    assert!(lines[0].ends_with("(panel) [after-render]"));
    assert!(lines[1].starts_with("  header-"));
    assert!(lines[1].ends_with("docked top"));
    assert_eq!(lines[2], "  send (button) [after-render]");
}

#[test]
fn pending_configuration_is_shown_until_rendered() {
    let mut tree = ComponentTree::new(MemoryHost::new());
    let panel = tree.create_with_id(Panel, "p");
    tree.set_deferred(panel, "disabled", true).unwrap();
    assert_eq!(
        format_component_tree(&tree, panel),
        "p (panel) [unrendered] pending 1\n"
    );
    assert_eq!(format_element_tree(&tree, panel), "");
}

#[test]
fn summary_counts_rendered_nodes_per_type() {
    let mut tree = ComponentTree::new(MemoryHost::new());
    let panel = tree.create(Panel);
    let kept = tree.create(Button);
    let vetoed = tree.create(Button);
    tree.add_child(panel, kept).unwrap();
    tree.add_child(panel, vetoed).unwrap();
    tree.on(vetoed, framekit_core::LifecycleEventKind::BeforeRender, |_| {
        framekit_core::Flow::Veto
    })
    .unwrap();
    tree.render_to_body(panel).unwrap();

    let summary = component_summary(&tree, panel);
    assert_eq!(summary.get("panel"), Some(&(1, 1)));
    assert_eq!(summary.get("button"), Some(&(2, 1)));
    assert!(format_element_tree(&tree, panel).starts_with("<div #"));
}
