use framekit_core::{
    ComponentTree, EngineConfig, Flow, FrameInfoCache, Host, LayoutGate, MemoryHost, NodeId,
};
use framekit_ui::{
    format_component_tree, format_element_tree, log_component_tree, panel_with_header, Button,
    Dock, FileButton,
};

const PANEL_FRAME: &str = "dh-4-4-4-4-1-1-1-1-6-6-6-6";

fn build_and_render() -> Result<(), framekit_core::RenderError> {
    let mut host = MemoryHost::without_rounded_corners();
    host.add_rule("x-panel-default-frameInfo", "font-family", PANEL_FRAME);
    let layouts = LayoutGate::new(|roots: &[NodeId]| {
        log::info!("layout pass for {roots:?}");
    });
    let mut tree = ComponentTree::with_services(
        host,
        EngineConfig::default(),
        FrameInfoCache::new(),
        layouts,
    );
    tree.observe(|event| {
        log::debug!("{} {} ({})", event.kind.name(), event.key, event.state);
        Flow::Continue
    });

    let (panel, _header) = panel_with_header(&mut tree, "Attachments", Dock::Top)?;
    tree.set_deferred(panel, "frame", true)?;
    tree.set_deferred(panel, "width", 320)?;
    tree.set_deferred(panel, "tabIndex", 2)?;

    let upload = tree.create_with_id(FileButton, "upload");
    tree.set_deferred(upload, "text", "Choose file")?;
    tree.set_deferred(upload, "name", "attachment")?;
    tree.add_child(panel, upload)?;

    let send = tree.create_with_id(Button, "send");
    tree.set_deferred(send, "text", "Send")?;
    tree.set_deferred(send, "disabled", true)?;
    tree.add_child(panel, send)?;

    tree.render_to_body(panel)?;
    tree.set_deferred(send, "disabled", false)?;

    log_component_tree(&tree, panel);
    println!("{}", format_component_tree(&tree, panel));
    println!("{}", format_element_tree(&tree, panel));
    if let Some(el) = tree.element(panel)? {
        log::info!("panel text: {:?}", tree.host().text(el));
    }
    log::info!("{} elements live", tree.host().len());
    let body = tree.host().body();
    log::info!("{} roots attached", tree.host().children(body).len());
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = build_and_render() {
        log::error!("render failed: {err}");
        std::process::exit(1);
    }
}
