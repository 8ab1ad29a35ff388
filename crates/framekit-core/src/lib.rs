#![doc = r"Component rendering lifecycle engine for framekit."]

pub mod composer;
pub mod config;
pub mod engine_config;
pub mod frame;
pub mod layout;
pub mod lifecycle;
pub mod markup;
pub mod memory_host;
pub mod node;
pub mod observer;
pub mod platform;
pub mod template;
pub mod tree;
pub mod value;
pub mod walker;
pub mod widget;

pub use composer::{NoSlots, ReferenceLog, SlotDelegate, TemplateComposer};
pub use config::{
    apply_disabled, component_config_table, store_only, ApplyContext, ConfigEntry, ConfigSetter,
    ConfigTable, DeferredConfigQueue, PendingEntry, DEFAULT_UI,
};
pub use engine_config::EngineConfig;
pub use frame::{FrameGeometryResolver, FrameInfoCache, StyleKey};
pub use framekit_ui_graphics::{
    CornerRadii, FrameInfo, FrameInfoParseError, FrameOrientation, FrameShape, Sides,
};
pub use layout::{LayoutGate, LayoutRunner, LayoutSuspension};
pub use lifecycle::{LifecycleEventKind, RenderState, TransitionError};
pub use markup::{ElementMarkup, Markup};
pub use memory_host::MemoryHost;
pub use node::{ComponentNode, Dock, LastBox, Placement, ProtoElement};
pub use observer::{Flow, LifecycleEvent, ListenerId};
pub use platform::{ElementId, Host, HostError, Selector};
pub use template::{ElementTemplate, Interp, Slot, Template, TemplateNode};
pub use tree::{BeginRender, ComponentTree, InsertPosition, RenderOutcome};
pub use value::{RenderData, Value};
pub use walker::{finish_after_render, finish_render};
pub use widget::Widget;

use std::fmt;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    UnknownNode {
        id: NodeId,
    },
    InvalidStateTransition {
        node: String,
        operation: &'static str,
        state: RenderState,
    },
    StructuralReferenceMissing {
        node: String,
        reference: String,
    },
    InvalidHierarchy {
        message: String,
    },
    Host(HostError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnknownNode { id } => write!(f, "node {id} missing"),
            RenderError::InvalidStateTransition {
                node,
                operation,
                state,
            } => write!(f, "{operation} is not valid for {node} in state {state}"),
            RenderError::StructuralReferenceMissing { node, reference } => {
                write!(f, "{node} rendered without its {reference} element")
            }
            RenderError::InvalidHierarchy { message } => f.write_str(message),
            RenderError::Host(err) => write!(f, "host error: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Host(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HostError> for RenderError {
    fn from(err: HostError) -> Self {
        RenderError::Host(err)
    }
}

pub mod prelude {
    pub use crate::{
        ComponentTree, Dock, ElementTemplate, Flow, Host, LifecycleEventKind, Markup, MemoryHost,
        RenderError, RenderOutcome, RenderState, Slot, Template, Value, Widget,
    };
}
