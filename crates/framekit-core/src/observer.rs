//! Lifecycle notifications.

use crate::lifecycle::{LifecycleEventKind, RenderState};
use crate::NodeId;

/// Listener verdict. Only honored for cancellable events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Veto,
}

/// Record delivered to listeners. Listeners get a snapshot of the node,
/// never the tree, so they cannot re-enter rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleEvent<'a> {
    pub kind: LifecycleEventKind,
    pub node: NodeId,
    pub key: &'a str,
    pub xtype: &'static str,
    pub state: RenderState,
    pub owner: Option<NodeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Scope {
    Node(NodeId),
    Tree,
}

type Callback = Box<dyn FnMut(&LifecycleEvent<'_>) -> Flow>;

struct Registration {
    id: ListenerId,
    scope: Scope,
    kind: Option<LifecycleEventKind>,
    callback: Callback,
}

/// Listener registry. Delivery follows registration order.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<Registration>,
    next_id: usize,
}

impl Listeners {
    pub(crate) fn on_node(
        &mut self,
        node: NodeId,
        kind: LifecycleEventKind,
        callback: Callback,
    ) -> ListenerId {
        self.push(Scope::Node(node), Some(kind), callback)
    }

    pub(crate) fn on_tree(&mut self, callback: Callback) -> ListenerId {
        self.push(Scope::Tree, None, callback)
    }

    fn push(
        &mut self,
        scope: Scope,
        kind: Option<LifecycleEventKind>,
        callback: Callback,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Registration {
            id,
            scope,
            kind,
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.entries.retain(|entry| entry.scope != Scope::Node(node));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Delivers `event`. A veto of a cancellable event stops delivery.
    pub(crate) fn dispatch(&mut self, event: &LifecycleEvent<'_>) -> Flow {
        for entry in &mut self.entries {
            let scoped = match entry.scope {
                Scope::Tree => true,
                Scope::Node(node) => node == event.node,
            };
            if !scoped || entry.kind.is_some_and(|kind| kind != event.kind) {
                continue;
            }
            if (entry.callback)(event) == Flow::Veto && event.kind.is_cancellable() {
                return Flow::Veto;
            }
        }
        Flow::Continue
    }
}
