//! Render states and the transition table guarding them.

use std::fmt;

/// Position of a node in its rendering lifecycle.
///
/// States are strictly ordered; a live node only ever moves forward by one
/// step at a time. Destroying a node removes it from the tree instead of
/// entering another state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderState {
    #[default]
    Unrendered = 0,
    BeforeRender = 1,
    Rendering = 2,
    Rendered = 3,
    AfterRender = 4,
}

impl RenderState {
    pub const COUNT: usize = 5;

    pub const ALL: [RenderState; RenderState::COUNT] = [
        RenderState::Unrendered,
        RenderState::BeforeRender,
        RenderState::Rendering,
        RenderState::Rendered,
        RenderState::AfterRender,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The only state reachable from `self`.
    pub fn successor(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Validates a single forward step.
    pub fn advance(self, to: RenderState) -> Result<RenderState, TransitionError> {
        if self.successor() == Some(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }

    pub fn is_rendered(self) -> bool {
        self >= RenderState::Rendered
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderState::Unrendered => "unrendered",
            RenderState::BeforeRender => "before-render",
            RenderState::Rendering => "rendering",
            RenderState::Rendered => "rendered",
            RenderState::AfterRender => "after-render",
        }
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransitionError {
    pub from: RenderState,
    pub to: RenderState,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot move from {} to {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

/// Named lifecycle notifications.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEventKind {
    /// Fired before construction starts; listeners may veto.
    BeforeRender,
    /// Fired once the platform element exists.
    Render,
    /// Fired once the node and its whole subtree are finalized.
    AfterRender,
}

impl LifecycleEventKind {
    pub fn is_cancellable(self) -> bool {
        matches!(self, LifecycleEventKind::BeforeRender)
    }

    pub fn name(self) -> &'static str {
        match self {
            LifecycleEventKind::BeforeRender => "beforerender",
            LifecycleEventKind::Render => "render",
            LifecycleEventKind::AfterRender => "afterrender",
        }
    }
}
