//! Layout suspension.
//!
//! Layout managers live outside the engine; the engine only decides when
//! they run. While any [`LayoutSuspension`] is alive, layout requests are
//! queued. Dropping the last one runs the queued roots in a single batch.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::NodeId;

/// Runs layout for a batch of root nodes.
pub trait LayoutRunner {
    fn run_layouts(&mut self, roots: &[NodeId]);
}

impl<F> LayoutRunner for F
where
    F: FnMut(&[NodeId]),
{
    fn run_layouts(&mut self, roots: &[NodeId]) {
        self(roots)
    }
}

struct GateInner {
    depth: usize,
    pending: IndexSet<NodeId>,
    /// Taken out while a batch runs so the runner may use the gate.
    runner: Option<Box<dyn LayoutRunner>>,
    runs: usize,
}

/// Reference counted layout gate. Clones share the same counter.
#[derive(Clone)]
pub struct LayoutGate {
    inner: Rc<RefCell<GateInner>>,
}

impl Default for LayoutGate {
    fn default() -> Self {
        Self::new(|_roots: &[NodeId]| {})
    }
}

impl LayoutGate {
    pub fn new(runner: impl LayoutRunner + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GateInner {
                depth: 0,
                pending: IndexSet::new(),
                runner: Some(Box::new(runner)),
                runs: 0,
            })),
        }
    }

    pub fn suspend(&self) -> LayoutSuspension {
        self.inner.borrow_mut().depth += 1;
        LayoutSuspension {
            gate: self.clone(),
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.inner.borrow().depth > 0
    }

    pub fn depth(&self) -> usize {
        self.inner.borrow().depth
    }

    /// Number of layout batches run so far.
    pub fn runs(&self) -> usize {
        self.inner.borrow().runs
    }

    pub fn pending(&self) -> Vec<NodeId> {
        self.inner.borrow().pending.iter().copied().collect()
    }

    /// Runs layout for `root` now, or queues it while suspended.
    pub fn request(&self, root: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if inner.depth > 0 || inner.runner.is_none() {
            inner.pending.insert(root);
            return;
        }
        drop(inner);
        self.run(vec![root]);
    }

    /// Drops a queued request for a node that no longer exists.
    pub fn forget(&self, root: NodeId) {
        self.inner.borrow_mut().pending.shift_remove(&root);
    }

    fn release(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.depth = inner.depth.saturating_sub(1);
        if inner.depth > 0 || inner.pending.is_empty() || inner.runner.is_none() {
            return;
        }
        let roots: Vec<NodeId> = inner.pending.drain(..).collect();
        drop(inner);
        log::debug!("running deferred layout for {} root(s)", roots.len());
        self.run(roots);
    }

    /// Runs `roots` with no borrow of the gate held. Requests made by the
    /// runner itself are queued and run as further batches.
    fn run(&self, mut roots: Vec<NodeId>) {
        let runner = self.inner.borrow_mut().runner.take();
        let Some(mut runner) = runner else {
            self.inner.borrow_mut().pending.extend(roots);
            return;
        };
        loop {
            self.inner.borrow_mut().runs += 1;
            runner.run_layouts(&roots);
            let mut inner = self.inner.borrow_mut();
            if inner.depth > 0 || inner.pending.is_empty() {
                break;
            }
            roots = inner.pending.drain(..).collect();
        }
        self.inner.borrow_mut().runner = Some(runner);
    }
}

/// Keeps layouts suspended until dropped.
#[must_use = "layouts resume as soon as the suspension is dropped"]
pub struct LayoutSuspension {
    gate: LayoutGate,
}

impl Drop for LayoutSuspension {
    fn drop(&mut self) {
        self.gate.release();
    }
}
