use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::fiber::{Fiber, FiberRef};
use crate::platform::IdleScheduler;

/// Bookkeeping of the single active tree.
///
/// `wip_root`, `next_unit_of_work` and `deletions` live exactly as long as one
/// render pass; `current_root` survives from commit to commit.
#[derive(Default)]
pub(crate) struct RootState {
    pub(crate) current_root: Option<FiberRef>,
    pub(crate) wip_root: Option<FiberRef>,
    pub(crate) next_unit_of_work: Option<FiberRef>,
    pub(crate) deletions: Vec<FiberRef>,
}

struct RuntimeInner {
    scheduler: Arc<dyn IdleScheduler>,
    roots: RefCell<RootState>,
    /// Bumped every time a new render replaces the in-flight one.
    generation: Cell<u64>,
    committing: Cell<bool>,
    rerender_requested: Cell<bool>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn IdleScheduler>) -> Self {
        Self {
            scheduler,
            roots: RefCell::new(RootState::default()),
            generation: Cell::new(0),
            committing: Cell::new(false),
            rerender_requested: Cell::new(false),
        }
    }

    fn request_idle_callback(&self) {
        self.scheduler.request_idle_callback();
    }

    fn install_wip_root(&self, root: FiberRef) {
        let mut roots = self.roots.borrow_mut();
        if roots.wip_root.is_some() {
            log::debug!("discarding in-flight render");
        }
        roots.deletions.clear();
        roots.next_unit_of_work = Some(Rc::clone(&root));
        roots.wip_root = Some(root);
        self.generation.set(self.generation.get() + 1);
        drop(roots);
        self.request_idle_callback();
    }

    fn request_rerender(&self) {
        if self.committing.get() {
            self.rerender_requested.set(true);
            return;
        }
        let current = self.roots.borrow().current_root.clone();
        let Some(current) = current else {
            // Nothing committed yet; re-render once the first commit lands.
            self.rerender_requested.set(true);
            return;
        };
        let (dom, props) = {
            let current = current.borrow();
            (current.dom, Rc::clone(&current.props))
        };
        let Some(container) = dom else {
            log::error!("committed root lost its container node");
            return;
        };
        log::debug!("state update scheduled a render");
        self.install_wip_root(Fiber::root(container, props, Rc::downgrade(&current)));
    }
}

#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn IdleScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn request_idle_callback(&self) {
        self.inner.request_idle_callback();
    }

    /// True while a render pass is in flight or waiting to commit.
    pub fn has_pending_work(&self) -> bool {
        self.inner.roots.borrow().wip_root.is_some()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.inner.generation.get()
    }

    pub(crate) fn install_wip_root(&self, root: FiberRef) {
        self.inner.install_wip_root(root);
    }

    pub(crate) fn current_root(&self) -> Option<FiberRef> {
        self.inner.roots.borrow().current_root.clone()
    }

    pub(crate) fn next_unit_of_work(&self) -> Option<FiberRef> {
        self.inner.roots.borrow().next_unit_of_work.clone()
    }

    pub(crate) fn pending_deletions(&self) -> usize {
        self.inner.roots.borrow().deletions.len()
    }

    /// Stores the outcome of one unit of work, unless a newer render replaced
    /// the pass it belonged to while it ran.
    pub(crate) fn advance(&self, generation: u64, next: Option<FiberRef>, deletions: Vec<FiberRef>) {
        if generation != self.generation() {
            return;
        }
        let mut roots = self.inner.roots.borrow_mut();
        roots.next_unit_of_work = next;
        roots.deletions.extend(deletions);
    }

    /// Drops the in-flight pass of `generation`, leaving the committed tree
    /// untouched.
    pub(crate) fn abort(&self, generation: u64) {
        if generation != self.generation() {
            return;
        }
        let mut roots = self.inner.roots.borrow_mut();
        roots.wip_root = None;
        roots.next_unit_of_work = None;
        roots.deletions.clear();
        // Nothing committed means nothing for a deferred re-render to redo.
        if roots.current_root.is_none() {
            self.inner.rerender_requested.set(false);
        }
    }

    /// Takes the finished work-in-progress tree and its deletions when the
    /// cursor has run off the end of the tree.
    pub(crate) fn begin_commit(&self) -> Option<(FiberRef, Vec<FiberRef>)> {
        let mut roots = self.inner.roots.borrow_mut();
        if roots.next_unit_of_work.is_some() {
            return None;
        }
        let root = roots.wip_root.clone()?;
        let deletions = std::mem::take(&mut roots.deletions);
        self.inner.committing.set(true);
        Some((root, deletions))
    }

    /// Makes `root` the committed tree and starts any render requested while
    /// the commit ran.
    pub(crate) fn finish_commit(&self, root: FiberRef) {
        {
            let mut roots = self.inner.roots.borrow_mut();
            roots.current_root = Some(root);
            roots.wip_root = None;
            roots.next_unit_of_work = None;
            roots.deletions.clear();
        }
        self.inner.committing.set(false);
        self.flush_deferred_rerender();
    }

    /// Ends a commit that failed half way; the previous tree stays current.
    pub(crate) fn fail_commit(&self) {
        {
            let mut roots = self.inner.roots.borrow_mut();
            roots.wip_root = None;
            roots.next_unit_of_work = None;
            roots.deletions.clear();
        }
        self.inner.committing.set(false);
        self.flush_deferred_rerender();
    }

    fn flush_deferred_rerender(&self) {
        if self.inner.rerender_requested.replace(false) {
            self.inner.request_rerender();
        }
    }
}

/// Non-owning handle given to state setters.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Replaces any in-flight render with a fresh one rooted at the committed
    /// tree.
    pub fn request_rerender(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_rerender();
        }
    }

    pub fn request_idle_callback(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_idle_callback();
        }
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl IdleScheduler for DefaultScheduler {
    fn request_idle_callback(&self) {}
}

/// Counts idle callback requests instead of serving them.
#[cfg(test)]
#[derive(Default)]
pub struct TestScheduler {
    requests: AtomicUsize,
}

#[cfg(test)]
impl TestScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl IdleScheduler for TestScheduler {
    fn request_idle_callback(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}
