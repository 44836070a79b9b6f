use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::applier::Applier;
use crate::commit::{commit_root, update_dom, CommitStats};
use crate::element::{with_children, Component, Element, ElementType, HostTag, Props};
use crate::fiber::{next_fiber, Fiber, FiberRef};
use crate::hooks::render_with_hooks;
use crate::platform::{IdleDeadline, IdleScheduler, Unbounded};
use crate::reconcile::reconcile_children;
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};
use crate::{NodeId, RenderError};

/// Tuning knobs of the work loop.
#[derive(Clone, Copy, Debug)]
pub struct RendererOptions {
    /// A slice yields once the deadline reports less than this much time.
    pub yield_threshold: Duration,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
        }
    }
}

/// Owns the host and drives render passes over it, one fiber at a time.
pub struct Renderer<A: Applier> {
    applier: A,
    runtime: Runtime,
    options: RendererOptions,
    last_commit: Option<CommitStats>,
}

impl<A: Applier> Renderer<A> {
    pub fn new(applier: A) -> Self {
        Self::with_runtime(applier, Runtime::new(Arc::new(DefaultScheduler)))
    }

    pub fn with_scheduler(applier: A, scheduler: Arc<dyn IdleScheduler>) -> Self {
        Self::with_runtime(applier, Runtime::new(scheduler))
    }

    pub fn with_runtime(applier: A, runtime: Runtime) -> Self {
        Self::with_options(applier, runtime, RendererOptions::default())
    }

    pub fn with_options(applier: A, runtime: Runtime, options: RendererOptions) -> Self {
        runtime.request_idle_callback();
        Self {
            applier,
            runtime,
            options,
            last_commit: None,
        }
    }

    /// Starts a render pass placing `element` under `container`.
    ///
    /// The pass replaces any render still in flight and is diffed against
    /// the last committed tree.
    pub fn render(&mut self, element: Element, container: NodeId) {
        let root_props = Rc::new(with_children(Props::default(), vec![element]));
        let alternate = self
            .runtime
            .current_root()
            .map(|root| Rc::downgrade(&root))
            .unwrap_or_default();
        log::debug!("render requested into container {container}");
        self.runtime
            .install_wip_root(Fiber::root(container, root_props, alternate));
    }

    /// Answers one idle callback: processes fibers until the deadline drops
    /// under the yield threshold or the pass is done, commits a finished
    /// pass, then asks the host for the next idle callback.
    pub fn perform_idle_work(&mut self, deadline: &dyn IdleDeadline) -> Result<(), RenderError> {
        let result = self.work_loop(deadline);
        self.runtime.request_idle_callback();
        result
    }

    /// Runs slices without a deadline until no work is pending.
    pub fn flush(&mut self) -> Result<(), RenderError> {
        while self.runtime.has_pending_work() {
            self.perform_idle_work(&Unbounded)?;
        }
        Ok(())
    }

    fn work_loop(&mut self, deadline: &dyn IdleDeadline) -> Result<(), RenderError> {
        let mut should_yield = false;
        while !should_yield {
            let Some(fiber) = self.runtime.next_unit_of_work() else {
                break;
            };
            let generation = self.runtime.generation();
            let mut deletions = Vec::new();
            if let Err(err) = self.perform_unit_of_work(&fiber, &mut deletions) {
                self.runtime.abort(generation);
                return Err(err);
            }
            let next = next_fiber(&fiber, None);
            self.runtime.advance(generation, next, deletions);
            should_yield = deadline.time_remaining() < self.options.yield_threshold;
        }
        if should_yield && self.runtime.next_unit_of_work().is_some() {
            log::trace!("yielding to host with work remaining");
        }

        if let Some((root, deletions)) = self.runtime.begin_commit() {
            match commit_root(&mut self.applier, &root, &deletions) {
                Ok(stats) => {
                    log::debug!("committed render: {stats:?}");
                    self.last_commit = Some(stats);
                    self.runtime.finish_commit(root);
                }
                Err(err) => {
                    self.runtime.fail_commit();
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn perform_unit_of_work(
        &mut self,
        fiber: &FiberRef,
        deletions: &mut Vec<FiberRef>,
    ) -> Result<(), RenderError> {
        let element_type = fiber.borrow().element_type.clone();
        match element_type {
            Some(ElementType::Component(component)) => {
                self.update_function_component(fiber, &component, deletions)
            }
            Some(ElementType::Host(tag)) => self.update_host_component(fiber, Some(&tag), deletions),
            None => self.update_host_component(fiber, None, deletions),
        }
    }

    fn update_function_component(
        &mut self,
        fiber: &FiberRef,
        component: &Component,
        deletions: &mut Vec<FiberRef>,
    ) -> Result<(), RenderError> {
        let (props, previous_hooks) = {
            let fiber = fiber.borrow();
            let previous_hooks = fiber
                .alternate()
                .map(|alternate| {
                    let hooks = alternate.borrow().hooks.clone();
                    hooks
                })
                .unwrap_or_default();
            (Rc::clone(&fiber.props), previous_hooks)
        };
        log::trace!("rendering component `{}`", component.name());
        let (output, hooks) = render_with_hooks(
            component.name(),
            previous_hooks,
            self.runtime.handle(),
            || component.render(&props),
        );
        fiber.borrow_mut().hooks = hooks;
        let child = output.map_err(|source| RenderError::Component {
            name: component.name(),
            source,
        })?;
        reconcile_children(fiber, &[child], deletions);
        Ok(())
    }

    fn update_host_component(
        &mut self,
        fiber: &FiberRef,
        tag: Option<&HostTag>,
        deletions: &mut Vec<FiberRef>,
    ) -> Result<(), RenderError> {
        let (dom, props) = {
            let fiber = fiber.borrow();
            (fiber.dom, Rc::clone(&fiber.props))
        };
        if dom.is_none() {
            if let Some(tag) = tag {
                let node = match tag {
                    HostTag::Text => self.applier.create_text_node(),
                    HostTag::Element(name) => self.applier.create_node(name),
                };
                update_dom(&mut self.applier, node, &Props::default(), &props)?;
                fiber.borrow_mut().dom = Some(node);
            }
        }
        reconcile_children(fiber, props.children(), deletions);
        Ok(())
    }

    pub fn applier(&self) -> &A {
        &self.applier
    }

    pub fn applier_mut(&mut self) -> &mut A {
        &mut self.applier
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn options(&self) -> RendererOptions {
        self.options
    }

    /// True while a render is in flight or waiting to commit. A re-render
    /// requested before the first commit is not counted until that commit
    /// lands and starts it.
    pub fn has_pending_work(&self) -> bool {
        self.runtime.has_pending_work()
    }

    /// True while the work loop cursor points into an unfinished tree.
    pub fn has_next_unit_of_work(&self) -> bool {
        self.runtime.next_unit_of_work().is_some()
    }

    /// Deletions collected so far by the in-flight render.
    pub fn pending_deletions(&self) -> usize {
        self.runtime.pending_deletions()
    }

    pub fn has_committed(&self) -> bool {
        self.runtime.current_root().is_some()
    }

    pub fn last_commit(&self) -> Option<CommitStats> {
        self.last_commit
    }
}
