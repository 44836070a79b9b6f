use std::time::{Duration, Instant};

use fiber_core::{
    Applier, Element, MemoryApplier, NodeId, PropValue, RenderError, Renderer, RendererOptions,
};
use fiber_runtime_std::StdRuntime;

/// Idle budget handed to each slice when the host does not pick one.
pub const DEFAULT_SLICE_BUDGET: Duration = Duration::from_millis(8);

pub struct AppShell<A: Applier> {
    runtime: StdRuntime,
    renderer: Renderer<A>,
    container: NodeId,
    slice_budget: Duration,
    start_time: Instant,
    slices: u64,
}

impl<A: Applier> AppShell<A> {
    pub fn new(applier: A, container: NodeId, content: Element) -> Self {
        Self::with_options(
            applier,
            container,
            content,
            RendererOptions::default(),
            DEFAULT_SLICE_BUDGET,
        )
    }

    pub fn with_options(
        applier: A,
        container: NodeId,
        content: Element,
        options: RendererOptions,
        slice_budget: Duration,
    ) -> Self {
        let runtime = StdRuntime::new();
        let mut renderer = Renderer::with_options(applier, runtime.runtime(), options);
        renderer.render(content, container);
        Self {
            runtime,
            renderer,
            container,
            slice_budget,
            start_time: Instant::now(),
            slices: 0,
        }
    }

    /// Replace the rendered content; the work happens over later updates.
    pub fn set_content(&mut self, content: Element) {
        self.renderer.render(content, self.container);
    }

    pub fn set_slice_budget(&mut self, budget: Duration) {
        self.slice_budget = budget;
    }

    pub fn should_render(&self) -> bool {
        self.runtime.take_idle_request() || self.renderer.has_pending_work()
    }

    /// Answers one idle callback with a slice of the configured budget.
    pub fn update(&mut self) {
        if let Err(err) = self.try_update() {
            log::error!("render failed: {err}");
        }
    }

    pub fn try_update(&mut self) -> Result<(), RenderError> {
        let deadline = self.runtime.deadline(self.slice_budget);
        self.slices += 1;
        let result = self.renderer.perform_idle_work(&deadline);
        if let Some(stats) = self.renderer.last_commit() {
            log::trace!(
                "slice {} at {:?}: last commit {stats:?}",
                self.slices,
                self.start_time.elapsed()
            );
        }
        result
    }

    /// Keeps slicing until no render is in flight or requested.
    pub fn run_until_idle(&mut self) -> Result<(), RenderError> {
        while self.renderer.has_pending_work() {
            self.try_update()?;
        }
        Ok(())
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Idle slices answered so far.
    pub fn slices(&self) -> u64 {
        self.slices
    }

    pub fn renderer(&mut self) -> &mut Renderer<A> {
        &mut self.renderer
    }

    pub fn applier(&self) -> &A {
        self.renderer.applier()
    }
}

impl AppShell<MemoryApplier> {
    /// Delivers an event to `node`. The renders it requests run on later
    /// updates.
    pub fn dispatch(&self, node: NodeId, event_type: &str, value: Option<PropValue>) -> usize {
        match self
            .renderer
            .applier()
            .dispatch_event(node, event_type, value)
        {
            Ok(handled) => handled,
            Err(err) => {
                log::warn!("dropping `{event_type}` event: {err}");
                0
            }
        }
    }

    pub fn log_debug_info(&self) {
        log::info!(
            "current tree:\n{}",
            self.renderer.applier().dump_tree(Some(self.container))
        );
    }
}
