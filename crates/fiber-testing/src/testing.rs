use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fiber_core::{
    Applier, Element, IdleDeadline, IdleScheduler, MemoryApplier, NodeId, PropValue, RenderError,
    Renderer, RuntimeHandle, Runtime,
};

/// Scheduler that only counts idle requests; the test decides when slices run.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requests: AtomicUsize,
}

impl ManualScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl IdleScheduler for ManualScheduler {
    fn request_idle_callback(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Deadline that loses one millisecond per query. With the default yield
/// threshold a slice against `CountdownDeadline::units(n)` processes exactly
/// `n` fibers.
#[derive(Debug)]
pub struct CountdownDeadline {
    remaining_ms: Cell<u64>,
}

impl CountdownDeadline {
    pub fn units(units: u64) -> Self {
        Self {
            remaining_ms: Cell::new(units),
        }
    }
}

impl IdleDeadline for CountdownDeadline {
    fn time_remaining(&self) -> Duration {
        let remaining = self.remaining_ms.get().saturating_sub(1);
        self.remaining_ms.set(remaining);
        Duration::from_millis(remaining)
    }
}

/// Headless harness for exercising renders in tests.
///
/// Owns an in-memory host with a `root` container node and a renderer whose
/// idle callbacks are answered explicitly, either slice by slice or by
/// pumping until idle.
pub struct FiberTestRule {
    renderer: Renderer<MemoryApplier>,
    scheduler: Arc<ManualScheduler>,
    container: NodeId,
    content: Option<Box<dyn Fn() -> Element>>,
}

impl FiberTestRule {
    pub fn new() -> Self {
        let scheduler = Arc::new(ManualScheduler::default());
        let mut applier = MemoryApplier::new();
        let container = applier.create_node("root");
        let runtime = Runtime::new(scheduler.clone());
        Self {
            renderer: Renderer::with_runtime(applier, runtime),
            scheduler,
            container,
            content: None,
        }
    }

    /// Install `content` and render it to completion.
    pub fn set_content(&mut self, content: impl Fn() -> Element + 'static) -> Result<(), RenderError> {
        self.content = Some(Box::new(content));
        self.render_without_flush();
        self.pump_until_idle()
    }

    /// Render the installed content again and run it to completion.
    pub fn rerender(&mut self) -> Result<(), RenderError> {
        self.render_without_flush();
        self.pump_until_idle()
    }

    /// Start a render of the installed content without running any work.
    pub fn render_without_flush(&mut self) {
        if let Some(content) = &self.content {
            let element = content();
            self.renderer.render(element, self.container);
        }
    }

    /// Answer one idle callback with room for `units` fibers.
    pub fn run_slice(&mut self, units: u64) -> Result<(), RenderError> {
        self.renderer
            .perform_idle_work(&CountdownDeadline::units(units))
    }

    /// Drive the renderer until no render is in flight or requested.
    pub fn pump_until_idle(&mut self) -> Result<(), RenderError> {
        self.renderer.flush()
    }

    /// Deliver an event to `node` and process the renders it requests.
    pub fn dispatch(
        &mut self,
        node: NodeId,
        event_type: &str,
        value: Option<PropValue>,
    ) -> Result<usize, RenderError> {
        let handled = self
            .renderer
            .applier()
            .dispatch_event(node, event_type, value)?;
        if handled == 0 {
            log::debug!("no `{event_type}` listener on node {node}");
        }
        self.pump_until_idle()?;
        Ok(handled)
    }

    pub fn click(&mut self, node: NodeId) -> Result<usize, RenderError> {
        self.dispatch(node, "click", None)
    }

    /// First element node with `tag` under the container, in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        let applier = self.renderer.applier();
        let mut stack = vec![self.container];
        while let Some(id) = stack.pop() {
            let node = applier.node(id).ok()?;
            if id != self.container && node.tag() == Some(tag) {
                return Some(id);
            }
            stack.extend(node.children().iter().rev());
        }
        None
    }

    /// Concatenated text under the container.
    pub fn text(&self) -> String {
        self.renderer
            .applier()
            .text_content(self.container)
            .unwrap_or_default()
    }

    pub fn dump_tree(&self) -> String {
        self.renderer.applier().dump_tree(Some(self.container))
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Idle callbacks requested so far.
    pub fn idle_requests(&self) -> usize {
        self.scheduler.requests()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.renderer.runtime_handle()
    }

    pub fn applier(&self) -> &MemoryApplier {
        self.renderer.applier()
    }

    pub fn applier_mut(&mut self) -> &mut MemoryApplier {
        self.renderer.applier_mut()
    }

    pub fn renderer(&self) -> &Renderer<MemoryApplier> {
        &self.renderer
    }

    /// Raw renderer access for scenarios the helpers do not cover.
    pub fn renderer_mut(&mut self) -> &mut Renderer<MemoryApplier> {
        &mut self.renderer
    }
}

impl Default for FiberTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `FiberTestRule`.
pub fn run_test_renderer<R>(f: impl FnOnce(&mut FiberTestRule) -> R) -> R {
    let mut rule = FiberTestRule::new();
    f(&mut rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiber_core::{create_element, Props};

    #[test]
    fn rule_reports_content_and_counts_idle_requests() {
        run_test_renderer(|rule| {
            assert!(!rule.has_content());
            let before = rule.idle_requests();

            rule.set_content(|| create_element("p", Props::new(), ["hello"]))
                .expect("install content");

            assert!(rule.has_content());
            assert!(rule.idle_requests() > before);
            assert_eq!(rule.text(), "hello");
            assert!(rule.find_by_tag("p").is_some());
            assert!(rule.find_by_tag("root").is_none());
        });
    }

    #[test]
    fn countdown_deadline_runs_out_after_its_units() {
        let deadline = CountdownDeadline::units(2);
        assert_eq!(deadline.time_remaining(), Duration::from_millis(1));
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
    }
}
