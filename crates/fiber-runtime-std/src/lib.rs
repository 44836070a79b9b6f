//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform traits
//! defined in `fiber-core`. A host constructs a [`StdRuntime`], hands its
//! runtime to a [`fiber_core::Renderer`], and answers each idle request with
//! a [`SliceDeadline`] measured by [`StdClock`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use fiber_core::{Clock, IdleDeadline, IdleScheduler, Runtime, RuntimeHandle};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records idle requests for a host event loop to poll.
pub struct StdScheduler {
    idle_requested: AtomicBool,
    idle_waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            idle_requested: AtomicBool::new(false),
            idle_waker: RwLock::new(None),
        }
    }

    /// Returns whether an idle callback has been requested since the last call.
    pub fn take_idle_request(&self) -> bool {
        self.idle_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever an idle callback is requested.
    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    /// Clears any registered idle waker.
    pub fn clear_idle_waker(&self) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .idle_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("idle_requested", &self.idle_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl IdleScheduler for StdScheduler {
    fn request_idle_callback(&self) {
        self.idle_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed(&self, since: Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Idle period of fixed length starting when the deadline is created.
#[derive(Clone)]
pub struct SliceDeadline<C: Clock = StdClock> {
    clock: C,
    started: C::Instant,
    budget: Duration,
}

impl<C: Clock> SliceDeadline<C> {
    pub fn new(clock: C, budget: Duration) -> Self {
        let started = clock.now();
        Self {
            clock,
            started,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl SliceDeadline<StdClock> {
    /// Slice of `budget` measured from now with the system clock.
    pub fn starting_now(budget: Duration) -> Self {
        Self::new(StdClock, budget)
    }
}

impl<C: Clock> fmt::Debug for SliceDeadline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceDeadline")
            .field("budget", &self.budget)
            .field("remaining", &self.time_remaining())
            .finish()
    }
}

impl<C: Clock> IdleDeadline for SliceDeadline<C> {
    fn time_remaining(&self) -> Duration {
        self.budget
            .saturating_sub(self.clock.elapsed(self.started))
    }
}

/// Convenience container bundling the standard scheduler and clock.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: StdClock,
    runtime: Runtime,
}

impl StdRuntime {
    /// Creates a new standard runtime instance.
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            clock: StdClock,
            runtime,
        }
    }

    /// Returns a [`fiber_core::Runtime`] wired to the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn clock(&self) -> StdClock {
        self.clock
    }

    /// Deadline for one idle period of `budget`, starting now.
    pub fn deadline(&self, budget: Duration) -> SliceDeadline {
        SliceDeadline::new(self.clock, budget)
    }

    /// Returns whether an idle callback was requested since the last poll.
    pub fn take_idle_request(&self) -> bool {
        let requested = self.scheduler.take_idle_request();
        if requested {
            log::trace!("idle callback requested");
        }
        requested
    }

    /// Registers a waker to be called when the runtime requests an idle callback.
    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_idle_waker(waker);
    }

    /// Clears any previously registered idle waker.
    pub fn clear_idle_waker(&self) {
        self.scheduler.clear_idle_waker();
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use fiber_core::{
        create_element, text, use_state, Applier, Clock, Component, IdleDeadline, MemoryApplier,
        Props, Renderer, StateSetter,
    };

    use super::{SliceDeadline, StdRuntime};

    /// Clock frozen at a manually advanced offset.
    #[derive(Clone, Default)]
    struct ManualClock {
        now: Arc<AtomicUsize>,
    }

    impl ManualClock {
        fn advance(&self, millis: usize) {
            self.now.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        type Instant = usize;

        fn now(&self) -> usize {
            self.now.load(Ordering::SeqCst)
        }

        fn elapsed(&self, since: usize) -> Duration {
            Duration::from_millis((self.now() - since) as u64)
        }
    }

    #[test]
    fn slice_deadline_counts_down_and_saturates() {
        let clock = ManualClock::default();
        let deadline = SliceDeadline::new(clock.clone(), Duration::from_millis(10));
        assert_eq!(deadline.time_remaining(), Duration::from_millis(10));

        clock.advance(4);
        assert_eq!(deadline.time_remaining(), Duration::from_millis(6));

        clock.advance(20);
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn waker_fires_on_every_idle_request() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        {
            let wakes = Arc::clone(&wakes);
            runtime.set_idle_waker(move || {
                wakes.fetch_add(1, Ordering::SeqCst);
            });
        }

        runtime.runtime().request_idle_callback();
        runtime.runtime_handle().request_idle_callback();
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert!(runtime.take_idle_request());
        assert!(!runtime.take_idle_request());

        runtime.clear_idle_waker();
        runtime.runtime().request_idle_callback();
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn std_runtime_requests_idle_time_and_rerenders_on_state_change() {
        let runtime = StdRuntime::new();
        let mut applier = MemoryApplier::new();
        let container = applier.create_node("root");
        let mut renderer = Renderer::with_runtime(applier, runtime.runtime());
        assert!(runtime.take_idle_request());

        let slot: Rc<RefCell<Option<StateSetter<i64>>>> = Rc::default();
        let counter = {
            let slot = Rc::clone(&slot);
            Component::new("Counter", move |_| {
                let (count, set_count) = use_state(0i64);
                *slot.borrow_mut() = Some(set_count);
                create_element("span", Props::new(), [text(count)])
            })
        };

        renderer.render(counter.element(Props::new()), container);
        while runtime.take_idle_request() {
            renderer
                .perform_idle_work(&runtime.deadline(Duration::from_millis(16)))
                .expect("slice");
            if !renderer.has_pending_work() {
                break;
            }
        }
        assert!(renderer.has_committed());

        let set_count = slot.borrow().clone().expect("state captured during render");
        set_count.set(1);
        assert!(
            runtime.take_idle_request(),
            "state change should request idle time"
        );
        renderer.flush().expect("re-render");

        assert_eq!(renderer.applier().text_content(container).expect("text"), "1");
    }
}
