//! Platform abstraction traits for the fiber runtime.
//!
//! The work loop never decides on its own when to run. The host owns idle
//! detection: it is asked to call back through [`IdleScheduler`] and hands
//! the renderer an [`IdleDeadline`] describing how much of the idle period
//! is left.

use std::time::Duration;

/// Requests idle-time callbacks from the host.
///
/// Implementations only record the request; the host answers it later by
/// calling [`crate::Renderer::perform_idle_work`] with a fresh deadline.
pub trait IdleScheduler: Send + Sync {
    /// Ask the host to invoke the work loop during its next idle period.
    fn request_idle_callback(&self);
}

/// Remaining-time query handed to a single work slice.
pub trait IdleDeadline {
    /// Time left in the current idle period.
    fn time_remaining(&self) -> Duration;
}

/// Provides timing information for deadline implementations.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the time elapsed since `since`.
    fn elapsed(&self, since: Self::Instant) -> Duration;
}

/// Deadline that never runs out. A slice run against it finishes the whole
/// in-flight render.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl IdleDeadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}
