#![doc = r"Fiber reconciliation and cooperative scheduling core for Fiber-RS."]

pub mod applier;
pub mod commit;
pub mod element;
pub mod error;
mod fiber;
pub mod hash;
pub mod hooks;
pub mod platform;
mod reconcile;
pub mod renderer;
pub mod runtime;

pub use applier::{Applier, MemoryApplier, MemoryMutation, MemoryNode, MemoryNodeKind};
pub use commit::CommitStats;
pub use element::{
    create_element, text, Component, Element, ElementType, Event, EventHandler, HostTag, PropValue,
    Props, NODE_VALUE,
};
pub use error::{NodeError, RenderError};
pub use fiber::EffectTag;
pub use hooks::{use_effect, use_state, Cleanup, Dep, EffectCleanup, StateSetter};
pub use platform::{Clock, IdleDeadline, IdleScheduler, Unbounded};
pub use renderer::{Renderer, RendererOptions};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};

#[cfg(test)]
pub use runtime::TestScheduler;

/// Handle of a node owned by the host.
pub type NodeId = usize;

#[cfg(test)]
#[path = "tests/element_tests.rs"]
mod element_tests;

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod reconcile_tests;

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod hooks_tests;

#[cfg(test)]
#[path = "tests/applier_tests.rs"]
mod applier_tests;

#[cfg(test)]
#[path = "tests/renderer_tests.rs"]
mod renderer_tests;
