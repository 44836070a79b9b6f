//! Testing utilities and harness for Fiber-RS

pub mod testing;

// Re-export testing utilities
pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use fiber_core::{
        create_element, deps, text, use_effect, use_state, Component, EffectCleanup, Element,
        Props, PropValue, RenderError,
    };
}
