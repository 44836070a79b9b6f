//! Per-component local state.
//!
//! Hooks are paired with their previous-render counterpart purely by call
//! position: the n-th hook call of a render reads the n-th cell of the
//! alternate fiber. A component must therefore call the same hooks in the
//! same order on every render. Breaking that rule is a programmer error; a
//! cell whose kind or value type no longer matches is treated as absent.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::RuntimeHandle;

pub type Cleanup = Box<dyn FnOnce()>;

type EffectFn = Box<dyn FnOnce() -> EffectCleanup>;
type CleanupSlot = Rc<RefCell<Option<Cleanup>>>;
type Update<T> = Rc<dyn Fn(&T) -> T>;

#[derive(Clone)]
pub(crate) enum Hook {
    State(Rc<dyn Any>),
    Effect(Rc<EffectCell>),
}

/// Updates of one state hook, shared by every render of that hook.
///
/// Positions are absolute: `offset` counts updates already pruned from the
/// front, so a cell can remember how far it has folded.
struct UpdateQueue<T> {
    offset: usize,
    updates: Vec<Update<T>>,
}

impl<T> UpdateQueue<T> {
    fn end(&self) -> usize {
        self.offset + self.updates.len()
    }

    /// Drops updates every future render has already folded in.
    fn prune(&mut self, consumed: usize) {
        let count = consumed.saturating_sub(self.offset).min(self.updates.len());
        self.updates.drain(..count);
        self.offset += count;
    }

    fn since(&self, consumed: usize) -> Vec<Update<T>> {
        let start = consumed.saturating_sub(self.offset).min(self.updates.len());
        self.updates[start..].to_vec()
    }
}

pub(crate) struct StateCell<T> {
    state: T,
    /// Queue position up to which `state` already includes updates.
    consumed: usize,
    queue: Rc<RefCell<UpdateQueue<T>>>,
}

pub(crate) struct EffectCell {
    deps: Option<Vec<Dep>>,
    effect: RefCell<Option<EffectFn>>,
    // Shared with the cell this one was carried over from, so a discarded
    // render never loses a pending cleanup.
    cleanup: CleanupSlot,
}

impl EffectCell {
    pub(crate) fn take_effect(&self) -> Option<EffectFn> {
        self.effect.borrow_mut().take()
    }

    pub(crate) fn take_cleanup(&self) -> Option<Cleanup> {
        self.cleanup.borrow_mut().take()
    }

    pub(crate) fn store_cleanup(&self, cleanup: Option<Cleanup>) {
        *self.cleanup.borrow_mut() = cleanup;
    }
}

/// Value returned by an effect; holds the cleanup to run before the effect
/// fires again or when its component unmounts.
#[derive(Default)]
pub struct EffectCleanup {
    cleanup: Option<Cleanup>,
}

impl EffectCleanup {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn into_cleanup(self) -> Option<Cleanup> {
        self.cleanup
    }
}

impl From<()> for EffectCleanup {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

trait DepValue: Any {
    fn dep_eq(&self, other: &dyn DepValue) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + 'static> DepValue for T {
    fn dep_eq(&self, other: &dyn DepValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One effect dependency, compared by value against the previous render.
#[derive(Clone)]
pub struct Dep(Rc<dyn DepValue>);

impl Dep {
    pub fn new<T: PartialEq + 'static>(value: T) -> Self {
        Dep(Rc::new(value))
    }
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        self.0.dep_eq(&*other.0)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dep(..)")
    }
}

/// Builds the dependency list for [`use_effect`]: `deps![a, b]`.
#[macro_export]
macro_rules! deps {
    ($($dep:expr),* $(,)?) => {
        ::std::option::Option::Some(::std::vec![$($crate::Dep::new($dep)),*])
    };
}

/// Queues updates on one state cell and requests a re-render.
pub struct StateSetter<T> {
    cell: Rc<StateCell<T>>,
    runtime: RuntimeHandle,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T: 'static> StateSetter<T> {
    /// Enqueues `update`; the next render folds every queued update in order.
    pub fn update(&self, update: impl Fn(&T) -> T + 'static) {
        self.cell.queue.borrow_mut().updates.push(Rc::new(update));
        self.runtime.request_rerender();
    }

    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        self.update(move |_| value.clone());
    }

    /// Number of updates waiting for the next render.
    pub fn pending(&self) -> usize {
        self.cell.queue.borrow().end() - self.cell.consumed
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("consumed", &self.cell.consumed)
            .finish()
    }
}

struct HookFrame {
    component: &'static str,
    previous: Vec<Hook>,
    hooks: Vec<Hook>,
    runtime: RuntimeHandle,
}

impl HookFrame {
    fn index(&self) -> usize {
        self.hooks.len()
    }

    fn carried(&self) -> Option<&Hook> {
        self.previous.get(self.index())
    }
}

thread_local! {
    static CURRENT_HOOKS: RefCell<Vec<HookFrame>> = const { RefCell::new(Vec::new()) };
}

struct FrameGuard;

impl Drop for FrameGuard {
    fn drop(&mut self) {
        CURRENT_HOOKS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

fn with_current_frame<R>(f: impl FnOnce(&mut HookFrame) -> R) -> R {
    CURRENT_HOOKS.with(|stack| {
        let mut stack = stack.borrow_mut();
        let frame = stack
            .last_mut()
            .expect("hooks can only be called while a component renders");
        f(frame)
    })
}

/// Runs `render` with a fresh hook list whose cells pair up with `previous`.
pub(crate) fn render_with_hooks<R>(
    component: &'static str,
    previous: Vec<Hook>,
    runtime: RuntimeHandle,
    render: impl FnOnce() -> R,
) -> (R, Vec<Hook>) {
    CURRENT_HOOKS.with(|stack| {
        stack.borrow_mut().push(HookFrame {
            component,
            previous,
            hooks: Vec::new(),
            runtime,
        })
    });
    let guard = FrameGuard;
    let output = render();
    let hooks = CURRENT_HOOKS.with(|stack| {
        stack
            .borrow_mut()
            .last_mut()
            .map(|frame| std::mem::take(&mut frame.hooks))
            .unwrap_or_default()
    });
    drop(guard);
    (output, hooks)
}

/// Returns the current state and a setter for it.
///
/// On the first render the state starts at `initial`; afterwards it starts at
/// the previous render's value with every queued update applied in order.
pub fn use_state<T: Clone + 'static>(initial: T) -> (T, StateSetter<T>) {
    with_current_frame(|frame| {
        let carried = match frame.carried() {
            Some(Hook::State(cell)) => Rc::clone(cell).downcast::<StateCell<T>>().ok(),
            _ => None,
        };
        if carried.is_none() && frame.carried().is_some() {
            log::warn!(
                "hook {} of `{}` changed kind between renders",
                frame.index(),
                frame.component
            );
        }
        let (state, consumed, queue) = match carried {
            Some(cell) => {
                let (updates, end) = {
                    let mut queue = cell.queue.borrow_mut();
                    queue.prune(cell.consumed);
                    (queue.since(cell.consumed), queue.end())
                };
                let state = updates
                    .iter()
                    .fold(cell.state.clone(), |state, update| update(&state));
                (state, end, Rc::clone(&cell.queue))
            }
            None => {
                let queue = UpdateQueue {
                    offset: 0,
                    updates: Vec::new(),
                };
                (initial, 0, Rc::new(RefCell::new(queue)))
            }
        };
        let cell = Rc::new(StateCell {
            state: state.clone(),
            consumed,
            queue,
        });
        frame.hooks.push(Hook::State(cell.clone()));
        let setter = StateSetter {
            cell,
            runtime: frame.runtime.clone(),
        };
        (state, setter)
    })
}

/// Schedules `effect` to run after the next commit when `deps` changed.
///
/// `None` deps rerun the effect on every commit. The cleanup returned by the
/// previous run is invoked right before the effect fires again.
pub fn use_effect<F, R>(effect: F, deps: Option<Vec<Dep>>)
where
    F: FnOnce() -> R + 'static,
    R: Into<EffectCleanup>,
{
    with_current_frame(|frame| {
        let carried = match frame.carried() {
            Some(Hook::Effect(cell)) => Some(Rc::clone(cell)),
            _ => None,
        };
        let changed = match (&carried, &deps) {
            (Some(previous), Some(deps)) => match &previous.deps {
                Some(previous_deps) => {
                    previous_deps.len() != deps.len()
                        || deps.iter().zip(previous_deps).any(|(dep, old)| dep != old)
                }
                None => true,
            },
            _ => true,
        };
        let cleanup = carried
            .map(|previous| Rc::clone(&previous.cleanup))
            .unwrap_or_default();
        let effect: Option<EffectFn> = if changed {
            Some(Box::new(move || -> EffectCleanup { effect().into() }))
        } else {
            None
        };
        frame.hooks.push(Hook::Effect(Rc::new(EffectCell {
            deps,
            effect: RefCell::new(effect),
            cleanup,
        })));
    })
}

/// Effect cells of `hooks` that carry an effect queued for this commit.
pub(crate) fn queued_effects(hooks: &[Hook]) -> impl Iterator<Item = Rc<EffectCell>> + '_ {
    hooks.iter().filter_map(|hook| match hook {
        Hook::Effect(cell) if cell.effect.borrow().is_some() => Some(Rc::clone(cell)),
        _ => None,
    })
}

/// Cleanups still held by `hooks`, taken so they run exactly once.
pub(crate) fn take_cleanups(hooks: &[Hook]) -> Vec<Cleanup> {
    hooks
        .iter()
        .filter_map(|hook| match hook {
            Hook::Effect(cell) => cell.take_cleanup(),
            Hook::State(_) => None,
        })
        .collect()
}
