//! Commit phase: flushes the tags accumulated by a finished render pass to
//! the host in one synchronous sweep, then runs queued effects.

use std::rc::Rc;

use crate::applier::Applier;
use crate::element::{event_type, Props};
use crate::fiber::{host_parent, next_fiber, subtree, EffectTag, FiberRef};
use crate::hooks::{queued_effects, take_cleanups, Cleanup};
use crate::{NodeError, NodeId, RenderError};

/// Counters describing one commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    pub property_writes: usize,
    pub effects_run: usize,
}

pub(crate) fn commit_root<A: Applier + ?Sized>(
    applier: &mut A,
    root: &FiberRef,
    deletions: &[FiberRef],
) -> Result<CommitStats, RenderError> {
    let mut stats = CommitStats::default();

    let mut unmount_cleanups: Vec<Cleanup> = Vec::new();
    for fiber in deletions {
        commit_deletion(applier, fiber)?;
        stats.deletions += 1;
        for removed in subtree(fiber) {
            unmount_cleanups.extend(take_cleanups(&removed.borrow().hooks));
        }
    }

    let mut cursor = root.borrow().child.clone();
    while let Some(fiber) = cursor {
        commit_work(applier, &fiber, &mut stats)?;
        cursor = next_fiber(&fiber, Some(root));
    }

    for cleanup in unmount_cleanups {
        cleanup();
    }
    stats.effects_run = run_effects(root);
    Ok(stats)
}

fn commit_deletion<A: Applier + ?Sized>(applier: &mut A, fiber: &FiberRef) -> Result<(), RenderError> {
    let parent = host_parent(fiber).ok_or(RenderError::MissingHostParent)?;
    // Component fibers own no host node; their first host descendant does.
    let mut current = Some(Rc::clone(fiber));
    while let Some(candidate) = current {
        let (dom, child) = {
            let candidate = candidate.borrow();
            (candidate.dom, candidate.child.clone())
        };
        if let Some(dom) = dom {
            applier.remove_child(parent, dom)?;
            return Ok(());
        }
        current = child;
    }
    Err(RenderError::MissingHostNode)
}

fn commit_work<A: Applier + ?Sized>(
    applier: &mut A,
    fiber: &FiberRef,
    stats: &mut CommitStats,
) -> Result<(), RenderError> {
    let (effect_tag, dom) = {
        let fiber = fiber.borrow();
        (fiber.effect_tag, fiber.dom)
    };
    let Some(dom) = dom else {
        return Ok(());
    };
    match effect_tag {
        Some(EffectTag::Placement) => {
            let parent = host_parent(fiber).ok_or(RenderError::MissingHostParent)?;
            applier.insert_child(parent, dom)?;
            stats.placements += 1;
        }
        Some(EffectTag::Update) => {
            let fiber = fiber.borrow();
            let previous = fiber.alternate_props().unwrap_or_default();
            stats.property_writes += update_dom(applier, dom, &previous, &fiber.props)?;
            stats.updates += 1;
        }
        Some(EffectTag::Deletion) | None => {}
    }
    Ok(())
}

/// Brings the host node's properties and listeners from `previous` to
/// `next`. Returns the number of property writes issued.
pub(crate) fn update_dom<A: Applier + ?Sized>(
    applier: &mut A,
    dom: NodeId,
    previous: &Props,
    next: &Props,
) -> Result<usize, NodeError> {
    let mut writes = 0;

    for (name, _) in previous.properties() {
        if !next.contains(name) {
            applier.remove_property(dom, name)?;
            writes += 1;
        }
    }

    for (name, value) in next.properties() {
        if previous.get(name) != Some(value) {
            applier.set_property(dom, name, value)?;
            writes += 1;
        }
    }

    for (name, handler) in previous.listeners() {
        let unchanged = next
            .get(name)
            .and_then(|value| value.as_listener())
            .is_some_and(|next_handler| Rc::ptr_eq(next_handler, handler));
        if !unchanged {
            applier.remove_event_listener(dom, &event_type(name), handler)?;
        }
    }

    for (name, handler) in next.listeners() {
        let unchanged = previous
            .get(name)
            .and_then(|value| value.as_listener())
            .is_some_and(|previous_handler| Rc::ptr_eq(previous_handler, handler));
        if !unchanged {
            applier.add_event_listener(dom, &event_type(name), handler)?;
        }
    }

    Ok(writes)
}

/// Runs every effect queued on the committed tree, each preceded by the
/// cleanup its previous run left behind. Returns the number of effects run.
fn run_effects(root: &FiberRef) -> usize {
    let mut effects_run = 0;
    let mut cursor = Some(Rc::clone(root));
    while let Some(fiber) = cursor {
        let cells: Vec<_> = queued_effects(&fiber.borrow().hooks).collect();
        for cell in &cells {
            if let Some(cleanup) = cell.take_cleanup() {
                cleanup();
            }
        }
        for cell in &cells {
            if let Some(effect) = cell.take_effect() {
                cell.store_cleanup(effect().into_cleanup());
                effects_run += 1;
            }
        }
        cursor = next_fiber(&fiber, Some(root));
    }
    effects_run
}
