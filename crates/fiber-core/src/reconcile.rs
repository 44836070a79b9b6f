use std::rc::Rc;

use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, FiberRef};

/// Diffs `elements` against the previous children of `wip_fiber` by
/// position and links the resulting fibers under it.
///
/// Same-index elements of the same type become `Update` fibers that keep the
/// previous host node. Anything else is a `Placement`; a previous fiber left
/// without a same-type partner is tagged `Deletion` and pushed to
/// `deletions`, never linked into the new tree. Keys are not considered.
pub(crate) fn reconcile_children(
    wip_fiber: &FiberRef,
    elements: &[Element],
    deletions: &mut Vec<FiberRef>,
) {
    let alternate = wip_fiber.borrow().alternate();
    let mut old_fiber = alternate.and_then(|alternate| {
        let child = alternate.borrow().child.clone();
        child
    });
    let mut first_child: Option<FiberRef> = None;
    let mut prev_sibling: Option<FiberRef> = None;
    let mut index = 0;

    while index < elements.len() || old_fiber.is_some() {
        let element = elements.get(index);
        let same_type = match (element, &old_fiber) {
            (Some(element), Some(old)) => old.borrow().has_type(element.element_type()),
            _ => false,
        };

        let new_fiber = match (element, &old_fiber) {
            (Some(element), Some(old)) if same_type => Some(Fiber::update(element, old, wip_fiber)),
            (Some(element), _) => Some(Fiber::placement(element, wip_fiber)),
            (None, _) => None,
        };

        if let Some(old) = old_fiber.as_ref().filter(|_| !same_type) {
            old.borrow_mut().effect_tag = Some(EffectTag::Deletion);
            deletions.push(Rc::clone(old));
        }

        old_fiber = old_fiber.and_then(|old| {
            let sibling = old.borrow().sibling.clone();
            sibling
        });

        if let Some(new_fiber) = new_fiber {
            match &prev_sibling {
                Some(prev) => prev.borrow_mut().sibling = Some(Rc::clone(&new_fiber)),
                None => first_child = Some(Rc::clone(&new_fiber)),
            }
            prev_sibling = Some(new_fiber);
        }
        index += 1;
    }

    wip_fiber.borrow_mut().child = first_child;
}
