//! Mutable work records mirroring the element tree.
//!
//! Ownership flows from the root down through `child` and `sibling`;
//! `parent` and `alternate` are lookup references only.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::element::{Element, ElementType, Props};
use crate::hooks::Hook;
use crate::NodeId;

pub(crate) type FiberRef = Rc<RefCell<Fiber>>;
pub(crate) type WeakFiber = Weak<RefCell<Fiber>>;

/// What the commit phase must do with a fiber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectTag {
    Placement,
    Update,
    Deletion,
}

pub(crate) struct Fiber {
    /// Absent only on the root fiber wrapping the container node.
    pub(crate) element_type: Option<ElementType>,
    pub(crate) props: Rc<Props>,
    pub(crate) dom: Option<NodeId>,
    pub(crate) parent: WeakFiber,
    pub(crate) child: Option<FiberRef>,
    pub(crate) sibling: Option<FiberRef>,
    pub(crate) alternate: WeakFiber,
    pub(crate) effect_tag: Option<EffectTag>,
    pub(crate) hooks: Vec<Hook>,
}

impl Fiber {
    fn new(element_type: Option<ElementType>, props: Rc<Props>, parent: WeakFiber) -> Self {
        Self {
            element_type,
            props,
            dom: None,
            parent,
            child: None,
            sibling: None,
            alternate: Weak::new(),
            effect_tag: None,
            hooks: Vec::new(),
        }
    }

    pub(crate) fn root(container: NodeId, props: Rc<Props>, alternate: WeakFiber) -> FiberRef {
        let mut fiber = Self::new(None, props, Weak::new());
        fiber.dom = Some(container);
        fiber.alternate = alternate;
        Rc::new(RefCell::new(fiber))
    }

    pub(crate) fn placement(element: &Element, parent: &FiberRef) -> FiberRef {
        let mut fiber = Self::new(
            Some(element.element_type().clone()),
            Rc::clone(element.props()),
            Rc::downgrade(parent),
        );
        fiber.effect_tag = Some(EffectTag::Placement);
        Rc::new(RefCell::new(fiber))
    }

    pub(crate) fn update(element: &Element, previous: &FiberRef, parent: &FiberRef) -> FiberRef {
        let mut fiber = Self::new(
            Some(element.element_type().clone()),
            Rc::clone(element.props()),
            Rc::downgrade(parent),
        );
        fiber.dom = previous.borrow().dom;
        fiber.alternate = Rc::downgrade(previous);
        fiber.effect_tag = Some(EffectTag::Update);
        Rc::new(RefCell::new(fiber))
    }

    pub(crate) fn has_type(&self, element_type: &ElementType) -> bool {
        self.element_type.as_ref() == Some(element_type)
    }

    pub(crate) fn alternate(&self) -> Option<FiberRef> {
        self.alternate.upgrade()
    }

    pub(crate) fn alternate_props(&self) -> Option<Rc<Props>> {
        let alternate = self.alternate()?;
        let props = Rc::clone(&alternate.borrow().props);
        Some(props)
    }

    pub(crate) fn parent(&self) -> Option<FiberRef> {
        self.parent.upgrade()
    }
}

/// Pre-order successor of `fiber`: its first child, else the first sibling
/// found walking up through parents. The walk never leaves `boundary`.
pub(crate) fn next_fiber(fiber: &FiberRef, boundary: Option<&FiberRef>) -> Option<FiberRef> {
    if let Some(child) = fiber.borrow().child.clone() {
        return Some(child);
    }
    let mut current = Rc::clone(fiber);
    loop {
        if boundary.is_some_and(|boundary| Rc::ptr_eq(boundary, &current)) {
            return None;
        }
        if let Some(sibling) = current.borrow().sibling.clone() {
            return Some(sibling);
        }
        let parent = current.borrow().parent()?;
        current = parent;
    }
}

/// Nearest ancestor of `fiber` owning a host node.
pub(crate) fn host_parent(fiber: &FiberRef) -> Option<NodeId> {
    let mut current = fiber.borrow().parent();
    while let Some(ancestor) = current {
        if let Some(dom) = ancestor.borrow().dom {
            return Some(dom);
        }
        current = ancestor.borrow().parent();
    }
    None
}

/// Every fiber of the subtree rooted at `root`, in pre-order.
pub(crate) fn subtree(root: &FiberRef) -> Vec<FiberRef> {
    let mut fibers = vec![Rc::clone(root)];
    let mut cursor = root.borrow().child.clone();
    while let Some(fiber) = cursor {
        cursor = next_fiber(&fiber, Some(root));
        fibers.push(fiber);
    }
    fibers
}
