use super::*;
use crate::fiber::{next_fiber, subtree, Fiber, FiberRef};
use crate::reconcile::reconcile_children;
use std::rc::{Rc, Weak};

fn item(id: &str) -> Element {
    create_element("li", Props::new().with("id", id), [id])
}

fn children_of(fiber: &FiberRef) -> Vec<FiberRef> {
    let mut children = Vec::new();
    let mut cursor = fiber.borrow().child.clone();
    while let Some(child) = cursor {
        cursor = child.borrow().sibling.clone();
        children.push(child);
    }
    children
}

fn committed_root(elements: &[Element]) -> FiberRef {
    let root = Fiber::root(0, Rc::new(Props::new()), Weak::new());
    let mut deletions = Vec::new();
    reconcile_children(&root, elements, &mut deletions);
    assert!(deletions.is_empty());
    root
}

fn next_root(previous: &FiberRef) -> FiberRef {
    Fiber::root(0, Rc::new(Props::new()), Rc::downgrade(previous))
}

#[test]
fn first_render_places_every_child() {
    let root = committed_root(&[item("a"), item("b")]);

    let children = children_of(&root);
    assert_eq!(children.len(), 2);
    for child in &children {
        let child = child.borrow();
        assert_eq!(child.effect_tag, Some(EffectTag::Placement));
        assert!(child.alternate().is_none());
        assert!(child.parent().is_some_and(|parent| Rc::ptr_eq(&parent, &root)));
    }
}

#[test]
fn removing_the_head_diffs_by_position() {
    let old_root = committed_root(&[item("a"), item("b"), item("c")]);
    let old_children = children_of(&old_root);

    let wip = next_root(&old_root);
    let mut deletions = Vec::new();
    reconcile_children(&wip, &[item("b"), item("c")], &mut deletions);

    let new_children = children_of(&wip);
    assert_eq!(new_children.len(), 2);
    for (index, child) in new_children.iter().enumerate() {
        let child = child.borrow();
        assert_eq!(child.effect_tag, Some(EffectTag::Update));
        let alternate = child.alternate().expect("update keeps its alternate");
        assert!(Rc::ptr_eq(&alternate, &old_children[index]));
    }
    // Position 0 now carries "b" but pairs with the fiber that rendered "a".
    assert_eq!(new_children[0].borrow().props.str("id"), Some("b"));
    assert_eq!(
        new_children[0].borrow().alternate_props().and_then(|props| props.str("id").map(str::to_owned)),
        Some("a".to_owned())
    );

    assert_eq!(deletions.len(), 1);
    assert!(Rc::ptr_eq(&deletions[0], &old_children[2]));
    assert_eq!(old_children[2].borrow().effect_tag, Some(EffectTag::Deletion));
}

#[test]
fn type_change_replaces_the_fiber() {
    let old_root = committed_root(&[create_element("div", Props::new(), ["x"])]);
    let old_child = children_of(&old_root).remove(0);
    old_child.borrow_mut().dom = Some(7);

    let wip = next_root(&old_root);
    let mut deletions = Vec::new();
    reconcile_children(&wip, &[create_element("span", Props::new(), ["x"])], &mut deletions);

    let new_child = children_of(&wip).remove(0);
    assert_eq!(new_child.borrow().effect_tag, Some(EffectTag::Placement));
    assert_eq!(new_child.borrow().dom, None);
    assert_eq!(deletions.len(), 1);
    assert!(Rc::ptr_eq(&deletions[0], &old_child));
}

#[test]
fn update_reuses_the_host_node() {
    let old_root = committed_root(&[item("a")]);
    children_of(&old_root)[0].borrow_mut().dom = Some(3);

    let wip = next_root(&old_root);
    let mut deletions = Vec::new();
    reconcile_children(&wip, &[item("z")], &mut deletions);

    assert_eq!(children_of(&wip)[0].borrow().dom, Some(3));
    assert!(deletions.is_empty());
}

#[test]
fn empty_children_delete_everything() {
    let old_root = committed_root(&[item("a"), item("b")]);

    let wip = next_root(&old_root);
    let mut deletions = Vec::new();
    reconcile_children(&wip, &[], &mut deletions);

    assert!(wip.borrow().child.is_none());
    assert_eq!(deletions.len(), 2);
    assert!(deletions
        .iter()
        .all(|fiber| fiber.borrow().effect_tag == Some(EffectTag::Deletion)));
}

#[test]
fn traversal_visits_children_before_siblings() {
    let root = committed_root(&[item("a"), item("b")]);
    for child in children_of(&root) {
        let props = Rc::clone(&child.borrow().props);
        let mut deletions = Vec::new();
        reconcile_children(&child, props.children(), &mut deletions);
    }

    let order: Vec<String> = subtree(&root)
        .iter()
        .skip(1)
        .map(|fiber| {
            let fiber = fiber.borrow();
            match fiber.props.str("id") {
                Some(id) => format!("li:{id}"),
                None => format!("text:{}", fiber.props.str(NODE_VALUE).unwrap_or_default()),
            }
        })
        .collect();
    assert_eq!(order, vec!["li:a", "text:a", "li:b", "text:b"]);

    let last = children_of(&children_of(&root)[1]).remove(0);
    assert!(next_fiber(&last, None).is_none());
    assert!(next_fiber(&last, Some(&root)).is_none());
}
