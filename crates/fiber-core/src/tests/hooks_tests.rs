use super::*;
use crate::deps;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Slot<T> = Rc<RefCell<Option<StateSetter<T>>>>;
type Log = Rc<RefCell<Vec<String>>>;

fn mount(element: Element) -> (Renderer<MemoryApplier>, NodeId) {
    let mut applier = MemoryApplier::new();
    let container = applier.create_node("root");
    let mut renderer = Renderer::new(applier);
    renderer.render(element, container);
    renderer.flush().expect("initial render");
    (renderer, container)
}

fn setter<T>(slot: &Slot<T>) -> StateSetter<T> {
    slot.borrow().clone().expect("component rendered")
}

fn text_of(renderer: &Renderer<MemoryApplier>, container: NodeId) -> String {
    renderer
        .applier()
        .text_content(container)
        .expect("container exists")
}

fn counter(slot: &Slot<i64>, initial: i64) -> Component {
    let slot = Rc::clone(slot);
    Component::new("Counter", move |_| {
        let (count, set_count) = use_state(initial);
        *slot.borrow_mut() = Some(set_count);
        text(count)
    })
}

#[test]
fn state_survives_renders_and_folds_updates_in_order() {
    let slot: Slot<i64> = Rc::default();
    let (mut renderer, container) = mount(counter(&slot, 1).element(Props::new()));
    assert_eq!(text_of(&renderer, container), "1");

    let set_count = setter(&slot);
    set_count.update(|count| count + 1);
    set_count.update(|count| count + 1);
    assert_eq!(set_count.pending(), 2);
    renderer.flush().expect("re-render");

    assert_eq!(text_of(&renderer, container), "3");
    assert_eq!(setter(&slot).pending(), 0);
}

#[test]
fn set_replaces_the_value() {
    let slot: Slot<i64> = Rc::default();
    let (mut renderer, container) = mount(counter(&slot, 5).element(Props::new()));

    setter(&slot).update(|count| count * 10);
    setter(&slot).set(7);
    renderer.flush().expect("re-render");

    assert_eq!(text_of(&renderer, container), "7");
}

#[test]
fn stale_setter_still_reaches_the_hook() {
    let slot: Slot<i64> = Rc::default();
    let (mut renderer, container) = mount(counter(&slot, 0).element(Props::new()));
    let first = setter(&slot);

    first.update(|count| count + 1);
    renderer.flush().expect("re-render");
    // `first` belongs to a render that is no longer current.
    first.update(|count| count + 1);
    renderer.flush().expect("re-render");

    assert_eq!(text_of(&renderer, container), "2");
}

#[test]
fn setter_called_during_render_restarts_until_stable() {
    let renders = Rc::new(Cell::new(0));
    let component = {
        let renders = Rc::clone(&renders);
        Component::new("Settle", move |_| {
            renders.set(renders.get() + 1);
            let (count, set_count) = use_state(0i64);
            if count < 3 {
                set_count.update(|count| count + 1);
            }
            text(count)
        })
    };

    let (renderer, container) = mount(component.element(Props::new()));

    assert_eq!(text_of(&renderer, container), "3");
    assert!(!renderer.has_pending_work());
    assert_eq!(renders.get(), 4);
}

#[test]
fn hook_kind_change_starts_from_scratch() {
    let use_text = Rc::new(Cell::new(false));
    let slot: Slot<i64> = Rc::default();
    let component = {
        let use_text = Rc::clone(&use_text);
        let slot = Rc::clone(&slot);
        Component::new("Shifty", move |_| {
            if use_text.get() {
                let (value, _) = use_state(String::from("fresh"));
                text(value)
            } else {
                let (count, set_count) = use_state(1i64);
                *slot.borrow_mut() = Some(set_count);
                text(count)
            }
        })
    };
    let (mut renderer, container) = mount(component.element(Props::new()));

    use_text.set(true);
    setter(&slot).update(|count| count + 1);
    renderer.flush().expect("re-render");

    assert_eq!(text_of(&renderer, container), "fresh");
}

#[test]
fn effects_are_gated_by_their_dependencies() {
    let log: Log = Rc::default();
    let slot: Slot<i64> = Rc::default();
    let component = {
        let log = Rc::clone(&log);
        let slot = Rc::clone(&slot);
        Component::new("Tracker", move |_| {
            let (count, set_count) = use_state(1i64);
            *slot.borrow_mut() = Some(set_count);

            let effect_log = Rc::clone(&log);
            use_effect(
                move || {
                    effect_log.borrow_mut().push(format!("effect {count}"));
                    let cleanup_log = Rc::clone(&effect_log);
                    EffectCleanup::new(move || {
                        cleanup_log.borrow_mut().push(format!("cleanup {count}"))
                    })
                },
                deps![count],
            );

            let mount_log = Rc::clone(&log);
            use_effect(move || mount_log.borrow_mut().push("mount".to_owned()), deps![]);
            text(count)
        })
    };

    let (mut renderer, _) = mount(component.element(Props::new()));
    assert_eq!(*log.borrow(), vec!["effect 1", "mount"]);
    assert_eq!(renderer.last_commit().map(|stats| stats.effects_run), Some(2));

    setter(&slot).set(1);
    renderer.flush().expect("re-render");
    assert_eq!(*log.borrow(), vec!["effect 1", "mount"]);
    assert_eq!(renderer.last_commit().map(|stats| stats.effects_run), Some(0));

    setter(&slot).update(|count| count + 1);
    renderer.flush().expect("re-render");
    assert_eq!(
        *log.borrow(),
        vec!["effect 1", "mount", "cleanup 1", "effect 2"]
    );
}

#[test]
fn effects_without_dependencies_run_after_every_commit() {
    let runs = Rc::new(Cell::new(0));
    let slot: Slot<i64> = Rc::default();
    let component = {
        let runs = Rc::clone(&runs);
        let slot = Rc::clone(&slot);
        Component::new("Always", move |_| {
            let (count, set_count) = use_state(0i64);
            *slot.borrow_mut() = Some(set_count);
            let runs = Rc::clone(&runs);
            use_effect(move || runs.set(runs.get() + 1), None);
            text(count)
        })
    };

    let (mut renderer, _) = mount(component.element(Props::new()));
    setter(&slot).set(0);
    renderer.flush().expect("re-render");
    setter(&slot).set(0);
    renderer.flush().expect("re-render");

    assert_eq!(runs.get(), 3);
}

#[test]
fn setter_inside_an_effect_schedules_another_render() {
    let component = Component::new("Loader", |_| {
        let (value, set_value) = use_state(String::from("loading"));
        use_effect(move || set_value.set(String::from("ready")), deps![]);
        text(value)
    });

    let (renderer, container) = mount(component.element(Props::new()));

    assert_eq!(text_of(&renderer, container), "ready");
    assert!(!renderer.has_pending_work());
}

#[test]
fn unmounting_runs_pending_cleanups() {
    let log: Log = Rc::default();
    let child = {
        let log = Rc::clone(&log);
        Component::new("Child", move |_| {
            let log = Rc::clone(&log);
            use_effect(
                move || {
                    log.borrow_mut().push("mounted".to_owned());
                    let log = Rc::clone(&log);
                    EffectCleanup::new(move || log.borrow_mut().push("unmounted".to_owned()))
                },
                deps![],
            );
            create_element("span", Props::new(), ["child"])
        })
    };

    let (mut renderer, container) = mount(create_element(
        "div",
        Props::new(),
        [child.element(Props::new())],
    ));
    assert_eq!(text_of(&renderer, container), "child");

    renderer.render(
        create_element("div", Props::new(), Vec::<Element>::new()),
        container,
    );
    renderer.flush().expect("re-render");

    assert_eq!(*log.borrow(), vec!["mounted", "unmounted"]);
    assert_eq!(text_of(&renderer, container), "");
}

#[test]
fn setter_outlives_its_runtime_harmlessly() {
    let slot: Slot<i64> = Rc::default();
    let (renderer, _) = mount(counter(&slot, 0).element(Props::new()));
    let set_count = setter(&slot);
    drop(renderer);

    set_count.update(|count| count + 1);
    assert_eq!(set_count.pending(), 1);
}

#[test]
#[should_panic(expected = "hooks can only be called while a component renders")]
fn hooks_outside_a_render_panic() {
    let _ = use_state(0);
}
