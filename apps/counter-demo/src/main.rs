use fiber_app_shell::AppShell;
use fiber_core::{
    create_element, deps, use_effect, use_state, Applier, Component, EffectCleanup, Element,
    MemoryApplier, Props,
};

const CLICKS: usize = 3;

fn history(props: &Props) -> Element {
    let count = props.int("count").unwrap_or_default();
    let items: Vec<Element> = (1..=count)
        .map(|step| create_element("li", Props::new(), [format!("step {step}")]))
        .collect();
    create_element("ul", Props::new().with("class", "history"), items)
}

fn counter_app(_: &Props) -> Element {
    let (count, set_count) = use_state(0i64);

    use_effect(
        move || {
            log::info!("count is now {count}");
            EffectCleanup::new(move || log::debug!("leaving count {count}"))
        },
        deps![count],
    );

    let increment = Props::new()
        .with("id", "increment")
        .on("onClick", move |_| set_count.update(|count| count + 1));
    let history = Component::new("History", history);

    create_element(
        "main",
        Props::new(),
        [
            create_element("h1", Props::new(), ["Fiber Counter"]),
            create_element("p", Props::new(), [format!("Clicked {count} times")]),
            create_element("button", increment, ["Increment"]),
            history.element(Props::new().with("count", count)),
        ],
    )
}

fn find_button(applier: &MemoryApplier, root: usize) -> Option<usize> {
    let node = applier.node(root).ok()?;
    if node.tag() == Some("button") {
        return Some(root);
    }
    node.children()
        .iter()
        .find_map(|child| find_button(applier, *child))
}

fn main() {
    env_logger::init();

    println!("=== Fiber-RS Counter Example ===");
    println!("Renders a counter into an in-memory host, clicks it {CLICKS} times,");
    println!("and prints the host tree after every commit.");
    println!();

    let mut applier = MemoryApplier::new();
    let container = applier.create_node("body");
    let app = Component::new("CounterApp", counter_app);
    let mut shell = AppShell::new(applier, container, app.element(Props::new()));

    if let Err(err) = shell.run_until_idle() {
        log::error!("initial render failed: {err}");
        return;
    }
    println!("{}", shell.applier().dump_tree(Some(container)));

    for click in 1..=CLICKS {
        let Some(button) = find_button(shell.applier(), container) else {
            log::error!("increment button not found");
            return;
        };
        shell.dispatch(button, "click", None);
        while shell.should_render() {
            shell.update();
            if !shell.renderer().has_pending_work() {
                break;
            }
        }
        println!("--- after click {click} ({} slices) ---", shell.slices());
        println!("{}", shell.applier().dump_tree(Some(container)));
    }

    shell.log_debug_info();
}
