use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use fiber_core::{create_element, Applier, Element, MemoryApplier, Props, Renderer};

fn rows(count: usize, label: &str) -> Element {
    let items: Vec<Element> = (0..count)
        .map(|index| {
            create_element(
                "li",
                Props::new().with("index", index as i64),
                [format!("{label} {index}")],
            )
        })
        .collect();
    create_element("ul", Props::new(), items)
}

fn identical_rerender(c: &mut Criterion) {
    let mut applier = MemoryApplier::new();
    let container = applier.create_node("root");
    let mut renderer = Renderer::new(applier);
    renderer.render(rows(200, "row"), container);
    renderer.flush().expect("initial render");

    c.bench_function("identical_rerender_200_rows", |b| {
        b.iter(|| {
            renderer.render(rows(200, "row"), container);
            renderer.flush().expect("render");
            renderer.applier_mut().take_mutations();
        });
    });
}

fn first_mount(c: &mut Criterion) {
    c.bench_function("first_mount_200_rows", |b| {
        b.iter_batched(
            || {
                let mut applier = MemoryApplier::new();
                let container = applier.create_node("root");
                (Renderer::new(applier), container)
            },
            |(mut renderer, container)| {
                renderer.render(rows(200, "row"), container);
                renderer.flush().expect("render");
                renderer
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, identical_rerender, first_mount);
criterion_main!(benches);
