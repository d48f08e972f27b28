use cgmath::Vector2;
use perch::{
    build::build, compute_root_layout, impl_render, AnalyticsEvent, Block, BuildTrigger,
    Component, ComponentSize, ComponentTree, Layout, LayoutCache, Layouter, NodeId,
    RecordingListener, RelativeDimension, ScopeRoot, SizeRange, Stack, StateUpdate,
    StateUpdateMap,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A block whose height grows with its state.
#[derive(Debug)]
struct Counter;
impl_render! {
    Counter;
    fn initial_state(&self) {
        1u32
    }
    fn render(&self, _scope, count: &u32) {
        Arc::new(Block::new(10., 10. * *count as f64))
    }
}

#[derive(Debug)]
struct Caption;
impl_render! {
    Caption;
    fn render(&self, _scope, _state: &()) {
        let half = ComponentSize {
            width: RelativeDimension::Percent(0.5),
            ..ComponentSize::default()
        };
        Arc::new(Block::new(0., 12.).with_size(half))
    }
}

fn page() -> Arc<dyn Component> {
    Arc::new(
        Stack::vertical(vec![Arc::new(Counter), Arc::new(Caption)])
            .with_spacing(2.)
            .with_size(ComponentSize {
                width: RelativeDimension::Points(100.),
                ..ComponentSize::default()
            }),
    )
}

fn bits(layout: &Layout, out: &mut Vec<(Option<NodeId>, u64, u64)>) {
    out.push((layout.node, layout.size.x.to_bits(), layout.size.y.to_bits()));
    for child in &layout.children {
        out.push((None, child.position.x.to_bits(), child.position.y.to_bits()));
        bits(&child.layout, out);
    }
}

fn layout_bits(layout: &Layout) -> Vec<(Option<NodeId>, u64, u64)> {
    let mut out = Vec::new();
    bits(layout, &mut out);
    out
}

fn counter_node(tree: &ComponentTree) -> NodeId {
    let scope_root = tree.scope_root().unwrap();
    let root = scope_root.root_node().unwrap();
    root.children().next().unwrap().1
}

#[test]
fn layout_is_deterministic() {
    init();
    let root = page();
    let result = build(Some(&root), None, &StateUpdateMap::new(), BuildTrigger::NewTree);
    let range = SizeRange::new(Vector2::new(0., 0.), Vector2::new(400., 300.));

    let first = compute_root_layout(Some(&root), range, Some(&result.scope_root), None);
    let second = compute_root_layout(Some(&root), range, Some(&result.scope_root), None);
    assert_eq!(layout_bits(first.layout()), layout_bits(second.layout()));
    assert_eq!(first.layout(), second.layout());

    let cache = LayoutCache::new();
    let cold = compute_root_layout(Some(&root), range, Some(&result.scope_root), Some(&cache));
    let warm = compute_root_layout(Some(&root), range, Some(&result.scope_root), Some(&cache));
    assert_eq!(cache.hits(), 1, "the whole tree should come from the cache");
    assert_eq!(layout_bits(cold.layout()), layout_bits(first.layout()));
    assert_eq!(layout_bits(warm.layout()), layout_bits(first.layout()));

    // 100 wide, counter 10 + spacing 2 + caption 12
    assert_eq!(first.size(), Vector2::new(100., 24.));
    let caption = &first.layout().children[1];
    assert_eq!(caption.position.y, 12.);
    assert_eq!(caption.layout.children[0].layout.size, Vector2::new(50., 12.));
}

#[test]
fn dirty_nodes_never_come_from_the_cache() {
    init();
    let mut tree = ComponentTree::new();
    tree.render_root(Some(page()));
    let first_id = tree.scope_root().unwrap().id();
    let range = SizeRange::unconstrained();
    let first = tree.layout(range).unwrap();
    assert_eq!(first.size().y, 24.);

    let counter = counter_node(&tree);
    tree.enqueue_state_update(counter, StateUpdate::new(|count: &u32| count + 1));
    let hits = tree.layout_cache().hits();
    let second_build = tree.apply_state_updates().unwrap();
    assert!(second_build.scope_root.is_dirty(counter));

    let second = tree.layout(range).unwrap();
    assert_eq!(second.size().y, 34.);
    assert_eq!(
        second.layout().children[0].layout.size.y,
        20.,
        "the counter must be laid out again"
    );
    assert!(tree.layout_cache().hits() > hits, "the caption should be reused from the cache");

    let cache = tree.layout_cache();
    let second_id = second_build.scope_root.id();
    assert!(cache.len(second_id) > 0);
    let first_layout = first.layout_for_node(counter).unwrap();
    cache.insert(
        &second_build.scope_root,
        counter,
        range,
        range.reference_size(),
        Arc::clone(first_layout),
    );
    assert!(cache
        .get(&second_build.scope_root, counter, range, range.reference_size())
        .is_none());

    // a third generation drops the first
    let counter = counter_node(&tree);
    tree.enqueue_state_update(counter, StateUpdate::new(|count: &u32| count + 1));
    tree.apply_state_updates().unwrap();
    tree.layout(range).unwrap();
    assert_eq!(tree.layout_cache().len(first_id), 0);
}

/// The counter inside the `index`th stack of the root.
fn nested_counter(scope_root: &ScopeRoot, index: usize) -> NodeId {
    let root = scope_root.root_node().unwrap();
    let stack = scope_root.node(root.children().nth(index).unwrap().1).unwrap();
    stack.children().next().unwrap().1
}

#[test]
fn shared_instances_are_laid_out_per_occurrence() {
    init();
    let counter: Arc<dyn Component> = Arc::new(Counter);
    let root: Arc<dyn Component> = Arc::new(Stack::vertical(vec![
        Arc::new(Stack::vertical(vec![Arc::clone(&counter)])),
        Arc::new(Stack::vertical(vec![counter]).with_identifier("b")),
    ]));
    let first = build(Some(&root), None, &StateUpdateMap::new(), BuildTrigger::NewTree);

    let mut updates = StateUpdateMap::new();
    updates.enqueue(nested_counter(&first.scope_root, 0), |count: &u32| count + 2);
    let second = build(
        Some(&root),
        Some(&first.scope_root),
        &updates,
        BuildTrigger::StateUpdate,
    );
    let a = nested_counter(&second.scope_root, 0);
    let b = nested_counter(&second.scope_root, 1);
    assert_ne!(a, b);

    let layout = compute_root_layout(
        Some(&root),
        SizeRange::unconstrained(),
        Some(&second.scope_root),
        None,
    );
    let first_counter = &layout.layout().children[0].layout.children[0].layout;
    let second_counter = &layout.layout().children[1].layout.children[0].layout;
    assert_eq!(first_counter.node, Some(a));
    assert_eq!(second_counter.node, Some(b));
    assert_eq!(first_counter.size.y, 30.);
    assert_eq!(second_counter.size.y, 10.);

    let ids = layout.layout().node_ids();
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
}

#[test]
fn empty_root_lays_out_to_nothing() {
    let listener = RecordingListener::new();
    let layout = Layouter::new()
        .with_listener(&listener)
        .layout_root(None, SizeRange::unconstrained(), None, None);
    assert_eq!(layout.size(), Vector2::new(0., 0.));
    assert!(layout.layout().children.is_empty());
    assert!(listener.events().is_empty());

    let mut tree = ComponentTree::new();
    tree.render_root(None);
    assert_eq!(tree.layout(SizeRange::unconstrained()).unwrap().size(), Vector2::new(0., 0.));
}

#[test]
fn concurrent_layouts_pair_by_context() {
    init();
    let root = page();
    let result = build(Some(&root), None, &StateUpdateMap::new(), BuildTrigger::NewTree);
    let listener = RecordingListener::new();
    let cache = LayoutCache::new();
    let layouter = Layouter::new().with_listener(&listener).with_cache(&cache);
    let scope_root = &result.scope_root;

    let layouts = crossbeam::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let root = &root;
                let layouter = &layouter;
                s.spawn(move |_| {
                    let range = SizeRange::new(Vector2::new(0., 0.), Vector2::new(100. * (i % 2 + 1) as f64, 500.));
                    layouter.layout_root(Some(root), range, Some(scope_root), Some(BuildTrigger::NewTree))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    })
    .unwrap();

    for (i, layout) in layouts.iter().enumerate() {
        let other = &layouts[i % 2];
        assert_eq!(layout_bits(layout.layout()), layout_bits(other.layout()));
    }

    let mut open = HashMap::new();
    let mut contexts = HashSet::new();
    for event in listener.events() {
        match event {
            AnalyticsEvent::WillLayout {
                root_node,
                trigger,
                context,
                thread,
            } => {
                assert_eq!(root_node, result.root_node);
                assert_eq!(trigger, Some(BuildTrigger::NewTree));
                assert!(open.insert((context, root_node), thread).is_none());
                contexts.insert(context);
            }
            AnalyticsEvent::DidLayout {
                root_node,
                context,
                thread,
            } => {
                assert_eq!(open.remove(&(context, root_node)), Some(thread));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert!(open.is_empty());
    assert_eq!(contexts.len(), 4);
}
