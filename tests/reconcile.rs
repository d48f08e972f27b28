use perch::{
    build::build, impl_render, BuildTrigger, Builder, Component, Config, DirtyIds, Key,
    KeyAssigner, Kind, NodeId, ScopeRoot, StateUpdateMap, StateValue, Stack,
};
use proptest::prelude::*;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A leaf with text state.
#[derive(Debug)]
struct Field(&'static str);

impl Component for Field {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn kind(&self) -> Kind {
        Kind::Leaf
    }
    fn identifier(&self) -> Option<Key> {
        Some(self.0.into())
    }
    fn initial_state(&self) -> Option<StateValue> {
        Some(Arc::new(String::new()))
    }
}

/// Renders a field keyed "x".
#[derive(Debug)]
struct Form;
impl_render! {
    Form;
    fn render(&self, _scope, _state: &()) {
        Arc::new(Field("x"))
    }
}

/// Renders a constant block.
#[derive(Debug)]
struct Constant;
impl_render! {
    Constant;
    fn render(&self, _scope, _state: &()) {
        Arc::new(perch::Block::new(4., 4.))
    }
}

/// Renders whatever it wraps.
#[derive(Debug)]
struct Wrap(Arc<dyn Component>);
impl_render! {
    Wrap;
    fn render(&self, _scope, _state: &()) {
        Arc::clone(&self.0)
    }
}

fn only_child(scope_root: &ScopeRoot, node: NodeId) -> NodeId {
    let node = scope_root.node(node).unwrap();
    assert_eq!(node.child_count(), 1);
    node.children().next().unwrap().1
}

#[test]
fn state_update_rebuilds_the_dirty_path() {
    init();
    let form: Arc<dyn Component> = Arc::new(Form);
    let first = build(Some(&form), None, &StateUpdateMap::new(), BuildTrigger::StateUpdate);
    assert!(first.scope_root.dirty_ids().is_empty());
    assert_eq!(first.scope_root.len(), 2);

    let a = first.root_node.unwrap();
    let x = only_child(&first.scope_root, a);

    let mut updates = StateUpdateMap::new();
    updates.enqueue(x, |text: &String| format!("{}!", text));
    let second = build(
        Some(&form),
        Some(&first.scope_root),
        &updates,
        BuildTrigger::StateUpdate,
    );

    let expected: DirtyIds = [a, x].iter().copied().collect();
    assert_eq!(second.scope_root.dirty_ids(), &expected);
    assert_eq!(second.scope_root.len(), 2);
    assert!(second.reused.is_empty());

    let new_a = second.root_node.unwrap();
    let new_x = only_child(&second.scope_root, new_a);
    assert_ne!(new_a, a);
    assert_ne!(new_x, x);
    let state = second.scope_root.node(new_x).unwrap().state().unwrap();
    assert_eq!(state.downcast_ref::<String>().map(String::as_str), Some("!"));

    let (first_id, second_id) = (first.scope_root.id(), second.scope_root.id());
    assert_eq!(second_id.tree(), first_id.tree());
    assert_eq!(second_id.generation(), first_id.generation() + 1);
    assert_eq!(second.scope_root.previous_id(), Some(first_id));
}

#[test]
fn props_update_disables_reuse() {
    init();
    let root: Arc<dyn Component> = Arc::new(Constant);
    let first = build(Some(&root), None, &StateUpdateMap::new(), BuildTrigger::StateUpdate);
    let second = build(
        Some(&root),
        Some(&first.scope_root),
        &StateUpdateMap::new(),
        BuildTrigger::PropsUpdate,
    );

    assert!(second.reused.is_empty());
    assert!(second.scope_root.dirty_ids().is_empty());
    assert_eq!(second.scope_root.len(), 2);
    for node in second.scope_root.nodes() {
        assert!(!first.scope_root.contains(node.id()));
    }
}

fn page() -> Arc<dyn Component> {
    Arc::new(Stack::vertical(vec![
        Arc::new(Constant),
        Arc::new(Form),
        Arc::new(Stack::horizontal(vec![
            Arc::new(Constant),
            Arc::new(perch::Block::new(1., 1.)),
        ])),
    ]))
}

fn render_nodes(scope_root: &ScopeRoot) -> Vec<NodeId> {
    scope_root
        .nodes()
        .map(|node| node.id())
        .filter(|id| scope_root.rendered_child(*id).is_some())
        .collect()
}

#[test]
fn identical_trees_keep_identities() {
    init();
    let first = build(Some(&page()), None, &StateUpdateMap::new(), BuildTrigger::StateUpdate);
    let second = build(
        Some(&page()),
        Some(&first.scope_root),
        &StateUpdateMap::new(),
        BuildTrigger::StateUpdate,
    );

    for node in first.scope_root.nodes() {
        let path = first.scope_root.key_path(node.id()).unwrap();
        let counterpart = second.scope_root.node_at_path(&path);
        assert!(counterpart.is_some(), "no counterpart for {:?}", path);
        assert_eq!(second.scope_root.key_path(counterpart.unwrap()).unwrap(), path);
    }

    let render = render_nodes(&first.scope_root);
    assert_eq!(render.len(), 3);
    for id in render {
        assert!(second.scope_root.contains(id), "render node {} was not reused", id);
    }
}

#[test]
fn composites_are_never_reused() {
    init();
    let first = build(Some(&page()), None, &StateUpdateMap::new(), BuildTrigger::StateUpdate);
    let second = build(
        Some(&page()),
        Some(&first.scope_root),
        &StateUpdateMap::new(),
        BuildTrigger::StateUpdate,
    );

    let old_root = first.scope_root.root_node().unwrap();
    let new_root = second.scope_root.root_node().unwrap();
    assert_eq!(old_root.key(), new_root.key());
    assert_ne!(old_root.id(), new_root.id());

    let row_key = old_root.children().last().unwrap().0.clone();
    assert_ne!(old_root.child(&row_key), new_root.child(&row_key));
    // the plain leaf in the row is rebuilt with it
    assert_eq!(second.reused.len(), 3);
    assert_eq!(
        second.reused.iter().map(|reused| reused.nodes).sum::<usize>(),
        6
    );
}

#[test]
fn siblings_get_successive_ordinals() {
    let root: Arc<dyn Component> = Arc::new(Stack::vertical(vec![
        Arc::new(Constant),
        Arc::new(Constant),
        Arc::new(Constant),
    ]));
    let result = build(Some(&root), None, &StateUpdateMap::new(), BuildTrigger::NewTree);
    let root = result.scope_root.root_node().unwrap();

    let mut keys = KeyAssigner::new();
    let expected: Vec<_> = (0..3).map(|_| keys.assign_component(&Constant)).collect();
    let actual: Vec<_> = root.children().map(|(key, _)| key.clone()).collect();
    assert_eq!(actual, expected);
    assert_eq!(
        actual.iter().map(|key| key.ordinal()).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn queued_updates_flow_through_the_handles() {
    init();
    let mut tree = perch::ComponentTree::new();
    let first = tree.render_root(Some(Arc::new(Form)));
    let x = only_child(&first.scope_root, first.root_node.unwrap());
    let handle = Arc::clone(first.scope_root.node(x).unwrap().scope_handle().unwrap());

    handle.update_state_animated(
        |text: &String| format!("{}a", text),
        perch::BoundsAnimation::new(std::time::Duration::from_millis(120)),
    );
    handle.update_state(|text: &String| format!("{}b", text));
    let second = tree.apply_state_updates().unwrap();

    let new_x = only_child(&second.scope_root, second.root_node.unwrap());
    let new_handle = second.scope_root.node(new_x).unwrap().scope_handle().unwrap();
    assert_eq!(new_handle.scope_id(), handle.scope_id());
    assert_eq!(new_handle.state().downcast_ref::<String>().map(String::as_str), Some("ab"));
    assert_eq!(second.bounds_animation.duration.as_millis(), 120);
}

#[derive(Debug, Clone)]
enum Shape {
    Leaf,
    Wrap(Box<Shape>),
    Stack(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    Just(Shape::Leaf).prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|shape| Shape::Wrap(Box::new(shape))),
            prop::collection::vec(inner, 0..4).prop_map(Shape::Stack),
        ]
    })
}

fn component(shape: &Shape) -> Arc<dyn Component> {
    match shape {
        Shape::Leaf => Arc::new(perch::Block::new(1., 1.)),
        Shape::Wrap(inner) => Arc::new(Wrap(component(inner))),
        Shape::Stack(children) => Arc::new(Stack::vertical(children.iter().map(component).collect())),
    }
}

proptest! {
    #[test]
    fn dirty_paths_are_complete(
        shape in shape(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let root = component(&shape);
        let first = build(Some(&root), None, &StateUpdateMap::new(), BuildTrigger::NewTree);
        let scope_root = &first.scope_root;

        let mut nodes: Vec<_> = scope_root.nodes().map(|node| node.id()).collect();
        nodes.sort();
        let targets: HashSet<_> = picks.iter().map(|pick| *pick.get(&nodes)).collect();

        let mut updates = StateUpdateMap::new();
        let mut expected = DirtyIds::new();
        for target in &targets {
            updates.enqueue(*target, |n: &u32| *n);
            let path = scope_root.key_path(*target).unwrap();
            for len in 1..=path.len() {
                expected.insert(scope_root.node_at_path(&path[..len]).unwrap());
            }
        }

        let dirty = perch::dirty_ids_for(Some(scope_root), &updates, BuildTrigger::StateUpdate);
        prop_assert_eq!(&dirty, &expected);

        let builder = Builder::new().with_config(Config::new());
        let second = builder.build(Some(&root), Some(scope_root), &updates, BuildTrigger::StateUpdate);
        for id in &dirty {
            prop_assert!(!second.scope_root.contains(*id));
        }
        for reused in &second.reused {
            prop_assert!(!dirty.contains(&reused.node));
        }
        prop_assert_eq!(second.scope_root.len(), scope_root.len());
    }
}
