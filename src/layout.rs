//! The layout engine.
//!
//! Layout resolves every component’s relative size against its parent, top-down, and sizes
//! content bottom-up: leaves report their intrinsic size, render components take the size of
//! their rendered child, and composites arrange their children.
//!
//! Layout only reads published generations. It may run on several threads at once for the same
//! tree, sharing one [`LayoutCache`].

use crate::analytics::AnalyticsListener;
use crate::build::BuildTrigger;
use crate::component::{address, Arrangement, Component, Kind};
use crate::config::Config;
use crate::creation::{self, Phase};
use crate::geometry::{Point, Rect, Size, SizeRange};
use crate::id::{LayoutContextId, NodeId, ScopeRootId};
use crate::layout_cache::LayoutCache;
use crate::scope_root::ScopeRoot;
use cgmath::{EuclideanSpace, Vector2, Zero};
use std::collections::HashMap;
use std::sync::Arc;

/// A laid out component.
#[derive(Debug, Clone)]
pub struct Layout {
    /// The component this layout was computed for; `None` for an empty layout.
    pub component: Option<Arc<dyn Component>>,
    /// The component’s node, if it was built.
    pub node: Option<NodeId>,
    pub size: Size,
    pub children: Vec<LayoutChild>,
}

/// A child layout and its position relative to the parent’s origin.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutChild {
    pub position: Point,
    pub layout: Arc<Layout>,
}

impl LayoutChild {
    /// The child’s bounds in the parent’s coordinate space.
    pub fn frame(&self) -> Rect {
        Rect::new(self.position, self.layout.size)
    }
}

impl PartialEq for Layout {
    fn eq(&self, other: &Layout) -> bool {
        let same_component = match (&self.component, &other.component) {
            (Some(a), Some(b)) => address(&**a) == address(&**b),
            (None, None) => true,
            _ => false,
        };
        same_component
            && self.node == other.node
            && self.size == other.size
            && self.children == other.children
    }
}

impl Layout {
    /// A zero-size layout without a component.
    pub fn empty() -> Layout {
        Layout {
            component: None,
            node: None,
            size: Vector2::zero(),
            children: Vec::new(),
        }
    }

    /// Node ids of this layout and all descendants, parents first.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.collect_node_ids(&mut ids);
        ids
    }

    fn collect_node_ids(&self, ids: &mut Vec<NodeId>) {
        ids.extend(self.node);
        for child in &self.children {
            child.layout.collect_node_ids(ids);
        }
    }
}

/// The layout of a whole tree.
#[derive(Debug, Clone)]
pub struct RootLayout {
    layout: Arc<Layout>,
    scope_root: Option<ScopeRootId>,
    by_node: HashMap<NodeId, Arc<Layout>>,
}

impl RootLayout {
    fn new(layout: Arc<Layout>, scope_root: Option<ScopeRootId>) -> RootLayout {
        let mut by_node = HashMap::new();
        let mut stack = vec![Arc::clone(&layout)];
        while let Some(layout) = stack.pop() {
            stack.extend(layout.children.iter().map(|child| Arc::clone(&child.layout)));
            if let Some(node) = layout.node {
                by_node.insert(node, layout);
            }
        }
        RootLayout {
            layout,
            scope_root,
            by_node,
        }
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn size(&self) -> Size {
        self.layout.size
    }

    /// The generation this layout was computed for.
    pub fn scope_root_id(&self) -> Option<ScopeRootId> {
        self.scope_root
    }

    /// Finds the layout of a node.
    pub fn layout_for_node(&self, node: NodeId) -> Option<&Arc<Layout>> {
        self.by_node.get(&node)
    }
}

/// Lays out component trees.
#[derive(Clone, Copy)]
pub struct Layouter<'a> {
    config: Config,
    listener: Option<&'a dyn AnalyticsListener>,
    cache: Option<&'a LayoutCache>,
}

impl Default for Layouter<'_> {
    fn default() -> Self {
        Layouter::new()
    }
}

impl<'a> Layouter<'a> {
    pub fn new() -> Layouter<'a> {
        Layouter {
            config: Config::default(),
            listener: None,
            cache: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Layouter<'a> {
        self.config = config;
        self
    }

    pub fn with_listener(mut self, listener: &'a dyn AnalyticsListener) -> Layouter<'a> {
        self.listener = Some(listener);
        self
    }

    pub fn with_cache(mut self, cache: &'a LayoutCache) -> Layouter<'a> {
        self.cache = Some(cache);
        self
    }

    /// Lays out a tree within a size range.
    ///
    /// `scope_root` is the generation `root` was built into; render components are laid out
    /// through the child they rendered there. `trigger` is the build that caused this layout,
    /// if any. An absent root yields an empty layout.
    pub fn layout_root(
        &self,
        root: Option<&Arc<dyn Component>>,
        range: SizeRange,
        scope_root: Option<&ScopeRoot>,
        trigger: Option<BuildTrigger>,
    ) -> RootLayout {
        let root = match root {
            Some(root) => root,
            None => return RootLayout::new(Arc::new(Layout::empty()), scope_root.map(ScopeRoot::id)),
        };

        let cache = self.cache.filter(|_| self.config.layout_cache_enabled);
        if let (Some(cache), Some(scope_root)) = (cache, scope_root) {
            cache.prepare(scope_root);
        }

        let context = LayoutContextId::new();
        let root_node = scope_root.and_then(|scope_root| entry_node(scope_root, &**root));
        if let Some(listener) = self.listener {
            listener.will_layout(&**root, root_node, trigger, context);
        }

        let layout = {
            let _phase = creation::enter(Phase::Layout, self.config.validate_creation);
            let cx = LayoutContext { scope_root, cache };
            // the root resolves percentages against the range it was given
            cx.layout(root, root_node, range, range.reference_size())
        };

        if let Some(listener) = self.listener {
            listener.did_layout(&**root, root_node, context);
        }
        RootLayout::new(layout, scope_root.map(ScopeRoot::id))
    }

    /// Lays out a single component against a parent size.
    pub fn layout(
        &self,
        component: &Arc<dyn Component>,
        range: SizeRange,
        parent_size: Size,
        scope_root: Option<&ScopeRoot>,
    ) -> Arc<Layout> {
        let cache = self.cache.filter(|_| self.config.layout_cache_enabled);
        if let (Some(cache), Some(scope_root)) = (cache, scope_root) {
            cache.prepare(scope_root);
        }
        let node = scope_root.and_then(|scope_root| entry_node(scope_root, &**component));
        let _phase = creation::enter(Phase::Layout, self.config.validate_creation);
        LayoutContext { scope_root, cache }.layout(component, node, range, parent_size)
    }
}

/// Lays out a tree with the default configuration, filling `cache` if given.
pub fn compute_root_layout(
    root: Option<&Arc<dyn Component>>,
    range: SizeRange,
    scope_root: Option<&ScopeRoot>,
    cache: Option<&LayoutCache>,
) -> RootLayout {
    let mut layouter = Layouter::new();
    if let Some(cache) = cache {
        layouter = layouter.with_cache(cache);
    }
    layouter.layout_root(root, range, scope_root, None)
}

/// Lays out a single component with the default configuration and no cache.
pub fn compute_layout(
    component: &Arc<dyn Component>,
    range: SizeRange,
    parent_size: Size,
    scope_root: Option<&ScopeRoot>,
) -> Arc<Layout> {
    Layouter::new().layout(component, range, parent_size, scope_root)
}

/// The node a layout starts from: the generation's root when `component` is its root component,
/// otherwise the node last built from that instance.
fn entry_node(scope_root: &ScopeRoot, component: &dyn Component) -> Option<NodeId> {
    let is_root = scope_root
        .root_component()
        .map_or(false, |root| address(&**root) == address(component));
    if is_root {
        scope_root.root()
    } else {
        scope_root.node_for_component(component)
    }
}

/// Walks components together with the nodes they were built into.
struct LayoutContext<'a> {
    scope_root: Option<&'a ScopeRoot>,
    cache: Option<&'a LayoutCache>,
}

impl LayoutContext<'_> {
    /// Child node ids of `node` in build order, one per child of `component`.
    fn child_nodes(&self, component: &dyn Component, node: Option<NodeId>) -> Vec<Option<NodeId>> {
        let count = component.children().len();
        let tree_node = match (self.scope_root, node) {
            (Some(scope_root), Some(node)) => scope_root.node(node),
            _ => None,
        };
        match tree_node {
            Some(tree_node) if tree_node.child_count() == count => {
                tree_node.children().map(|(_, child)| Some(child)).collect()
            }
            Some(tree_node) => {
                log::warn!(
                    "{} has {} children but node {} has {}; laying them out unbuilt",
                    component.type_name(),
                    count,
                    tree_node.id(),
                    tree_node.child_count()
                );
                vec![None; count]
            }
            None => vec![None; count],
        }
    }

    fn layout(
        &self,
        component: &Arc<dyn Component>,
        node: Option<NodeId>,
        range: SizeRange,
        parent_size: Size,
    ) -> Arc<Layout> {
        if let (Some(cache), Some(scope_root), Some(node)) = (self.cache, self.scope_root, node) {
            if let Some(cached) = cache.get(scope_root, node, range, parent_size) {
                log::trace!("layout cache hit for node {}", node);
                return with_component(cached, component);
            }
        }

        let resolved = component.size().resolve(parent_size).intersect(range);
        let reference = resolved.reference_size();
        let (size, children) = match component.kind() {
            Kind::Leaf => (resolved.clamp(component.intrinsic_size(resolved)), Vec::new()),
            Kind::Render => {
                let rendered = match (self.scope_root, node) {
                    (Some(scope_root), Some(node)) => scope_root
                        .rendered_child(node)
                        .map(|child| {
                            let child_node = scope_root
                                .node(node)
                                .and_then(|node| node.children().next())
                                .map(|(_, id)| id);
                            (child, child_node)
                        }),
                    _ => None,
                };
                match rendered {
                    Some((child, child_node)) => {
                        let layout = self.layout(child, child_node, resolved, reference);
                        let child = LayoutChild {
                            position: Point::origin(),
                            layout,
                        };
                        (resolved.clamp(child.layout.size), vec![child])
                    }
                    None => {
                        log::warn!(
                            "laying out {} which was never built; it will be empty",
                            component.type_name()
                        );
                        (resolved.min, Vec::new())
                    }
                }
            }
            Kind::Composite => match component.arrangement() {
                Arrangement::Overlay => {
                    let child_range = SizeRange::new(Vector2::zero(), resolved.max);
                    let mut content = Vector2::zero();
                    let nodes = self.child_nodes(&**component, node);
                    let children: Vec<_> = component
                        .children()
                        .iter()
                        .zip(nodes)
                        .map(|(child, child_node)| {
                            let layout = self.layout(child, child_node, child_range, reference);
                            content.x = f64::max(content.x, layout.size.x);
                            content.y = f64::max(content.y, layout.size.y);
                            LayoutChild {
                                position: Point::origin(),
                                layout,
                            }
                        })
                        .collect();
                    (resolved.clamp(content), children)
                }
                Arrangement::Stack { axis, spacing } => {
                    let main_max = axis.main(resolved.max);
                    let cross_max = axis.cross(resolved.max);
                    let mut main = 0.;
                    let mut cross: f64 = 0.;
                    let nodes = self.child_nodes(&**component, node);
                    let mut children = Vec::with_capacity(nodes.len());
                    for (i, (child, child_node)) in component.children().iter().zip(nodes).enumerate() {
                        if i > 0 {
                            main += spacing;
                        }
                        let remaining = (main_max - main).max(0.);
                        let child_range = SizeRange::new(Vector2::zero(), axis.pack(remaining, cross_max));
                        let layout = self.layout(child, child_node, child_range, reference);
                        let position = Point::from_vec(axis.pack(main, 0.));
                        main += axis.main(layout.size);
                        cross = cross.max(axis.cross(layout.size));
                        children.push(LayoutChild { position, layout });
                    }
                    (resolved.clamp(axis.pack(main, cross)), children)
                }
            },
        };

        let layout = Arc::new(Layout {
            component: Some(Arc::clone(component)),
            node,
            size,
            children,
        });
        if let (Some(cache), Some(scope_root), Some(node)) = (self.cache, self.scope_root, node) {
            cache.insert(scope_root, node, range, parent_size, Arc::clone(&layout));
        }
        layout
    }
}

/// Points a cached layout at the component now representing its node.
fn with_component(cached: Arc<Layout>, component: &Arc<dyn Component>) -> Arc<Layout> {
    match &cached.component {
        Some(previous) if address(&**previous) == address(&**component) => cached,
        _ => Arc::new(Layout {
            component: Some(Arc::clone(component)),
            ..(*cached).clone()
        }),
    }
}
