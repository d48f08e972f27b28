use crate::analytics::AnalyticsListener;
use crate::build::{BuildResult, BuildTrigger, Builder};
use crate::component::Component;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::geometry::SizeRange;
use crate::id::NodeId;
use crate::layout::{Layouter, RootLayout};
use crate::layout_cache::LayoutCache;
use crate::mount::{mount_root_layout, MountTarget, MountedSet};
use crate::scope::{StateUpdate, StateUpdateMap};
use crate::scope_root::ScopeRoot;
use core::fmt;
use std::sync::Arc;

/// A tree of components.
///
/// Holds the current generation and drives builds, layouts and mounts one after another. Builds
/// are serialized by `&mut self`; layouts only need `&self` and may run concurrently.
pub struct ComponentTree {
    config: Config,
    listener: Option<Arc<dyn AnalyticsListener>>,
    root: Option<Arc<dyn Component>>,
    scope_root: Option<Arc<ScopeRoot>>,
    /// The trigger of the last build; reported with the next layout.
    last_trigger: Option<BuildTrigger>,
    pending: StateUpdateMap,
    cache: LayoutCache,
    mounted: MountedSet,
}

impl Default for ComponentTree {
    fn default() -> Self {
        ComponentTree::new()
    }
}

impl ComponentTree {
    pub fn new() -> ComponentTree {
        ComponentTree {
            config: Config::default(),
            listener: None,
            root: None,
            scope_root: None,
            last_trigger: None,
            pending: StateUpdateMap::new(),
            cache: LayoutCache::new(),
            mounted: MountedSet::new(),
        }
    }

    pub fn with_config(mut self, config: Config) -> ComponentTree {
        self.config = config;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn AnalyticsListener>) -> ComponentTree {
        self.listener = Some(listener);
        self
    }

    fn builder(&self) -> Builder<'_> {
        let builder = Builder::new().with_config(self.config);
        match &self.listener {
            Some(listener) => builder.with_listener(&**listener),
            None => builder,
        }
    }

    /// Replaces the root component and builds.
    ///
    /// The first build creates a new tree; later ones are props updates, which keep state but
    /// rebuild everything. Pending state updates are consumed.
    pub fn render_root(&mut self, root: Option<Arc<dyn Component>>) -> BuildResult {
        let trigger = match self.scope_root {
            Some(_) => BuildTrigger::PropsUpdate,
            None => BuildTrigger::NewTree,
        };
        self.root = root;
        self.rebuild(trigger)
    }

    /// Queues a state update for a node of the current generation.
    pub fn enqueue_state_update(&mut self, node: NodeId, update: StateUpdate) {
        self.notify_received(node, 1);
        self.pending.push(node, update);
    }

    /// Reports `count` updates for the scope of `node` to the listener.
    fn notify_received(&self, node: NodeId, count: usize) {
        let (listener, scope_root) = match (&self.listener, &self.scope_root) {
            (Some(listener), Some(scope_root)) => (listener, scope_root),
            _ => return,
        };
        if let Some(handle) = scope_root.node(node).and_then(|node| node.scope_handle()) {
            for _ in 0..count {
                listener.did_receive_state_update(handle.scope_id(), scope_root.id());
            }
        }
    }

    /// Whether a state-update build would have anything to apply.
    pub fn has_pending_state_updates(&self) -> bool {
        !self.pending.is_empty()
            || self
                .scope_root
                .as_ref()
                .map_or(false, |scope_root| scope_root.has_pending_state_updates())
    }

    /// Builds the next generation from all queued state updates.
    pub fn apply_state_updates(&mut self) -> Result<BuildResult> {
        let scope_root = self.scope_root.as_ref().ok_or(Error::NotBuilt)?;
        let queued = scope_root.drain_state_updates();
        for node in queued.targets() {
            self.notify_received(node, queued.get(node).len());
        }
        self.pending.extend(queued);
        Ok(self.rebuild(BuildTrigger::StateUpdate))
    }

    fn rebuild(&mut self, trigger: BuildTrigger) -> BuildResult {
        let updates = std::mem::take(&mut self.pending);
        let result = self.builder().build(
            self.root.as_ref(),
            self.scope_root.as_deref(),
            &updates,
            trigger,
        );
        self.scope_root = Some(Arc::clone(&result.scope_root));
        self.last_trigger = Some(trigger);
        result
    }

    /// Lays out the current generation.
    pub fn layout(&self, range: SizeRange) -> Result<RootLayout> {
        let scope_root = self.scope_root.as_deref().ok_or(Error::NotBuilt)?;
        let mut layouter = Layouter::new()
            .with_config(self.config)
            .with_cache(&self.cache);
        if let Some(listener) = &self.listener {
            layouter = layouter.with_listener(&**listener);
        }
        Ok(layouter.layout_root(self.root.as_ref(), range, Some(scope_root), self.last_trigger))
    }

    /// Mounts a layout of this tree.
    pub fn mount<T: MountTarget>(&mut self, target: &mut T, layout: &RootLayout) -> Result<()> {
        let mounted = mount_root_layout(target, layout, &self.mounted, self.listener.as_deref())?;
        self.mounted = mounted;
        Ok(())
    }

    pub fn root(&self) -> Option<&Arc<dyn Component>> {
        self.root.as_ref()
    }

    /// The current generation.
    pub fn scope_root(&self) -> Option<&Arc<ScopeRoot>> {
        self.scope_root.as_ref()
    }

    pub fn mounted(&self) -> &MountedSet {
        &self.mounted
    }

    pub fn layout_cache(&self) -> &LayoutCache {
        &self.cache
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("scope_root", &self.scope_root)
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[test]
fn test_component_tree_state_roundtrip() {
    use crate::component::{Block, Stack};
    use crate::scope::ScopeHandle;

    #[derive(Debug)]
    struct Counter;
    crate::impl_render! {
        Counter;
        fn initial_state(&self) {
            1u32
        }
        fn render(&self, _scope, count: &u32) {
            let blocks = (0..*count).map(|_| Arc::new(Block::new(10., 10.)) as Arc<dyn Component>).collect();
            Arc::new(Stack::vertical(blocks))
        }
    }

    let mut tree = ComponentTree::new();
    assert!(matches!(tree.apply_state_updates(), Err(Error::NotBuilt)));
    assert!(matches!(tree.layout(SizeRange::unconstrained()), Err(Error::NotBuilt)));

    let first = tree.render_root(Some(Arc::new(Counter)));
    let layout = tree.layout(SizeRange::unconstrained()).unwrap();
    assert_eq!(layout.size().y, 10.);

    let handle: Arc<ScopeHandle> = Arc::clone(
        first
            .scope_root
            .root_node()
            .and_then(|node| node.scope_handle())
            .unwrap(),
    );
    handle.update_state(|count: &u32| count + 2);
    assert!(tree.has_pending_state_updates());

    let second = tree.apply_state_updates().unwrap();
    assert_eq!(second.scope_root.id().generation(), 2);
    assert!(!tree.has_pending_state_updates());
    let layout = tree.layout(SizeRange::unconstrained()).unwrap();
    assert_eq!(layout.size().y, 30.);
}

#[test]
fn test_component_tree_reports_received_updates() {
    use crate::analytics::{AnalyticsEvent, RecordingListener};
    use crate::component::Block;

    #[derive(Debug)]
    struct Switch;
    crate::impl_render! {
        Switch;
        fn initial_state(&self) {
            false
        }
        fn render(&self, _scope, _on: &bool) {
            Arc::new(Block::new(1., 1.))
        }
    }

    let listener = Arc::new(RecordingListener::new());
    let mut tree =
        ComponentTree::new().with_listener(Arc::clone(&listener) as Arc<dyn AnalyticsListener>);
    let first = tree.render_root(Some(Arc::new(Switch)));
    listener.events();

    let node = first.root_node.unwrap();
    let handle = Arc::clone(first.scope_root.node(node).unwrap().scope_handle().unwrap());
    tree.enqueue_state_update(node, StateUpdate::new(|on: &bool| !on));
    handle.update_state(|on: &bool| !on);
    handle.update_state(|on: &bool| !on);
    tree.apply_state_updates().unwrap();

    let received: Vec<_> = listener
        .events()
        .into_iter()
        .filter(|event| matches!(event, AnalyticsEvent::DidReceiveStateUpdate { .. }))
        .collect();
    let expected = AnalyticsEvent::DidReceiveStateUpdate {
        scope: handle.scope_id(),
        root: first.scope_root.id(),
    };
    assert_eq!(received, vec![expected.clone(), expected.clone(), expected]);
}
