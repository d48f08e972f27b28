//! The build engine.
//!
//! A build walks a component tree top-down and produces the next generation of tree nodes. Each
//! component is matched to its counterpart in the previous generation by identity key under the
//! corresponding previous owner; matched stateful nodes carry their state forward.
//!
//! Render components whose path was untouched by state updates are not rendered again: their
//! previous node, rendered child and all descendants are attached to the new generation as they
//! are.

use crate::analytics::AnalyticsListener;
use crate::component::{address, Component, Kind};
use crate::config::Config;
use crate::creation::{self, Phase};
use crate::dirty::dirty_ids_for;
use crate::id::{NodeId, ScopeRootId};
use crate::key::{IdentityKey, KeyAssigner};
use crate::node::TreeNode;
use crate::scope::{BoundsAnimation, Scope, ScopeHandle, StateUpdateMap};
use crate::scope_root::ScopeRoot;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Why a build was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildTrigger {
    /// A new tree; any previous generation is ignored.
    NewTree,
    /// One or more state updates. The only trigger that permits subtree reuse.
    StateUpdate,
    /// The root component’s properties changed.
    PropsUpdate,
    /// Something outside the tree changed.
    EnvironmentUpdate,
}

/// A subtree adopted from the previous generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReusedSubtree {
    /// The reused render node.
    pub node: NodeId,
    /// Number of nodes in the subtree, the render node included.
    pub nodes: usize,
}

/// The outcome of a build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub scope_root: Arc<ScopeRoot>,
    pub root_node: Option<NodeId>,
    /// Longest bounds animation requested by the state updates this build consumed.
    pub bounds_animation: BoundsAnimation,
    /// Subtrees reused from the previous generation, in build order.
    pub reused: Vec<ReusedSubtree>,
}

/// Builds generations of component trees.
#[derive(Clone, Copy)]
pub struct Builder<'a> {
    config: Config,
    listener: Option<&'a dyn AnalyticsListener>,
}

impl Default for Builder<'_> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<'a> Builder<'a> {
    pub fn new() -> Builder<'a> {
        Builder {
            config: Config::default(),
            listener: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Builder<'a> {
        self.config = config;
        self
    }

    pub fn with_listener(mut self, listener: &'a dyn AnalyticsListener) -> Builder<'a> {
        self.listener = Some(listener);
        self
    }

    /// Builds the next generation.
    ///
    /// `updates` are keyed by node ids of `previous`. Without a previous generation, or with
    /// [`BuildTrigger::NewTree`], every node is built from scratch with its initial state.
    pub fn build(
        &self,
        root: Option<&Arc<dyn Component>>,
        previous: Option<&ScopeRoot>,
        updates: &StateUpdateMap,
        trigger: BuildTrigger,
    ) -> BuildResult {
        let previous = match trigger {
            BuildTrigger::NewTree => None,
            _ => previous,
        };
        let id = match previous {
            Some(previous) => previous.id().successor(),
            None => ScopeRootId::first(),
        };

        if let Some(listener) = self.listener {
            listener.will_build_tree(id, trigger, updates);
        }
        log::debug!(
            "building generation {} ({:?}, {} update targets)",
            id,
            trigger,
            updates.len()
        );

        let _phase = creation::enter(Phase::Build, self.config.validate_creation);
        let dirty = dirty_ids_for(previous, updates, trigger);
        let collect_creation_info = self
            .listener
            .map_or(false, |listener| listener.should_collect_tree_node_creation_information(id));

        let mut cx = BuildContext {
            previous,
            updates,
            reuse: self.config.reuse_enabled
                && trigger == BuildTrigger::StateUpdate
                && previous.is_some(),
            listener: self.listener,
            collect_creation_info,
            scope_root: ScopeRoot::new(id, previous.map(ScopeRoot::id), dirty),
            bounds_animation: BoundsAnimation::default(),
            reused: Vec::new(),
            keyed: HashSet::new(),
        };

        if let Some(root) = root {
            let mut keys = KeyAssigner::new();
            let key = cx.assign_key(&mut keys, None, root);
            let previous_root = previous
                .and_then(ScopeRoot::root_node)
                .filter(|node| node.key() == &key);
            let root_id = cx.build_node(root, key, None, false, previous_root);
            cx.scope_root.set_root(root_id);
        }

        let BuildContext {
            scope_root,
            bounds_animation,
            reused,
            ..
        } = cx;
        let result = BuildResult {
            root_node: scope_root.root(),
            scope_root: Arc::new(scope_root),
            bounds_animation,
            reused,
        };

        log::debug!(
            "built generation {}: {} nodes, {} reused subtrees",
            id,
            result.scope_root.len(),
            result.reused.len()
        );
        if let Some(listener) = self.listener {
            listener.did_build_tree(
                &result.scope_root,
                trigger,
                updates,
                root,
                result.bounds_animation,
            );
        }
        result
    }

    /// Builds the next generation from a root produced by `provider`.
    ///
    /// The provider runs inside the build phase, so components it creates pass creation
    /// validation.
    pub fn build_with<F>(
        &self,
        provider: F,
        previous: Option<&ScopeRoot>,
        updates: &StateUpdateMap,
        trigger: BuildTrigger,
    ) -> (Option<Arc<dyn Component>>, BuildResult)
    where
        F: FnOnce() -> Option<Arc<dyn Component>>,
    {
        let root = {
            let _phase = creation::enter(Phase::Build, self.config.validate_creation);
            provider()
        };
        let result = self.build(root.as_ref(), previous, updates, trigger);
        (root, result)
    }
}

/// Builds a generation with the default configuration and no listener.
pub fn build(
    root: Option<&Arc<dyn Component>>,
    previous: Option<&ScopeRoot>,
    updates: &StateUpdateMap,
    trigger: BuildTrigger,
) -> BuildResult {
    Builder::new().build(root, previous, updates, trigger)
}

struct BuildContext<'a> {
    previous: Option<&'a ScopeRoot>,
    updates: &'a StateUpdateMap,
    reuse: bool,
    listener: Option<&'a dyn AnalyticsListener>,
    collect_creation_info: bool,
    scope_root: ScopeRoot,
    bounds_animation: BoundsAnimation,
    reused: Vec<ReusedSubtree>,
    /// (owner, component address) pairs that already have a key.
    keyed: HashSet<(Option<NodeId>, usize)>,
}

impl<'a> BuildContext<'a> {
    fn assign_key(
        &mut self,
        keys: &mut KeyAssigner,
        owner: Option<NodeId>,
        component: &Arc<dyn Component>,
    ) -> IdentityKey {
        if cfg!(debug_assertions) {
            let first = self.keyed.insert((owner, address(&**component)));
            debug_assert!(
                first,
                "identity key for {} computed twice under the same owner",
                component.type_name()
            );
        }
        keys.assign_component(&**component)
    }

    fn previous_child(
        &self,
        previous_owner: Option<&'a Arc<TreeNode>>,
        key: &IdentityKey,
    ) -> Option<&'a Arc<TreeNode>> {
        let previous = self.previous?;
        previous.node(previous_owner?.child(key)?)
    }

    /// Builds `component` and everything below it under `owner`.
    ///
    /// `owner_has_state_update` is whether this build consumes updates for the owner’s previous
    /// node.
    fn build_node(
        &mut self,
        component: &Arc<dyn Component>,
        key: IdentityKey,
        owner: Option<NodeId>,
        owner_has_state_update: bool,
        previous_node: Option<&'a Arc<TreeNode>>,
    ) -> NodeId {
        let has_state_update = previous_node.map_or(false, |node| self.updates.contains(node.id()));
        match component.kind() {
            Kind::Leaf => {
                let id = NodeId::new();
                let handle = self.scope_handle(component, id, previous_node);
                let node = TreeNode::new(id, key, IndexMap::new(), handle);
                self.scope_root.insert(node, owner, component);
                id
            }
            Kind::Composite => {
                let id = NodeId::new();
                let handle = self.scope_handle(component, id, previous_node);
                if self.collect_creation_info {
                    if let Some(listener) = self.listener {
                        listener.did_build_tree_node_for_precomputed_child(
                            &**component,
                            id,
                            owner,
                            owner_has_state_update,
                        );
                    }
                }

                let mut keys = KeyAssigner::new();
                let mut children = IndexMap::with_capacity(component.children().len());
                for child in component.children() {
                    let child_key = self.assign_key(&mut keys, Some(id), child);
                    let previous_child = self.previous_child(previous_node, &child_key);
                    let child_id = self.build_node(
                        child,
                        child_key.clone(),
                        Some(id),
                        has_state_update,
                        previous_child,
                    );
                    children.insert(child_key, child_id);
                }

                let node = TreeNode::new(id, key, children, handle);
                self.scope_root.insert(node, owner, component);
                id
            }
            Kind::Render => {
                if let Some(previous_node) = previous_node {
                    if let Some(previous) = self.reusable(component, previous_node) {
                        return self.reuse(previous, previous_node, owner, component);
                    }
                }

                let id = NodeId::new();
                let handle = self.scope_handle(component, id, previous_node);
                let child = {
                    let _frame = creation::enter_render(&**component, id);
                    component.render(&Scope::new(id, handle.as_ref()))
                };

                let mut keys = KeyAssigner::new();
                let child_key = self.assign_key(&mut keys, Some(id), &child);
                let previous_child = self.previous_child(previous_node, &child_key);
                let child_id = self.build_node(
                    &child,
                    child_key.clone(),
                    Some(id),
                    has_state_update,
                    previous_child,
                );
                let mut children = IndexMap::with_capacity(1);
                children.insert(child_key, child_id);

                let node = TreeNode::new(id, key, children, handle);
                self.scope_root.insert(node, owner, component);
                self.scope_root.set_rendered_child(id, child);
                id
            }
        }
    }

    /// Attaches a scope handle to a freshly built node.
    ///
    /// A matched previous node hands over its state with this build’s updates applied. Otherwise
    /// the component’s initial state is used, if it has one.
    fn scope_handle(
        &mut self,
        component: &Arc<dyn Component>,
        id: NodeId,
        previous_node: Option<&'a Arc<TreeNode>>,
    ) -> Option<Arc<ScopeHandle>> {
        let previous = previous_node.and_then(|node| Some((node.id(), node.scope_handle()?)));
        match previous {
            Some((previous_id, handle)) => {
                let (successor, animation) = handle.successor(id, self.updates.get(previous_id));
                self.bounds_animation = self.bounds_animation.merge(animation);
                Some(Arc::new(successor))
            }
            None => component
                .initial_state()
                .map(|state| Arc::new(ScopeHandle::new(id, state))),
        }
    }

    /// Returns the previous generation if `previous_node` may be reused for `component`.
    fn reusable(
        &self,
        component: &Arc<dyn Component>,
        previous_node: &Arc<TreeNode>,
    ) -> Option<&'a ScopeRoot> {
        if !self.reuse || self.scope_root.is_dirty(previous_node.id()) {
            return None;
        }
        let previous = self.previous?;
        // only render nodes have a rendered child to carry over
        previous.rendered_child(previous_node.id())?;
        let previous_component = previous.component(previous_node.id())?;
        if component.should_update(&**previous_component) {
            return None;
        }
        Some(previous)
    }

    fn reuse(
        &mut self,
        previous: &'a ScopeRoot,
        previous_node: &'a Arc<TreeNode>,
        owner: Option<NodeId>,
        component: &Arc<dyn Component>,
    ) -> NodeId {
        let nodes = self
            .scope_root
            .adopt(previous, previous_node, owner, component);
        log::trace!(
            "reused {} ({} nodes) from generation {}",
            previous_node.key(),
            nodes,
            previous.id()
        );
        if let Some(listener) = self.listener {
            listener.did_reuse_node(previous_node, self.scope_root.id(), previous.id());
        }
        self.reused.push(ReusedSubtree {
            node: previous_node.id(),
            nodes,
        });
        previous_node.id()
    }
}
