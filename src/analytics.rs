//! Instrumentation hooks.
//!
//! A listener is told about builds, reuse, layouts and mounts. It is purely informational: what
//! it does never changes a build or layout result.
//!
//! Notifications come in before/after pairs. Layout may run for the same tree on several threads
//! at once, so `will_layout` and `did_layout` are paired by their [`LayoutContextId`] and root
//! node, never by order.

use crate::build::BuildTrigger;
use crate::component::Component;
use crate::id::{LayoutContextId, NodeId, ScopeId, ScopeRootId};
use crate::node::TreeNode;
use crate::scope::{BoundsAnimation, StateUpdateMap};
use crate::scope_root::ScopeRoot;
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Receives notifications at phase boundaries. All methods do nothing by default.
pub trait AnalyticsListener: Send + Sync {
    /// Called before a tree is built.
    fn will_build_tree(
        &self,
        _scope_root: ScopeRootId,
        _trigger: BuildTrigger,
        _updates: &StateUpdateMap,
    ) {
    }

    /// Called after a tree has been built.
    fn did_build_tree(
        &self,
        _scope_root: &ScopeRoot,
        _trigger: BuildTrigger,
        _updates: &StateUpdateMap,
        _root: Option<&Arc<dyn Component>>,
        _bounds_animation: BoundsAnimation,
    ) {
    }

    /// Called after a render node of the previous generation has been reused.
    fn did_reuse_node(&self, _node: &TreeNode, _scope_root: ScopeRootId, _previous: ScopeRootId) {}

    /// If true, `did_build_tree_node_for_precomputed_child` is called during this build.
    fn should_collect_tree_node_creation_information(&self, _scope_root: ScopeRootId) -> bool {
        false
    }

    /// Called for every composite node built, before its children are built.
    ///
    /// `parent_has_state_update` is whether the build consumes state updates for the owner.
    fn did_build_tree_node_for_precomputed_child(
        &self,
        _component: &dyn Component,
        _node: NodeId,
        _parent: Option<NodeId>,
        _parent_has_state_update: bool,
    ) {
    }

    /// Called once for every state update a tree receives for a scope of generation `root`.
    fn did_receive_state_update(&self, _scope: ScopeId, _root: ScopeRootId) {}

    /// Called before a tree is laid out.
    ///
    /// `trigger` is `None` when the layout wasn’t caused by a build, e.g. when only the size
    /// range changed.
    fn will_layout(
        &self,
        _root: &dyn Component,
        _root_node: Option<NodeId>,
        _trigger: Option<BuildTrigger>,
        _context: LayoutContextId,
    ) {
    }

    /// Called after a tree has been laid out.
    fn did_layout(&self, _root: &dyn Component, _root_node: Option<NodeId>, _context: LayoutContextId) {}

    /// Called before a layout is mounted.
    fn will_mount(&self, _root_node: Option<NodeId>) {}

    /// Called after a layout has been mounted.
    fn did_mount(&self, _root_node: Option<NodeId>, _mounted: usize) {}
}

/// A notification, as recorded by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    WillBuild {
        scope_root: ScopeRootId,
        trigger: BuildTrigger,
        updates: usize,
    },
    DidBuild {
        scope_root: ScopeRootId,
        trigger: BuildTrigger,
        nodes: usize,
        bounds_animation: BoundsAnimation,
    },
    DidReuse {
        node: NodeId,
        scope_root: ScopeRootId,
        previous: ScopeRootId,
    },
    DidBuildPrecomputedChild {
        node: NodeId,
        parent: Option<NodeId>,
        parent_has_state_update: bool,
    },
    DidReceiveStateUpdate {
        scope: ScopeId,
        root: ScopeRootId,
    },
    WillLayout {
        root_node: Option<NodeId>,
        trigger: Option<BuildTrigger>,
        context: LayoutContextId,
        thread: ThreadId,
    },
    DidLayout {
        root_node: Option<NodeId>,
        context: LayoutContextId,
        thread: ThreadId,
    },
    WillMount {
        root_node: Option<NodeId>,
    },
    DidMount {
        root_node: Option<NodeId>,
        mounted: usize,
    },
}

/// A listener that records every notification.
///
/// Events from any number of threads end up in one queue.
#[derive(Debug)]
pub struct RecordingListener {
    sender: Sender<AnalyticsEvent>,
    receiver: Receiver<AnalyticsEvent>,
    collect_creation_information: bool,
}

impl Default for RecordingListener {
    fn default() -> RecordingListener {
        RecordingListener::new()
    }
}

impl RecordingListener {
    pub fn new() -> RecordingListener {
        let (sender, receiver) = channel::unbounded();
        RecordingListener {
            sender,
            receiver,
            collect_creation_information: false,
        }
    }

    /// Also records composite node creation.
    pub fn collecting_creation_information() -> RecordingListener {
        RecordingListener {
            collect_creation_information: true,
            ..RecordingListener::new()
        }
    }

    /// Takes all events recorded so far.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.receiver.try_iter().collect()
    }

    fn record(&self, event: AnalyticsEvent) {
        // the receiver lives as long as self, so this can’t fail
        let _ = self.sender.send(event);
    }
}

impl AnalyticsListener for RecordingListener {
    fn will_build_tree(&self, scope_root: ScopeRootId, trigger: BuildTrigger, updates: &StateUpdateMap) {
        self.record(AnalyticsEvent::WillBuild {
            scope_root,
            trigger,
            updates: updates.len(),
        });
    }

    fn did_build_tree(
        &self,
        scope_root: &ScopeRoot,
        trigger: BuildTrigger,
        _updates: &StateUpdateMap,
        _root: Option<&Arc<dyn Component>>,
        bounds_animation: BoundsAnimation,
    ) {
        self.record(AnalyticsEvent::DidBuild {
            scope_root: scope_root.id(),
            trigger,
            nodes: scope_root.len(),
            bounds_animation,
        });
    }

    fn did_reuse_node(&self, node: &TreeNode, scope_root: ScopeRootId, previous: ScopeRootId) {
        self.record(AnalyticsEvent::DidReuse {
            node: node.id(),
            scope_root,
            previous,
        });
    }

    fn should_collect_tree_node_creation_information(&self, _scope_root: ScopeRootId) -> bool {
        self.collect_creation_information
    }

    fn did_build_tree_node_for_precomputed_child(
        &self,
        _component: &dyn Component,
        node: NodeId,
        parent: Option<NodeId>,
        parent_has_state_update: bool,
    ) {
        self.record(AnalyticsEvent::DidBuildPrecomputedChild {
            node,
            parent,
            parent_has_state_update,
        });
    }

    fn did_receive_state_update(&self, scope: ScopeId, root: ScopeRootId) {
        self.record(AnalyticsEvent::DidReceiveStateUpdate { scope, root });
    }

    fn will_layout(
        &self,
        _root: &dyn Component,
        root_node: Option<NodeId>,
        trigger: Option<BuildTrigger>,
        context: LayoutContextId,
    ) {
        self.record(AnalyticsEvent::WillLayout {
            root_node,
            trigger,
            context,
            thread: thread::current().id(),
        });
    }

    fn did_layout(&self, _root: &dyn Component, root_node: Option<NodeId>, context: LayoutContextId) {
        self.record(AnalyticsEvent::DidLayout {
            root_node,
            context,
            thread: thread::current().id(),
        });
    }

    fn will_mount(&self, root_node: Option<NodeId>) {
        self.record(AnalyticsEvent::WillMount { root_node });
    }

    fn did_mount(&self, root_node: Option<NodeId>, mounted: usize) {
        self.record(AnalyticsEvent::DidMount { root_node, mounted });
    }
}
