//! Component state.
//!
//! Every stateful component identity owns a [`ScopeHandle`]. Handles are immutable once their
//! generation is published; a rebuilt node gets a successor handle carrying the updated state,
//! while a reused node keeps its handle as it is.

use crate::id::{NodeId, ScopeId};
use core::any::{Any, TypeId};
use core::fmt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// An opaque state value.
pub type StateValue = Arc<dyn Any + Send + Sync>;

/// Animation to apply to bounds changes caused by a state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BoundsAnimation {
    pub duration: Duration,
    pub delay: Duration,
}

impl BoundsAnimation {
    pub fn new(duration: Duration) -> BoundsAnimation {
        BoundsAnimation {
            duration,
            delay: Duration::from_secs(0),
        }
    }

    pub fn is_none(&self) -> bool {
        self.duration == Duration::from_secs(0)
    }

    /// Picks the longer of two animations.
    pub(crate) fn merge(self, other: BoundsAnimation) -> BoundsAnimation {
        if other.duration + other.delay > self.duration + self.delay {
            other
        } else {
            self
        }
    }
}

/// A pure state transition.
#[derive(Clone)]
pub struct StateUpdate {
    transition: Arc<dyn Fn(&StateValue) -> StateValue + Send + Sync>,
    animation: Option<BoundsAnimation>,
}

impl StateUpdate {
    /// Creates a typed transition.
    ///
    /// Applying it to a state of a different type is a programming error: it asserts in debug
    /// builds and leaves the state alone otherwise.
    pub fn new<T, F>(transition: F) -> StateUpdate
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        StateUpdate {
            transition: Arc::new(move |state: &StateValue| match state.downcast_ref::<T>() {
                Some(state) => Arc::new(transition(state)) as StateValue,
                None => {
                    debug_assert!(
                        false,
                        "state update expected state of type {}",
                        core::any::type_name::<T>()
                    );
                    log::error!(
                        "ignoring state update: expected state of type {}",
                        core::any::type_name::<T>()
                    );
                    Arc::clone(state)
                }
            }),
            animation: None,
        }
    }

    pub fn with_animation(mut self, animation: BoundsAnimation) -> StateUpdate {
        self.animation = Some(animation);
        self
    }

    pub fn animation(&self) -> Option<BoundsAnimation> {
        self.animation
    }

    pub fn apply(&self, state: &StateValue) -> StateValue {
        (self.transition)(state)
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StateUpdate")
            .field("animation", &self.animation)
            .finish()
    }
}

/// Pending state updates, keyed by the node they target.
///
/// Transitions for one node are applied in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StateUpdateMap {
    updates: HashMap<NodeId, Vec<StateUpdate>>,
}

impl StateUpdateMap {
    pub fn new() -> StateUpdateMap {
        StateUpdateMap::default()
    }

    pub fn push(&mut self, node: NodeId, update: StateUpdate) {
        self.updates.entry(node).or_default().push(update);
    }

    /// Enqueues a typed transition for a node.
    pub fn enqueue<T, F>(&mut self, node: NodeId, transition: F)
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.push(node, StateUpdate::new(transition));
    }

    /// Moves all updates from another map behind the ones already queued.
    pub fn extend(&mut self, other: StateUpdateMap) {
        for (node, updates) in other.updates {
            self.updates.entry(node).or_default().extend(updates);
        }
    }

    pub fn get(&self, node: NodeId) -> &[StateUpdate] {
        self.updates.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.updates.contains_key(&node)
    }

    /// Nodes with at least one pending update.
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.updates.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }
}

/// Owns the state of one component identity.
pub struct ScopeHandle {
    scope: ScopeId,
    node: NodeId,
    state: StateValue,
    /// Shared by every generation of this identity.
    queue: Arc<Mutex<Vec<StateUpdate>>>,
}

impl ScopeHandle {
    pub(crate) fn new(node: NodeId, state: StateValue) -> ScopeHandle {
        ScopeHandle {
            scope: ScopeId::new(),
            node,
            state,
            queue: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates the handle for a rebuilt node with the given updates applied.
    ///
    /// Returns the longest bounds animation requested by the applied updates.
    pub(crate) fn successor(
        &self,
        node: NodeId,
        updates: &[StateUpdate],
    ) -> (ScopeHandle, BoundsAnimation) {
        let mut state = Arc::clone(&self.state);
        let mut animation = BoundsAnimation::default();
        for update in updates {
            state = update.apply(&state);
            if let Some(update_animation) = update.animation() {
                animation = animation.merge(update_animation);
            }
        }
        let handle = ScopeHandle {
            scope: self.scope,
            node,
            state,
            queue: Arc::clone(&self.queue),
        };
        (handle, animation)
    }

    /// Identity of the component this handle belongs to.
    pub fn scope_id(&self) -> ScopeId {
        self.scope
    }

    /// The node this handle is linked to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> &StateValue {
        &self.state
    }

    /// Queues a state transition; it takes effect in the next state-update build.
    pub fn update_state<T, F>(&self, transition: F)
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.queue.lock().push(StateUpdate::new(transition));
    }

    /// Queues a state transition that animates the resulting bounds change.
    pub fn update_state_animated<T, F>(&self, transition: F, animation: BoundsAnimation)
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.queue
            .lock()
            .push(StateUpdate::new(transition).with_animation(animation));
    }

    pub fn has_pending_updates(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    pub(crate) fn drain_into(&self, updates: &mut StateUpdateMap) {
        for update in self.queue.lock().drain(..) {
            updates.push(self.node, update);
        }
    }
}

impl fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ScopeHandle")
            .field("scope", &self.scope)
            .field("node", &self.node)
            .finish()
    }
}

/// What a render component sees of its node while rendering.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    node: NodeId,
    handle: Option<&'a Arc<ScopeHandle>>,
}

impl<'a> Scope<'a> {
    pub fn new(node: NodeId, handle: Option<&'a Arc<ScopeHandle>>) -> Scope<'a> {
        Scope { node, handle }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn handle(&self) -> Option<&'a Arc<ScopeHandle>> {
        self.handle
    }

    /// The current state.
    ///
    /// Stateless components can ask for `()`.
    pub fn state<T: Any>(&self) -> Option<&'a T> {
        match self.handle {
            Some(handle) => handle.state().downcast_ref::<T>(),
            None if TypeId::of::<T>() == TypeId::of::<()>() => (&() as &dyn Any).downcast_ref(),
            None => None,
        }
    }
}
