//! Identifiers.
//!
//! Node, scope and tree identifiers come from process-wide counters that start at 1 and only ever
//! go up. They are never reclaimed; a process builds far fewer nodes than fit in a `u64`.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Process-wide identifier counters.
struct Registry {
    next_node: AtomicU64,
    next_scope: AtomicU64,
    next_tree: AtomicU64,
}

static REGISTRY: Registry = Registry {
    next_node: AtomicU64::new(1),
    next_scope: AtomicU64::new(1),
    next_tree: AtomicU64::new(1),
};

fn next(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed)
}

/// A unique identifier for a tree node.
///
/// Assigned when the node is created and kept by the node for as long as it is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new() -> NodeId {
        NodeId(next(&REGISTRY.next_node))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a scope handle; shared by every generation of the same logical component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    pub(crate) fn new() -> ScopeId {
        ScopeId(next(&REGISTRY.next_scope))
    }
}

/// Identifies a sequence of generations that descend from one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(u64);

impl TreeId {
    pub(crate) fn new() -> TreeId {
        TreeId(next(&REGISTRY.next_tree))
    }
}

/// Identifies one published generation of a tree.
///
/// The generation number starts at 1 for a tree's first build and goes up by one for every build
/// that descends from a previous scope root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeRootId {
    tree: TreeId,
    generation: u64,
}

impl ScopeRootId {
    pub(crate) fn first() -> ScopeRootId {
        ScopeRootId {
            tree: TreeId::new(),
            generation: 1,
        }
    }

    pub(crate) fn successor(self) -> ScopeRootId {
        ScopeRootId {
            tree: self.tree,
            generation: self.generation + 1,
        }
    }

    pub fn tree(self) -> TreeId {
        self.tree
    }

    pub fn generation(self) -> u64 {
        self.generation
    }
}

impl fmt::Display for ScopeRootId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.tree.0, self.generation)
    }
}

/// Identifies one layout pass.
///
/// Layout may run for the same tree on several threads at once, so `will_layout`/`did_layout`
/// notifications are paired by this id rather than by call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutContextId(Uuid);

impl LayoutContextId {
    pub(crate) fn new() -> LayoutContextId {
        LayoutContextId(Uuid::new_v4())
    }
}

impl fmt::Display for LayoutContextId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[test]
fn test_ids_are_monotonic() {
    let a = NodeId::new();
    let b = NodeId::new();
    assert!(b > a, "node ids should only go up");

    let first = ScopeRootId::first();
    let second = first.successor();
    assert_eq!(first.tree(), second.tree());
    assert_eq!(second.generation(), first.generation() + 1);
    assert_ne!(ScopeRootId::first().tree(), first.tree(), "every first build starts a new tree");
}
