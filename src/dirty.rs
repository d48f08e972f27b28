//! Dirty paths.
//!
//! A state update invalidates the node it targets and every ancestor up to the root. Everything
//! off those paths, siblings of dirty nodes included, may be reused.

use crate::build::BuildTrigger;
use crate::id::NodeId;
use crate::scope::StateUpdateMap;
use crate::scope_root::ScopeRoot;
use std::collections::HashSet;

/// Nodes that must be rebuilt.
pub type DirtyIds = HashSet<NodeId>;

/// Computes the dirty paths for a build.
///
/// Returns an empty set unless the build was triggered by state updates; builds caused by
/// anything else don’t reuse at all.
pub fn dirty_ids_for(
    previous: Option<&ScopeRoot>,
    updates: &StateUpdateMap,
    trigger: BuildTrigger,
) -> DirtyIds {
    let mut dirty = DirtyIds::new();
    if trigger != BuildTrigger::StateUpdate {
        return dirty;
    }
    let previous = match previous {
        Some(previous) => previous,
        None => return dirty,
    };

    for target in updates.targets() {
        mark_until_root(target, previous, &mut dirty);
    }
    dirty
}

/// Marks a node and its ancestors in the previous generation.
pub fn mark_until_root(node: NodeId, previous: &ScopeRoot, dirty: &mut DirtyIds) {
    if !previous.contains(node) {
        log::warn!(
            "state update targets node {} which is not part of generation {}",
            node,
            previous.id()
        );
        return;
    }
    if !dirty.insert(node) {
        return;
    }
    for ancestor in previous.ancestors(node) {
        if !dirty.insert(ancestor) {
            // the rest of the path is already marked
            break;
        }
    }
}
