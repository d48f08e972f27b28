//! Layout cache.
//!
//! Entries are grouped by the generation they were computed for. Preparing the cache for the
//! next generation of a tree carries over the entries of nodes the new generation still contains
//! and didn’t mark dirty; everything older is dropped.

use crate::geometry::{Size, SizeRange};
use crate::id::{NodeId, ScopeRootId};
use crate::layout::Layout;
use crate::scope_root::ScopeRoot;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// (node, size range bits, parent size bits)
type EntryKey = (NodeId, [u64; 4], [u64; 2]);

type Entries = HashMap<EntryKey, Arc<Layout>>;

/// Caches subtree layouts across layout passes.
///
/// Shared between threads; concurrent layouts of the same generation read and fill the same
/// entries.
#[derive(Debug, Default)]
pub struct LayoutCache {
    generations: RwLock<HashMap<ScopeRootId, Entries>>,
    hits: AtomicUsize,
}

fn entry_key(node: NodeId, range: SizeRange, parent_size: Size) -> EntryKey {
    (
        node,
        range.bits(),
        [parent_size.x.to_bits(), parent_size.y.to_bits()],
    )
}

impl LayoutCache {
    pub fn new() -> LayoutCache {
        LayoutCache::default()
    }

    /// Makes the cache ready for a generation.
    pub fn prepare(&self, scope_root: &ScopeRoot) {
        let id = scope_root.id();
        if self.generations.read().contains_key(&id) {
            return;
        }

        let mut generations = self.generations.write();
        if generations.contains_key(&id) {
            return;
        }

        let carried: Entries = scope_root
            .previous_id()
            .and_then(|previous| generations.get(&previous))
            .map(|previous| {
                previous
                    .iter()
                    .filter(|((node, _, _), _)| {
                        scope_root.contains(*node) && !scope_root.is_dirty(*node)
                    })
                    .map(|(key, layout)| (*key, Arc::clone(layout)))
                    .collect()
            })
            .unwrap_or_default();
        log::trace!(
            "layout cache for generation {}: carried over {} entries",
            id,
            carried.len()
        );

        // keep the previous generation around for layouts still running against it
        generations.retain(|other, _| {
            other.tree() == id.tree() && other.generation() + 1 >= id.generation()
        });
        generations.insert(id, carried);
    }

    /// Looks up a cached layout.
    ///
    /// Never returns the layout of a node the generation marked dirty.
    pub fn get(
        &self,
        scope_root: &ScopeRoot,
        node: NodeId,
        range: SizeRange,
        parent_size: Size,
    ) -> Option<Arc<Layout>> {
        if scope_root.is_dirty(node) {
            return None;
        }
        let generations = self.generations.read();
        let layout = generations
            .get(&scope_root.id())?
            .get(&entry_key(node, range, parent_size))?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(Arc::clone(layout))
    }

    /// Stores a layout for a prepared generation.
    ///
    /// Layouts of generations the cache hasn't been prepared for, or has since dropped, are
    /// discarded.
    pub fn insert(
        &self,
        scope_root: &ScopeRoot,
        node: NodeId,
        range: SizeRange,
        parent_size: Size,
        layout: Arc<Layout>,
    ) {
        let mut generations = self.generations.write();
        match generations.get_mut(&scope_root.id()) {
            Some(entries) => {
                entries.insert(entry_key(node, range, parent_size), layout);
            }
            None => log::trace!(
                "dropping layout of node {} for stale generation {}",
                node,
                scope_root.id()
            ),
        }
    }

    /// Number of cache hits so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of entries held for a generation.
    pub fn len(&self, scope_root: ScopeRootId) -> usize {
        self.generations
            .read()
            .get(&scope_root)
            .map_or(0, HashMap::len)
    }

    pub fn clear(&self) {
        self.generations.write().clear();
    }
}
