use crate::component::{address, Component};
use crate::dirty::DirtyIds;
use crate::id::{NodeId, ScopeRootId};
use crate::key::IdentityKey;
use crate::node::TreeNode;
use crate::scope::StateUpdateMap;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

/// One published generation of a component tree.
///
/// Holds every node reachable from the root, indexed by id, along with the parent links and
/// components of this generation. The next build looks up previous counterparts here.
pub struct ScopeRoot {
    id: ScopeRootId,
    previous_id: Option<ScopeRootId>,
    root: Option<NodeId>,
    nodes: HashMap<NodeId, Arc<TreeNode>>,
    /// Child to owner.
    parents: HashMap<NodeId, NodeId>,
    /// The component each node was built from in this generation.
    components: HashMap<NodeId, Arc<dyn Component>>,
    /// The child each render node rendered.
    rendered: HashMap<NodeId, Arc<dyn Component>>,
    /// Component address to node; see `node_for_component`.
    by_component: HashMap<usize, NodeId>,
    dirty: DirtyIds,
}

impl ScopeRoot {
    pub(crate) fn new(id: ScopeRootId, previous_id: Option<ScopeRootId>, dirty: DirtyIds) -> ScopeRoot {
        ScopeRoot {
            id,
            previous_id,
            root: None,
            nodes: HashMap::new(),
            parents: HashMap::new(),
            components: HashMap::new(),
            rendered: HashMap::new(),
            by_component: HashMap::new(),
            dirty,
        }
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        debug_assert!(self.nodes.contains_key(&root), "root node must be registered first");
        self.root = Some(root);
    }

    /// Registers a freshly built node.
    pub(crate) fn insert(
        &mut self,
        node: TreeNode,
        parent: Option<NodeId>,
        component: &Arc<dyn Component>,
    ) {
        let id = node.id();
        debug_assert!(!self.nodes.contains_key(&id), "node {} registered twice", id);
        self.nodes.insert(id, Arc::new(node));
        if let Some(parent) = parent {
            self.parents.insert(id, parent);
        }
        self.by_component.insert(address(&**component), id);
        self.components.insert(id, Arc::clone(component));
    }

    pub(crate) fn set_rendered_child(&mut self, node: NodeId, child: Arc<dyn Component>) {
        self.rendered.insert(node, child);
    }

    /// Attaches a node of the previous generation, and everything below it, to this one.
    ///
    /// The node itself is attached under `parent` and represented by `component`; its
    /// descendants keep their previous owners and components. Returns the number of nodes
    /// attached.
    pub(crate) fn adopt(
        &mut self,
        previous: &ScopeRoot,
        node: &Arc<TreeNode>,
        parent: Option<NodeId>,
        component: &Arc<dyn Component>,
    ) -> usize {
        let id = node.id();
        self.nodes.insert(id, Arc::clone(node));
        if let Some(parent) = parent {
            self.parents.insert(id, parent);
        }
        self.by_component.insert(address(&**component), id);
        self.components.insert(id, Arc::clone(component));
        if let Some(child) = previous.rendered.get(&id) {
            self.rendered.insert(id, Arc::clone(child));
        }

        let mut count = 1;
        for (_, child) in node.children() {
            if let Some(child_node) = previous.node(child) {
                count += self.adopt_descendant(previous, child_node, id);
            }
        }
        count
    }

    fn adopt_descendant(&mut self, previous: &ScopeRoot, node: &Arc<TreeNode>, parent: NodeId) -> usize {
        let id = node.id();
        self.nodes.insert(id, Arc::clone(node));
        self.parents.insert(id, parent);
        if let Some(component) = previous.components.get(&id) {
            self.by_component.insert(address(&**component), id);
            self.components.insert(id, Arc::clone(component));
        }
        if let Some(child) = previous.rendered.get(&id) {
            self.rendered.insert(id, Arc::clone(child));
        }

        let mut count = 1;
        for (_, child) in node.children() {
            if let Some(child_node) = previous.node(child) {
                count += self.adopt_descendant(previous, child_node, id);
            }
        }
        count
    }

    pub fn id(&self) -> ScopeRootId {
        self.id
    }

    /// The generation this one was built from.
    pub fn previous_id(&self) -> Option<ScopeRootId> {
        self.previous_id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_node(&self) -> Option<&Arc<TreeNode>> {
        self.root.and_then(|root| self.nodes.get(&root))
    }

    /// The root component of this generation.
    pub fn root_component(&self) -> Option<&Arc<dyn Component>> {
        self.root.and_then(|root| self.components.get(&root))
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<TreeNode>> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The owner of a node; `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// Walks from a node’s owner up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = id;
        std::iter::from_fn(move || {
            let parent = self.parent(current)?;
            current = parent;
            Some(parent)
        })
    }

    /// The component a node represents in this generation.
    pub fn component(&self, id: NodeId) -> Option<&Arc<dyn Component>> {
        self.components.get(&id)
    }

    /// The child a render node rendered.
    pub fn rendered_child(&self, id: NodeId) -> Option<&Arc<dyn Component>> {
        self.rendered.get(&id)
    }

    /// Finds the node for a component instance of this generation.
    ///
    /// An instance placed under several owners maps to the occurrence built last. Layout
    /// follows the node graph instead and tells the occurrences apart.
    pub fn node_for_component(&self, component: &dyn Component) -> Option<NodeId> {
        self.by_component.get(&address(component)).copied()
    }

    /// Keys from the root down to the node.
    pub fn key_path(&self, id: NodeId) -> Option<Vec<IdentityKey>> {
        let node = self.nodes.get(&id)?;
        let mut path = vec![node.key().clone()];
        for ancestor in self.ancestors(id) {
            path.push(self.nodes.get(&ancestor)?.key().clone());
        }
        path.reverse();
        Some(path)
    }

    /// Finds a node by its key path from the root.
    pub fn node_at_path(&self, path: &[IdentityKey]) -> Option<NodeId> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root_node().filter(|root| root.key() == first)?;
        for key in rest {
            node = self.nodes.get(&node.child(key)?)?;
        }
        Some(node.id())
    }

    /// Nodes that were forced to rebuild in this generation.
    pub fn dirty_ids(&self) -> &DirtyIds {
        &self.dirty
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.dirty.contains(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<TreeNode>> + '_ {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Collects the updates queued on the scope handles of this generation.
    pub fn drain_state_updates(&self) -> StateUpdateMap {
        let mut updates = StateUpdateMap::new();
        for node in self.nodes.values() {
            if let Some(handle) = node.scope_handle() {
                handle.drain_into(&mut updates);
            }
        }
        updates
    }

    pub fn has_pending_state_updates(&self) -> bool {
        self.nodes
            .values()
            .filter_map(|node| node.scope_handle())
            .any(|handle| handle.has_pending_updates())
    }
}

impl fmt::Debug for ScopeRoot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ScopeRoot")
            .field("id", &self.id)
            .field("previous_id", &self.previous_id)
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}
