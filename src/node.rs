use crate::id::NodeId;
use crate::key::IdentityKey;
use crate::scope::{ScopeHandle, StateValue};
use indexmap::IndexMap;
use std::sync::Arc;

/// A node in the component tree.
///
/// Nodes never change once their generation is published. Reusing a node attaches the same
/// object to the next generation’s scope root; parent links and components live in the scope
/// root, since they may differ between generations that share a node.
#[derive(Debug)]
pub struct TreeNode {
    id: NodeId,
    /// Key relative to the owner.
    key: IdentityKey,
    /// Children in build order.
    children: IndexMap<IdentityKey, NodeId>,
    scope_handle: Option<Arc<ScopeHandle>>,
}

impl TreeNode {
    pub(crate) fn new(
        id: NodeId,
        key: IdentityKey,
        children: IndexMap<IdentityKey, NodeId>,
        scope_handle: Option<Arc<ScopeHandle>>,
    ) -> TreeNode {
        debug_assert!(
            scope_handle.as_ref().map_or(true, |handle| handle.node() == id),
            "scope handle must be linked to its node before the node is created"
        );
        TreeNode {
            id,
            key,
            children,
            scope_handle,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    /// Returns the child with the given key.
    pub fn child(&self, key: &IdentityKey) -> Option<NodeId> {
        self.children.get(key).copied()
    }

    /// Children in build order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = (&IdentityKey, NodeId)> + '_ {
        self.children.iter().map(|(key, id)| (key, *id))
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn scope_handle(&self) -> Option<&Arc<ScopeHandle>> {
        self.scope_handle.as_ref()
    }

    /// The component’s state, if it has any.
    pub fn state(&self) -> Option<&StateValue> {
        self.scope_handle.as_ref().map(|handle| handle.state())
    }
}

#[test]
fn test_tree_node_children_keep_build_order() {
    use crate::key::KeyAssigner;

    let mut keys = KeyAssigner::new();
    let mut children = IndexMap::new();
    let mut expected = Vec::new();
    for name in &["b", "a", "c"] {
        let key = keys.assign("T", Some((*name).into()), Vec::new());
        let id = NodeId::new();
        expected.push(id);
        children.insert(key, id);
    }

    let id = NodeId::new();
    let handle = Arc::new(ScopeHandle::new(id, Arc::new(0u8)));
    let node = TreeNode::new(id, keys.assign("Root", None, Vec::new()), children, Some(handle));

    assert_eq!(node.children().map(|(_, id)| id).collect::<Vec<_>>(), expected);
    let key_a = KeyAssigner::new().assign("T", Some("a".into()), Vec::new());
    assert_eq!(node.child(&key_a), Some(expected[1]));
    assert_eq!(node.state().and_then(|s| s.downcast_ref::<u8>()), Some(&0));
}
