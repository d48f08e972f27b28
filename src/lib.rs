//! Incremental reconciliation of declarative component trees.
//!
//! Components describe UI. A build turns a component tree into a generation of tree nodes,
//! carrying state forward from the previous generation by identity key and reusing render
//! subtrees that no state update touched. A layout turns a built tree into sizes and positions.
//! Mounting is left to a [`MountTarget`].
//!
//! [`ComponentTree`] drives all three for a single tree.

pub mod analytics;
pub mod build;
#[macro_use]
mod component;
mod config;
pub mod creation;
mod dimension;
mod dirty;
mod error;
mod geometry;
mod id;
mod key;
pub mod layout;
mod layout_cache;
mod mount;
mod node;
mod scope;
mod scope_root;
mod tree;

pub use analytics::{AnalyticsEvent, AnalyticsListener, RecordingListener};
pub use build::{BuildResult, BuildTrigger, Builder, ReusedSubtree};
pub use component::{Arrangement, Axis, Block, Component, Fragment, Kind, Stack};
pub use config::Config;
pub use dimension::{ComponentSize, RelativeDimension};
pub use dirty::{dirty_ids_for, mark_until_root, DirtyIds};
pub use error::{Error, Result};
pub use geometry::{Point, Rect, Size, SizeRange};
pub use id::{LayoutContextId, NodeId, ScopeId, ScopeRootId, TreeId};
pub use key::{IdentityKey, Key, KeyAssigner};
pub use layout::{compute_layout, compute_root_layout, Layout, LayoutChild, Layouter, RootLayout};
pub use layout_cache::LayoutCache;
pub use mount::{mount_root_layout, MountTarget, MountedSet};
pub use node::TreeNode;
pub use scope::{BoundsAnimation, Scope, ScopeHandle, StateUpdate, StateUpdateMap, StateValue};
pub use scope_root::ScopeRoot;
pub use tree::ComponentTree;
