//! The mounting interface.
//!
//! Mounting itself happens outside this crate. A [`MountTarget`] receives a finished layout
//! together with the nodes it mounted last time, and decides on its own what to create, update
//! and unmount.

use crate::analytics::AnalyticsListener;
use crate::error::{Error, Result};
use crate::id::NodeId;
use crate::layout::RootLayout;
use std::collections::HashSet;

/// Nodes that currently have a mounted counterpart.
pub type MountedSet = HashSet<NodeId>;

/// Something that turns layouts into real views.
pub trait MountTarget {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Mounts a layout and returns the nodes that are mounted afterwards.
    ///
    /// `previously_mounted` is what the last call returned; nodes missing from the new layout
    /// are for the target to unmount.
    fn mount(
        &mut self,
        layout: &RootLayout,
        previously_mounted: &MountedSet,
    ) -> Result<MountedSet, Self::Error>;
}

/// Mounts a layout, notifying the listener before and after.
///
/// An empty layout is still handed to the target so it can unmount everything.
pub fn mount_root_layout<T: MountTarget>(
    target: &mut T,
    layout: &RootLayout,
    previously_mounted: &MountedSet,
    listener: Option<&dyn AnalyticsListener>,
) -> Result<MountedSet> {
    let root_node = layout.layout().node;
    if let Some(listener) = listener {
        listener.will_mount(root_node);
    }

    let result = target.mount(layout, previously_mounted);
    let mounted_count = result.as_ref().map_or(0, |mounted| mounted.len());
    if let Some(listener) = listener {
        listener.did_mount(root_node, mounted_count);
    }

    result.map_err(|err| Error::Mount(Box::new(err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AnalyticsEvent, RecordingListener};
    use crate::build::{build, BuildTrigger};
    use crate::component::{Block, Component, Stack};
    use crate::geometry::SizeRange;
    use crate::layout::compute_root_layout;
    use crate::scope::StateUpdateMap;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Recorder {
        unmounted: Vec<NodeId>,
    }

    impl MountTarget for Recorder {
        type Error = std::io::Error;

        fn mount(&mut self, layout: &RootLayout, previous: &MountedSet) -> Result<MountedSet, std::io::Error> {
            let mounted: MountedSet = layout.layout().node_ids().into_iter().collect();
            self.unmounted.extend(previous.difference(&mounted));
            Ok(mounted)
        }
    }

    struct Broken;

    impl MountTarget for Broken {
        type Error = std::io::Error;

        fn mount(&mut self, _: &RootLayout, _: &MountedSet) -> Result<MountedSet, std::io::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no window"))
        }
    }

    #[test]
    fn mount_hands_over_previous_nodes() {
        let root: Arc<dyn Component> = Arc::new(Stack::vertical(vec![Arc::new(Block::new(1., 1.))]));
        let first = build(Some(&root), None, &StateUpdateMap::new(), BuildTrigger::NewTree);
        let layout = compute_root_layout(Some(&root), SizeRange::unconstrained(), Some(&first.scope_root), None);

        let listener = RecordingListener::new();
        let mut target = Recorder::default();
        let mounted = mount_root_layout(&mut target, &layout, &MountedSet::new(), Some(&listener)).unwrap();
        assert_eq!(mounted.len(), 2);
        assert_eq!(
            listener.events(),
            vec![
                AnalyticsEvent::WillMount { root_node: first.root_node },
                AnalyticsEvent::DidMount { root_node: first.root_node, mounted: 2 },
            ]
        );

        let empty = compute_root_layout(None, SizeRange::unconstrained(), None, None);
        let mounted = mount_root_layout(&mut target, &empty, &mounted, None).unwrap();
        assert!(mounted.is_empty());
        assert_eq!(target.unmounted.len(), 2);
    }

    #[test]
    fn target_errors_are_wrapped() {
        let empty = compute_root_layout(None, SizeRange::unconstrained(), None, None);
        let err = mount_root_layout(&mut Broken, &empty, &MountedSet::new(), None).unwrap_err();
        assert!(matches!(err, Error::Mount(_)));
        assert_eq!(err.to_string(), "mount failed: no window");
    }
}
