//! Creation validation and the construction side table.
//!
//! Build and layout push a frame onto a thread-local stack while they run. Components can call
//! [`validate_component_creation`] or [`validate_render_component_creation`] from their
//! constructors to assert (in debug builds) that they are created in a sanctioned phase. A frame
//! entered with validation disabled silences both checks until it is popped.
//!
//! While a render component renders, its frame also records the component and its node, so
//! that code running inside `render` can find the node being built.

use crate::component::{address, Component};
use crate::id::NodeId;
use std::cell::RefCell;

/// Where a frame was pushed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Layout,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    phase: Phase,
    validate: bool,
    component: Option<(usize, NodeId)>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

/// Pops its frame when dropped.
#[must_use]
#[derive(Debug)]
pub(crate) struct FrameGuard(());

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

fn push(frame: Frame) -> FrameGuard {
    FRAMES.with(|frames| frames.borrow_mut().push(frame));
    FrameGuard(())
}

/// Enters a phase, validating creation inside it only if `validate` is true.
pub(crate) fn enter(phase: Phase, validate: bool) -> FrameGuard {
    push(Frame {
        phase,
        validate,
        component: None,
    })
}

/// Records that `component` is rendering into `node`.
pub(crate) fn enter_render(component: &dyn Component, node: NodeId) -> FrameGuard {
    push(Frame {
        phase: Phase::Build,
        validate: validating(),
        component: Some((address(component), node)),
    })
}

/// False inside a frame entered with validation disabled.
fn validating() -> bool {
    FRAMES.with(|frames| frames.borrow().last().map_or(true, |frame| frame.validate))
}

/// The innermost phase on this thread.
pub fn current_phase() -> Option<Phase> {
    FRAMES.with(|frames| frames.borrow().last().map(|frame| frame.phase))
}

/// The node of the render component currently rendering on this thread.
pub fn current_node() -> Option<NodeId> {
    FRAMES.with(|frames| {
        frames
            .borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.component.map(|(_, node)| node))
    })
}

/// The node being built for a component that is currently rendering on this thread.
pub fn node_for_component(component: &dyn Component) -> Option<NodeId> {
    let address = address(component);
    FRAMES.with(|frames| {
        frames
            .borrow()
            .iter()
            .rev()
            .filter_map(|frame| frame.component)
            .find(|(a, _)| *a == address)
            .map(|(_, node)| node)
    })
}

/// Asserts that a component is created during a build or layout.
///
/// Only checked in debug builds.
pub fn validate_component_creation(type_name: &str) {
    if cfg!(debug_assertions) && validating() {
        assert!(
            current_phase().is_some(),
            "{}: components should not be created outside of a build or layout",
            type_name
        );
    }
}

/// Asserts that a render component is created during a build.
///
/// Only checked in debug builds.
pub fn validate_render_component_creation(type_name: &str) {
    if cfg!(debug_assertions) && validating() {
        match current_phase() {
            None => panic!(
                "{}: components should not be created outside of a build or layout",
                type_name
            ),
            Some(phase) => assert!(
                phase != Phase::Layout,
                "{}: render components should not be created during layout",
                type_name
            ),
        }
    }
}
