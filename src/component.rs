use crate::dimension::ComponentSize;
use crate::geometry::{Size, SizeRange};
use crate::key::Key;
use crate::scope::{Scope, StateValue};
use cgmath::Vector2;
use core::any::Any;
use core::fmt;
use std::sync::Arc;

/// Implements [`Component`] for a render component.
///
/// Syntax:
///
/// ```text
/// impl_render! {
///     StructName;
///     fn initial_state(&self) { // optional
///         ... -> StateType
///     }
///     fn render(&self, scope, state_variable: &StateType) {
///         ... -> Arc<dyn Component>
///     }
///     (put extra items like identifier() here, using normal rust syntax)
/// }
/// ```
///
/// Stateless render components use `()` as their state type.
#[macro_export]
macro_rules! impl_render {
    (
        $(#[$attr:meta])*
        $struct:ty;
        $(fn initial_state(&$is_self:ident) $initial_state:block)?
        fn render(&$self:ident, $scope:ident, $state_var:ident: &$state_type:ty) $body:block
        $($extra:tt)*
    ) => {
        $(#[$attr])*
        impl $crate::Component for $struct {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn kind(&self) -> $crate::Kind {
                $crate::Kind::Render
            }

            $(
                fn initial_state(&$is_self) -> Option<$crate::StateValue> {
                    Some(::std::sync::Arc::new($initial_state))
                }
            )?

            fn render(
                &$self,
                $scope: &$crate::Scope<'_>,
            ) -> ::std::sync::Arc<dyn $crate::Component> {
                if let Some($state_var) = $scope.state::<$state_type>() {
                    fn _dont_complain_about_unused<T>(_: T) {}
                    _dont_complain_about_unused($state_var);
                    $body
                } else {
                    panic!(
                        "Component::render: invalid state for {}; expected type {}",
                        stringify!($struct),
                        stringify!($state_type)
                    );
                }
            }

            $($extra)*
        }
    };
}

/// How the build engine treats a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// No children; sized by [`Component::intrinsic_size`].
    Leaf,
    /// Children supplied from outside through [`Component::children`]. Never reused.
    Composite,
    /// Exactly one child computed by [`Component::render`] from props and state. Reusable.
    Render,
}

/// A layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub(crate) fn main(self, size: Size) -> f64 {
        match self {
            Axis::Horizontal => size.x,
            Axis::Vertical => size.y,
        }
    }

    pub(crate) fn cross(self, size: Size) -> f64 {
        match self {
            Axis::Horizontal => size.y,
            Axis::Vertical => size.x,
        }
    }

    pub(crate) fn pack(self, main: f64, cross: f64) -> Size {
        match self {
            Axis::Horizontal => Vector2::new(main, cross),
            Axis::Vertical => Vector2::new(cross, main),
        }
    }
}

/// How a composite places its children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arrangement {
    /// All children at the origin; the composite is as large as its largest child.
    Overlay,
    /// Children one after another along an axis.
    Stack { axis: Axis, spacing: f64 },
}

/// Components are immutable descriptions of UI. A build turns a tree of components into tree
/// nodes; a layout turns it into sizes and positions.
///
/// Components should be cheap to create and must not change after creation. Render components
/// should compute their child as a pure function of their properties and state, since a render
/// component whose path was untouched by state updates is reused without calling
/// [`render`](Component::render) again.
///
/// Render components should probably be implemented using the [`impl_render`] macro.
pub trait Component: Any + fmt::Debug + Send + Sync {
    /// For downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Which build strategy applies.
    fn kind(&self) -> Kind;

    /// The type name used in identity keys.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    /// An explicit identifier that tells siblings of the same type apart.
    fn identifier(&self) -> Option<Key> {
        None
    }

    /// Additional disambiguating keys.
    fn keys(&self) -> Vec<Key> {
        Vec::new()
    }

    /// The component’s size relative to its parent.
    fn size(&self) -> ComponentSize {
        ComponentSize::default()
    }

    /// Creates the initial state.
    ///
    /// Only called the first time a node with this identity is built; components without state
    /// return `None` and get no scope handle.
    fn initial_state(&self) -> Option<StateValue> {
        None
    }

    /// Children of a [`Kind::Composite`].
    fn children(&self) -> &[Arc<dyn Component>] {
        &[]
    }

    /// How the children of a [`Kind::Composite`] are placed.
    fn arrangement(&self) -> Arrangement {
        Arrangement::Overlay
    }

    /// Renders the single child of a [`Kind::Render`].
    fn render(&self, scope: &Scope<'_>) -> Arc<dyn Component> {
        let _ = scope;
        Arc::new(())
    }

    /// Whether this render component must be rendered again even though nothing on its path
    /// received a state update.
    ///
    /// `previous` is the component of the previous generation with the same identity.
    fn should_update(&self, previous: &dyn Component) -> bool {
        let _ = previous;
        false
    }

    /// The natural size of a [`Kind::Leaf`] within the given range.
    fn intrinsic_size(&self, range: SizeRange) -> Size {
        range.min
    }
}

/// An empty component that does absolutely nothing.
impl Component for () {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn kind(&self) -> Kind {
        Kind::Leaf
    }
}

/// A list of components laid over one another.
pub type Fragment = Vec<Arc<dyn Component>>;

impl Component for Fragment {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn kind(&self) -> Kind {
        Kind::Composite
    }
    fn children(&self) -> &[Arc<dyn Component>] {
        self
    }
}

/// A leaf with a fixed natural size.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub identifier: Option<Key>,
    pub size: ComponentSize,
    pub natural_size: Size,
}

impl Block {
    pub fn new(width: f64, height: f64) -> Block {
        Block {
            identifier: None,
            size: ComponentSize::default(),
            natural_size: Vector2::new(width, height),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<Key>) -> Block {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_size(mut self, size: ComponentSize) -> Block {
        self.size = size;
        self
    }
}

impl Component for Block {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn kind(&self) -> Kind {
        Kind::Leaf
    }
    fn identifier(&self) -> Option<Key> {
        self.identifier.clone()
    }
    fn size(&self) -> ComponentSize {
        self.size
    }
    fn intrinsic_size(&self, _: SizeRange) -> Size {
        self.natural_size
    }
}

/// A composite that stacks its children along an axis.
#[derive(Debug, Clone)]
pub struct Stack {
    pub identifier: Option<Key>,
    pub axis: Axis,
    pub spacing: f64,
    pub size: ComponentSize,
    pub children: Vec<Arc<dyn Component>>,
}

impl Stack {
    pub fn new(axis: Axis, children: Vec<Arc<dyn Component>>) -> Stack {
        Stack {
            identifier: None,
            axis,
            spacing: 0.,
            size: ComponentSize::default(),
            children,
        }
    }

    pub fn vertical(children: Vec<Arc<dyn Component>>) -> Stack {
        Stack::new(Axis::Vertical, children)
    }

    pub fn horizontal(children: Vec<Arc<dyn Component>>) -> Stack {
        Stack::new(Axis::Horizontal, children)
    }

    pub fn with_identifier(mut self, identifier: impl Into<Key>) -> Stack {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Stack {
        self.spacing = spacing;
        self
    }

    pub fn with_size(mut self, size: ComponentSize) -> Stack {
        self.size = size;
        self
    }
}

impl Component for Stack {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn kind(&self) -> Kind {
        Kind::Composite
    }
    fn identifier(&self) -> Option<Key> {
        self.identifier.clone()
    }
    fn size(&self) -> ComponentSize {
        self.size
    }
    fn children(&self) -> &[Arc<dyn Component>] {
        &self.children
    }
    fn arrangement(&self) -> Arrangement {
        Arrangement::Stack {
            axis: self.axis,
            spacing: self.spacing,
        }
    }
}

/// Address of a component, for identity comparisons and side tables.
pub(crate) fn address(component: &dyn Component) -> usize {
    component as *const dyn Component as *const () as usize
}
