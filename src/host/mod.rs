pub mod tree;

use std::fmt::Debug;

use glam::IVec2;
use thiserror::Error;

/// Packed identifier of a host component: interface group in the high
/// 16 bits, child number in the low 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    pub const fn new(group: u16, child: u16) -> Self {
        Self(((group as u32) << 16) | child as u32)
    }

    pub const fn group(self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub const fn child(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group(), self.child())
    }
}

/// How a coordinate is interpreted relative to the parent.
/// `AbsoluteStart` means left on the X axis and top on the Y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionMode {
    #[default]
    AbsoluteStart,
    AbsoluteCenter,
    AbsoluteEnd,
    Proportional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeMode {
    #[default]
    Absolute,
    /// Parent size minus the given value.
    Minus,
    Proportional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Layer,
    Graphic,
    Rectangle,
    Text,
}

pub type SpriteId = u32;
pub type Rgb = u32;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("widget {0} no longer exists")]
    StaleWidget(String),
    #[error("widget {0} is not a layer and cannot hold children")]
    NotALayer(String),
    #[error("widget {0} cannot hold more than {1} dynamic children")]
    ChildLimit(String, usize),
}

/// The query and mutation surface of the host UI.
///
/// Handles are opaque and may go stale whenever the host rebuilds an
/// interface. Setters on a stale handle are ignored; only the calls that
/// hand back new handles report failure.
pub trait WidgetHost {
    type Id: Copy + Eq + Debug;

    fn is_logged_in(&self) -> bool;

    fn get_widget(&self, component: ComponentId) -> Option<Self::Id>;
    fn component_id(&self, widget: Self::Id) -> Option<ComponentId>;
    fn parent(&self, widget: Self::Id) -> Option<Self::Id>;

    /// Children declared by the interface definition, in child-number order.
    fn static_children(&self, widget: Self::Id) -> Vec<Self::Id>;
    /// Children created at runtime through [`WidgetHost::create_child`].
    fn dynamic_children(&self, widget: Self::Id) -> Vec<Self::Id>;

    fn set_position(&mut self, widget: Self::Id, pos: IVec2, mode_x: PositionMode, mode_y: PositionMode);
    fn set_size(&mut self, widget: Self::Id, size: IVec2, mode_w: SizeMode, mode_h: SizeMode);
    fn set_hidden(&mut self, widget: Self::Id, hidden: bool);
    fn set_opacity(&mut self, widget: Self::Id, opacity: u8);
    fn set_sprite(&mut self, widget: Self::Id, sprite: SpriteId);
    fn set_fill(&mut self, widget: Self::Id, color: Rgb, filled: bool);
    fn revalidate(&mut self, widget: Self::Id);

    fn create_child(&mut self, parent: Self::Id, kind: WidgetKind) -> Result<Self::Id, HostError>;
    /// Detaches and destroys a dynamic child. Returns false if `child` was
    /// not a dynamic child of `parent`.
    fn remove_child(&mut self, parent: Self::Id, child: Self::Id) -> bool;
}
