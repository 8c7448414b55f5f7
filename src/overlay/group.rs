use glam::{ivec2, IVec2};

use crate::host::{HostError, PositionMode, Rgb, SizeMode, SpriteId, WidgetHost, WidgetKind};

pub const LEFT_SPRITE: SpriteId = 174;
pub const RIGHT_SPRITE: SpriteId = 176;
pub const ICON_SIZE: IVec2 = IVec2::splat(36);
pub const LEFT_OFFSET: IVec2 = IVec2::new(-2, -2);
pub const RIGHT_OFFSET: IVec2 = IVec2::new(28, -2);

/// Subtracted from the tile size on both axes.
pub const DARKEN_MARGIN: IVec2 = IVec2::ZERO;
pub const DARKEN_COLOR: Rgb = 0x00_00_00;

pub const OVERLAY_OPACITY: u8 = 90;

/// Hidden flags for a tile and its three overlay elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenFlags {
    pub tile: bool,
    pub left: bool,
    pub right: bool,
    pub darken: bool,
}

/// The overlay elements created under one tile.
/// The tile belongs to the host, these three belong to the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetGroup<Id> {
    pub left: Id,
    pub right: Id,
    pub darken: Id,
}

impl<Id: Copy + Eq> WidgetGroup<Id> {
    /// Creates the three elements hidden under `tile`. On failure, whatever
    /// was already created is removed again.
    pub fn build<H>(host: &mut H, tile: Id) -> Result<Self, HostError>
    where
        H: WidgetHost<Id = Id>,
    {
        let left = create_icon(host, tile, LEFT_SPRITE, LEFT_OFFSET)?;

        let right = match create_icon(host, tile, RIGHT_SPRITE, RIGHT_OFFSET) {
            Ok(right) => right,
            Err(e) => {
                host.remove_child(tile, left);
                return Err(e);
            }
        };

        let darken = match create_darken(host, tile) {
            Ok(darken) => darken,
            Err(e) => {
                host.remove_child(tile, left);
                host.remove_child(tile, right);
                return Err(e);
            }
        };

        Ok(Self { left, right, darken })
    }

    pub fn elements(&self) -> [Id; 3] {
        [self.left, self.right, self.darken]
    }

    /// True while every element still hangs off `tile`.
    pub fn is_attached_to<H>(&self, host: &H, tile: Id) -> bool
    where
        H: WidgetHost<Id = Id>,
    {
        self.elements().iter().all(|e| host.parent(*e) == Some(tile))
    }

    /// Removes whichever elements are still in the tree, each from its own
    /// parent. Returns how many were removed.
    pub fn destroy<H>(&self, host: &mut H) -> usize
    where
        H: WidgetHost<Id = Id>,
    {
        let mut removed = 0;
        for element in self.elements() {
            if let Some(parent) = host.parent(element) {
                if host.remove_child(parent, element) {
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn apply<H>(&self, host: &mut H, flags: HiddenFlags)
    where
        H: WidgetHost<Id = Id>,
    {
        host.set_hidden(self.left, flags.left);
        host.set_hidden(self.right, flags.right);
        host.set_hidden(self.darken, flags.darken);
    }
}

fn create_icon<H: WidgetHost>(
    host: &mut H,
    tile: H::Id,
    sprite: SpriteId,
    offset: IVec2,
) -> Result<H::Id, HostError> {
    let icon = host.create_child(tile, WidgetKind::Graphic)?;
    host.set_sprite(icon, sprite);
    host.set_size(icon, ICON_SIZE, SizeMode::Absolute, SizeMode::Absolute);
    host.set_position(icon, offset, PositionMode::AbsoluteStart, PositionMode::AbsoluteStart);
    host.set_opacity(icon, OVERLAY_OPACITY);
    host.set_hidden(icon, true);
    host.revalidate(icon);
    Ok(icon)
}

fn create_darken<H: WidgetHost>(host: &mut H, tile: H::Id) -> Result<H::Id, HostError> {
    let darken = host.create_child(tile, WidgetKind::Rectangle)?;
    host.set_position(darken, ivec2(0, 0), PositionMode::AbsoluteCenter, PositionMode::AbsoluteCenter);
    host.set_size(darken, DARKEN_MARGIN, SizeMode::Minus, SizeMode::Minus);
    host.set_fill(darken, DARKEN_COLOR, true);
    host.set_opacity(darken, OVERLAY_OPACITY);
    host.set_hidden(darken, true);
    host.revalidate(darken);
    Ok(darken)
}
