//! Static layout data for the tiles of the stats tab.

use glam::IVec2;
use idmap_derive::IntegerId;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumCount, EnumIter, EnumString};

use crate::{
    config::{OrganizerConfig, VisibilityMode},
    host::ComponentId,
};

pub const STATS_GROUP: u16 = 320;
pub const SKILLS_CONTAINER: ComponentId = ComponentId::new(STATS_GROUP, 0);

pub const SLOT_COUNT: usize = Skill::COUNT;

pub const ROWS_PER_COLUMN: usize = 8;
pub const COLUMN_PITCH: i32 = 63;
pub const ROW_PITCH: i32 = 32;
/// Number of addressable grid cells (3 columns of 8).
pub const CELL_COUNT: usize = 24;

/// Skills in the order the host numbers the stats tab children.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntegerId,
    EnumIter,
    EnumCount,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Skill {
    Attack,
    Strength,
    Defence,
    Ranged,
    Prayer,
    Magic,
    Runecraft,
    Construction,
    Hitpoints,
    Agility,
    Herblore,
    Thieving,
    Crafting,
    Fletching,
    Slayer,
    Hunter,
    Mining,
    Smithing,
    Fishing,
    Cooking,
    Firemaking,
    Woodcutting,
    Farming,
}

impl Skill {
    pub fn slot(self) -> &'static SlotDescriptor {
        &SLOTS[self as usize]
    }
}

/// Top-left corner of a grid cell. Cells run top to bottom, then left to right.
pub const fn cell_position(cell: usize) -> IVec2 {
    IVec2::new(
        (cell / ROWS_PER_COLUMN) as i32 * COLUMN_PITCH,
        (cell % ROWS_PER_COLUMN) as i32 * ROW_PITCH,
    )
}

#[derive(Debug, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub index: usize,
    pub skill: Skill,
    pub default_position: IVec2,
}

impl SlotDescriptor {
    const fn new(index: usize, skill: Skill) -> Self {
        Self {
            index,
            skill,
            default_position: cell_position(index),
        }
    }

    pub fn target_position(&self, config: &OrganizerConfig) -> IVec2 {
        config.skill(self.skill).position.resolve()
    }

    pub fn visibility(&self, config: &OrganizerConfig) -> VisibilityMode {
        config.skill(self.skill).visibility
    }

    /// Host component of this slot's tile. Child numbers are 1-based.
    pub const fn tile_component(&self, container: ComponentId) -> ComponentId {
        ComponentId::new(container.group(), self.index as u16 + 1)
    }
}

static SLOTS: [SlotDescriptor; SLOT_COUNT] = [
    SlotDescriptor::new(0, Skill::Attack),
    SlotDescriptor::new(1, Skill::Strength),
    SlotDescriptor::new(2, Skill::Defence),
    SlotDescriptor::new(3, Skill::Ranged),
    SlotDescriptor::new(4, Skill::Prayer),
    SlotDescriptor::new(5, Skill::Magic),
    SlotDescriptor::new(6, Skill::Runecraft),
    SlotDescriptor::new(7, Skill::Construction),
    SlotDescriptor::new(8, Skill::Hitpoints),
    SlotDescriptor::new(9, Skill::Agility),
    SlotDescriptor::new(10, Skill::Herblore),
    SlotDescriptor::new(11, Skill::Thieving),
    SlotDescriptor::new(12, Skill::Crafting),
    SlotDescriptor::new(13, Skill::Fletching),
    SlotDescriptor::new(14, Skill::Slayer),
    SlotDescriptor::new(15, Skill::Hunter),
    SlotDescriptor::new(16, Skill::Mining),
    SlotDescriptor::new(17, Skill::Smithing),
    SlotDescriptor::new(18, Skill::Fishing),
    SlotDescriptor::new(19, Skill::Cooking),
    SlotDescriptor::new(20, Skill::Firemaking),
    SlotDescriptor::new(21, Skill::Woodcutting),
    SlotDescriptor::new(22, Skill::Farming),
];

pub fn lookup(index: usize) -> Option<&'static SlotDescriptor> {
    SLOTS.get(index)
}

/// Slot of a tile, derived from its 1-based child number.
pub fn lookup_component(container: ComponentId, tile: ComponentId) -> Option<&'static SlotDescriptor> {
    if tile.group() != container.group() {
        return None;
    }
    let index = (tile.child() as usize).checked_sub(1)?;
    lookup(index)
}

pub fn iter() -> impl Iterator<Item = &'static SlotDescriptor> {
    SLOTS.iter()
}
