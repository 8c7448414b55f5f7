//! Applies the configured layout to the host's skill tiles and undoes it again.
//!
//! Each slot is either without overlay elements or owns exactly one
//! [`WidgetGroup`]. A group is built the first time a reconciliation touches
//! its slot and lives until [`OverlayManager::teardown`].

pub mod group;

use std::fmt::Debug;

use crate::{
    config::{OrganizerConfig, VisibilityMode},
    host::{ComponentId, HostError, PositionMode, WidgetHost},
    slot::{self, SlotDescriptor, SLOT_COUNT},
};

pub use group::{HiddenFlags, WidgetGroup};

pub const fn hidden_flags(mode: VisibilityMode) -> HiddenFlags {
    match mode {
        VisibilityMode::Full => HiddenFlags {
            tile: false,
            left: true,
            right: true,
            darken: true,
        },
        VisibilityMode::Hide => HiddenFlags {
            tile: true,
            left: true,
            right: true,
            darken: true,
        },
        VisibilityMode::Fade => HiddenFlags {
            tile: false,
            left: false,
            right: false,
            darken: true,
        },
        VisibilityMode::Dark => HiddenFlags {
            tile: false,
            left: true,
            right: true,
            darken: false,
        },
    }
}

pub struct OverlayManager<Id> {
    container: ComponentId,
    groups: [Option<WidgetGroup<Id>>; SLOT_COUNT],
}

impl<Id: Copy + Eq + Debug> OverlayManager<Id> {
    pub fn new(container: ComponentId) -> Self {
        Self {
            container,
            groups: std::array::from_fn(|_| None),
        }
    }

    pub const fn container(&self) -> ComponentId {
        self.container
    }

    pub fn group(&self, index: usize) -> Option<&WidgetGroup<Id>> {
        self.groups.get(index)?.as_ref()
    }

    pub fn live_groups(&self) -> usize {
        self.groups.iter().flatten().count()
    }

    fn slot_of<H>(&self, host: &H, tile: Id) -> Option<&'static SlotDescriptor>
    where
        H: WidgetHost<Id = Id>,
    {
        slot::lookup_component(self.container, host.component_id(tile)?)
    }

    /// Brings every present tile in line with `config`. Does nothing while
    /// the container is not loaded; safe to call on every trigger.
    pub fn reconcile<H>(&mut self, host: &mut H, config: &OrganizerConfig)
    where
        H: WidgetHost<Id = Id>,
    {
        let Some(container) = host.get_widget(self.container) else {
            log::trace!("Container {} not loaded, nothing to reconcile", self.container);
            return;
        };

        for tile in host.static_children(container) {
            let Some(slot) = self.slot_of(host, tile) else {
                log::debug!("Skipping unknown tile {:?}", host.component_id(tile));
                continue;
            };

            let target = slot.target_position(config);
            host.set_position(tile, target, PositionMode::AbsoluteStart, PositionMode::AbsoluteStart);
            host.revalidate(tile);

            let flags = hidden_flags(slot.visibility(config));
            host.set_hidden(tile, flags.tile);

            match self.ensure_group(host, slot.index, tile) {
                Ok(group) => group.apply(host, flags),
                Err(e) => log::warn!("No overlay for {:?}: {e:?}", slot.skill),
            }
        }
    }

    fn ensure_group<H>(&mut self, host: &mut H, index: usize, tile: Id) -> Result<WidgetGroup<Id>, HostError>
    where
        H: WidgetHost<Id = Id>,
    {
        match self.groups[index] {
            Some(group) if group.is_attached_to(host, tile) => Ok(group),
            Some(old) => {
                // the host rebuilt the tile or dropped part of the group
                let leftovers = old.destroy(host);
                log::debug!("Overlay of slot {index} is incomplete, removed {leftovers} leftovers, rebuilding");
                self.groups[index] = None;
                self.build_group(host, index, tile)
            }
            None => self.build_group(host, index, tile),
        }
    }

    fn build_group<H>(&mut self, host: &mut H, index: usize, tile: Id) -> Result<WidgetGroup<Id>, HostError>
    where
        H: WidgetHost<Id = Id>,
    {
        debug_assert!(self.groups[index].is_none());

        let group = WidgetGroup::build(host, tile)?;
        self.groups[index] = Some(group);
        log::debug!("Built overlay for slot {index}");
        Ok(group)
    }

    /// Restores the default layout and removes every element this manager
    /// created. Afterwards the manager is back in its initial state.
    pub fn teardown<H>(&mut self, host: &mut H)
    where
        H: WidgetHost<Id = Id>,
    {
        for slot in slot::iter() {
            let Some(tile) = host.get_widget(slot.tile_component(self.container)) else {
                continue;
            };
            host.set_position(
                tile,
                slot.default_position,
                PositionMode::AbsoluteStart,
                PositionMode::AbsoluteStart,
            );
            host.revalidate(tile);
            host.set_hidden(tile, false);
        }

        for (index, group) in self.groups.iter().enumerate() {
            let Some(group) = group else {
                continue;
            };
            if group.destroy(host) == 0 {
                log::debug!("Overlay of slot {index} is already gone");
            }
        }

        self.groups = std::array::from_fn(|_| None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PositionOption,
        host::tree::{WidgetID, WidgetTree},
        slot::{Skill, SKILLS_CONTAINER},
    };
    use glam::{ivec2, IVec2};
    use strum::IntoEnumIterator;

    fn setup() -> (WidgetTree, OverlayManager<WidgetID>) {
        (
            WidgetTree::with_stats_tab().unwrap(),
            OverlayManager::new(SKILLS_CONTAINER),
        )
    }

    fn tile(tree: &WidgetTree, skill: Skill) -> WidgetID {
        tree.get_widget(skill.slot().tile_component(SKILLS_CONTAINER))
            .unwrap()
    }

    fn flags_of(tree: &WidgetTree, tile: WidgetID, group: &WidgetGroup<WidgetID>) -> HiddenFlags {
        HiddenFlags {
            tile: tree.get(tile).unwrap().hidden,
            left: tree.get(group.left).unwrap().hidden,
            right: tree.get(group.right).unwrap().hidden,
            darken: tree.get(group.darken).unwrap().hidden,
        }
    }

    #[test]
    fn test_reconcile_without_container_is_noop() {
        let mut tree = WidgetTree::new();
        let mut manager = OverlayManager::<WidgetID>::new(SKILLS_CONTAINER);

        manager.reconcile(&mut tree, &OrganizerConfig::default());
        assert_eq!(manager.live_groups(), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_lazy_construction_and_idempotence() {
        let (mut tree, mut manager) = setup();
        let mut config = OrganizerConfig::default();
        config.set_visibility(Skill::Magic, VisibilityMode::Fade);

        assert!(manager.group(Skill::Magic as usize).is_none());

        manager.reconcile(&mut tree, &config);
        let first = *manager.group(Skill::Magic as usize).unwrap();
        let widgets = tree.len();
        let snapshot = tree.debug_print();

        manager.reconcile(&mut tree, &config);
        assert_eq!(manager.group(Skill::Magic as usize), Some(&first));
        assert_eq!(manager.live_groups(), SLOT_COUNT);
        assert_eq!(tree.len(), widgets);
        assert_eq!(tree.debug_print(), snapshot);
        assert_eq!(tree.dynamic_children(tile(&tree, Skill::Magic)).len(), 3);
    }

    #[test]
    fn test_visibility_table_has_no_stale_flags() {
        let (mut tree, mut manager) = setup();
        let mut config = OrganizerConfig::default();
        let tile = tile(&tree, Skill::Herblore);

        for from in VisibilityMode::iter() {
            for to in VisibilityMode::iter() {
                config.set_visibility(Skill::Herblore, from);
                manager.reconcile(&mut tree, &config);
                config.set_visibility(Skill::Herblore, to);
                manager.reconcile(&mut tree, &config);

                let group = *manager.group(Skill::Herblore as usize).unwrap();
                assert_eq!(flags_of(&tree, tile, &group), hidden_flags(to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn test_reconcile_moves_tiles() {
        let (mut tree, mut manager) = setup();
        let mut config = OrganizerConfig::default();
        config.set_position(Skill::Attack, PositionOption::Cell(23));
        config.set_position(Skill::Farming, PositionOption::Absolute { x: 0, y: 0 });

        manager.reconcile(&mut tree, &config);

        let attack = tree.get(tile(&tree, Skill::Attack)).unwrap();
        assert_eq!(attack.bounds_pos, ivec2(126, 224));
        assert_eq!(
            attack.position_mode,
            (PositionMode::AbsoluteStart, PositionMode::AbsoluteStart)
        );
        let farming = tree.get(tile(&tree, Skill::Farming)).unwrap();
        assert_eq!(farming.bounds_pos, IVec2::ZERO);
    }

    #[test]
    fn test_unknown_child_untouched() {
        let (mut tree, mut manager) = setup();
        let container = tree.get_widget(SKILLS_CONTAINER).unwrap();
        let total = *tree.static_children(container).last().unwrap();
        let before = tree.get(total).unwrap().clone();

        let mut config = OrganizerConfig::default();
        for skill in Skill::iter() {
            config.set_visibility(skill, VisibilityMode::Hide);
        }
        manager.reconcile(&mut tree, &config);

        let after = tree.get(total).unwrap();
        assert_eq!(after.revalidations, before.revalidations);
        assert_eq!(after.hidden, before.hidden);
        assert_eq!(after.position, before.position);
        assert!(after.dynamic_children.is_empty());
    }

    #[test]
    fn test_round_trip_restores_defaults() {
        let (mut tree, mut manager) = setup();
        let pristine = tree.debug_print();
        let widgets = tree.len();

        let mut config = OrganizerConfig::default();
        for (i, skill) in Skill::iter().enumerate() {
            config.set_position(skill, PositionOption::Cell((22 - i) as u8));
            config.set_visibility(skill, VisibilityMode::iter().nth(i % 4).unwrap());
        }
        manager.reconcile(&mut tree, &config);
        assert_eq!(tree.len(), widgets + 3 * SLOT_COUNT);

        manager.teardown(&mut tree);
        assert_eq!(manager.live_groups(), 0);
        assert_eq!(tree.len(), widgets);
        assert_eq!(tree.debug_print(), pristine);
        for skill in Skill::iter() {
            let node = tree.get(tile(&tree, skill)).unwrap();
            assert_eq!(node.bounds_pos, skill.slot().default_position);
            assert!(!node.hidden);
            assert!(node.dynamic_children.is_empty());
        }
    }

    #[test]
    fn test_teardown_keeps_host_children() {
        let (mut tree, mut manager) = setup();
        let tile = tile(&tree, Skill::Slayer);
        let native = tree
            .create_child(tile, crate::host::WidgetKind::Text)
            .unwrap();

        manager.reconcile(&mut tree, &OrganizerConfig::default());
        assert_eq!(tree.dynamic_children(tile).len(), 4);

        manager.teardown(&mut tree);
        assert_eq!(tree.dynamic_children(tile), vec![native]);
    }

    #[test]
    fn test_teardown_is_safe_in_any_state() {
        let (mut tree, mut manager) = setup();

        // never reconciled
        manager.teardown(&mut tree);
        assert_eq!(manager.live_groups(), 0);

        // container unloaded after reconciling
        manager.reconcile(&mut tree, &OrganizerConfig::default());
        tree.unload_interface(SKILLS_CONTAINER);
        manager.teardown(&mut tree);
        assert_eq!(manager.live_groups(), 0);

        // twice in a row
        manager.teardown(&mut tree);
        assert_eq!(manager.live_groups(), 0);
    }

    #[test]
    fn test_reloaded_tab_gets_fresh_overlays() {
        let (mut tree, mut manager) = setup();
        let mut config = OrganizerConfig::default();
        config.set_visibility(Skill::Mining, VisibilityMode::Dark);
        manager.reconcile(&mut tree, &config);
        let old = *manager.group(Skill::Mining as usize).unwrap();

        tree.unload_interface(SKILLS_CONTAINER);
        tree.load_stats_tab().unwrap();
        manager.reconcile(&mut tree, &config);

        let tile = tile(&tree, Skill::Mining);
        let group = *manager.group(Skill::Mining as usize).unwrap();
        assert_ne!(group, old);
        assert_eq!(tree.dynamic_children(tile).len(), 3);
        assert_eq!(flags_of(&tree, tile, &group), hidden_flags(VisibilityMode::Dark));
    }

    #[test]
    fn test_partial_group_is_replaced_without_leftovers() {
        let (mut tree, mut manager) = setup();
        let mut config = OrganizerConfig::default();
        config.set_visibility(Skill::Magic, VisibilityMode::Fade);
        manager.reconcile(&mut tree, &config);

        let tile = tile(&tree, Skill::Magic);
        let old = *manager.group(Skill::Magic as usize).unwrap();
        assert!(tree.remove_child(tile, old.darken));

        manager.reconcile(&mut tree, &config);
        let group = *manager.group(Skill::Magic as usize).unwrap();
        assert_ne!(group, old);
        assert_eq!(tree.dynamic_children(tile).len(), 3);
        assert!(tree.get(old.left).is_none());
        assert!(tree.get(old.right).is_none());
        assert_eq!(flags_of(&tree, tile, &group), hidden_flags(VisibilityMode::Fade));

        manager.teardown(&mut tree);
        assert!(tree.dynamic_children(tile).is_empty());
    }

    #[test]
    fn test_teardown_removes_group_missing_left_icon() {
        let (mut tree, mut manager) = setup();
        manager.reconcile(&mut tree, &OrganizerConfig::default());

        let tile = tile(&tree, Skill::Cooking);
        let group = *manager.group(Skill::Cooking as usize).unwrap();
        assert!(tree.remove_child(tile, group.left));

        manager.teardown(&mut tree);
        assert!(tree.dynamic_children(tile).is_empty());
        assert!(tree.get(group.darken).is_none());
    }

    #[test]
    fn test_failed_group_still_hides_tile() {
        let (mut tree, mut manager) = setup();
        let tile = tile(&tree, Skill::Agility);
        tree.set_child_capacity(tile, Some(0));

        let mut config = OrganizerConfig::default();
        config.set_visibility(Skill::Agility, VisibilityMode::Hide);
        manager.reconcile(&mut tree, &config);

        assert!(tree.get(tile).unwrap().hidden);
        assert!(manager.group(Skill::Agility as usize).is_none());
        assert_eq!(manager.live_groups(), SLOT_COUNT - 1);
    }
}
