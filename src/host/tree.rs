use std::{collections::HashMap, fmt::Write};

use glam::{ivec2, IVec2};
use slotmap::{new_key_type, HopSlotMap};
use smallvec::SmallVec;

use super::{ComponentId, HostError, PositionMode, Rgb, SizeMode, SpriteId, WidgetHost, WidgetKind};
use crate::slot::{self, SKILLS_CONTAINER, SLOT_COUNT};

const PROPORTIONAL_UNIT: i32 = 16384;

pub const TILE_SIZE: IVec2 = IVec2::new(62, 32);
pub const STATS_TAB_SIZE: IVec2 = IVec2::new(190, 261);

new_key_type! {
    pub struct WidgetID;
}

#[derive(Debug, Clone)]
pub struct WidgetNode {
    pub kind: WidgetKind,
    pub component: Option<ComponentId>,
    pub parent: Option<WidgetID>,
    pub static_children: Vec<WidgetID>,
    pub dynamic_children: SmallVec<[WidgetID; 4]>,
    pub child_capacity: Option<usize>,

    pub position: IVec2,
    pub position_mode: (PositionMode, PositionMode),
    pub size: IVec2,
    pub size_mode: (SizeMode, SizeMode),
    pub hidden: bool,
    pub opacity: u8,
    pub sprite: Option<SpriteId>,
    pub color: Rgb,
    pub filled: bool,

    // filled in by revalidate
    pub bounds_pos: IVec2,
    pub bounds_size: IVec2,
    pub revalidations: u32,
}

impl WidgetNode {
    fn new(kind: WidgetKind, component: Option<ComponentId>, parent: Option<WidgetID>) -> Self {
        Self {
            kind,
            component,
            parent,
            static_children: Vec::new(),
            dynamic_children: SmallVec::new(),
            child_capacity: None,
            position: IVec2::ZERO,
            position_mode: (PositionMode::AbsoluteStart, PositionMode::AbsoluteStart),
            size: IVec2::ZERO,
            size_mode: (SizeMode::Absolute, SizeMode::Absolute),
            hidden: false,
            opacity: 0,
            sprite: None,
            color: 0,
            filled: false,
            bounds_pos: IVec2::ZERO,
            bounds_size: IVec2::ZERO,
            revalidations: 0,
        }
    }
}

fn resolve_size(mode: SizeMode, value: i32, parent: i32) -> i32 {
    match mode {
        SizeMode::Absolute => value,
        SizeMode::Minus => parent - value,
        SizeMode::Proportional => parent * value / PROPORTIONAL_UNIT,
    }
}

fn resolve_position(mode: PositionMode, value: i32, size: i32, parent: i32) -> i32 {
    match mode {
        PositionMode::AbsoluteStart => value,
        PositionMode::AbsoluteCenter => (parent - size) / 2 + value,
        PositionMode::AbsoluteEnd => parent - size - value,
        PositionMode::Proportional => (parent - size) * value / PROPORTIONAL_UNIT,
    }
}

/// In-memory widget hierarchy implementing [`WidgetHost`].
pub struct WidgetTree {
    widgets: HopSlotMap<WidgetID, WidgetNode>,
    components: HashMap<ComponentId, WidgetID>,
    logged_in: bool,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self {
            widgets: HopSlotMap::with_key(),
            components: HashMap::new(),
            logged_in: false,
        }
    }

    /// A logged-in tree with the stats tab already loaded.
    pub fn with_stats_tab() -> Result<Self, HostError> {
        let mut tree = Self::new();
        tree.logged_in = true;
        tree.load_stats_tab()?;
        Ok(tree)
    }

    /// Loads the stats tab the way the host ships it: the container, one
    /// layer per skill at its default cell, and the total level tile.
    pub fn load_stats_tab(&mut self) -> Result<WidgetID, HostError> {
        let container = self.add_interface(SKILLS_CONTAINER, WidgetKind::Layer);
        self.widgets[container].size = STATS_TAB_SIZE;
        self.revalidate(container);

        for slot in slot::iter() {
            let tile = self.add_static_child(
                container,
                slot.tile_component(SKILLS_CONTAINER),
                WidgetKind::Layer,
            )?;
            self.place_tile(tile, slot.default_position);
        }

        let total_level = self.add_static_child(
            container,
            ComponentId::new(SKILLS_CONTAINER.group(), SLOT_COUNT as u16 + 1),
            WidgetKind::Layer,
        )?;
        self.place_tile(total_level, slot::cell_position(SLOT_COUNT));

        Ok(container)
    }

    fn place_tile(&mut self, tile: WidgetID, pos: IVec2) {
        let node = &mut self.widgets[tile];
        node.position = pos;
        node.size = TILE_SIZE;
        self.revalidate(tile);
    }

    pub fn add_interface(&mut self, component: ComponentId, kind: WidgetKind) -> WidgetID {
        let id = self.widgets.insert(WidgetNode::new(kind, Some(component), None));
        if let Some(old) = self.components.insert(component, id) {
            log::warn!("Interface {component} loaded twice, dropping the old one");
            self.remove_subtree(old);
            self.components.insert(component, id);
        }
        id
    }

    pub fn add_static_child(
        &mut self,
        parent: WidgetID,
        component: ComponentId,
        kind: WidgetKind,
    ) -> Result<WidgetID, HostError> {
        if !self.widgets.contains_key(parent) {
            return Err(HostError::StaleWidget(format!("{parent:?}")));
        }
        let id = self.widgets.insert(WidgetNode::new(kind, Some(component), Some(parent)));
        self.widgets[parent].static_children.push(id);
        self.components.insert(component, id);
        Ok(id)
    }

    /// Tears an interface down along with everything created under it.
    pub fn unload_interface(&mut self, component: ComponentId) -> bool {
        let Some(id) = self.components.get(&component).copied() else {
            return false;
        };
        if let Some(parent) = self.widgets.get(id).and_then(|n| n.parent) {
            if let Some(parent) = self.widgets.get_mut(parent) {
                parent.static_children.retain(|c| *c != id);
                parent.dynamic_children.retain(|c| *c != id);
            }
        }
        self.remove_subtree(id);
        true
    }

    fn remove_subtree(&mut self, id: WidgetID) {
        let Some(node) = self.widgets.remove(id) else {
            return;
        };
        if let Some(component) = node.component {
            if self.components.get(&component) == Some(&id) {
                self.components.remove(&component);
            }
        }
        for child in node.static_children.into_iter().chain(node.dynamic_children) {
            self.remove_subtree(child);
        }
    }

    pub fn set_logged_in(&mut self, logged_in: bool) {
        self.logged_in = logged_in;
    }

    pub fn set_child_capacity(&mut self, widget: WidgetID, capacity: Option<usize>) {
        if let Some(node) = self.node_mut(widget) {
            node.child_capacity = capacity;
        }
    }

    pub fn get(&self, widget: WidgetID) -> Option<&WidgetNode> {
        self.widgets.get(widget)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    fn node_mut(&mut self, widget: WidgetID) -> Option<&mut WidgetNode> {
        let node = self.widgets.get_mut(widget);
        if node.is_none() {
            log::warn!("Ignoring mutation of expired widget {widget:?}");
        }
        node
    }

    pub fn debug_print(&self) -> String {
        let mut out = String::new();
        let mut roots: Vec<_> = self
            .widgets
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, n)| (n.component, id))
            .collect();
        roots.sort_by_key(|(component, _)| *component);
        for (_, id) in roots {
            self.print_node(&mut out, id, 0);
        }
        out
    }

    fn print_node(&self, out: &mut String, id: WidgetID, depth: usize) {
        let Some(node) = self.widgets.get(id) else {
            return;
        };
        let name = node
            .component
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        let _ = write!(
            out,
            "{:indent$}{:?} {} at ({}, {}) size {}x{}",
            "",
            node.kind,
            name,
            node.bounds_pos.x,
            node.bounds_pos.y,
            node.bounds_size.x,
            node.bounds_size.y,
            indent = depth * 2,
        );
        if let Some(sprite) = node.sprite {
            let _ = write!(out, " sprite {sprite}");
        }
        if node.hidden {
            out.push_str(" [hidden]");
        }
        out.push('\n');

        for child in node.static_children.iter().chain(node.dynamic_children.iter()) {
            self.print_node(out, *child, depth + 1);
        }
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetHost for WidgetTree {
    type Id = WidgetID;

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn get_widget(&self, component: ComponentId) -> Option<WidgetID> {
        self.components.get(&component).copied()
    }

    fn component_id(&self, widget: WidgetID) -> Option<ComponentId> {
        self.widgets.get(widget)?.component
    }

    fn parent(&self, widget: WidgetID) -> Option<WidgetID> {
        self.widgets.get(widget)?.parent
    }

    fn static_children(&self, widget: WidgetID) -> Vec<WidgetID> {
        self.widgets
            .get(widget)
            .map(|n| n.static_children.clone())
            .unwrap_or_default()
    }

    fn dynamic_children(&self, widget: WidgetID) -> Vec<WidgetID> {
        self.widgets
            .get(widget)
            .map(|n| n.dynamic_children.to_vec())
            .unwrap_or_default()
    }

    fn set_position(&mut self, widget: WidgetID, pos: IVec2, mode_x: PositionMode, mode_y: PositionMode) {
        if let Some(node) = self.node_mut(widget) {
            node.position = pos;
            node.position_mode = (mode_x, mode_y);
        }
    }

    fn set_size(&mut self, widget: WidgetID, size: IVec2, mode_w: SizeMode, mode_h: SizeMode) {
        if let Some(node) = self.node_mut(widget) {
            node.size = size;
            node.size_mode = (mode_w, mode_h);
        }
    }

    fn set_hidden(&mut self, widget: WidgetID, hidden: bool) {
        if let Some(node) = self.node_mut(widget) {
            node.hidden = hidden;
        }
    }

    fn set_opacity(&mut self, widget: WidgetID, opacity: u8) {
        if let Some(node) = self.node_mut(widget) {
            node.opacity = opacity;
        }
    }

    fn set_sprite(&mut self, widget: WidgetID, sprite: SpriteId) {
        if let Some(node) = self.node_mut(widget) {
            node.sprite = Some(sprite);
        }
    }

    fn set_fill(&mut self, widget: WidgetID, color: Rgb, filled: bool) {
        if let Some(node) = self.node_mut(widget) {
            node.color = color;
            node.filled = filled;
        }
    }

    fn revalidate(&mut self, widget: WidgetID) {
        let parent_size = self
            .parent(widget)
            .and_then(|p| self.widgets.get(p))
            .map_or(IVec2::ZERO, |p| p.bounds_size);

        let Some(node) = self.node_mut(widget) else {
            return;
        };
        let size = ivec2(
            resolve_size(node.size_mode.0, node.size.x, parent_size.x),
            resolve_size(node.size_mode.1, node.size.y, parent_size.y),
        );
        node.bounds_size = size;
        node.bounds_pos = ivec2(
            resolve_position(node.position_mode.0, node.position.x, size.x, parent_size.x),
            resolve_position(node.position_mode.1, node.position.y, size.y, parent_size.y),
        );
        node.revalidations += 1;
    }

    fn create_child(&mut self, parent: WidgetID, kind: WidgetKind) -> Result<WidgetID, HostError> {
        let Some(node) = self.widgets.get(parent) else {
            return Err(HostError::StaleWidget(format!("{parent:?}")));
        };
        if node.kind != WidgetKind::Layer {
            return Err(HostError::NotALayer(format!("{parent:?}")));
        }
        if let Some(capacity) = node.child_capacity {
            if node.dynamic_children.len() >= capacity {
                return Err(HostError::ChildLimit(format!("{parent:?}"), capacity));
            }
        }

        let id = self.widgets.insert(WidgetNode::new(kind, None, Some(parent)));
        self.widgets[parent].dynamic_children.push(id);
        Ok(id)
    }

    fn remove_child(&mut self, parent: WidgetID, child: WidgetID) -> bool {
        let Some(node) = self.widgets.get_mut(parent) else {
            return false;
        };
        let Some(pos) = node.dynamic_children.iter().position(|c| *c == child) else {
            return false;
        };
        node.dynamic_children.remove(pos);
        self.remove_subtree(child);
        true
    }
}
