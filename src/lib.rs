//! Rearranges the skill tiles of the stats tab and fades, darkens or hides
//! them according to the user's settings, then puts everything back.

pub mod config;
pub mod config_io;
pub mod host;
pub mod log;
pub mod organizer;
pub mod overlay;
pub mod slot;
pub mod task;

pub use config::{ConfigProvider, OrganizerConfig, SharedConfig, VisibilityMode};
pub use host::{ComponentId, WidgetHost};
pub use organizer::SkillsOrganizer;
pub use task::{Trigger, TriggerSender};
