use std::{collections::BTreeMap, path::Path, str::FromStr, sync::Arc};

use anyhow::Context;
use config::{Config, File, FileFormat};
use glam::{ivec2, IVec2};
use idmap::IdMap;
use log::error;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};
use thiserror::Error;

use crate::{
    config_io::{self, get_conf_d_path, CONFIG_ROOT_PATH},
    log::LogErr,
    slot::{self, Skill, CELL_COUNT},
};

/// Settings group this feature listens to. Changes in other groups are ignored.
pub const CONFIG_GROUP: &str = "skillsorganizer";

const DEFAULTS: &str = include_str!("res/skills.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VisibilityMode {
    #[default]
    Full,
    Hide,
    Fade,
    Dark,
}

/// Where a tile goes: a cell of the default grid, or explicit coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionOption {
    Cell(u8),
    Absolute { x: i32, y: i32 },
}

impl PositionOption {
    pub fn resolve(self) -> IVec2 {
        match self {
            Self::Cell(cell) => slot::cell_position(cell as usize),
            Self::Absolute { x, y } => ivec2(x, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillConfig {
    pub position: PositionOption,
    #[serde(default)]
    pub visibility: VisibilityMode,
}

impl SkillConfig {
    pub fn default_for(skill: Skill) -> Self {
        Self {
            position: PositionOption::Cell(skill as u8),
            visibility: VisibilityMode::Full,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{skill:?}: grid cell {cell} is outside the stats tab grid")]
    CellOutOfRange { skill: Skill, cell: u8 },
    #[error("unknown skill \"{0}\"")]
    UnknownSkill(String),
    #[error("skill \"{0}\" and \"{1}\" name the same skill")]
    DuplicateSkill(String, String),
}

/// Snapshot of every skill's position and visibility.
/// Skills missing from `skills` keep their default cell and stay fully visible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default = "def_skills")]
    pub skills: IdMap<Skill, SkillConfig>,
}

fn def_skills() -> IdMap<Skill, SkillConfig> {
    IdMap::new()
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self { skills: def_skills() }
    }
}

/// Settings as merged by the config layers, before skill names are checked.
/// Keys keep the spelling they were written with.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    skills: BTreeMap<String, RawSkillConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawSkillConfig {
    position: Option<PositionOption>,
    visibility: Option<VisibilityMode>,
}

impl RawSkillConfig {
    fn merge_into(self, skills: &mut IdMap<Skill, SkillConfig>, skill: Skill) {
        let mut conf = skills
            .get(skill)
            .copied()
            .unwrap_or_else(|| SkillConfig::default_for(skill));
        if let Some(position) = self.position {
            conf.position = position;
        }
        if let Some(visibility) = self.visibility {
            conf.visibility = visibility;
        }
        skills.insert(skill, conf);
    }
}

impl TryFrom<RawConfig> for OrganizerConfig {
    type Error = ConfigError;

    /// Entries spelled exactly like the built-in ones are merged first, so a
    /// differently cased user entry always overrides them. Two differently
    /// cased entries for the same skill are ambiguous and rejected.
    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let mut skills = def_skills();
        let mut respelled: Vec<(Skill, String, RawSkillConfig)> = Vec::new();

        for (name, entry) in raw.skills {
            let skill = Skill::from_str(&name).map_err(|_| ConfigError::UnknownSkill(name.clone()))?;
            if name == skill.as_ref() {
                entry.merge_into(&mut skills, skill);
            } else if let Some((_, first, _)) = respelled.iter().find(|(s, _, _)| *s == skill) {
                return Err(ConfigError::DuplicateSkill(first.clone(), name));
            } else {
                respelled.push((skill, name, entry));
            }
        }

        for (skill, name, entry) in respelled {
            log::debug!("Skill \"{name}\" read as {}", skill.as_ref());
            entry.merge_into(&mut skills, skill);
        }

        Ok(Self { skills })
    }
}

impl OrganizerConfig {
    pub fn skill(&self, skill: Skill) -> SkillConfig {
        self.skills
            .get(skill)
            .copied()
            .unwrap_or_else(|| SkillConfig::default_for(skill))
    }

    pub fn set_position(&mut self, skill: Skill, position: PositionOption) {
        let visibility = self.skill(skill).visibility;
        self.skills.insert(skill, SkillConfig { position, visibility });
    }

    pub fn set_visibility(&mut self, skill: Skill, visibility: VisibilityMode) {
        let position = self.skill(skill).position;
        self.skills.insert(skill, SkillConfig { position, visibility });
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (skill, conf) in self.skills.iter() {
            if let PositionOption::Cell(cell) = conf.position {
                if cell as usize >= CELL_COUNT {
                    return Err(ConfigError::CellOutOfRange { skill: *skill, cell });
                }
            }
        }
        Ok(())
    }

    /// Loads the user configuration plus `extra`, falling back to the
    /// built-in layout if anything on disk is unusable.
    pub fn load_from_disk(extra: Option<&Path>) -> OrganizerConfig {
        config_io::ensure_config_root();
        Self::load_or_builtin(&CONFIG_ROOT_PATH, extra)
    }

    pub fn load_or_builtin(root: &Path, extra: Option<&Path>) -> OrganizerConfig {
        Self::load_layered(root, extra)
            .log_err_with("Failed to load settings, falling back to defaults")
            .unwrap_or_else(|_| Self::builtin())
    }

    /// Layers, in order: built-in defaults, `<root>/config.yaml`,
    /// `<root>/conf.d/*.yaml` sorted by name, then `extra`.
    pub fn load_layered(root: &Path, extra: Option<&Path>) -> anyhow::Result<OrganizerConfig> {
        let mut settings_builder =
            Config::builder().add_source(File::from_str(DEFAULTS, FileFormat::Yaml));

        let base_conf = root.join("config.yaml");
        if base_conf.exists() {
            log::info!("Loading config file: {}", base_conf.to_string_lossy());
            settings_builder = settings_builder.add_source(File::from(base_conf));
        }

        let path_conf_d = get_conf_d_path(root);
        if let Ok(paths_unsorted) = std::fs::read_dir(&path_conf_d) {
            let mut paths: Vec<_> = paths_unsorted
                .filter_map(|r| match r {
                    Ok(entry) => Some(entry.path()),
                    Err(e) => {
                        error!("Failed to read conf.d directory: {}", e);
                        None
                    }
                })
                .filter(|p| p.extension().is_some_and(|ext| ext == "yaml" || ext == "yml"))
                .collect();
            // Sort paths alphabetically
            paths.sort();
            for path in paths {
                log::info!("Loading config file: {}", path.to_string_lossy());
                settings_builder = settings_builder.add_source(File::from(path));
            }
        }

        if let Some(extra) = extra {
            log::info!("Loading config file: {}", extra.to_string_lossy());
            settings_builder = settings_builder.add_source(File::from(extra));
        }

        let raw: RawConfig = settings_builder
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Failed to deserialize settings")?;
        let config = OrganizerConfig::try_from(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The layout shipped with the crate.
    pub fn builtin() -> OrganizerConfig {
        match serde_yaml::from_str::<OrganizerConfig>(DEFAULTS) {
            Ok(config) => config,
            Err(e) => {
                error!("Built-in settings are broken: {e}");
                OrganizerConfig::default()
            }
        }
    }
}

/// Source of configuration snapshots, read on demand.
pub trait ConfigProvider {
    fn config(&self) -> OrganizerConfig;
}

impl ConfigProvider for OrganizerConfig {
    fn config(&self) -> OrganizerConfig {
        self.clone()
    }
}

/// Notification that a setting changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChanged {
    pub group: String,
    pub key: String,
}

/// Configuration shared between the settings UI and the organizer.
#[derive(Clone, Default)]
pub struct SharedConfig(Arc<RwLock<OrganizerConfig>>);

impl SharedConfig {
    pub fn new(config: OrganizerConfig) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    pub fn set_position(&self, skill: Skill, position: PositionOption) -> ConfigChanged {
        self.0.write().set_position(skill, position);
        changed(skill, "position")
    }

    pub fn set_visibility(&self, skill: Skill, visibility: VisibilityMode) -> ConfigChanged {
        self.0.write().set_visibility(skill, visibility);
        changed(skill, "visibility")
    }
}

fn changed(skill: Skill, field: &str) -> ConfigChanged {
    ConfigChanged {
        group: CONFIG_GROUP.to_string(),
        key: format!("{}.{field}", skill.as_ref()),
    }
}

impl ConfigProvider for SharedConfig {
    fn config(&self) -> OrganizerConfig {
        self.0.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use strum::{EnumCount, IntoEnumIterator};

    #[test]
    fn test_builtin_matches_defaults() {
        let config = OrganizerConfig::builtin();
        assert_eq!(config.skills.len(), Skill::COUNT);
        for skill in Skill::iter() {
            assert_eq!(config.skill(skill), SkillConfig::default_for(skill));
            assert_eq!(
                config.skill(skill).position.resolve(),
                skill.slot().default_position
            );
        }
    }

    #[test]
    fn test_missing_skill_falls_back() {
        let config = OrganizerConfig::default();
        assert_eq!(config.skill(Skill::Magic), SkillConfig::default_for(Skill::Magic));
    }

    #[test]
    fn test_position_option_parsing() {
        let conf: SkillConfig = serde_yaml::from_str("position: 23\nvisibility: fade").unwrap();
        assert_eq!(conf.position, PositionOption::Cell(23));
        assert_eq!(conf.position.resolve(), ivec2(126, 224));
        assert_eq!(conf.visibility, VisibilityMode::Fade);

        let conf: SkillConfig = serde_yaml::from_str("position: { x: 10, y: -4 }").unwrap();
        assert_eq!(conf.position.resolve(), ivec2(10, -4));
        assert_eq!(conf.visibility, VisibilityMode::Full);
    }

    #[test]
    fn test_validate_rejects_out_of_grid_cell() {
        let mut config = OrganizerConfig::default();
        config.set_position(Skill::Cooking, PositionOption::Cell(24));
        assert_eq!(
            config.validate(),
            Err(ConfigError::CellOutOfRange {
                skill: Skill::Cooking,
                cell: 24
            })
        );
    }

    #[test]
    fn test_layered_overrides() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("config.yaml"),
            "skills:\n  attack:\n    position: 5\n    visibility: dark\n",
        )
        .unwrap();
        fs::create_dir(root.path().join("conf.d")).unwrap();
        fs::write(
            root.path().join("conf.d").join("10-hide.yaml"),
            "skills:\n  attack:\n    visibility: hide\n",
        )
        .unwrap();

        let config = OrganizerConfig::load_layered(root.path(), None).unwrap();
        let attack = config.skill(Skill::Attack);
        assert_eq!(attack.position, PositionOption::Cell(5));
        assert_eq!(attack.visibility, VisibilityMode::Hide);
        // untouched skills keep the built-in layout
        assert_eq!(
            config.skill(Skill::Farming),
            SkillConfig::default_for(Skill::Farming)
        );
    }

    #[test]
    fn test_layered_rejects_invalid_cell() {
        let root = tempfile::tempdir().unwrap();
        let extra = root.path().join("extra.yaml");
        fs::write(&extra, "skills:\n  prayer:\n    position: 40\n").unwrap();

        let err = OrganizerConfig::load_layered(root.path(), Some(&extra)).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_layered_rejects_unknown_skill() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("config.yaml"),
            "skills:\n  sailing:\n    position: 3\n",
        )
        .unwrap();

        let err = OrganizerConfig::load_layered(root.path(), None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownSkill("sailing".into()))
        );
    }

    #[test]
    fn test_layered_mixed_case_skill_overrides_default() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("config.yaml"),
            "skills:\n  Attack:\n    position: 5\n    visibility: hide\n  WOODCUTTING:\n    visibility: dark\n",
        )
        .unwrap();

        let config = OrganizerConfig::load_layered(root.path(), None).unwrap();
        assert_eq!(
            config.skill(Skill::Attack),
            SkillConfig {
                position: PositionOption::Cell(5),
                visibility: VisibilityMode::Hide,
            }
        );
        let woodcutting = config.skill(Skill::Woodcutting);
        assert_eq!(woodcutting.position, SkillConfig::default_for(Skill::Woodcutting).position);
        assert_eq!(woodcutting.visibility, VisibilityMode::Dark);
    }

    #[test]
    fn test_layered_rejects_same_skill_twice() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("config.yaml"),
            "skills:\n  Attack:\n    position: 5\n  ATTACK:\n    position: 6\n",
        )
        .unwrap();

        let err = OrganizerConfig::load_layered(root.path(), None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicateSkill("ATTACK".into(), "Attack".into()))
        );
    }

    #[test]
    fn test_unusable_extra_file_falls_back_to_builtin() {
        let root = tempfile::tempdir().unwrap();
        let extra = root.path().join("extra.yaml");
        fs::write(&extra, "skills:\n  attack:\n    position: [not, a, cell]\n").unwrap();

        let config = OrganizerConfig::load_or_builtin(root.path(), Some(&extra));
        assert_eq!(config.skill(Skill::Attack), SkillConfig::default_for(Skill::Attack));
        assert_eq!(config.skills.len(), Skill::COUNT);
    }

    #[test]
    fn test_shared_config_reports_changes() {
        let shared = SharedConfig::default();
        let event = shared.set_visibility(Skill::Thieving, VisibilityMode::Fade);
        assert_eq!(event.group, CONFIG_GROUP);
        assert_eq!(event.key, "thieving.visibility");
        assert_eq!(
            shared.config().skill(Skill::Thieving).visibility,
            VisibilityMode::Fade
        );
    }
}
