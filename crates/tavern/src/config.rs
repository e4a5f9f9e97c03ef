//! # Game Configuration
//!
//! Loaded once at startup from TOML. Every section is optional; missing
//! sections and fields fall back to the defaults below.
//!
//! ```toml
//! seed = 42
//! settings_path = "settings.json"
//!
//! [pools.customer]
//! initial_size = 4
//! max_size = 16
//!
//! [timing]
//! idle_min = 1.0
//! idle_max = 3.0
//!
//! [[menu]]
//! name = "ale"
//! duration = 2.0
//!
//! [clips.walk]
//! length = 0.8
//! looping = true
//!
//! [[areas]]
//! x = 2.0
//! y = 0.0
//! z = 1.0
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tavern_core::PoolConfig;
use tavern_shared::Vec3;

use crate::animation::{ClipSpec, ClipTable};
use crate::error::{GameError, GameResult};

/// Default RNG seed.
pub const DEFAULT_SEED: u64 = 0x7A_7E12;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Pool policy per character role key (`customer`, `staff`, `bouncer`).
    pub pools: BTreeMap<String, PoolSection>,
    /// Behavior timings.
    pub timing: TimingConfig,
    /// Orders customers may place.
    pub menu: Vec<MenuItem>,
    /// Clip lengths for the built-in clip player.
    pub clips: ClipTable,
    /// Placement slots customers can occupy.
    pub areas: Vec<Vec3>,
    /// Location of the persisted settings blob. `None` keeps settings in memory.
    pub settings_path: Option<PathBuf>,
    /// Seed for idle timers and menu choice.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pools: BTreeMap::new(),
            timing: TimingConfig::default(),
            menu: vec![
                MenuItem::new("ale", 2.0),
                MenuItem::new("pie", 3.0),
                MenuItem::new("stew", 4.0),
            ],
            clips: ClipTable::default(),
            areas: vec![
                Vec3::new(2.0, 0.0, 1.0),
                Vec3::new(4.0, 0.0, 1.0),
                Vec3::new(6.0, 0.0, 1.0),
                Vec3::new(8.0, 0.0, 1.0),
            ],
            settings_path: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl GameConfig {
    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] if the text is not valid TOML or a field
    /// has the wrong type.
    pub fn from_toml_str(text: &str) -> GameResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Io`] if the file cannot be read, or
    /// [`GameError::Config`] if it does not parse.
    pub fn load(path: &Path) -> GameResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Pool policy for a role key; unlisted roles get the default section.
    #[must_use]
    pub fn pool(&self, key: &str) -> PoolConfig {
        self.pools.get(key).copied().unwrap_or_default().into()
    }

    /// Length and looping of a named clip, if configured.
    #[must_use]
    pub fn clip(&self, name: &str) -> Option<ClipSpec> {
        self.clips.get(name)
    }
}

/// Pool sizing as written in the config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSection {
    /// Instances built at startup.
    pub initial_size: usize,
    /// Build more on demand.
    pub auto_expand: bool,
    /// Hard cap on tracked instances, `0` for none.
    pub max_size: usize,
    /// Destroy returns once the free-list is large enough.
    pub auto_shrink: bool,
    /// Free-list length that triggers shrinking.
    pub shrink_target: usize,
}

impl Default for PoolSection {
    fn default() -> Self {
        let defaults = PoolConfig { initial_size: 2, max_size: 8, ..PoolConfig::default() };
        Self {
            initial_size: defaults.initial_size,
            auto_expand: defaults.auto_expand,
            max_size: defaults.max_size,
            auto_shrink: defaults.auto_shrink,
            shrink_target: defaults.shrink_target,
        }
    }
}

impl From<PoolSection> for PoolConfig {
    fn from(section: PoolSection) -> Self {
        Self {
            initial_size: section.initial_size,
            auto_expand: section.auto_expand,
            max_size: section.max_size,
            auto_shrink: section.auto_shrink,
            shrink_target: section.shrink_target,
        }
    }
}

/// Behavior timings, in seconds unless noted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Shortest idle pause.
    pub idle_min: f32,
    /// Longest idle pause.
    pub idle_max: f32,
    /// How long a customer waits for an order before giving up.
    pub customer_patience: f32,
    /// Walking speed in units per second.
    pub move_speed: f32,
    /// Hit points removed by one attack.
    pub attack_damage: u32,
    /// Hit points of a freshly spawned character.
    pub hit_points: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            idle_min: 1.0,
            idle_max: 3.0,
            customer_patience: 20.0,
            move_speed: 2.0,
            attack_damage: 10,
            hit_points: 30,
        }
    }
}

/// One orderable dish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Display name.
    pub name: String,
    /// Preparation time.
    pub duration: f32,
}

impl MenuItem {
    /// Creates a menu entry.
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self { name: name.into(), duration }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_default() {
        let config = GameConfig::from_toml_str("").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_parse_sections() {
        let config = GameConfig::from_toml_str(
            r#"
seed = 7
settings_path = "tavern-settings.json"

[pools.customer]
initial_size = 3
max_size = 5
auto_shrink = true
shrink_target = 2

[timing]
idle_min = 0.5
customer_patience = 9.0

[[menu]]
name = "mead"
duration = 1.5

[clips.walk]
length = 0.25
looping = true

[[areas]]
x = 1.0
y = 0.0
z = -1.0
"#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.settings_path, Some(PathBuf::from("tavern-settings.json")));
        let pool = config.pool("customer");
        assert_eq!(pool.initial_size, 3);
        assert_eq!(pool.max_size, 5);
        assert!(pool.auto_expand);
        assert!(pool.auto_shrink);
        assert_eq!(pool.shrink_target, 2);
        assert_eq!(config.timing.idle_min, 0.5);
        assert_eq!(config.timing.idle_max, TimingConfig::default().idle_max);
        assert_eq!(config.timing.customer_patience, 9.0);
        assert_eq!(config.menu, vec![MenuItem::new("mead", 1.5)]);
        assert_eq!(config.clip("walk"), Some(ClipSpec { length: 0.25, looping: true }));
        assert_eq!(config.areas, vec![Vec3::new(1.0, 0.0, -1.0)]);
    }

    #[test]
    fn test_unlisted_pool_uses_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.pool("bouncer"), PoolSection::default().into());
    }

    #[test]
    fn test_bad_field_type_is_config_error() {
        let err = GameConfig::from_toml_str("seed = \"many\"").unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("tavern_config_missing_7a1f.toml");
        let err = GameConfig::load(&path).unwrap_err();
        assert!(matches!(err, GameError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("tavern_config_{}.toml", std::process::id()));
        std::fs::write(&path, "seed = 99\n").unwrap();
        let config = GameConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.seed, 99);
    }
}
