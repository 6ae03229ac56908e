//! Data-driven game balance
//!
//! The tuning document is a nested JSON object. Gameplay code reads it either
//! through dotted-path lookups (`"enemies.cube_walker.hp"`) or through the
//! typed views below, which are deserialized from a sub-tree once per world
//! or per spawn.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Default balance, compiled in
const DEFAULT_TUNING: &str = include_str!("../assets/tuning.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing tuning entry `{0}`")]
    Missing(String),
    #[error("tuning entry `{path}` is not {expected}")]
    WrongType { path: String, expected: &'static str },
    #[error("invalid tuning document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning entry `{path}`: {source}")]
    Section {
        path: String,
        source: serde_json::Error,
    },
}

/// Nested key-value tuning document
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    doc: Value,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::from_json(DEFAULT_TUNING).unwrap_or_else(|e| {
            log::error!("embedded tuning is invalid: {e}");
            Self::from_value(Value::Object(Map::new()))
        })
    }
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_value(serde_json::from_str(json)?))
    }

    pub fn from_value(doc: Value) -> Self {
        Self { doc }
    }

    pub fn as_value(&self) -> &Value {
        &self.doc
    }

    /// Dotted-path lookup; numeric segments index arrays
    pub fn path(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.doc, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    pub fn require(&self, path: &str) -> Result<&Value, ConfigError> {
        self.path(path)
            .ok_or_else(|| ConfigError::Missing(path.to_owned()))
    }

    pub fn f32_at(&self, path: &str) -> Result<f32, ConfigError> {
        self.require(path)?
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| wrong_type(path, "a number"))
    }

    pub fn i32_at(&self, path: &str) -> Result<i32, ConfigError> {
        self.require(path)?
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| wrong_type(path, "an integer"))
    }

    pub fn bool_at(&self, path: &str) -> Result<bool, ConfigError> {
        self.require(path)?
            .as_bool()
            .ok_or_else(|| wrong_type(path, "a bool"))
    }

    pub fn str_at(&self, path: &str) -> Result<&str, ConfigError> {
        self.require(path)?
            .as_str()
            .ok_or_else(|| wrong_type(path, "a string"))
    }

    /// `[lo, hi]` pair
    pub fn range_at(&self, path: &str) -> Result<(f32, f32), ConfigError> {
        let [lo, hi]: [f32; 2] = self.section(path)?;
        Ok((lo, hi))
    }

    pub fn strings_at(&self, path: &str) -> Result<Vec<String>, ConfigError> {
        self.section(path)
    }

    /// Deserialize the sub-tree at `path`
    pub fn section<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        T::deserialize(self.require(path)?).map_err(|source| ConfigError::Section {
            path: path.to_owned(),
            source,
        })
    }

    /// Override one entry, creating intermediate objects as needed
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let mut node = &mut self.doc;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let Value::Object(map) = node else {
                return Err(wrong_type(path, "an object path"));
            };
            if segments.peek().is_none() {
                map.insert(segment.to_owned(), value.into());
                return Ok(());
            }
            node = map
                .entry(segment.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        Err(ConfigError::Missing(path.to_owned()))
    }

    /// Builder-style [`Tuning::set`]
    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Result<Self, ConfigError> {
        self.set(path, value)?;
        Ok(self)
    }

    pub fn world(&self) -> Result<WorldTuning, ConfigError> {
        self.section("world")
    }

    pub fn base(&self) -> Result<BaseTuning, ConfigError> {
        self.section("base")
    }

    pub fn player(&self) -> Result<PlayerTuning, ConfigError> {
        self.section("player")
    }

    pub fn enemy(&self, name: &str) -> Result<EnemyTuning, ConfigError> {
        self.section(&format!("enemies.{name}"))
    }

    pub fn enemy_names(&self) -> Vec<String> {
        match self.path("enemies") {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn item(&self) -> Result<ItemTuning, ConfigError> {
        self.section("item")
    }

    pub fn generator(&self) -> Result<GeneratorTuning, ConfigError> {
        self.section("generator")
    }

    pub fn score(&self) -> Result<ScoreTuning, ConfigError> {
        self.section("score")
    }
}

fn wrong_type(path: &str, expected: &'static str) -> ConfigError {
    ConfigError::WrongType {
        path: path.to_owned(),
        expected,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldTuning {
    pub planet_radius: f32,
    /// Bounding circles are inflated by this factor for contact tests
    pub contact_scale: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BaseTuning {
    pub resource: String,
    pub radius: f32,
    pub hp: i32,
    pub entry_height: f32,
    pub entry_time: f32,
    pub leave_height: f32,
    pub leave_time: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerTuning {
    pub resource: String,
    pub radius: f32,
    pub speed: f32,
    /// Attack picks that can be queued at once
    pub sight_ready_num: i32,
    /// Seconds for a spent pick to recover
    pub sight_ready_time: f32,
    pub attack_speed: f32,
    pub attack_height: f32,
    /// Leap distance that reaches full power
    pub attack_distance: f32,
    /// Touchdown radius at zero and full power
    pub attack_range: [f32; 2],
    pub attack_stiff: f32,
    pub max_power: i32,
    pub entry_height: f32,
    pub entry_time: f32,
    pub entry_stiff: f32,
}

/// One enemy kind; ranges are rolled per spawn
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnemyTuning {
    pub resource: String,
    pub radius: [f32; 2],
    pub speed: [f32; 2],
    /// Degrees per second
    pub yaw_max: [f32; 2],
    pub hp: i32,
    pub jump_speed: [f32; 2],
    pub jump_height: f32,
    pub jump_stiff: f32,
    pub landing_stiff: f32,
    pub entry_height: f32,
    pub entry_time: f32,
    pub leave_height: f32,
    pub leave_time: f32,
    pub destroy_duration: f32,
    pub disappear_time: f32,
    pub behavior: String,
    #[serde(default)]
    pub behavior_params: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemTuning {
    pub resource: String,
    pub radius: f32,
    /// Number of item effect types
    pub kinds: usize,
    pub exist_time: f32,
    pub effect_time: f32,
    pub entry_time: f32,
    pub disappear_time: f32,
    pub obtain_height: f32,
    pub obtain_time: f32,
    /// Beyond this angle from the player the item is not pulled
    pub absorb_angle: f32,
    pub absorb_start: f32,
    pub absorb_end: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BaseEntry {
    pub entry_level: i32,
    /// Degrees from the spawn pole
    pub angle: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpawnPattern {
    /// Hold until the field is clear, then level up
    pub wait: bool,
    pub delay: f32,
    pub spawn_num: i32,
    pub once_spawn: [i32; 2],
    pub interval: [f32; 2],
    pub angle: [f32; 2],
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorTuning {
    pub level_max: i32,
    pub speed: [f32; 2],
    pub yaw: [f32; 2],
    pub jump_speed: [f32; 2],
    pub base_entry: Vec<BaseEntry>,
    pub patterns: Vec<SpawnPattern>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreTuning {
    /// An item drops for every this many destroyed enemies
    pub item_every: i32,
    pub multiplier: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_default_is_complete() {
        let tuning = Tuning::from_json(DEFAULT_TUNING).expect("embedded tuning parses");
        assert_eq!(tuning, Tuning::default());
        assert!(tuning.world().is_ok());
        assert!(tuning.base().is_ok());
        assert!(tuning.player().is_ok());
        assert!(tuning.item().is_ok());
        assert!(tuning.generator().is_ok());
        assert!(tuning.score().is_ok());
        for name in tuning.enemy_names() {
            assert!(tuning.enemy(&name).is_ok(), "enemy {name}");
        }
        assert_eq!(tuning.base().map(|b| b.hp).ok(), Some(5));
    }

    #[test]
    fn test_path_lookup() {
        let tuning = Tuning::from_value(json!({
            "a": { "b": { "c": 2.5 }, "list": [1, 2, 3] },
            "flag": true,
            "name": "x",
            "range": [1.0, 3.0],
            "names": ["p", "q"]
        }));
        assert_eq!(tuning.f32_at("a.b.c").ok(), Some(2.5));
        assert_eq!(tuning.i32_at("a.list.2").ok(), Some(3));
        assert_eq!(tuning.bool_at("flag").ok(), Some(true));
        assert_eq!(tuning.str_at("name").ok(), Some("x"));
        assert_eq!(tuning.range_at("range").ok(), Some((1.0, 3.0)));
        assert_eq!(tuning.strings_at("names").ok(), Some(vec!["p".to_owned(), "q".to_owned()]));
        assert!(tuning.path("a.list.9").is_none());
    }

    #[test]
    fn test_lookup_errors() {
        let tuning = Tuning::from_value(json!({ "a": { "b": "text" } }));
        assert!(matches!(tuning.f32_at("a.c"), Err(ConfigError::Missing(p)) if p == "a.c"));
        assert!(matches!(tuning.f32_at("a.b"), Err(ConfigError::WrongType { .. })));
        assert!(matches!(tuning.base(), Err(ConfigError::Missing(_))));
        assert!(matches!(Tuning::from_json("{"), Err(ConfigError::Parse(_))));

        let bad = Tuning::from_value(json!({ "world": { "planet_radius": "big" } }));
        let err = bad.world().err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.starts_with("tuning entry `world`"));
    }

    #[test]
    fn test_set_overrides_and_creates() {
        let mut tuning = Tuning::default();
        tuning.set("base.hp", 9).expect("set");
        assert_eq!(tuning.i32_at("base.hp").ok(), Some(9));

        let tuning = Tuning::from_value(json!({}))
            .with("new.nested.value", 1.5)
            .expect("set");
        assert_eq!(tuning.f32_at("new.nested.value").ok(), Some(1.5));

        let mut leaf = Tuning::from_value(json!({ "a": 1 }));
        assert!(leaf.set("a.b", 2).is_err());
    }
}
