// crates/engine_core/src/config.rs
//! Engine configuration, stored as TOML.
//!
//! ```toml
//! [resource]
//! watch_list = ["Texture"]
//!
//! [resource.groups]
//! Texture = ["assets/gfx", "assets/shared"]
//!
//! [input]
//! set_list = ["Game", "Menu"]
//!
//! [input.sets.Game.inputs]
//! Jump = ["KEY_SPACE", "JOY_1_1"]
//! Dash = ["KEY_LSHIFT", "KEY_D"]
//!
//! [input.sets.Game]
//! combine_list = ["Dash"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub resource: ResourceConfig,
    #[serde(default)]
    pub input: InputConfig,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceConfig {
    /// Groups whose cached resources are checked for modification.
    #[serde(default)]
    pub watch_list: Vec<String>,
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
    /// Group name -> storages, in lookup order.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

fn default_watch_interval_ms() -> u64 {
    1000
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
            watch_list: Vec::new(),
            watch_interval_ms: default_watch_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Sets to create on load; the first one gets selected.
    #[serde(default)]
    pub set_list: Vec<String>,
    /// Minimum absolute joystick axis value counted as active.
    #[serde(default = "default_joystick_threshold")]
    pub joystick_threshold: f32,
    #[serde(default)]
    pub sets: BTreeMap<String, InputSetConfig>,
}

fn default_joystick_threshold() -> f32 {
    0.1
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            set_list: Vec::new(),
            joystick_threshold: default_joystick_threshold(),
            sets: BTreeMap::new(),
        }
    }
}

impl InputConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputSetConfig {
    /// Inputs that need all their bindings active at once.
    #[serde(default)]
    pub combine_list: Vec<String>,
    /// Input name -> binding names.
    #[serde(default)]
    pub inputs: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[resource]
watch_list = ["Texture"]

[resource.groups]
Texture = ["assets/gfx", "assets/shared"]

[input]
set_list = ["Game"]

[input.sets.Game]
combine_list = ["Dash"]

[input.sets.Game.inputs]
Jump = ["KEY_SPACE", "JOY_1_1"]
Dash = ["KEY_LSHIFT", "KEY_D"]
"#;

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(
            config.resource.groups["Texture"],
            vec!["assets/gfx".to_string(), "assets/shared".to_string()]
        );
        assert_eq!(config.resource.watch_interval_ms, 1000);
        assert_eq!(config.input.set_list, vec!["Game".to_string()]);
        assert_eq!(config.input.sets["Game"].combine_list, vec!["Dash".to_string()]);
        assert_eq!(config.input.sets["Game"].inputs["Jump"].len(), 2);
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!((config.input.joystick_threshold - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn survives_a_write_and_reload() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_malformed_documents() {
        let err = EngineConfig::from_toml_str("[resource\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
