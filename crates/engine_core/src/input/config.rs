// crates/engine_core/src/input/config.rs

use std::collections::BTreeMap;

use engine_shared::input_types::{binding_name, Binding, KeyboardKey};

use crate::config::{InputConfig, InputSetConfig};

/// Centralized defaults for input configuration.
/// Used by hosts whose configuration defines no input set.
pub struct InputDefaults;

impl InputDefaults {
    pub const SET: &'static str = "Default";

    /// Movement on WASD and arrows, one set, nothing combined.
    pub fn config() -> InputConfig {
        let movement = [
            ("MoveUp", KeyboardKey::W, KeyboardKey::Up),
            ("MoveDown", KeyboardKey::S, KeyboardKey::Down),
            ("MoveLeft", KeyboardKey::A, KeyboardKey::Left),
            ("MoveRight", KeyboardKey::D, KeyboardKey::Right),
        ];

        let inputs: BTreeMap<String, Vec<String>> = movement
            .iter()
            .map(|(name, main, alt)| {
                (
                    name.to_string(),
                    vec![
                        binding_name(Binding::key(*main)),
                        binding_name(Binding::key(*alt)),
                    ],
                )
            })
            .collect();

        let mut sets = BTreeMap::new();
        sets.insert(
            Self::SET.to_string(),
            InputSetConfig {
                combine_list: Vec::new(),
                inputs,
            },
        );

        InputConfig {
            set_list: vec![Self::SET.to_string()],
            sets,
            ..InputConfig::default()
        }
    }

    /// `config` itself when it defines at least one set, the defaults otherwise.
    pub fn or_default(config: &InputConfig) -> InputConfig {
        if config.sets.is_empty() && config.set_list.is_empty() {
            InputConfig {
                joystick_threshold: config.joystick_threshold,
                ..Self::config()
            }
        } else {
            config.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_wasd_and_arrows() {
        let config = InputDefaults::config();
        assert_eq!(config.set_list, vec![InputDefaults::SET.to_string()]);
        assert_eq!(
            config.sets[InputDefaults::SET].inputs["MoveUp"],
            vec!["KEY_W".to_string(), "KEY_UP".to_string()]
        );
    }

    #[test]
    fn configured_sets_win_over_defaults() {
        let mut config = InputConfig {
            joystick_threshold: 0.3,
            ..InputConfig::default()
        };
        let fallback = InputDefaults::or_default(&config);
        assert_eq!(fallback.sets.len(), 1);
        assert_eq!(fallback.joystick_threshold, 0.3);

        config.set_list.push("Menu".into());
        assert_eq!(InputDefaults::or_default(&config), config);
    }
}
