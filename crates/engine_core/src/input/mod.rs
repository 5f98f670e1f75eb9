// crates/engine_core/src/input/mod.rs
//! Named inputs driven by device bindings.
//!
//! Inputs live in sets. One set is current: queries and binding changes
//! address it. Other sets can be enabled so that they keep updating in the
//! background (e.g. a debug console set next to the game set).

pub mod config;
pub mod device;
pub mod poller;
mod set;

use std::fs;
use std::path::Path;

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use engine_shared::input_types::{
    parse_binding, Binding, BindingId, InputEvent, InputEventKind, InputEventPayload, InputType,
    JoystickAxis, KeyboardKey, MouseAxis, MouseButton, BINDING_NUMBER, JOYSTICK_BUTTON_NUMBER,
    JOYSTICK_NUMBER,
};

use crate::config::{InputConfig, InputSetConfig};
use crate::engine::ModuleId;
use crate::error::{ConfigError, InputError, InputResult, ResourceError};
use crate::events::EventBus;
use crate::resource::ResourceManager;

pub use config::InputDefaults;
pub use device::{is_binding_active, DeviceSnapshot, DeviceState};
pub use engine_shared::input_types::binding_name;
pub use poller::InputPoller;

use set::{InputEntry, InputSet};

/// Modules the input system relies on.
pub fn setup() -> &'static [ModuleId] {
    &[ModuleId::Config, ModuleId::Event, ModuleId::Resource]
}

/// Type and id named by a binding name such as `KEY_SPACE` or `JOY_LX_1`.
pub fn binding_type(name: &str) -> Option<(InputType, BindingId)> {
    parse_binding(name).map(|binding| (binding.ty, binding.id))
}

pub struct InputSystem {
    sets: Vec<InputSet>,
    current: Option<usize>,
    joystick_threshold: f32,
    events: EventBus<InputEvent>,
}

impl InputSystem {
    /// Creates the system and loads `config` into it.
    pub fn init(config: &InputConfig) -> InputResult<Self> {
        let mut system = Self {
            sets: Vec::new(),
            current: None,
            joystick_threshold: 0.0,
            events: EventBus::new(),
        };
        system.load(config)?;
        Ok(system)
    }

    pub fn exit(self) {
        debug!(sets = self.sets.len(), "input system exiting");
    }

    pub fn subscribe(&mut self) -> Receiver<InputEvent> {
        self.events.subscribe()
    }

    pub fn joystick_threshold(&self) -> f32 {
        self.joystick_threshold
    }

    /// Axes count as active beyond `|threshold|`.
    pub fn set_joystick_threshold(&mut self, threshold: f32) {
        self.joystick_threshold = threshold.abs();
    }

    // ------------------------------------------------------------------
    // Load / save
    // ------------------------------------------------------------------

    /// Merges `config` into the existing sets and selects the first set of
    /// its `set_list`. Unknown binding names are skipped. Nothing is applied
    /// if a set or input name is empty.
    pub fn load(&mut self, config: &InputConfig) -> InputResult<()> {
        validate(config)?;
        self.set_joystick_threshold(config.joystick_threshold);

        for name in &config.set_list {
            self.set_or_create(name)?;
        }

        for (set_name, set_config) in &config.sets {
            let index = self.set_or_create(set_name)?;
            let set = &mut self.sets[index];

            for (input_name, bindings) in &set_config.inputs {
                let entry = set.input_or_create(input_name);
                for name in bindings {
                    match parse_binding(name) {
                        Some(binding) => {
                            entry.bind(binding);
                        }
                        None => warn!(
                            "Input <{set_name}.{input_name}>: unknown binding <{name}>, skipped."
                        ),
                    }
                }
            }

            for input_name in &set_config.combine_list {
                set.input_or_create(input_name).combine = true;
            }
        }

        if let Some(first) = config.set_list.first() {
            self.select_set(first)?;
        }

        info!(sets = self.sets.len(), "input config loaded");
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> InputResult<()> {
        let content = fs::read_to_string(path).map_err(ConfigError::from)?;
        self.load(&InputConfig::from_toml_str(&content)?)
    }

    /// Loads an input config found through the resource manager.
    pub fn load_resource(
        &mut self,
        resources: &mut ResourceManager,
        group: &str,
        name: &str,
    ) -> InputResult<()> {
        let location = resources
            .locate(group, name)
            .ok_or_else(|| ResourceError::NotFound {
                group: group.to_string(),
                name: name.to_string(),
            })?;

        let bytes = resources.read_all(&location)?;
        let content = String::from_utf8(bytes).map_err(|_| ConfigError::Encoding)?;
        self.load(&InputConfig::from_toml_str(&content)?)
    }

    /// Current state of every set as config. The current set comes first in
    /// `set_list` so that loading it back selects the same set.
    pub fn to_config(&self) -> InputConfig {
        let mut config = InputConfig {
            joystick_threshold: self.joystick_threshold,
            ..InputConfig::default()
        };

        if let Some(current) = self.current {
            config.set_list.push(self.sets[current].name.clone());
        }

        for (index, set) in self.sets.iter().enumerate() {
            if Some(index) != self.current {
                config.set_list.push(set.name.clone());
            }

            let mut set_config = InputSetConfig::default();
            for entry in &set.inputs {
                let names = entry
                    .bindings
                    .iter()
                    .filter(|b| b.is_valid() && b.ty != InputType::External)
                    .map(|b| binding_name(*b))
                    .collect();
                set_config.inputs.insert(entry.name.clone(), names);
                if entry.combine {
                    set_config.combine_list.push(entry.name.clone());
                }
            }
            config.sets.insert(set.name.clone(), set_config);
        }

        config
    }

    pub fn save(&self, path: impl AsRef<Path>) -> InputResult<()> {
        let content = self.to_config().to_toml_string()?;
        fs::write(path, content).map_err(ConfigError::from)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sets
    // ------------------------------------------------------------------

    fn find_set(&self, name: &str) -> Option<usize> {
        self.sets.iter().position(|s| s.name == name)
    }

    fn set_or_create(&mut self, name: &str) -> InputResult<usize> {
        if name.is_empty() {
            return Err(InputError::InvalidSetName);
        }

        Ok(match self.find_set(name) {
            Some(index) => index,
            None => {
                self.sets.push(InputSet::new(name));
                self.sets.len() - 1
            }
        })
    }

    /// Makes `name` the current set, creating it if needed.
    pub fn select_set(&mut self, name: &str) -> InputResult<()> {
        let index = self.set_or_create(name)?;
        self.current = Some(index);

        debug!(set = name, "input set selected");
        self.events.emit(InputEvent {
            kind: InputEventKind::SelectSet,
            payload: InputEventPayload::for_set(name),
        });
        Ok(())
    }

    pub fn current_set(&self) -> Option<&str> {
        self.current.map(|index| self.sets[index].name.as_str())
    }

    /// Enabled sets update alongside the current one.
    pub fn enable_set(&mut self, name: &str, enable: bool) -> InputResult<()> {
        if enable {
            let index = self.set_or_create(name)?;
            self.sets[index].enabled = true;
        } else {
            let index = self
                .find_set(name)
                .ok_or_else(|| InputError::UnknownSet(name.to_string()))?;
            self.sets[index].enabled = false;
        }
        Ok(())
    }

    pub fn is_set_enabled(&self, name: &str) -> bool {
        self.find_set(name)
            .map(|index| self.sets[index].enabled || Some(index) == self.current)
            .unwrap_or(false)
    }

    fn current(&self) -> Option<&InputSet> {
        self.current.map(|index| &self.sets[index])
    }

    fn current_mut(&mut self) -> InputResult<&mut InputSet> {
        let index = self.current.ok_or(InputError::NoCurrentSet)?;
        Ok(&mut self.sets[index])
    }

    fn entry(&self, name: &str) -> Option<&InputEntry> {
        self.current()?.input(name)
    }

    fn entry_or_create(&mut self, name: &str) -> InputResult<&mut InputEntry> {
        if name.is_empty() {
            return Err(InputError::InvalidInputName);
        }
        Ok(self.current_mut()?.input_or_create(name))
    }

    fn entry_mut(&mut self, name: &str) -> InputResult<&mut InputEntry> {
        self.current_mut()?
            .input_mut(name)
            .ok_or_else(|| InputError::UnknownInput(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub fn is_active(&self, name: &str) -> bool {
        self.entry(name).map(|e| e.active).unwrap_or(false)
    }

    /// True if the status flipped during the last update.
    pub fn has_new_status(&self, name: &str) -> bool {
        self.entry(name).map(|e| e.new_status).unwrap_or(false)
    }

    pub fn value(&self, name: &str) -> f32 {
        self.entry(name).map(|e| e.value).unwrap_or(0.0)
    }

    /// Overrides the input's value until the end of the next update.
    pub fn set_value(&mut self, name: &str, value: f32) -> InputResult<()> {
        self.apply_external(name, value, false)
    }

    /// Overrides the input's value until `reset_value`.
    pub fn set_permanent_value(&mut self, name: &str, value: f32) -> InputResult<()> {
        self.apply_external(name, value, true)
    }

    fn apply_external(&mut self, name: &str, value: f32, permanent: bool) -> InputResult<()> {
        let set_name = self.current().ok_or(InputError::NoCurrentSet)?.name.clone();
        let entry = self.entry_or_create(name)?;
        if entry.apply_external(value, permanent) {
            let event = InputEvent {
                kind: status_kind(entry.active),
                payload: entry.payload(&set_name, None),
            };
            self.events.emit(event);
        }
        Ok(())
    }

    /// Gives control back to the bindings.
    pub fn reset_value(&mut self, name: &str) -> InputResult<()> {
        self.entry_mut(name)?.reset_external();
        Ok(())
    }

    pub fn is_in_combine_mode(&self, name: &str) -> bool {
        self.entry(name).map(|e| e.combine).unwrap_or(false)
    }

    /// In combine mode an input is active only while all its bindings are.
    pub fn set_combine_mode(&mut self, name: &str, combine: bool) -> InputResult<()> {
        self.entry_or_create(name)?.combine = combine;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Binds a device control to `name` in the current set.
    pub fn bind(&mut self, name: &str, ty: InputType, id: BindingId) -> InputResult<()> {
        let binding = Binding::new(ty, id);
        if !binding.is_valid() {
            return Err(InputError::InvalidBinding);
        }

        if self.entry_or_create(name)?.bind(binding) {
            debug!(input = name, binding = %binding_name(binding), "bound");
        }
        Ok(())
    }

    pub fn unbind(&mut self, name: &str, index: usize) -> InputResult<()> {
        if index >= BINDING_NUMBER {
            return Err(InputError::BindingIndexOutOfRange(index));
        }
        self.entry_mut(name)?.bindings[index] = Binding::NONE;
        Ok(())
    }

    pub fn binding(&self, name: &str, index: usize) -> Option<Binding> {
        let binding = *self.entry(name)?.bindings.get(index)?;
        (!binding.is_none()).then_some(binding)
    }

    pub fn binding_list(&self, name: &str) -> Option<[Binding; BINDING_NUMBER]> {
        self.entry(name).map(|e| e.bindings)
    }

    fn bound_inputs(&self, binding: Binding) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.current()
            .into_iter()
            .flat_map(|set| set.inputs.iter())
            .flat_map(move |entry| {
                entry
                    .bindings
                    .iter()
                    .enumerate()
                    .filter(move |(_, b)| !b.is_none() && **b == binding)
                    .map(move |(slot, _)| (entry.name.as_str(), slot))
            })
    }

    /// Number of (input, slot) pairs of the current set using `binding`.
    pub fn bound_input_counter(&self, binding: Binding) -> usize {
        self.bound_inputs(binding).count()
    }

    /// The `index`-th input using `binding`, with the slot it uses.
    pub fn bound_input(&self, binding: Binding, index: usize) -> Option<(String, usize)> {
        self.bound_inputs(binding)
            .nth(index)
            .map(|(name, slot)| (name.to_string(), slot))
    }

    /// First device control currently active, scanning keys, then mouse
    /// buttons, then joystick buttons, then axes.
    pub fn active_binding(&self, device: &dyn DeviceState) -> Option<Binding> {
        let keys = KeyboardKey::ALL.iter().map(|k| Binding::key(*k));
        let buttons = MouseButton::ALL.iter().map(|b| Binding::mouse_button(*b));
        let joy_buttons = (0..JOYSTICK_NUMBER * JOYSTICK_BUTTON_NUMBER)
            .map(|id| Binding::new(InputType::JoystickButton, id));
        let mouse_axes = MouseAxis::ALL.iter().map(|a| Binding::mouse_axis(*a));
        let joy_axes = (0..JOYSTICK_NUMBER * JoystickAxis::ALL.len() as u32)
            .map(|id| Binding::new(InputType::JoystickAxis, id));

        keys.chain(buttons)
            .chain(joy_buttons)
            .chain(mouse_axes)
            .chain(joy_axes)
            .find(|b| is_binding_active(*b, device.value(*b), self.joystick_threshold))
    }

    // ------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------

    /// Recomputes every input of the current and enabled sets and emits
    /// `On`/`Off` for each status flip.
    pub fn update(&mut self, device: &dyn DeviceState) {
        let threshold = self.joystick_threshold;
        let mut flips = Vec::new();

        for (index, set) in self.sets.iter_mut().enumerate() {
            if !set.enabled && Some(index) != self.current {
                continue;
            }

            for entry in &mut set.inputs {
                if entry.refresh(device, threshold) {
                    flips.push(InputEvent {
                        kind: status_kind(entry.active),
                        payload: entry.payload(&set.name, Some(device)),
                    });
                }
            }
        }

        for event in flips {
            self.events.emit(event);
        }
    }
}

fn validate(config: &InputConfig) -> InputResult<()> {
    let mut set_names = config.set_list.iter().chain(config.sets.keys());
    if set_names.any(|name| name.is_empty()) {
        return Err(InputError::InvalidSetName);
    }

    let mut input_names = config
        .sets
        .values()
        .flat_map(|set| set.inputs.keys().chain(&set.combine_list));
    if input_names.any(|name| name.is_empty()) {
        return Err(InputError::InvalidInputName);
    }
    Ok(())
}

fn status_kind(active: bool) -> InputEventKind {
    if active {
        InputEventKind::On
    } else {
        InputEventKind::Off
    }
}
