// crates/engine_core/src/input/set.rs
use engine_shared::input_types::{Binding, InputEventPayload, BINDING_NUMBER};

use super::device::{is_binding_active, DeviceState};

/// One named input and the state computed for it each frame.
#[derive(Debug, Clone)]
pub(crate) struct InputEntry {
    pub name: String,
    pub bindings: [Binding; BINDING_NUMBER],
    pub combine: bool,
    pub active: bool,
    pub new_status: bool,
    pub value: f32,
    pub external: Option<f32>,
    pub permanent: bool,
}

impl InputEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bindings: [Binding::NONE; BINDING_NUMBER],
            combine: false,
            active: false,
            new_status: false,
            value: 0.0,
            external: None,
            permanent: false,
        }
    }

    /// Adds `binding` in the first free slot. A full entry forgets its oldest
    /// binding. Returns false if the binding was already there.
    pub fn bind(&mut self, binding: Binding) -> bool {
        if self.bindings.contains(&binding) {
            return false;
        }

        match self.bindings.iter().position(Binding::is_none) {
            Some(slot) => self.bindings[slot] = binding,
            None => {
                self.bindings.rotate_left(1);
                self.bindings[BINDING_NUMBER - 1] = binding;
            }
        }
        true
    }

    /// Forces status and value from outside. Returns true if the status flipped.
    pub fn apply_external(&mut self, value: f32, permanent: bool) -> bool {
        self.external = Some(value);
        self.permanent = permanent;
        self.set_status(value != 0.0, value)
    }

    pub fn reset_external(&mut self) {
        self.external = None;
        self.permanent = false;
    }

    fn set_status(&mut self, active: bool, value: f32) -> bool {
        self.new_status = active != self.active;
        self.active = active;
        self.value = value;
        self.new_status
    }

    /// Recomputes status and value for this frame. Returns true if the status
    /// flipped.
    pub fn refresh(&mut self, device: &dyn DeviceState, joystick_threshold: f32) -> bool {
        if let Some(value) = self.external {
            if !self.permanent {
                self.external = None;
            }
            return self.set_status(value != 0.0, value);
        }

        let mut bound = 0;
        let mut active_count = 0;
        let mut first_value = None;
        for binding in self.bindings.iter().filter(|b| !b.is_none()) {
            bound += 1;
            let value = device.value(*binding);
            if is_binding_active(*binding, value, joystick_threshold) {
                active_count += 1;
                first_value.get_or_insert(value);
            }
        }

        let active = if self.combine {
            bound > 0 && active_count == bound
        } else {
            active_count > 0
        };
        let value = if active { first_value.unwrap_or(0.0) } else { 0.0 };
        self.set_status(active, value)
    }

    /// Event payload describing this entry's bindings as `device` sees them.
    pub fn payload(&self, set_name: &str, device: Option<&dyn DeviceState>) -> InputEventPayload {
        let mut payload = InputEventPayload::for_set(set_name);
        payload.input_name = self.name.clone();
        for (slot, binding) in self.bindings.iter().enumerate() {
            payload.types[slot] = binding.ty;
            payload.ids[slot] = binding.id;
            payload.values[slot] = match device {
                Some(device) if !binding.is_none() => device.value(*binding),
                _ => 0.0,
            };
        }
        payload
    }
}

/// A named group of inputs, selected or enabled as a whole.
#[derive(Debug, Clone)]
pub(crate) struct InputSet {
    pub name: String,
    pub enabled: bool,
    pub inputs: Vec<InputEntry>,
}

impl InputSet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: false,
            inputs: Vec::new(),
        }
    }

    pub fn input(&self, name: &str) -> Option<&InputEntry> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut InputEntry> {
        self.inputs.iter_mut().find(|i| i.name == name)
    }

    pub fn input_or_create(&mut self, name: &str) -> &mut InputEntry {
        let index = match self.inputs.iter().position(|i| i.name == name) {
            Some(index) => index,
            None => {
                self.inputs.push(InputEntry::new(name));
                self.inputs.len() - 1
            }
        };
        &mut self.inputs[index]
    }
}
