// crates/engine_core/src/input/device.rs
use std::collections::{HashMap, HashSet};

use glam::Vec2;

use engine_shared::input_types::{
    Binding, InputType, JoystickAxis, KeyboardKey, MouseAxis, MouseButton,
    JOYSTICK_BUTTON_NUMBER, JOYSTICK_NUMBER,
};

/// Answers what a device control currently reports.
///
/// Keys and buttons report `1.0` when down and `0.0` when up; axes report
/// their raw value.
pub trait DeviceState {
    fn value(&self, binding: Binding) -> f32;
}

/// Device state held in memory, filled by the window poller and by setters.
#[derive(Debug, Default, Clone)]
pub struct DeviceSnapshot {
    keys: HashSet<KeyboardKey>,
    mouse_buttons: HashSet<MouseButton>,
    mouse_delta: Vec2,
    wheel: f32,
    joystick_buttons: HashSet<u32>,
    joystick_axes: HashMap<u32, f32>,
}

impl DeviceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: KeyboardKey, pressed: bool) {
        if pressed {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    pub fn set_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.mouse_buttons.insert(button);
        } else {
            self.mouse_buttons.remove(&button);
        }
    }

    /// Accumulates cursor motion for the current frame.
    pub fn add_mouse_motion(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    /// Accumulates wheel motion for the current frame; positive is up.
    pub fn add_wheel(&mut self, delta: f32) {
        self.wheel += delta;
    }

    /// `button` and `joystick` are zero-based.
    pub fn set_joystick_button(&mut self, button: u32, joystick: u32, pressed: bool) {
        let id = Binding::joystick_button(button, joystick).id;
        if pressed {
            self.joystick_buttons.insert(id);
        } else {
            self.joystick_buttons.remove(&id);
        }
    }

    pub fn set_joystick_axis(&mut self, axis: JoystickAxis, joystick: u32, value: f32) {
        let id = Binding::joystick_axis(axis, joystick).id;
        self.joystick_axes.insert(id, value);
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Clears per-frame motion; held keys and buttons stay down.
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.wheel = 0.0;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn digital(down: bool) -> f32 {
    if down {
        1.0
    } else {
        0.0
    }
}

impl DeviceState for DeviceSnapshot {
    fn value(&self, binding: Binding) -> f32 {
        match binding.ty {
            InputType::KeyboardKey => KeyboardKey::from_id(binding.id)
                .map(|key| digital(self.keys.contains(&key)))
                .unwrap_or(0.0),
            InputType::MouseButton => match MouseButton::from_id(binding.id) {
                Some(MouseButton::WheelUp) => digital(self.wheel > 0.0),
                Some(MouseButton::WheelDown) => digital(self.wheel < 0.0),
                Some(button) => digital(self.mouse_buttons.contains(&button)),
                None => 0.0,
            },
            InputType::MouseAxis => match MouseAxis::from_id(binding.id) {
                Some(MouseAxis::X) => self.mouse_delta.x,
                Some(MouseAxis::Y) => self.mouse_delta.y,
                None => 0.0,
            },
            InputType::JoystickButton => digital(
                binding.id < JOYSTICK_NUMBER * JOYSTICK_BUTTON_NUMBER
                    && self.joystick_buttons.contains(&binding.id),
            ),
            InputType::JoystickAxis => self.joystick_axes.get(&binding.id).copied().unwrap_or(0.0),
            InputType::External | InputType::None => 0.0,
        }
    }
}

/// Whether a control reporting `value` counts as active.
///
/// Joystick axes rest near zero without being exactly zero, so they need to
/// pass `joystick_threshold`.
pub fn is_binding_active(binding: Binding, value: f32, joystick_threshold: f32) -> bool {
    match binding.ty {
        InputType::JoystickAxis => value.abs() > joystick_threshold,
        InputType::MouseAxis => value != 0.0,
        InputType::None | InputType::External => false,
        _ => value > 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_buttons_are_digital() {
        let mut device = DeviceSnapshot::new();
        let space = Binding::key(KeyboardKey::Space);
        assert_eq!(device.value(space), 0.0);

        device.set_key(KeyboardKey::Space, true);
        device.set_mouse_button(MouseButton::Right, true);
        assert_eq!(device.value(space), 1.0);
        assert_eq!(device.value(Binding::mouse_button(MouseButton::Right)), 1.0);

        device.set_key(KeyboardKey::Space, false);
        assert_eq!(device.value(space), 0.0);
    }

    #[test]
    fn motion_and_wheel_last_one_frame() {
        let mut device = DeviceSnapshot::new();
        device.add_mouse_motion(Vec2::new(3.0, -2.0));
        device.add_mouse_motion(Vec2::new(1.0, 0.0));
        device.add_wheel(-1.0);

        assert_eq!(device.value(Binding::mouse_axis(MouseAxis::X)), 4.0);
        assert_eq!(device.value(Binding::mouse_axis(MouseAxis::Y)), -2.0);
        assert_eq!(device.value(Binding::mouse_button(MouseButton::WheelDown)), 1.0);
        assert_eq!(device.value(Binding::mouse_button(MouseButton::WheelUp)), 0.0);

        device.end_frame();
        assert_eq!(device.mouse_delta(), Vec2::ZERO);
        assert_eq!(device.value(Binding::mouse_button(MouseButton::WheelDown)), 0.0);
    }

    #[test]
    fn joysticks_are_addressed_per_pad() {
        let mut device = DeviceSnapshot::new();
        device.set_joystick_button(2, 1, true);
        device.set_joystick_axis(JoystickAxis::LX, 1, -0.5);

        assert_eq!(device.value(Binding::joystick_button(2, 1)), 1.0);
        assert_eq!(device.value(Binding::joystick_button(2, 0)), 0.0);
        assert_eq!(device.value(Binding::joystick_axis(JoystickAxis::LX, 1)), -0.5);
        assert_eq!(device.value(Binding::joystick_axis(JoystickAxis::LX, 0)), 0.0);
    }

    #[test]
    fn activity_thresholds() {
        let axis = Binding::joystick_axis(JoystickAxis::RY, 0);
        assert!(!is_binding_active(axis, 0.05, 0.1));
        assert!(is_binding_active(axis, -0.3, 0.1));
        assert!(is_binding_active(Binding::mouse_axis(MouseAxis::X), -0.01, 0.1));
        assert!(!is_binding_active(Binding::key(KeyboardKey::A), 0.0, 0.1));
        assert!(!is_binding_active(Binding::NONE, 1.0, 0.1));
    }
}
