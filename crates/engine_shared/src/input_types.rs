// crates/engine_shared/src/input_types.rs
//! Binding and event types for the input layer, plus the textual binding names
//! used by config files ("KEY_SPACE", "MOUSE_LEFT", "JOY_3_1", "JOY_LX_2", ...).

use serde::{Deserialize, Serialize};

/// Device-local identifier of a key, button or axis.
pub type BindingId = u32;

/// Number of bindings an input can hold.
pub const BINDING_NUMBER: usize = 4;

/// Number of joysticks addressable by bindings.
pub const JOYSTICK_NUMBER: u32 = 4;

/// Number of buttons per joystick.
pub const JOYSTICK_BUTTON_NUMBER: u32 = 16;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InputType {
    KeyboardKey = 0,
    MouseButton = 1,
    MouseAxis = 2,
    JoystickButton = 3,
    JoystickAxis = 4,
    /// Driven only through external values, never by a device.
    External = 5,
    #[default]
    None = 6,
}

/// One slot of an input: which device control drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub ty: InputType,
    pub id: BindingId,
}

impl Binding {
    pub const NONE: Binding = Binding {
        ty: InputType::None,
        id: BindingId::MAX,
    };

    pub fn new(ty: InputType, id: BindingId) -> Self {
        Self { ty, id }
    }

    pub fn key(key: KeyboardKey) -> Self {
        Self::new(InputType::KeyboardKey, key.id())
    }

    pub fn mouse_button(button: MouseButton) -> Self {
        Self::new(InputType::MouseButton, button.id())
    }

    pub fn mouse_axis(axis: MouseAxis) -> Self {
        Self::new(InputType::MouseAxis, axis.id())
    }

    /// `button` and `joystick` are zero-based.
    pub fn joystick_button(button: u32, joystick: u32) -> Self {
        Self::new(
            InputType::JoystickButton,
            joystick * JOYSTICK_BUTTON_NUMBER + button,
        )
    }

    /// `joystick` is zero-based.
    pub fn joystick_axis(axis: JoystickAxis, joystick: u32) -> Self {
        Self::new(
            InputType::JoystickAxis,
            joystick * JoystickAxis::ALL.len() as u32 + axis.id(),
        )
    }

    pub fn is_none(&self) -> bool {
        self.ty == InputType::None
    }

    /// True for bindings a device can actually report.
    pub fn is_valid(&self) -> bool {
        match self.ty {
            InputType::KeyboardKey => KeyboardKey::from_id(self.id).is_some(),
            InputType::MouseButton => MouseButton::from_id(self.id).is_some(),
            InputType::MouseAxis => MouseAxis::from_id(self.id).is_some(),
            InputType::JoystickButton => self.id < JOYSTICK_NUMBER * JOYSTICK_BUTTON_NUMBER,
            InputType::JoystickAxis => {
                self.id < JOYSTICK_NUMBER * JoystickAxis::ALL.len() as u32
            }
            InputType::External => true,
            InputType::None => false,
        }
    }
}

impl Default for Binding {
    fn default() -> Self {
        Binding::NONE
    }
}

macro_rules! id_table {
    ($(#[$meta:meta])* $ty:ident { $($variant:ident => $name:literal),* $(,)? }) => {
        $(#[$meta])*
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $ty {
            $($variant),*
        }

        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),*
                }
            }

            pub fn id(self) -> BindingId {
                self as BindingId
            }

            pub fn from_id(id: BindingId) -> Option<Self> {
                Self::ALL.get(id as usize).copied()
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name().eq_ignore_ascii_case(name))
            }
        }
    };
}

id_table!(
    /// Keyboard keys, by physical position.
    KeyboardKey {
        A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G",
        H => "H", I => "I", J => "J", K => "K", L => "L", M => "M", N => "N",
        O => "O", P => "P", Q => "Q", R => "R", S => "S", T => "T", U => "U",
        V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
        Num0 => "0", Num1 => "1", Num2 => "2", Num3 => "3", Num4 => "4",
        Num5 => "5", Num6 => "6", Num7 => "7", Num8 => "8", Num9 => "9",
        F1 => "F1", F2 => "F2", F3 => "F3", F4 => "F4", F5 => "F5", F6 => "F6",
        F7 => "F7", F8 => "F8", F9 => "F9", F10 => "F10", F11 => "F11", F12 => "F12",
        Up => "UP", Down => "DOWN", Left => "LEFT", Right => "RIGHT",
        Space => "SPACE", Return => "RETURN", Escape => "ESCAPE", Tab => "TAB",
        Backspace => "BACKSPACE", Insert => "INSERT", Delete => "DELETE",
        Home => "HOME", End => "END", PageUp => "PAGE_UP", PageDown => "PAGE_DOWN",
        LShift => "LSHIFT", RShift => "RSHIFT", LCtrl => "LCTRL", RCtrl => "RCTRL",
        LAlt => "LALT", RAlt => "RALT",
        Comma => "COMMA", Period => "PERIOD", Slash => "SLASH", Backslash => "BACKSLASH",
        Semicolon => "SEMICOLON", Quote => "QUOTE", Minus => "MINUS", Equal => "EQUAL",
        LBracket => "LBRACKET", RBracket => "RBRACKET", Tilde => "TILDE",
    }
);

id_table!(
    MouseButton {
        Left => "LEFT", Right => "RIGHT", Middle => "MIDDLE",
        Extra1 => "EXTRA_1", Extra2 => "EXTRA_2", Extra3 => "EXTRA_3",
        Extra4 => "EXTRA_4", Extra5 => "EXTRA_5",
        WheelUp => "WHEEL_UP", WheelDown => "WHEEL_DOWN",
    }
);

id_table!(
    /// Mouse motion, reported as the per-frame cursor delta.
    MouseAxis {
        X => "X", Y => "Y",
    }
);

id_table!(
    JoystickAxis {
        LX => "LX", LY => "LY", RX => "RX", RY => "RY",
        LTrigger => "LTRIGGER", RTrigger => "RTRIGGER",
    }
);

/// Textual name of a binding, as written in input config files.
pub fn binding_name(binding: Binding) -> String {
    match binding.ty {
        InputType::KeyboardKey => KeyboardKey::from_id(binding.id)
            .map(|k| format!("KEY_{}", k.name()))
            .unwrap_or_else(|| "KEY_UNKNOWN".to_string()),
        InputType::MouseButton => MouseButton::from_id(binding.id)
            .map(|b| format!("MOUSE_{}", b.name()))
            .unwrap_or_else(|| "MOUSE_UNKNOWN".to_string()),
        InputType::MouseAxis => MouseAxis::from_id(binding.id)
            .map(|a| format!("MOUSE_{}", a.name()))
            .unwrap_or_else(|| "MOUSE_UNKNOWN".to_string()),
        InputType::JoystickButton => {
            let joystick = binding.id / JOYSTICK_BUTTON_NUMBER;
            let button = binding.id % JOYSTICK_BUTTON_NUMBER;
            format!("JOY_{}_{}", button + 1, joystick + 1)
        }
        InputType::JoystickAxis => {
            let per_joystick = JoystickAxis::ALL.len() as u32;
            let joystick = binding.id / per_joystick;
            let axis = JoystickAxis::ALL[(binding.id % per_joystick) as usize];
            format!("JOY_{}_{}", axis.name(), joystick + 1)
        }
        InputType::External => "EXTERNAL".to_string(),
        InputType::None => "NONE".to_string(),
    }
}

/// Parses a binding name (case-insensitive). External and empty bindings have
/// no textual form and are never returned.
pub fn parse_binding(name: &str) -> Option<Binding> {
    let upper = name.trim().to_ascii_uppercase();

    if let Some(rest) = upper.strip_prefix("KEY_") {
        return KeyboardKey::from_name(rest).map(Binding::key);
    }

    if let Some(rest) = upper.strip_prefix("MOUSE_") {
        if let Some(button) = MouseButton::from_name(rest) {
            return Some(Binding::mouse_button(button));
        }
        return MouseAxis::from_name(rest).map(Binding::mouse_axis);
    }

    if let Some(rest) = upper.strip_prefix("JOY_") {
        let (control, joystick) = rest.rsplit_once('_')?;
        let joystick: u32 = joystick.parse().ok()?;
        if joystick == 0 || joystick > JOYSTICK_NUMBER {
            return None;
        }

        if let Some(axis) = JoystickAxis::from_name(control) {
            return Some(Binding::joystick_axis(axis, joystick - 1));
        }

        let button: u32 = control.parse().ok()?;
        if button == 0 || button > JOYSTICK_BUTTON_NUMBER {
            return None;
        }
        return Some(Binding::joystick_button(button - 1, joystick - 1));
    }

    None
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEventKind {
    On,
    Off,
    SelectSet,
}

/// Carried by every input event. Slots mirror the input's bindings; unused
/// slots hold `InputType::None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEventPayload {
    pub set_name: String,
    pub input_name: String,
    pub types: [InputType; BINDING_NUMBER],
    pub ids: [BindingId; BINDING_NUMBER],
    pub values: [f32; BINDING_NUMBER],
}

impl InputEventPayload {
    pub fn for_set(set_name: &str) -> Self {
        Self {
            set_name: set_name.to_string(),
            input_name: String::new(),
            types: [InputType::None; BINDING_NUMBER],
            ids: [Binding::NONE.id; BINDING_NUMBER],
            values: [0.0; BINDING_NUMBER],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub kind: InputEventKind,
    pub payload: InputEventPayload,
}
