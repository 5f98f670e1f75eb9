// crates/engine_shared/src/lib.rs
//! Plain data shared between the engine core, its tools and game code.

pub mod input_types;
pub mod resource_types;

pub use input_types::{
    binding_name, parse_binding, Binding, BindingId, InputEvent, InputEventKind,
    InputEventPayload, InputType, JoystickAxis, KeyboardKey, MouseAxis, MouseButton,
    BINDING_NUMBER, JOYSTICK_BUTTON_NUMBER, JOYSTICK_NUMBER,
};
pub use resource_types::{make_location, ResourceEvent, ResourceEventKind, LOCATION_SEPARATOR};
