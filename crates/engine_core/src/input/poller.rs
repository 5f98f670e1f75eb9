// crates/engine_core/src/input/poller.rs

use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use engine_shared::input_types::{KeyboardKey, MouseButton};

use super::device::DeviceSnapshot;

/// Low-level collector turning winit window events into device state.
/// This keeps raw window events out of the input system.
#[derive(Debug, Default)]
pub struct InputPoller {
    snapshot: DeviceSnapshot,
    last_cursor: Option<Vec2>,
}

impl InputPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single winit WindowEvent and update the snapshot.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                self.handle_keyboard_input(key_event)
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = map_mouse_button(*button) {
                    self.snapshot
                        .set_mouse_button(button, *state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => self.last_cursor = None,
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                self.snapshot.add_wheel(amount);
            }
            // Keys released while unfocused never come back as events.
            WindowEvent::Focused(false) => self.snapshot.clear(),
            _ => {}
        }
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        if let PhysicalKey::Code(keycode) = key_event.physical_key {
            self.handle_key(keycode, key_event.state);
        }
    }

    pub fn handle_key(&mut self, keycode: KeyCode, state: ElementState) {
        if let Some(key) = map_key_code(keycode) {
            self.snapshot.set_key(key, state == ElementState::Pressed);
        }
    }

    /// Cursor position in window pixels; motion is the difference with the
    /// previous position.
    pub fn handle_cursor(&mut self, position: Vec2) {
        if let Some(last) = self.last_cursor {
            self.snapshot.add_mouse_motion(position - last);
        }
        self.last_cursor = Some(position);
    }

    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    /// For device state winit doesn't report (joysticks).
    pub fn snapshot_mut(&mut self) -> &mut DeviceSnapshot {
        &mut self.snapshot
    }

    /// Call once the frame's input has been consumed.
    pub fn end_frame(&mut self) {
        self.snapshot.end_frame();
    }
}

pub fn map_mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    use winit::event::MouseButton as Winit;

    Some(match button {
        Winit::Left => MouseButton::Left,
        Winit::Right => MouseButton::Right,
        Winit::Middle => MouseButton::Middle,
        Winit::Back => MouseButton::Extra1,
        Winit::Forward => MouseButton::Extra2,
        Winit::Other(3) => MouseButton::Extra3,
        Winit::Other(4) => MouseButton::Extra4,
        Winit::Other(5) => MouseButton::Extra5,
        Winit::Other(_) => return None,
    })
}

pub fn map_key_code(code: KeyCode) -> Option<KeyboardKey> {
    use KeyboardKey as K;

    Some(match code {
        KeyCode::KeyA => K::A,
        KeyCode::KeyB => K::B,
        KeyCode::KeyC => K::C,
        KeyCode::KeyD => K::D,
        KeyCode::KeyE => K::E,
        KeyCode::KeyF => K::F,
        KeyCode::KeyG => K::G,
        KeyCode::KeyH => K::H,
        KeyCode::KeyI => K::I,
        KeyCode::KeyJ => K::J,
        KeyCode::KeyK => K::K,
        KeyCode::KeyL => K::L,
        KeyCode::KeyM => K::M,
        KeyCode::KeyN => K::N,
        KeyCode::KeyO => K::O,
        KeyCode::KeyP => K::P,
        KeyCode::KeyQ => K::Q,
        KeyCode::KeyR => K::R,
        KeyCode::KeyS => K::S,
        KeyCode::KeyT => K::T,
        KeyCode::KeyU => K::U,
        KeyCode::KeyV => K::V,
        KeyCode::KeyW => K::W,
        KeyCode::KeyX => K::X,
        KeyCode::KeyY => K::Y,
        KeyCode::KeyZ => K::Z,
        KeyCode::Digit0 => K::Num0,
        KeyCode::Digit1 => K::Num1,
        KeyCode::Digit2 => K::Num2,
        KeyCode::Digit3 => K::Num3,
        KeyCode::Digit4 => K::Num4,
        KeyCode::Digit5 => K::Num5,
        KeyCode::Digit6 => K::Num6,
        KeyCode::Digit7 => K::Num7,
        KeyCode::Digit8 => K::Num8,
        KeyCode::Digit9 => K::Num9,
        KeyCode::F1 => K::F1,
        KeyCode::F2 => K::F2,
        KeyCode::F3 => K::F3,
        KeyCode::F4 => K::F4,
        KeyCode::F5 => K::F5,
        KeyCode::F6 => K::F6,
        KeyCode::F7 => K::F7,
        KeyCode::F8 => K::F8,
        KeyCode::F9 => K::F9,
        KeyCode::F10 => K::F10,
        KeyCode::F11 => K::F11,
        KeyCode::F12 => K::F12,
        KeyCode::ArrowUp => K::Up,
        KeyCode::ArrowDown => K::Down,
        KeyCode::ArrowLeft => K::Left,
        KeyCode::ArrowRight => K::Right,
        KeyCode::Space => K::Space,
        KeyCode::Enter => K::Return,
        KeyCode::Escape => K::Escape,
        KeyCode::Tab => K::Tab,
        KeyCode::Backspace => K::Backspace,
        KeyCode::Insert => K::Insert,
        KeyCode::Delete => K::Delete,
        KeyCode::Home => K::Home,
        KeyCode::End => K::End,
        KeyCode::PageUp => K::PageUp,
        KeyCode::PageDown => K::PageDown,
        KeyCode::ShiftLeft => K::LShift,
        KeyCode::ShiftRight => K::RShift,
        KeyCode::ControlLeft => K::LCtrl,
        KeyCode::ControlRight => K::RCtrl,
        KeyCode::AltLeft => K::LAlt,
        KeyCode::AltRight => K::RAlt,
        KeyCode::Comma => K::Comma,
        KeyCode::Period => K::Period,
        KeyCode::Slash => K::Slash,
        KeyCode::Backslash => K::Backslash,
        KeyCode::Semicolon => K::Semicolon,
        KeyCode::Quote => K::Quote,
        KeyCode::Minus => K::Minus,
        KeyCode::Equal => K::Equal,
        KeyCode::BracketLeft => K::LBracket,
        KeyCode::BracketRight => K::RBracket,
        KeyCode::Backquote => K::Tilde,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::device::DeviceState;
    use engine_shared::input_types::{Binding, MouseAxis};

    #[test]
    fn keys_follow_press_and_release() {
        let mut poller = InputPoller::new();
        let w = Binding::key(KeyboardKey::W);

        poller.handle_key(KeyCode::KeyW, ElementState::Pressed);
        assert_eq!(poller.snapshot().value(w), 1.0);

        poller.handle_key(KeyCode::KeyW, ElementState::Released);
        assert_eq!(poller.snapshot().value(w), 0.0);

        // Unmapped keys are ignored.
        poller.handle_key(KeyCode::NumpadAdd, ElementState::Pressed);
    }

    #[test]
    fn cursor_motion_is_a_delta() {
        let mut poller = InputPoller::new();
        poller.handle_cursor(Vec2::new(100.0, 50.0));
        assert_eq!(poller.snapshot().mouse_delta(), Vec2::ZERO);

        poller.handle_cursor(Vec2::new(110.0, 45.0));
        assert_eq!(poller.snapshot().value(Binding::mouse_axis(MouseAxis::X)), 10.0);
        assert_eq!(poller.snapshot().value(Binding::mouse_axis(MouseAxis::Y)), -5.0);

        poller.end_frame();
        assert_eq!(poller.snapshot().mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn winit_controls_map_to_engine_ids() {
        assert_eq!(map_key_code(KeyCode::Enter), Some(KeyboardKey::Return));
        assert_eq!(map_key_code(KeyCode::Backquote), Some(KeyboardKey::Tilde));
        assert_eq!(
            map_mouse_button(winit::event::MouseButton::Back),
            Some(MouseButton::Extra1)
        );
        assert_eq!(map_mouse_button(winit::event::MouseButton::Other(42)), None);
    }
}
