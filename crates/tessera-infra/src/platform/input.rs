// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Translation from `winit` events to the renderer's abstract input events.

use tessera_core::platform::{InputEvent, KeyCode, MouseButton};
use winit::event::{
    DeviceEvent, ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent,
};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Translates a `winit::event::WindowEvent` into an [`InputEvent`].
///
/// Key repeats and non-input window events (resize, focus, close) yield `None`.
pub fn translate_winit_input(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput {
            event: key_event, ..
        } => {
            let PhysicalKey::Code(keycode) = key_event.physical_key else {
                return None;
            };
            let key_code = map_keycode(keycode);
            match key_event.state {
                ElementState::Pressed if !key_event.repeat => {
                    Some(InputEvent::KeyPressed { key_code })
                }
                ElementState::Released => Some(InputEvent::KeyReleased { key_code }),
                _ => None,
            }
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_mouse_button(*button);
            match state {
                ElementState::Pressed => Some(InputEvent::MouseButtonPressed { button }),
                ElementState::Released => Some(InputEvent::MouseButtonReleased { button }),
            }
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let (dx, dy): (f32, f32) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(pos) => (pos.x as f32, pos.y as f32),
            };
            (dx != 0.0 || dy != 0.0).then_some(InputEvent::MouseWheelScrolled {
                delta_x: dx,
                delta_y: dy,
            })
        }
        _ => None,
    }
}

/// Translates raw device motion into [`InputEvent::MouseMotion`].
///
/// Raw motion keeps arriving while the cursor is grabbed, which cursor
/// positions do not.
pub fn translate_device_event(event: &DeviceEvent) -> Option<InputEvent> {
    match event {
        DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(InputEvent::MouseMotion {
            delta_x: *dx as f32,
            delta_y: *dy as f32,
        }),
        _ => None,
    }
}

fn map_keycode(keycode: WinitKeyCode) -> KeyCode {
    match keycode {
        WinitKeyCode::KeyW => KeyCode::KeyW,
        WinitKeyCode::KeyA => KeyCode::KeyA,
        WinitKeyCode::KeyS => KeyCode::KeyS,
        WinitKeyCode::KeyD => KeyCode::KeyD,
        WinitKeyCode::KeyQ => KeyCode::KeyQ,
        WinitKeyCode::KeyE => KeyCode::KeyE,
        WinitKeyCode::KeyL => KeyCode::KeyL,
        WinitKeyCode::KeyV => KeyCode::KeyV,
        WinitKeyCode::KeyC => KeyCode::KeyC,
        WinitKeyCode::Space => KeyCode::Space,
        WinitKeyCode::ShiftLeft => KeyCode::ShiftLeft,
        WinitKeyCode::Escape => KeyCode::Escape,
        _ => KeyCode::Other,
    }
}

fn map_mouse_button(button: WinitMouseButton) -> MouseButton {
    match button {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(id) => MouseButton::Other(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, TouchPhase};

    #[test]
    fn test_map_keycode_known_and_unknown() {
        assert_eq!(map_keycode(WinitKeyCode::KeyW), KeyCode::KeyW);
        assert_eq!(map_keycode(WinitKeyCode::KeyV), KeyCode::KeyV);
        assert_eq!(map_keycode(WinitKeyCode::Escape), KeyCode::Escape);
        assert_eq!(map_keycode(WinitKeyCode::F12), KeyCode::Other);
    }

    #[test]
    fn test_map_mouse_button() {
        assert_eq!(map_mouse_button(WinitMouseButton::Left), MouseButton::Left);
        assert_eq!(
            map_mouse_button(WinitMouseButton::Other(8)),
            MouseButton::Other(8)
        );
    }

    #[test]
    fn test_translate_mouse_button_pressed() {
        let event = WindowEvent::MouseInput {
            device_id: DeviceId::dummy(),
            state: ElementState::Pressed,
            button: WinitMouseButton::Right,
        };
        assert_eq!(
            translate_winit_input(&event),
            Some(InputEvent::MouseButtonPressed {
                button: MouseButton::Right
            })
        );
    }

    #[test]
    fn test_translate_mouse_wheel_zero_is_dropped() {
        let event = WindowEvent::MouseWheel {
            device_id: DeviceId::dummy(),
            delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 0.0)),
            phase: TouchPhase::Moved,
        };
        assert_eq!(translate_winit_input(&event), None);

        let event = WindowEvent::MouseWheel {
            device_id: DeviceId::dummy(),
            delta: MouseScrollDelta::LineDelta(0.0, -1.0),
            phase: TouchPhase::Moved,
        };
        assert_eq!(
            translate_winit_input(&event),
            Some(InputEvent::MouseWheelScrolled {
                delta_x: 0.0,
                delta_y: -1.0
            })
        );
    }

    #[test]
    fn test_translate_device_motion() {
        let event = DeviceEvent::MouseMotion { delta: (3.0, -2.5) };
        assert_eq!(
            translate_device_event(&event),
            Some(InputEvent::MouseMotion {
                delta_x: 3.0,
                delta_y: -2.5
            })
        );
    }

    #[test]
    fn test_translate_non_input_returns_none() {
        assert_eq!(
            translate_winit_input(&WindowEvent::Resized(winit::dpi::PhysicalSize::new(
                100, 100
            ))),
            None
        );
        assert_eq!(translate_winit_input(&WindowEvent::CloseRequested), None);
    }
}
