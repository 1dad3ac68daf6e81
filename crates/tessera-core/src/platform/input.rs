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

//! Backend-agnostic input events consumed by the camera and the frame loop.

/// An engine-internal representation of a user input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A keyboard key was pressed.
    KeyPressed {
        /// The physical key.
        key_code: KeyCode,
    },
    /// A keyboard key was released.
    KeyReleased {
        /// The physical key.
        key_code: KeyCode,
    },
    /// A mouse button was pressed.
    MouseButtonPressed {
        /// The mouse button that was pressed.
        button: MouseButton,
    },
    /// A mouse button was released.
    MouseButtonReleased {
        /// The mouse button that was released.
        button: MouseButton,
    },
    /// Raw relative mouse motion, independent of the cursor position.
    MouseMotion {
        /// Horizontal delta in device units.
        delta_x: f32,
        /// Vertical delta in device units, positive downwards.
        delta_y: f32,
    },
    /// The mouse wheel was scrolled.
    MouseWheelScrolled {
        /// The horizontal scroll delta.
        delta_x: f32,
        /// The vertical scroll delta.
        delta_y: f32,
    },
}

/// The physical keys the renderer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W.
    KeyW,
    /// A.
    KeyA,
    /// S.
    KeyS,
    /// D.
    KeyD,
    /// Q.
    KeyQ,
    /// E.
    KeyE,
    /// L, toggles light animation.
    KeyL,
    /// V, toggles the depth debug view.
    KeyV,
    /// C, requests a culling readback.
    KeyC,
    /// Space.
    Space,
    /// Left shift.
    ShiftLeft,
    /// Escape.
    Escape,
    /// Any other key.
    Other,
}

/// An engine-internal representation of a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// The left mouse button.
    Left,
    /// The right mouse button.
    Right,
    /// The middle mouse button.
    Middle,
    /// Another mouse button, identified by a numeric code.
    Other(u16),
}
