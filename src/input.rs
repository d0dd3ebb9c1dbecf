//! Keyboard and pointer input, and pointer-driven hands.
//!
//! [`Input`] tracks instantaneous events (key just pressed) and continuous
//! state (button held) from raw window events. [`Input::pointer_hands`]
//! turns the pointer into a [`HandState`] so the simulation can be played
//! with a mouse:
//!
//! - The cursor is the right hand.
//! - Holding the left button pinches.
//! - Holding Shift adds a left hand mirrored across the vertical centre line,
//!   which drives the two-hand scale.

use crate::hand::{HandInfo, HandState};
use crate::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Input state tracking for keyboard and pointer.
#[derive(Debug)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    buttons_held: HashSet<MouseButton>,
    /// Cursor in pixels, `None` while outside the window.
    cursor: Option<Vec2>,
    window_size: (u32, u32),
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
            buttons_held: HashSet::new(),
            cursor: None,
            window_size: (800, 600),
        }
    }

    /// Key went down since the last [`begin_frame`](Self::begin_frame).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn button_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }

    fn shift_held(&self) -> bool {
        self.key_held(KeyCode::ShiftLeft) || self.key_held(KeyCode::ShiftRight)
    }

    /// Cursor position normalized to `[0, 1]`, y pointing down.
    pub fn cursor_normalized(&self) -> Option<Vec2> {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            return None;
        }
        let size = Vec2::new(w as f32, h as f32);
        self.cursor.map(|c| (c / size).clamp(Vec2::ZERO, Vec2::ONE))
    }

    /// Hands derived from the pointer. No hands while the cursor is outside.
    pub fn pointer_hands(&self) -> HandState {
        let Some(cursor) = self.cursor_normalized() else {
            return HandState::NONE;
        };
        let pinch = if self.button_held(MouseButton::Left) { 1.0 } else { 0.0 };
        let right = HandInfo::new(cursor.x, cursor.y, pinch);
        let left = self
            .shift_held()
            .then(|| HandInfo::new(1.0 - cursor.x, cursor.y, pinch));
        HandState {
            left,
            right: Some(right),
        }
    }

    /// Clear per-frame events. Call once the frame has consumed them.
    pub(crate) fn begin_frame(&mut self) {
        self.keys_pressed.clear();
    }

    pub(crate) fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Process a winit window event.
    pub(crate) fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.key_event(key, event.state);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.buttons_held.insert(*button);
                }
                ElementState::Released => {
                    self.buttons_held.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.buttons_held.clear();
            }
            _ => {}
        }
    }

    fn key_event(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // No repeat events while held.
                if self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }
}
