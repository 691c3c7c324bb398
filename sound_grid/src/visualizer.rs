//! Window, keyboard and mouse, using `minifb`.
//!
//! The window is fixed at the configured canvas size and cannot be
//! resized, so render passes always see the same dimensions.  Each frame
//! the session renders into a [`FrameCanvas`] which is then blitted with
//! `update_with_buffer`.
//!
//! In simulation mode the mouse and keyboard also drive the synthetic hand
//! detector through a [`SimInput`] channel.

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use crate::canvas::FrameCanvas;
use crate::error::{Result, SoundGridError};
use crate::tracking::SimInput;

const TITLE: &str = "Sound Grid";

/// Control events for the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    TogglePause,
    Quit,
}

pub struct Visualizer {
    window: Window,
    canvas: FrameCanvas,
    /// `None` when hands come from real hardware.
    sim_tx: Option<Sender<SimInput>>,

    fist_held:   bool,
    second_hand: bool,
    pointer_in:  bool,
}

impl Visualizer {
    pub fn new(
        width:      usize,
        height:     usize,
        target_fps: u32,
        sim_tx:     Option<Sender<SimInput>>,
    ) -> Result<Self> {
        let mut window = Window::new(
            TITLE,
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| SoundGridError::Window { reason: e.to_string() })?;

        let frame = Duration::from_secs_f64(1.0 / f64::from(target_fps.max(1)));
        window.limit_update_rate(Some(frame));

        Ok(Visualizer {
            window,
            canvas: FrameCanvas::new(width, height),
            sim_tx,
            fist_held:   false,
            second_hand: false,
            pointer_in:  false,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Read keyboard and mouse.  Returns control events for the run loop
    /// and forwards hand-simulation input on the side.
    pub fn poll_input(&mut self) -> Vec<WindowEvent> {
        let mut events = Vec::new();
        if !self.window.is_open() {
            events.push(WindowEvent::Quit);
            return events;
        }

        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            events.push(WindowEvent::Quit);
        }
        if self.window.is_key_pressed(Key::Space, KeyRepeat::No) {
            events.push(WindowEvent::TogglePause);
        }

        if self.sim_tx.is_some() {
            self.poll_simulation();
        }
        events
    }

    fn poll_simulation(&mut self) {
        let mut inputs = Vec::new();

        let fist = self.window.is_key_down(Key::F);
        if fist != self.fist_held {
            self.fist_held = fist;
            inputs.push(SimInput::Fist(fist));
        }
        if self.window.is_key_pressed(Key::H, KeyRepeat::No) {
            self.second_hand = !self.second_hand;
            inputs.push(SimInput::SecondHand(self.second_hand));
        }

        match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((x, y)) => {
                self.pointer_in = true;
                inputs.push(SimInput::Pointer { x, y });
            }
            None if self.pointer_in => {
                self.pointer_in = false;
                inputs.push(SimInput::PointerLost);
            }
            None => {}
        }

        if let Some(tx) = &self.sim_tx {
            for input in inputs {
                if tx.send(input).is_err() {
                    log::warn!("simulated hand source has stopped");
                    self.sim_tx = None;
                    break;
                }
            }
        }
    }

    pub fn canvas_mut(&mut self) -> &mut FrameCanvas {
        &mut self.canvas
    }

    /// Blit the canvas to the window.
    pub fn present(&mut self) {
        let (w, h) = self.canvas.dims();
        if let Err(e) = self.window.update_with_buffer(self.canvas.buffer(), w, h) {
            log::warn!("window update failed: {}", e);
        }
    }
}
