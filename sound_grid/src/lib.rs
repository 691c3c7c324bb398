//! # sound_grid
//!
//! Hand-tracked sound installation.  A lattice of circular markers covers
//! the window; wherever a fingertip hovers the nearby markers swell and
//! take on a colour, and the fingertip's horizontal position picks one of a
//! bank of looping sound layers.  Several hands may play several layers at
//! once.  Layers no longer pointed at fade out over half a second.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Index fingertip near a marker | Marker grows and takes its layer's colour |
//! | Fingertip horizontal position | Selects a layer (left edge → first layer) |
//! | Hand leaves / moves to another band | Previous layer fades out |
//! | Fist (all fingertips near the wrist) | Every marker resets, every layer fades out |
//! | No hands | Same as fist |
//!
//! The camera image is mirrored, so x is flipped before both proximity and
//! selection.
//!
//! ## Session
//!
//! Starts **Paused** behind a prompt screen.  `Space` toggles Running;
//! pausing fades out everything that is playing.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: the mouse is the index fingertip.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `Space` | Start / pause |
//! | `F` (hold) | Close the simulated hand into a fist |
//! | `H` | Toggle a second simulated hand, mirrored across the centre |
//! | `Q` / `Escape` | Quit |
//!
//! ## Configuration
//!
//! Defaults live in [`config::InstallationConfig`]; point the
//! `SOUND_GRID_CONFIG` environment variable at a JSON file to override them.
//! Sound layers are General MIDI voices on a MIDI output port.

pub mod error;
pub mod hand;
pub mod canvas;
pub mod clock;
pub mod config;
pub mod marker;
pub mod sound;
pub mod midi;
pub mod gesture;
pub mod tracking;
pub mod scene;
pub mod session;
pub mod visualizer;
pub mod app;
