//! Installation configuration.
//!
//! Defaults reproduce the reference installation: 100 px marker lattice,
//! twelve orchestral layers, 0.5 s fades.  A JSON file named by the
//! `SOUND_GRID_CONFIG` environment variable may override any subset of
//! fields:
//!
//! ```json
//! { "canvas_width": 1920, "canvas_height": 1080, "frame_skip": 2 }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SoundGridError};
use crate::gesture::{ACTIVATION_RADIUS, FIST_THRESHOLD};
use crate::marker::{Smoothing, EXPAND_OFFSET};
use crate::sound::{LayerAsset, FADE_SECONDS};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "SOUND_GRID_CONFIG";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallationConfig {
    /// Window and canvas size in pixels.  Fixed for the session; the
    /// window is not resizable and does not follow the display size.
    pub canvas_width:      usize,
    pub canvas_height:     usize,
    pub marker_spacing:    f32,
    pub marker_base_size:  f32,
    pub marker_expand:     f32,
    pub activation_radius: f32,
    pub fist_threshold:    f32,
    /// Accept every Nth detector result.
    pub frame_skip:        u32,
    pub fade_seconds:      f64,
    pub color_smoothing:   f32,
    pub size_smoothing:    f32,
    /// `None`: smoothing factors apply once per frame regardless of rate.
    pub smoothing_reference_fps: Option<f32>,
    pub target_fps:        u32,
    /// Substring of the preferred MIDI output port name.
    pub midi_port_hint:    Option<String>,
    pub layers:            Vec<LayerAsset>,
}

impl Default for InstallationConfig {
    fn default() -> Self {
        let smoothing = Smoothing::default();
        InstallationConfig {
            canvas_width:      1200,
            canvas_height:     800,
            marker_spacing:    100.0,
            marker_base_size:  50.0,
            marker_expand:     EXPAND_OFFSET,
            activation_radius: ACTIVATION_RADIUS,
            fist_threshold:    FIST_THRESHOLD,
            frame_skip:        3,
            fade_seconds:      FADE_SECONDS,
            color_smoothing:   smoothing.color,
            size_smoothing:    smoothing.size,
            smoothing_reference_fps: smoothing.reference_fps,
            target_fps:        60,
            midi_port_hint:    None,
            layers:            LayerAsset::default_bank(),
        }
    }
}

impl InstallationConfig {
    /// Defaults, or the file named by `SOUND_GRID_CONFIG` when set.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SoundGridError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_json(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: InstallationConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn smoothing(&self) -> Smoothing {
        Smoothing {
            color: self.color_smoothing,
            size:  self.size_smoothing,
            reference_fps: self.smoothing_reference_fps,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(SoundGridError::configuration(reason));

        if self.canvas_width == 0 || self.canvas_height == 0 {
            return fail(format!("canvas must be non-empty, got {}×{}",
                                self.canvas_width, self.canvas_height));
        }
        if !(self.marker_spacing > 0.0) || !self.marker_spacing.is_finite() {
            return fail(format!("marker_spacing must be > 0, got {}", self.marker_spacing));
        }
        for (name, v) in [
            ("marker_base_size",  self.marker_base_size),
            ("marker_expand",     self.marker_expand),
            ("activation_radius", self.activation_radius),
            ("fist_threshold",    self.fist_threshold),
        ] {
            if !(v >= 0.0) || !v.is_finite() {
                return fail(format!("{} must be ≥ 0, got {}", name, v));
            }
        }
        if !(self.fade_seconds >= 0.0) || !self.fade_seconds.is_finite() {
            return fail(format!("fade_seconds must be ≥ 0, got {}", self.fade_seconds));
        }
        if self.frame_skip == 0 {
            return fail("frame_skip must be ≥ 1".to_string());
        }
        if self.target_fps == 0 {
            return fail("target_fps must be ≥ 1".to_string());
        }
        for (name, v) in [("color_smoothing", self.color_smoothing),
                          ("size_smoothing",  self.size_smoothing)] {
            if !(v > 0.0 && v <= 1.0) {
                return fail(format!("{} must be in (0, 1], got {}", name, v));
            }
        }
        if let Some(fps) = self.smoothing_reference_fps {
            if !(fps > 0.0) {
                return fail(format!("smoothing_reference_fps must be > 0, got {}", fps));
            }
        }
        if self.layers.is_empty() {
            return fail("at least one sound layer is required".to_string());
        }
        Ok(())
    }
}
