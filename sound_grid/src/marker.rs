//! The marker grid: a fixed lattice of circles, one per interaction zone.
//!
//! Each marker has a *target* state (active flag, target colour) written by
//! the gesture interpreter and a *current* state (size, colour) that eases
//! toward the target every frame in [`MarkerGrid::advance`].  Rendering
//! only reads the current state.

use crate::canvas::Rgb;
use crate::error::{Result, SoundGridError};

// ════════════════════════════════════════════════════════════════════════════
// Palette — sound group → highlight colour
// ════════════════════════════════════════════════════════════════════════════

/// Highlight colours, one per sound group; cycles when there are more groups.
pub const SOUND_COLORS: [Rgb; 12] = [
    Rgb::new(255.0, 100.0, 100.0), // red
    Rgb::new(100.0, 255.0, 100.0), // green
    Rgb::new(100.0, 100.0, 255.0), // blue
    Rgb::new(255.0, 255.0, 100.0), // yellow
    Rgb::new(255.0, 100.0, 255.0), // magenta
    Rgb::new(100.0, 255.0, 255.0), // cyan
    Rgb::new(255.0, 165.0,   0.0), // orange
    Rgb::new(128.0,   0.0, 128.0), // purple
    Rgb::new(  0.0, 255.0, 127.0), // spring green
    Rgb::new( 70.0, 130.0, 180.0), // steel blue
    Rgb::new(255.0, 182.0, 193.0), // light pink
    Rgb::new(240.0, 230.0, 140.0), // khaki
];

pub fn group_color(group: usize) -> Rgb {
    SOUND_COLORS[group % SOUND_COLORS.len()]
}

/// Default growth of an active marker over its base size.
pub const EXPAND_OFFSET: f32 = 25.0;

/// Upper bound on lattice size; finer spacings are a configuration error.
pub const MAX_MARKERS: usize = 100_000;

// ════════════════════════════════════════════════════════════════════════════
// Smoothing
// ════════════════════════════════════════════════════════════════════════════

/// Exponential smoothing factors applied on each [`MarkerGrid::advance`].
///
/// With `reference_fps = None` the factors are applied once per call, so the
/// perceived easing speed depends on the frame rate.  Setting a reference
/// rate rescales each factor by the elapsed `dt` so a 30 fps and a 120 fps
/// host ease at the same wall-clock speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Smoothing {
    pub color: f32,
    pub size:  f32,
    pub reference_fps: Option<f32>,
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing { color: 0.1, size: 0.2, reference_fps: None }
    }
}

impl Smoothing {
    fn factor(base: f32, dt: f32, reference_fps: Option<f32>) -> f32 {
        match reference_fps {
            None => base,
            Some(fps) => {
                let frames = (dt * fps).max(0.0);
                (1.0 - (1.0 - base).powf(frames)).clamp(0.0, 1.0)
            }
        }
    }

    pub fn color_factor(&self, dt: f32) -> f32 {
        Self::factor(self.color, dt, self.reference_fps)
    }

    pub fn size_factor(&self, dt: f32) -> f32 {
        Self::factor(self.size, dt, self.reference_fps)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Marker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    x: f32,
    y: f32,
    sound_group: usize,
    active: bool,
    current_size:  f32,
    current_color: Rgb,
    target_color:  Rgb,
}

impl Marker {
    fn new(x: f32, y: f32, size: f32) -> Self {
        Marker {
            x,
            y,
            sound_group:   0,
            active:        false,
            current_size:  size,
            current_color: Rgb::WHITE,
            target_color:  Rgb::WHITE,
        }
    }

    pub fn x(&self) -> f32               { self.x }
    pub fn y(&self) -> f32               { self.y }
    pub fn sound_group(&self) -> usize   { self.sound_group }
    pub fn is_active(&self) -> bool      { self.active }
    pub fn current_size(&self) -> f32    { self.current_size }
    pub fn current_color(&self) -> Rgb   { self.current_color }
    pub fn target_color(&self) -> Rgb    { self.target_color }
}

// ════════════════════════════════════════════════════════════════════════════
// MarkerGrid
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct MarkerGrid {
    markers:   Vec<Marker>,
    base_size: f32,
    expanded_size: f32,
    smoothing: Smoothing,
}

impl MarkerGrid {
    /// Lay markers on a regular lattice starting at `spacing / 2` and
    /// stepping by `spacing` while inside the canvas.  Markers are ordered
    /// column by column (x outer, y inner).
    pub fn build(width: f32, height: f32, spacing: f32, base_size: f32) -> Result<Self> {
        if !(spacing > 0.0) || !spacing.is_finite() {
            return Err(SoundGridError::configuration(format!(
                "marker spacing must be > 0, got {}", spacing
            )));
        }
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(SoundGridError::configuration(format!(
                "canvas must have positive size, got {}×{}", width, height
            )));
        }
        if !(base_size >= 0.0) {
            return Err(SoundGridError::configuration(format!(
                "marker base size must be ≥ 0, got {}", base_size
            )));
        }

        // Integer stepping avoids float drift on large canvases.
        let count = |extent: f32| ((extent - spacing / 2.0) / spacing).ceil().max(0.0) as usize;
        let cols = count(width);
        let rows = count(height);
        let total = cols.checked_mul(rows).filter(|&n| n <= MAX_MARKERS).ok_or_else(|| {
            SoundGridError::configuration(format!(
                "marker spacing {} gives a {}×{} lattice, more than {} markers",
                spacing, cols, rows, MAX_MARKERS
            ))
        })?;

        let mut markers = Vec::with_capacity(total);
        for c in 0..cols {
            let x = spacing / 2.0 + c as f32 * spacing;
            for r in 0..rows {
                let y = spacing / 2.0 + r as f32 * spacing;
                markers.push(Marker::new(x, y, base_size));
            }
        }

        Ok(MarkerGrid {
            markers,
            base_size,
            expanded_size: base_size + EXPAND_OFFSET,
            smoothing: Smoothing::default(),
        })
    }

    pub fn with_expand(mut self, offset: f32) -> Self {
        self.expanded_size = self.base_size + offset;
        self
    }

    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Bind each marker to its sound group.  Done once at startup.
    pub fn assign_sound_groups(&mut self, table: &[usize]) -> Result<()> {
        if table.len() != self.markers.len() {
            return Err(SoundGridError::configuration(format!(
                "assignment table has {} entries for {} markers",
                table.len(), self.markers.len()
            )));
        }
        for (m, &g) in self.markers.iter_mut().zip(table) {
            m.sound_group = g;
        }
        Ok(())
    }

    pub fn markers(&self) -> &[Marker] { &self.markers }
    pub fn len(&self) -> usize         { self.markers.len() }
    pub fn is_empty(&self) -> bool     { self.markers.is_empty() }
    pub fn base_size(&self) -> f32     { self.base_size }
    pub fn expanded_size(&self) -> f32 { self.expanded_size }

    /// Switch one marker on (toward `highlight`) or off (toward white).
    pub fn set_activation(&mut self, index: usize, active: bool, highlight: Rgb) {
        let Some(m) = self.markers.get_mut(index) else {
            log::warn!("set_activation: marker {} out of range (grid has {})",
                       index, self.markers.len());
            return;
        };
        m.active = active;
        m.target_color = if active { highlight } else { Rgb::WHITE };
    }

    /// Every marker inactive, heading back to white.
    pub fn reset_all(&mut self) {
        for m in &mut self.markers {
            m.active = false;
            m.target_color = Rgb::WHITE;
        }
    }

    /// Ease current size and colour toward their targets.
    pub fn advance(&mut self, dt: f32) {
        let kc = self.smoothing.color_factor(dt);
        let ks = self.smoothing.size_factor(dt);
        for m in &mut self.markers {
            m.current_color = m.current_color.lerp(m.target_color, kc);
            let target = if m.active { self.expanded_size } else { self.base_size };
            m.current_size += (target - m.current_size) * ks;
        }
    }

    pub fn active_count(&self) -> usize {
        self.markers.iter().filter(|m| m.active).count()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
