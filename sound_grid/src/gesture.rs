//! Gesture interpretation: hand keypoints → marker targets and sound layers.
//!
//! Once per frame [`GestureInterpreter::interpret`] turns the latest hand
//! observations into three kinds of decisions:
//!
//! | Observation | Effect |
//! |---|---|
//! | no hands | every marker off, every layer fades out |
//! | any hand closed in a fist | same as no hands (panic reset) |
//! | index fingertip within radius of a marker | marker on, in its group colour |
//! | index fingertip x position | selects one layer per hand (left → right across the canvas) |
//! | layer on but selected by no hand | layer fades out |
//!
//! The interaction point is the index fingertip mirrored horizontally, so
//! the canvas behaves like a mirror in front of the person.

use crate::hand::{HandObservation, Joint, Point};
use crate::marker::{group_color, MarkerGrid};
use crate::sound::SoundBank;

/// Fingertip-to-wrist distance below which a hand counts as a fist.
///
/// Tuned for a roughly 1200 px wide canvas with a hand at arm's length;
/// scale it with resolution or expected hand size.
pub const FIST_THRESHOLD: f32 = 50.0;

/// Distance within which a fingertip lights a marker.
pub const ACTIVATION_RADIUS: f32 = 100.0;

// ════════════════════════════════════════════════════════════════════════════
// Pure helpers
// ════════════════════════════════════════════════════════════════════════════

/// True only if the wrist and all five fingertips are present and every
/// fingertip is closer than `threshold` to the wrist.
pub fn detect_fist(hand: &HandObservation, threshold: f32) -> bool {
    let Ok(wrist) = hand.require(Joint::Wrist) else { return false };
    Joint::FINGERTIPS.iter().all(|&tip| {
        hand.require(tip).map_or(false, |p| p.distance(wrist) < threshold)
    })
}

pub fn mirror_x(raw_x: f32, canvas_width: f32) -> f32 {
    canvas_width - raw_x
}

/// Map a mirrored x position linearly onto `0..layer_count`, clamped.
pub fn sound_index(mirrored_x: f32, canvas_width: f32, layer_count: usize) -> usize {
    if layer_count == 0 || !(canvas_width > 0.0) {
        return 0;
    }
    let idx = (mirrored_x / canvas_width * layer_count as f32).floor();
    if !(idx >= 0.0) {
        return 0; // negative or NaN
    }
    (idx as usize).min(layer_count - 1)
}

// ════════════════════════════════════════════════════════════════════════════
// Interpretation — outcome of one cycle
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum Interpretation {
    /// No hand observed.
    NoHands,
    /// At least one hand closed; everything reset.
    Fist,
    /// Normal tracking: the mirrored fingertip of each usable hand and the
    /// layer it selected, in hand order.
    Tracking { points: Vec<Point>, selected: Vec<usize> },
}

// ════════════════════════════════════════════════════════════════════════════
// GestureInterpreter
// ════════════════════════════════════════════════════════════════════════════

pub struct GestureInterpreter {
    canvas_width:      f32,
    activation_radius: f32,
    fist_threshold:    f32,
    /// Result of the previous cycle, used to log transitions once.
    last: Interpretation,
}

impl GestureInterpreter {
    pub fn new(canvas_width: f32) -> Self {
        GestureInterpreter {
            canvas_width,
            activation_radius: ACTIVATION_RADIUS,
            fist_threshold:    FIST_THRESHOLD,
            last: Interpretation::NoHands,
        }
    }

    pub fn with_activation_radius(mut self, radius: f32) -> Self {
        self.activation_radius = radius;
        self
    }

    pub fn with_fist_threshold(mut self, threshold: f32) -> Self {
        self.fist_threshold = threshold;
        self
    }

    pub fn last(&self) -> &Interpretation {
        &self.last
    }

    /// Run one interpretation cycle against the grid and the bank.
    pub fn interpret(
        &mut self,
        hands: &[HandObservation],
        grid:  &mut MarkerGrid,
        bank:  &mut SoundBank,
        now:   f64,
    ) -> &Interpretation {
        let outcome = if hands.is_empty() {
            Self::reset(grid, bank, now);
            Interpretation::NoHands
        } else if hands.iter().any(|h| detect_fist(h, self.fist_threshold)) {
            if self.last != Interpretation::Fist {
                log::info!("Fist detected — stopping all layers");
            }
            Self::reset(grid, bank, now);
            Interpretation::Fist
        } else {
            self.track(hands, grid, bank, now)
        };

        if let Interpretation::Tracking { points, .. } = &outcome {
            let before = match &self.last {
                Interpretation::Tracking { points, .. } => points.len(),
                _ => 0,
            };
            if points.len() != before {
                log::debug!("{} hand(s) tracked", points.len());
            }
        }

        if matches!(outcome, Interpretation::NoHands)
            && !matches!(self.last, Interpretation::NoHands)
        {
            log::debug!("Hands lost — resetting grid");
        }
        self.last = outcome;
        &self.last
    }

    fn reset(grid: &mut MarkerGrid, bank: &mut SoundBank, now: f64) {
        grid.reset_all();
        bank.deactivate_all(now);
    }

    fn track(
        &self,
        hands: &[HandObservation],
        grid:  &mut MarkerGrid,
        bank:  &mut SoundBank,
        now:   f64,
    ) -> Interpretation {
        // Interaction points; hands without a usable index tip are skipped.
        let points: Vec<Point> = hands.iter()
            .filter_map(|h| match h.require(Joint::IndexTip) {
                Ok(tip) => Some(Point::new(mirror_x(tip.x, self.canvas_width), tip.y)),
                Err(anomaly) => {
                    log::trace!("skipping hand: {}", anomaly);
                    None
                }
            })
            .collect();

        // Proximity: a marker stays on while any hand is within radius.
        let decisions: Vec<(bool, usize)> = grid.markers().iter()
            .map(|m| {
                let pos = Point::new(m.x(), m.y());
                let near = points.iter().any(|p| p.distance(pos) < self.activation_radius);
                (near, m.sound_group())
            })
            .collect();
        for (i, (near, group)) in decisions.into_iter().enumerate() {
            grid.set_activation(i, near, group_color(group));
        }

        // Selection: one layer per hand.
        let selected: Vec<usize> = points.iter()
            .map(|p| sound_index(p.x, self.canvas_width, bank.layer_count()))
            .collect();
        for &group in &selected {
            bank.activate(group);
        }

        // Release layers no hand points at any more.
        for group in bank.active_groups() {
            if !selected.contains(&group) {
                bank.schedule_deactivate(group, now);
            }
        }

        Interpretation::Tracking { points, selected }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
