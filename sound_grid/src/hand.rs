//! Per-frame hand observations as delivered by a hand detector.
//!
//! An observation is a bag of named keypoints in canvas coordinates
//! (pixels, origin top-left, x **not** yet mirrored).  Detectors may omit
//! joints they could not see; consumers ask for the joints they need with
//! [`HandObservation::require`] and treat a [`TrackingAnomaly`] as "no
//! signal" for that hand.

use std::collections::HashMap;
use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    /// Planar Euclidean distance.
    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Joint
// ════════════════════════════════════════════════════════════════════════════

/// The keypoints the interpreter relies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Joint {
    Wrist,
    ThumbTip,
    IndexTip,
    MiddleTip,
    RingTip,
    PinkyTip,
}

impl Joint {
    /// The five fingertips, thumb first.
    pub const FINGERTIPS: [Joint; 5] = [
        Joint::ThumbTip,
        Joint::IndexTip,
        Joint::MiddleTip,
        Joint::RingTip,
        Joint::PinkyTip,
    ];

    /// Keypoint name as used by common hand-pose models.
    pub fn name(self) -> &'static str {
        match self {
            Joint::Wrist     => "wrist",
            Joint::ThumbTip  => "thumb_tip",
            Joint::IndexTip  => "index_finger_tip",
            Joint::MiddleTip => "middle_finger_tip",
            Joint::RingTip   => "ring_finger_tip",
            Joint::PinkyTip  => "pinky_finger_tip",
        }
    }

    /// Reverse of [`Joint::name`]; unknown names are ignored by detectors.
    pub fn from_name(name: &str) -> Option<Joint> {
        match name {
            "wrist"             => Some(Joint::Wrist),
            "thumb_tip"         => Some(Joint::ThumbTip),
            "index_finger_tip"  => Some(Joint::IndexTip),
            "middle_finger_tip" => Some(Joint::MiddleTip),
            "ring_finger_tip"   => Some(Joint::RingTip),
            "pinky_finger_tip" | "pinky_tip" => Some(Joint::PinkyTip),
            _ => None,
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackingAnomaly
// ════════════════════════════════════════════════════════════════════════════

/// Bad tracking data for one hand in one frame.  Always recovered locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingAnomaly {
    MissingJoint(Joint),
    NonFiniteCoordinate(Joint),
}

impl fmt::Display for TrackingAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingAnomaly::MissingJoint(j)        => write!(f, "missing joint {}", j),
            TrackingAnomaly::NonFiniteCoordinate(j) => write!(f, "non-finite coordinate for {}", j),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandObservation {
    keypoints: HashMap<Joint, Point>,
}

impl HandObservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, joint: Joint, point: Point) -> Self {
        self.keypoints.insert(joint, point);
        self
    }

    pub fn set(&mut self, joint: Joint, point: Point) {
        self.keypoints.insert(joint, point);
    }

    pub fn get(&self, joint: Joint) -> Option<Point> {
        self.keypoints.get(&joint).copied()
    }

    /// A joint that must be present and finite.
    pub fn require(&self, joint: Joint) -> Result<Point, TrackingAnomaly> {
        let p = self.get(joint).ok_or(TrackingAnomaly::MissingJoint(joint))?;
        if p.is_finite() {
            Ok(p)
        } else {
            Err(TrackingAnomaly::NonFiniteCoordinate(joint))
        }
    }
}

impl FromIterator<(Joint, Point)> for HandObservation {
    fn from_iter<I: IntoIterator<Item = (Joint, Point)>>(iter: I) -> Self {
        HandObservation { keypoints: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_planar() {
        assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn joint_names_round_trip() {
        for j in Joint::FINGERTIPS.iter().copied().chain([Joint::Wrist]) {
            assert_eq!(Joint::from_name(j.name()), Some(j));
        }
        assert_eq!(Joint::from_name("pinky_tip"), Some(Joint::PinkyTip));
        assert_eq!(Joint::from_name("elbow"), None);
    }

    #[test]
    fn require_reports_missing_joint() {
        let hand = HandObservation::new().with(Joint::Wrist, Point::new(1.0, 2.0));
        assert_eq!(hand.require(Joint::Wrist), Ok(Point::new(1.0, 2.0)));
        assert_eq!(
            hand.require(Joint::IndexTip),
            Err(TrackingAnomaly::MissingJoint(Joint::IndexTip))
        );
    }

    #[test]
    fn require_rejects_nan() {
        let hand = HandObservation::new().with(Joint::IndexTip, Point::new(f32::NAN, 0.0));
        assert_eq!(
            hand.require(Joint::IndexTip),
            Err(TrackingAnomaly::NonFiniteCoordinate(Joint::IndexTip))
        );
    }
}
