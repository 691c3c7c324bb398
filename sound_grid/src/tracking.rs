//! Hand detectors — LeapMotion hardware or a mouse-driven simulation.
//!
//! A detector runs on its own thread and delivers a fresh
//! `Vec<HandObservation>` over an `mpsc` channel whenever it has one, at
//! whatever cadence it likes.  The session drains the channel each frame
//! and keeps only the latest accepted set; consumers never learn which
//! detector produced the data.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::hand::{HandObservation, Joint, Point};

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver hand observations over a channel.
pub trait HandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<Vec<HandObservation>>);
}

/// Spawn a hand source on its own thread and return the receiving end.
pub fn spawn_hand_source<H: HandSource>(source: H) -> Receiver<Vec<HandObservation>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — mouse/keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Cursor position on the canvas, sent once per rendered frame.
    Pointer { x: f32, y: f32 },
    /// Cursor left the window: no hands in view.
    PointerLost,
    /// Fist key held / released.
    Fist(bool),
    /// Second hand on / off.
    SecondHand(bool),
}

/// Turns [`SimInput`] into synthetic hand observations.
///
/// The cursor marks where the interaction should land on screen.  Since
/// the interpreter mirrors x, the synthetic keypoints are emitted in
/// un-mirrored camera space so the two flips cancel out.
pub struct SimHandSource {
    pub rx: Receiver<SimInput>,
    pub canvas_width: f32,
}

/// Fingertip offsets (dx, dy) from the index tip for an open hand.
const OPEN_SPREAD: [(Joint, f32, f32); 4] = [
    (Joint::ThumbTip,  -70.0,  90.0),
    (Joint::MiddleTip,  22.0,  -6.0),
    (Joint::RingTip,    42.0,   8.0),
    (Joint::PinkyTip,   60.0,  30.0),
];

/// A plausible hand with its (raw) index fingertip at (`x`, `y`).
pub fn synthetic_hand(x: f32, y: f32, fist: bool) -> HandObservation {
    let tip = Point::new(x, y);
    if fist {
        let wrist = Point::new(x, y + 30.0);
        let mut hand = HandObservation::new()
            .with(Joint::Wrist, wrist)
            .with(Joint::IndexTip, tip);
        for (i, &(joint, _, _)) in OPEN_SPREAD.iter().enumerate() {
            hand.set(joint, Point::new(x - 15.0 + 10.0 * i as f32, y + 15.0));
        }
        hand
    } else {
        let mut hand = HandObservation::new()
            .with(Joint::Wrist, Point::new(x + 10.0, y + 160.0))
            .with(Joint::IndexTip, tip);
        for &(joint, dx, dy) in &OPEN_SPREAD {
            hand.set(joint, Point::new(x + dx, y + dy));
        }
        hand
    }
}

impl SimHandSource {
    fn hands_at(&self, x: f32, y: f32, fist: bool, second: bool) -> Vec<HandObservation> {
        let raw_x = self.canvas_width - x;
        let mut hands = vec![synthetic_hand(raw_x, y, fist)];
        if second {
            // Mirror image of the first hand across the canvas centre.
            hands.push(synthetic_hand(x, y, false));
        }
        hands
    }
}

impl HandSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<Vec<HandObservation>>) {
        let mut fist   = false;
        let mut second = false;
        for input in &self.rx {
            let hands = match input {
                SimInput::Pointer { x, y }   => self.hands_at(x, y, fist, second),
                SimInput::PointerLost        => Vec::new(),
                SimInput::Fist(held)         => { fist = held;   continue; }
                SimInput::SecondHand(on)     => { second = on;   continue; }
            };
            if tx.send(hands).is_err() { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Leap coordinates are millimetres above the device; the interaction box
/// `±LEAP_HALF_SPAN` × `LEAP_Y_RANGE` is stretched over the canvas.  The
/// device looks up from below, so its x axis is flipped here to match the
/// camera convention the interpreter mirrors.
#[cfg(feature = "leap")]
pub struct LeapHandSource {
    pub canvas_width:  f32,
    pub canvas_height: f32,
}

#[cfg(feature = "leap")]
const LEAP_HALF_SPAN: f32 = 200.0;
#[cfg(feature = "leap")]
const LEAP_Y_RANGE: (f32, f32) = (100.0, 400.0);

/// Map a Leap (x, y) in mm to raw camera-space canvas coordinates.
#[cfg(feature = "leap")]
fn leap_to_canvas(x_mm: f32, y_mm: f32, width: f32, height: f32) -> Point {
    let u = (x_mm + LEAP_HALF_SPAN) / (2.0 * LEAP_HALF_SPAN);
    let (lo, hi) = LEAP_Y_RANGE;
    let v = (y_mm - lo) / (hi - lo);
    Point::new(width * (1.0 - u), height * (1.0 - v))
}

#[cfg(feature = "leap")]
impl LeapHandSource {
    fn observe(&self, hand: &leaprs::Hand) -> HandObservation {
        let digits: Vec<_> = hand.digits().collect();
        let mut obs = HandObservation::new();
        if digits.len() < 5 {
            return obs;
        }
        let map = |x: f32, y: f32| leap_to_canvas(x, y, self.canvas_width, self.canvas_height);

        // The middle metacarpal's base sits at the wrist.
        let wrist = digits[2].metacarpal().prev_joint();
        obs.set(Joint::Wrist, map(wrist.x, wrist.y));
        for (digit, &joint) in digits.iter().zip(Joint::FINGERTIPS.iter()) {
            let tip = digit.distal().next_joint();
            obs.set(joint, map(tip.x, tip.y));
        }
        obs
    }
}

#[cfg(feature = "leap")]
impl HandSource for LeapHandSource {
    fn run(self: Box<Self>, tx: Sender<Vec<HandObservation>>) {
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                log::error!("Failed to create LeapC connection: {:?}", e);
                return;
            }
        };
        if let Err(e) = connection.open() {
            log::error!("Failed to open LeapMotion device: {:?}", e);
            return;
        }
        log::info!("LeapMotion connection open");

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };
            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<HandObservation> = frame.hands()
                    .map(|h| self.observe(&h))
                    .collect();
                if tx.send(hands).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{detect_fist, mirror_x, FIST_THRESHOLD};

    #[test]
    fn synthetic_open_hand_is_not_fist() {
        let h = synthetic_hand(300.0, 300.0, false);
        assert!(!detect_fist(&h, FIST_THRESHOLD));
        assert_eq!(h.get(Joint::IndexTip), Some(Point::new(300.0, 300.0)));
    }

    #[test]
    fn synthetic_fist_is_fist() {
        assert!(detect_fist(&synthetic_hand(300.0, 300.0, true), FIST_THRESHOLD));
    }

    #[test]
    fn sim_pointer_lands_under_cursor() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_hand_source(SimHandSource { rx: sim_rx, canvas_width: 800.0 });
        sim_tx.send(SimInput::Pointer { x: 120.0, y: 40.0 }).unwrap();
        let hands = rx.recv().unwrap();
        assert_eq!(hands.len(), 1);
        let tip = hands[0].get(Joint::IndexTip).unwrap();
        assert_eq!(mirror_x(tip.x, 800.0), 120.0);
        assert_eq!(tip.y, 40.0);
    }

    #[test]
    fn sim_modifiers_apply_to_following_frames() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_hand_source(SimHandSource { rx: sim_rx, canvas_width: 800.0 });
        sim_tx.send(SimInput::Fist(true)).unwrap();
        sim_tx.send(SimInput::SecondHand(true)).unwrap();
        sim_tx.send(SimInput::Pointer { x: 200.0, y: 200.0 }).unwrap();
        let hands = rx.recv().unwrap();
        assert_eq!(hands.len(), 2);
        assert!(detect_fist(&hands[0], FIST_THRESHOLD));
        assert!(!detect_fist(&hands[1], FIST_THRESHOLD));
        let second = hands[1].get(Joint::IndexTip).unwrap();
        assert_eq!(mirror_x(second.x, 800.0), 600.0);

        sim_tx.send(SimInput::PointerLost).unwrap();
        assert!(rx.recv().unwrap().is_empty());
    }

    #[test]
    fn sim_thread_exits_when_input_closes() {
        let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
        let rx = spawn_hand_source(SimHandSource { rx: sim_rx, canvas_width: 800.0 });
        drop(sim_tx);
        assert!(rx.recv().is_err());
    }

    #[cfg(feature = "leap")]
    #[test]
    fn leap_box_maps_onto_canvas() {
        let centre = leap_to_canvas(0.0, 250.0, 800.0, 600.0);
        assert_eq!(centre, Point::new(400.0, 300.0));
        let corner = leap_to_canvas(-LEAP_HALF_SPAN, LEAP_Y_RANGE.1, 800.0, 600.0);
        assert_eq!(corner, Point::new(800.0, 0.0));
    }
}
