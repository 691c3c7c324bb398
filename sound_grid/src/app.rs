//! Top-level run loop.
//!
//! Wires a hand source, a sound source and the window to one
//! [`SessionController`] and drives it frame by frame until the window
//! closes or the user quits.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use crate::clock::FrameClock;
use crate::config::InstallationConfig;
use crate::error::Result;
use crate::hand::HandObservation;
use crate::midi::{MidiSoundSource, NullSoundSource};
use crate::session::SessionController;
use crate::sound::SoundSource;
use crate::tracking::{spawn_hand_source, SimInput};
use crate::visualizer::{Visualizer, WindowEvent};

#[cfg(not(feature = "leap"))]
use crate::tracking::SimHandSource;
#[cfg(feature = "leap")]
use crate::tracking::LeapHandSource;

type HandFeedRx = Receiver<Vec<HandObservation>>;

/// MIDI output when one can be opened, otherwise a silent stand-in.
fn open_sound_source(cfg: &InstallationConfig) -> Box<dyn SoundSource> {
    match MidiSoundSource::open(cfg.midi_port_hint.as_deref()) {
        Some(midi) => Box::new(midi),
        None => {
            log::warn!("Continuing without sound");
            Box::new(NullSoundSource)
        }
    }
}

#[cfg(not(feature = "leap"))]
fn start_hands(cfg: &InstallationConfig) -> (HandFeedRx, Option<Sender<SimInput>>) {
    let (sim_tx, sim_rx) = std::sync::mpsc::channel::<SimInput>();
    let rx = spawn_hand_source(SimHandSource {
        rx: sim_rx,
        canvas_width: cfg.canvas_width as f32,
    });
    log::info!("Hands: mouse simulation (F = fist, H = second hand)");
    (rx, Some(sim_tx))
}

#[cfg(feature = "leap")]
fn start_hands(cfg: &InstallationConfig) -> (HandFeedRx, Option<Sender<SimInput>>) {
    let rx = spawn_hand_source(LeapHandSource {
        canvas_width:  cfg.canvas_width as f32,
        canvas_height: cfg.canvas_height as f32,
    });
    log::info!("Hands: LeapMotion");
    (rx, None)
}

pub fn run(cfg: InstallationConfig) -> Result<()> {
    cfg.validate()?;

    // ── Sound ─────────────────────────────────────────────────────────────
    let mut sound = open_sound_source(&cfg);
    log::info!("Sound output: {}", sound.describe());

    // ── Session (starts paused) ───────────────────────────────────────────
    let mut session = SessionController::new(&cfg, sound.as_mut())?;

    // ── Hands + window ────────────────────────────────────────────────────
    let (hands_rx, sim_tx) = start_hands(&cfg);
    let mut vis = Visualizer::new(cfg.canvas_width, cfg.canvas_height, cfg.target_fps, sim_tx)?;

    let mut clock = FrameClock::new();
    let mut hands_live = true;

    // ── Main loop ─────────────────────────────────────────────────────────
    'frames: while vis.is_open() {
        // 1. Window input
        for event in vis.poll_input() {
            match event {
                WindowEvent::Quit => break 'frames,
                WindowEvent::TogglePause => {
                    session.toggle(clock.now());
                }
            }
        }

        // 2. Drain detector results
        while hands_live {
            match hands_rx.try_recv() {
                Ok(hands) => { session.on_hands(hands); }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Hand source disconnected");
                    hands_live = false;
                }
            }
        }

        // 3. Per-frame logic
        let (now, dt) = clock.tick();
        session.update(now, dt);

        // 4. Render
        session.render(vis.canvas_mut());
        vis.present();
    }

    session.shutdown();
    log::info!("Goodbye");
    Ok(())
}
