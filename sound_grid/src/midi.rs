//! Sound layers rendered by a MIDI synthesiser.
//!
//! Each [`LayerAsset`] becomes one MIDI channel: a program change selects
//! the instrument, a held note-on is the "loop", note-off is the stop, and
//! channel volume (CC 7) carries the fade.  All voices share a single
//! output connection.
//!
//! When no MIDI output is available the app falls back to
//! [`NullSoundSource`], which tracks state but makes no sound.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::{Result, SoundGridError};
use crate::sound::{LayerAsset, SoundHandle, SoundSource};

/// Every channel except 10 (index 9), which GM reserves for drums.
const MELODIC_CHANNELS: [u8; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 14, 15];

/// Volume ramps are stepped at roughly this interval.
const RAMP_STEP: Duration = Duration::from_millis(20);

type SharedConn = Arc<Mutex<midir::MidiOutputConnection>>;

fn send(conn: &SharedConn, bytes: &[u8]) {
    if let Ok(mut c) = conn.lock() {
        let _ = c.send(bytes);
    }
}

fn cc7(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * 127.0).round() as u8
}

// ════════════════════════════════════════════════════════════════════════════
// MidiSoundSource
// ════════════════════════════════════════════════════════════════════════════

pub struct MidiSoundSource {
    conn:         SharedConn,
    port_name:    String,
    next_channel: usize,
}

impl MidiSoundSource {
    /// Open a MIDI output port.  A port whose name contains `port_hint`
    /// wins; otherwise a soft-synth is preferred, then the first port.
    /// Returns `None` (after logging why) when nothing can be opened.
    pub fn open(port_hint: Option<&str>) -> Option<Self> {
        let midi_out = match midir::MidiOutput::new("sound_grid") {
            Ok(m)  => m,
            Err(e) => {
                log::warn!("MIDI init error: {}", e);
                return None;
            }
        };

        let ports = midi_out.ports();
        if ports.is_empty() {
            log::warn!("No MIDI output ports found. Install a MIDI synthesiser such as:");
            log::warn!("  • macOS: built-in CoreMIDI (always available)");
            log::warn!("  • Linux: `timidity -iA` or `fluidsynth`");
            log::warn!("  • Windows: built-in GS Wavetable Synth");
            return None;
        }

        let names: Vec<String> = ports.iter()
            .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
            .collect();
        let port_idx = pick_port(&names, port_hint);
        let port_name = names[port_idx].clone();
        log::info!("Opening MIDI port: {}", port_name);

        match midi_out.connect(&ports[port_idx], "sound-grid-layers") {
            Ok(conn) => Some(MidiSoundSource {
                conn: Arc::new(Mutex::new(conn)),
                port_name,
                next_channel: 0,
            }),
            Err(e) => {
                log::warn!("Failed to connect to MIDI port {}: {}", port_name, e);
                None
            }
        }
    }
}

/// Index of the port to use among `names` (non-empty).
fn pick_port(names: &[String], hint: Option<&str>) -> usize {
    if let Some(hint) = hint.map(str::to_lowercase) {
        if let Some(i) = names.iter().position(|n| n.to_lowercase().contains(&hint)) {
            return i;
        }
        log::warn!("No MIDI port matches '{}'", hint);
    }
    names.iter()
        .position(|n| {
            let n = n.to_lowercase();
            n.contains("fluid") || n.contains("timidity") ||
            n.contains("microsoft") || n.contains("gm") ||
            n.contains("synth")
        })
        .unwrap_or(0)
}

impl SoundSource for MidiSoundSource {
    fn load(&mut self, asset: &LayerAsset) -> Result<Box<dyn SoundHandle>> {
        let Some(&channel) = MELODIC_CHANNELS.get(self.next_channel) else {
            return Err(SoundGridError::asset_load(
                &asset.name,
                format!("no free MIDI channel (at most {} layers)", MELODIC_CHANNELS.len()),
            ));
        };
        self.next_channel += 1;

        send(&self.conn, &[0xC0 | channel, asset.program]);
        send(&self.conn, &[0xB0 | channel, 7, 0]);

        Ok(Box::new(MidiVoice {
            conn:     self.conn.clone(),
            channel,
            note:     asset.note,
            velocity: asset.velocity,
            program:  asset.program,
            playing:  false,
            volume:   Arc::new(AtomicU32::new(0f32.to_bits())),
            ramp_gen: Arc::new(AtomicU64::new(0)),
        }))
    }

    fn describe(&self) -> String {
        format!("MIDI port '{}'", self.port_name)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiVoice
// ════════════════════════════════════════════════════════════════════════════

/// One layer on one channel.
struct MidiVoice {
    conn:     SharedConn,
    channel:  u8,
    note:     u8,
    velocity: u8,
    program:  u8,
    playing:  bool,
    /// Current channel volume as f32 bits, shared with the ramp thread.
    volume:   Arc<AtomicU32>,
    /// Bumped by every volume change; a ramp thread exits once superseded.
    ramp_gen: Arc<AtomicU64>,
}

impl MidiVoice {
    fn note_off(&self) {
        send(&self.conn, &[0x80 | self.channel, self.note, 0]);
    }
}

impl SoundHandle for MidiVoice {
    fn loop_playback(&mut self) {
        if self.playing {
            self.note_off();
        }
        send(&self.conn, &[0xC0 | self.channel, self.program]);
        send(&self.conn, &[0x90 | self.channel, self.note, self.velocity]);
        self.playing = true;
    }

    fn stop(&mut self) {
        self.ramp_gen.fetch_add(1, Ordering::SeqCst);
        if self.playing {
            self.note_off();
        }
        self.playing = false;
    }

    fn set_volume(&mut self, level: f32, ramp_seconds: f32) {
        let level = level.clamp(0.0, 1.0);
        let gen = self.ramp_gen.fetch_add(1, Ordering::SeqCst) + 1;

        if ramp_seconds <= 0.0 {
            self.volume.store(level.to_bits(), Ordering::SeqCst);
            send(&self.conn, &[0xB0 | self.channel, 7, cc7(level)]);
            return;
        }

        let conn     = self.conn.clone();
        let volume   = self.volume.clone();
        let ramp_gen = self.ramp_gen.clone();
        let channel  = self.channel;
        let steps    = ((ramp_seconds / RAMP_STEP.as_secs_f32()).ceil() as u32).max(1);
        let step_dur = Duration::from_secs_f32(ramp_seconds / steps as f32);

        thread::spawn(move || {
            let from = f32::from_bits(volume.load(Ordering::SeqCst));
            for i in 1..=steps {
                thread::sleep(step_dur);
                if ramp_gen.load(Ordering::SeqCst) != gen {
                    return;
                }
                let v = from + (level - from) * i as f32 / steps as f32;
                volume.store(v.to_bits(), Ordering::SeqCst);
                send(&conn, &[0xB0 | channel, 7, cc7(v)]);
            }
        });
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Drop for MidiVoice {
    fn drop(&mut self) {
        self.ramp_gen.fetch_add(1, Ordering::SeqCst);
        if self.playing {
            self.note_off();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NullSoundSource — used when no MIDI port is available
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct NullSoundSource;

struct NullVoice {
    playing: bool,
}

impl SoundHandle for NullVoice {
    fn loop_playback(&mut self)                 { self.playing = true;  }
    fn stop(&mut self)                          { self.playing = false; }
    fn set_volume(&mut self, _level: f32, _ramp: f32) {}
    fn is_playing(&self) -> bool                { self.playing }
}

impl SoundSource for NullSoundSource {
    fn load(&mut self, _asset: &LayerAsset) -> Result<Box<dyn SoundHandle>> {
        Ok(Box::new(NullVoice { playing: false }))
    }

    fn describe(&self) -> String {
        "null output (silent)".to_string()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
