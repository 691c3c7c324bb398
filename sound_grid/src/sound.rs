//! The sound bank: a fixed set of looping layers with debounced stop.
//!
//! Layers start instantly at full volume and stop with a fade.  A stop is
//! never executed inline: [`SoundBank::schedule_deactivate`] ramps the
//! volume down and queues a [`FadeTask`]; [`SoundBank::process_due`] runs
//! each frame and finalises the tasks whose time has come.
//!
//! ## Re-activation during a fade
//!
//! Every activation episode of a layer carries a generation number.  A fade
//! task remembers the generation it was scheduled for, and when it fires it
//! only stops the layer if that generation is still current.  Activating a
//! fading layer therefore cancels the fade: the volume comes back up, the
//! generation moves on, and the old task is discarded when it comes due.

use serde::Deserialize;

use crate::error::{Result, SoundGridError};

/// Fade-out window in seconds.
pub const FADE_SECONDS: f64 = 0.5;

// ════════════════════════════════════════════════════════════════════════════
// LayerAsset — what a layer is loaded from
// ════════════════════════════════════════════════════════════════════════════

/// One loopable sound: a General MIDI program holding a sustained note.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LayerAsset {
    pub name:     String,
    /// GM program 0–127.
    pub program:  u8,
    /// MIDI note 0–127.
    pub note:     u8,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_velocity() -> u8 { 100 }

impl LayerAsset {
    pub fn new(name: &str, program: u8, note: u8) -> Self {
        LayerAsset { name: name.to_string(), program, note, velocity: default_velocity() }
    }

    /// MIDI data bytes are 7-bit.
    pub fn validate(&self) -> Result<()> {
        for (what, v) in [("program", self.program), ("note", self.note), ("velocity", self.velocity)] {
            if v > 127 {
                return Err(SoundGridError::asset_load(
                    &self.name,
                    format!("{} {} out of range 0–127", what, v),
                ));
            }
        }
        Ok(())
    }

    /// The default twelve-layer orchestral bank.
    pub fn default_bank() -> Vec<LayerAsset> {
        vec![
            LayerAsset::new("angelic-drum-roll",          47, 45), // timpani
            LayerAsset::new("brass-stick",                61, 60), // brass section
            LayerAsset::new("angelical-choir",            52, 64), // choir aahs
            LayerAsset::new("drama-riser",                50, 55), // synth strings
            LayerAsset::new("heavenly-swell",             88, 67), // new age pad
            LayerAsset::new("orchestra-announcement",     60, 58), // french horn
            LayerAsset::new("mysterious-long-swell",      91, 50), // choir pad
            LayerAsset::new("trumpets-and-strings",       48, 62), // string ensemble
            LayerAsset::new("trumpet-fanfare",            56, 72), // trumpet
            LayerAsset::new("threatening-trumpets",       57, 46), // trombone
            LayerAsset::new("orchestra-happy-jingle",     45, 69), // pizzicato
            LayerAsset::new("mythical-violin-jingle",     40, 76), // violin
        ]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SoundHandle / SoundSource — the playback collaborator
// ════════════════════════════════════════════════════════════════════════════

/// A loaded, playable sound.
pub trait SoundHandle: Send {
    /// Start looping from the beginning.
    fn loop_playback(&mut self);
    fn stop(&mut self);
    /// Move to `level` (0.0–1.0) over `ramp_seconds`; 0 means immediately.
    fn set_volume(&mut self, level: f32, ramp_seconds: f32);
    fn is_playing(&self) -> bool;
}

/// Anything that can turn a [`LayerAsset`] into a [`SoundHandle`].
pub trait SoundSource {
    fn load(&mut self, asset: &LayerAsset) -> Result<Box<dyn SoundHandle>>;
    /// Short backend description for the startup log.
    fn describe(&self) -> String;
}

// ════════════════════════════════════════════════════════════════════════════
// SoundLayer
// ════════════════════════════════════════════════════════════════════════════

pub struct SoundLayer {
    id:     usize,
    name:   String,
    handle: Box<dyn SoundHandle>,
    /// Logically on: started and not yet finally stopped.
    active: bool,
    /// A fade-out is pending for the current generation.
    fading: bool,
    /// Target volume most recently requested.
    volume: f32,
    generation: u64,
}

impl SoundLayer {
    pub fn id(&self) -> usize      { self.id }
    pub fn name(&self) -> &str     { &self.name }
    pub fn is_active(&self) -> bool { self.active }
    pub fn is_fading(&self) -> bool { self.fading }
    pub fn volume(&self) -> f32    { self.volume }
    pub fn generation(&self) -> u64 { self.generation }
}

/// A deferred stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeTask {
    pub group:      usize,
    pub fire_at:    f64,
    pub generation: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// Assignment table
// ════════════════════════════════════════════════════════════════════════════

/// Partition marker indices `0..marker_count` into `layer_count` contiguous
/// bands in index order.  Every band gets `marker_count / layer_count`
/// markers and the remainder goes one each to the trailing bands.
pub fn assignment_table(marker_count: usize, layer_count: usize) -> Vec<usize> {
    if layer_count == 0 {
        return Vec::new();
    }
    let base  = marker_count / layer_count;
    let extra = marker_count % layer_count;
    let mut table = Vec::with_capacity(marker_count);
    for group in 0..layer_count {
        let size = base + usize::from(group >= layer_count - extra);
        table.extend(std::iter::repeat(group).take(size));
    }
    table
}

// ════════════════════════════════════════════════════════════════════════════
// SoundBank
// ════════════════════════════════════════════════════════════════════════════

pub struct SoundBank {
    layers:       Vec<SoundLayer>,
    assignment:   Vec<usize>,
    pending:      Vec<FadeTask>,
    fade_seconds: f64,
}

impl SoundBank {
    /// Load every asset through `source`.  Any failure aborts the whole bank.
    pub fn load(source: &mut dyn SoundSource, assets: &[LayerAsset]) -> Result<Self> {
        if assets.is_empty() {
            return Err(SoundGridError::configuration("at least one sound layer is required"));
        }
        let mut layers = Vec::with_capacity(assets.len());
        for (id, asset) in assets.iter().enumerate() {
            asset.validate()?;
            let handle = source.load(asset)?;
            layers.push(SoundLayer {
                id,
                name: asset.name.clone(),
                handle,
                active: false,
                fading: false,
                volume: 0.0,
                generation: 0,
            });
        }
        log::info!("Loaded {} sound layers via {}", layers.len(), source.describe());
        Ok(SoundBank {
            layers,
            assignment: Vec::new(),
            pending: Vec::new(),
            fade_seconds: FADE_SECONDS,
        })
    }

    pub fn with_fade(mut self, seconds: f64) -> Self {
        self.fade_seconds = seconds.max(0.0);
        self
    }

    /// Compute and keep the marker → sound group table.
    pub fn assign(&mut self, marker_count: usize) -> &[usize] {
        self.assignment = assignment_table(marker_count, self.layers.len());
        &self.assignment
    }

    pub fn assignment(&self) -> &[usize]  { &self.assignment }
    pub fn layer_count(&self) -> usize    { self.layers.len() }
    pub fn layers(&self) -> &[SoundLayer] { &self.layers }
    pub fn pending(&self) -> &[FadeTask]  { &self.pending }
    pub fn fade_seconds(&self) -> f64     { self.fade_seconds }

    pub fn is_active(&self, group: usize) -> bool {
        self.layers.get(group).map_or(false, |l| l.active)
    }

    pub fn is_fading(&self, group: usize) -> bool {
        self.layers.get(group).map_or(false, |l| l.fading)
    }

    /// Groups currently on, including those fading out.
    pub fn active_groups(&self) -> Vec<usize> {
        self.layers.iter().filter(|l| l.active).map(|l| l.id).collect()
    }

    /// Start `group` looping at full volume.  No effect if it is already on;
    /// if it is on but fading out, the fade is cancelled.
    pub fn activate(&mut self, group: usize) {
        let Some(layer) = self.layers.get_mut(group) else {
            log::warn!("activate: sound group {} out of range", group);
            return;
        };

        if layer.active {
            if layer.fading {
                layer.fading = false;
                layer.generation += 1;
                layer.volume = 1.0;
                layer.handle.set_volume(1.0, 0.0);
                log::debug!("layer {} '{}' re-activated during fade", layer.id, layer.name);
                // At most one pending fade per layer.
                self.pending.retain(|t| t.group != group);
            }
            return;
        }

        layer.active = true;
        layer.generation += 1;
        if !layer.handle.is_playing() {
            layer.handle.loop_playback();
        }
        layer.volume = 1.0;
        layer.handle.set_volume(1.0, 0.0);
        log::debug!("layer {} '{}' started", layer.id, layer.name);
    }

    /// Fade `group` out and queue its final stop.  No-op when the group is
    /// off or already fading.
    pub fn schedule_deactivate(&mut self, group: usize, now: f64) {
        let fade = self.fade_seconds;
        let Some(layer) = self.layers.get_mut(group) else { return };
        if !layer.active || layer.fading {
            return;
        }
        layer.fading = true;
        layer.volume = 0.0;
        layer.handle.set_volume(0.0, fade as f32);
        self.pending.push(FadeTask {
            group,
            fire_at: now + fade,
            generation: layer.generation,
        });
        log::debug!("layer {} '{}' fading out", layer.id, layer.name);
    }

    pub fn deactivate_all(&mut self, now: f64) {
        for group in 0..self.layers.len() {
            self.schedule_deactivate(group, now);
        }
    }

    /// Finalise every fade whose window has elapsed.  Returns how many
    /// layers were actually stopped.
    pub fn process_due(&mut self, now: f64) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let (due, waiting): (Vec<FadeTask>, Vec<FadeTask>) =
            self.pending.drain(..).partition(|t| t.fire_at <= now);
        self.pending = waiting;

        let mut stopped = 0;
        for task in due {
            let Some(layer) = self.layers.get_mut(task.group) else { continue };
            if layer.generation != task.generation || !layer.fading {
                log::trace!("discarding stale fade for layer {}", task.group);
                continue;
            }
            layer.handle.stop();
            layer.active = false;
            layer.fading = false;
            stopped += 1;
            log::debug!("layer {} '{}' stopped", layer.id, layer.name);
        }
        stopped
    }

    /// Stop every playing layer right now, skipping the fade.  Used on exit
    /// so no note is left sounding.
    pub fn silence(&mut self) {
        self.pending.clear();
        for layer in &mut self.layers {
            if layer.active || layer.handle.is_playing() {
                layer.handle.stop();
            }
            layer.active = false;
            layer.fading = false;
            layer.volume = 0.0;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Recording test double
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod testkit {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct VoiceStats {
        pub loops:   usize,
        pub stops:   usize,
        pub volumes: Vec<(f32, f32)>,
        pub playing: bool,
    }

    struct RecordingVoice(Arc<Mutex<VoiceStats>>);

    impl SoundHandle for RecordingVoice {
        fn loop_playback(&mut self) {
            let mut s = self.0.lock().unwrap();
            s.loops += 1;
            s.playing = true;
        }
        fn stop(&mut self) {
            let mut s = self.0.lock().unwrap();
            s.stops += 1;
            s.playing = false;
        }
        fn set_volume(&mut self, level: f32, ramp: f32) {
            self.0.lock().unwrap().volumes.push((level, ramp));
        }
        fn is_playing(&self) -> bool {
            self.0.lock().unwrap().playing
        }
    }

    /// Hands out voices that count every call made on them.
    #[derive(Default)]
    pub struct RecordingSource {
        voices: Vec<Arc<Mutex<VoiceStats>>>,
        pub fail_on: Option<String>,
    }

    impl RecordingSource {
        pub fn stats(&self, group: usize) -> VoiceStats {
            self.voices[group].lock().unwrap().clone()
        }

        pub fn total_stops(&self) -> usize {
            self.voices.iter().map(|v| v.lock().unwrap().stops).sum()
        }
    }

    impl SoundSource for RecordingSource {
        fn load(&mut self, asset: &LayerAsset) -> Result<Box<dyn SoundHandle>> {
            if self.fail_on.as_deref() == Some(asset.name.as_str()) {
                return Err(SoundGridError::asset_load(&asset.name, "simulated failure"));
            }
            let stats = Arc::new(Mutex::new(VoiceStats::default()));
            self.voices.push(stats.clone());
            Ok(Box::new(RecordingVoice(stats)))
        }

        fn describe(&self) -> String {
            "recording test source".to_string()
        }
    }

    pub fn assets(n: usize) -> Vec<LayerAsset> {
        (0..n).map(|i| LayerAsset::new(&format!("layer-{}", i), i as u8, 60)).collect()
    }

    pub fn bank(n: usize) -> (SoundBank, RecordingSource) {
        let mut src = RecordingSource::default();
        let bank = SoundBank::load(&mut src, &assets(n)).unwrap();
        (bank, src)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::testkit::{assets, bank, RecordingSource};
    use super::*;

    #[test]
    fn assignment_covers_every_group() {
        for markers in [12, 13, 48, 96, 107] {
            let t = assignment_table(markers, 12);
            assert_eq!(t.len(), markers);
            assert!(t.iter().all(|&g| g < 12));
            for g in 0..12 {
                assert!(t.contains(&g), "group {} unused for {} markers", g, markers);
            }
            // contiguous, non-decreasing bands
            assert!(t.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn assignment_remainder_goes_to_trailing_groups() {
        assert_eq!(assignment_table(7, 3), vec![0, 0, 1, 1, 2, 2, 2]);
        assert_eq!(assignment_table(8, 3), vec![0, 0, 1, 1, 1, 2, 2, 2]);
        assert_eq!(assignment_table(6, 3), vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn assignment_is_stable() {
        assert_eq!(assignment_table(96, 12), assignment_table(96, 12));
    }

    #[test]
    fn assignment_with_fewer_markers_than_layers() {
        let t = assignment_table(2, 5);
        assert_eq!(t, vec![3, 4]);
    }

    #[test]
    fn load_fails_on_bad_asset() {
        let mut src = RecordingSource::default();
        src.fail_on = Some("layer-2".into());
        let err = SoundBank::load(&mut src, &assets(4)).err().unwrap();
        assert_eq!(err.error_code(), "ASSET_LOAD");
    }

    #[test]
    fn load_rejects_out_of_range_note() {
        let mut src = RecordingSource::default();
        let mut a = assets(2);
        a[1].note = 200;
        assert!(SoundBank::load(&mut src, &a).is_err());
    }

    #[test]
    fn load_rejects_empty_bank() {
        let mut src = RecordingSource::default();
        assert!(SoundBank::load(&mut src, &[]).is_err());
    }

    #[test]
    fn activate_is_idempotent() {
        let (mut bank, src) = bank(3);
        bank.activate(1);
        let once = src.stats(1);
        bank.activate(1);
        assert!(bank.is_active(1));
        assert_eq!(src.stats(1), once);
        assert_eq!(once.loops, 1);
        assert_eq!(once.volumes, vec![(1.0, 0.0)]);
    }

    #[test]
    fn deactivate_fades_then_stops() {
        let (mut bank, src) = bank(2);
        bank.activate(0);
        bank.schedule_deactivate(0, 10.0);
        assert!(bank.is_active(0));
        assert!(bank.is_fading(0));
        assert_eq!(src.stats(0).volumes.last(), Some(&(0.0, 0.5)));

        assert_eq!(bank.process_due(10.25), 0);
        assert!(bank.is_active(0));

        assert_eq!(bank.process_due(10.5), 1);
        assert!(!bank.is_active(0));
        assert_eq!(src.stats(0).stops, 1);
    }

    #[test]
    fn second_deactivate_does_not_duplicate_fade() {
        let (mut bank, src) = bank(2);
        bank.activate(0);
        bank.schedule_deactivate(0, 0.0);
        bank.schedule_deactivate(0, 0.2);
        assert_eq!(bank.pending().len(), 1);
        assert_eq!(bank.pending()[0].fire_at, 0.5);
        bank.process_due(5.0);
        assert_eq!(src.stats(0).stops, 1);
    }

    #[test]
    fn deactivate_inactive_is_noop() {
        let (mut bank, src) = bank(2);
        bank.schedule_deactivate(1, 0.0);
        assert!(bank.pending().is_empty());
        assert!(src.stats(1).volumes.is_empty());
    }

    #[test]
    fn reactivation_cancels_pending_stop() {
        let (mut bank, src) = bank(2);
        bank.activate(0);
        bank.schedule_deactivate(0, 0.0);
        bank.activate(0);
        assert!(!bank.is_fading(0));
        assert_eq!(bank.layers()[0].volume(), 1.0);

        assert!(bank.pending().is_empty());
        assert_eq!(bank.process_due(1.0), 0);
        assert!(bank.is_active(0));
        assert_eq!(src.stats(0).stops, 0);
        assert_eq!(src.stats(0).loops, 1);

        // A fresh fade after the re-activation works normally.
        bank.schedule_deactivate(0, 2.0);
        assert_eq!(bank.process_due(2.5), 1);
        assert_eq!(src.stats(0).stops, 1);
    }

    #[test]
    fn flicker_keeps_one_pending_fade_per_layer() {
        let (mut bank, src) = bank(2);
        bank.activate(0);
        for i in 0..11 {
            let now = i as f64 * 0.01;
            bank.schedule_deactivate(0, now);
            assert_eq!(bank.pending().iter().filter(|t| t.group == 0).count(), 1);
            bank.activate(0);
        }
        assert!(bank.pending().is_empty());

        bank.schedule_deactivate(0, 1.0);
        assert_eq!(bank.pending().len(), 1);
        assert_eq!(bank.process_due(2.0), 1);
        assert_eq!(src.stats(0).stops, 1);
    }

    #[test]
    fn stale_task_is_ignored_by_generation() {
        let (mut bank, src) = bank(1);
        bank.activate(0);
        bank.schedule_deactivate(0, 0.0);
        let stale = bank.pending()[0];
        bank.activate(0);
        bank.pending.push(stale);
        assert_eq!(bank.process_due(1.0), 0);
        assert!(bank.is_active(0));
        assert_eq!(src.stats(0).stops, 0);
    }

    #[test]
    fn restart_after_full_stop_loops_again() {
        let (mut bank, src) = bank(1);
        bank.activate(0);
        bank.schedule_deactivate(0, 0.0);
        bank.process_due(1.0);
        bank.activate(0);
        assert!(bank.is_active(0));
        assert_eq!(src.stats(0).loops, 2);
    }

    #[test]
    fn deactivate_all_touches_only_active_groups() {
        let (mut bank, src) = bank(4);
        bank.activate(1);
        bank.activate(3);
        bank.deactivate_all(0.0);
        assert_eq!(bank.pending().len(), 2);
        bank.deactivate_all(0.1);
        assert_eq!(bank.pending().len(), 2);
        bank.process_due(1.0);
        assert_eq!(src.stats(1).stops, 1);
        assert_eq!(src.stats(3).stops, 1);
        assert_eq!(src.stats(0).stops, 0);
        assert!(bank.active_groups().is_empty());
    }

    #[test]
    fn silence_stops_immediately() {
        let (mut bank, src) = bank(2);
        bank.activate(0);
        bank.schedule_deactivate(0, 0.0);
        bank.activate(1);
        bank.silence();
        assert!(bank.pending().is_empty());
        assert!(bank.active_groups().is_empty());
        assert_eq!(src.total_stops(), 2);
    }

    #[test]
    fn activate_out_of_range_is_ignored() {
        let (mut bank, _src) = bank(2);
        bank.activate(7);
        assert!(bank.active_groups().is_empty());
    }

    #[test]
    fn default_bank_is_valid() {
        let bank = LayerAsset::default_bank();
        assert_eq!(bank.len(), 12);
        assert!(bank.iter().all(|a| a.validate().is_ok()));
    }
}
