//! Session controller: the Paused ⇄ Running state machine and the
//! per-frame orchestration of interpreter, grid and sound bank.
//!
//! `SessionController` owns the [`MarkerGrid`], the [`SoundBank`], the
//! [`GestureInterpreter`] and the latest accepted hand observations.  The
//! run loop feeds it detector results with [`SessionController::on_hands`],
//! calls [`SessionController::update`] once per frame and then
//! [`SessionController::render`].

use crate::canvas::Canvas;
use crate::config::InstallationConfig;
use crate::error::Result;
use crate::gesture::{GestureInterpreter, Interpretation};
use crate::hand::HandObservation;
use crate::marker::MarkerGrid;
use crate::scene;
use crate::sound::{SoundBank, SoundSource};

// ════════════════════════════════════════════════════════════════════════════
// RunState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState { Paused, Running }

// ════════════════════════════════════════════════════════════════════════════
// HandFeed — latest accepted observation + frame-skip gate
// ════════════════════════════════════════════════════════════════════════════

/// Single "latest hands" slot.  Every offered result bumps a counter; only
/// every `frame_skip`-th result is accepted, and only while accepting.
/// Last accepted write wins.
#[derive(Debug)]
pub struct HandFeed {
    latest:     Vec<HandObservation>,
    frame_skip: u64,
    offered:    u64,
}

impl HandFeed {
    pub fn new(frame_skip: u32) -> Self {
        HandFeed {
            latest:     Vec::new(),
            frame_skip: u64::from(frame_skip.max(1)),
            offered:    0,
        }
    }

    /// Returns whether the result was stored.
    pub fn offer(&mut self, hands: Vec<HandObservation>, accepting: bool) -> bool {
        let accept = accepting && self.offered % self.frame_skip == 0;
        self.offered += 1;
        if accept {
            self.latest = hands;
        } else {
            log::trace!("detector result #{} skipped", self.offered - 1);
        }
        accept
    }

    pub fn latest(&self) -> &[HandObservation] {
        &self.latest
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionController
// ════════════════════════════════════════════════════════════════════════════

pub struct SessionController {
    state:       RunState,
    grid:        MarkerGrid,
    bank:        SoundBank,
    interpreter: GestureInterpreter,
    feed:        HandFeed,
}

impl SessionController {
    /// Build grid and bank from `cfg`, loading every layer through `source`.
    /// Starts Paused.
    pub fn new(cfg: &InstallationConfig, source: &mut dyn SoundSource) -> Result<Self> {
        cfg.validate()?;
        let (w, h) = (cfg.canvas_width as f32, cfg.canvas_height as f32);

        let mut grid = MarkerGrid::build(w, h, cfg.marker_spacing, cfg.marker_base_size)?
            .with_expand(cfg.marker_expand)
            .with_smoothing(cfg.smoothing());

        let mut bank = SoundBank::load(source, &cfg.layers)?.with_fade(cfg.fade_seconds);
        let table = bank.assign(grid.len()).to_vec();
        grid.assign_sound_groups(&table)?;

        let interpreter = GestureInterpreter::new(w)
            .with_activation_radius(cfg.activation_radius)
            .with_fist_threshold(cfg.fist_threshold);

        log::info!(
            "Grid ready: {} markers over {}×{} px, {} sound layers",
            grid.len(), cfg.canvas_width, cfg.canvas_height, bank.layer_count()
        );

        Ok(SessionController {
            state: RunState::Paused,
            grid,
            bank,
            interpreter,
            feed: HandFeed::new(cfg.frame_skip),
        })
    }

    // ── state machine ─────────────────────────────────────────────────────

    /// Flip Paused ⇄ Running.  Pausing fades out every layer and forgets
    /// the last seen hands; fades already in flight keep running.
    pub fn toggle(&mut self, now: f64) -> RunState {
        self.state = match self.state {
            RunState::Paused => {
                log::info!("Running");
                RunState::Running
            }
            RunState::Running => {
                self.bank.deactivate_all(now);
                self.feed.clear();
                log::info!("Paused");
                RunState::Paused
            }
        };
        self.state
    }

    pub fn state(&self) -> RunState { self.state }
    pub fn is_running(&self) -> bool { self.state == RunState::Running }

    // ── per frame ─────────────────────────────────────────────────────────

    /// One detector result arrived.  Dropped while paused or when the
    /// frame-skip gate says so.
    pub fn on_hands(&mut self, hands: Vec<HandObservation>) -> bool {
        let running = self.is_running();
        self.feed.offer(hands, running)
    }

    /// Complete due fades, then (if running) interpret the latest hands and
    /// advance marker smoothing by `dt` seconds.
    pub fn update(&mut self, now: f64, dt: f32) {
        self.bank.process_due(now);
        if self.state == RunState::Paused {
            return;
        }
        self.interpreter.interpret(self.feed.latest(), &mut self.grid, &mut self.bank, now);
        self.grid.advance(dt);
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        match self.state {
            RunState::Paused  => scene::draw_paused(canvas),
            RunState::Running => scene::draw_markers(&self.grid, canvas),
        }
    }

    /// Cut all sound immediately.  Call before exit.
    pub fn shutdown(&mut self) {
        self.bank.silence();
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn grid(&self) -> &MarkerGrid              { &self.grid }
    pub fn bank(&self) -> &SoundBank               { &self.bank }
    pub fn latest_hands(&self) -> &[HandObservation] { self.feed.latest() }
    pub fn interpretation(&self) -> &Interpretation { self.interpreter.last() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{FrameCanvas, Rgb};
    use crate::sound::testkit::RecordingSource;
    use crate::tracking::synthetic_hand;

    const DT: f32 = 1.0 / 60.0;

    fn make_session() -> (SessionController, RecordingSource) {
        let cfg = InstallationConfig { canvas_width: 800, canvas_height: 600, ..Default::default() };
        let mut src = RecordingSource::default();
        let s = SessionController::new(&cfg, &mut src).unwrap();
        (s, src)
    }

    /// A hand whose interaction point lands at screen (`x`, `y`).
    fn hand_at_screen(x: f32, y: f32) -> HandObservation {
        synthetic_hand(800.0 - x, y, false)
    }

    #[test]
    fn starts_paused() {
        let (s, _src) = make_session();
        assert_eq!(s.state(), RunState::Paused);
        assert_eq!(s.grid().len(), 8 * 6);
        assert_eq!(s.bank().assignment().len(), 48);
    }

    #[test]
    fn bad_spacing_fails_construction() {
        let cfg = InstallationConfig { marker_spacing: 0.0, ..Default::default() };
        let mut src = RecordingSource::default();
        let err = SessionController::new(&cfg, &mut src).err().unwrap();
        assert_eq!(err.error_code(), "CONFIGURATION");
    }

    #[test]
    fn tiny_spacing_fails_construction() {
        let cfg = InstallationConfig { marker_spacing: 1e-4, ..Default::default() };
        let mut src = RecordingSource::default();
        let err = SessionController::new(&cfg, &mut src).err().unwrap();
        assert_eq!(err.error_code(), "CONFIGURATION");
    }

    #[test]
    fn failing_asset_aborts_startup() {
        let cfg = InstallationConfig::default();
        let mut src = RecordingSource::default();
        src.fail_on = Some(cfg.layers[5].name.clone());
        let err = SessionController::new(&cfg, &mut src).err().unwrap();
        assert_eq!(err.error_code(), "ASSET_LOAD");
    }

    #[test]
    fn hands_ignored_while_paused() {
        let (mut s, _src) = make_session();
        assert!(!s.on_hands(vec![hand_at_screen(150.0, 150.0)]));
        s.update(0.0, DT);
        assert!(s.latest_hands().is_empty());
        assert_eq!(s.grid().active_count(), 0);
    }

    #[test]
    fn frame_skip_accepts_every_third() {
        let mut feed = HandFeed::new(3);
        let accepted: Vec<bool> = (0..7).map(|_| feed.offer(vec![], true)).collect();
        assert_eq!(accepted, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn frame_skip_counts_paused_results() {
        let mut feed = HandFeed::new(3);
        assert!(!feed.offer(vec![], false));
        assert!(!feed.offer(vec![], true));
        assert!(!feed.offer(vec![], true));
        assert!(feed.offer(vec![], true));
    }

    #[test]
    fn latest_accepted_wins() {
        let mut feed = HandFeed::new(1);
        feed.offer(vec![synthetic_hand(1.0, 1.0, false)], true);
        feed.offer(vec![synthetic_hand(2.0, 2.0, false), synthetic_hand(3.0, 3.0, false)], true);
        assert_eq!(feed.latest().len(), 2);
    }

    #[test]
    fn running_session_lights_markers_and_plays() {
        let (mut s, src) = make_session();
        s.toggle(0.0);
        assert!(s.on_hands(vec![hand_at_screen(150.0, 150.0)]));
        s.update(0.0, DT);
        assert_eq!(s.grid().active_count(), 1);
        // mirrored x 150 of 800 with 12 layers → layer 2
        assert!(s.bank().is_active(2));
        assert_eq!(src.stats(2).loops, 1);
    }

    #[test]
    fn pause_resume_pause_stops_each_layer_once() {
        let (mut s, src) = make_session();
        s.toggle(0.0);
        s.on_hands(vec![hand_at_screen(50.0, 300.0), hand_at_screen(750.0, 300.0)]);
        s.update(0.0, DT);
        assert_eq!(s.bank().active_groups(), vec![0, 11]);

        assert_eq!(s.toggle(1.0), RunState::Paused);
        assert!(s.latest_hands().is_empty());
        // Fades complete while paused.
        s.update(1.2, DT);
        assert_eq!(src.total_stops(), 0);
        s.update(1.5, DT);
        assert_eq!(src.stats(0).stops, 1);
        assert_eq!(src.stats(11).stops, 1);

        // Resume with no hands, pause again: nothing left to stop.
        s.toggle(2.0);
        s.update(2.0, DT);
        s.toggle(2.1);
        s.update(5.0, DT);
        assert_eq!(src.total_stops(), 2);
    }

    #[test]
    fn pause_mid_fade_does_not_duplicate_stop() {
        let (mut s, src) = make_session();
        s.toggle(0.0);
        s.on_hands(vec![hand_at_screen(50.0, 300.0)]);
        s.update(0.0, DT);
        // Hands vanish: fade starts.
        for _ in 0..3 { s.on_hands(vec![]); }
        s.update(0.1, DT);
        assert!(s.bank().is_fading(0));
        s.toggle(0.2);
        s.update(1.0, DT);
        assert_eq!(src.stats(0).stops, 1);
    }

    #[test]
    fn fist_resets_running_session() {
        let (mut s, _src) = make_session();
        s.toggle(0.0);
        s.on_hands(vec![hand_at_screen(400.0, 300.0)]);
        s.update(0.0, DT);
        for _ in 0..2 { s.on_hands(vec![]); }
        s.on_hands(vec![synthetic_hand(400.0, 300.0, true)]);
        s.update(0.1, DT);
        assert_eq!(s.interpretation(), &Interpretation::Fist);
        assert_eq!(s.grid().active_count(), 0);
    }

    #[test]
    fn render_follows_state() {
        let (mut s, _src) = make_session();
        let mut c = FrameCanvas::new(800, 600);
        s.render(&mut c);
        assert_eq!(c.pixel(0, 0), Some(Rgb::new(204.0, 255.0, 255.0).to_argb()));
        s.toggle(0.0);
        s.update(0.0, DT);
        s.render(&mut c);
        assert_eq!(c.pixel(0, 0), Some(scene::BACKGROUND.to_argb()));
    }

    #[test]
    fn shutdown_silences_everything() {
        let (mut s, src) = make_session();
        s.toggle(0.0);
        s.on_hands(vec![hand_at_screen(400.0, 300.0)]);
        s.update(0.0, DT);
        s.shutdown();
        assert!(s.bank().active_groups().is_empty());
        assert_eq!(src.total_stops(), 1);
    }
}
