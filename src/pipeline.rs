//! Frame loop: adapter -> engine -> collaborators.

mod dispatch;
mod watch;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::actions::{MediaSink, UinputSink};
use crate::audio::{AudioEndpoint, PactlEndpoint, SoftwareMixer};
use crate::config::{AudioBackend, ConfigState, MediaBackend, Profile};
use crate::engine::{FrameOutcome, GestureEngine};
use crate::gestures::GestureEvent;
use crate::input::{self, Frame, FrameError, FrameReader};
use dispatch::dispatch_commands;
use watch::ProfileWatcher;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: Option<PathBuf>,
    pub profile: Option<String>,
    /// Simulated mixer and no-op media keys regardless of the profile.
    pub dry_run: bool,
    /// Print one JSON status line per frame on stdout.
    pub report: bool,
}

pub struct Pipeline {
    engine: GestureEngine,
    audio: Box<dyn AudioEndpoint>,
    media: Box<dyn MediaSink>,
}

impl Pipeline {
    pub fn new(
        profile: &Profile,
        audio: Box<dyn AudioEndpoint>,
        media: Box<dyn MediaSink>,
    ) -> Self {
        Self {
            engine: GestureEngine::new(&profile.thresholds),
            audio,
            media,
        }
    }

    pub fn from_profile(profile: &Profile, dry_run: bool) -> Self {
        let audio: Box<dyn AudioEndpoint> = match (dry_run, profile.audio.backend) {
            (false, AudioBackend::Pactl) => Box::new(PactlEndpoint::new(&profile.audio.sink)),
            _ => Box::new(SoftwareMixer::new((
                profile.audio.sim_min_db,
                profile.audio.sim_max_db,
            ))),
        };
        let media: Box<dyn MediaSink> = match (dry_run, profile.media.backend) {
            (false, MediaBackend::Uinput) => Box::new(UinputSink::new().unwrap_or_else(|e| {
                warn!("uinput unavailable ({e:#}); media keys disabled");
                UinputSink::noop()
            })),
            _ => Box::new(UinputSink::noop()),
        };
        Self::new(profile, audio, media)
    }

    pub fn apply_profile(&mut self, profile: &Profile) {
        self.engine.set_thresholds(&profile.thresholds);
    }

    /// Process one frame and dispatch its commands. Nothing is dispatched if
    /// the engine fails to read the audio endpoint.
    pub fn step(&mut self, frame: &Frame) -> Result<FrameOutcome> {
        let outcome = self
            .engine
            .process(&frame.hands, frame.at, self.audio.as_ref())
            .context("audio endpoint query failed")?;
        dispatch_commands(&outcome.commands, self.audio.as_mut(), self.media.as_mut())?;

        for ev in &outcome.events {
            match ev {
                GestureEvent::IdentityCarried | GestureEvent::LockHint => {
                    debug!("{}", ev.as_str())
                }
                _ => info!("{}", ev.as_str()),
            }
        }
        debug!(
            "frame: hands={} pinch={:?} percent={:?} locked={}",
            frame.hands.len(),
            outcome.pinch_px,
            outcome.percent,
            outcome.locked
        );
        Ok(outcome)
    }
}

fn report_line(frame: &Frame, outcome: &FrameOutcome) -> serde_json::Value {
    let status: Vec<&str> = outcome.events.iter().map(|e| e.as_str()).collect();
    serde_json::json!({
        "hands": frame.hands.len(),
        "pinch_px": outcome.pinch_px,
        "percent": outcome.percent,
        "locked": outcome.locked,
        "locked_volume": outcome.locked_volume,
        "status": status,
    })
}

fn install_signal_flag() -> Result<Arc<AtomicBool>> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::flag;

    let stop = Arc::new(AtomicBool::new(false));
    for sig in [SIGINT, SIGTERM] {
        // a second signal while blocked on input exits immediately
        flag::register_conditional_shutdown(sig, 1, Arc::clone(&stop))?;
        flag::register(sig, Arc::clone(&stop))?;
    }
    Ok(stop)
}

pub fn run(opts: RunOptions) -> Result<()> {
    let mut cfg = ConfigState::load_or_install_default(opts.profile.as_deref())?;
    info!("run: profile '{}'", cfg.active_name);

    let stop = install_signal_flag()?;
    let watcher = match ProfileWatcher::start(&cfg.active_path()) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("profile hot reload disabled: {e:#}");
            None
        }
    };

    let mut pipeline = Pipeline::from_profile(&cfg.profile, opts.dry_run);
    let src = input::open_input(opts.input.as_deref()).context("failed to open landmark input")?;
    let mut frames = FrameReader::new(src, cfg.profile.frame.clone());

    while let Some(next) = frames.next() {
        if stop.load(Ordering::Relaxed) {
            info!("run: signal received, stopping");
            break;
        }

        if watcher.as_ref().is_some_and(|w| w.changed()) {
            match cfg.reload() {
                Ok(()) => {
                    pipeline.apply_profile(&cfg.profile);
                    frames.set_settings(cfg.profile.frame.clone());
                    info!("profile '{}' reloaded", cfg.active_name);
                }
                Err(e) => error!("reload failed, keeping last good profile: {e:#}"),
            }
        }

        let frame = match next {
            Ok(f) => f,
            Err(FrameError::Io(e)) => return Err(e).context("landmark input failed"),
            Err(e) => {
                warn!("skipping frame: {e}");
                continue;
            }
        };

        let outcome = pipeline.step(&frame)?;
        if opts.report {
            println!("{}", report_line(&frame, &outcome));
        }
    }

    info!("run: input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::tests::RecordingMedia;
    use crate::config::FrameSettings;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Mixer handle the test keeps after boxing a clone into the pipeline.
    #[derive(Clone)]
    struct SharedMixer(Rc<RefCell<SoftwareMixer>>);

    impl AudioEndpoint for SharedMixer {
        fn volume_range(&self) -> Result<(f32, f32), crate::audio::AudioError> {
            self.0.borrow().volume_range()
        }
        fn master_volume(&self) -> Result<f32, crate::audio::AudioError> {
            self.0.borrow().master_volume()
        }
        fn set_master_volume(&mut self, level: f32) -> Result<(), crate::audio::AudioError> {
            self.0.borrow_mut().set_master_volume(level)
        }
    }

    #[derive(Clone, Default)]
    struct SharedMedia(Rc<RefCell<RecordingMedia>>);

    impl MediaSink for SharedMedia {
        fn next_track(&mut self) -> Result<()> {
            self.0.borrow_mut().next_track()
        }
    }

    /// A 21-point hand: wrist at (wx, 300), thumb tip at (wx, 200), index tip
    /// at (ix, 200), everything else on the wrist.
    fn hand(wx: f32, ix: f32) -> String {
        let pts: Vec<String> = (0..21)
            .map(|i| match i {
                4 => format!("[{wx},200]"),
                8 => format!("[{ix},200]"),
                _ => format!("[{wx},300]"),
            })
            .collect();
        format!("[{}]", pts.join(","))
    }

    #[test]
    fn replayed_session_sets_volume_and_skips() {
        let mixer = SharedMixer(Rc::new(RefCell::new(SoftwareMixer::new((0.0, 100.0)))));
        let media = SharedMedia::default();
        let profile = Profile::default();
        let mut pipeline = Pipeline::new(&profile, Box::new(mixer.clone()), Box::new(media.clone()));

        let text = [
            format!("{{\"t_ms\": 0, \"hands\": [{}]}}", hand(100.0, 215.0)),
            format!("{{\"t_ms\": 33, \"hands\": [{}, {}]}}", hand(100.0, 215.0), hand(400.0, 300.0)),
            format!("{{\"t_ms\": 66, \"hands\": [{}, {}]}}", hand(100.0, 215.0), hand(400.0, 420.0)),
        ]
        .join("\n");

        let frames = FrameReader::new(text.as_bytes(), FrameSettings::default());
        let mut outcomes = Vec::new();
        for f in frames {
            outcomes.push(pipeline.step(&f.unwrap()).unwrap());
        }

        // pinch 115px is halfway through 30..200
        assert_eq!(outcomes[0].percent, Some(50));
        assert!((mixer.master_volume().unwrap() - 50.0).abs() < 1e-3);
        assert_eq!(media.0.borrow().skips, 1);
        assert!(outcomes[2].events.contains(&GestureEvent::Skipped));
    }

    #[test]
    fn report_line_lists_status_text() {
        let frame = Frame {
            hands: vec![],
            at: std::time::Instant::now(),
        };
        let outcome = FrameOutcome {
            events: vec![GestureEvent::Unlocked],
            ..FrameOutcome::default()
        };
        let v = report_line(&frame, &outcome);
        assert_eq!(v["status"][0], "volume unlocked");
        assert_eq!(v["locked"], false);
    }
}
