//! The per-frame gesture state machine.
//!
//! One engine owns every piece of cross-frame state: the remembered primary
//! hand, the circle window, the unlock dwell timer, the swipe anchor and the
//! lock itself. `process` runs the detectors in a fixed order and returns the
//! commands to dispatch; it never talks to the media side and only reads
//! from the audio endpoint.

use log::{debug, info};
use std::time::Instant;

use crate::audio::{AudioEndpoint, AudioError};
use crate::config::Thresholds;
use crate::gestures::circle::CircleDetector;
use crate::gestures::palm::{PalmDwell, is_open_palm};
use crate::gestures::swipe::SwipeDetector;
use crate::gestures::volume::{VolumeMapper, pinch_distance};
use crate::gestures::{Command, GestureEvent};
use crate::hand::{Hand, INDEX_TIP};
use crate::tracker::IdentityResolver;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    /// Volume pinned to the level captured when the loop was drawn.
    Locked { volume: f32 },
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }

    pub fn locked_volume(&self) -> Option<f32> {
        match self {
            Self::Locked { volume } => Some(*volume),
            Self::Unlocked => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub commands: Vec<Command>,
    pub events: Vec<GestureEvent>,
    pub pinch_px: Option<f32>,
    pub percent: Option<u8>,
    pub locked: bool,
    pub locked_volume: Option<f32>,
}

#[derive(Debug)]
pub struct GestureEngine {
    resolver: IdentityResolver,
    mapper: VolumeMapper,
    circle: CircleDetector,
    palm: PalmDwell,
    swipe: SwipeDetector,
    lock: LockState,
}

impl GestureEngine {
    pub fn new(th: &Thresholds) -> Self {
        Self {
            resolver: IdentityResolver::new(th.identity_stability_px),
            mapper: VolumeMapper::new(th.pinch_min_px, th.pinch_max_px),
            circle: CircleDetector::new(
                th.circle_window,
                th.circle_min_path_px,
                th.circle_max_spread_px,
            ),
            palm: PalmDwell::new(th.unlock_dwell()),
            swipe: SwipeDetector::new(th.swipe_min_px),
            lock: LockState::Unlocked,
        }
    }

    /// Apply new thresholds without dropping the lock.
    pub fn set_thresholds(&mut self, th: &Thresholds) {
        self.resolver.set_stability_px(th.identity_stability_px);
        self.mapper = VolumeMapper::new(th.pinch_min_px, th.pinch_max_px);
        self.circle.configure(
            th.circle_window,
            th.circle_min_path_px,
            th.circle_max_spread_px,
        );
        self.palm.set_dwell(th.unlock_dwell());
        self.swipe.set_min_px(th.swipe_min_px);
    }

    #[cfg(test)]
    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    /// Run one frame: resolve roles, map the primary pinch, then feed the
    /// secondary hand through loop, palm and swipe detection in that order.
    ///
    /// Audio reads happen before the lock changes, so an endpoint failure
    /// leaves the lock, dwell timer and swipe anchor as they were.
    pub fn process(
        &mut self,
        hands: &[Hand],
        now: Instant,
        audio: &dyn AudioEndpoint,
    ) -> Result<FrameOutcome, AudioError> {
        let res = self.resolver.resolve(hands);
        let mut out = FrameOutcome::default();
        if res.carried {
            debug!("primary hand carried over from an earlier frame");
            out.events.push(GestureEvent::IdentityCarried);
        }

        let mut level_set = None;
        if let Some(d) = res.primary.as_ref().and_then(pinch_distance) {
            let level = match self.lock {
                LockState::Locked { volume } => volume,
                LockState::Unlocked => self.mapper.level(d, audio.volume_range()?),
            };
            out.pinch_px = Some(d);
            if !self.lock.is_locked() {
                out.percent = Some(self.mapper.percent(d));
            }
            out.commands.push(Command::SetVolume(level));
            level_set = Some(level);
        }

        match &res.secondary {
            Some(sec) => self.secondary(sec, now, level_set, audio, &mut out)?,
            None => self.swipe.reset(),
        }

        out.locked = self.lock.is_locked();
        out.locked_volume = self.lock.locked_volume();
        Ok(out)
    }

    fn secondary(
        &mut self,
        hand: &Hand,
        now: Instant,
        level_set: Option<f32>,
        audio: &dyn AudioEndpoint,
        out: &mut FrameOutcome,
    ) -> Result<(), AudioError> {
        let tip = hand.get(INDEX_TIP);

        if let Some(tip) = tip {
            self.circle.push(tip);
            if !self.lock.is_locked() && self.circle.is_loop() {
                let volume = match level_set {
                    Some(v) => v,
                    None => audio.master_volume()?,
                };
                self.lock = LockState::Locked { volume };
                self.circle.clear();
                info!("volume locked at {volume:.2}");
                out.events.push(GestureEvent::Locked { volume });
            } else if !self.lock.is_locked() && !self.circle.is_full() {
                out.events.push(GestureEvent::LockHint);
            }
        }

        if self.palm.update(is_open_palm(hand), now) && self.lock.is_locked() {
            self.lock = LockState::Unlocked;
            info!("volume unlocked");
            out.events.push(GestureEvent::Unlocked);
        }

        match tip {
            Some(tip) => {
                if self.swipe.update(tip.x) {
                    info!("swipe detected, skipping track");
                    out.commands.push(Command::NextTrack);
                    out.events.push(GestureEvent::Skipped);
                }
            }
            None => self.swipe.reset(),
        }
        Ok(())
    }
}
