use std::time::{Duration, Instant};

use crate::hand::Hand;

/// Every finger landmark sits above the wrist (smaller y). A wrist-only
/// partial hand has no fingers and is never open.
pub fn is_open_palm(hand: &Hand) -> bool {
    let wrist_y = hand.wrist().y;
    let fingers = &hand.landmarks()[1..];
    !fingers.is_empty() && fingers.iter().all(|p| p.y < wrist_y)
}

/// Fires once after the pose has held continuously for longer than `dwell`.
/// After firing it stays quiet until the pose breaks and is made again.
#[derive(Debug)]
pub struct PalmDwell {
    dwell: Duration,
    since: Option<Instant>,
    fired: bool,
}

impl PalmDwell {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            since: None,
            fired: false,
        }
    }

    pub fn set_dwell(&mut self, dwell: Duration) {
        self.dwell = dwell;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.since.is_some()
    }

    pub fn update(&mut self, open: bool, now: Instant) -> bool {
        if !open {
            self.since = None;
            self.fired = false;
            return false;
        }
        if self.fired {
            return false;
        }
        match self.since {
            None => {
                self.since = Some(now);
                false
            }
            Some(t0) if now.saturating_duration_since(t0) > self.dwell => {
                self.since = None;
                self.fired = true;
                true
            }
            Some(_) => false,
        }
    }
}
