//! Per-frame hand skeletons in frame-pixel coordinates.

use thiserror::Error;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const LANDMARK_COUNT: usize = 21;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandError {
    #[error("hand has no landmarks")]
    Empty,
    #[error("hand has {0} landmarks, at most {LANDMARK_COUNT} allowed")]
    TooManyLandmarks(usize),
}

/// One detected hand: up to 21 landmarks in anatomical order
/// (0 = wrist, 4 = thumb tip, 8 = index tip, ... 20 = pinky tip).
///
/// Trackers normally deliver all 21 points; a shorter list is a partial hand
/// and lookups past its end return `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    landmarks: Vec<Landmark>,
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, HandError> {
        if landmarks.is_empty() {
            return Err(HandError::Empty);
        }
        if landmarks.len() > LANDMARK_COUNT {
            return Err(HandError::TooManyLandmarks(landmarks.len()));
        }
        Ok(Self { landmarks })
    }

    pub fn get(&self, idx: usize) -> Option<Landmark> {
        self.landmarks.get(idx).copied()
    }

    /// Always present: construction rejects empty hands.
    pub fn wrist(&self) -> Landmark {
        self.landmarks[WRIST]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }
}
