//! Gesture detectors fed by the resolved primary/secondary hands.

pub mod circle;
pub mod palm;
pub mod swipe;
pub mod volume;

/// Output destined for the audio and media collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetVolume(f32),
    NextTrack,
}

/// Status changes worth showing to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Locked { volume: f32 },
    Unlocked,
    Skipped,
    IdentityCarried,
    /// Unlocked with the loop window still filling.
    LockHint,
}

impl GestureEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked { .. } => "volume locked",
            Self::Unlocked => "volume unlocked",
            Self::Skipped => "media skipped",
            Self::IdentityCarried => "primary carried over",
            Self::LockHint => "draw circle to lock volume",
        }
    }
}
