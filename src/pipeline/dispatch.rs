use anyhow::{Context, Result};

use crate::actions::MediaSink;
use crate::audio::AudioEndpoint;
use crate::gestures::Command;

/// Apply a frame's commands in order. The first failure aborts the rest.
pub fn dispatch_commands(
    commands: &[Command],
    audio: &mut dyn AudioEndpoint,
    media: &mut dyn MediaSink,
) -> Result<()> {
    for cmd in commands {
        match *cmd {
            Command::SetVolume(level) => audio
                .set_master_volume(level)
                .with_context(|| format!("failed to set volume to {level:.2}"))?,
            Command::NextTrack => media.next_track().context("failed to skip track")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::tests::RecordingMedia;
    use crate::audio::SoftwareMixer;

    #[test]
    fn applies_volume_then_skip() {
        let mut audio = SoftwareMixer::new((0.0, 100.0));
        let mut media = RecordingMedia::default();
        dispatch_commands(
            &[Command::SetVolume(42.0), Command::NextTrack],
            &mut audio,
            &mut media,
        )
        .unwrap();
        assert_eq!(audio.master_volume().unwrap(), 42.0);
        assert_eq!(media.skips, 1);
    }

    struct FailingMedia;

    impl MediaSink for FailingMedia {
        fn next_track(&mut self) -> Result<()> {
            anyhow::bail!("no virtual keyboard")
        }
    }

    #[test]
    fn media_failure_is_reported() {
        let mut audio = SoftwareMixer::new((0.0, 100.0));
        let err = dispatch_commands(&[Command::NextTrack], &mut audio, &mut FailingMedia)
            .unwrap_err();
        assert!(format!("{err:#}").contains("no virtual keyboard"));
    }
}
