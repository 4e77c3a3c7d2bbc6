use anyhow::Result;
use log::{info, warn};

/// Receiver of discrete media commands.
pub trait MediaSink {
    fn next_track(&mut self) -> Result<()>;
}

/// Media keys through a virtual uinput keyboard, or a logging no-op when
/// uinput is unavailable.
pub struct UinputSink {
    linux: Option<Box<LinuxUinput>>,
}

impl UinputSink {
    pub fn new() -> Result<Self> {
        #[cfg(target_os = "linux")]
        {
            let dev = LinuxUinput::create()?;
            return Ok(Self {
                linux: Some(Box::new(dev)),
            });
        }
        #[allow(unreachable_code)]
        {
            warn!("uinput not available; running in NO-OP mode");
            Ok(Self::noop())
        }
    }

    pub fn noop() -> Self {
        Self { linux: None }
    }
}

impl MediaSink for UinputSink {
    fn next_track(&mut self) -> Result<()> {
        #[cfg(target_os = "linux")]
        if let Some(dev) = self.linux.as_mut() {
            return dev.next_song();
        }
        info!("media: next track (no-op)");
        Ok(())
    }
}

#[cfg(target_os = "linux")]
struct LinuxUinput {
    dev: uinput::device::Device,
}

#[cfg(not(target_os = "linux"))]
struct LinuxUinput;

#[cfg(target_os = "linux")]
impl LinuxUinput {
    fn create() -> Result<Self> {
        use uinput::event::keyboard::Misc;

        let dev = uinput::default()?
            .name("handctl media keys")?
            .event(Misc::NextSong)?
            .create()?;

        info!("uinput: created virtual media keyboard");
        Ok(Self { dev })
    }

    fn next_song(&mut self) -> Result<()> {
        use uinput::event::keyboard::Misc;
        self.dev.send(Misc::NextSong, 1)?;
        self.dev.synchronize()?;
        self.dev.send(Misc::NextSong, 0)?;
        self.dev.synchronize()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Counts skips instead of pressing keys.
    #[derive(Default)]
    pub struct RecordingMedia {
        pub skips: usize,
    }

    impl MediaSink for RecordingMedia {
        fn next_track(&mut self) -> Result<()> {
            self.skips += 1;
            Ok(())
        }
    }

    #[test]
    fn noop_sink_accepts_commands() {
        let mut sink = UinputSink::noop();
        sink.next_track().unwrap();
    }
}
