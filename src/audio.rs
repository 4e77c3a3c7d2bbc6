//! Master-volume endpoints.

use log::debug;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to run {cmd}: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{cmd} exited with {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("unexpected volume output: {0}")]
    Parse(String),
}

/// The OS mixer as seen by the gesture engine. Levels are in the endpoint's
/// own units, bounded by `volume_range`.
pub trait AudioEndpoint {
    fn volume_range(&self) -> Result<(f32, f32), AudioError>;
    fn master_volume(&self) -> Result<f32, AudioError>;
    fn set_master_volume(&mut self, level: f32) -> Result<(), AudioError>;
}

/// PulseAudio/PipeWire sink driven through `pactl`, in percent.
#[derive(Debug, Clone)]
pub struct PactlEndpoint {
    sink: String,
}

impl PactlEndpoint {
    pub fn new(sink: impl Into<String>) -> Self {
        Self { sink: sink.into() }
    }

    fn pactl(&self, args: &[&str]) -> Result<String, AudioError> {
        let cmd = format!("pactl {}", args.join(" "));
        let out = Command::new("pactl")
            .args(args)
            .output()
            .map_err(|source| AudioError::Spawn {
                cmd: cmd.clone(),
                source,
            })?;
        if !out.status.success() {
            return Err(AudioError::CommandFailed {
                cmd,
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

impl AudioEndpoint for PactlEndpoint {
    fn volume_range(&self) -> Result<(f32, f32), AudioError> {
        Ok((0.0, 100.0))
    }

    fn master_volume(&self) -> Result<f32, AudioError> {
        let out = self.pactl(&["get-sink-volume", &self.sink])?;
        parse_pactl_percent(&out)
    }

    fn set_master_volume(&mut self, level: f32) -> Result<(), AudioError> {
        let pct = format!("{}%", level.clamp(0.0, 100.0).round() as u32);
        debug!("pactl: {} -> {pct}", self.sink);
        self.pactl(&["set-sink-volume", &self.sink, &pct])?;
        Ok(())
    }
}

/// First channel's percentage from `pactl get-sink-volume`, e.g.
/// `Volume: front-left: 32768 /  50% / -18.06 dB, ...`.
pub fn parse_pactl_percent(out: &str) -> Result<f32, AudioError> {
    out.split_whitespace()
        .find_map(|tok| tok.strip_suffix('%'))
        .and_then(|n| n.parse::<f32>().ok())
        .ok_or_else(|| AudioError::Parse(out.trim().to_string()))
}

pub fn pactl_available() -> bool {
    Command::new("pactl")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// In-memory mixer, used for dry runs and when no sound server is wanted.
#[derive(Debug, Clone)]
pub struct SoftwareMixer {
    range: (f32, f32),
    level: f32,
}

impl SoftwareMixer {
    /// Starts at the top of `range`.
    pub fn new(range: (f32, f32)) -> Self {
        Self {
            range,
            level: range.1,
        }
    }
}

impl AudioEndpoint for SoftwareMixer {
    fn volume_range(&self) -> Result<(f32, f32), AudioError> {
        Ok(self.range)
    }

    fn master_volume(&self) -> Result<f32, AudioError> {
        Ok(self.level)
    }

    fn set_master_volume(&mut self, level: f32) -> Result<(), AudioError> {
        self.level = level.clamp(self.range.0, self.range.1);
        Ok(())
    }
}
