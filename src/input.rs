//! Landmark frame adapter: JSON lines from an external hand tracker.
//!
//! One object per line:
//!
//! ```text
//! {"t_ms": 1234, "hands": [[[x, y], [x, y], ...], ...]}
//! ```
//!
//! `t_ms` is optional; when present it replaces the wall clock so recorded
//! sessions replay with their original timing.

use serde::Deserialize;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    time::{Duration, Instant},
};
use thiserror::Error;

use crate::config::FrameSettings;
use crate::hand::{Hand, HandError, Landmark};

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to read frame: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: malformed frame: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: hand {hand}: {source}")]
    Hand {
        line: usize,
        hand: usize,
        #[source]
        source: HandError,
    },
    #[error("line {line}: timestamp {t_ms}ms is before {prev_ms}ms")]
    TimeWentBackwards { line: usize, t_ms: u64, prev_ms: u64 },
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    t_ms: Option<u64>,
    #[serde(default)]
    hands: Vec<Vec<[f32; 2]>>,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub hands: Vec<Hand>,
    pub at: Instant,
}

pub struct FrameReader<R> {
    reader: R,
    settings: FrameSettings,
    line_no: usize,
    start: Instant,
    last_t_ms: Option<u64>,
    buf: String,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R, settings: FrameSettings) -> Self {
        Self {
            reader,
            settings,
            line_no: 0,
            start: Instant::now(),
            last_t_ms: None,
            buf: String::new(),
        }
    }

    pub fn set_settings(&mut self, settings: FrameSettings) {
        self.settings = settings;
    }

    fn parse(&mut self, line: &str) -> Result<Frame, FrameError> {
        let raw: RawFrame = serde_json::from_str(line).map_err(|source| FrameError::Malformed {
            line: self.line_no,
            source,
        })?;

        let at = match raw.t_ms {
            Some(t_ms) => {
                if let Some(prev_ms) = self.last_t_ms.filter(|prev| t_ms < *prev) {
                    return Err(FrameError::TimeWentBackwards {
                        line: self.line_no,
                        t_ms,
                        prev_ms,
                    });
                }
                self.last_t_ms = Some(t_ms);
                self.start + Duration::from_millis(t_ms)
            }
            None => Instant::now(),
        };

        let hands = raw
            .hands
            .iter()
            .enumerate()
            .map(|(i, pts)| {
                let lms = pts.iter().map(|&[x, y]| self.to_pixels(x, y)).collect();
                Hand::new(lms).map_err(|source| FrameError::Hand {
                    line: self.line_no,
                    hand: i,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Frame { hands, at })
    }

    fn to_pixels(&self, x: f32, y: f32) -> Landmark {
        let w = self.settings.width as f32;
        let h = self.settings.height as f32;
        if self.settings.normalized {
            let x = if self.settings.mirror { 1.0 - x } else { x };
            // trackers report sub-pixel positions; snap to whole pixels
            Landmark::new((x * w).trunc(), (y * h).trunc())
        } else {
            let x = if self.settings.mirror { w - x } else { x };
            Landmark::new(x, y)
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_no += 1;
            let line = std::mem::take(&mut self.buf);
            if line.trim().is_empty() {
                continue;
            }
            let res = self.parse(line.trim());
            self.buf = line;
            return Some(res);
        }
    }
}

/// Stdin for `None` or `-`, otherwise the named file.
pub fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    match path {
        None => Ok(Box::new(io::stdin().lock())),
        Some(p) if p.as_os_str() == "-" => Ok(Box::new(io::stdin().lock())),
        Some(p) => Ok(Box::new(BufReader::new(File::open(p)?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str, settings: FrameSettings) -> FrameReader<&[u8]> {
        FrameReader::new(text.as_bytes(), settings)
    }

    fn hand_json(x: f32, y: f32) -> String {
        let pts: Vec<String> = (0..21).map(|_| format!("[{x},{y}]")).collect();
        format!("[{}]", pts.join(","))
    }

    #[test]
    fn reads_hands_and_skips_blank_lines() {
        let text = format!(
            "{{\"hands\": [{}, {}]}}\n\n{{}}\n",
            hand_json(10.0, 20.0),
            hand_json(300.0, 20.0)
        );
        let frames: Vec<_> = reader(&text, FrameSettings::default()).collect();
        assert_eq!(frames.len(), 2);
        let first = frames[0].as_ref().unwrap();
        assert_eq!(first.hands.len(), 2);
        assert_eq!(first.hands[1].wrist(), Landmark::new(300.0, 20.0));
        assert!(frames[1].as_ref().unwrap().hands.is_empty());
    }

    #[test]
    fn normalized_points_scale_and_mirror() {
        let settings = FrameSettings {
            width: 640,
            height: 480,
            normalized: true,
            mirror: true,
        };
        let text = "{\"hands\": [[[0.25, 0.5], [0.1001, 0.9999]]]}\n";
        let frame = reader(text, settings).next().unwrap().unwrap();
        let hand = &frame.hands[0];
        assert_eq!(hand.wrist(), Landmark::new(480.0, 240.0));
        assert_eq!(hand.get(1), Some(Landmark::new(575.0, 479.0)));
    }

    #[test]
    fn pixel_points_mirror_about_width() {
        let settings = FrameSettings {
            mirror: true,
            ..FrameSettings::default()
        };
        let frame = reader("{\"hands\": [[[40, 7]]]}", settings)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(frame.hands[0].wrist(), Landmark::new(600.0, 7.0));
    }

    #[test]
    fn replay_timestamps_drive_the_clock() {
        let text = "{\"t_ms\": 0}\n{\"t_ms\": 1500}\n";
        let frames: Vec<_> = reader(text, FrameSettings::default())
            .map(|f| f.unwrap())
            .collect();
        assert_eq!(frames[1].at - frames[0].at, Duration::from_millis(1500));
    }

    #[test]
    fn backwards_timestamp_is_rejected_and_reader_continues() {
        let text = "{\"t_ms\": 100}\n{\"t_ms\": 50}\n{\"t_ms\": 150}\n";
        let frames: Vec<_> = reader(text, FrameSettings::default()).collect();
        assert!(matches!(
            frames[1],
            Err(FrameError::TimeWentBackwards { line: 2, t_ms: 50, prev_ms: 100 })
        ));
        assert!(frames[2].is_ok());
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let text = "{}\nnot json\n";
        let frames: Vec<_> = reader(text, FrameSettings::default()).collect();
        assert!(matches!(frames[1], Err(FrameError::Malformed { line: 2, .. })));
    }

    #[test]
    fn oversized_hand_is_rejected() {
        let pts: Vec<String> = (0..22).map(|_| "[1,1]".to_string()).collect();
        let text = format!("{{\"hands\": [[{}]]}}", pts.join(","));
        let res = reader(&text, FrameSettings::default()).next().unwrap();
        assert!(matches!(
            res,
            Err(FrameError::Hand {
                hand: 0,
                source: HandError::TooManyLandmarks(22),
                ..
            })
        ));
    }
}
