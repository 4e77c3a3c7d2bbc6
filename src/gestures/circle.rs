//! Sliding-window loop detection on the secondary index fingertip.
//!
//! A loop is a window that covers a lot of ground (`path`) while staying
//! close to its own centroid (`spread`). Long straight strokes have a large
//! spread; jitter in place has a short path.

use std::collections::VecDeque;

use crate::hand::Landmark;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStats {
    /// Sum of distances between consecutive samples.
    pub path: f32,
    /// Mean distance of the samples from their centroid.
    pub spread: f32,
}

pub fn measure<'a>(points: impl ExactSizeIterator<Item = &'a Landmark> + Clone) -> PathStats {
    let n = points.len();
    if n == 0 {
        return PathStats {
            path: 0.0,
            spread: 0.0,
        };
    }

    let path = points
        .clone()
        .zip(points.clone().skip(1))
        .map(|(a, b)| a.distance(b))
        .sum();

    let (sx, sy) = points
        .clone()
        .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    let centroid = Landmark::new(sx / n as f32, sy / n as f32);
    let spread = points.map(|p| p.distance(&centroid)).sum::<f32>() / n as f32;

    PathStats { path, spread }
}

#[derive(Debug)]
pub struct CircleDetector {
    window: usize,
    min_path: f32,
    max_spread: f32,
    buf: VecDeque<Landmark>,
}

impl CircleDetector {
    pub fn new(window: usize, min_path: f32, max_spread: f32) -> Self {
        Self {
            window,
            min_path,
            max_spread,
            buf: VecDeque::with_capacity(window + 1),
        }
    }

    /// Swap thresholds, dropping the oldest samples if the window shrank.
    pub fn configure(&mut self, window: usize, min_path: f32, max_spread: f32) {
        self.window = window;
        self.min_path = min_path;
        self.max_spread = max_spread;
        while self.buf.len() > self.window {
            self.buf.pop_front();
        }
    }

    pub fn push(&mut self, p: Landmark) {
        self.buf.push_back(p);
        while self.buf.len() > self.window {
            self.buf.pop_front();
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.window
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Classify the current window. Only a full window can be a loop.
    pub fn is_loop(&self) -> bool {
        if !self.is_full() {
            return false;
        }
        let stats = measure(self.buf.iter());
        stats.path > self.min_path && stats.spread < self.max_spread
    }
}
