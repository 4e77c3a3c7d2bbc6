use crate::hand::{Hand, INDEX_TIP, THUMB_TIP};

/// Thumb tip to index tip, or `None` for a partial hand missing either.
pub fn pinch_distance(hand: &Hand) -> Option<f32> {
    let thumb = hand.get(THUMB_TIP)?;
    let index = hand.get(INDEX_TIP)?;
    Some(thumb.distance(&index))
}

/// Linear interpolation of `x` from `from` onto `to`, clamped to the ends.
/// Expects `from.0 < from.1`.
pub fn interp(x: f32, from: (f32, f32), to: (f32, f32)) -> f32 {
    if x <= from.0 {
        return to.0;
    }
    if x >= from.1 {
        return to.1;
    }
    let t = (x - from.0) / (from.1 - from.0);
    to.0 + t * (to.1 - to.0)
}

#[derive(Debug, Clone)]
pub struct VolumeMapper {
    pinch_px: (f32, f32),
}

impl VolumeMapper {
    pub fn new(pinch_min_px: f32, pinch_max_px: f32) -> Self {
        Self {
            pinch_px: (pinch_min_px, pinch_max_px),
        }
    }

    /// Endpoint level for a pinch distance within the endpoint's `range`.
    pub fn level(&self, distance: f32, range: (f32, f32)) -> f32 {
        interp(distance, self.pinch_px, range)
    }

    /// Whole percent, truncated.
    pub fn percent(&self, distance: f32) -> u8 {
        interp(distance, self.pinch_px, (0.0, 100.0)) as u8
    }
}
