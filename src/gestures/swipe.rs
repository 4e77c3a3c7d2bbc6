/// Rightward fingertip travel from an anchor x. Leftward motion never fires.
#[derive(Debug)]
pub struct SwipeDetector {
    min_px: f32,
    anchor: Option<f32>,
}

impl SwipeDetector {
    pub fn new(min_px: f32) -> Self {
        Self { min_px, anchor: None }
    }

    pub fn set_min_px(&mut self, px: f32) {
        self.min_px = px;
    }

    #[cfg(test)]
    pub fn anchor(&self) -> Option<f32> {
        self.anchor
    }

    pub fn reset(&mut self) {
        self.anchor = None;
    }

    /// Returns true when `x` is more than `min_px` right of the anchor. The
    /// anchor is then dropped so the next sample re-anchors.
    pub fn update(&mut self, x: f32) -> bool {
        match self.anchor {
            None => {
                self.anchor = Some(x);
                false
            }
            Some(a) if x - a > self.min_px => {
                self.anchor = None;
                true
            }
            Some(_) => false,
        }
    }
}
