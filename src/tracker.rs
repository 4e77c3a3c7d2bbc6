//! Primary/secondary role assignment across frames.

use crate::hand::Hand;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub primary: Option<Hand>,
    pub secondary: Option<Hand>,
    /// The primary is the previous frame's hand, reused because the new
    /// leftmost hand jumped too far.
    pub carried: bool,
}

#[derive(Debug)]
pub struct IdentityResolver {
    stability_px: f32,
    primary: Option<Hand>,
}

impl IdentityResolver {
    pub fn new(stability_px: f32) -> Self {
        Self {
            stability_px,
            primary: None,
        }
    }

    pub fn set_stability_px(&mut self, px: f32) {
        self.stability_px = px;
    }

    /// Sort hands left to right by wrist x. The leftmost hand becomes primary
    /// unless a previous primary exists and the leftmost wrist is at least
    /// `stability_px` away from it, in which case the previous primary's
    /// landmarks are reused as-is. The second sorted hand is secondary.
    ///
    /// A frame without hands leaves the remembered primary untouched.
    pub fn resolve(&mut self, hands: &[Hand]) -> Resolution {
        let mut sorted: Vec<&Hand> = hands.iter().collect();
        // stable sort: equal x keeps adapter order
        sorted.sort_by(|a, b| a.wrist().x.total_cmp(&b.wrist().x));

        let Some(leftmost) = sorted.first() else {
            return Resolution::default();
        };

        let adopt = match &self.primary {
            None => true,
            Some(prev) => (prev.wrist().x - leftmost.wrist().x).abs() < self.stability_px,
        };
        if adopt {
            self.primary = Some((*leftmost).clone());
        }

        Resolution {
            primary: self.primary.clone(),
            secondary: sorted.get(1).map(|h| (*h).clone()),
            carried: !adopt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::testutil::hand_at;

    #[test]
    fn no_hands_resolves_nothing() {
        let mut r = IdentityResolver::new(50.0);
        let res = r.resolve(&[]);
        assert!(res.primary.is_none());
        assert!(res.secondary.is_none());
        assert!(!res.carried);
    }

    #[test]
    fn leftmost_is_primary_regardless_of_input_order() {
        let mut r = IdentityResolver::new(50.0);
        let res = r.resolve(&[hand_at(300.0, 200.0), hand_at(100.0, 200.0)]);
        assert_eq!(res.primary.unwrap().wrist().x, 100.0);
        assert_eq!(res.secondary.unwrap().wrist().x, 300.0);
    }

    #[test]
    fn shift_under_stability_adopts_new_leftmost() {
        let mut r = IdentityResolver::new(50.0);
        r.resolve(&[hand_at(100.0, 200.0), hand_at(300.0, 200.0)]);

        let res = r.resolve(&[hand_at(51.0, 200.0), hand_at(300.0, 200.0)]);
        assert!(!res.carried);
        assert_eq!(res.primary.unwrap().wrist().x, 51.0);
    }

    #[test]
    fn shift_over_stability_carries_previous_primary() {
        let mut r = IdentityResolver::new(50.0);
        r.resolve(&[hand_at(100.0, 200.0), hand_at(300.0, 200.0)]);

        let res = r.resolve(&[hand_at(49.0, 200.0), hand_at(300.0, 200.0)]);
        assert!(res.carried);
        assert_eq!(res.primary.unwrap().wrist().x, 100.0);
        assert_eq!(res.secondary.unwrap().wrist().x, 300.0);
    }

    #[test]
    fn exact_stability_distance_carries() {
        let mut r = IdentityResolver::new(50.0);
        r.resolve(&[hand_at(100.0, 200.0)]);
        let res = r.resolve(&[hand_at(150.0, 200.0)]);
        assert!(res.carried);
    }

    #[test]
    fn empty_frame_keeps_remembered_primary() {
        let mut r = IdentityResolver::new(50.0);
        r.resolve(&[hand_at(100.0, 200.0)]);
        r.resolve(&[]);
        let res = r.resolve(&[hand_at(400.0, 200.0)]);
        assert!(res.carried);
        assert_eq!(res.primary.unwrap().wrist().x, 100.0);
        assert!(res.secondary.is_none());
    }
}
