//! The player's collision volume: a sphere swept along a segment.

use bevy::math::Vec3;

use crate::geometry::Segment;

/// Swept sphere between `start` and `end`.
///
/// The endpoints are not required to be ordered vertically. Values are
/// assumed finite; NaN handling is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl Capsule {
    /// Create a capsule. `radius` must be positive.
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
        debug_assert!(radius > 0.0, "capsule radius must be positive");
        Self { start, end, radius }
    }

    /// Upright capsule whose lower endpoint sits at `base`.
    pub fn upright(base: Vec3, axis_length: f32, radius: f32) -> Self {
        Self::new(base, base + Vec3::Y * axis_length, radius)
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.start += delta;
        self.end += delta;
    }

    pub fn copy_from(&mut self, other: &Capsule) {
        *self = *other;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Offset from `start` to `end`.
    pub fn axis(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn axis_length(&self) -> f32 {
        self.axis().length()
    }

    pub fn segment(&self) -> Segment {
        Segment::new(self.start, self.end)
    }

    /// The endpoint with the smaller Y.
    pub fn lower_endpoint(&self) -> Vec3 {
        if self.start.y <= self.end.y {
            self.start
        } else {
            self.end
        }
    }

    /// The endpoint with the larger Y.
    pub fn upper_endpoint(&self) -> Vec3 {
        if self.start.y <= self.end.y {
            self.end
        } else {
            self.start
        }
    }

    /// Lowest Y reached by the swept sphere.
    pub fn bottom(&self) -> f32 {
        self.start.y.min(self.end.y) - self.radius
    }

    /// Move the capsule so `start` lands on `position`, keeping the axis.
    pub fn place_start_at(&mut self, position: Vec3) {
        let axis = self.axis();
        self.start = position;
        self.end = position + axis;
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.radius.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_moves_both_endpoints() {
        let mut capsule = Capsule::upright(Vec3::new(0.0, 7.0, 6.0), 1.0, 0.35);
        capsule.translate(Vec3::new(1.0, -2.0, 0.5));
        assert_eq!(capsule.start, Vec3::new(1.0, 5.0, 6.5));
        assert_eq!(capsule.end, Vec3::new(1.0, 6.0, 6.5));
        assert_eq!(capsule.radius(), 0.35);
    }

    #[test]
    fn test_endpoints_need_not_be_ordered() {
        let capsule = Capsule::new(Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO, 0.5);
        assert_eq!(capsule.lower_endpoint(), Vec3::ZERO);
        assert_eq!(capsule.upper_endpoint(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(capsule.bottom(), -0.5);
        assert_eq!(capsule.axis_length(), 2.0);
    }

    #[test]
    fn test_place_start_preserves_axis() {
        let mut capsule = Capsule::new(Vec3::ZERO, Vec3::new(0.2, 1.0, 0.0), 0.3);
        capsule.place_start_at(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(capsule.end, Vec3::new(5.2, 6.0, 5.0));

        let mut copy = Capsule::upright(Vec3::ZERO, 3.0, 1.0);
        copy.copy_from(&capsule);
        assert_eq!(copy, capsule);
    }
}
