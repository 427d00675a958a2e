use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Placement rule for a spotlight target around its light.
///
/// The rig revisions disagree on this: the first places the target at
/// `(r cos θ, r sin θ)`, a later one adds 180° to the heading and another
/// swaps the two functions. Each layout pins the rule it was tuned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleConvention {
    #[default]
    Standard,
    Reversed,
    Swapped,
}

impl AngleConvention {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::Standard),
            "reversed" => Some(Self::Reversed),
            "swapped" => Some(Self::Swapped),
            _ => None,
        }
    }
}

/// Horizontal offset `(x, z)` of a target at `heading_deg` and `radius`.
pub fn target_offset(heading_deg: f32, radius: f32, convention: AngleConvention) -> Vec2 {
    match convention {
        AngleConvention::Standard => {
            let theta = heading_deg.to_radians();
            Vec2::new(radius * theta.cos(), radius * theta.sin())
        }
        AngleConvention::Reversed => {
            let theta = (heading_deg + 180.0).to_radians();
            Vec2::new(radius * theta.cos(), radius * theta.sin())
        }
        AngleConvention::Swapped => {
            let theta = heading_deg.to_radians();
            Vec2::new(radius * theta.sin(), radius * theta.cos())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn standard_matches_polar_placement() {
        for degrees in (-180..=180).step_by(15) {
            let degrees = degrees as f32;
            let theta = degrees * PI / 180.0;
            let offset = target_offset(degrees, 30.0, AngleConvention::Standard);
            assert!(close(offset, Vec2::new(30.0 * theta.cos(), 30.0 * theta.sin())));
        }
    }

    #[test]
    fn reversed_mirrors_standard() {
        let standard = target_offset(-45.0, 30.0, AngleConvention::Standard);
        let reversed = target_offset(-45.0, 30.0, AngleConvention::Reversed);
        assert!(close(reversed, -standard));
    }

    #[test]
    fn swapped_exchanges_axes() {
        let offset = target_offset(90.0, 10.0, AngleConvention::Swapped);
        assert!(close(offset, Vec2::new(10.0, 0.0)));
        let offset = target_offset(0.0, 10.0, AngleConvention::Swapped);
        assert!(close(offset, Vec2::new(0.0, 10.0)));
    }
}
