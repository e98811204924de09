//! 2D vector math for positions, velocities and steering.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tolerance for float comparisons in conversions
pub const EPSILON: f64 = 1e-9;

/// A 2D cartesian vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn dot(&self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn lerp(&self, target: Vec2, amount: f64) -> Vec2 {
        Vec2::new(
            lerp(self.x, target.x, amount),
            lerp(self.y, target.y, amount),
        )
    }

    pub fn distance(&self, other: Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Angle from this point towards another, in radians
    pub fn angle_to(&self, other: Vec2) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Express this point relative to `origin` in polar form
    pub fn to_polar(&self, origin: Vec2) -> PolarVec2 {
        PolarVec2 {
            magnitude: origin.distance(*self),
            direction: origin.angle_to(*self),
        }
    }

    /// A uniformly random point within `radius` of this one
    pub fn random_offset<R: Rng>(&self, radius: f64, rng: &mut R) -> Vec2 {
        let offset = PolarVec2 {
            magnitude: rng.gen::<f64>() * radius,
            direction: rng.gen::<f64>() * std::f64::consts::TAU,
        };
        self.add(offset.to_cartesian())
    }
}

/// A 2D vector in polar form
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarVec2 {
    pub magnitude: f64,
    /// Radians, anticlockwise from the positive x axis
    pub direction: f64,
}

impl PolarVec2 {
    pub fn new(magnitude: f64, direction: f64) -> Self {
        Self {
            magnitude,
            direction,
        }
    }

    pub fn to_cartesian(&self) -> Vec2 {
        Vec2::new(
            self.direction.cos() * self.magnitude,
            self.direction.sin() * self.magnitude,
        )
    }
}

pub fn lerp(start: f64, target: f64, amount: f64) -> f64 {
    (1.0 - amount) * start + amount * target
}

/// Uniform random float in `[min, max)`.
///
/// Panics when `min >= max`: an empty range is a misconfiguration, not a
/// runtime condition to recover from.
pub fn rand_float<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    assert!(
        min < max,
        "rand_float: min of {} is not below max of {}",
        min,
        max
    );
    rng.gen_range(min..max)
}
