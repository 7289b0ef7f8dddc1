//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation uses fixed-point arithmetic so that identical inputs
//! produce identical matches on every platform. Square root and the
//! trigonometric functions used for orbiting are implemented here on top
//! of [`Fixed`] rather than with floating-point intrinsics.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// π in [`Fixed`] precision.
pub const PI: Fixed = Fixed::from_bits(13_493_037_705);

/// π / 2 in [`Fixed`] precision.
pub const FRAC_PI_2: Fixed = Fixed::from_bits(6_746_518_852);

/// 2π in [`Fixed`] precision.
pub const TAU: Fixed = Fixed::from_bits(26_986_075_409);

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for hand-written data files.
///
/// Level and rules files are edited by people, so fixed-point values are
/// written as decimal numbers (`time_between_spawns: 3.0`) and rounded to
/// the nearest representable [`Fixed`] when loaded. The conversion is exact
/// and platform-independent.
pub mod fixed_decimal_serde {
    use super::Fixed;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`Fixed::MAX`] for points too far apart to square.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Squared length of the vector.
    #[must_use]
    pub fn length_squared(self) -> Fixed {
        self.dot(self)
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.length_squared())
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        // keep the squared length in range for long vectors
        let largest = self.x.abs().max(self.y.abs());
        if largest > Fixed::from_num(1) {
            return Self::new(self.x / largest, self.y / largest).normalize();
        }

        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Rotate this point counter-clockwise around `center` by `angle` radians.
    #[must_use]
    pub fn rotate_about(self, center: Self, angle: Fixed) -> Self {
        let (sin, cos) = fixed_sin_cos(angle);
        let offset = self - center;
        center
            + Self::new(
                offset.x * cos - offset.y * sin,
                offset.x * sin + offset.y * cos,
            )
    }

    /// Unit vector pointing at `angle` radians, measured the way the orbit
    /// ring is sampled: `(sin, cos)`.
    #[must_use]
    pub fn from_angle(angle: Fixed) -> Self {
        let (sin, cos) = fixed_sin_cos(angle);
        Self::new(sin, cos)
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Sine and cosine of `angle` radians.
///
/// The angle is reduced to `[-π/2, π/2]` and evaluated with a degree-9
/// Taylor polynomial, accurate to about 4e-6 over the reduced range.
#[must_use]
pub fn fixed_sin_cos(angle: Fixed) -> (Fixed, Fixed) {
    (fixed_sin(angle), fixed_sin(angle + FRAC_PI_2))
}

fn fixed_sin(angle: Fixed) -> Fixed {
    let mut x = angle % TAU;
    if x > PI {
        x -= TAU;
    } else if x < -PI {
        x += TAU;
    }
    if x > FRAC_PI_2 {
        x = PI - x;
    } else if x < -FRAC_PI_2 {
        x = -PI - x;
    }

    let one = Fixed::from_num(1);
    let x2 = x * x;
    let mut term = one - x2 / Fixed::from_num(72);
    term = one - x2 / Fixed::from_num(42) * term;
    term = one - x2 / Fixed::from_num(20) * term;
    term = one - x2 / Fixed::from_num(6) * term;
    x * term
}

/// Convert degrees to radians.
#[must_use]
pub fn degrees_to_radians(degrees: Fixed) -> Fixed {
    degrees * PI / Fixed::from_num(180)
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epsilon() -> Fixed {
        Fixed::from_num(1) / Fixed::from_num(10000)
    }

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(0));
        let b = Vec2Fixed::new(Fixed::from_num(0), Fixed::from_num(4));
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
        assert!((a.distance(b) - Fixed::from_num(5)).abs() < epsilon());
    }

    #[test]
    fn test_distance_squared_saturates_far_apart() {
        let origin = Vec2Fixed::ZERO;
        let far = Vec2Fixed::new(Fixed::from_num(50_000), Fixed::ZERO);

        assert_eq!(origin.distance_squared(far), Fixed::MAX);
        assert_eq!(far.length_squared(), Fixed::MAX);
        assert!(origin.distance(far) > Fixed::from_num(46_000));
    }

    #[test]
    fn test_fixed_sqrt_of_small_values() {
        let quarter = Fixed::from_num(0.25);
        assert!((fixed_sqrt(quarter) - Fixed::from_num(0.5)).abs() < epsilon());
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(4));
        let norm = v.normalize();

        let len_sq = norm.dot(norm);
        let one = Fixed::from_num(1);
        assert!(
            (len_sq - one).abs() < epsilon(),
            "normalized vector length² should be ~1, got {:?}",
            len_sq
        );

        // x/y ratio matches original 3/4
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon(), "direction not preserved: {:?}", ratio_diff);
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);

        let long = Vec2Fixed::new(Fixed::from_num(900_000), Fixed::from_num(-1_200_000)).normalize();
        assert!((long.x - Fixed::from_num(0.6)).abs() < epsilon());
        assert!((long.y + Fixed::from_num(0.8)).abs() < epsilon());
    }

    #[test]
    fn test_sin_cos_known_angles() {
        let (s, c) = fixed_sin_cos(Fixed::ZERO);
        assert!(s.abs() < epsilon());
        assert!((c - Fixed::from_num(1)).abs() < epsilon());

        let (s, c) = fixed_sin_cos(FRAC_PI_2);
        assert!((s - Fixed::from_num(1)).abs() < epsilon());
        assert!(c.abs() < epsilon());

        let (s, c) = fixed_sin_cos(PI);
        assert!(s.abs() < epsilon());
        assert!((c + Fixed::from_num(1)).abs() < epsilon());

        // Out-of-range angles wrap
        let (s, _) = fixed_sin_cos(TAU + FRAC_PI_2);
        assert!((s - Fixed::from_num(1)).abs() < epsilon());
        let (s, _) = fixed_sin_cos(-FRAC_PI_2);
        assert!((s + Fixed::from_num(1)).abs() < epsilon());
    }

    #[test]
    fn test_rotate_about_preserves_radius() {
        let center = Vec2Fixed::new(Fixed::from_num(2), Fixed::from_num(2));
        let point = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(2));
        let rotated = point.rotate_about(center, FRAC_PI_2);

        assert!((rotated.x - Fixed::from_num(2)).abs() < epsilon());
        assert!((rotated.y - Fixed::from_num(3)).abs() < epsilon());
        assert!((rotated.distance(center) - Fixed::from_num(1)).abs() < epsilon());
    }

    #[test]
    fn test_degrees_to_radians() {
        let rad = degrees_to_radians(Fixed::from_num(180));
        assert!((rad - PI).abs() < epsilon());
    }

    #[test]
    fn test_decimal_serde_roundtrip_through_ron() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "fixed_decimal_serde")]
            value: Fixed,
        }

        let parsed: Wrapper = ron::from_str("(value: 0.5)").unwrap();
        assert_eq!(parsed.value, Fixed::from_num(0.5));
    }
}
