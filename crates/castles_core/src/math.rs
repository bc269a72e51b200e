//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation arithmetic uses fixed-point numbers so that the same
//! inputs produce the same battle on every platform. Floating-point
//! operations can produce different results on different CPUs.
//!
//! The arena is one-dimensional: positions and distances are scalar
//! [`Fixed`] values, and time is carried as fixed-point milliseconds
//! ([`TimeMs`]) so that global-scale division stays exact for binary
//! fractions.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Simulation timestamps and durations, in fixed-point milliseconds.
pub type TimeMs = Fixed;

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

/// Serde support for `Option<Fixed>`.
pub mod option_fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize an optional fixed-point number.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => v.to_bits().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<i64>::deserialize(deserializer)?;
        Ok(opt.map(Fixed::from_bits))
    }
}

/// Absolute horizontal distance between two positions.
#[must_use]
pub fn dist_x(a: Fixed, b: Fixed) -> Fixed {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Clamp a value to an inclusive range.
#[must_use]
pub fn clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// One full turn of the sine argument.
pub const TAU: Fixed = Fixed::unwrapped_from_str("6.2831853071");

const PI: Fixed = Fixed::unwrapped_from_str("3.1415926535");

/// Approximate sine of a fixed-point angle in radians.
///
/// Uses the Bhaskara I approximation after range reduction, accurate to
/// roughly 0.002 over the full circle. That is far more precision than
/// the hop-gait duty cycle needs, and unlike `f64::sin` it gives
/// bit-identical results everywhere.
#[must_use]
pub fn fixed_sin(angle: Fixed) -> Fixed {
    // Reduce to [0, tau).
    let mut x = angle % TAU;
    if x < Fixed::ZERO {
        x += TAU;
    }

    // Second half of the circle mirrors the first with opposite sign.
    let (x, sign) = if x > PI {
        (x - PI, -Fixed::ONE)
    } else {
        (x, Fixed::ONE)
    };

    // Bhaskara I: sin(x) ~ 16x(pi - x) / (5pi^2 - 4x(pi - x)) on [0, pi].
    let num = Fixed::from_num(16) * x * (PI - x);
    let den = Fixed::from_num(5) * PI * PI - Fixed::from_num(4) * x * (PI - x);
    sign * num / den
}

/// Normalized sine: maps the full sine wave onto [0, 1].
///
/// This is the waveform the hop movement pattern samples against its
/// duty-cycle threshold.
#[must_use]
pub fn fixed_sin01(angle: Fixed) -> Fixed {
    (fixed_sin(angle) + Fixed::ONE) / Fixed::from_num(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Fixed, b: f64, eps: f64) -> bool {
        (a.to_num::<f64>() - b).abs() < eps
    }

    #[test]
    fn test_dist_x_symmetric() {
        let a = Fixed::from_num(3);
        let b = Fixed::from_num(10);
        assert_eq!(dist_x(a, b), Fixed::from_num(7));
        assert_eq!(dist_x(b, a), Fixed::from_num(7));
    }

    #[test]
    fn test_clamp_bounds() {
        let lo = Fixed::from_num(0);
        let hi = Fixed::from_num(50);
        assert_eq!(clamp(Fixed::from_num(-3), lo, hi), lo);
        assert_eq!(clamp(Fixed::from_num(99), lo, hi), hi);
        assert_eq!(clamp(Fixed::from_num(25), lo, hi), Fixed::from_num(25));
    }

    #[test]
    fn test_fixed_sin_key_angles() {
        assert!(close(fixed_sin(Fixed::ZERO), 0.0, 0.005));
        assert!(close(fixed_sin(PI / Fixed::from_num(2)), 1.0, 0.005));
        assert!(close(fixed_sin(PI), 0.0, 0.005));
        assert!(close(
            fixed_sin(PI + PI / Fixed::from_num(2)),
            -1.0,
            0.005
        ));
    }

    #[test]
    fn test_fixed_sin_negative_angles() {
        let x = Fixed::from_num(1.3);
        let a = fixed_sin(-x);
        let b = -fixed_sin(x);
        assert!((a - b).abs() < Fixed::from_num(0.01));
    }

    #[test]
    fn test_fixed_sin01_range() {
        let mut angle = Fixed::ZERO;
        let step = Fixed::from_num(0.1);
        for _ in 0..100 {
            let v = fixed_sin01(angle);
            assert!(v >= Fixed::from_num(-0.01) && v <= Fixed::from_num(1.01));
            angle += step;
        }
    }

    #[test]
    fn test_fixed_sin_determinism() {
        let x = Fixed::from_num(2.5);
        assert_eq!(fixed_sin(x), fixed_sin(x));
    }
}
