//! Complex sample type and the handful of operations the pipeline needs beyond
//! what `num_complex` already provides (add/sub/mul/conj).

use crate::error::{OfdmError, Result};
use std::f64::consts::PI;

pub type Complex = num_complex::Complex64;

/// Divisors with |z| below this are treated as zero
pub const DIVISION_EPSILON: f64 = f64::EPSILON;

pub trait ComplexExt: Sized {
    /// sqrt(re² + im²)
    fn magnitude(&self) -> f64;

    /// atan2(im, re) folded into (-π, π]
    fn phase(&self) -> f64;

    /// Complex division that refuses a (near) zero divisor instead of producing inf/NaN
    fn checked_div(&self, divisor: Self) -> Result<Self>;
}

impl ComplexExt for Complex {
    fn magnitude(&self) -> f64 {
        self.norm()
    }

    fn phase(&self) -> f64 {
        let phase = self.im.atan2(self.re);
        if phase <= -PI {
            PI
        } else {
            phase
        }
    }

    fn checked_div(&self, divisor: Self) -> Result<Self> {
        // Negated comparison so a NaN divisor is rejected too
        if !(divisor.norm() >= DIVISION_EPSILON) {
            return Err(OfdmError::DegenerateDivision);
        }
        let denominator = divisor.norm_sqr();
        Ok(Complex::new(
            (self.re * divisor.re + self.im * divisor.im) / denominator,
            (self.im * divisor.re - self.re * divisor.im) / denominator,
        ))
    }
}

/// Wrap an angle into (-π, π]
pub fn wrap_phase(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}
