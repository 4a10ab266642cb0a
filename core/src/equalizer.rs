use crate::complex::{Complex, ComplexExt};
use crate::error::{OfdmError, Result};
use crate::ZF_MAGNITUDE_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One-tap per-subcarrier equalizers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equalizer {
    /// y / H
    ZeroForcing,
    /// y·H* / (|H|² + 1/SNR)
    #[default]
    Mmse,
}

impl Equalizer {
    pub fn apply(&self, symbols: &[Complex], estimate: &[Complex], snr_db: f64) -> Result<Vec<Complex>> {
        if symbols.len() != estimate.len() {
            return Err(OfdmError::LengthMismatch {
                expected: estimate.len(),
                actual: symbols.len(),
            });
        }
        Ok(match self {
            Equalizer::ZeroForcing => zero_forcing(symbols, estimate),
            Equalizer::Mmse => mmse(symbols, estimate, snr_db_to_linear(snr_db)),
        })
    }
}

impl fmt::Display for Equalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Equalizer::ZeroForcing => f.write_str("zf"),
            Equalizer::Mmse => f.write_str("mmse"),
        }
    }
}

impl FromStr for Equalizer {
    type Err = OfdmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zf" | "zeroforcing" | "zero-forcing" => Ok(Equalizer::ZeroForcing),
            "mmse" => Ok(Equalizer::Mmse),
            _ => Err(OfdmError::ParameterOutOfRange(format!(
                "unknown equalizer '{}'",
                s
            ))),
        }
    }
}

pub fn snr_db_to_linear(snr_db: f64) -> f64 {
    10f64.powf(snr_db / 10.0)
}

/// Zero-forcing; subcarriers where |H| is below tolerance come out as zero
pub fn zero_forcing(symbols: &[Complex], estimate: &[Complex]) -> Vec<Complex> {
    let mut nulls = 0usize;
    let equalized = symbols
        .iter()
        .zip(estimate.iter())
        .map(|(y, &h)| {
            if h.magnitude() < ZF_MAGNITUDE_TOLERANCE {
                nulls += 1;
                return Complex::new(0.0, 0.0);
            }
            y.checked_div(h).unwrap_or_else(|_| {
                nulls += 1;
                Complex::new(0.0, 0.0)
            })
        })
        .collect();

    if nulls > 0 {
        log::debug!("Zero-forcing zeroed {} subcarrier(s) at channel nulls", nulls);
    }
    equalized
}

/// Linear MMSE (Wiener) equalization with the given linear SNR
pub fn mmse(symbols: &[Complex], estimate: &[Complex], snr_linear: f64) -> Vec<Complex> {
    let regularization = 1.0 / snr_linear;
    symbols
        .iter()
        .zip(estimate.iter())
        .map(|(&y, &h)| {
            let denominator = h.norm_sqr() + regularization;
            y * h.conj() / denominator
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_forcing_inverts_channel() {
        let x = vec![Complex::new(1.0, -1.0), Complex::new(-0.5, 0.25)];
        let h = vec![Complex::new(0.3, 0.4), Complex::new(-2.0, 1.0)];
        let y: Vec<Complex> = x.iter().zip(h.iter()).map(|(a, b)| a * b).collect();

        let eq = zero_forcing(&y, &h);
        for (a, b) in eq.iter().zip(x.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_zero_forcing_null_gives_zero() {
        let y = vec![Complex::new(1.0, 1.0), Complex::new(2.0, 0.0)];
        let h = vec![Complex::new(0.0, 0.0), Complex::new(1e-12, 0.0)];
        let eq = zero_forcing(&y, &h);
        assert!(eq.iter().all(|s| *s == Complex::new(0.0, 0.0)));
        assert!(eq.iter().all(|s| s.re.is_finite() && s.im.is_finite()));
    }

    #[test]
    fn test_mmse_approaches_zf_at_high_snr() {
        let y = vec![Complex::new(0.6, 0.2)];
        let h = vec![Complex::new(0.5, -0.5)];
        let zf = zero_forcing(&y, &h);
        let eq = mmse(&y, &h, snr_db_to_linear(100.0));
        assert!((zf[0] - eq[0]).norm() < 1e-6);
    }

    #[test]
    fn test_mmse_shrinks_at_deep_fade() {
        let y = vec![Complex::new(0.01, 0.0)];
        let h = vec![Complex::new(0.01, 0.0)];
        // SNR 10 dB: 0.01·0.01 / (1e-4 + 0.1)
        let eq = mmse(&y, &h, 10.0);
        assert!((eq[0].re - 1e-4 / 0.1001).abs() < 1e-12);
        assert!(eq[0].im.abs() < 1e-15);

        let eq = mmse(&y, &[Complex::new(0.0, 0.0)], 10.0);
        assert_eq!(eq[0], Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_apply_dispatch() {
        let y = vec![Complex::new(1.0, 0.0); 4];
        let h = vec![Complex::new(2.0, 0.0); 4];
        let zf = Equalizer::ZeroForcing.apply(&y, &h, 20.0).unwrap();
        assert!((zf[0].re - 0.5).abs() < 1e-12);

        let mm = Equalizer::default().apply(&y, &h, 20.0).unwrap();
        assert!((mm[0].re - 2.0 / 4.01).abs() < 1e-12);

        assert!(matches!(
            Equalizer::Mmse.apply(&y, &h[..3], 20.0),
            Err(OfdmError::LengthMismatch { expected: 3, actual: 4 })
        ));
    }

    #[test]
    fn test_snr_conversion() {
        assert!((snr_db_to_linear(0.0) - 1.0).abs() < 1e-12);
        assert!((snr_db_to_linear(30.0) - 1000.0).abs() < 1e-9);
    }
}
