//! Pilot-aided least-squares channel estimation.
//!
//! The channel at each pilot is the received pilot divided by the known pilot
//! amplitude; the estimators differ only in how they fill the subcarriers between.

use crate::complex::{wrap_phase, Complex, ComplexExt};
use crate::error::{OfdmError, Result};
use crate::fft::{fft, ifft};
use crate::frame::PilotSamples;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Real and imaginary parts interpolated independently
    #[default]
    Linear,
    /// Magnitude and unwrapped phase interpolated independently
    Polar,
    /// Linear estimate denoised by truncating its delay-domain taps
    Dft,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interpolation::Linear => "linear",
            Interpolation::Polar => "polar",
            Interpolation::Dft => "dft",
        };
        f.write_str(name)
    }
}

impl FromStr for Interpolation {
    type Err = OfdmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Interpolation::Linear),
            "polar" => Ok(Interpolation::Polar),
            "dft" => Ok(Interpolation::Dft),
            _ => Err(OfdmError::ParameterOutOfRange(format!(
                "unknown interpolation '{}'",
                s
            ))),
        }
    }
}

/// Dispatches to one of the interpolation strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelEstimator {
    pub interpolation: Interpolation,
    /// First delay-domain tap zeroed by the DFT estimator; `None` means N/4 (at least 1)
    pub dft_threshold: Option<usize>,
}

impl ChannelEstimator {
    pub fn new(interpolation: Interpolation, dft_threshold: Option<usize>) -> Self {
        Self {
            interpolation,
            dft_threshold,
        }
    }

    pub fn estimate(
        &self,
        pilots: &PilotSamples,
        pilot_power: f64,
        num_subcarriers: usize,
    ) -> Result<Vec<Complex>> {
        match self.interpolation {
            Interpolation::Linear => least_squares_linear(pilots, pilot_power, num_subcarriers),
            Interpolation::Polar => least_squares_polar(pilots, pilot_power, num_subcarriers),
            Interpolation::Dft => {
                let threshold = self.dft_threshold.unwrap_or((num_subcarriers / 4).max(1));
                least_squares_dft(pilots, pilot_power, num_subcarriers, threshold)
            }
        }
    }
}

impl Default for ChannelEstimator {
    fn default() -> Self {
        Self::new(Interpolation::Linear, None)
    }
}

/// Where a subcarrier falls relative to the pilot comb
enum Bracket {
    /// At or outside the comb edge: reuse that pilot's value
    Edge(usize),
    /// Between pilots `j` and `j + 1`, at fractional position `weight`
    Between(usize, f64),
}

fn bracket(indices: &[usize], i: usize) -> Bracket {
    let last = indices.len() - 1;
    if i <= indices[0] {
        return Bracket::Edge(0);
    }
    if i >= indices[last] {
        return Bracket::Edge(last);
    }
    // Number of pilots at or before i; at least 1 here
    let j = indices.partition_point(|&p| p <= i) - 1;
    let (x1, x2) = (indices[j], indices[j + 1]);
    Bracket::Between(j, (i - x1) as f64 / (x2 - x1) as f64)
}

/// LS channel estimate at each pilot: y / pilot_power
fn channel_at_pilots(
    pilots: &PilotSamples,
    pilot_power: f64,
    num_subcarriers: usize,
) -> Result<Vec<Complex>> {
    if pilots.values.len() != pilots.indices.len() {
        return Err(OfdmError::LengthMismatch {
            expected: pilots.indices.len(),
            actual: pilots.values.len(),
        });
    }
    if pilots.indices.is_empty() {
        return Err(OfdmError::ParameterOutOfRange(
            "at least one pilot is required".to_string(),
        ));
    }
    if !pilot_power.is_finite() || pilot_power <= 0.0 {
        return Err(OfdmError::ParameterOutOfRange(format!(
            "pilot power must be positive, got {}",
            pilot_power
        )));
    }
    if pilots.indices.windows(2).any(|w| w[0] >= w[1]) {
        return Err(OfdmError::ParameterOutOfRange(
            "pilot indices must be strictly increasing".to_string(),
        ));
    }
    if let Some(&last) = pilots.indices.last() {
        if last >= num_subcarriers {
            return Err(OfdmError::ParameterOutOfRange(format!(
                "pilot index {} outside {} subcarriers",
                last, num_subcarriers
            )));
        }
    }

    Ok(pilots.values.iter().map(|&y| y / pilot_power).collect())
}

pub fn least_squares_linear(
    pilots: &PilotSamples,
    pilot_power: f64,
    num_subcarriers: usize,
) -> Result<Vec<Complex>> {
    let h = channel_at_pilots(pilots, pilot_power, num_subcarriers)?;

    Ok((0..num_subcarriers)
        .map(|i| match bracket(&pilots.indices, i) {
            Bracket::Edge(j) => h[j],
            Bracket::Between(j, weight) => {
                let (y1, y2) = (h[j], h[j + 1]);
                Complex::new(
                    y1.re + weight * (y2.re - y1.re),
                    y1.im + weight * (y2.im - y1.im),
                )
            }
        })
        .collect())
}

pub fn least_squares_polar(
    pilots: &PilotSamples,
    pilot_power: f64,
    num_subcarriers: usize,
) -> Result<Vec<Complex>> {
    let h = channel_at_pilots(pilots, pilot_power, num_subcarriers)?;
    let magnitudes: Vec<f64> = h.iter().map(|c| c.magnitude()).collect();
    let phases: Vec<f64> = h.iter().map(|c| c.phase()).collect();

    Ok((0..num_subcarriers)
        .map(|i| match bracket(&pilots.indices, i) {
            Bracket::Edge(j) => h[j],
            Bracket::Between(j, weight) => {
                let magnitude = magnitudes[j] + weight * (magnitudes[j + 1] - magnitudes[j]);
                // Shortest way round the circle
                let step = wrap_phase(phases[j + 1] - phases[j]);
                Complex::from_polar(magnitude, phases[j] + weight * step)
            }
        })
        .collect())
}

/// Linear estimate, then ifft → zero taps `threshold..` → fft.
///
/// `threshold` must lie in `[1, num_subcarriers / 2]`.
pub fn least_squares_dft(
    pilots: &PilotSamples,
    pilot_power: f64,
    num_subcarriers: usize,
    threshold: usize,
) -> Result<Vec<Complex>> {
    if threshold < 1 || threshold > num_subcarriers / 2 {
        return Err(OfdmError::ParameterOutOfRange(format!(
            "dft threshold {} outside [1, {}]",
            threshold,
            num_subcarriers / 2
        )));
    }

    let linear = least_squares_linear(pilots, pilot_power, num_subcarriers)?;
    let mut delay_taps = ifft(&linear)?;
    for tap in delay_taps.iter_mut().skip(threshold) {
        *tap = Complex::new(0.0, 0.0);
    }
    fft(&delay_taps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn pilots_from(indices: Vec<usize>, values: Vec<Complex>) -> PilotSamples {
        PilotSamples { values, indices }
    }

    #[test]
    fn test_linear_interpolation_and_edges() {
        let pilots = pilots_from(
            vec![2, 6],
            vec![Complex::new(2.0, 0.0), Complex::new(6.0, -4.0)],
        );
        let h = least_squares_linear(&pilots, 2.0, 9).unwrap();

        assert_eq!(h.len(), 9);
        // Flat before the first pilot and after the last
        assert_eq!(h[0], Complex::new(1.0, 0.0));
        assert_eq!(h[2], Complex::new(1.0, 0.0));
        assert_eq!(h[8], Complex::new(3.0, -2.0));
        // Midpoint
        assert!((h[4] - Complex::new(2.0, -1.0)).norm() < 1e-12);
        assert!((h[3] - Complex::new(1.5, -0.5)).norm() < 1e-12);
    }

    #[test]
    fn test_exact_at_pilots() {
        let indices: Vec<usize> = (0..64).step_by(8).collect();
        let values: Vec<Complex> = indices
            .iter()
            .map(|&i| Complex::from_polar(0.5 + i as f64 / 64.0, i as f64 * 0.7))
            .collect();
        let pilots = pilots_from(indices.clone(), values.clone());
        let power = 1.5;

        let linear = least_squares_linear(&pilots, power, 64).unwrap();
        let polar = least_squares_polar(&pilots, power, 64).unwrap();
        for (&i, y) in indices.iter().zip(values.iter()) {
            let expected = *y / power;
            assert_eq!(linear[i], expected);
            assert!((polar[i] - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_polar_unwraps_phase() {
        // Phases +100° and -100°: the short way crosses ±180°, not 0°
        let a = 100f64.to_radians();
        let pilots = pilots_from(
            vec![0, 4],
            vec![Complex::from_polar(1.0, a), Complex::from_polar(1.0, -a)],
        );
        let h = least_squares_polar(&pilots, 1.0, 5).unwrap();

        let mid = h[2];
        assert!((mid.norm() - 1.0).abs() < 1e-12);
        assert!((mid.phase().abs() - PI).abs() < 1e-9, "phase = {}", mid.phase());

        // Rectangular interpolation collapses through the origin instead
        let linear = least_squares_linear(&pilots, 1.0, 5).unwrap();
        assert!(linear[2].norm() < 0.2);
    }

    #[test]
    fn test_polar_interpolates_magnitude() {
        let pilots = pilots_from(
            vec![0, 4],
            vec![Complex::new(1.0, 0.0), Complex::new(3.0, 0.0)],
        );
        let h = least_squares_polar(&pilots, 1.0, 8).unwrap();
        assert!((h[1] - Complex::new(1.5, 0.0)).norm() < 1e-12);
        assert_eq!(h[7], Complex::new(3.0, 0.0));
    }

    #[test]
    fn test_single_pilot_is_flat() {
        let pilots = pilots_from(vec![0], vec![Complex::new(0.5, 0.5)]);
        let h = least_squares_linear(&pilots, 1.0, 8).unwrap();
        assert!(h.iter().all(|&c| c == Complex::new(0.5, 0.5)));
    }

    #[test]
    fn test_dft_preserves_short_channel() {
        // Two-tap channel sampled on every subcarrier: linear interpolation is exact,
        // and all energy sits in delay taps 0 and 1, below the threshold.
        let n = 32;
        let taps = [Complex::new(0.9, 0.1), Complex::new(0.3, -0.2)];
        let response: Vec<Complex> = (0..n)
            .map(|k| {
                let w = Complex::from_polar(1.0, -2.0 * PI * k as f64 / n as f64);
                taps[0] + taps[1] * w
            })
            .collect();
        let pilots = pilots_from((0..n).collect(), response.clone());

        let h = least_squares_dft(&pilots, 1.0, n, 8).unwrap();
        for (a, b) in h.iter().zip(response.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn test_dft_threshold_range() {
        let pilots = pilots_from(vec![0, 8], vec![Complex::new(1.0, 0.0); 2]);
        assert!(least_squares_dft(&pilots, 1.0, 16, 0).is_err());
        assert!(least_squares_dft(&pilots, 1.0, 16, 9).is_err());
        assert!(least_squares_dft(&pilots, 1.0, 16, 8).is_ok());
        assert!(least_squares_dft(&pilots, 1.0, 16, 1).is_ok());
    }

    #[test]
    fn test_dft_requires_power_of_two() {
        let pilots = pilots_from(vec![0, 6], vec![Complex::new(1.0, 0.0); 2]);
        assert_eq!(
            least_squares_dft(&pilots, 1.0, 12, 3),
            Err(OfdmError::InvalidLength(12))
        );
    }

    #[test]
    fn test_estimator_dispatch_and_default_threshold() {
        let pilots = pilots_from(
            vec![0, 8, 16, 24],
            vec![
                Complex::new(1.0, 0.0),
                Complex::new(0.0, 1.0),
                Complex::new(-1.0, 0.0),
                Complex::new(0.0, -1.0),
            ],
        );

        let linear = ChannelEstimator::default().estimate(&pilots, 1.0, 32).unwrap();
        assert_eq!(linear, least_squares_linear(&pilots, 1.0, 32).unwrap());

        let polar = ChannelEstimator::new(Interpolation::Polar, None)
            .estimate(&pilots, 1.0, 32)
            .unwrap();
        assert_eq!(polar, least_squares_polar(&pilots, 1.0, 32).unwrap());

        let dft = ChannelEstimator::new(Interpolation::Dft, None)
            .estimate(&pilots, 1.0, 32)
            .unwrap();
        assert_eq!(dft, least_squares_dft(&pilots, 1.0, 32, 8).unwrap());
    }

    #[test]
    fn test_default_threshold_on_tiny_frame() {
        // N/4 rounds to 0 for two subcarriers; the default keeps at least one tap
        let pilots = pilots_from(vec![0], vec![Complex::new(0.6, -0.2)]);
        let h = ChannelEstimator::new(Interpolation::Dft, None)
            .estimate(&pilots, 1.0, 2)
            .unwrap();
        assert_eq!(h.len(), 2);
        for c in &h {
            assert!((c - Complex::new(0.6, -0.2)).norm() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_pilots() {
        let empty = pilots_from(vec![], vec![]);
        assert!(least_squares_linear(&empty, 1.0, 8).is_err());

        let mismatched = pilots_from(vec![0, 4], vec![Complex::new(1.0, 0.0)]);
        assert!(matches!(
            least_squares_linear(&mismatched, 1.0, 8),
            Err(OfdmError::LengthMismatch { .. })
        ));

        let unordered = pilots_from(vec![4, 0], vec![Complex::new(1.0, 0.0); 2]);
        assert!(least_squares_polar(&unordered, 1.0, 8).is_err());

        let outside = pilots_from(vec![0, 8], vec![Complex::new(1.0, 0.0); 2]);
        assert!(least_squares_linear(&outside, 1.0, 8).is_err());

        let ok = pilots_from(vec![0], vec![Complex::new(1.0, 0.0)]);
        assert!(least_squares_linear(&ok, 0.0, 8).is_err());
    }

    #[test]
    fn test_parse_interpolation() {
        assert_eq!("Polar".parse::<Interpolation>().unwrap(), Interpolation::Polar);
        assert_eq!("dft".parse::<Interpolation>().unwrap(), Interpolation::Dft);
        assert!("spline".parse::<Interpolation>().is_err());
    }
}
