//! Multipath tapped-delay-line channel and AWGN injection.
//!
//! Every source of randomness is an explicit `Rng` argument so runs can be replayed
//! from a seed.

use crate::complex::Complex;
use crate::error::{OfdmError, Result};
use crate::metrics::mean_power;
use rand::Rng;
use serde::Serialize;
use std::f64::consts::PI;

/// Discrete multipath channel: path `i` arrives `delays[i]` samples late, scaled by
/// `gains[i]` and rotated by `phases[i]` radians.
///
/// Gains are taken as given. Only [`generate_random_multipath_channel`] normalizes
/// total power to 1; a manually built channel may carry any power.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultipathChannel {
    delays: Vec<f64>,
    gains: Vec<f64>,
    phases: Vec<f64>,
}

impl MultipathChannel {
    pub fn new(delays: Vec<f64>, gains: Vec<f64>, phases: Vec<f64>) -> Result<Self> {
        if gains.len() != delays.len() {
            return Err(OfdmError::LengthMismatch {
                expected: delays.len(),
                actual: gains.len(),
            });
        }
        if phases.len() != delays.len() {
            return Err(OfdmError::LengthMismatch {
                expected: delays.len(),
                actual: phases.len(),
            });
        }
        if delays.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(OfdmError::ParameterOutOfRange(
                "path delays must be finite and non-negative".to_string(),
            ));
        }
        if gains.iter().chain(phases.iter()).any(|v| !v.is_finite()) {
            return Err(OfdmError::ParameterOutOfRange(
                "path gains and phases must be finite".to_string(),
            ));
        }
        Ok(Self {
            delays,
            gains,
            phases,
        })
    }

    pub fn delays(&self) -> &[f64] {
        &self.delays
    }

    pub fn gains(&self) -> &[f64] {
        &self.gains
    }

    pub fn phases(&self) -> &[f64] {
        &self.phases
    }

    pub fn num_paths(&self) -> usize {
        self.delays.len()
    }

    /// Σ gain²
    pub fn total_power(&self) -> f64 {
        self.gains.iter().map(|g| g * g).sum()
    }

    /// Largest delay after rounding to whole samples
    pub fn max_delay(&self) -> usize {
        self.delays
            .iter()
            .map(|d| d.round() as usize)
            .max()
            .unwrap_or(0)
    }

    fn taps(&self) -> impl Iterator<Item = (f64, Complex)> + '_ {
        self.delays
            .iter()
            .zip(self.gains.iter())
            .zip(self.phases.iter())
            .map(|((&delay, &gain), &phase)| (delay, Complex::from_polar(gain, phase)))
    }

    /// Linear convolution with the tap set, delays rounded to the nearest sample.
    ///
    /// Output has the input's length: anything pushed past the end is lost, so the
    /// cyclic prefix has to cover the delay spread.
    pub fn apply(&self, signal: &[Complex]) -> Vec<Complex> {
        let mut output = vec![Complex::new(0.0, 0.0); signal.len()];

        for (delay, coeff) in self.taps() {
            let delay = delay.round() as usize;
            if delay >= output.len() {
                continue;
            }
            for (out, &sample) in output[delay..].iter_mut().zip(signal.iter()) {
                *out += sample * coeff;
            }
        }

        output
    }

    /// Analytic response H[k] = Σ gᵢ·e^{j(φᵢ − 2πk·dᵢ/N)} using the unrounded delays
    pub fn frequency_response(&self, num_points: usize) -> Vec<Complex> {
        (0..num_points)
            .map(|k| {
                self.taps().fold(Complex::new(0.0, 0.0), |acc, (delay, coeff)| {
                    let angle = -2.0 * PI * (k as f64) * delay / (num_points as f64);
                    acc + coeff * Complex::from_polar(1.0, angle)
                })
            })
            .collect()
    }
}

/// Draw a random channel with an exponential power-delay profile.
///
/// Path 0 is line-of-sight (delay 0, phase 0). Later paths take a delay uniform in
/// `[0, delay_spread]`, gain `e^{-2d/delay_spread}` times a uniform factor in
/// `[0.5, 1]`, and a uniform phase in `[0, 2π)`. All gains are then scaled so that
/// Σ gain² = 1.
pub fn generate_random_multipath_channel<R: Rng + ?Sized>(
    delay_spread: f64,
    num_paths: usize,
    rng: &mut R,
) -> Result<MultipathChannel> {
    if num_paths == 0 {
        return Err(OfdmError::ParameterOutOfRange(
            "a channel needs at least one path".to_string(),
        ));
    }
    if !delay_spread.is_finite() || delay_spread < 0.0 {
        return Err(OfdmError::ParameterOutOfRange(format!(
            "delay spread must be finite and non-negative, got {}",
            delay_spread
        )));
    }

    let mut delays = Vec::with_capacity(num_paths);
    let mut gains = Vec::with_capacity(num_paths);
    let mut phases = Vec::with_capacity(num_paths);

    delays.push(0.0);
    gains.push(1.0);
    phases.push(0.0);

    for _ in 1..num_paths {
        let delay = rng.gen_range(0.0..=delay_spread);
        let base_gain = if delay_spread > 0.0 {
            (-delay / (delay_spread / 2.0)).exp()
        } else {
            1.0
        };
        let factor = rng.gen_range(0.5..=1.0);

        delays.push(delay);
        gains.push(base_gain * factor);
        phases.push(rng.gen_range(0.0..2.0 * PI));
    }

    let norm = gains.iter().map(|g| g * g).sum::<f64>().sqrt();
    for gain in gains.iter_mut() {
        *gain /= norm;
    }

    log::debug!(
        "Generated {}-path channel (spread {}): delays {:?}, gains {:?}",
        num_paths,
        delay_spread,
        delays,
        gains
    );

    MultipathChannel::new(delays, gains, phases)
}

/// Add complex white Gaussian noise at `snr_db` relative to the measured mean power
/// of `signal`. Each component gets standard deviation √(P_noise/2).
pub fn add_awgn<R: Rng + ?Sized>(signal: &[Complex], snr_db: f64, rng: &mut R) -> Vec<Complex> {
    if signal.is_empty() {
        return Vec::new();
    }

    let signal_power = mean_power(signal);
    let noise_power = signal_power / 10f64.powf(snr_db / 10.0);
    let noise_std = (noise_power / 2.0).sqrt();

    log::debug!(
        "AWGN: signal power {:.6}, noise power {:.6} ({} dB)",
        signal_power,
        noise_power,
        snr_db
    );

    signal
        .iter()
        .map(|s| {
            let (n_re, n_im) = gaussian_pair(rng);
            Complex::new(s.re + noise_std * n_re, s.im + noise_std * n_im)
        })
        .collect()
}

/// Box–Muller: two independent N(0, 1) deviates from two uniforms in (0, 1]
pub fn gaussian_pair<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    // gen() yields [0, 1); flip it so ln(u) stays finite
    let u = 1.0 - rng.gen::<f64>();
    let v = rng.gen::<f64>();
    let radius = (-2.0 * u.ln()).sqrt();
    let angle = 2.0 * PI * v;
    (radius * angle.cos(), radius * angle.sin())
}
