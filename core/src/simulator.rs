//! End-to-end single-symbol link: bits → QAM → pilots → IFFT → CP → channel + AWGN
//! → CP removal → FFT → estimation → equalization → demapping → BER.

use crate::channel::{add_awgn, generate_random_multipath_channel, MultipathChannel};
use crate::complex::Complex;
use crate::equalizer::Equalizer;
use crate::error::{OfdmError, Result};
use crate::estimator::{ChannelEstimator, Interpolation};
use crate::fft::{fft, ifft};
use crate::frame::{add_cyclic_prefix, remove_cyclic_prefix, FrameBuilder, SubcarrierKind};
use crate::metrics::{bit_errors, calculate_ber, channel_mse, generate_random_bits};
use crate::qam::{Modulation, QamModulator};
use crate::{
    DEFAULT_CP_LENGTH, DEFAULT_DELAY_SPREAD, DEFAULT_NUM_PATHS,
    DEFAULT_NUM_SUBCARRIERS, DEFAULT_PILOT_POWER, DEFAULT_PILOT_SPACING, DEFAULT_SNR_DB,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Noise only, flat unit response
    Awgn,
    #[default]
    Multipath,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Awgn => f.write_str("awgn"),
            ChannelType::Multipath => f.write_str("multipath"),
        }
    }
}

impl FromStr for ChannelType {
    type Err = OfdmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "awgn" => Ok(ChannelType::Awgn),
            "multipath" => Ok(ChannelType::Multipath),
            _ => Err(OfdmError::ParameterOutOfRange(format!(
                "unknown channel type '{}'",
                s
            ))),
        }
    }
}

/// Link parameters for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfdmParameters {
    pub num_subcarriers: usize,
    pub cp_length: usize,
    pub modulation: Modulation,
    pub pilot_spacing: usize,
    pub pilot_power: f64,
    pub snr_db: f64,
    pub channel_type: ChannelType,
    pub interpolation: Interpolation,
    /// Only consulted by the DFT estimator; `None` means N/4
    pub dft_threshold: Option<usize>,
    pub equalizer: Equalizer,
}

impl Default for OfdmParameters {
    fn default() -> Self {
        Self {
            num_subcarriers: DEFAULT_NUM_SUBCARRIERS,
            cp_length: DEFAULT_CP_LENGTH,
            modulation: Modulation::Qpsk,
            pilot_spacing: DEFAULT_PILOT_SPACING,
            pilot_power: DEFAULT_PILOT_POWER,
            snr_db: DEFAULT_SNR_DB,
            channel_type: ChannelType::Multipath,
            interpolation: Interpolation::Linear,
            dft_threshold: None,
            equalizer: Equalizer::Mmse,
        }
    }
}

impl OfdmParameters {
    pub fn validate(&self) -> Result<()> {
        let n = self.num_subcarriers;
        if n < 2 || !n.is_power_of_two() {
            return Err(OfdmError::ParameterOutOfRange(format!(
                "number of subcarriers must be a power of two >= 2, got {}",
                n
            )));
        }
        if self.cp_length >= n {
            return Err(OfdmError::ParameterOutOfRange(format!(
                "cyclic prefix {} must be shorter than {} subcarriers",
                self.cp_length, n
            )));
        }
        if self.pilot_spacing == 0 {
            return Err(OfdmError::ParameterOutOfRange(
                "pilot spacing must be at least 1".to_string(),
            ));
        }
        if !self.pilot_power.is_finite() || self.pilot_power <= 0.0 {
            return Err(OfdmError::ParameterOutOfRange(format!(
                "pilot power must be positive, got {}",
                self.pilot_power
            )));
        }
        if !self.snr_db.is_finite() {
            return Err(OfdmError::ParameterOutOfRange(format!(
                "SNR must be finite, got {}",
                self.snr_db
            )));
        }
        if let (Interpolation::Dft, Some(threshold)) = (self.interpolation, self.dft_threshold) {
            if threshold < 1 || threshold > n / 2 {
                return Err(OfdmError::ParameterOutOfRange(format!(
                    "dft threshold {} outside [1, {}]",
                    threshold,
                    n / 2
                )));
            }
        }
        Ok(())
    }

    /// Data symbols carried per OFDM symbol: floor(N·(s−1)/s), capped at the data slots
    pub fn num_data_symbols(&self) -> usize {
        let spacing = self.pilot_spacing.max(1);
        let nominal = self.num_subcarriers * (spacing - 1) / spacing;
        let slots = self.num_subcarriers - self.num_subcarriers.div_ceil(spacing);
        nominal.min(slots)
    }

    pub fn num_bits(&self) -> usize {
        self.num_data_symbols() * self.modulation.bits_per_symbol()
    }
}

/// One manually specified propagation path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Samples
    pub delay: f64,
    pub gain: f64,
    /// Radians
    pub phase: f64,
}

/// Where the multipath channel comes from: manual paths, or a fresh random draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultipathConfig {
    pub use_random: bool,
    pub delay_spread: f64,
    pub num_paths: usize,
    pub paths: Vec<PathConfig>,
}

impl Default for MultipathConfig {
    fn default() -> Self {
        Self {
            use_random: false,
            delay_spread: DEFAULT_DELAY_SPREAD,
            num_paths: DEFAULT_NUM_PATHS,
            paths: vec![
                PathConfig { delay: 0.0, gain: 1.0, phase: 0.0 },
                PathConfig { delay: 2.0, gain: 0.5, phase: PI / 4.0 },
                PathConfig { delay: 4.0, gain: 0.3, phase: PI / 2.0 },
            ],
        }
    }
}

impl MultipathConfig {
    /// Channel actually applied by a run.
    ///
    /// Random channels are power-normalized; manual paths are used exactly as given.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<MultipathChannel> {
        if self.use_random {
            return generate_random_multipath_channel(self.delay_spread, self.num_paths, rng);
        }
        if self.paths.is_empty() {
            return Err(OfdmError::ParameterOutOfRange(
                "manual multipath channel has no paths".to_string(),
            ));
        }

        let channel = MultipathChannel::new(
            self.paths.iter().map(|p| p.delay).collect(),
            self.paths.iter().map(|p| p.gain).collect(),
            self.paths.iter().map(|p| p.phase).collect(),
        )?;
        let power = channel.total_power();
        if (power - 1.0).abs() > 1e-6 {
            log::warn!(
                "Manual channel is not power-normalized (sum of gain^2 = {:.4})",
                power
            );
        }
        Ok(channel)
    }
}

/// Everything produced by one run, for plotting and scoring
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub transmitted_bits: Vec<bool>,
    pub received_bits: Vec<bool>,
    pub transmitted_symbols: Vec<Complex>,
    /// Data subcarriers after the FFT, before equalization
    pub received_symbols: Vec<Complex>,
    pub equalized_symbols: Vec<Complex>,
    /// Transmitted waveform including the cyclic prefix
    pub time_signal: Vec<Complex>,
    /// Subcarrier vector fed to the IFFT
    pub freq_signal: Vec<Complex>,
    pub channel_response: Vec<Complex>,
    pub channel_estimate: Vec<Complex>,
    /// `None` on the AWGN channel
    pub channel: Option<MultipathChannel>,
    /// Pilot/data role of each subcarrier
    pub subcarrier_map: Vec<SubcarrierKind>,
    /// Reference constellation for scatter plots
    pub constellation: Vec<Complex>,
    pub bit_errors: usize,
    pub ber: f64,
}

impl SimulationResult {
    pub fn channel_mse(&self) -> f64 {
        channel_mse(&self.channel_response, &self.channel_estimate)
    }
}

/// Simulate one OFDM symbol end to end
pub fn run_simulation<R: Rng + ?Sized>(
    params: &OfdmParameters,
    multipath: &MultipathConfig,
    rng: &mut R,
) -> Result<SimulationResult> {
    params.validate()?;
    let n = params.num_subcarriers;

    let builder = FrameBuilder::new(n, params.pilot_spacing, params.pilot_power)?;
    let modulator = QamModulator::new(params.modulation);
    let estimator = ChannelEstimator::new(params.interpolation, params.dft_threshold);

    // Transmitter
    let transmitted_bits = generate_random_bits(params.num_bits(), rng);
    let transmitted_symbols = modulator.modulate(&transmitted_bits);
    let freq_signal = builder.insert_pilots(&transmitted_symbols);
    let time_signal = add_cyclic_prefix(&ifft(&freq_signal)?, params.cp_length);

    log::debug!(
        "TX: {} bits, {} {} symbols, {} pilots, {} samples with CP",
        transmitted_bits.len(),
        transmitted_symbols.len(),
        params.modulation,
        builder.num_pilots(),
        time_signal.len()
    );

    // Channel
    let (faded, channel_response, channel) = match params.channel_type {
        ChannelType::Multipath => {
            let channel = multipath.resolve(rng)?;
            if channel.max_delay() > params.cp_length {
                log::warn!(
                    "Channel delay {} exceeds cyclic prefix {}; expect inter-symbol interference",
                    channel.max_delay(),
                    params.cp_length
                );
            }
            let faded = channel.apply(&time_signal);
            let response = channel.frequency_response(n);
            (faded, response, Some(channel))
        }
        ChannelType::Awgn => (time_signal.clone(), vec![Complex::new(1.0, 0.0); n], None),
    };
    let received = add_awgn(&faded, params.snr_db, rng);

    // Receiver
    let stripped = remove_cyclic_prefix(&received, params.cp_length);
    let received_frame = fft(&stripped[..n])?;

    let pilots = builder.extract_pilots(&received_frame);
    let channel_estimate = estimator.estimate(&pilots, params.pilot_power, n)?;
    let equalized_frame = params
        .equalizer
        .apply(&received_frame, &channel_estimate, params.snr_db)?;

    let data_len = transmitted_symbols.len();
    let mut received_symbols = builder.extract_data(&received_frame);
    received_symbols.truncate(data_len);
    let mut equalized_symbols = builder.extract_data(&equalized_frame);
    equalized_symbols.truncate(data_len);

    let received_bits = modulator.demodulate(&equalized_symbols);
    let errors = bit_errors(&transmitted_bits, &received_bits);
    let ber = calculate_ber(&transmitted_bits, &received_bits);

    log::debug!(
        "RX: {} {} interpolation, {} equalizer, {} bit errors (BER {:.3e})",
        params.channel_type,
        params.interpolation,
        params.equalizer,
        errors,
        ber
    );

    Ok(SimulationResult {
        transmitted_bits,
        received_bits,
        transmitted_symbols,
        received_symbols,
        equalized_symbols,
        time_signal,
        freq_signal,
        channel_response,
        channel_estimate,
        channel,
        subcarrier_map: builder.subcarrier_map(),
        constellation: modulator.constellation().to_vec(),
        bit_errors: errors,
        ber,
    })
}

/// One point of a BER-vs-SNR curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BerPoint {
    pub snr_db: f64,
    pub ber: f64,
}

/// Average BER over `trials` independent runs at each SNR in `snr_points`
pub fn ber_sweep<R: Rng + ?Sized>(
    params: &OfdmParameters,
    multipath: &MultipathConfig,
    snr_points: &[f64],
    trials: usize,
    rng: &mut R,
) -> Result<Vec<BerPoint>> {
    if trials == 0 {
        return Err(OfdmError::ParameterOutOfRange(
            "a sweep needs at least one trial per point".to_string(),
        ));
    }

    let mut curve = Vec::with_capacity(snr_points.len());
    for &snr_db in snr_points {
        let point_params = OfdmParameters {
            snr_db,
            ..params.clone()
        };
        let mut total = 0.0;
        for _ in 0..trials {
            total += run_simulation(&point_params, multipath, rng)?.ber;
        }
        let ber = total / trials as f64;
        log::debug!("Sweep: {:.1} dB -> BER {:.3e}", snr_db, ber);
        curve.push(BerPoint { snr_db, ber });
    }
    Ok(curve)
}
