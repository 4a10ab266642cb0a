use crate::complex::Complex;
use crate::error::{OfdmError, Result};
use serde::Serialize;

/// Role of a subcarrier within the comb-pilot layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubcarrierKind {
    Pilot,
    Data,
}

/// Pilot values received on the comb positions, with the positions themselves
#[derive(Debug, Clone, PartialEq)]
pub struct PilotSamples {
    pub values: Vec<Complex>,
    pub indices: Vec<usize>,
}

/// Comb-pilot frequency-domain layout for one OFDM symbol.
///
/// Every subcarrier `i` with `i % pilot_spacing == 0` carries the known real pilot
/// `(pilot_power, 0)`; the remaining subcarriers carry data in ascending order.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    num_subcarriers: usize,
    pilot_spacing: usize,
    pilot_power: f64,
}

impl FrameBuilder {
    pub fn new(num_subcarriers: usize, pilot_spacing: usize, pilot_power: f64) -> Result<Self> {
        if pilot_spacing == 0 {
            return Err(OfdmError::ParameterOutOfRange(
                "pilot spacing must be at least 1".to_string(),
            ));
        }
        if !pilot_power.is_finite() || pilot_power <= 0.0 {
            return Err(OfdmError::ParameterOutOfRange(format!(
                "pilot power must be positive, got {}",
                pilot_power
            )));
        }
        Ok(Self {
            num_subcarriers,
            pilot_spacing,
            pilot_power,
        })
    }

    pub fn is_pilot(&self, index: usize) -> bool {
        index % self.pilot_spacing == 0
    }

    pub fn num_pilots(&self) -> usize {
        self.num_subcarriers.div_ceil(self.pilot_spacing)
    }

    pub fn subcarrier_map(&self) -> Vec<SubcarrierKind> {
        (0..self.num_subcarriers)
            .map(|i| {
                if self.is_pilot(i) {
                    SubcarrierKind::Pilot
                } else {
                    SubcarrierKind::Data
                }
            })
            .collect()
    }

    /// Build the full subcarrier vector.
    ///
    /// Data symbols beyond the available data slots are ignored; data slots left over
    /// once the symbols run out stay at zero.
    pub fn insert_pilots(&self, data_symbols: &[Complex]) -> Vec<Complex> {
        let mut frame = vec![Complex::new(0.0, 0.0); self.num_subcarriers];
        let mut data = data_symbols.iter();

        for (i, slot) in frame.iter_mut().enumerate() {
            if self.is_pilot(i) {
                *slot = Complex::new(self.pilot_power, 0.0);
            } else if let Some(&symbol) = data.next() {
                *slot = symbol;
            }
        }

        let unused = data.len();
        if unused > 0 {
            log::debug!("{} data symbol(s) did not fit in the frame", unused);
        }

        frame
    }

    pub fn extract_pilots(&self, frame: &[Complex]) -> PilotSamples {
        let (indices, values) = frame
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_pilot(*i))
            .map(|(i, &value)| (i, value))
            .unzip();
        PilotSamples { values, indices }
    }

    pub fn extract_data(&self, frame: &[Complex]) -> Vec<Complex> {
        frame
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_pilot(*i))
            .map(|(_, &value)| value)
            .collect()
    }
}

/// Prepend the last `cp_len` samples of `signal` to its front.
///
/// Returns the signal unchanged when `cp_len` is 0 or not shorter than the signal.
pub fn add_cyclic_prefix(signal: &[Complex], cp_len: usize) -> Vec<Complex> {
    if cp_len == 0 || cp_len >= signal.len() {
        return signal.to_vec();
    }

    let mut output = Vec::with_capacity(cp_len + signal.len());
    output.extend_from_slice(&signal[signal.len() - cp_len..]);
    output.extend_from_slice(signal);
    output
}

/// Strip the first `cp_len` samples; same no-op conditions as [`add_cyclic_prefix`]
pub fn remove_cyclic_prefix(signal: &[Complex], cp_len: usize) -> Vec<Complex> {
    if cp_len == 0 || cp_len >= signal.len() {
        return signal.to_vec();
    }
    signal[cp_len..].to_vec()
}
