use crate::complex::Complex;
use rand::Rng;

/// Uniform random bit source for the transmitter
pub fn generate_random_bits<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<bool> {
    (0..len).map(|_| rng.gen::<bool>()).collect()
}

/// Number of differing positions over the common prefix
pub fn bit_errors(transmitted: &[bool], received: &[bool]) -> usize {
    transmitted
        .iter()
        .zip(received.iter())
        .filter(|(a, b)| a != b)
        .count()
}

/// Hamming distance over the first min(len) bits divided by that length; 0 for empty input
pub fn calculate_ber(transmitted: &[bool], received: &[bool]) -> f64 {
    let length = transmitted.len().min(received.len());
    if length == 0 {
        return 0.0;
    }
    bit_errors(transmitted, received) as f64 / length as f64
}

pub fn mean_power(signal: &[Complex]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|s| s.norm_sqr()).sum::<f64>() / signal.len() as f64
}

/// Mean |H - Ĥ|² over the common prefix
pub fn channel_mse(actual: &[Complex], estimate: &[Complex]) -> f64 {
    let length = actual.len().min(estimate.len());
    if length == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(estimate.iter())
        .map(|(a, e)| (a - e).norm_sqr())
        .sum::<f64>()
        / length as f64
}
