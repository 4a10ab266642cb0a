use crate::complex::Complex;
use crate::error::{OfdmError, Result};
use std::f64::consts::PI;

/// Forward DFT via recursive radix-2 decimation in time.
///
/// Lengths 0 and 1 are returned unchanged; any other length must be a power of two.
pub fn fft(input: &[Complex]) -> Result<Vec<Complex>> {
    let n = input.len();
    if n <= 1 {
        return Ok(input.to_vec());
    }
    if !n.is_power_of_two() {
        return Err(OfdmError::InvalidLength(n));
    }
    Ok(fft_recursive(input))
}

/// Inverse DFT, computed as conj(fft(conj(x))) / n
pub fn ifft(input: &[Complex]) -> Result<Vec<Complex>> {
    let n = input.len();
    let conjugated: Vec<Complex> = input.iter().map(|c| c.conj()).collect();
    let spectrum = fft(&conjugated)?;
    let scale = n.max(1) as f64;
    Ok(spectrum
        .into_iter()
        .map(|c| Complex::new(c.re / scale, -c.im / scale))
        .collect())
}

fn fft_recursive(input: &[Complex]) -> Vec<Complex> {
    let n = input.len();
    if n <= 1 {
        return input.to_vec();
    }

    let even: Vec<Complex> = input.iter().step_by(2).copied().collect();
    let odd: Vec<Complex> = input.iter().skip(1).step_by(2).copied().collect();
    let even = fft_recursive(&even);
    let odd = fft_recursive(&odd);

    let half = n / 2;
    let mut result = vec![Complex::new(0.0, 0.0); n];
    for k in 0..half {
        let angle = -2.0 * PI * (k as f64) / (n as f64);
        let t = Complex::new(angle.cos(), angle.sin()) * odd[k];
        result[k] = even[k] + t;
        result[k + half] = even[k] - t;
    }
    result
}
