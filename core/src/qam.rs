use crate::complex::Complex;
use crate::error::OfdmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Square QAM orders supported by the mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Modulation {
    #[default]
    #[serde(rename = "QPSK")]
    Qpsk,
    #[serde(rename = "16QAM")]
    Qam16,
    #[serde(rename = "64QAM")]
    Qam64,
}

impl Modulation {
    pub fn order(&self) -> usize {
        match self {
            Modulation::Qpsk => 4,
            Modulation::Qam16 => 16,
            Modulation::Qam64 => 64,
        }
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.order().trailing_zeros() as usize
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modulation::Qpsk => "QPSK",
            Modulation::Qam16 => "16QAM",
            Modulation::Qam64 => "64QAM",
        };
        f.write_str(name)
    }
}

impl FromStr for Modulation {
    type Err = OfdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "").as_str() {
            "QPSK" | "4QAM" => Ok(Modulation::Qpsk),
            "16QAM" | "QAM16" => Ok(Modulation::Qam16),
            "64QAM" | "QAM64" => Ok(Modulation::Qam64),
            _ => Err(OfdmError::ParameterOutOfRange(format!(
                "unknown modulation '{}'",
                s
            ))),
        }
    }
}

/// Maps bit groups onto a unit-energy constellation and back.
///
/// The constellation index is the natural-binary value of the bit group (MSB first),
/// not a Gray code, so neighbouring points can differ in more than one bit.
pub struct QamModulator {
    modulation: Modulation,
    constellation: Vec<Complex>,
}

impl QamModulator {
    pub fn new(modulation: Modulation) -> Self {
        let constellation = match modulation {
            Modulation::Qpsk => qpsk_constellation(),
            Modulation::Qam16 => square_qam_constellation(4, 10.0),
            Modulation::Qam64 => square_qam_constellation(8, 42.0),
        };
        Self {
            modulation,
            constellation,
        }
    }

    pub fn constellation(&self) -> &[Complex] {
        &self.constellation
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.modulation.bits_per_symbol()
    }

    /// Map bits to symbols, `log2(M)` bits per symbol, MSB first.
    ///
    /// Emits `bits.len() / log2(M)` symbols; an incomplete trailing group is dropped.
    pub fn modulate(&self, bits: &[bool]) -> Vec<Complex> {
        let k = self.bits_per_symbol();
        let tail = bits.len() % k;
        if tail != 0 {
            log::debug!(
                "Dropping {} trailing bit(s) that do not fill a {} symbol",
                tail,
                self.modulation
            );
        }

        bits.chunks_exact(k)
            .map(|chunk| {
                let index = chunk
                    .iter()
                    .fold(0usize, |acc, &bit| (acc << 1) | bit as usize);
                self.constellation[index]
            })
            .collect()
    }

    /// Hard-decision demapping to the nearest constellation point.
    ///
    /// Linear scan over all M points; ties go to the lowest index.
    pub fn demodulate(&self, symbols: &[Complex]) -> Vec<bool> {
        let k = self.bits_per_symbol();
        let mut bits = Vec::with_capacity(symbols.len() * k);

        for symbol in symbols {
            let mut min_distance = f64::MAX;
            let mut closest = 0usize;
            for (i, point) in self.constellation.iter().enumerate() {
                let distance = (symbol - point).norm_sqr();
                if distance < min_distance {
                    min_distance = distance;
                    closest = i;
                }
            }

            for j in (0..k).rev() {
                bits.push((closest >> j) & 1 == 1);
            }
        }

        bits
    }
}

fn qpsk_constellation() -> Vec<Complex> {
    let scale = 1.0 / 2f64.sqrt();
    vec![
        Complex::new(scale, scale),
        Complex::new(-scale, scale),
        Complex::new(-scale, -scale),
        Complex::new(scale, -scale),
    ]
}

/// side×side grid over odd coordinates {-(side-1), …, side-1}, in-phase axis outer
fn square_qam_constellation(side: i32, energy: f64) -> Vec<Complex> {
    let scale = 1.0 / energy.sqrt();
    let mut points = Vec::with_capacity((side * side) as usize);
    for i in (-(side - 1)..=(side - 1)).step_by(2) {
        for q in (-(side - 1)..=(side - 1)).step_by(2) {
            points.push(Complex::new(i as f64 * scale, q as f64 * scale));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ALL: [Modulation; 3] = [Modulation::Qpsk, Modulation::Qam16, Modulation::Qam64];

    #[test]
    fn test_constellation_size_and_energy() {
        for modulation in ALL {
            let modulator = QamModulator::new(modulation);
            let points = modulator.constellation();
            assert_eq!(points.len(), modulation.order());
            assert_eq!(1 << modulator.bits_per_symbol(), points.len());

            let energy: f64 =
                points.iter().map(|p| p.norm_sqr()).sum::<f64>() / points.len() as f64;
            assert!((energy - 1.0).abs() < 1e-12, "{} energy = {}", modulation, energy);
        }
    }

    #[test]
    fn test_natural_binary_mapping() {
        let modulator = QamModulator::new(Modulation::Qpsk);
        let s = 1.0 / 2f64.sqrt();
        let symbols = modulator.modulate(&[false, false, false, true, true, false, true, true]);
        assert_eq!(
            symbols,
            vec![
                Complex::new(s, s),
                Complex::new(-s, s),
                Complex::new(-s, -s),
                Complex::new(s, -s),
            ]
        );

        // 16-QAM index 0b0001 = (i=-3, q=-1)
        let modulator = QamModulator::new(Modulation::Qam16);
        let symbol = modulator.modulate(&[false, false, false, true])[0];
        let s = 1.0 / 10f64.sqrt();
        assert!((symbol.re + 3.0 * s).abs() < 1e-12);
        assert!((symbol.im + s).abs() < 1e-12);
    }

    #[test]
    fn test_noiseless_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        for modulation in ALL {
            let modulator = QamModulator::new(modulation);
            let bits: Vec<bool> = (0..modulator.bits_per_symbol() * 200)
                .map(|_| rng.gen())
                .collect();
            let symbols = modulator.modulate(&bits);
            assert_eq!(symbols.len(), 200);
            assert_eq!(modulator.demodulate(&symbols), bits, "{} round trip", modulation);
        }
    }

    #[test]
    fn test_incomplete_tail_dropped() {
        let modulator = QamModulator::new(Modulation::Qam16);
        let bits = vec![true; 10];
        let symbols = modulator.modulate(&bits);
        assert_eq!(symbols.len(), 2);
        assert_eq!(modulator.demodulate(&symbols).len(), 8);
    }

    #[test]
    fn test_demodulate_noisy_symbol() {
        let modulator = QamModulator::new(Modulation::Qpsk);
        let bits = modulator.demodulate(&[Complex::new(-0.6, -0.9)]);
        assert_eq!(bits, vec![true, false]);
    }

    #[test]
    fn test_parse_modulation() {
        assert_eq!("qpsk".parse::<Modulation>().unwrap(), Modulation::Qpsk);
        assert_eq!("16QAM".parse::<Modulation>().unwrap(), Modulation::Qam16);
        assert_eq!("64-qam".parse::<Modulation>().unwrap(), Modulation::Qam64);
        assert!("8psk".parse::<Modulation>().is_err());
    }
}
