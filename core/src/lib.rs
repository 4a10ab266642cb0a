//! Single-symbol OFDM link simulator
//!
//! Bits are QAM-mapped onto subcarriers with comb pilots, turned into a time-domain
//! waveform with a cyclic prefix, pushed through a multipath + AWGN channel, then
//! recovered with pilot-based channel estimation and per-subcarrier equalization.

pub mod error;
pub mod complex;
pub mod fft;
pub mod qam;
pub mod frame;
pub mod channel;
pub mod estimator;
pub mod equalizer;
pub mod metrics;
pub mod simulator;

pub use channel::{add_awgn, generate_random_multipath_channel, MultipathChannel};
pub use complex::{Complex, ComplexExt};
pub use equalizer::Equalizer;
pub use error::{OfdmError, Result};
pub use estimator::{ChannelEstimator, Interpolation};
pub use fft::{fft, ifft};
pub use frame::{add_cyclic_prefix, remove_cyclic_prefix, FrameBuilder, PilotSamples, SubcarrierKind};
pub use metrics::{calculate_ber, generate_random_bits};
pub use qam::{Modulation, QamModulator};
pub use simulator::{
    ber_sweep, run_simulation, BerPoint, ChannelType, MultipathConfig, OfdmParameters, PathConfig,
    SimulationResult,
};

// Symbol layout defaults
pub const DEFAULT_NUM_SUBCARRIERS: usize = 128;
pub const DEFAULT_CP_LENGTH: usize = 16;
pub const DEFAULT_PILOT_SPACING: usize = 8;
pub const DEFAULT_PILOT_POWER: f64 = 1.0;
pub const DEFAULT_SNR_DB: f64 = 15.0;

// Random channel defaults
pub const DEFAULT_DELAY_SPREAD: f64 = 10.0;
pub const DEFAULT_NUM_PATHS: usize = 3;

/// |H| below this is treated as a null by the zero-forcing equalizer
pub const ZF_MAGNITUDE_TOLERANCE: f64 = 1e-10;
