mod config;

use clap::{Args, Parser, Subcommand};
use config::SimConfig;
use ofdmsim_core::{
    ber_sweep, generate_random_multipath_channel, run_simulation, ChannelType, ComplexExt,
    Equalizer, Interpolation, Modulation, SubcarrierKind,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ofdmsim")]
#[command(about = "Single-symbol OFDM link simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one OFDM symbol through the link and report the bit error rate
    Simulate {
        #[command(flatten)]
        link: LinkArgs,

        /// Print the full result bundle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sweep SNR and print the averaged BER curve
    Sweep {
        #[command(flatten)]
        link: LinkArgs,

        /// First SNR point (dB)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        snr_start: f64,

        /// Last SNR point (dB), inclusive
        #[arg(long, default_value = "30", allow_hyphen_values = true)]
        snr_stop: f64,

        /// SNR step (dB)
        #[arg(long, default_value = "5")]
        snr_step: f64,

        /// Runs averaged per SNR point
        #[arg(long, default_value = "10")]
        trials: usize,

        /// Print the curve as JSON
        #[arg(long)]
        json: bool,
    },

    /// Draw a random multipath channel
    Channel {
        /// Maximum path delay in samples
        #[arg(long, default_value = "10")]
        delay_spread: f64,

        /// Number of paths including line-of-sight
        #[arg(long, default_value = "3")]
        num_paths: usize,

        /// Also print the frequency response over this many subcarriers
        #[arg(long)]
        points: Option<usize>,

        /// RNG seed (entropy when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Link settings shared by `simulate` and `sweep`; flags override the config file
#[derive(Args)]
struct LinkArgs {
    /// JSON config with `parameters` and `multipath` sections
    #[arg(short, long, value_name = "CONFIG.JSON")]
    config: Option<PathBuf>,

    /// Number of subcarriers (power of two)
    #[arg(short = 'n', long)]
    subcarriers: Option<usize>,

    /// Cyclic prefix length in samples
    #[arg(long)]
    cp_length: Option<usize>,

    /// QPSK, 16QAM or 64QAM
    #[arg(short, long)]
    modulation: Option<Modulation>,

    /// Every Nth subcarrier is a pilot
    #[arg(long)]
    pilot_spacing: Option<usize>,

    /// Known pilot amplitude
    #[arg(long)]
    pilot_power: Option<f64>,

    /// Signal-to-noise ratio in dB
    #[arg(short, long, allow_hyphen_values = true)]
    snr: Option<f64>,

    /// awgn or multipath
    #[arg(long)]
    channel: Option<ChannelType>,

    /// linear, polar or dft
    #[arg(short, long)]
    interpolation: Option<Interpolation>,

    /// Delay-domain cutoff for the dft estimator
    #[arg(long)]
    dft_threshold: Option<usize>,

    /// mmse or zf
    #[arg(short, long)]
    equalizer: Option<Equalizer>,

    /// Draw a random multipath channel instead of the manual paths
    #[arg(long)]
    random_channel: bool,

    /// Delay spread for the random channel
    #[arg(long)]
    delay_spread: Option<f64>,

    /// Path count for the random channel
    #[arg(long)]
    num_paths: Option<usize>,

    /// RNG seed (entropy when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

impl LinkArgs {
    fn resolve(&self) -> Result<SimConfig, Box<dyn std::error::Error>> {
        let mut config = SimConfig::load_or_default(self.config.as_deref())?;
        let params = &mut config.parameters;

        if let Some(n) = self.subcarriers {
            params.num_subcarriers = n;
        }
        if let Some(cp) = self.cp_length {
            params.cp_length = cp;
        }
        if let Some(modulation) = self.modulation {
            params.modulation = modulation;
        }
        if let Some(spacing) = self.pilot_spacing {
            params.pilot_spacing = spacing;
        }
        if let Some(power) = self.pilot_power {
            params.pilot_power = power;
        }
        if let Some(snr) = self.snr {
            params.snr_db = snr;
        }
        if let Some(channel) = self.channel {
            params.channel_type = channel;
        }
        if let Some(interpolation) = self.interpolation {
            params.interpolation = interpolation;
        }
        if let Some(threshold) = self.dft_threshold {
            params.dft_threshold = Some(threshold);
        }
        if let Some(equalizer) = self.equalizer {
            params.equalizer = equalizer;
        }

        let multipath = &mut config.multipath;
        if self.random_channel {
            multipath.use_random = true;
        }
        if let Some(spread) = self.delay_spread {
            multipath.delay_spread = spread;
        }
        if let Some(paths) = self.num_paths {
            multipath.num_paths = paths;
        }

        // UI-level limit: the prefix should stay within a quarter symbol
        if params.cp_length > params.num_subcarriers / 4 {
            log::warn!(
                "Cyclic prefix {} is longer than a quarter of {} subcarriers",
                params.cp_length,
                params.num_subcarriers
            );
        }
        params.validate()?;

        Ok(config)
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { link, json } => simulate_command(&link, json)?,
        Commands::Sweep {
            link,
            snr_start,
            snr_stop,
            snr_step,
            trials,
            json,
        } => sweep_command(&link, snr_start, snr_stop, snr_step, trials, json)?,
        Commands::Channel {
            delay_spread,
            num_paths,
            points,
            seed,
        } => channel_command(delay_spread, num_paths, points, seed)?,
    }

    Ok(())
}

fn simulate_command(link: &LinkArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = link.resolve()?;
    let params = &config.parameters;
    let mut rng = make_rng(link.seed);

    log::info!(
        "Simulating {} subcarriers, {}, {} channel at {} dB",
        params.num_subcarriers,
        params.modulation,
        params.channel_type,
        params.snr_db
    );
    let result = run_simulation(params, &config.multipath, &mut rng)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Modulation:      {}", params.modulation);
    let num_pilots = result
        .subcarrier_map
        .iter()
        .filter(|kind| **kind == SubcarrierKind::Pilot)
        .count();
    println!(
        "Subcarriers:     {} ({} pilots, {} data)",
        result.subcarrier_map.len(),
        num_pilots,
        result.subcarrier_map.len() - num_pilots
    );
    println!("Channel:         {}", params.channel_type);
    if let Some(channel) = &result.channel {
        for i in 0..channel.num_paths() {
            println!(
                "  path {}: delay {:.2}, gain {:.3}, phase {:.3} rad",
                i,
                channel.delays()[i],
                channel.gains()[i],
                channel.phases()[i]
            );
        }
    }
    println!("Estimator:       {}", params.interpolation);
    println!("Equalizer:       {}", params.equalizer);
    println!("SNR:             {} dB", params.snr_db);
    println!("Bits:            {}", result.transmitted_bits.len());
    println!("Bit errors:      {}", result.bit_errors);
    println!("BER:             {:.4e}", result.ber);
    println!("Channel MSE:     {:.4e}", result.channel_mse());

    Ok(())
}

fn sweep_command(
    link: &LinkArgs,
    snr_start: f64,
    snr_stop: f64,
    snr_step: f64,
    trials: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(snr_step > 0.0) {
        return Err(format!("SNR step must be positive, got {}", snr_step).into());
    }
    let config = link.resolve()?;
    let mut rng = make_rng(link.seed);

    let mut snr_points = Vec::new();
    let mut snr = snr_start;
    while snr <= snr_stop + 1e-9 {
        snr_points.push(snr);
        snr += snr_step;
    }

    log::info!(
        "Sweeping {} SNR points with {} trials each",
        snr_points.len(),
        trials
    );
    let curve = ber_sweep(&config.parameters, &config.multipath, &snr_points, trials, &mut rng)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&curve)?);
        return Ok(());
    }

    println!("{:>8}  {:>10}", "SNR(dB)", "BER");
    for point in curve {
        println!("{:>8.1}  {:>10.4e}", point.snr_db, point.ber);
    }

    Ok(())
}

fn channel_command(
    delay_spread: f64,
    num_paths: usize,
    points: Option<usize>,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = make_rng(seed);
    let channel = generate_random_multipath_channel(delay_spread, num_paths, &mut rng)?;

    println!("{:>4}  {:>8}  {:>8}  {:>8}", "path", "delay", "gain", "phase");
    for i in 0..channel.num_paths() {
        println!(
            "{:>4}  {:>8.3}  {:>8.4}  {:>8.4}",
            i,
            channel.delays()[i],
            channel.gains()[i],
            channel.phases()[i]
        );
    }
    println!("Total power: {:.6}", channel.total_power());

    if let Some(points) = points {
        println!("{:>4}  {:>10}  {:>10}", "k", "|H|", "arg H");
        for (k, h) in channel.frequency_response(points).iter().enumerate() {
            println!("{:>4}  {:>10.4}  {:>10.4}", k, h.magnitude(), h.phase());
        }
    }

    Ok(())
}
