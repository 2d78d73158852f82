use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use exg_ransac::{
    io::{write_epoch_set, EpochFile},
    BadChannelPolicy, EpochSet, Ransac, RansacConfig,
};

#[derive(Parser)]
#[command(name = "ransac", about = "RANSAC bad-sensor detection and repair")]
struct Args {
    /// epochs.safetensors with 'epochs' [E, C, T], 'chan_pos' [C, 3], 'ch_names'
    #[arg(long)]
    input: PathBuf,

    /// Repaired epochs output path (safetensors)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Reject-log output path (JSON)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Number of consensus rounds (default: 50)
    #[arg(long, default_value_t = 50)]
    n_resample: usize,

    /// Fraction of channels per reference subset (default: 0.25)
    #[arg(long, default_value_t = 0.25)]
    sample_fraction: f64,

    /// Per-round agreement cutoff on the correlation (default: 0.75)
    #[arg(long, default_value_t = 0.75)]
    correlation_threshold: f64,

    /// Flag channels bad in more than this fraction of trials instead of
    /// the robust z-score policy
    #[arg(long)]
    max_bad_fraction: Option<f64>,

    /// Sub-sample generator seed
    #[arg(long, default_value_t = 435656)]
    seed: u64,

    /// Worker threads (0 = all cores)
    #[arg(long, default_value_t = 0)]
    n_workers: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let file = EpochFile::load(&args.input)?;
    let epochs = EpochSet::new(file.epochs, file.ch_names, file.chan_pos)?;
    println!(
        "Loaded {} trials × {} ch × {} samples",
        epochs.n_trials(),
        epochs.n_channels(),
        epochs.n_samples()
    );

    let mut cfg = RansacConfig {
        n_resample: args.n_resample,
        sample_fraction: args.sample_fraction,
        correlation_threshold: args.correlation_threshold,
        seed: args.seed,
        n_workers: args.n_workers,
        ..RansacConfig::default()
    };
    if let Some(max_bad_fraction) = args.max_bad_fraction {
        cfg.bad_channel_policy = BadChannelPolicy::FractionBadTrials { max_bad_fraction };
    }

    let mut ransac = Ransac::new(cfg)?;
    ransac.fit(&epochs)?;

    if let Some(log) = ransac.reject_log() {
        println!("{} bad channel(s):", log.bad_channels.len());
        println!("{}", log.bad_channels.join("\n"));
        if let Some(path) = &args.log {
            std::fs::write(path, serde_json::to_string_pretty(log)?)?;
            println!("Reject log → {}", path.display());
        }
    }

    if let Some(path) = &args.output {
        let cleaned = ransac.transform(&epochs)?;
        write_epoch_set(path, &cleaned)?;
        println!("Repaired epochs → {}", path.display());
    }

    Ok(())
}
