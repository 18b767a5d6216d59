use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use resmon::config::{self, Config};
use resmon::metrics::SystemMetrics;
use resmon::sampler::{Sampler, SamplerHandle, SamplerSettings};

#[derive(Parser)]
#[command(
    name = "resmon",
    about = "Headless host resource sampler with periodic CSV persistence"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between samples
    #[arg(long)]
    sample_interval: Option<u64>,

    /// Seconds between CSV flushes
    #[arg(long)]
    save_interval: Option<u64>,

    /// CSV output path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Filesystem path whose disk usage is sampled
    #[arg(long)]
    disk_path: Option<PathBuf>,

    /// Cap on buffered samples; oldest are evicted first
    #[arg(long)]
    max_samples: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("resmon=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    if config.sampler.sample_interval_secs == 0 {
        return Err(eyre!("--sample-interval must be greater than 0"));
    }
    if config.sampler.save_interval_secs == 0 {
        return Err(eyre!("--save-interval must be greater than 0"));
    }

    tracing::info!(
        sample_interval_secs = config.sampler.sample_interval_secs,
        save_interval_secs = config.sampler.save_interval_secs,
        output = %config.persistence.path.display(),
        disk_path = %config.disk.path.display(),
        "starting sampler"
    );

    let sampler = Arc::new(Sampler::new(SamplerSettings::from_config(&config)));
    let handle = SamplerHandle::spawn(Arc::clone(&sampler), SystemMetrics::new());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Enter 'exit' to stop monitoring: ");
        std::io::stdout().flush()?;

        tokio::select! {
            line = lines.next_line() => match line? {
                Some(cmd) if cmd.trim() == "exit" => break,
                Some(_) => {}
                None => break,
            },
            _ = signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    handle.shutdown().await;
    let buffered = sampler.fetch(None).len();
    tracing::info!(buffered, "sampler stopped");
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    };

    if let Some(secs) = cli.sample_interval {
        config.sampler.sample_interval_secs = secs;
    }
    if let Some(secs) = cli.save_interval {
        config.sampler.save_interval_secs = secs;
    }
    if let Some(ref path) = cli.output {
        config.persistence.path = path.clone();
    }
    if let Some(ref path) = cli.disk_path {
        config.disk.path = path.clone();
    }
    if let Some(cap) = cli.max_samples {
        config.sampler.max_samples = Some(cap);
    }

    config
}
