use anyhow::Result;
use clap::Parser;
use mov_to_mp4::{convert, AppConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mov-to-mp4")]
#[command(version, about = "Convert a video to an MP4 that fits under a size limit", long_about = None)]
struct Cli {
    /// Video file to convert
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Configuration file (defaults to ./mov-to-mp4.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    // Diagnostics go to stderr so they never break the progress line
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(input) = cli.input else {
        println!("Usage: mov-to-mp4 <input-file>");
        std::process::exit(1);
    };

    if let Err(e) = run(cli.config.as_deref(), &input) {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run(config_path: Option<&Path>, input: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let outcome = convert(&config, input)?;
    println!("\n{}", outcome.report(&config.budget));
    Ok(())
}
