mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rmsnap_core::{DeviceModel, SshSession, capture_and_close};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{FileConfig, Overrides};

#[derive(Parser)]
#[command(name = "rmsnap")]
#[command(about = "Take a cropped screenshot of a reMarkable tablet over ssh")]
#[command(version)]
struct Args {
    /// Device address [default: 10.11.99.1]
    #[arg(short = 's', long, env = "RMSNAP_HOST")]
    host: Option<String>,

    /// Remote login user [default: root]
    #[arg(short, long)]
    user: Option<String>,

    /// Treat white as content instead of black
    #[arg(short, long)]
    invert: bool,

    /// Output base name, ".png" is appended [default: temp]
    #[arg(short, long)]
    output: Option<String>,

    /// Skip identity detection and use this model (rm1, rm2)
    #[arg(long)]
    device: Option<DeviceModel>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON capture report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// OpenSSH client executable [default: ssh]
    #[arg(long)]
    ssh: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rmsnap=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match &args.config {
        Some(path) => {
            let file = FileConfig::load(path)?;
            info!("Loaded config from {}", path.display());
            file
        }
        None => FileConfig::default(),
    };

    let ssh_program = args
        .ssh
        .clone()
        .or_else(|| file.ssh.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("ssh"));

    let config = config::resolve(
        file,
        Overrides {
            host: args.host,
            user: args.user,
            invert: args.invert,
            output: args.output,
            device: args.device,
        },
    );

    info!("Connecting to {}@{}", config.user, config.host);
    let session = SshSession::connect(ssh_program, &config.user, &config.host)
        .with_context(|| format!("Failed to connect to {}", config.host))?;

    let outcome = capture_and_close(session, &config);
    output::write_outcome(outcome, &config.output_path(), args.report.as_deref())?;

    Ok(())
}
