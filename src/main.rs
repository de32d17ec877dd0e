mod config;
mod device;
mod diff;
mod intent;
mod migration;
mod models;
mod parsers;
mod snapshot;
mod testbed;
mod utils;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use migration::MigrationRunner;
use models::MigrationMode;

/// Convert legacy 802.1X port authentication to new-style C3PL access-session policy
#[derive(Debug, Parser)]
#[command(name = "c3pl-migrate", version, about)]
pub struct Args {
    /// Testbed YAML describing the switches to migrate
    #[arg(long)]
    pub testbed_file: Option<String>,

    /// Directory holding the *.j2 intent templates
    #[arg(long)]
    pub templates_dir: Option<String>,

    /// Name of the VLAN used for critical data access
    #[arg(long)]
    pub data_vlan_name: Option<String>,

    /// Apply the new interface policy closed (enforcement) or open (monitor)
    #[arg(long, value_enum)]
    pub mode: Option<MigrationMode>,

    /// SSH connect and read timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub ssh_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "c3pl_migrate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let cfg = Config::load()?.with_overrides(&args);
    let timestamp = utils::run_timestamp();

    tracing::info!("Starting C3PL migration ({})", timestamp);
    tracing::info!("Testbed: {}", cfg.testbed_file);
    tracing::info!("Templates: {}", cfg.templates_dir);
    tracing::info!("Mode: {}", cfg.mode.as_str());

    let testbed = testbed::load(&cfg.testbed_file)?;
    tracing::info!("Loaded testbed '{}' with {} devices", testbed.testbed.name, testbed.devices.len());
    let targets = testbed.targets()?;
    if targets.is_empty() {
        anyhow::bail!("Testbed {} has no devices", cfg.testbed_file);
    }

    let runner = MigrationRunner::new(&cfg, &timestamp)?;

    // Common setup: connect everything before touching any device
    let devices = device::connect_all(&targets, cfg.ssh_timeout).await?;
    tracing::info!("Connected to {} devices", devices.len());

    match runner.run(&devices).await {
        Ok(report) => {
            let failed: usize = report.devices.iter().map(|d| d.failed_steps()).sum();
            if failed > 0 {
                tracing::warn!("Migration finished with {} failed steps", failed);
            } else {
                tracing::info!("Migration finished successfully");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            Err(e)
        }
    }
}
