//! HMC metrics exporter binary.
//!
//! Loads the configuration, applies command-line overrides, then hands over
//! to [`server::start`], which logs on to the HMC, resolves the target CPCs,
//! sets up the resource cache and serves `/metrics`.

use anyhow::Result;
use clap::Parser;
use hmc_exporter::config::{Config, Overrides};
use hmc_exporter::server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// HMC host (overrides config)
    #[arg(long, env = "HMC_HOST")]
    hmc_host: Option<String>,

    /// HMC userid (overrides config)
    #[arg(long, env = "HMC_USERID")]
    hmc_userid: Option<String>,

    /// HMC password (overrides config)
    #[arg(long, env = "HMC_PASSWORD", hide_env_values = true)]
    hmc_password: Option<String>,

    /// Port to listen on for metrics (overrides config, default 9291)
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to (overrides config, default 0.0.0.0)
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,
}

impl Args {
    fn overrides(self) -> Overrides {
        Overrides {
            host: self.hmc_host,
            userid: self.hmc_userid,
            password: self.hmc_password.map(|p| secrecy::SecretString::new(p.into())),
            port: self.port,
            addr: self.addr,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HMC Prometheus Exporter v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config_path = args.config.clone();

    let mut config = Config::load(&config_path)?;
    config.apply_overrides(args.overrides());

    info!("Configuration loaded from {}", config_path);
    info!(
        "HMC: {}:{} as {}",
        config.console.host, config.console.port, config.console.userid
    );
    if config.metrics.target_cpcs.is_empty() {
        info!("Target CPCs: all CPCs visible to the HMC user");
    } else {
        info!("Target CPCs: {}", config.metrics.target_cpcs.join(", "));
    }
    info!(
        "Metric groups enabled: {}",
        config.enabled_metric_groups().len()
    );
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    if let Err(e) = server::start(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
