use std::{collections::HashMap, path::PathBuf};

use clap::Parser;
use eyre::{Result, WrapErr};
use figment::{providers::Serialized, value::Value};
use prometheus_exporter::prometheus::Registry;

use polygon_exporter::{
    config::{Config, DEFAULT_CONFIG_FILE},
    exporter::Exporter,
    telemetry::{self, Metrics},
    version::Version,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.to_config()?;

    let _guards = telemetry::init(
        config.verbose,
        config.logs_dir.clone(),
        config.logs_rotation.clone(),
    )?;
    telemetry::register_shutdown();

    tracing::info!(target: "polygon_exporter", "starting {}", Version::build());

    let registry = Registry::new();
    let metrics = Metrics::new(&registry)?;

    let addr = config.metrics_addr()?;
    let _server = telemetry::init_metrics(addr, &registry)
        .wrap_err_with(|| format!("error starting HTTP server on {addr}"))?;
    tracing::info!(target: "polygon_exporter", "serving metrics on {}", addr);

    let exporter = Exporter::new(&config, metrics);
    let targets = exporter.targets();
    tracing::info!(
        target: "polygon_exporter",
        "bor={:?} heimdall={:?} staking={:?}",
        targets.bor,
        targets.heimdall,
        targets.staking
    );

    exporter.run().await;

    Ok(())
}

#[derive(Parser)]
#[clap(version, about = "Polygon Exporter.")]
pub struct Cli {
    /// The port used to export the metrics. Default is 9099.
    #[clap(long, value_name = "PORT")]
    port: Option<u16>,
    /// Bor RPC endpoint.
    #[clap(long, value_name = "BOR")]
    bor: Option<String>,
    /// Heimdall REST endpoint.
    #[clap(long, value_name = "HEIMDALL")]
    heimdall: Option<String>,
    /// Polygon Staking REST endpoint.
    #[clap(long, value_name = "STAKING")]
    staking: Option<String>,
    /// Validator ID.
    #[clap(long, value_name = "VALIDATOR")]
    validator: Option<String>,
    /// Update frequency in seconds. Default is 300 seconds (5 minutes).
    #[clap(long, value_name = "SEC")]
    freq: Option<u64>,
    /// Address the metrics server binds to. Default is 0.0.0.0.
    #[clap(long)]
    listen_addr: Option<String>,
    /// Path to a TOML config file.
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Directory to write rolling log files to.
    #[clap(long)]
    logs_dir: Option<String>,
    /// Log file rotation: never, minutely, hourly or daily.
    #[clap(long)]
    logs_rotation: Option<String>,
    /// Log at debug level.
    #[clap(short, long)]
    verbose: bool,
}

impl Cli {
    pub fn to_config(&self) -> Result<Config> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Config::new(&config_path, self.as_provider())
    }

    pub fn as_provider(&self) -> Serialized<HashMap<&str, Value>> {
        let mut user_dict = HashMap::new();

        if let Some(port) = self.port {
            user_dict.insert("port", Value::from(port));
        }

        if let Some(freq) = self.freq {
            user_dict.insert("freq", Value::from(freq));
        }

        let strings = [
            ("bor", &self.bor),
            ("heimdall", &self.heimdall),
            ("staking", &self.staking),
            ("validator", &self.validator),
            ("listen_addr", &self.listen_addr),
            ("logs_dir", &self.logs_dir),
            ("logs_rotation", &self.logs_rotation),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                user_dict.insert(key, Value::from(value.clone()));
            }
        }

        if self.verbose {
            user_dict.insert("verbose", Value::from(true));
        }

        Serialized::from(user_dict, "default".to_string())
    }
}
