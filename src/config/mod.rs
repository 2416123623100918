use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use eyre::{Result, WrapErr};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Provider,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of the environment variables read by [Config::new]
pub const ENV_PREFIX: &str = "POLYGON_EXPORTER_";

/// Config file read when no `--config` flag is given
pub const DEFAULT_CONFIG_FILE: &str = "polygon-exporter.toml";

/// Exporter configuration. Read once at startup and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port the metrics server listens on
    pub port: u16,
    /// Address the metrics server binds to
    pub listen_addr: String,
    /// Bor JSON-RPC endpoint
    pub bor: Option<String>,
    /// Heimdall REST endpoint
    pub heimdall: Option<String>,
    /// Polygon staking REST endpoint
    pub staking: Option<String>,
    /// Validator id looked up on the staking endpoint
    #[serde(deserialize_with = "validator_id")]
    pub validator: Option<String>,
    /// Seconds to sleep between polls
    pub freq: u64,
    /// Log at debug level
    pub verbose: bool,
    /// Directory for rolling log files
    pub logs_dir: Option<PathBuf>,
    /// Log file rotation: never, minutely, hourly or daily
    pub logs_rotation: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 9099,
            listen_addr: "0.0.0.0".to_string(),
            bor: None,
            heimdall: None,
            staking: None,
            validator: None,
            freq: 300,
            verbose: false,
            logs_dir: None,
            logs_rotation: None,
        }
    }
}

impl Config {
    /// Layers defaults, the TOML file at `config_path`, `POLYGON_EXPORTER_*`
    /// environment variables and `cli_config`, later sources winning.
    /// A missing config file is not an error.
    pub fn new(config_path: &Path, cli_config: impl Provider) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(cli_config)
            .extract()
            .wrap_err("invalid configuration")?;

        Ok(config.normalized())
    }

    /// Treats blank endpoints and validator ids as unset
    fn normalized(mut self) -> Self {
        for value in [
            &mut self.bor,
            &mut self.heimdall,
            &mut self.staking,
            &mut self.validator,
        ] {
            if value.as_deref().map(str::trim).map_or(false, str::is_empty) {
                *value = None;
            }
        }
        self
    }

    /// Socket address of the metrics server
    pub fn metrics_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_addr
            .parse()
            .wrap_err_with(|| format!("invalid listen address {:?}", self.listen_addr))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Time to sleep between two polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.freq)
    }
}

/// Accepts validator ids written either as strings or as bare integers
fn validator_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    }))
}
