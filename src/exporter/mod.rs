use std::time::Duration;

use reqwest::Url;

use crate::{
    client::HttpClient,
    config::Config,
    sources::{BorSource, HeimdallSource, StakingSource},
    telemetry::{publish_height, Metrics, REPORT_TARGET},
};

/// Hostnames used as the `external_endpoint` label of each gauge.
///
/// Derived once from the configuration, so every gauge carries at most one
/// label value for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    pub bor: Option<String>,
    pub heimdall: Option<String>,
    pub staking: Option<String>,
}

impl Targets {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bor: config.bor.as_deref().map(hostname),
            heimdall: config.heimdall.as_deref().map(hostname),
            staking: config.staking.as_deref().map(hostname),
        }
    }
}

/// Label value for an endpoint: its lowercased host, or the raw endpoint if
/// it has none
pub fn hostname(endpoint: &str) -> String {
    Url::parse(endpoint)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()))
        .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| endpoint.to_string())
}

/// Values extracted in one poll. `0.0` means the reading was unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    /// Latest Bor block
    pub bor: f64,
    /// Heimdall height of the latest checkpoint
    pub heimdall: f64,
    /// Latest checkpoint number
    pub checkpoint: f64,
    /// Last checkpoint signed by the validator
    pub local: f64,
}

impl Readings {
    /// Writes every real height to its gauge, returning how many gauges moved
    pub fn publish(&self, metrics: &Metrics, targets: &Targets) -> usize {
        let updates = [
            (&metrics.bor_height, &targets.bor, self.bor),
            (&metrics.heimdall_height, &targets.heimdall, self.heimdall),
            (&metrics.checkpoint_height, &targets.heimdall, self.checkpoint),
            (&metrics.local_checkpoint_height, &targets.staking, self.local),
        ];

        let mut moved = 0;
        for (gauge, target, height) in updates {
            if let Some(endpoint) = target {
                if publish_height(gauge, endpoint, height) {
                    moved += 1;
                }
            }
        }
        moved
    }
}

/// Polls the upstream sources and republishes their heights
pub struct Exporter {
    bor: BorSource,
    heimdall: HeimdallSource,
    staking: StakingSource,
    metrics: Metrics,
    targets: Targets,
    interval: Duration,
}

impl Exporter {
    /// Builds the sources from `config` around a shared HTTP client
    pub fn new(config: &Config, metrics: Metrics) -> Self {
        let client = HttpClient::new();
        Self {
            bor: BorSource::new(config.bor.clone(), client.clone()),
            heimdall: HeimdallSource::new(config.heimdall.clone(), client.clone()),
            staking: StakingSource::new(config.staking.clone(), config.validator.clone(), client),
            metrics,
            targets: Targets::from_config(config),
            interval: config.poll_interval(),
        }
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    /// Runs a single poll: fetch every source in turn, log the readings and
    /// publish the ones that are real heights
    pub async fn poll_once(&self) -> Readings {
        let bor = self.bor.latest_height().await;
        let (heimdall, checkpoint) = self.heimdall.latest_checkpoint().await;
        let local = self.staking.latest_signed().await;

        let readings = Readings {
            bor,
            heimdall,
            checkpoint,
            local,
        };

        tracing::info!(target: REPORT_TARGET, "Bor: {:?}", readings.bor);
        tracing::info!(target: REPORT_TARGET, "Heimdall: {:?}", readings.heimdall);
        tracing::info!(target: REPORT_TARGET, "Checkpoint: {:?}", readings.checkpoint);
        tracing::info!(target: REPORT_TARGET, "Local: {:?}", readings.local);

        let updated = readings.publish(&self.metrics, &self.targets);
        tracing::debug!(target: "polygon_exporter", "updated {} gauges", updated);

        readings
    }

    /// Polls forever, sleeping the configured interval between polls
    pub async fn run(&self) {
        tracing::info!(
            target: "polygon_exporter",
            "polling every {}s",
            self.interval.as_secs()
        );

        loop {
            self.poll_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}
