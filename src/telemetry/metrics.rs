//! Prometheus Metrics Module.

use std::net::SocketAddr;

use eyre::Result;
use prometheus_exporter::{
    prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder},
    Builder, Exporter,
};

/// Label carrying the hostname of the endpoint a reading came from
pub const ENDPOINT_LABEL: &str = "external_endpoint";

/// Readings at or below this value are treated as missing and never published
pub const MIN_PUBLISHED_HEIGHT: f64 = 1.0;

/// The exporter's gauges, registered against a caller-owned [Registry]
#[derive(Clone)]
pub struct Metrics {
    /// Latest Bor block height
    pub bor_height: GaugeVec,
    /// Heimdall height of the latest checkpoint response
    pub heimdall_height: GaugeVec,
    /// Latest checkpoint number, labeled with the Heimdall host
    pub checkpoint_height: GaugeVec,
    /// Last checkpoint signed by the configured validator
    pub local_checkpoint_height: GaugeVec,
}

impl Metrics {
    /// Creates the gauges and registers them with `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        Ok(Self {
            bor_height: register_gauge_vec(
                registry,
                "polygon_latest_bor_height",
                "Polygon Latest Bor Height",
            )?,
            heimdall_height: register_gauge_vec(
                registry,
                "polygon_latest_heimdall_height",
                "Polygon Latest Heimdall Height",
            )?,
            checkpoint_height: register_gauge_vec(
                registry,
                "polygon_latest_checkpoint_height",
                "Polygon Latest Checkpoint Height",
            )?,
            local_checkpoint_height: register_gauge_vec(
                registry,
                "polygon_local_checkpoint_height",
                "Polygon Local Checkpoint Height",
            )?,
        })
    }
}

fn register_gauge_vec(registry: &Registry, name: &str, help: &str) -> Result<GaugeVec> {
    let gauge = GaugeVec::new(Opts::new(name, help), &[ENDPOINT_LABEL])?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Sets `gauge{external_endpoint=endpoint}` to `height` if it is a real height.
///
/// Returns whether the gauge moved. Zero, one and NaN are ignored so the last
/// good value stays visible.
pub fn publish_height(gauge: &GaugeVec, endpoint: &str, height: f64) -> bool {
    if height > MIN_PUBLISHED_HEIGHT {
        gauge.with_label_values(&[endpoint]).set(height);
        true
    } else {
        false
    }
}

/// Renders the registry in the Prometheus text exposition format
pub fn render(registry: &Registry) -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Starts the metrics server for `registry` on `addr`
pub fn init(addr: SocketAddr, registry: &Registry) -> Result<Exporter> {
    let mut builder = Builder::new(addr);
    builder.with_registry(registry.clone());
    Ok(builder.start()?)
}
