mod common;

use std::net::{SocketAddr, TcpListener};

use prometheus_exporter::prometheus::Registry;

use polygon_exporter::{
    config::Config,
    exporter::{Exporter, Readings},
    telemetry::{self, Metrics},
};

fn config_for(url: &str) -> Config {
    Config {
        bor: Some(url.to_string()),
        heimdall: Some(url.to_string()),
        staking: Some(url.to_string()),
        validator: Some("7".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn poll_once_publishes_all_gauges() {
    let url = common::serve(common::polygon_upstream("0x1a", 100, 55, 42)).await;

    // Heimdall is reached through another hostname for the same server
    let config = Config {
        heimdall: Some(url.replace("127.0.0.1", "localhost")),
        ..config_for(&url)
    };

    let registry = Registry::new();
    let metrics = Metrics::new(&registry).unwrap();
    let exporter = Exporter::new(&config, metrics);

    let readings = exporter.poll_once().await;
    assert_eq!(
        readings,
        Readings {
            bor: 26.0,
            heimdall: 100.0,
            checkpoint: 55.0,
            local: 42.0,
        }
    );

    let text = telemetry::render(&registry).unwrap();
    let samples: Vec<&str> = text.lines().filter(|line| !line.starts_with('#')).collect();
    assert_eq!(samples.len(), 4);
    let has = |sample: &str| samples.iter().any(|line| line.starts_with(sample));
    assert!(has(r#"polygon_latest_bor_height{external_endpoint="127.0.0.1"} 26"#));
    assert!(has(r#"polygon_latest_heimdall_height{external_endpoint="localhost"} 100"#));
    assert!(has(r#"polygon_latest_checkpoint_height{external_endpoint="localhost"} 55"#));
    assert!(has(r#"polygon_local_checkpoint_height{external_endpoint="127.0.0.1"} 42"#));
}

#[tokio::test]
async fn repeated_polls_are_stable() {
    let url = common::serve(common::polygon_upstream("0x1a", 100, 55, 42)).await;

    let registry = Registry::new();
    let metrics = Metrics::new(&registry).unwrap();
    let exporter = Exporter::new(&config_for(&url), metrics);

    exporter.poll_once().await;
    let first = telemetry::render(&registry).unwrap();
    exporter.poll_once().await;
    exporter.poll_once().await;
    assert_eq!(telemetry::render(&registry).unwrap(), first);
}

#[tokio::test]
async fn failed_polls_keep_last_values() {
    let url = common::serve(common::polygon_upstream("0x1a", 100, 55, 42)).await;

    let registry = Registry::new();
    let metrics = Metrics::new(&registry).unwrap();
    let healthy = Exporter::new(&config_for(&url), metrics.clone());
    healthy.poll_once().await;
    let before = telemetry::render(&registry).unwrap();

    // Same hostname, but nothing listens there any more
    let broken = Exporter::new(&config_for("http://127.0.0.1:1"), metrics.clone());
    assert_eq!(broken.poll_once().await, Readings::default());
    assert_eq!(telemetry::render(&registry).unwrap(), before);

    let bor = metrics.bor_height.with_label_values(&["127.0.0.1"]).get();
    assert_eq!(bor, 26.0);
}

#[tokio::test]
async fn height_of_one_is_not_published() {
    let url = common::serve(common::polygon_upstream("0x1", 1, 0, 1)).await;

    let registry = Registry::new();
    let metrics = Metrics::new(&registry).unwrap();
    let exporter = Exporter::new(&config_for(&url), metrics);

    let readings = exporter.poll_once().await;
    assert_eq!(readings.bor, 1.0);
    assert_eq!(readings.local, 1.0);

    let text = telemetry::render(&registry).unwrap();
    assert!(text.lines().all(|line| line.starts_with('#')));
}

#[test]
fn metrics_server_bind_failure_is_an_error() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();

    let registry = Registry::new();
    assert!(telemetry::init_metrics(addr, &registry).is_err());
}

#[tokio::test]
async fn metrics_server_serves_registry() {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let registry = Registry::new();
    let metrics = Metrics::new(&registry).unwrap();
    telemetry::publish_height(&metrics.bor_height, "polygon-rpc.com", 26.0);
    let _server = telemetry::init_metrics(addr, &registry).unwrap();

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(r#"polygon_latest_bor_height{external_endpoint="polygon-rpc.com"} 26"#));
}
