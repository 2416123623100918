use std::env::current_dir;
use std::path::PathBuf;

use ansi_term::Colour::{Blue, Cyan, Purple, Red, Yellow};
use eyre::Result;
use tracing::subscriber::set_global_default;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Prefix of the rolling log files written to the logs directory
pub const LOG_FILE_NAME_PREFIX: &str = "polygon-exporter.log";

/// Target of the per-poll reading lines. Always enabled at `info`, whatever
/// `RUST_LOG` says.
pub const REPORT_TARGET: &str = "polygon_exporter::report";

/// Log file rotation used when none is configured
pub const DEFAULT_ROTATION: &str = "daily";

/// Configure logging telemetry.
///
/// Events always go to standard output. When `logs_dir` is set they are also
/// written to a rolling file there; the returned guards flush that file and
/// must be held for the lifetime of the process.
pub fn init(
    verbose: bool,
    logs_dir: Option<PathBuf>,
    logs_rotation: Option<String>,
) -> Result<Vec<WorkerGuard>> {
    let env_filter = match verbose {
        true => "polygon_exporter=debug",
        false => "polygon_exporter=info",
    };
    let rotation = get_rotation_strategy(logs_rotation.as_deref().unwrap_or(DEFAULT_ROTATION));
    let (subscriber, guards) = build_subscriber(env_filter.into(), logs_dir, rotation);
    init_subscriber(subscriber)?;
    Ok(guards)
}

/// Subscriber Composer
///
/// Builds a subscriber with multiple layers into a [tracing](https://crates.io/crates/tracing) subscriber.
pub fn build_subscriber(
    env_filter: String,
    logs_dir: Option<PathBuf>,
    rotation: Rotation,
) -> (impl Subscriber + Send + Sync, Vec<WorkerGuard>) {
    let mut guards = Vec::new();

    let env_filter = with_report_directive(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter)),
    );

    let file_layer = logs_dir.map(|dir| {
        let appender = get_rolling_file_appender(dir, rotation, LOG_FILE_NAME_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        fmt::layer().with_writer(writer).with_ansi(false)
    });

    let subscriber = Registry::default()
        .with(env_filter)
        .with(AnsiTermLayer)
        .with(file_layer);

    (subscriber, guards)
}

/// Adds the directive that keeps [REPORT_TARGET] events at `info` on top of `filter`
pub fn with_report_directive(filter: EnvFilter) -> EnvFilter {
    match format!("{REPORT_TARGET}=info").parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Globally registers a subscriber.
/// This will error if a subscriber has already been registered.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<()> {
    LogTracer::init().map_err(|_| eyre::eyre!("Failed to set logger"))?;
    set_global_default(subscriber).map_err(|_| eyre::eyre!("Failed to set subscriber"))
}

/// Creates a file appender in `dir` rotating on `rotation`
pub fn get_rolling_file_appender(
    dir: PathBuf,
    rotation: Rotation,
    prefix: &str,
) -> RollingFileAppender {
    RollingFileAppender::new(rotation, dir, prefix)
}

/// Maps a rotation name to a [Rotation], defaulting to daily
pub fn get_rotation_strategy(val: &str) -> Rotation {
    match val {
        "never" => Rotation::NEVER,
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => {
            eprintln!("Invalid log rotation strategy provided, defaulting to daily");
            Rotation::DAILY
        }
    }
}

/// The AnsiVisitor
///
/// Prints the event message followed by any extra fields as `name=value`.
#[derive(Debug, Default)]
pub struct AnsiVisitor {
    message: String,
    fields: Vec<String>,
}

impl AnsiVisitor {
    fn push(&mut self, field: &tracing::field::Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn line(&self) -> String {
        if self.fields.is_empty() {
            self.message.clone()
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl tracing::field::Visit for AnsiVisitor {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.push(field, format!("{value:?}"))
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push(field, value.to_string())
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push(field, value.to_string())
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push(field, value.to_string())
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push(field, value.to_string())
    }

    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.push(field, value.to_string())
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{value:?}"))
    }
}

/// An Ansi Term layer for tracing
#[derive(Debug)]
pub struct AnsiTermLayer;

impl<S> Layer<S> for AnsiTermLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = AnsiVisitor::default();
        event.record(&mut visitor);

        let utc: chrono::DateTime<chrono::Utc> = chrono::Utc::now();
        let level = match *event.metadata().level() {
            Level::ERROR => Red.paint("ERROR").to_string(),
            Level::WARN => Yellow.paint("WARN").to_string(),
            Level::INFO => Blue.paint("INFO").to_string(),
            Level::DEBUG => "DEBUG".to_string(),
            Level::TRACE => Purple.paint("TRACE").to_string(),
        };

        let location = event.metadata().file().unwrap_or_default();
        let relative_path = current_dir().unwrap_or_default().to_string_lossy().to_string();
        let location = match location.strip_prefix(&relative_path) {
            Some(l) => format!("./{}", l.strip_prefix('/').unwrap_or(l)),
            None => location.to_string(),
        };

        let line = format!(
            "[{}] {}: {} at {} {}",
            Cyan.paint(utc.to_rfc2822()),
            level,
            Purple.paint(event.metadata().target()),
            Cyan.paint(location),
            visitor.line()
        );

        match *event.metadata().level() {
            Level::ERROR => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }
}
