/// Registers a ctrl-c handler.
///
/// On ctrl-c or SIGTERM the process exits with status 0 straight away, which
/// also ends the poll loop mid-cycle. Gauges are not persisted.
pub fn register_shutdown() {
    ctrlc::set_handler(move || {
        println!();
        tracing::info!(target: "polygon_exporter", "shutting down...");
        std::process::exit(0);
    })
    .expect("failed to register shutdown handler");
}
