use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the process-wide tracing subscriber for an embedding host.
///
/// The filter comes from `CHATBRIDGE_LOG` when set, falling back to
/// `default_level` (typically `"info"`). Safe to call more than once;
/// later calls are no-ops.
pub fn init_telemetry(default_level: &str) {
    let filter =
        EnvFilter::try_from_env("CHATBRIDGE_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(true),
        )
        .try_init();
}
