use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub fn init_tracing() {
    init_tracing_with_service("shoplist");
}

/// Install the global subscriber: stderr filtered by `RUST_LOG` (default `info`),
/// plus a DEBUG file layer when `SHOPLIST_LOG_FILE` is set.
pub fn init_tracing_with_service(service_name: &str) {
    let file_logging = std::env::var("SHOPLIST_LOG_FILE").ok();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file = file_logging.as_ref().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", log_path, e);
                None
            }
        }
    });

    match file {
        Some(file) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);

            if registry.with(file_layer).try_init().is_ok() {
                tracing::info!(service = service_name, "File logging enabled");
            }
        }
        None => {
            let _ = registry.try_init();
        }
    }
}
