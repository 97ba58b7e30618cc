/*!
Logging initialization for eframe-entrypoints.

Installs a `tracing-subscriber` fmt layer filtered by `RUST_LOG`. When
`RUST_LOG` is unset a default filter is used that keeps the application's
own logs while quieting the chattier dependencies.

With the `profiling` feature, `profiling::scope!` markers become tracing spans
and show up in the same output.
*/

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default filter used when `RUST_LOG` is not set.
pub fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,eframe=warn,egui_wgpu=warn,wgpu_core=warn,wgpu_hal=warn,naga=warn,hyper_util=info,reqwest::connect=info,walkers=info,egui::context=warn"
    } else {
        "info,eframe=warn,wgpu_core=warn,wgpu_hal=warn,walkers=warn,egui::context=warn"
    }
}

/// Initialize logging. Safe to call more than once; later calls are no-ops.
pub fn setup_logging() {
    let from_env = std::env::var("RUST_LOG").is_ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    let fmt_layer = fmt::layer().with_filter(filter);
    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        return;
    }

    if from_env {
        tracing::debug!("Logging initialized from RUST_LOG");
    } else {
        tracing::info!("RUST_LOG set to default: {}", default_filter());
    }
}
