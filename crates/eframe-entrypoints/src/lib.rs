//! Native entry point system for egui/eframe applications
//!
//! This crate provides a reusable desktop entry point (tokio runtime + logging +
//! eframe window), along with utilities for CLI and environment parsing.
//!
//! # Usage
//!
//! In your application's `lib.rs`, use the `eframe_app!` macro to define the entry point:
//!
//! ```ignore
//! eframe_entrypoints::eframe_app!(
//!     "My App Name",
//!     |cc| Ok(Box::new(MyApp::new(cc)?))
//! );
//! ```
//!
//! In your `main.rs`:
//!
//! ```ignore
//! fn main() {
//!     if let Err(e) = my_app::run_native() {
//!         eprintln!("{e}");
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod cli;
pub mod logging;

// Re-export commonly used types
pub use cli::{get_env, parse_args};
pub use logging::setup_logging;

// Re-exported so the macro expands without the application naming these crates
pub use eframe;
pub use eframe::CreationContext;
pub use tokio;

/// Error returned by an application creator
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of the entry point itself
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to create the async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Application failed: {0}")]
    Eframe(#[from] eframe::Error),
}

/// Defines `run_native()` for an eframe application.
///
/// # Arguments
///
/// * `$app_name` - A string literal with the application name (window title, logging)
/// * `$app_creator` - A closure taking `&CreationContext` and returning
///   `Result<Box<dyn eframe::App>, DynError>`
///
/// The generated function builds a multi-threaded tokio runtime and runs the UI
/// inside it, so the application can spawn tasks from its `update` loop.
#[macro_export]
macro_rules! eframe_app {
    ($app_name:expr, $app_creator:expr) => {
        /// Run the application on native (desktop) platforms.
        ///
        /// Call this from your `main.rs`.
        pub fn run_native() -> ::std::result::Result<(), $crate::Error> {
            let rt = $crate::tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            rt.block_on(async {
                $crate::native_main_impl($app_name, env!("CARGO_PKG_VERSION"), $app_creator)
                    .await
            })
        }
    };
}

/// Internal implementation for the native entry point.
/// Use the `eframe_app!` macro instead of calling this directly.
#[doc(hidden)]
pub async fn native_main_impl(
    app_name: &str,
    app_version: &str,
    app_creator: impl FnOnce(&eframe::CreationContext<'_>) -> Result<Box<dyn eframe::App>, DynError>,
) -> Result<(), Error> {
    // Must happen before any logging
    logging::setup_logging();

    tracing::info!("{} {}", app_name, app_version);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title(app_name),
        ..Default::default()
    };

    eframe::run_native(
        app_name,
        native_options,
        Box::new(move |cc| app_creator(cc)),
    )?;

    tracing::info!("{} exited", app_name);
    Ok(())
}
