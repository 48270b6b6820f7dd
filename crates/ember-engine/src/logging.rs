//! Logger initialization.
//!
//! Centralizes `env_logger` setup so binaries get consistent output. The
//! `RUST_LOG` variable takes precedence; the default keeps engine output at
//! info while clamping wgpu's internals to warnings.

use std::sync::Once;

static INIT: Once = Once::new();

/// Default filter applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Initializes the global logger once.
///
/// Idempotent; subsequent calls are ignored. Intended usage is early in
/// `main`, before any device or window work.
pub fn init_logging() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.parse_filters(DEFAULT_FILTER);
        }

        builder.init();

        log::debug!("logging initialized");
    });
}
