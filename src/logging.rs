//! Process-wide tracing initialization for the single-process, non-reloadable
//! case: this crate has no config-file-driven log level reload surface.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Installs a global `tracing` subscriber reading `RUST_LOG` (defaulting to
/// `info` for this crate), if one has not already been installed.
///
/// Intended for binaries embedding this crate; library code should never
/// call this on behalf of its caller.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ime_renderer_core=info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let _ = Registry::default().with(env_filter).with(fmt_layer).try_init();
}
