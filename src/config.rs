//! Configuration surface for [`crate::renderer::RendererSupervisor`].
//!
//! Small, explicit config struct with a `Default` impl holding the
//! production constants; there is no on-disk config file here, since the
//! renderer process and its own configuration are external to this crate.

use std::time::Duration;

/// Timeouts, retry knobs and this client's own protocol/product version.
/// Pulling these into a config struct (rather than hardcoding them) lets
/// tests shrink them instead of sleeping for real wall-clock seconds.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Per-call IPC timeout.
    pub ipc_call_timeout: Duration,
    /// How long to wait for the rendezvous event before giving up.
    pub rendezvous_timeout: Duration,
    /// Fallback sleep after spawn when no rendezvous listener is available.
    pub post_spawn_fallback_sleep: Duration,
    /// Minimum time between launch attempts while in `TIMEOUT`/`TERMINATED`.
    pub retry_cooldown: Duration,
    /// Maximum consecutive non-`READY` launch outcomes `can_connect` will
    /// still tolerate before refusing further attempts.
    pub max_retries: u32,
    /// `version_mismatch_count` at/above which commands are silently
    /// dropped instead of being dispatched.
    pub version_mismatch_drop_threshold: u32,
    /// This client's own wire protocol version, compared against the
    /// server's during command dispatch.
    pub client_protocol_version: i32,
    /// This client's own product version string, compared against the
    /// server's during command dispatch.
    pub client_product_version: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        SupervisorConfig {
            ipc_call_timeout: Duration::from_millis(100),
            rendezvous_timeout: Duration::from_secs(30),
            post_spawn_fallback_sleep: Duration::from_secs(10),
            retry_cooldown: Duration::from_secs(30),
            max_retries: 5,
            version_mismatch_drop_threshold: 3,
            client_protocol_version: 1,
            client_product_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
