//! Plugin configuration.
//!
//! All tunables live in [`PluginConfig`], passed explicitly into the plugin
//! constructor.  Nothing in this crate reads configuration from globals or
//! the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a [`ClaimNodePlugin`](crate::plugin::ClaimNodePlugin)
/// and its claim daemon client.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Base URL of the claim daemon, e.g. `http://127.0.0.1:7788`.
    /// Every volume create/destroy request is sent here.
    pub backend_endpoint: String,

    /// How long to wait for the daemon to start answering a single request
    /// before giving up.  Applied as the client's read timeout, so a hung
    /// daemon surfaces as a timeout error rather than an indefinite stall.
    pub response_header_timeout: Duration,

    /// Upper bound on an entire daemon call, response body included.
    /// Must be longer than `response_header_timeout`.
    pub overall_timeout: Duration,

    /// Root directory under which the daemon keeps live volumes.  The
    /// plugin's health probe reports healthy while this directory exists.
    pub root_volumes_dir: PathBuf,

    /// Root directory under which the daemon keeps copy-on-write overlays.
    /// Not touched by the plugin itself; carried for whatever supervises the
    /// daemon process.
    pub root_overlays_dir: PathBuf,
}

impl Default for PluginConfig {
    /// The reference configuration: a daemon on the local loopback with a
    /// one-minute response-header timeout and a five-minute overall timeout.
    fn default() -> Self {
        Self {
            backend_endpoint: "http://127.0.0.1:7788".to_owned(),
            response_header_timeout: Duration::from_secs(60),
            overall_timeout: Duration::from_secs(5 * 60),
            root_volumes_dir: PathBuf::from("/var/lib/claimd/volumes"),
            root_overlays_dir: PathBuf::from("/var/lib/claimd/overlays"),
        }
    }
}
