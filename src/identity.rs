//! Identity service trait.
//!
//! The identity surface lets the orchestration platform discover plugin
//! metadata, advertised capabilities, and health during registration and
//! scheduling.

use async_trait::async_trait;

use crate::error::PluginError;
use crate::types::{PluginCapability, PluginInfo};

/// Identity service — plugin discovery and health probing.
#[async_trait]
pub trait Identity: Send + Sync {
    /// Return the plugin name and version.
    async fn get_plugin_info(&self) -> Result<PluginInfo, PluginError>;

    /// Liveness probe.  Returns `true` when the plugin can serve requests.
    async fn probe(&self) -> Result<bool, PluginError>;

    /// Advertise the capabilities supported by this plugin.  May be empty.
    async fn get_plugin_capabilities(&self) -> Result<Vec<PluginCapability>, PluginError>;
}
