//! Claim daemon client.
//!
//! The claim daemon (claimd) owns actual volume storage: it allocates a
//! directory tree per volume and destroys it on request.  This module is the
//! plugin's narrow window onto that service — create and destroy, nothing
//! else.
//!
//! # Wire protocol
//!
//! - `POST {endpoint}/volumes` with `{"handle", "strategy", "properties"}`
//!   → `VolumeHandle` JSON carrying the real on-disk path.
//! - `DELETE {endpoint}/volumes/{handle}` → empty success.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::PluginConfig;
use crate::error::PluginError;
use crate::types::VolumeId;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Provisioning strategy for a new claim volume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Strategy {
    /// Start from a fresh, empty directory.
    Empty,
}

/// What to provision when creating a volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSpec {
    /// Provisioning strategy.
    pub strategy: Strategy,
    /// Opaque key-value properties stored alongside the volume.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl Default for VolumeSpec {
    /// An empty volume with no properties — the only spec the node
    /// lifecycle ever requests.
    fn default() -> Self {
        Self {
            strategy: Strategy::Empty,
            properties: HashMap::new(),
        }
    }
}

/// Descriptor returned by the daemon for a created volume.
///
/// Owned by the daemon; the plugin only reads `path` during the publish call
/// and never caches the handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeHandle {
    /// The volume's handle, equal to the caller-supplied id.
    pub handle: String,
    /// Real on-disk path backing the volume — the source of the bind mount.
    pub path: PathBuf,
    /// Properties stored with the volume.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

#[derive(Serialize)]
struct CreateVolumeBody<'a> {
    handle: &'a str,
    #[serde(flatten)]
    spec: &'a VolumeSpec,
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// Request/response interface to the service owning volume storage.
#[async_trait]
pub trait VolumeBackend: Send + Sync {
    /// Create storage for `id`, or fetch it when the daemon already holds a
    /// volume under this handle.
    async fn create_volume(
        &self,
        id: &VolumeId,
        spec: VolumeSpec,
    ) -> Result<VolumeHandle, PluginError>;

    /// Destroy the storage for `id`.
    async fn destroy_volume(&self, id: &VolumeId) -> Result<(), PluginError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// HTTP [`VolumeBackend`] pointed at a fixed local claimd endpoint.
pub struct ClaimClient {
    http: reqwest::Client,
    base_url: String,
}

impl ClaimClient {
    /// Build a client for the endpoint in `config`.
    ///
    /// The read timeout bounds how long the daemon may stay silent on a
    /// single response; the overall timeout bounds the whole call.
    pub fn new(config: &PluginConfig) -> Result<Self, PluginError> {
        let http = reqwest::Client::builder()
            .read_timeout(config.response_header_timeout)
            .timeout(config.overall_timeout)
            .build()
            .map_err(PluginError::backend)?;

        Ok(Self {
            http,
            base_url: config.backend_endpoint.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl VolumeBackend for ClaimClient {
    #[instrument(skip(self, spec))]
    async fn create_volume(
        &self,
        id: &VolumeId,
        spec: VolumeSpec,
    ) -> Result<VolumeHandle, PluginError> {
        let body = CreateVolumeBody {
            handle: &id.0,
            spec: &spec,
        };

        let response = self
            .http
            .post(self.url("/volumes"))
            .json(&body)
            .send()
            .await
            .map_err(PluginError::backend)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PluginError::Backend(format!(
                "create volume {id}: {status}: {text}"
            )));
        }

        let handle: VolumeHandle = response
            .json()
            .await
            .map_err(|e| PluginError::Backend(format!("decode create response for {id}: {e}")))?;
        debug!(path = %handle.path.display(), "claimd volume created");
        Ok(handle)
    }

    #[instrument(skip(self))]
    async fn destroy_volume(&self, id: &VolumeId) -> Result<(), PluginError> {
        let response = self
            .http
            .delete(self.url(&format!("/volumes/{id}")))
            .send()
            .await
            .map_err(PluginError::backend)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PluginError::Backend(format!(
                "destroy volume {id}: {status}: {text}"
            )));
        }

        debug!("claimd volume destroyed");
        Ok(())
    }
}
