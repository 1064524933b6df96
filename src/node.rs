//! Node lifecycle service trait.
//!
//! The node service runs where the volumes are consumed and owns the
//! mount-lifecycle state machine:
//!
//! 1. **Stage** — protocol-mandated no-op; the platform calls it before the
//!    first publish.
//! 2. **Publish** — acquire backing storage from the claim daemon, then
//!    bind-mount it at the target path.
//! 3. **Unpublish** — unmount the target, then release the backing storage.
//! 4. **Unstage** — protocol-mandated no-op after the last unpublish.
//!
//! Publish and unpublish are the only state-changing transitions and both
//! must be idempotent under repeated identical calls.

use async_trait::async_trait;

use crate::error::PluginError;
use crate::types::{NodeInfo, NodePublishVolumeRequest, NodeStageVolumeRequest, VolumeId};

/// Node service — the publish/unpublish/stage/unstage lifecycle.
#[async_trait]
pub trait NodeService: Send + Sync {
    /// Make the volume's storage visible at the request's target path.
    ///
    /// Idempotent: when the target is already a mount point the call
    /// succeeds without mounting a second time.
    async fn publish_volume(&self, req: NodePublishVolumeRequest) -> Result<(), PluginError>;

    /// Unmount the target path, then destroy the volume's backing storage.
    ///
    /// Storage is never destroyed while a mount might still reference it:
    /// the unmount must succeed (or be provably unnecessary) first.
    async fn unpublish_volume(
        &self,
        volume_id: &VolumeId,
        target_path: &str,
    ) -> Result<(), PluginError>;

    /// No-op; always succeeds.
    async fn stage_volume(&self, req: NodeStageVolumeRequest) -> Result<(), PluginError>;

    /// No-op; always succeeds.
    async fn unstage_volume(
        &self,
        volume_id: &VolumeId,
        staging_target_path: &str,
    ) -> Result<(), PluginError>;

    /// Return information about the node on which this service is running.
    async fn get_info(&self) -> Result<NodeInfo, PluginError>;
}
