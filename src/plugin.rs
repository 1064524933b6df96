//! The node lifecycle plugin.
//!
//! [`ClaimNodePlugin`] implements [`Identity`] and [`NodeService`] over two
//! collaborators: a [`VolumeBackend`] that owns storage allocation and a
//! [`Mounter`] that owns the node's mount table.  It holds no durable state
//! of its own — the claim daemon and the live mount table are the source of
//! truth, which is what makes publish and unpublish safe to retry.
//!
//! # Ordering invariant
//!
//! Publish acquires storage *before* touching the mount table; unpublish
//! releases the mount *before* destroying storage.  A crash between the two
//! publish steps can leave a volume allocated but unmounted (the platform
//! retries or cleans up); the reverse — destroying storage a mount still
//! references — can never happen.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::claim::{ClaimClient, VolumeBackend, VolumeSpec};
use crate::config::PluginConfig;
use crate::error::PluginError;
use crate::identity::Identity;
use crate::mount::{MountFlag, MountStatus, Mounter, SysMounter};
use crate::node::NodeService;
use crate::types::{
    NodeInfo, NodePublishVolumeRequest, NodeStageVolumeRequest, PluginCapability, PluginInfo,
    SUPPORTED_ACCESS_MODES, VolumeId,
};

/// Name advertised to the orchestration platform.
const PLUGIN_NAME: &str = "claimd.csi";

/// Ceiling advertised in [`NodeInfo::max_volumes`].
const MAX_VOLUMES_PER_NODE: u64 = 256;

/// Node-local volume plugin backed by a claim daemon.
pub struct ClaimNodePlugin<B, M> {
    config: PluginConfig,
    backend: B,
    mounter: M,
    node_id: String,
    /// Per-volume locks: at most one in-flight mutating operation per
    /// volume id.  Entries are created lazily and removed once uncontended;
    /// operations on distinct volumes never contend.
    locks: DashMap<VolumeId, Arc<Mutex<()>>>,
}

impl<B, M> ClaimNodePlugin<B, M>
where
    B: VolumeBackend,
    M: Mounter,
{
    /// Create a plugin over explicit collaborators.
    pub fn new(config: PluginConfig, backend: B, mounter: M, node_id: String) -> Self {
        Self {
            config,
            backend,
            mounter,
            node_id,
            locks: DashMap::new(),
        }
    }

    fn volume_lock(&self, id: &VolumeId) -> Arc<Mutex<()>> {
        let entry = self.locks.entry(id.clone()).or_default();
        Arc::clone(entry.value())
    }

    /// Drop the lock entry for `id` once no task holds it any more.
    fn release_lock(&self, id: &VolumeId) {
        self.locks
            .remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn publish_locked(&self, req: &NodePublishVolumeRequest) -> Result<(), PluginError> {
        // Acquire storage first; a failure here leaves nothing to undo.
        let handle = self
            .backend
            .create_volume(&req.volume_id, VolumeSpec::default())
            .await?;

        let target = Path::new(&req.target_path);
        match self.mounter.probe(target).await? {
            MountStatus::Mounted => {
                debug!(target_path = %req.target_path, "target already mounted, nothing to do");
                return Ok(());
            }
            MountStatus::NotFound => self.mounter.create_dir_all(target).await?,
            MountStatus::NotMounted => {}
        }

        let mut flags = vec![MountFlag::Bind];
        if req.read_only {
            flags.push(MountFlag::ReadOnly);
        }

        self.mounter.bind_mount(&handle.path, target, &flags).await?;

        info!(
            source = %handle.path.display(),
            target_path = %req.target_path,
            read_only = req.read_only,
            "volume published",
        );
        Ok(())
    }

    async fn unpublish_locked(
        &self,
        volume_id: &VolumeId,
        target_path: &str,
    ) -> Result<(), PluginError> {
        // Storage must never be destroyed while a mount might still
        // reference it, so the mount goes first.  The probe mirrors the
        // publish-side inspection: a target that is not a mount point (or
        // does not exist at all) needs no unmount, and calling umount(2) on
        // it would fail with EINVAL rather than no-op.
        match self.mounter.probe(Path::new(target_path)).await? {
            MountStatus::Mounted => {
                self.mounter.unmount(Path::new(target_path)).await?;
                debug!(target_path, "target unmounted");
            }
            MountStatus::NotMounted | MountStatus::NotFound => {
                debug!(target_path, "target not mounted, skipping unmount");
            }
        }

        self.backend.destroy_volume(volume_id).await?;

        info!(target_path, "volume unpublished");
        Ok(())
    }
}

impl ClaimNodePlugin<ClaimClient, SysMounter> {
    /// Plugin wired to a real claim daemon endpoint and the live mount
    /// table.
    pub fn from_config(config: PluginConfig, node_id: String) -> Result<Self, PluginError> {
        let backend = ClaimClient::new(&config)?;
        Ok(Self::new(config, backend, SysMounter, node_id))
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[async_trait]
impl<B, M> Identity for ClaimNodePlugin<B, M>
where
    B: VolumeBackend,
    M: Mounter,
{
    async fn get_plugin_info(&self) -> Result<PluginInfo, PluginError> {
        Ok(PluginInfo {
            name: PLUGIN_NAME.to_owned(),
            vendor_version: env!("CARGO_PKG_VERSION").to_owned(),
        })
    }

    async fn probe(&self) -> Result<bool, PluginError> {
        // Healthy while the daemon's volumes root exists and is a directory.
        let healthy = tokio::fs::metadata(&self.config.root_volumes_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        Ok(healthy)
    }

    async fn get_plugin_capabilities(&self) -> Result<Vec<PluginCapability>, PluginError> {
        // No controller service: provisioning and deletion are reachable
        // only through the node publish/unpublish path.
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// NodeService
// ---------------------------------------------------------------------------

#[async_trait]
impl<B, M> NodeService for ClaimNodePlugin<B, M>
where
    B: VolumeBackend,
    M: Mounter,
{
    #[instrument(skip(self, req), fields(volume_id = %req.volume_id, target_path = %req.target_path))]
    async fn publish_volume(&self, req: NodePublishVolumeRequest) -> Result<(), PluginError> {
        // Validation precedes every side effect; first failure wins.
        let Some(capability) = req.volume_capability.as_ref() else {
            return Err(PluginError::InvalidArgument(
                "volume capability missing in request".to_owned(),
            ));
        };
        if req.volume_id.is_empty() {
            return Err(PluginError::InvalidArgument(
                "volume ID missing in request".to_owned(),
            ));
        }
        if req.target_path.is_empty() {
            return Err(PluginError::InvalidArgument(
                "target path missing in request".to_owned(),
            ));
        }
        if !SUPPORTED_ACCESS_MODES.contains(&capability.access_mode) {
            return Err(PluginError::InvalidArgument(format!(
                "unsupported access mode {:?}",
                capability.access_mode
            )));
        }

        let volume_id = req.volume_id.clone();
        let lock = self.volume_lock(&volume_id);
        let guard = lock.lock().await;
        let result = self.publish_locked(&req).await;
        drop(guard);
        drop(lock);
        self.release_lock(&volume_id);
        result
    }

    #[instrument(skip(self))]
    async fn unpublish_volume(
        &self,
        volume_id: &VolumeId,
        target_path: &str,
    ) -> Result<(), PluginError> {
        if volume_id.is_empty() {
            return Err(PluginError::InvalidArgument(
                "volume ID missing in request".to_owned(),
            ));
        }
        if target_path.is_empty() {
            return Err(PluginError::InvalidArgument(
                "target path missing in request".to_owned(),
            ));
        }

        let lock = self.volume_lock(volume_id);
        let guard = lock.lock().await;
        let result = self.unpublish_locked(volume_id, target_path).await;
        drop(guard);
        drop(lock);
        self.release_lock(volume_id);
        result
    }

    async fn stage_volume(&self, req: NodeStageVolumeRequest) -> Result<(), PluginError> {
        // No staging area: all work happens at publish time.  The operation
        // exists to satisfy the platform's mandatory call sequence.
        debug!(volume_id = %req.volume_id, "stage is a no-op");
        Ok(())
    }

    async fn unstage_volume(
        &self,
        volume_id: &VolumeId,
        _staging_target_path: &str,
    ) -> Result<(), PluginError> {
        debug!(%volume_id, "unstage is a no-op");
        Ok(())
    }

    async fn get_info(&self) -> Result<NodeInfo, PluginError> {
        Ok(NodeInfo {
            node_id: self.node_id.clone(),
            max_volumes: MAX_VOLUMES_PER_NODE,
        })
    }
}
