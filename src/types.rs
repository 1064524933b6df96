//! Core plugin types: volume identity, capabilities, requests, and plugin
//! metadata.
//!
//! These types form the data model shared by the service traits, the
//! transport layer, and the claim daemon client.  They are all
//! [`Serialize`]/[`Deserialize`] so they can be transmitted as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Volume identity
// ---------------------------------------------------------------------------

/// Opaque, caller-supplied identifier for a volume.
///
/// The id is the key for every backend operation; the plugin never mints
/// its own ids and never persists them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VolumeId(pub String);

impl VolumeId {
    /// True when the id carries no characters at all.  An empty id is a
    /// validation failure for every mutating operation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VolumeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VolumeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Access mode & capabilities
// ---------------------------------------------------------------------------

/// Describes how a volume may be accessed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-write on a single node.  The only mode this plugin accepts.
    SingleNodeWriter,
    /// Read-only from many nodes.  Rejected at validation.
    MultiNodeReaderOnly,
    /// Read-write from many nodes.  Rejected at validation.
    MultiNodeMultiWriter,
}

/// Access modes this plugin accepts and advertises.
pub const SUPPORTED_ACCESS_MODES: &[AccessMode] = &[AccessMode::SingleNodeWriter];

/// Describes the capability requested for a volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeCapability {
    /// Requested access mode.
    pub access_mode: AccessMode,
}

impl Default for VolumeCapability {
    fn default() -> Self {
        Self {
            access_mode: AccessMode::SingleNodeWriter,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request to publish (bind-mount) a volume at a target path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePublishVolumeRequest {
    /// Volume to publish.
    pub volume_id: VolumeId,
    /// Absolute path where the volume must become visible.
    pub target_path: String,
    /// Requested capability.  Absence is a validation failure, so the field
    /// is optional at the wire level rather than defaulted away.
    #[serde(default)]
    pub volume_capability: Option<VolumeCapability>,
    /// Whether the bind mount should be read-only.
    #[serde(default)]
    pub read_only: bool,
}

/// Request to stage a volume on this node.
///
/// Staging is a protocol-mandated no-op here; the request shape exists to
/// satisfy the platform's call sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStageVolumeRequest {
    /// Volume to stage.
    pub volume_id: VolumeId,
    /// Global staging path.  Ignored: all work happens at publish time.
    pub staging_target_path: String,
}

// ---------------------------------------------------------------------------
// Plugin & node info
// ---------------------------------------------------------------------------

/// Information about the plugin, consumed during platform registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Plugin name, e.g. `"claimd.csi"`.
    pub name: String,
    /// Vendor-provided version string.
    pub vendor_version: String,
}

/// Capabilities a plugin may advertise.
///
/// This plugin advertises none of them: volume provisioning and deletion are
/// reachable only through the node publish/unpublish path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PluginCapability {
    /// Plugin provides a centralized controller service.
    ControllerService,
}

/// Information about the node on which the plugin runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Unique node identifier.
    pub node_id: String,
    /// Maximum number of volumes the node can host.
    pub max_volumes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_id_display() {
        let id = VolumeId("vol-abc".into());
        assert_eq!(id.to_string(), "vol-abc");
        assert!(!id.is_empty());
        assert!(VolumeId("".into()).is_empty());
    }

    #[test]
    fn publish_request_capability_absence_is_representable() {
        // A request that never mentions a capability must deserialize with
        // `volume_capability == None` so validation can reject it, rather
        // than being silently defaulted.
        let json = r#"{"volume_id":"vol-1","target_path":"/mnt/a"}"#;
        let req: NodePublishVolumeRequest = serde_json::from_str(json).expect("deserialize");
        assert!(req.volume_capability.is_none());
        assert!(!req.read_only);
    }

    #[test]
    fn supported_modes_are_single_node_writer_only() {
        assert_eq!(SUPPORTED_ACCESS_MODES, &[AccessMode::SingleNodeWriter]);
        assert!(!SUPPORTED_ACCESS_MODES.contains(&AccessMode::MultiNodeMultiWriter));
    }
}
