//! Protocol messages exchanged with the orchestration platform.
//!
//! [`PluginMessage`] is the envelope for every request and response on the
//! transport: the platform sends a *request* variant over a bi-directional
//! stream and the plugin replies with the corresponding *response* variant
//! (or [`PluginMessage::Error`]).

use serde::{Deserialize, Serialize};

use crate::error::PluginError;
use crate::types::{
    NodeInfo, NodePublishVolumeRequest, NodeStageVolumeRequest, PluginCapability, PluginInfo,
    VolumeId,
};

/// Top-level message envelope for the plugin protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PluginMessage {
    // ----- Requests --------------------------------------------------------
    /// Bind-mount a volume at a target path (Node).
    PublishVolume(NodePublishVolumeRequest),
    /// Unmount a target path and release its volume (Node).
    UnpublishVolume {
        volume_id: VolumeId,
        target_path: String,
    },
    /// Stage a volume (Node; a no-op here).
    StageVolume(NodeStageVolumeRequest),
    /// Unstage a volume (Node; a no-op here).
    UnstageVolume {
        volume_id: VolumeId,
        staging_target_path: String,
    },

    /// Health probe (Identity).
    Probe,
    /// Query plugin info (Identity).
    GetPluginInfo,
    /// Query plugin capabilities (Identity).
    GetPluginCapabilities,
    /// Query node info (Node).
    GetNodeInfo,

    // ----- Responses -------------------------------------------------------
    /// Generic success acknowledgement (no payload).
    Ok,
    /// Probe result.
    ProbeResult(bool),
    /// Plugin information.
    PluginInfoResponse(PluginInfo),
    /// Plugin capabilities.
    PluginCapabilitiesResponse(Vec<PluginCapability>),
    /// Node information.
    NodeInfoResponse(NodeInfo),
    /// An error occurred.
    Error(PluginError),
}

impl std::fmt::Display for PluginMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PublishVolume(req) => write!(f, "PublishVolume({})", req.volume_id),
            Self::UnpublishVolume { volume_id, .. } => {
                write!(f, "UnpublishVolume({})", volume_id)
            }
            Self::StageVolume(req) => write!(f, "StageVolume({})", req.volume_id),
            Self::UnstageVolume { volume_id, .. } => write!(f, "UnstageVolume({})", volume_id),
            Self::Probe => f.write_str("Probe"),
            Self::GetPluginInfo => f.write_str("GetPluginInfo"),
            Self::GetPluginCapabilities => f.write_str("GetPluginCapabilities"),
            Self::GetNodeInfo => f.write_str("GetNodeInfo"),
            Self::Ok => f.write_str("Ok"),
            Self::ProbeResult(ok) => write!(f, "ProbeResult({})", ok),
            Self::PluginInfoResponse(info) => write!(f, "PluginInfo(name={})", info.name),
            Self::PluginCapabilitiesResponse(caps) => {
                write!(f, "PluginCapabilities(count={})", caps.len())
            }
            Self::NodeInfoResponse(info) => write!(f, "NodeInfo({})", info.node_id),
            Self::Error(e) => write!(f, "Error({})", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_roundtrip() {
        let msg = PluginMessage::Error(PluginError::InvalidArgument(
            "target path missing in request".into(),
        ));
        let json = serde_json::to_string(&msg).expect("serialize");
        let de: PluginMessage = serde_json::from_str(&json).expect("deserialize");
        assert!(matches!(
            de,
            PluginMessage::Error(PluginError::InvalidArgument(_))
        ));
    }

    #[test]
    fn display_formatting() {
        let msg = PluginMessage::UnpublishVolume {
            volume_id: "vol-1".into(),
            target_path: "/mnt/a".into(),
        };
        assert_eq!(msg.to_string(), "UnpublishVolume(vol-1)");
        assert_eq!(PluginMessage::Ok.to_string(), "Ok");
    }
}
