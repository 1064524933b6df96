//! # libclaim — node-local volume plugin for claim-daemon storage
//!
//! `libclaim` implements the node side of a [Container Storage
//! Interface][csi]-style lifecycle protocol.  Volume storage itself is owned
//! by a separate claim daemon reachable over a local HTTP endpoint; this
//! crate acquires storage from it and bind-mounts the result at the path the
//! orchestration platform asks for.  It follows the usual conventions of
//! this stack: Tokio async runtime, `tracing` for observability, `thiserror`
//! for structured errors.
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Data model: `VolumeId`, capabilities, requests, plugin metadata. |
//! | [`error`] | [`PluginError`] enum covering all failure modes. |
//! | [`config`] | [`PluginConfig`] — endpoint, timeouts, daemon directories. |
//! | [`claim`] | [`VolumeBackend`] seam and the HTTP claim daemon client. |
//! | [`mount`] | [`Mounter`] seam and the real mount-table implementation. |
//! | [`identity`] | [`Identity`] trait — plugin discovery & health. |
//! | [`node`] | [`NodeService`] trait — publish, unpublish, stage, unstage. |
//! | [`plugin`] | [`ClaimNodePlugin`] — the lifecycle state machine. |
//! | [`message`] | [`PluginMessage`] protocol envelope. |
//! | [`transport`] | QUIC client/server built on `quinn`. |
//!
//! [csi]: https://github.com/container-storage-interface/spec

pub mod claim;
pub mod config;
pub mod error;
pub mod identity;
pub mod message;
pub mod mount;
pub mod node;
pub mod plugin;
pub mod transport;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use claim::{ClaimClient, VolumeBackend};
pub use config::PluginConfig;
pub use error::{ErrorCode, PluginError};
pub use identity::Identity;
pub use message::PluginMessage;
pub use mount::{MountFlag, MountStatus, Mounter, SysMounter};
pub use node::NodeService;
pub use plugin::ClaimNodePlugin;
pub use transport::{PluginClient, PluginServer};
pub use types::*;
