//! QUIC transport for plugin messages.
//!
//! [`PluginClient`] and [`PluginServer`] carry [`PluginMessage`] values over
//! QUIC bi-directional streams: one request and one response per stream.
//!
//! [`PluginMessage`]: crate::message::PluginMessage

pub mod client;
pub mod server;

pub use client::PluginClient;
pub use server::PluginServer;

/// Upper bound on a serialized message read from a stream.  Lifecycle
/// requests and responses are small; anything past this is a protocol
/// violation, not a large payload.
pub(crate) const MAX_MESSAGE_BYTES: usize = 1024 * 1024;
