//! QUIC client used by the orchestration platform side to issue lifecycle
//! requests.

use std::net::SocketAddr;
use std::sync::Arc;

use quinn::crypto::rustls::QuicClientConfig;
use tracing::{debug, instrument};

use super::MAX_MESSAGE_BYTES;
use crate::error::PluginError;
use crate::message::PluginMessage;

/// Client that sends [`PluginMessage`] requests over a single QUIC
/// connection and returns the plugin's response.
pub struct PluginClient {
    connection: quinn::Connection,
}

impl PluginClient {
    /// Establish a QUIC connection to the plugin server at `addr`.
    ///
    /// * `addr` — socket address of the plugin server
    /// * `server_name` — TLS SNI name matching a SAN in the server's
    ///   certificate
    /// * `tls_config` — client TLS configuration
    pub async fn connect(
        addr: SocketAddr,
        server_name: &str,
        tls_config: rustls::ClientConfig,
    ) -> Result<Self, PluginError> {
        let quic_client_config = QuicClientConfig::try_from(tls_config)
            .map_err(|e| PluginError::Transport(format!("invalid TLS config: {e}")))?;
        let client_config = quinn::ClientConfig::new(Arc::new(quic_client_config));

        let mut endpoint = quinn::Endpoint::client("0.0.0.0:0".parse().unwrap())
            .map_err(PluginError::transport)?;
        endpoint.set_default_client_config(client_config);

        let connection = endpoint
            .connect(addr, server_name)
            .map_err(PluginError::transport)?
            .await
            .map_err(PluginError::transport)?;

        debug!(%addr, %server_name, "plugin connection established");
        Ok(Self { connection })
    }

    /// Send a request and wait for the corresponding response.
    ///
    /// Each call opens a fresh bi-directional stream, writes the serialized
    /// request, finishes the send side, then reads and decodes the full
    /// response.
    #[instrument(skip(self), fields(msg = %msg))]
    pub async fn request(&self, msg: &PluginMessage) -> Result<PluginMessage, PluginError> {
        let (mut send, mut recv) = self
            .connection
            .open_bi()
            .await
            .map_err(PluginError::transport)?;

        let payload = serde_json::to_vec(msg).map_err(PluginError::internal)?;
        send.write_all(&payload)
            .await
            .map_err(PluginError::transport)?;
        send.finish().map_err(PluginError::transport)?;

        let buf = recv
            .read_to_end(MAX_MESSAGE_BYTES)
            .await
            .map_err(PluginError::transport)?;

        let response: PluginMessage =
            serde_json::from_slice(&buf).map_err(PluginError::transport)?;
        debug!(%response, "plugin response received");
        Ok(response)
    }

    /// Close the underlying QUIC connection gracefully.
    pub fn close(&self) {
        self.connection
            .close(quinn::VarInt::from_u32(0), b"client shutdown");
    }
}
