//! QUIC server that accepts lifecycle requests from the orchestration
//! platform and dispatches them to the plugin's trait implementations.

use std::net::SocketAddr;
use std::sync::Arc;

use quinn::crypto::rustls::QuicServerConfig;
use tracing::{debug, error, info, instrument, warn};

use super::MAX_MESSAGE_BYTES;
use crate::error::PluginError;
use crate::identity::Identity;
use crate::message::PluginMessage;
use crate::node::NodeService;

/// Server that accepts QUIC connections and dispatches [`PluginMessage`]
/// requests to an [`Identity`] + [`NodeService`] implementation.
pub struct PluginServer<T> {
    endpoint: quinn::Endpoint,
    handler: Arc<T>,
}

impl<T> PluginServer<T>
where
    T: Identity + NodeService + 'static,
{
    /// Create a new server bound to `addr`.
    pub fn new(
        addr: SocketAddr,
        tls_config: rustls::ServerConfig,
        handler: Arc<T>,
    ) -> Result<Self, PluginError> {
        let quic_server_config = QuicServerConfig::try_from(tls_config)
            .map_err(|e| PluginError::Transport(format!("invalid TLS config: {e}")))?;
        let server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_server_config));
        let endpoint =
            quinn::Endpoint::server(server_config, addr).map_err(PluginError::transport)?;
        info!(%addr, "plugin server listening");
        Ok(Self { endpoint, handler })
    }

    /// Accept connections in a loop until the endpoint is closed.
    ///
    /// Each accepted connection runs in its own Tokio task, and each
    /// bi-stream within a connection is handled concurrently.
    pub async fn serve(&self) -> Result<(), PluginError> {
        while let Some(incoming) = self.endpoint.accept().await {
            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                match incoming.await {
                    Ok(conn) => {
                        let remote = conn.remote_address();
                        debug!(%remote, "connection accepted");
                        if let Err(e) = Self::handle_connection(conn, handler).await {
                            warn!(%remote, error = %e, "connection error");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "incoming connection failed");
                    }
                }
            });
        }
        Ok(())
    }

    /// Handle all bi-streams on a single connection.
    async fn handle_connection(conn: quinn::Connection, handler: Arc<T>) -> Result<(), PluginError> {
        loop {
            let (send, recv) = match conn.accept_bi().await {
                Ok(stream) => stream,
                Err(quinn::ConnectionError::ApplicationClosed(_)) => return Ok(()),
                Err(e) => return Err(PluginError::transport(e)),
            };

            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                if let Err(e) = Self::handle_stream(send, recv, &handler).await {
                    error!(error = %e, "stream handler error");
                }
            });
        }
    }

    /// Process a single bi-stream: read request → dispatch → write response.
    #[instrument(skip_all)]
    async fn handle_stream(
        mut send: quinn::SendStream,
        mut recv: quinn::RecvStream,
        handler: &T,
    ) -> Result<(), PluginError> {
        let buf = recv
            .read_to_end(MAX_MESSAGE_BYTES)
            .await
            .map_err(PluginError::transport)?;

        let request: PluginMessage = serde_json::from_slice(&buf)
            .map_err(|e| PluginError::Transport(format!("malformed request: {e}")))?;

        debug!(%request, "request received");

        let response = Self::dispatch(handler, request).await;

        let payload = serde_json::to_vec(&response).map_err(PluginError::internal)?;
        send.write_all(&payload)
            .await
            .map_err(PluginError::transport)?;
        send.finish().map_err(PluginError::transport)?;
        Ok(())
    }

    /// Map a request to the matching trait method and wrap the result in a
    /// response variant.
    async fn dispatch(handler: &T, request: PluginMessage) -> PluginMessage {
        match request {
            // --- Node -------------------------------------------------------
            PluginMessage::PublishVolume(req) => match handler.publish_volume(req).await {
                Ok(()) => PluginMessage::Ok,
                Err(e) => PluginMessage::Error(e),
            },
            PluginMessage::UnpublishVolume {
                volume_id,
                target_path,
            } => match handler.unpublish_volume(&volume_id, &target_path).await {
                Ok(()) => PluginMessage::Ok,
                Err(e) => PluginMessage::Error(e),
            },
            PluginMessage::StageVolume(req) => match handler.stage_volume(req).await {
                Ok(()) => PluginMessage::Ok,
                Err(e) => PluginMessage::Error(e),
            },
            PluginMessage::UnstageVolume {
                volume_id,
                staging_target_path,
            } => match handler
                .unstage_volume(&volume_id, &staging_target_path)
                .await
            {
                Ok(()) => PluginMessage::Ok,
                Err(e) => PluginMessage::Error(e),
            },
            PluginMessage::GetNodeInfo => match handler.get_info().await {
                Ok(info) => PluginMessage::NodeInfoResponse(info),
                Err(e) => PluginMessage::Error(e),
            },

            // --- Identity ---------------------------------------------------
            PluginMessage::Probe => match handler.probe().await {
                Ok(ok) => PluginMessage::ProbeResult(ok),
                Err(e) => PluginMessage::Error(e),
            },
            PluginMessage::GetPluginInfo => match handler.get_plugin_info().await {
                Ok(info) => PluginMessage::PluginInfoResponse(info),
                Err(e) => PluginMessage::Error(e),
            },
            PluginMessage::GetPluginCapabilities => match handler.get_plugin_capabilities().await {
                Ok(caps) => PluginMessage::PluginCapabilitiesResponse(caps),
                Err(e) => PluginMessage::Error(e),
            },

            // --- Response variants never arrive as requests -----------------
            other => {
                warn!(msg = %other, "unexpected message variant received as request");
                PluginMessage::Error(PluginError::InvalidArgument(format!(
                    "unexpected message: {other}"
                )))
            }
        }
    }

    /// The underlying QUIC endpoint, useful for obtaining the local address
    /// or shutting down.
    pub fn endpoint(&self) -> &quinn::Endpoint {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::error::ErrorCode;
    use crate::types::{
        NodeInfo, NodePublishVolumeRequest, NodeStageVolumeRequest, PluginCapability, PluginInfo,
        VolumeCapability, VolumeId,
    };

    /// Minimal handler: validates like the real plugin, succeeds otherwise.
    struct StubPlugin;

    #[async_trait]
    impl Identity for StubPlugin {
        async fn get_plugin_info(&self) -> Result<PluginInfo, PluginError> {
            Ok(PluginInfo {
                name: "stub".into(),
                vendor_version: "0.0.0".into(),
            })
        }

        async fn probe(&self) -> Result<bool, PluginError> {
            Ok(true)
        }

        async fn get_plugin_capabilities(&self) -> Result<Vec<PluginCapability>, PluginError> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl NodeService for StubPlugin {
        async fn publish_volume(&self, req: NodePublishVolumeRequest) -> Result<(), PluginError> {
            if req.volume_id.is_empty() {
                return Err(PluginError::InvalidArgument(
                    "volume ID missing in request".into(),
                ));
            }
            Ok(())
        }

        async fn unpublish_volume(
            &self,
            _volume_id: &VolumeId,
            _target_path: &str,
        ) -> Result<(), PluginError> {
            Ok(())
        }

        async fn stage_volume(&self, _req: NodeStageVolumeRequest) -> Result<(), PluginError> {
            Ok(())
        }

        async fn unstage_volume(
            &self,
            _volume_id: &VolumeId,
            _staging_target_path: &str,
        ) -> Result<(), PluginError> {
            Ok(())
        }

        async fn get_info(&self) -> Result<NodeInfo, PluginError> {
            Ok(NodeInfo {
                node_id: "stub-node".into(),
                max_volumes: 1,
            })
        }
    }

    fn publish_msg(id: &str) -> PluginMessage {
        PluginMessage::PublishVolume(NodePublishVolumeRequest {
            volume_id: id.into(),
            target_path: "/mnt/a".into(),
            volume_capability: Some(VolumeCapability::default()),
            read_only: false,
        })
    }

    #[tokio::test]
    async fn dispatch_maps_success_to_ok() {
        let response = PluginServer::dispatch(&StubPlugin, publish_msg("vol-1")).await;
        assert!(matches!(response, PluginMessage::Ok));
    }

    #[tokio::test]
    async fn dispatch_wraps_handler_errors() {
        let response = PluginServer::dispatch(&StubPlugin, publish_msg("")).await;
        let PluginMessage::Error(err) = response else {
            panic!("expected an error envelope");
        };
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn dispatch_rejects_response_variants() {
        let response = PluginServer::dispatch(&StubPlugin, PluginMessage::Ok).await;
        assert!(matches!(
            response,
            PluginMessage::Error(PluginError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn dispatch_identity_surface() {
        let response = PluginServer::dispatch(&StubPlugin, PluginMessage::Probe).await;
        assert!(matches!(response, PluginMessage::ProbeResult(true)));

        let response =
            PluginServer::dispatch(&StubPlugin, PluginMessage::GetPluginCapabilities).await;
        let PluginMessage::PluginCapabilitiesResponse(caps) = response else {
            panic!("expected a capabilities envelope");
        };
        assert!(caps.is_empty());
    }
}
