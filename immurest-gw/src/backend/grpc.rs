//! tonic client for the backend `ImmuService`.

use immurest_core::{KeyValue, Root, SafeSetResult};
use immurest_grpc::proto::{self, SafeSetRequest};
use immurest_grpc::ImmuServiceClient;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use super::SafeSetBackend;
use crate::error::BackendError;

/// Backend reached over gRPC.
///
/// The channel connects lazily, so a backend that is down at startup shows
/// up as `Unavailable` on the first call rather than as a startup failure.
#[derive(Debug, Clone)]
pub struct GrpcBackend {
    client: ImmuServiceClient<Channel>,
}

impl GrpcBackend {
    pub fn connect_lazy(url: &str, timeout: Duration) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(url.to_string())?
            .connect_timeout(timeout)
            .timeout(timeout)
            .connect_lazy();
        Ok(Self::from_channel(channel))
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self {
            client: ImmuServiceClient::new(channel),
        }
    }
}

#[tonic::async_trait]
impl SafeSetBackend for GrpcBackend {
    async fn safe_set(&self, kv: &KeyValue, known: &Root) -> Result<SafeSetResult, BackendError> {
        let request = SafeSetRequest {
            kv: Some(kv.into()),
            known_tree_size: known.tree_size,
        };

        let response = self.client.clone().safe_set(request).await?.into_inner();
        debug!(
            "SafeSet answered: index={} proof_present={}",
            response.index,
            response.proof.is_some()
        );

        SafeSetResult::try_from(response).map_err(|e| {
            BackendError::new(tonic::Code::DataLoss, format!("malformed proof: {}", e))
        })
    }

    async fn current_root(&self) -> Result<Root, BackendError> {
        let root = self
            .client
            .clone()
            .current_root(proto::Empty {})
            .await?
            .into_inner();

        Root::try_from(root).map_err(|e| {
            BackendError::new(tonic::Code::DataLoss, format!("malformed root: {}", e))
        })
    }
}
