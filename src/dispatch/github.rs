//! A transport for the GitHub repository-dispatch endpoint.

use crate::core::{DispatchRequest, DispatchTransport};
use crate::error::DispatchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Sends dispatch requests over one pooled `reqwest::Client`.
///
/// The client is never mutated after construction. Every request carries its
/// own header set, so concurrent sends cannot observe each other's headers.
#[derive(Clone, Debug)]
pub struct GitHubTransport {
    client: Client,
}

impl GitHubTransport {
    /// Creates a transport with an optional per-request timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self, DispatchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DispatchTransport for GitHubTransport {
    #[instrument(skip_all, fields(url = %request.url))]
    async fn send(&self, request: DispatchRequest) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(request.url)
            .headers(request.headers.into_inner())
            .json(&request.event)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Dispatch accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DispatchError::Status { status, body })
    }
}
