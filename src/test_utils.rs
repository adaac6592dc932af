//! In-memory transport for exercising the dispatcher without a network.

use crate::core::{DispatchRequest, DispatchTransport};
use crate::error::DispatchError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every request and answers success, except for configured ids.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<DispatchRequest>>>,
    failing_ids: HashSet<i64>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers with a 500 for the record with this id.
    pub fn fail_for(mut self, id: i64) -> Self {
        self.failing_ids.insert(id);
        self
    }

    /// Holds every response for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests seen so far, in the order their sends started.
    pub fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DispatchTransport for RecordingTransport {
    async fn send(&self, request: DispatchRequest) -> Result<(), DispatchError> {
        let id = request.event.client_payload.id;
        self.requests.lock().unwrap().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_ids.contains(&id) {
            return Err(DispatchError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: format!("simulated failure for {id}"),
            });
        }
        Ok(())
    }
}
