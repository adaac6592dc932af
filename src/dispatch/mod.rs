//! Sends one repository-dispatch event per changed content record.
//!
//! [`Dispatcher::dispatch`] never blocks on the network. It resolves the
//! target from the live settings, builds a request per record, and hands each
//! send to a tracked background task that logs the outcome. A failure on one
//! record never affects the others, and nothing is reported back to the caller.

pub mod github;

pub use github::GitHubTransport;

use crate::config::DispatchTarget;
use crate::core::{
    ChangeEvent, ContentEvent, ContentRecord, DispatchHeaders, DispatchRequest, DispatchTransport,
};
use crate::error::DispatchError;
use crate::settings::SharedSettings;
use crate::task_manager::TaskManager;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

/// Media type requested from the dispatch API.
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Builds the header set for one request.
///
/// A fresh map is returned on every call; nothing is shared between requests.
pub fn dispatch_headers(target: &DispatchTarget) -> Result<DispatchHeaders, DispatchError> {
    let user_agent =
        HeaderValue::from_str(&target.user_agent).map_err(|e| DispatchError::InvalidHeader {
            name: "User-Agent",
            reason: e.to_string(),
        })?;
    let mut authorization = HeaderValue::from_str(&format!("token {}", target.token)).map_err(
        |e| DispatchError::InvalidHeader {
            name: "Authorization",
            reason: e.to_string(),
        },
    )?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
    headers.insert(AUTHORIZATION, authorization);
    Ok(headers.into())
}

/// Builds the request for one record.
pub fn build_request(
    target: &DispatchTarget,
    event: ContentEvent,
    record: &ContentRecord,
) -> Result<DispatchRequest, DispatchError> {
    Ok(DispatchRequest {
        url: target.dispatch_url()?,
        headers: dispatch_headers(target)?,
        event: ChangeEvent::new(event, record),
    })
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("dispatches_total", "outcome" => outcome).increment(1);
}

/// Fire-and-forget sender of content change events.
#[derive(Clone)]
pub struct Dispatcher {
    settings: SharedSettings,
    transport: Arc<dyn DispatchTransport>,
    tasks: TaskManager,
}

impl Dispatcher {
    pub fn new(
        settings: SharedSettings,
        transport: Arc<dyn DispatchTransport>,
        tasks: TaskManager,
    ) -> Self {
        Self {
            settings,
            transport,
            tasks,
        }
    }

    /// The tracker holding this dispatcher's in-flight sends.
    pub fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    /// Dispatches `event` for every record, in input order, one request each.
    ///
    /// Returns as soon as every send has been spawned. If owner, repo or token
    /// is blank, logs a single warning and sends nothing.
    #[instrument(skip_all, fields(event_type = %event))]
    pub fn dispatch<I>(&self, records: I, event: ContentEvent)
    where
        I: IntoIterator<Item = ContentRecord>,
    {
        let config = self.settings.load();
        let target = match config.github.target() {
            Ok(target) => target,
            Err(e) => {
                warn!(error = %e, "Missing configuration for Owner/Repo/Token; skipping dispatch");
                record_outcome("skipped");
                return;
            }
        };

        for record in records {
            if let Err(e) = self.dispatch_one(&target, event, record.clone()) {
                error!(
                    event_type = %event,
                    content_name = %record.name,
                    content_id = record.id,
                    error = %e,
                    "Exception while dispatching content event"
                );
                record_outcome("setup_failure");
            }
        }
    }

    /// Builds and spawns one send. Errors here happen before any I/O.
    fn dispatch_one(
        &self,
        target: &DispatchTarget,
        event: ContentEvent,
        record: ContentRecord,
    ) -> Result<(), DispatchError> {
        let request = build_request(target, event, &record)?;
        let transport = self.transport.clone();
        let task_name = format!("dispatch:{}:{}", event, record.id);

        let send = async move {
            match transport.send(request).await {
                Ok(()) => {
                    info!(
                        event_type = %event,
                        content_name = %record.name,
                        content_id = record.id,
                        "Successfully dispatched content event"
                    );
                    record_outcome("success");
                }
                Err(e) => {
                    error!(
                        event_type = %event,
                        content_name = %record.name,
                        content_id = record.id,
                        error = %e,
                        "Failed to dispatch content event"
                    );
                    record_outcome("failure");
                }
            }
        };

        self.tasks
            .spawn(task_name, send.in_current_span())
            .map_err(|e| DispatchError::Setup(e.to_string()))
    }
}
