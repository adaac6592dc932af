//! Entry point for host notifications.
//!
//! The host calls [`NotificationHandler::handle`] from its publish/unpublish
//! pipeline. The call returns once every send has been spawned and never
//! reports failure back to the host.

use crate::core::Notification;
use crate::dispatch::Dispatcher;
use tracing::debug;

/// Routes content notifications to the dispatcher.
#[derive(Clone)]
pub struct NotificationHandler {
    dispatcher: Dispatcher,
}

impl NotificationHandler {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn handle(&self, notification: Notification) {
        let event = notification.event();
        let records = notification.into_records();
        debug!(event_type = %event, count = records.len(), "Handling content notification");
        self.dispatcher.dispatch(records, event);
    }
}
