//! Fire-and-forget domain event publishing over NATS.
//!
//! Events are advisory; a missing or failing broker never fails the request.

use serde::Serialize;

use crate::state::AppState;

pub const ORDER_CREATED: &str = "souq.orders.created";
pub const ORDER_STATUS_CHANGED: &str = "souq.orders.status_changed";
pub const NOTIFICATION_SENT: &str = "souq.notifications.sent";

pub async fn publish<T: Serialize>(state: &AppState, subject: &str, payload: &T) {
    let Some(nats) = &state.nats else { return };
    let bytes = match serde_json::to_vec(payload) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%subject, error = %err, "failed to serialize event");
            return;
        }
    };
    if let Err(err) = nats.publish(subject.to_string(), bytes.into()).await {
        tracing::warn!(%subject, error = %err, "failed to publish event");
    }
}
