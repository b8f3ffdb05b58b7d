//! Push-notification forwarding to the configured gateway.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::auth::AdminToken;
use crate::error::{ApiError, ApiResult};
use crate::events;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct NotificationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub delivered: bool,
}

pub async fn send(
    State(state): State<AppState>,
    _admin: AdminToken,
    Json(req): Json<NotificationRequest>,
) -> ApiResult<Json<NotificationResponse>> {
    req.validate()?;
    let Some(gateway) = &state.config.push_gateway_url else {
        return Err(ApiError::Unavailable);
    };

    let mut request = state.http.post(gateway).json(&json!({
        "title": req.title,
        "body": req.body,
        "topic": req.topic.as_deref().unwrap_or("storefront"),
    }));
    if let Some(key) = &state.config.push_gateway_key {
        request = request.bearer_auth(key);
    }
    let response = request.send().await.map_err(|err| {
        tracing::warn!(error = %err, "push gateway unreachable");
        ApiError::Unavailable
    })?;
    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "push gateway rejected notification");
        return Err(ApiError::Unavailable);
    }

    events::publish(
        &state,
        events::NOTIFICATION_SENT,
        &json!({ "title": req.title, "topic": req.topic }),
    )
    .await;

    Ok(Json(NotificationResponse { delivered: true }))
}
