//! Image upload proxy: base64 in, hosted URL out.
//!
//! When the image host is unreachable (or not configured) the response
//! carries the image back as a data URL with `degraded: true` instead of
//! pretending the upload succeeded.

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::AdminToken;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize, Validate)]
pub struct UploadRequest {
    /// Raw base64 or a `data:<mime>;base64,...` URL.
    #[validate(length(min = 1))]
    pub image: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub degraded: bool,
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminToken,
    Json(req): Json<UploadRequest>,
) -> ApiResult<Json<UploadResponse>> {
    req.validate()?;
    let encoded = req
        .image
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(&req.image)
        .trim();
    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| ApiError::BadRequest("image is not valid base64".into()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("image payload is empty".into()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::BadRequest("image exceeds the 5 MiB limit".into()));
    }

    if let Some(host) = &state.config.image_host_url {
        match forward(&state, host, encoded, req.name.as_deref()).await {
            Ok(url) => return Ok(Json(UploadResponse { url, degraded: false })),
            Err(err) => {
                tracing::warn!(error = %err, "image host upload failed, serving data url");
            }
        }
    }

    let url = if req.image.starts_with("data:") {
        req.image.clone()
    } else {
        format!("data:image/png;base64,{encoded}")
    };
    Ok(Json(UploadResponse { url, degraded: true }))
}

async fn forward(
    state: &AppState,
    host: &str,
    encoded: &str,
    name: Option<&str>,
) -> anyhow::Result<String> {
    let mut form = vec![("image", encoded.to_string())];
    if let Some(key) = &state.config.image_host_key {
        form.push(("key", key.clone()));
    }
    if let Some(name) = name {
        form.push(("name", name.to_string()));
    }
    let response = state
        .http
        .post(host)
        .form(&form)
        .send()
        .await?
        .error_for_status()?;
    let body: serde_json::Value = response.json().await?;
    // imgbb-style `{data:{url}}` or a flat `{url}`.
    body.pointer("/data/url")
        .or_else(|| body.get("url"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("image host response had no url"))
}
