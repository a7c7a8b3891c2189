//! Inbound Notifier: a pipeline paused for input → interactive Slack message.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::AppError;
use crate::models::approval::ButtonEncoding;
use crate::models::message;
use crate::notification::SlackNotifier;
use crate::AppState;

/// Body of the build-paused webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPaused {
    pub build_url: String,
    pub pipeline_url: String,
    pub build_version: String,
}

impl BuildPaused {
    /// Pull the three required strings out of a JSON object, naming the first
    /// one missing. `jenkinsUrl` is accepted for `pipelineUrl`.
    pub fn from_json(body: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|_| AppError::Validation("request body must be a JSON object".into()))?;
        let obj = value
            .as_object()
            .ok_or_else(|| AppError::Validation("request body must be a JSON object".into()))?;

        let build_url = required(obj, "buildUrl", None)?;
        let pipeline_url = required(obj, "pipelineUrl", Some("jenkinsUrl"))?;
        let build_version = required(obj, "buildVersion", None)?;

        Ok(Self {
            build_url,
            pipeline_url,
            build_version,
        })
    }
}

fn required(
    obj: &Map<String, Value>,
    field: &'static str,
    alias: Option<&str>,
) -> Result<String, AppError> {
    obj.get(field)
        .or_else(|| alias.and_then(|a| obj.get(a)))
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(AppError::MissingField(field))
}

/// Build the approval message and post it to the channel webhook. Returns
/// whether Slack accepted it.
pub async fn post_approval_request(
    slack: &SlackNotifier,
    webhook_url: &str,
    build: &BuildPaused,
    encoding: ButtonEncoding,
) -> Result<bool, AppError> {
    let msg = message::approval_request(
        &build.build_url,
        &build.pipeline_url,
        &build.build_version,
        encoding,
    )?;
    slack.send(webhook_url, &msg).await
}

/// POST /hooks/build-paused
pub async fn build_paused(State(state): State<Arc<AppState>>, body: String) -> Response {
    match notify(&state, &body).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e @ (AppError::MissingField(_) | AppError::Validation(_))) => {
            tracing::warn!(error = %e, "rejected build-paused notification");
            let msg = match &e {
                AppError::Validation(m) => m.clone(),
                other => other.to_string(),
            };
            (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn notify(state: &AppState, body: &str) -> Result<(), AppError> {
    let build = BuildPaused::from_json(body)?;
    let webhook_url = state.config.slack_webhook()?;

    tracing::info!(build_version = %build.build_version, "Received request for build version");

    post_approval_request(&state.slack, webhook_url, &build, state.config.button_encoding).await?;
    Ok(())
}
