//! Command Resolver: Slack button click → Jenkins input decision.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use crate::config::{ErrorMode, JenkinsCredentials, ResponseMode};
use crate::errors::AppError;
use crate::models::approval::ApprovalRequest;
use crate::models::interaction::{InteractionPayload, InteractionUser};
use crate::resolver;
use crate::AppState;

/// POST /slack/interactions
pub async fn handle_interaction(State(state): State<Arc<AppState>>, body: String) -> Response {
    match process(&state, &body).await {
        Ok(resp) => resp,
        Err(e) => match state.config.error_mode {
            ErrorMode::Report => e.into_response(),
            ErrorMode::Mask => {
                error!(error = %e, "interaction failed");
                StatusCode::OK.into_response()
            }
        },
    }
}

async fn process(state: &Arc<AppState>, body: &str) -> Result<Response, AppError> {
    let credentials = state.config.jenkins_credentials()?;
    let expected_token = state.config.interaction_token()?;

    let payload = InteractionPayload::from_form(body)?;

    if let Some(expected) = expected_token {
        verify_token(payload.token.as_deref(), expected)?;
    }

    let approval = payload.approval()?;
    info!(
        user = %payload.user.display_name(),
        callback_id = payload.callback_id.as_deref().unwrap_or("-"),
        build_version = %approval.build_version,
        approved = approval.approved,
        "Received command request"
    );

    match state.config.response_mode {
        ResponseMode::Inline => {
            let session = state.jenkins.session(&credentials);
            let outcome = resolver::resolve(&session, &approval).await?;
            let msg = resolver::report(&outcome, &approval, &payload.user);
            Ok(Json(msg).into_response())
        }
        ResponseMode::ResponseUrl => {
            let response_url = payload
                .response_url
                .clone()
                .ok_or_else(|| AppError::Validation("response_url not found in request".into()))?;

            if state.config.deferred_ack {
                info!("Acknowledging interaction, resolving in background");
                let state = state.clone();
                let user = payload.user;
                tokio::spawn(async move {
                    let version = approval.build_version.clone();
                    if let Err(e) =
                        resolve_and_report(&state, &credentials, &approval, &user, &response_url).await
                    {
                        error!(build_version = %version, error = %e, "deferred interaction failed");
                    }
                });
                return Ok(StatusCode::OK.into_response());
            }

            resolve_and_report(state, &credentials, &approval, &payload.user, &response_url).await?;
            Ok(StatusCode::OK.into_response())
        }
    }
}

async fn resolve_and_report(
    state: &AppState,
    credentials: &JenkinsCredentials,
    approval: &ApprovalRequest,
    user: &InteractionUser,
    response_url: &str,
) -> Result<(), AppError> {
    let session = state.jenkins.session(credentials);
    let outcome = resolver::resolve(&session, approval).await?;
    let msg = resolver::report(&outcome, approval, user);

    match state.slack.send(response_url, &msg).await {
        Ok(true) => {}
        Ok(false) => warn!("Slack did not accept the outcome message"),
        Err(e) => warn!(error = %e, "Error posting response to Slack"),
    }
    Ok(())
}

/// Shared-secret check. Constant-time so the comparison leaks nothing about
/// how much of the token matched.
fn verify_token(provided: Option<&str>, expected: &str) -> Result<(), AppError> {
    match provided {
        Some(t) if bool::from(t.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
        Some(_) => {
            warn!("interaction rejected: token mismatch");
            Err(AppError::Unauthorized)
        }
        None => {
            warn!("interaction rejected: missing token");
            Err(AppError::Unauthorized)
        }
    }
}
