//! Slack interactive-message callback payload.
//!
//! Slack POSTs `application/x-www-form-urlencoded` with a single `payload`
//! field holding the JSON document.

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::approval::ApprovalRequest;

/// Name shared by the Proceed and Abort buttons.
pub const APPROVE_ACTION: &str = "approve";

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionPayload {
    /// Verification token; compared against `slackToken`.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub callback_id: Option<String>,
    pub user: InteractionUser,
    #[serde(default)]
    pub actions: Vec<InteractionAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl InteractionUser {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionAction {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl InteractionPayload {
    /// Parse the raw form body of an interaction callback.
    pub fn from_form(body: &str) -> Result<Self, AppError> {
        let payload = url::form_urlencoded::parse(body.as_bytes())
            .find(|(k, _)| k == "payload")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| AppError::Validation("Request must contain 'payload' field".into()))?;

        serde_json::from_str(&payload)
            .map_err(|e| AppError::Validation(format!("Failed to parse payload: {}", e)))
    }

    /// The clicked `approve` button, decoded.
    pub fn approval(&self) -> Result<ApprovalRequest, AppError> {
        let action = self
            .actions
            .iter()
            .find(|a| a.name == APPROVE_ACTION)
            .ok_or_else(|| AppError::Validation("Request must contain 'approve' action".into()))?;

        let value = action
            .value
            .as_deref()
            .ok_or_else(|| AppError::Validation("'approve' action has no value".into()))?;

        ApprovalRequest::decode(value)
    }
}
