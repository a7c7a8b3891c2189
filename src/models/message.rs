//! Outbound Slack messages (legacy attachments with interactive buttons).

use serde::Serialize;

use crate::errors::AppError;
use crate::models::approval::{ApprovalRequest, ButtonEncoding};
use crate::models::interaction::{InteractionUser, APPROVE_ACTION};

const REQUEST_COLOR: &str = "#3AA3E3";

#[derive(Debug, Clone, Serialize)]
pub struct SlackMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub text: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AttachmentAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mrkdwn_in: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl Attachment {
    fn status(text: String, color: &str) -> Self {
        Self {
            text,
            color: color.to_string(),
            attachment_type: None,
            callback_id: None,
            actions: Vec::new(),
            mrkdwn_in: Vec::new(),
            ts: Some(chrono::Utc::now().timestamp()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentAction {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub value: String,
    pub style: ButtonStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

fn button(text: &str, value: String, style: ButtonStyle) -> AttachmentAction {
    AttachmentAction {
        name: APPROVE_ACTION.to_string(),
        text: text.to_string(),
        action_type: "button".to_string(),
        value,
        style,
    }
}

/// The interactive "requests deployment" message with Proceed/Abort buttons.
pub fn approval_request(
    build_url: &str,
    pipeline_url: &str,
    build_version: &str,
    encoding: ButtonEncoding,
) -> Result<SlackMessage, AppError> {
    let proceed = ApprovalRequest::new(true, build_url, pipeline_url, build_version).encode(encoding)?;
    let abort = ApprovalRequest::new(false, build_url, pipeline_url, build_version).encode(encoding)?;

    Ok(SlackMessage {
        text: Some(format!("Build {} requests deployment", build_version)),
        attachments: vec![Attachment {
            text: "Proceed with deployment?".to_string(),
            color: REQUEST_COLOR.to_string(),
            attachment_type: Some("default".to_string()),
            callback_id: Some(APPROVE_ACTION.to_string()),
            actions: vec![
                button("Proceed", proceed, ButtonStyle::Primary),
                button("Abort", abort, ButtonStyle::Danger),
            ],
            mrkdwn_in: Vec::new(),
            ts: None,
        }],
    })
}

/// Outcome of a submitted decision.
pub fn decision(build_version: &str, approved: bool, user: &InteractionUser) -> SlackMessage {
    let text = format!(
        "Version {} deployment *{}* by <@{}|{}>",
        build_version,
        if approved { "approved" } else { "declined" },
        user.id,
        user.display_name()
    );
    let mut attachment = Attachment::status(text, if approved { "good" } else { "danger" });
    attachment.mrkdwn_in = vec!["text".to_string()];
    SlackMessage {
        text: None,
        attachments: vec![attachment],
    }
}

pub fn not_waiting(build_version: &str) -> SlackMessage {
    SlackMessage {
        text: None,
        attachments: vec![Attachment::status(
            format!("Build {} is not waiting for input", build_version),
            "warning",
        )],
    }
}
