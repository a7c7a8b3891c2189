//! Pipeline side of the Command Resolver: crumb, status check, pending
//! input, decision.
//!
//! Produces the Slack message describing the outcome; where that message
//! goes is the caller's business.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::approval::ApprovalRequest;
use crate::models::interaction::InteractionUser;
use crate::models::message::{self, SlackMessage};
use crate::pipeline::JenkinsSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The build was not paused on an input step; nothing was submitted.
    NotWaiting { status: String },
    /// A decision was submitted. `accepted` is false when Jenkins refused it.
    Submitted { approved: bool, accepted: bool },
}

pub async fn resolve(
    jenkins: &JenkinsSession<'_>,
    approval: &ApprovalRequest,
) -> Result<Outcome, AppError> {
    let crumb = jenkins.fetch_crumb(&approval.pipeline_url).await?;

    let run = jenkins.build_status(&approval.build_url, &crumb).await?;
    if !run.is_waiting_for_input() {
        info!(
            status = %run.status,
            run = run.name.as_deref().unwrap_or("-"),
            "Build is not waiting for input"
        );
        return Ok(Outcome::NotWaiting { status: run.status });
    }

    let pending = jenkins.pending_input(&approval.build_url, &crumb).await?;

    // best-effort: a refused decision is logged, the outcome is still reported
    let accepted = if approval.approved {
        jenkins.proceed(&pending, &crumb).await
    } else {
        jenkins.abort(&pending, &crumb).await
    };
    if !accepted {
        warn!(
            build_version = %approval.build_version,
            approved = approval.approved,
            "decision was not accepted by Jenkins"
        );
    }

    Ok(Outcome::Submitted {
        approved: approval.approved,
        accepted,
    })
}

/// The message reported back to the channel for an outcome.
pub fn report(outcome: &Outcome, approval: &ApprovalRequest, user: &InteractionUser) -> SlackMessage {
    match outcome {
        Outcome::NotWaiting { .. } => message::not_waiting(&approval.build_version),
        Outcome::Submitted { approved, .. } => message::decision(&approval.build_version, *approved, user),
    }
}
