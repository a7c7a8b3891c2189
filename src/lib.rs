//! Approval Relay: Slack interactive approvals for paused Jenkins pipelines.
//!
//! The binary in `main.rs` is a thin shell over this crate; integration tests
//! in `tests/` drive [`api::router`] directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod notification;
pub mod pipeline;
pub mod resolver;

/// Shared application state passed to handlers. Read-only after startup.
pub struct AppState {
    pub config: config::Config,
    pub jenkins: pipeline::JenkinsClient,
    pub slack: notification::SlackNotifier,
}

impl AppState {
    pub fn new(config: config::Config) -> anyhow::Result<Self> {
        Ok(Self {
            jenkins: pipeline::JenkinsClient::new(&config)?,
            slack: notification::SlackNotifier::new(&config)?,
            config,
        })
    }
}
