use clap::{Parser, Subcommand};

/// Approval Relay: Slack interactive approvals for paused Jenkins pipelines
#[derive(Parser)]
#[command(name = "approval-relay", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Serve {
        /// Port to bind (overrides RELAY_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Post an approval request for a paused build to the Slack webhook
    Notify {
        #[arg(long)]
        build_url: String,
        /// Jenkins root URL
        #[arg(long, alias = "jenkins-url")]
        pipeline_url: String,
        #[arg(long)]
        build_version: String,
    },

    /// Decode a button value and print it as JSON
    Decode { value: String },
}
