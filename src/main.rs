use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay::api::notify::{post_approval_request, BuildPaused};
use relay::models::approval::ApprovalRequest;
use relay::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Notify {
            build_url,
            pipeline_url,
            build_version,
        }) => {
            let build = BuildPaused {
                build_url,
                pipeline_url,
                build_version,
            };
            handle_notify(cfg, build).await
        }
        Some(cli::Commands::Decode { value }) => {
            let approval = ApprovalRequest::decode(&value)?;
            println!("{}", serde_json::to_string_pretty(&approval)?);
            Ok(())
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    // Export spans over OTLP only when a collector is configured.
    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "approval-relay"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let json_logs = std::env::var("RELAY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let (json_layer, text_layer) = if json_logs {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "relay=debug,tower_http=debug".into()),
        ))
        .with(json_layer)
        .with(text_layer)
        .with(telemetry_layer)
        .init();

    Ok(())
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    if cfg.slack_token.is_none() {
        if cfg.allow_unauthenticated {
            tracing::warn!("slackToken is not set; interaction callbacks are NOT authenticated");
        } else {
            tracing::warn!("slackToken is not set; interaction callbacks will be refused");
        }
    }
    if cfg.jenkins_user.is_none() || cfg.jenkins_password.is_none() {
        tracing::warn!("jenkinsUser/jenkinsPassword not set; interaction callbacks will fail");
    }
    if cfg.slack_webhook.is_none() {
        tracing::warn!("slackWebhook is not set; build-paused notifications will fail");
    }

    tracing::info!(
        response_mode = ?cfg.response_mode,
        deferred_ack = cfg.deferred_ack,
        error_mode = ?cfg.error_mode,
        button_encoding = ?cfg.button_encoding,
        "Starting approval relay"
    );

    let state = Arc::new(AppState::new(cfg)?);
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Approval relay listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_notify(cfg: config::Config, build: BuildPaused) -> anyhow::Result<()> {
    let state = AppState::new(cfg)?;
    let webhook_url = state.config.slack_webhook()?;
    let delivered =
        post_approval_request(&state.slack, webhook_url, &build, state.config.button_encoding).await?;
    if !delivered {
        anyhow::bail!("Slack rejected the approval request for build {}", build.build_version);
    }
    println!("Approval request posted for build {}", build.build_version);
    Ok(())
}
