//! HTTP client for the Jenkins pipeline REST API.
//! Every call uses basic auth; state-changing calls also carry the crumb.
//! No retries: a failed call fails the invocation.

use anyhow::Context;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::{Config, JenkinsCredentials};
use crate::errors::AppError;
use crate::models::pipeline::{Crumb, CrumbResponse, PendingInput, PendingInputAction, WorkflowRun};

#[derive(Clone)]
pub struct JenkinsClient {
    client: Client,
}

impl JenkinsClient {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .user_agent(concat!("approval-relay/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = cfg.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build Jenkins HTTP client")?;
        Ok(Self { client })
    }

    /// Bind credentials for one resolver invocation.
    pub fn session<'a>(&'a self, credentials: &'a JenkinsCredentials) -> JenkinsSession<'a> {
        JenkinsSession {
            client: &self.client,
            credentials,
        }
    }
}

pub struct JenkinsSession<'a> {
    client: &'a Client,
    credentials: &'a JenkinsCredentials,
}

impl<'a> JenkinsSession<'a> {
    fn get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
    }

    fn post(&self, url: &str, crumb: &Crumb) -> RequestBuilder {
        self.client
            .post(url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .header(crumb.header.as_str(), crumb.value.as_str())
    }

    /// `GET {pipelineUrl}crumbIssuer/api/json`
    pub async fn fetch_crumb(&self, pipeline_url: &str) -> Result<Crumb, AppError> {
        info!(url = %pipeline_url, "Getting Jenkins crumb");
        let resp = self
            .get(&format!("{}crumbIssuer/api/json", pipeline_url))
            .send()
            .await?;
        let crumb: CrumbResponse = json_body(resp, "crumb issuer").await?;
        Ok(crumb.into())
    }

    /// `GET {buildUrl}wfapi`
    pub async fn build_status(&self, build_url: &str, crumb: &Crumb) -> Result<WorkflowRun, AppError> {
        info!(url = %build_url, "Getting build status");
        let resp = self
            .get(&format!("{}wfapi", build_url))
            .header(crumb.header.as_str(), crumb.value.as_str())
            .send()
            .await?;
        json_body(resp, "workflow status").await
    }

    /// `POST {buildUrl}wfapi/pendingInputActions`, first entry.
    pub async fn pending_input(&self, build_url: &str, crumb: &Crumb) -> Result<PendingInput, AppError> {
        info!(url = %build_url, "Getting pending input");
        let resp = self
            .post(&format!("{}wfapi/pendingInputActions", build_url), crumb)
            .send()
            .await?;
        let actions: Vec<PendingInputAction> = json_body(resp, "pending input actions").await?;
        let action = actions
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream("build has no pending input actions".into()))?;
        debug!(
            input_id = %action.id,
            prompt = action.message.as_deref().unwrap_or(""),
            "Found pending input"
        );
        Ok(PendingInput::new(build_url, &action.id))
    }

    /// Submit the input with an empty parameter list. Returns whether Jenkins
    /// accepted it.
    pub async fn proceed(&self, pending: &PendingInput, crumb: &Crumb) -> bool {
        info!("Approving build");
        let parameters = serde_json::json!({ "parameter": [] }).to_string();
        let result = self
            .post(&pending.proceed_url, crumb)
            .form(&[("Proceed", "proceed"), ("json", parameters.as_str())])
            .send()
            .await;
        accepted(result, "proceed")
    }

    /// Abort the input. Returns whether Jenkins accepted it.
    pub async fn abort(&self, pending: &PendingInput, crumb: &Crumb) -> bool {
        info!("Rejecting build");
        let result = self.post(&pending.abort_url, crumb).send().await;
        accepted(result, "abort")
    }
}

async fn json_body<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, AppError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!(
            "{} returned error: status={}, body={}",
            what, status, body
        )));
    }
    resp.json()
        .await
        .map_err(|e| AppError::Upstream(format!("{} returned malformed JSON: {}", what, e)))
}

fn accepted(result: reqwest::Result<Response>, what: &str) -> bool {
    match result {
        Ok(resp) if resp.status().is_success() => true,
        Ok(resp) => {
            warn!(status = %resp.status(), "Jenkins rejected {} request", what);
            false
        }
        Err(e) => {
            warn!(error = %e, "Jenkins {} request failed", what);
            false
        }
    }
}
