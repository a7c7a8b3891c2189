//! Jenkins pipeline REST shapes.

use serde::Deserialize;

/// Header Jenkins expects the crumb in unless the issuer names another.
pub const DEFAULT_CRUMB_HEADER: &str = "Jenkins-Crumb";

/// `wfapi` status of a run paused on an `input` step.
pub const PAUSED_PENDING_INPUT: &str = "PAUSED_PENDING_INPUT";

/// `GET {pipelineUrl}crumbIssuer/api/json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrumbResponse {
    pub crumb: String,
    #[serde(default)]
    pub crumb_request_field: Option<String>,
}

/// A crumb plus the header it is sent under.
#[derive(Clone)]
pub struct Crumb {
    pub header: String,
    pub value: String,
}

impl From<CrumbResponse> for Crumb {
    fn from(r: CrumbResponse) -> Self {
        Self {
            header: r
                .crumb_request_field
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_CRUMB_HEADER.to_string()),
            value: r.crumb,
        }
    }
}

impl std::fmt::Debug for Crumb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crumb")
            .field("header", &self.header)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// `GET {buildUrl}wfapi`
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl WorkflowRun {
    pub fn is_waiting_for_input(&self) -> bool {
        self.status == PAUSED_PENDING_INPUT
    }
}

/// One element of `POST {buildUrl}wfapi/pendingInputActions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingInputAction {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Where to submit a decision for one paused input step. Lives for a single
/// resolver invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInput {
    pub proceed_url: String,
    pub abort_url: String,
}

impl PendingInput {
    pub fn new(build_url: &str, input_id: &str) -> Self {
        Self {
            proceed_url: format!("{}wfapi/inputSubmit?inputId={}", build_url, input_id),
            abort_url: format!("{}input/{}/abort", build_url, input_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_input_urls() {
        let pending = PendingInput::new("http://j/job/deploy/12/", "Approve-deploy");
        assert_eq!(
            pending.proceed_url,
            "http://j/job/deploy/12/wfapi/inputSubmit?inputId=Approve-deploy"
        );
        assert_eq!(pending.abort_url, "http://j/job/deploy/12/input/Approve-deploy/abort");
    }

    #[test]
    fn test_crumb_header_defaults() {
        let crumb: Crumb = serde_json::from_str::<CrumbResponse>(r#"{"crumb":"abc123"}"#)
            .unwrap()
            .into();
        assert_eq!(crumb.header, "Jenkins-Crumb");
        assert_eq!(crumb.value, "abc123");

        let crumb: Crumb = serde_json::from_str::<CrumbResponse>(
            r#"{"_class":"hudson.security.csrf.DefaultCrumbIssuer","crumb":"x","crumbRequestField":"X-Crumb"}"#,
        )
        .unwrap()
        .into();
        assert_eq!(crumb.header, "X-Crumb");
    }

    #[test]
    fn test_workflow_status() {
        let run: WorkflowRun =
            serde_json::from_str(r##"{"id":"12","name":"#12","status":"PAUSED_PENDING_INPUT"}"##).unwrap();
        assert!(run.is_waiting_for_input());
        let run: WorkflowRun = serde_json::from_str(r#"{"status":"IN_PROGRESS"}"#).unwrap();
        assert!(!run.is_waiting_for_input());
    }

    #[test]
    fn test_crumb_debug_hides_value() {
        let crumb = Crumb {
            header: DEFAULT_CRUMB_HEADER.into(),
            value: "abc123".into(),
        };
        assert!(!format!("{:?}", crumb).contains("abc123"));
    }
}
