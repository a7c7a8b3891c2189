use std::fmt;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::approval::ButtonEncoding;

/// Where the resolver puts its outcome message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// POST the message to the interaction's `response_url`.
    ResponseUrl,
    /// Return the message as the HTTP response body.
    Inline,
}

/// What the resolver does with a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Map the error to an HTTP status with a JSON error body.
    Report,
    /// Log it and answer 200 with an empty body.
    Mask,
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub jenkins_user: Option<String>,
    pub jenkins_password: Option<String>,
    /// Shared secret Slack sends in every interaction payload.
    pub slack_token: Option<String>,
    /// Incoming-webhook URL the notifier posts approval requests to.
    pub slack_webhook: Option<String>,
    pub response_mode: ResponseMode,
    /// Acknowledge the interaction immediately and finish the work in a
    /// background task. Only meaningful with `ResponseMode::ResponseUrl`.
    pub deferred_ack: bool,
    pub error_mode: ErrorMode,
    pub button_encoding: ButtonEncoding,
    pub allow_unauthenticated: bool,
    /// Outbound request timeout. `None` waits forever.
    pub http_timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
}

/// Basic-auth credentials for the pipeline server.
#[derive(Clone)]
pub struct JenkinsCredentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for JenkinsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsCredentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("jenkins_user", &self.jenkins_user)
            .field("jenkins_password", &self.jenkins_password.as_ref().map(|_| "[REDACTED]"))
            .field("slack_token", &self.slack_token.as_ref().map(|_| "[REDACTED]"))
            .field("slack_webhook", &self.slack_webhook.as_ref().map(|_| "[REDACTED]"))
            .field("response_mode", &self.response_mode)
            .field("deferred_ack", &self.deferred_ack)
            .field("error_mode", &self.error_mode)
            .field("button_encoding", &self.button_encoding)
            .field("allow_unauthenticated", &self.allow_unauthenticated)
            .field("http_timeout", &self.http_timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl Config {
    /// Credentials for the pipeline server. Missing either half fails the
    /// invocation that asked for them.
    pub fn jenkins_credentials(&self) -> Result<JenkinsCredentials, AppError> {
        let user = self
            .jenkins_user
            .clone()
            .ok_or_else(|| missing_env("jenkinsUser"))?;
        let password = self
            .jenkins_password
            .clone()
            .ok_or_else(|| missing_env("jenkinsPassword"))?;
        Ok(JenkinsCredentials { user, password })
    }

    pub fn slack_webhook(&self) -> Result<&str, AppError> {
        self.slack_webhook
            .as_deref()
            .ok_or_else(|| missing_env("slackWebhook"))
    }

    /// The token interaction payloads must carry.
    ///
    /// Returns `Ok(None)` only when unauthenticated callbacks were explicitly
    /// allowed; an unset token is otherwise a configuration error.
    pub fn interaction_token(&self) -> Result<Option<&str>, AppError> {
        match self.slack_token.as_deref() {
            Some(t) => Ok(Some(t)),
            None if self.allow_unauthenticated => Ok(None),
            None => Err(missing_env("slackToken")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            jenkins_user: None,
            jenkins_password: None,
            slack_token: None,
            slack_webhook: None,
            response_mode: ResponseMode::ResponseUrl,
            deferred_ack: true,
            error_mode: ErrorMode::Report,
            button_encoding: ButtonEncoding::Pipe,
            allow_unauthenticated: false,
            http_timeout: Some(Duration::from_secs(30)),
            accept_invalid_certs: true,
        }
    }
}

fn missing_env(name: &str) -> AppError {
    AppError::Configuration(format!("{} environment variable is not defined", name))
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable lookup. `load` feeds it the
/// process environment.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let response_mode = match var("RELAY_RESPONSE_MODE") {
        Some(v) => parse_enum::<ResponseMode>("RELAY_RESPONSE_MODE", &v)?,
        None => defaults.response_mode,
    };
    let error_mode = match var("RELAY_ERROR_MODE") {
        Some(v) => parse_enum::<ErrorMode>("RELAY_ERROR_MODE", &v)?,
        None => defaults.error_mode,
    };
    let button_encoding = match var("RELAY_BUTTON_ENCODING") {
        Some(v) => parse_enum::<ButtonEncoding>("RELAY_BUTTON_ENCODING", &v)?,
        None => defaults.button_encoding,
    };
    // inline responses can't be deferred: the body is the result
    let deferred_ack = match var("RELAY_DEFERRED_ACK") {
        Some(v) => parse_bool("RELAY_DEFERRED_ACK", &v)?,
        None => response_mode == ResponseMode::ResponseUrl,
    };
    if deferred_ack && response_mode == ResponseMode::Inline {
        anyhow::bail!("RELAY_DEFERRED_ACK cannot be enabled with RELAY_RESPONSE_MODE=inline");
    }

    let http_timeout = match var("RELAY_HTTP_TIMEOUT_SECS") {
        Some(v) => {
            let secs: u64 = v
                .parse()
                .with_context(|| format!("RELAY_HTTP_TIMEOUT_SECS is not a number: {}", v))?;
            (secs > 0).then(|| Duration::from_secs(secs))
        }
        None => defaults.http_timeout,
    };

    Ok(Config {
        port: match var("RELAY_PORT") {
            Some(v) => v
                .parse()
                .with_context(|| format!("RELAY_PORT is not a valid port: {}", v))?,
            None => defaults.port,
        },
        jenkins_user: var("jenkinsUser"),
        jenkins_password: var("jenkinsPassword"),
        slack_token: var("slackToken"),
        slack_webhook: var("slackWebhook"),
        response_mode,
        deferred_ack,
        error_mode,
        button_encoding,
        allow_unauthenticated: match var("RELAY_ALLOW_UNAUTHENTICATED") {
            Some(v) => parse_bool("RELAY_ALLOW_UNAUTHENTICATED", &v)?,
            None => defaults.allow_unauthenticated,
        },
        http_timeout,
        accept_invalid_certs: match var("RELAY_ACCEPT_INVALID_CERTS") {
            Some(v) => parse_bool("RELAY_ACCEPT_INVALID_CERTS", &v)?,
            None => defaults.accept_invalid_certs,
        },
    })
}

fn parse_enum<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .with_context(|| format!("invalid value for {}: {}", key, value))
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("invalid boolean for {}: {}", key, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let cfg = from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.response_mode, ResponseMode::ResponseUrl);
        assert!(cfg.deferred_ack);
        assert_eq!(cfg.error_mode, ErrorMode::Report);
        assert_eq!(cfg.button_encoding, ButtonEncoding::Pipe);
        assert_eq!(cfg.http_timeout, Some(Duration::from_secs(30)));
        assert!(cfg.accept_invalid_certs);
    }

    #[test]
    fn test_reads_upstream_credentials() {
        let cfg = from_lookup(lookup(&[
            ("jenkinsUser", "ci"),
            ("jenkinsPassword", "s3cret"),
            ("slackToken", "tok"),
            ("slackWebhook", "https://hooks.slack.test/T/B/X"),
        ]))
        .unwrap();
        let creds = cfg.jenkins_credentials().unwrap();
        assert_eq!(creds.user, "ci");
        assert_eq!(creds.password, "s3cret");
        assert_eq!(cfg.interaction_token().unwrap(), Some("tok"));
        assert_eq!(cfg.slack_webhook().unwrap(), "https://hooks.slack.test/T/B/X");
    }

    #[test]
    fn test_missing_credentials_are_configuration_errors() {
        let cfg = from_lookup(lookup(&[("jenkinsUser", "ci")])).unwrap();
        let err = cfg.jenkins_credentials().unwrap_err();
        assert!(matches!(err, AppError::Configuration(ref m) if m.contains("jenkinsPassword")));
        assert!(matches!(cfg.slack_webhook(), Err(AppError::Configuration(_))));
        assert!(matches!(cfg.interaction_token(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_unauthenticated_must_be_explicit() {
        let cfg = from_lookup(lookup(&[("RELAY_ALLOW_UNAUTHENTICATED", "true")])).unwrap();
        assert_eq!(cfg.interaction_token().unwrap(), None);
    }

    #[test]
    fn test_inline_mode_disables_deferred_ack_by_default() {
        let cfg = from_lookup(lookup(&[("RELAY_RESPONSE_MODE", "inline")])).unwrap();
        assert_eq!(cfg.response_mode, ResponseMode::Inline);
        assert!(!cfg.deferred_ack);
    }

    #[test]
    fn test_inline_with_deferred_ack_is_rejected() {
        let res = from_lookup(lookup(&[
            ("RELAY_RESPONSE_MODE", "inline"),
            ("RELAY_DEFERRED_ACK", "true"),
        ]));
        assert!(res.is_err());
    }

    #[test]
    fn test_invalid_enum_values_are_rejected() {
        assert!(from_lookup(lookup(&[("RELAY_ERROR_MODE", "swallow")])).is_err());
        assert!(from_lookup(lookup(&[("RELAY_BUTTON_ENCODING", "xml")])).is_err());
        let cfg = from_lookup(lookup(&[("RELAY_ERROR_MODE", "MASK")])).unwrap();
        assert_eq!(cfg.error_mode, ErrorMode::Mask);
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let cfg = from_lookup(lookup(&[("RELAY_HTTP_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(cfg.http_timeout, None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let cfg = from_lookup(lookup(&[
            ("jenkinsPassword", "hunter2"),
            ("slackToken", "xoxb-secret"),
        ]))
        .unwrap();
        let dbg = format!("{:?}", cfg);
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("xoxb-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
