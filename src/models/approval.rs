//! The approval decision carried inside a Slack button value.
//!
//! Slack round-trips the button `value` verbatim, so everything the resolver
//! needs to find the paused build travels in it. Two encodings exist:
//!
//! - `pipe`: `"<approved>|<buildUrl>|<pipelineUrl>|<buildVersion>"`, the format
//!   existing pipelines and already-posted messages use.
//! - `json`: a compact object, immune to `|` inside field values.
//!
//! Decoding accepts either; encoding uses whichever the relay is configured for.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const DELIMITER: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonEncoding {
    Pipe,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub approved: bool,
    pub build_url: String,
    pub pipeline_url: String,
    pub build_version: String,
}

/// Wire shape of the JSON encoding. Short keys keep the button value small.
#[derive(Serialize, Deserialize)]
struct CompactValue {
    a: bool,
    b: String,
    p: String,
    v: String,
}

impl ApprovalRequest {
    pub fn new(approved: bool, build_url: &str, pipeline_url: &str, build_version: &str) -> Self {
        Self {
            approved,
            build_url: build_url.to_string(),
            pipeline_url: pipeline_url.to_string(),
            build_version: build_version.to_string(),
        }
    }

    /// Encode as a button value.
    ///
    /// The pipe encoding refuses fields containing `|`; splitting them back
    /// apart would silently shift every later field.
    pub fn encode(&self, encoding: ButtonEncoding) -> Result<String, AppError> {
        match encoding {
            ButtonEncoding::Pipe => {
                let fields = [
                    ("buildUrl", self.build_url.as_str()),
                    ("pipelineUrl", self.pipeline_url.as_str()),
                    ("buildVersion", self.build_version.as_str()),
                ];
                if let Some((name, _)) = fields.iter().find(|(_, v)| v.contains(DELIMITER)) {
                    return Err(AppError::Validation(format!(
                        "{} must not contain '{}'",
                        name, DELIMITER
                    )));
                }
                Ok(format!(
                    "{}{d}{}{d}{}{d}{}",
                    self.approved,
                    self.build_url,
                    self.pipeline_url,
                    self.build_version,
                    d = DELIMITER
                ))
            }
            ButtonEncoding::Json => serde_json::to_string(&CompactValue {
                a: self.approved,
                b: self.build_url.clone(),
                p: self.pipeline_url.clone(),
                v: self.build_version.clone(),
            })
            .map_err(|e| AppError::Internal(e.into())),
        }
    }

    /// Decode a button value in either encoding.
    ///
    /// A value that looks like JSON but does not parse as the compact object
    /// is decoded as a pipe value, so a flag such as `{maybe` still means
    /// "not approved".
    pub fn decode(value: &str) -> Result<Self, AppError> {
        if value.trim_start().starts_with('{') {
            if let Ok(compact) = serde_json::from_str::<CompactValue>(value) {
                return Ok(Self {
                    approved: compact.a,
                    build_url: compact.b,
                    pipeline_url: compact.p,
                    build_version: compact.v,
                });
            }
        }

        let fields: Vec<&str> = value.split(DELIMITER).collect();
        match fields.as_slice() {
            [flag, build_url, pipeline_url, build_version] => Ok(Self::new(
                flag.eq_ignore_ascii_case("true"),
                build_url,
                pipeline_url,
                build_version,
            )),
            _ => Err(AppError::Validation(format!(
                "approval value must have 4 '{}'-separated fields, got {}",
                DELIMITER,
                fields.len()
            ))),
        }
    }
}
