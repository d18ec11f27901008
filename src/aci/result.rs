//! Result reporting

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{ApicErrorInfo, ManagedObject};

/// How much detail the result carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
    /// changed and current state only
    #[default]
    Normal,
    /// adds previous state
    Info,
    /// adds request details
    Debug,
}

/// Before/after view reported in diff mode
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResultDiff {
    pub before: Vec<ManagedObject>,
    pub after: Vec<ManagedObject>,
}

/// Outcome of one invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct AciResult {
    pub changed: bool,
    pub current: Vec<ManagedObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Vec<ManagedObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ResultDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Report printed when an invocation fails
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub failed: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApicErrorInfo>,
}

impl FailureReport {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            msg: msg.into(),
            error: None,
        }
    }
}

impl From<&AppError> for FailureReport {
    fn from(err: &AppError) -> Self {
        let mut report = FailureReport::new(err.to_string());
        if let AppError::Api(api) = err {
            report.error = api.apic_error().map(|(code, text)| ApicErrorInfo {
                code: code.to_string(),
                text: text.to_string(),
            });
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_normal_result_is_minimal() {
        let result = AciResult {
            changed: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, serde_json::json!({"changed": true, "current": []}));
    }

    #[test]
    fn test_failure_carries_apic_error() {
        let err = AppError::Api(ApiError::Apic {
            status: 400,
            code: "107".into(),
            text: "bad request".into(),
        });
        let report = FailureReport::from(&err);
        assert!(report.failed);
        assert_eq!(report.error.unwrap().code, "107");
        assert!(report.msg.contains("APIC Error 107"));
    }
}
