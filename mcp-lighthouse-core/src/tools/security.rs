//! Security audit tool.

use super::{failure, structured, validate_input};
use crate::analysis;
use crate::options::Device;
use crate::runner::AuditRunner;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

/// Check names; each selects the security audits whose id contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityCheckName {
    Https,
    MixedContent,
    Csp,
    Hsts,
    Vulnerabilities,
}

impl SecurityCheckName {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityCheckName::Https => "https",
            SecurityCheckName::MixedContent => "mixed-content",
            SecurityCheckName::Csp => "csp",
            SecurityCheckName::Hsts => "hsts",
            SecurityCheckName::Vulnerabilities => "vulnerabilities",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct SecurityAuditInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,

    #[schemars(description = "Specific security checks to perform")]
    pub checks: Option<Vec<SecurityCheckName>>,
}

pub async fn audit(runner: &Arc<AuditRunner>, input: SecurityAuditInput) -> Result<Value, Error> {
    validate_input(&input)?;

    let checks: Option<Vec<String>> = input
        .checks
        .as_ref()
        .map(|checks| checks.iter().map(|c| c.as_str().to_string()).collect());

    match analysis::security_audit(runner, &input.url, input.device, checks.as_deref()).await {
        Ok(report) => {
            let failing: Vec<String> = report
                .audits
                .iter()
                .filter(|a| a.score.map_or(true, |s| s < 1.0))
                .map(|a| format!("Fix: {}", a.title))
                .collect();
            let recommendations: Vec<&str> = failing.iter().map(String::as_str).collect();
            structured(
                "Security Audit",
                &report.url,
                report.device.as_str(),
                &report,
                &recommendations,
            )
        }
        Err(e) => Ok(failure("get_security_audit", &e, &input.url, input.device.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Category;
    use crate::runner::testing::{attached_runner, FakeEngine};
    use serde_json::json;

    #[tokio::test]
    async fn test_security_tool_with_checks() {
        let engine = Arc::new(FakeEngine::returning(json!({
            "finalDisplayedUrl": "https://example.com/",
            "audits": {
                "is-on-https": { "title": "Uses HTTPS", "score": 1 },
                "uses-http2": { "title": "Use HTTP/2", "score": 0 },
                "csp-xss": { "title": "CSP is effective", "score": null }
            }
        })));
        let runner = Arc::new(attached_runner(engine.clone()));

        let input: SecurityAuditInput = serde_json::from_value(json!({
            "url": "https://example.com",
            "checks": ["https"]
        }))
        .unwrap();

        let body = audit(&runner, input).await.unwrap();
        assert_eq!(body["data"]["overallScore"], 100);
        assert_eq!(body["data"]["audits"].as_array().unwrap().len(), 1);
        assert!(body.get("recommendations").is_none());
        assert_eq!(
            engine.calls()[0].1.only_categories,
            Some(vec![Category::BestPractices])
        );
    }

    #[tokio::test]
    async fn test_security_tool_lists_failing_audits() {
        let engine = Arc::new(FakeEngine::returning(json!({
            "audits": {
                "is-on-https": { "title": "Uses HTTPS", "score": 1 },
                "csp-xss": { "title": "CSP is effective", "score": null }
            }
        })));
        let runner = Arc::new(attached_runner(engine));

        let input: SecurityAuditInput =
            serde_json::from_value(json!({ "url": "https://example.com" })).unwrap();

        let body = audit(&runner, input).await.unwrap();
        assert_eq!(body["data"]["overallScore"], 50);
        assert_eq!(body["recommendations"][0], "Fix: CSP is effective");
    }

    #[test]
    fn test_unknown_check_rejected() {
        let parsed: Result<SecurityAuditInput, _> = serde_json::from_value(json!({
            "url": "https://example.com",
            "checks": ["xss"]
        }));
        assert!(parsed.is_err());
    }
}
