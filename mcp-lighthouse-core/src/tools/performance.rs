//! Performance tools: score, Core Web Vitals, device comparison, budgets,
//! and LCP opportunities.

use super::{failure, structured, validate_input};
use crate::constants::DEFAULT_LCP_THRESHOLD;
use crate::normalize::entries_as_object;
use crate::options::{Category, Device};
use crate::performance::{self as perf, PerformanceBudget, ScoreDifference, VitalsThreshold};
use crate::runner::AuditRunner;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct BasicInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,
}

pub async fn score(runner: &Arc<AuditRunner>, input: BasicInput) -> Result<Value, Error> {
    validate_input(&input)?;

    match perf::performance_score(runner, &input.url, input.device).await {
        Ok(result) => structured(
            "Performance Score",
            &result.url,
            result.device.as_str(),
            &result,
            &[
                "Focus on Core Web Vitals improvements",
                "Optimize largest contentful paint for better user experience",
                "Reduce total blocking time to improve interactivity",
            ],
        ),
        Err(e) => Ok(failure("get_performance_score", &e, &input.url, input.device.as_str())),
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schemars(deny_unknown_fields)]
pub struct CoreWebVitalsInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,

    #[serde(default)]
    #[schemars(description = "Include detailed metrics and recommendations")]
    pub include_details: bool,

    #[schemars(description = "Pass/fail thresholds for LCP (s), FID (ms), and CLS")]
    pub threshold: Option<VitalsThreshold>,
}

pub async fn core_web_vitals(runner: &Arc<AuditRunner>, input: CoreWebVitalsInput) -> Result<Value, Error> {
    validate_input(&input)?;
    if let Some(ref threshold) = input.threshold {
        validate_input(threshold)?;
    }

    match perf::get_core_web_vitals(runner, &input.url, input.device, input.threshold.as_ref()).await {
        Ok(report) => structured(
            "Core Web Vitals",
            &report.url,
            report.device.as_str(),
            &report,
            &[
                "Optimize Largest Contentful Paint (LCP) < 2.5s",
                "Minimize First Input Delay (FID) < 100ms",
                "Reduce Cumulative Layout Shift (CLS) < 0.1",
            ],
        ),
        Err(e) => Ok(failure("get_core_web_vitals", &e, &input.url, input.device.as_str())),
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schemars(deny_unknown_fields)]
pub struct CompareDevicesInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[schemars(description = "Categories to audit (default: all)")]
    pub categories: Option<Vec<Category>>,

    #[serde(default)]
    #[schemars(description = "Whether to throttle the audit (default: false)")]
    pub throttling: bool,

    #[serde(default)]
    #[schemars(description = "Include both full normalized results")]
    pub include_details: bool,
}

const BOTH_DEVICES: &str = "mobile + desktop";

pub async fn compare(runner: &Arc<AuditRunner>, input: CompareDevicesInput) -> Result<Value, Error> {
    validate_input(&input)?;

    let comparison = match perf::compare_mobile_desktop(
        runner,
        &input.url,
        input.categories.as_deref(),
        input.throttling,
    )
    .await
    {
        Ok(comparison) => comparison,
        Err(e) => return Ok(failure("compare_mobile_desktop", &e, &input.url, BOTH_DEVICES)),
    };

    let recommendations = [
        "Mobile performance typically requires more optimization",
        "Focus on image optimization for mobile devices",
        "Consider implementing responsive design best practices",
    ];

    if input.include_details {
        return structured(
            "Mobile vs Desktop Comparison",
            &comparison.url,
            BOTH_DEVICES,
            &comparison,
            &recommendations,
        );
    }

    let summary = ComparisonSummary {
        url: comparison.url,
        differences: comparison.differences,
    };
    structured("Mobile vs Desktop Comparison", &summary.url, BOTH_DEVICES, &summary, &recommendations)
}

/// Comparison without the two full results.
#[derive(Serialize)]
struct ComparisonSummary {
    url: String,
    #[serde(serialize_with = "entries_as_object")]
    differences: Vec<(String, ScoreDifference)>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct BudgetInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,

    #[schemars(description = "Budget limits; only the given ones are checked")]
    pub budget: PerformanceBudget,
}

pub async fn budget(runner: &Arc<AuditRunner>, input: BudgetInput) -> Result<Value, Error> {
    validate_input(&input)?;
    validate_input(&input.budget)?;

    match perf::check_performance_budget(runner, &input.url, input.device, &input.budget).await {
        Ok(report) => {
            let recommendations: &[&str] = if report.overall_passed {
                &["Performance budget requirements met"]
            } else {
                &[
                    "Review failing metrics and optimize accordingly",
                    "Consider adjusting budget thresholds if realistic",
                    "Focus on the metrics with largest budget overruns",
                ]
            };
            structured(
                "Performance Budget Check",
                &report.url,
                report.device.as_str(),
                &report,
                recommendations,
            )
        }
        Err(e) => Ok(failure("check_performance_budget", &e, &input.url, input.device.as_str())),
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schemars(deny_unknown_fields)]
pub struct LcpInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,

    #[serde(default)]
    #[schemars(description = "Include detailed metrics and recommendations")]
    pub include_details: bool,

    #[validate(range(min = 0.0))]
    #[schemars(description = "LCP threshold in seconds (default: 2.5)")]
    pub threshold: Option<f64>,
}

pub async fn lcp(runner: &Arc<AuditRunner>, input: LcpInput) -> Result<Value, Error> {
    validate_input(&input)?;
    let threshold = input.threshold.unwrap_or(DEFAULT_LCP_THRESHOLD);

    match perf::get_lcp_opportunities(runner, &input.url, input.device, threshold).await {
        Ok(report) => {
            let recommendations: &[&str] = if report.needs_improvement {
                &[
                    "Optimize image loading and compression",
                    "Implement resource hints (preload, prefetch)",
                    "Reduce server response times",
                    "Minimize render-blocking resources",
                ]
            } else {
                &["LCP performance is within acceptable range"]
            };
            structured(
                "LCP Optimization Opportunities",
                &report.url,
                report.device.as_str(),
                &report,
                recommendations,
            )
        }
        Err(e) => Ok(failure("get_lcp_opportunities", &e, &input.url, input.device.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::{attached_runner, FakeEngine, Reply};

    fn sample() -> Value {
        json!({
            "finalDisplayedUrl": "https://example.com/",
            "fetchTime": "2024-01-01T00:00:00.000Z",
            "categories": { "performance": { "title": "Performance", "score": 0.85 } },
            "audits": {
                "largest-contentful-paint": { "title": "LCP", "score": 0.5, "numericValue": 2500, "displayValue": "2.5 s" },
                "render-blocking-resources": { "title": "Render blocking", "score": 0.3 }
            }
        })
    }

    fn runner() -> Arc<AuditRunner> {
        Arc::new(attached_runner(Arc::new(FakeEngine::returning(sample()))))
    }

    #[tokio::test]
    async fn test_budget_tool() {
        let input: BudgetInput = serde_json::from_value(json!({
            "url": "https://example.com",
            "budget": { "performanceScore": 80, "largestContentfulPaint": 2000 }
        }))
        .unwrap();

        let body = budget(&runner(), input).await.unwrap();

        assert_eq!(body["data"]["overallPassed"], false);
        assert_eq!(body["data"]["results"]["performanceScore"]["passed"], true);
        assert_eq!(body["data"]["results"]["largestContentfulPaint"]["passed"], false);
        assert_eq!(body["data"]["results"]["largestContentfulPaint"]["difference"], 500.0);
        assert_eq!(
            body["recommendations"][0],
            "Review failing metrics and optimize accordingly"
        );
    }

    #[tokio::test]
    async fn test_budget_score_out_of_range_rejected() {
        let input: BudgetInput = serde_json::from_value(json!({
            "url": "https://example.com",
            "budget": { "performanceScore": 150 }
        }))
        .unwrap();
        assert!(budget(&runner(), input).await.is_err());
    }

    #[tokio::test]
    async fn test_lcp_tool_default_threshold() {
        let input: LcpInput = serde_json::from_value(json!({ "url": "https://example.com" })).unwrap();
        let body = lcp(&runner(), input).await.unwrap();

        assert_eq!(body["data"]["lcpValue"], 2.5);
        assert_eq!(body["data"]["threshold"], 2.5);
        assert_eq!(body["data"]["needsImprovement"], false);
        assert_eq!(body["data"]["opportunities"][0]["id"], "render-blocking-resources");
        assert_eq!(body["recommendations"][0], "LCP performance is within acceptable range");
    }

    #[tokio::test]
    async fn test_compare_tool() {
        let input: CompareDevicesInput =
            serde_json::from_value(json!({ "url": "https://example.com" })).unwrap();
        let body = compare(&runner(), input).await.unwrap();

        assert_eq!(body["summary"], "Mobile vs Desktop Comparison analysis for https://example.com/ on mobile + desktop");
        assert_eq!(body["data"]["differences"]["performance"]["difference"], 0);
        assert_eq!(body["data"]["differences"]["performance"]["better"], "mobile");
        assert!(body["data"].get("mobile").is_none());
    }

    #[tokio::test]
    async fn test_core_web_vitals_failure_payload() {
        let runner = Arc::new(attached_runner(Arc::new(FakeEngine::new(vec![Reply::Empty]))));
        let input: CoreWebVitalsInput =
            serde_json::from_value(json!({ "url": "https://example.com", "device": "mobile" })).unwrap();

        let body = core_web_vitals(&runner, input).await.unwrap();
        assert_eq!(body["error"], true);
        assert_eq!(body["device"], "mobile");
    }

    #[tokio::test]
    async fn test_score_tool() {
        let input: BasicInput = serde_json::from_value(json!({ "url": "https://example.com" })).unwrap();
        let body = score(&runner(), input).await.unwrap();
        assert_eq!(body["data"]["performanceScore"], 85);
        assert_eq!(body["data"]["metrics"]["largest-contentful-paint"]["displayValue"], "2.5 s");
    }
}
