//! Bundle and network resource analysis tools.

use super::{failure, structured, validate_input};
use crate::analysis;
use crate::constants::{DEFAULT_MIN_RESOURCE_SIZE_KB, DEFAULT_MIN_UNUSED_JS_BYTES};
use crate::options::Device;
use crate::runner::AuditRunner;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

fn default_min_bytes() -> f64 {
    DEFAULT_MIN_UNUSED_JS_BYTES
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schemars(deny_unknown_fields)]
pub struct UnusedJavaScriptInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,

    #[serde(default = "default_min_bytes")]
    #[validate(range(min = 0.0))]
    #[schemars(description = "Minimum unused bytes to report (default: 2048)")]
    pub min_bytes: f64,

    #[serde(default)]
    #[schemars(description = "Include source map analysis")]
    pub include_source_maps: bool,
}

pub async fn unused_javascript(runner: &Arc<AuditRunner>, input: UnusedJavaScriptInput) -> Result<Value, Error> {
    validate_input(&input)?;

    match analysis::find_unused_javascript(runner, &input.url, input.device, input.min_bytes).await {
        Ok(report) => {
            let recommendations: &[&str] = if report.items.is_empty() {
                &[]
            } else {
                &[
                    "Remove unused JavaScript code to reduce bundle size",
                    "Consider code splitting to load only necessary code",
                    "Use tree shaking to eliminate dead code",
                    "Implement lazy loading for non-critical JavaScript",
                ]
            };
            structured(
                "Unused JavaScript",
                &report.url,
                report.device.as_str(),
                &report,
                recommendations,
            )
        }
        Err(e) => Ok(failure("find_unused_javascript", &e, &input.url, input.device.as_str())),
    }
}

/// Resource bucket names a caller can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Images,
    Javascript,
    Css,
    Fonts,
    Other,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Images => "images",
            ResourceType::Javascript => "javascript",
            ResourceType::Css => "css",
            ResourceType::Fonts => "fonts",
            ResourceType::Other => "other",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schemars(deny_unknown_fields)]
pub struct ResourceAnalysisInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,

    #[schemars(description = "Types of resources to analyze")]
    pub resource_types: Option<Vec<ResourceType>>,

    #[validate(range(min = 0.0))]
    #[schemars(description = "Minimum resource size in KB to include")]
    pub min_size: Option<f64>,
}

fn type_recommendation(resource_type: &str) -> Option<&'static str> {
    match resource_type {
        "images" => Some("Images: consider modern formats (WebP, AVIF), optimize image sizes, and lazy load"),
        "javascript" => Some("JavaScript: minify and compress, remove unused code, split bundles"),
        "css" => Some("CSS: minify, remove unused styles, consider inlining critical CSS"),
        "fonts" => Some("Fonts: use font-display: swap, preload critical fonts, consider variable fonts"),
        _ => None,
    }
}

pub async fn resources(runner: &Arc<AuditRunner>, input: ResourceAnalysisInput) -> Result<Value, Error> {
    validate_input(&input)?;

    let types: Option<Vec<String>> = input
        .resource_types
        .as_ref()
        .map(|types| types.iter().map(|t| t.as_str().to_string()).collect());
    let min_size = input.min_size.unwrap_or(DEFAULT_MIN_RESOURCE_SIZE_KB);

    match analysis::analyze_resources(runner, &input.url, input.device, types.as_deref(), min_size).await {
        Ok(report) => {
            let recommendations: Vec<&str> = report
                .summary
                .iter()
                .filter_map(|(resource_type, _)| type_recommendation(resource_type))
                .collect();
            structured(
                "Resource",
                &report.url,
                report.device.as_str(),
                &report,
                &recommendations,
            )
        }
        Err(e) => Ok(failure("analyze_resources", &e, &input.url, input.device.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::{attached_runner, FakeEngine};
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "finalDisplayedUrl": "https://example.com/",
            "audits": {
                "unused-javascript": {
                    "title": "Reduce unused JavaScript",
                    "details": { "items": [
                        { "url": "https://example.com/app.js", "totalBytes": 10000, "wastedBytes": 5000 },
                        { "url": "https://example.com/tiny.js", "totalBytes": 3000, "wastedBytes": 1000 }
                    ]}
                },
                "network-requests": {
                    "title": "Network Requests",
                    "details": { "items": [
                        { "url": "https://example.com/hero.png", "resourceType": "Images", "transferSize": 51200 },
                        { "url": "https://example.com/app.js", "mimeType": "application/javascript", "transferSize": 1024 }
                    ]}
                }
            }
        })
    }

    fn runner() -> Arc<AuditRunner> {
        Arc::new(attached_runner(Arc::new(FakeEngine::returning(sample()))))
    }

    #[tokio::test]
    async fn test_unused_javascript_default_min_bytes() {
        let input: UnusedJavaScriptInput =
            serde_json::from_value(json!({ "url": "https://example.com" })).unwrap();
        assert_eq!(input.min_bytes, 2048.0);

        let body = unused_javascript(&runner(), input).await.unwrap();
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["totalUnusedBytes"], 5000.0);
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_negative_min_bytes_rejected() {
        let input: UnusedJavaScriptInput =
            serde_json::from_value(json!({ "url": "https://example.com", "minBytes": -1 })).unwrap();
        assert!(unused_javascript(&runner(), input).await.is_err());
    }

    #[tokio::test]
    async fn test_resources_filtered_by_type() {
        let input: ResourceAnalysisInput = serde_json::from_value(json!({
            "url": "https://example.com",
            "resourceTypes": ["javascript"]
        }))
        .unwrap();

        let body = resources(&runner(), input).await.unwrap();
        let listed = body["data"]["resources"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["resourceType"], "javascript");
        assert_eq!(body["data"]["summary"]["javascript"]["count"], 1);
        assert!(body["recommendations"][0]
            .as_str()
            .unwrap()
            .starts_with("JavaScript"));
    }

    #[tokio::test]
    async fn test_resources_min_size() {
        let input: ResourceAnalysisInput = serde_json::from_value(json!({
            "url": "https://example.com",
            "minSize": 10
        }))
        .unwrap();

        let body = resources(&runner(), input).await.unwrap();
        let listed = body["data"]["resources"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["sizeKB"], 50.0);
    }
}
