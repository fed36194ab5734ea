//! Full audit and single-category report tools.

use super::{failure, structured, validate_input};
use crate::categories;
use crate::options::{Category, Device};
use crate::runner::AuditRunner;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct RunAuditInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[schemars(description = "Categories to audit (default: all)")]
    pub categories: Option<Vec<Category>>,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,

    #[serde(default)]
    #[schemars(description = "Whether to throttle the audit (default: false)")]
    pub throttling: bool,
}

pub async fn run_audit(runner: &Arc<AuditRunner>, input: RunAuditInput) -> Result<Value, Error> {
    validate_input(&input)?;

    match runner
        .run_formatted_audit(&input.url, input.categories.as_deref(), input.device, input.throttling)
        .await
    {
        Ok(result) => structured("Lighthouse Audit", &result.url, input.device.as_str(), &result, &[]),
        Err(e) => Ok(failure("run_audit", &e, &input.url, input.device.as_str())),
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schemars(deny_unknown_fields)]
pub struct CategoryInput {
    #[validate(url)]
    #[schemars(description = "URL to audit")]
    pub url: String,

    #[serde(default)]
    #[schemars(description = "Device to emulate (default: desktop)")]
    pub device: Device,

    #[serde(default)]
    #[schemars(description = "Include detailed metrics and recommendations")]
    pub include_details: bool,
}

async fn category(
    runner: &AuditRunner,
    tool: &str,
    kind: &str,
    category: Category,
    input: CategoryInput,
) -> Result<Value, Error> {
    validate_input(&input)?;

    match categories::category_report(runner, &input.url, category, input.device, input.include_details).await {
        Ok(report) => {
            let summary = report.summary();
            structured(kind, &summary.url, summary.device.as_str(), &report, &[])
        }
        Err(e) => Ok(failure(tool, &e, &input.url, input.device.as_str())),
    }
}

pub async fn accessibility(runner: &Arc<AuditRunner>, input: CategoryInput) -> Result<Value, Error> {
    category(runner, "get_accessibility_score", "Accessibility", Category::Accessibility, input).await
}

pub async fn seo(runner: &Arc<AuditRunner>, input: CategoryInput) -> Result<Value, Error> {
    category(runner, "get_seo_analysis", "SEO", Category::Seo, input).await
}

pub async fn pwa(runner: &Arc<AuditRunner>, input: CategoryInput) -> Result<Value, Error> {
    category(runner, "check_pwa_readiness", "PWA Readiness", Category::Pwa, input).await
}
