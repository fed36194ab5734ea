//! Tool registration for all Lighthouse audit tools.
//!
//! Handlers are thin: validate input, call into the runner or a derived
//! analysis, and wrap the outcome. Operational audit failures come back as a
//! successful call carrying `{error: true, message, url, device}`, so a
//! client sees why the audit failed instead of a transport error.

pub mod analysis;
pub mod audit;
pub mod performance;
pub mod security;

use crate::error::AuditError;
use crate::runner::AuditRunner;
use pmcp::{Error, TypedTool};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

pub(crate) fn validate_input<T: Validate>(input: &T) -> Result<(), Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))
}

/// `{summary, data, recommendations?}` response body.
pub(crate) fn structured<T: Serialize>(
    kind: &str,
    url: &str,
    device: &str,
    data: &T,
    recommendations: &[&str],
) -> Result<Value, Error> {
    let data = serde_json::to_value(data)
        .map_err(|e| Error::internal(format!("Failed to serialize result: {}", e)))?;

    let mut body = json!({
        "summary": format!("{} analysis for {} on {}", kind, url, device),
        "data": data,
    });
    if !recommendations.is_empty() {
        body["recommendations"] = json!(recommendations);
    }
    Ok(body)
}

pub(crate) fn failure(tool: &str, error: &AuditError, url: &str, device: &str) -> Value {
    tracing::warn!(tool, url, device, retryable = error.is_retryable(), error = %error, "Audit failed");
    json!({
        "error": true,
        "message": error.to_string(),
        "url": url,
        "device": device,
    })
}

/// Register all audit tools onto the server builder.
///
/// Each tool captures an `Arc<AuditRunner>`.
pub fn register_tools(builder: pmcp::ServerBuilder, runner: Arc<AuditRunner>) -> pmcp::ServerBuilder {
    // --- Full audits and category reports ---

    let r = runner.clone();
    let builder = builder.tool(
        "run_audit",
        TypedTool::new("run_audit", move |input: audit::RunAuditInput, _extra| {
            let r = r.clone();
            Box::pin(async move { audit::run_audit(&r, input).await })
        })
        .with_description("Run a comprehensive Lighthouse audit on a website"),
    );

    let r = runner.clone();
    let builder = builder.tool(
        "get_accessibility_score",
        TypedTool::new(
            "get_accessibility_score",
            move |input: audit::CategoryInput, _extra| {
                let r = r.clone();
                Box::pin(async move { audit::accessibility(&r, input).await })
            },
        )
        .with_description("Get the accessibility score and recommendations for a website"),
    );

    let r = runner.clone();
    let builder = builder.tool(
        "get_seo_analysis",
        TypedTool::new("get_seo_analysis", move |input: audit::CategoryInput, _extra| {
            let r = r.clone();
            Box::pin(async move { audit::seo(&r, input).await })
        })
        .with_description("Get SEO analysis and recommendations for a website"),
    );

    let r = runner.clone();
    let builder = builder.tool(
        "check_pwa_readiness",
        TypedTool::new(
            "check_pwa_readiness",
            move |input: audit::CategoryInput, _extra| {
                let r = r.clone();
                Box::pin(async move { audit::pwa(&r, input).await })
            },
        )
        .with_description("Check Progressive Web App readiness and requirements"),
    );

    // --- Performance ---

    let r = runner.clone();
    let builder = builder.tool(
        "get_performance_score",
        TypedTool::new(
            "get_performance_score",
            move |input: performance::BasicInput, _extra| {
                let r = r.clone();
                Box::pin(async move { performance::score(&r, input).await })
            },
        )
        .with_description("Get the performance score for a website"),
    );

    let r = runner.clone();
    let builder = builder.tool(
        "get_core_web_vitals",
        TypedTool::new(
            "get_core_web_vitals",
            move |input: performance::CoreWebVitalsInput, _extra| {
                let r = r.clone();
                Box::pin(async move { performance::core_web_vitals(&r, input).await })
            },
        )
        .with_description("Get Core Web Vitals metrics for a website"),
    );

    let r = runner.clone();
    let builder = builder.tool(
        "compare_mobile_desktop",
        TypedTool::new(
            "compare_mobile_desktop",
            move |input: performance::CompareDevicesInput, _extra| {
                let r = r.clone();
                Box::pin(async move { performance::compare(&r, input).await })
            },
        )
        .with_description("Compare website performance between mobile and desktop devices"),
    );

    let r = runner.clone();
    let builder = builder.tool(
        "check_performance_budget",
        TypedTool::new(
            "check_performance_budget",
            move |input: performance::BudgetInput, _extra| {
                let r = r.clone();
                Box::pin(async move { performance::budget(&r, input).await })
            },
        )
        .with_description("Check if website performance meets specified budget thresholds"),
    );

    let r = runner.clone();
    let builder = builder.tool(
        "get_lcp_opportunities",
        TypedTool::new(
            "get_lcp_opportunities",
            move |input: performance::LcpInput, _extra| {
                let r = r.clone();
                Box::pin(async move { performance::lcp(&r, input).await })
            },
        )
        .with_description("Get LCP optimization opportunities for a website"),
    );

    // --- Resource analysis & security ---

    let r = runner.clone();
    let builder = builder.tool(
        "find_unused_javascript",
        TypedTool::new(
            "find_unused_javascript",
            move |input: analysis::UnusedJavaScriptInput, _extra| {
                let r = r.clone();
                Box::pin(async move { analysis::unused_javascript(&r, input).await })
            },
        )
        .with_description("Find unused JavaScript code to reduce bundle size"),
    );

    let r = runner.clone();
    let builder = builder.tool(
        "analyze_resources",
        TypedTool::new(
            "analyze_resources",
            move |input: analysis::ResourceAnalysisInput, _extra| {
                let r = r.clone();
                Box::pin(async move { analysis::resources(&r, input).await })
            },
        )
        .with_description(
            "Analyze website resources (images, JS, CSS, fonts) for optimization opportunities",
        ),
    );

    let r = runner;
    let builder = builder.tool(
        "get_security_audit",
        TypedTool::new(
            "get_security_audit",
            move |input: security::SecurityAuditInput, _extra| {
                let r = r.clone();
                Box::pin(async move { security::audit(&r, input).await })
            },
        )
        .with_description(
            "Perform security audit checking HTTPS, CSP, and other security measures",
        ),
    );

    builder
}
