//! Prompt templates that turn audit output into analysis requests.
//!
//! Each prompt takes the JSON a tool returned (pasted in by the client) plus a
//! few optional context arguments, and renders a single user message ending in
//! a numbered list of what the answer should cover.

use crate::options::Category;
use pmcp::{Content, Error, GetPromptResult, PromptMessage, Role, SyncPrompt};
use std::collections::HashMap;

type Args = HashMap<String, String>;

/// A prompt's name, argument list and renderer.
pub struct PromptTemplate {
    pub name: &'static str,
    pub description: &'static str,
    /// `(name, description, required)`
    pub arguments: &'static [(&'static str, &'static str, bool)],
    pub render: fn(&Args) -> pmcp::Result<String>,
}

pub const PROMPT_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        name: "analyze-audit-results",
        description: "Turn raw audit results into prioritized, actionable insights",
        arguments: &[
            ("auditResults", "JSON audit results from Lighthouse", true),
            (
                "focusArea",
                "Area to focus on: performance, accessibility, seo, best-practices or pwa",
                false,
            ),
        ],
        render: analyze_audit_results,
    },
    PromptTemplate {
        name: "create-performance-plan",
        description: "Build a step-by-step performance improvement plan",
        arguments: &[
            ("currentMetrics", "Current performance metrics from Lighthouse", true),
            ("targetGoals", "Specific performance goals or targets", false),
            ("timeframe", "Timeline for implementing improvements", false),
        ],
        render: create_performance_plan,
    },
    PromptTemplate {
        name: "compare-audits",
        description: "Compare audit results from before and after a change",
        arguments: &[
            ("beforeAudit", "Lighthouse audit results before changes", true),
            ("afterAudit", "Lighthouse audit results after changes", true),
            ("changesImplemented", "Description of changes that were implemented", false),
        ],
        render: compare_audits,
    },
    PromptTemplate {
        name: "seo-recommendations",
        description: "SEO recommendations from an SEO audit",
        arguments: &[
            ("seoAudit", "SEO audit results from Lighthouse", true),
            ("websiteType", "Type of website (e.g., e-commerce, blog, corporate)", false),
            ("targetAudience", "Target audience or market", false),
        ],
        render: seo_recommendations,
    },
    PromptTemplate {
        name: "accessibility-guide",
        description: "Accessibility remediation guide from an accessibility audit",
        arguments: &[
            ("accessibilityAudit", "Accessibility audit results from Lighthouse", true),
            ("complianceLevel", "WCAG compliance level to target: AA or AAA", false),
            (
                "userGroups",
                "Specific user groups to consider (e.g., visually impaired, motor disabilities)",
                false,
            ),
        ],
        render: accessibility_guide,
    },
    PromptTemplate {
        name: "create-performance-budget",
        description: "Derive a performance budget from current metrics",
        arguments: &[
            ("currentMetrics", "Current performance metrics", true),
            ("businessGoals", "Business goals and requirements", false),
            (
                "userBase",
                "Information about the user base and their typical devices/connections",
                false,
            ),
        ],
        render: create_performance_budget,
    },
    PromptTemplate {
        name: "optimize-core-web-vitals",
        description: "Targeted LCP, INP and CLS optimizations",
        arguments: &[
            ("coreWebVitals", "Core Web Vitals metrics and detailed breakdown", true),
            ("framework", "Frontend framework or technology stack", false),
            ("constraints", "Any technical or business constraints", false),
        ],
        render: optimize_core_web_vitals,
    },
    PromptTemplate {
        name: "optimize-resources",
        description: "Resource loading and bundling recommendations",
        arguments: &[
            ("resourceAnalysis", "Resource analysis results from Lighthouse", true),
            ("loadingStrategy", "Current loading strategy (e.g., SPA, SSR, SSG)", false),
            (
                "criticalUserJourneys",
                "Critical user journeys that need optimal performance",
                false,
            ),
        ],
        render: optimize_resources,
    },
];

fn required<'a>(args: &'a Args, name: &str) -> pmcp::Result<&'a str> {
    args.get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::validation(format!("Required argument '{}' is missing", name)))
}

fn optional<'a>(args: &'a Args, name: &str) -> Option<&'a str> {
    args.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn labeled(args: &Args, name: &str, label: &str) -> Option<String> {
    optional(args, name).map(|value| format!("{}: {}", label, value))
}

/// `intro`, the pasted material, any context lines, then the numbered asks.
fn compose(intro: &str, material: &str, context: &[Option<String>], asks: &[&str]) -> String {
    let mut text = format!("{}\n\n{}", intro, material);

    let context: Vec<&str> = context.iter().flatten().map(String::as_str).collect();
    if !context.is_empty() {
        text.push_str("\n\n");
        text.push_str(&context.join("\n"));
    }

    text.push_str("\n\nPlease provide:");
    for (i, ask) in asks.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, ask));
    }
    text
}

fn analyze_audit_results(args: &Args) -> pmcp::Result<String> {
    let results = required(args, "auditResults")?;
    let focus = optional(args, "focusArea")
        .map(|area| area.parse::<Category>().map_err(Error::validation))
        .transpose()?;

    let intro = match focus {
        Some(area) => format!(
            "Please analyze these Lighthouse audit results and provide actionable insights focusing on {}:",
            area
        ),
        None => "Please analyze these Lighthouse audit results and provide actionable insights:".to_string(),
    };

    Ok(compose(
        &intro,
        results,
        &[],
        &[
            "Key performance issues identified",
            "Prioritized recommendations for improvement",
            "Estimated impact of each recommendation",
            "Implementation difficulty level for each recommendation",
        ],
    ))
}

fn create_performance_plan(args: &Args) -> pmcp::Result<String> {
    let metrics = required(args, "currentMetrics")?;
    Ok(compose(
        "Based on these current performance metrics, create a comprehensive improvement plan:",
        &format!("Current Metrics:\n{}", metrics),
        &[
            labeled(args, "targetGoals", "Target Goals"),
            labeled(args, "timeframe", "Timeframe"),
        ],
        &[
            "A step-by-step action plan",
            "Technical implementation details for each step",
            "Expected performance improvements",
            "Testing and validation strategies",
            "Monitoring recommendations",
        ],
    ))
}

fn compare_audits(args: &Args) -> pmcp::Result<String> {
    let before = required(args, "beforeAudit")?;
    let after = required(args, "afterAudit")?;
    Ok(compose(
        "Compare these before and after Lighthouse audit results:",
        &format!("BEFORE:\n{}\n\nAFTER:\n{}", before, after),
        &[labeled(args, "changesImplemented", "Changes Implemented")],
        &[
            "Summary of improvements and regressions",
            "Impact analysis of the changes",
            "Recommendations for further optimization",
            "Any concerning trends or issues that emerged",
        ],
    ))
}

fn seo_recommendations(args: &Args) -> pmcp::Result<String> {
    let audit = required(args, "seoAudit")?;
    Ok(compose(
        "Based on these SEO audit results, provide comprehensive SEO recommendations:",
        audit,
        &[
            labeled(args, "websiteType", "Website Type"),
            labeled(args, "targetAudience", "Target Audience"),
        ],
        &[
            "Critical SEO issues that need immediate attention",
            "On-page optimization recommendations",
            "Technical SEO improvements",
            "Content strategy suggestions",
            "Implementation priority and effort estimates",
        ],
    ))
}

fn accessibility_guide(args: &Args) -> pmcp::Result<String> {
    let audit = required(args, "accessibilityAudit")?;
    let level = match optional(args, "complianceLevel") {
        None => "AA",
        Some(level @ ("AA" | "AAA")) => level,
        Some(other) => {
            return Err(Error::validation(format!(
                "complianceLevel must be AA or AAA, got '{}'",
                other
            )))
        }
    };

    Ok(compose(
        "Based on these accessibility audit results, create an accessibility improvement guide:",
        audit,
        &[
            Some(format!("Target WCAG Level: {}", level)),
            labeled(args, "userGroups", "Focus on user groups"),
        ],
        &[
            "Critical accessibility barriers to address first",
            "Step-by-step remediation instructions",
            "Testing strategies for each improvement",
            "Code examples and best practices",
            "Long-term accessibility maintenance plan",
        ],
    ))
}

fn create_performance_budget(args: &Args) -> pmcp::Result<String> {
    let metrics = required(args, "currentMetrics")?;
    Ok(compose(
        "Help create a performance budget based on these current metrics:",
        metrics,
        &[
            labeled(args, "businessGoals", "Business Goals"),
            labeled(args, "userBase", "User Base"),
        ],
        &[
            "Recommended performance budget values for key metrics",
            "Justification for each budget threshold",
            "Implementation strategy for budget monitoring",
            "Alert and escalation procedures",
            "Regular review and adjustment recommendations",
        ],
    ))
}

fn optimize_core_web_vitals(args: &Args) -> pmcp::Result<String> {
    let vitals = required(args, "coreWebVitals")?;
    Ok(compose(
        "Help optimize Core Web Vitals based on these metrics:",
        vitals,
        &[
            labeled(args, "framework", "Technology Stack"),
            labeled(args, "constraints", "Constraints"),
        ],
        &[
            "Specific optimizations for LCP (Largest Contentful Paint)",
            "Specific optimizations for FID/INP (First Input Delay/Interaction to Next Paint)",
            "Specific optimizations for CLS (Cumulative Layout Shift)",
            "Framework-specific recommendations",
            "Measurement and monitoring strategy",
        ],
    ))
}

fn optimize_resources(args: &Args) -> pmcp::Result<String> {
    let analysis = required(args, "resourceAnalysis")?;
    Ok(compose(
        "Based on this resource analysis, provide optimization recommendations:",
        analysis,
        &[
            labeled(args, "loadingStrategy", "Current Loading Strategy"),
            labeled(args, "criticalUserJourneys", "Critical User Journeys"),
        ],
        &[
            "Resource bundling and splitting strategies",
            "Image optimization recommendations",
            "JavaScript and CSS optimization techniques",
            "Caching and CDN strategies",
            "Progressive loading implementation",
        ],
    ))
}

fn user_message(text: String) -> pmcp::Result<GetPromptResult> {
    Ok(GetPromptResult::new(
        vec![PromptMessage {
            role: Role::User,
            content: Content::Text { text },
        }],
        None,
    ))
}

/// The prompt handler for one template.
pub fn sync_prompt(
    template: &'static PromptTemplate,
) -> SyncPrompt<impl Fn(Args) -> pmcp::Result<GetPromptResult> + Send + Sync> {
    let render = template.render;
    let prompt = SyncPrompt::new(template.name, move |args: Args| user_message(render(&args)?))
        .with_description(template.description);

    template
        .arguments
        .iter()
        .fold(prompt, |prompt, (name, description, required)| {
            prompt.with_argument(*name, *description, *required)
        })
}

/// Register every prompt template onto the server builder.
pub fn register_prompts(builder: pmcp::ServerBuilder) -> pmcp::ServerBuilder {
    PROMPT_TEMPLATES
        .iter()
        .fold(builder, |builder, template| {
            builder.prompt(template.name, sync_prompt(template))
        })
}
