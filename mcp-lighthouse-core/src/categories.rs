//! Single-category reports: accessibility, SEO, and PWA readiness.

use crate::error::Result;
use crate::normalize::{to_percent, AuditSummary};
use crate::options::{Category, Device};
use crate::report::RawAuditResult;
use crate::runner::AuditRunner;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Identity and 0-100 score of one audited category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: Category,
    pub url: String,
    pub device: Device,
    pub score: i64,
    pub fetch_time: String,
}

impl CategorySummary {
    pub fn from_raw(raw: &RawAuditResult, category: Category, device: Device) -> Self {
        let score = raw
            .category(category.as_str())
            .and_then(|c| c.score)
            .map_or(0, to_percent);

        Self {
            category,
            url: raw.final_displayed_url.clone(),
            device,
            score,
            fetch_time: raw.fetch_time.clone(),
        }
    }
}

/// Category report with or without the per-audit breakdown.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryReport {
    Basic(CategorySummary),
    Detailed {
        summary: CategorySummary,
        audits: Vec<AuditSummary>,
    },
}

impl CategoryReport {
    pub fn summary(&self) -> &CategorySummary {
        match self {
            CategoryReport::Basic(summary) => summary,
            CategoryReport::Detailed { summary, .. } => summary,
        }
    }

    pub fn audits(&self) -> Option<&[AuditSummary]> {
        match self {
            CategoryReport::Basic(_) => None,
            CategoryReport::Detailed { audits, .. } => Some(audits),
        }
    }
}

/// JSON key carrying the score, e.g. `seoScore`.
pub fn score_key(category: Category) -> &'static str {
    match category {
        Category::Performance => "performanceScore",
        Category::Accessibility => "accessibilityScore",
        Category::BestPractices => "bestPracticesScore",
        Category::Seo => "seoScore",
        Category::Pwa => "pwaScore",
    }
}

impl Serialize for CategoryReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let summary = self.summary();
        let audits = self.audits();

        let mut map = serializer.serialize_map(Some(4 + usize::from(audits.is_some())))?;
        map.serialize_entry("url", &summary.url)?;
        map.serialize_entry("device", &summary.device)?;
        map.serialize_entry(score_key(summary.category), &summary.score)?;
        map.serialize_entry("fetchTime", &summary.fetch_time)?;
        if let Some(audits) = audits {
            map.serialize_entry("audits", audits)?;
        }
        map.end()
    }
}

/// Audit one category. With details the breakdown comes from the same run
/// as the score.
pub async fn category_report(
    runner: &AuditRunner,
    url: &str,
    category: Category,
    device: Device,
    include_details: bool,
) -> Result<CategoryReport> {
    if include_details {
        let detailed = runner.detailed_audit_results(url, category, device).await?;
        return Ok(CategoryReport::Detailed {
            summary: CategorySummary::from_raw(&detailed.raw, category, device),
            audits: detailed.audits,
        });
    }

    let raw = runner.run_raw_audit(url, Some(&[category]), device, false).await?;
    Ok(CategoryReport::Basic(CategorySummary::from_raw(&raw, category, device)))
}

pub async fn accessibility_score(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    include_details: bool,
) -> Result<CategoryReport> {
    category_report(runner, url, Category::Accessibility, device, include_details).await
}

pub async fn seo_analysis(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    include_details: bool,
) -> Result<CategoryReport> {
    category_report(runner, url, Category::Seo, device, include_details).await
}

pub async fn pwa_readiness(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    include_details: bool,
) -> Result<CategoryReport> {
    category_report(runner, url, Category::Pwa, device, include_details).await
}
