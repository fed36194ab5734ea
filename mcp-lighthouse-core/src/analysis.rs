//! Analyses over `details.items` of single audits: unused JavaScript,
//! network resources, and the security subset of best-practices.

use crate::constants::{NETWORK_REQUESTS_AUDIT, SECURITY_AUDITS, UNUSED_JAVASCRIPT_AUDIT};
use crate::error::Result;
use crate::normalize::entries_as_object;
use crate::options::{Category, Device};
use crate::report::{item_f64, item_str, RawAuditResult};
use crate::runner::AuditRunner;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedScript {
    pub url: String,
    pub total_bytes: f64,
    pub wasted_bytes: f64,
    pub wasted_percent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedJavaScriptReport {
    pub url: String,
    pub device: Device,
    pub total_unused_bytes: f64,
    pub items: Vec<UnusedScript>,
    pub fetch_time: String,
}

/// Scripts wasting at least `min_bytes`. A missing audit or missing details
/// is an empty report, not an error.
pub fn unused_javascript(raw: &RawAuditResult, device: Device, min_bytes: f64) -> UnusedJavaScriptReport {
    let items: Vec<UnusedScript> = raw
        .audit_items(UNUSED_JAVASCRIPT_AUDIT)
        .unwrap_or_default()
        .iter()
        .filter_map(|item| {
            let wasted_bytes = item_f64(item, "wastedBytes")?;
            if wasted_bytes < min_bytes {
                return None;
            }
            let total_bytes = item_f64(item, "totalBytes").unwrap_or(0.0);
            Some(UnusedScript {
                url: item_str(item, "url").unwrap_or_default().to_string(),
                total_bytes,
                wasted_bytes,
                wasted_percent: percent_of(wasted_bytes, total_bytes),
            })
        })
        .collect();

    let total_unused_bytes = items.iter().map(|i| i.wasted_bytes).sum();

    UnusedJavaScriptReport {
        url: raw.final_displayed_url.clone(),
        device,
        total_unused_bytes,
        items,
        fetch_time: raw.fetch_time.clone(),
    }
}

/// `round(part / whole * 100)`, 0 when `whole` is zero.
fn percent_of(part: f64, whole: f64) -> i64 {
    let ratio = part / whole * 100.0;
    if ratio.is_finite() {
        ratio.round() as i64
    } else {
        0
    }
}

pub async fn find_unused_javascript(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    min_bytes: f64,
) -> Result<UnusedJavaScriptReport> {
    let raw = runner
        .run_raw_audit(url, Some(&[Category::Performance]), device, false)
        .await?;
    Ok(unused_javascript(&raw, device, min_bytes))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub url: String,
    pub resource_type: String,
    pub transfer_size: f64,
    pub resource_size: f64,
    #[serde(rename = "sizeKB")]
    pub size_kb: f64,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub count: u64,
    pub total_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReport {
    pub url: String,
    pub device: Device,
    pub resources: Vec<Resource>,
    /// Per resource type, in first-seen order.
    #[serde(serialize_with = "entries_as_object")]
    pub summary: Vec<(String, ResourceSummary)>,
    pub fetch_time: String,
}

impl ResourceReport {
    pub fn summary_for(&self, resource_type: &str) -> Option<&ResourceSummary> {
        self.summary
            .iter()
            .find(|(t, _)| t == resource_type)
            .map(|(_, s)| s)
    }
}

/// Bucket for a network request: the explicit `resourceType` lowercased, else
/// a guess from the MIME type.
pub fn categorize_resource(item: &Map<String, Value>) -> String {
    if let Some(resource_type) = item_str(item, "resourceType").filter(|t| !t.is_empty()) {
        return resource_type.to_lowercase();
    }

    let mime = item_str(item, "mimeType").unwrap_or_default();
    let bucket = if mime.starts_with("image/") {
        "images"
    } else if mime.contains("javascript") {
        "javascript"
    } else if mime.contains("css") {
        "css"
    } else if mime.contains("font") {
        "fonts"
    } else {
        "other"
    };
    bucket.to_string()
}

/// Network requests at least `min_size_kb` large and, when `resource_types`
/// is given, of one of those types.
pub fn resources(
    raw: &RawAuditResult,
    device: Device,
    resource_types: Option<&[String]>,
    min_size_kb: f64,
) -> ResourceReport {
    let resources: Vec<Resource> = raw
        .audit_items(NETWORK_REQUESTS_AUDIT)
        .unwrap_or_default()
        .iter()
        .map(|item| {
            let transfer_size = item_f64(item, "transferSize").unwrap_or(0.0);
            Resource {
                url: item_str(item, "url").unwrap_or_default().to_string(),
                resource_type: categorize_resource(item),
                transfer_size,
                resource_size: item_f64(item, "resourceSize").unwrap_or(0.0),
                size_kb: (transfer_size / 1024.0 * 100.0).round() / 100.0,
                mime_type: item_str(item, "mimeType").map(str::to_string),
            }
        })
        .filter(|r| min_size_kb <= 0.0 || r.size_kb >= min_size_kb)
        .filter(|r| resource_types.map_or(true, |types| types.contains(&r.resource_type)))
        .collect();

    let mut summary: Vec<(String, ResourceSummary)> = Vec::new();
    for resource in &resources {
        let index = match summary.iter().position(|(t, _)| *t == resource.resource_type) {
            Some(index) => index,
            None => {
                summary.push((resource.resource_type.clone(), ResourceSummary::default()));
                summary.len() - 1
            }
        };
        let entry = &mut summary[index].1;
        entry.count += 1;
        entry.total_size += resource.transfer_size;
    }

    ResourceReport {
        url: raw.final_displayed_url.clone(),
        device,
        resources,
        summary,
        fetch_time: raw.fetch_time.clone(),
    }
}

pub async fn analyze_resources(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    resource_types: Option<&[String]>,
    min_size_kb: f64,
) -> Result<ResourceReport> {
    let raw = runner
        .run_raw_audit(url, Some(&[Category::Performance]), device, false)
        .await?;
    Ok(resources(&raw, device, resource_types, min_size_kb))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityCheck {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub score_display_mode: Option<String>,
    pub display_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    pub url: String,
    pub device: Device,
    pub overall_score: i64,
    pub audits: Vec<SecurityCheck>,
    pub fetch_time: String,
}

/// Security audits present in the result, narrowed to ids containing one of
/// `checks` when given. The overall score is the mean of the included scores
/// (unscored counts as 0), and 0 when nothing is included.
pub fn security(raw: &RawAuditResult, device: Device, checks: Option<&[String]>) -> SecurityReport {
    let audits: Vec<SecurityCheck> = SECURITY_AUDITS
        .iter()
        .filter(|id| checks.map_or(true, |checks| checks.iter().any(|c| id.contains(c.as_str()))))
        .filter_map(|&id| {
            let audit = raw.audit(id)?;
            Some(SecurityCheck {
                id: id.to_string(),
                title: audit.title.clone(),
                description: audit.description.clone(),
                score: audit.score,
                score_display_mode: audit.score_display_mode.clone(),
                display_value: audit.display_value.clone(),
            })
        })
        .collect();

    let overall_score = if audits.is_empty() {
        0
    } else {
        let sum: f64 = audits.iter().map(|a| a.score.unwrap_or(0.0)).sum();
        (sum / audits.len() as f64 * 100.0).round() as i64
    };

    SecurityReport {
        url: raw.final_displayed_url.clone(),
        device,
        overall_score,
        audits,
        fetch_time: raw.fetch_time.clone(),
    }
}

pub async fn security_audit(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    checks: Option<&[String]>,
) -> Result<SecurityReport> {
    let raw = runner
        .run_raw_audit(url, Some(&[Category::BestPractices]), device, false)
        .await?;
    Ok(security(&raw, device, checks))
}
