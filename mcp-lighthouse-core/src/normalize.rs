//! Raw engine output to the shapes tools consume.

use crate::constants::KEY_METRICS;
use crate::options::Device;
use crate::report::RawAuditResult;
use serde::Serialize;

/// Serialize ordered `(key, value)` entries as a JSON object.
pub(crate) use crate::report::ordered_map::serialize as entries_as_object;

/// Fraction in `[0, 1]` to a whole 0–100 score.
pub fn to_percent(score: f64) -> i64 {
    (score * 100.0).round() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub title: String,
    pub score: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetric {
    pub title: String,
    pub value: f64,
    pub display_value: String,
    /// `None` when the engine left the audit unscored, distinct from 0.
    pub score: Option<i64>,
}

/// Identity fields plus rescaled categories and key metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAuditResult {
    pub url: String,
    pub fetch_time: String,
    pub version: String,
    pub user_agent: String,
    pub device: Device,
    #[serde(serialize_with = "entries_as_object")]
    pub categories: Vec<(String, CategoryScore)>,
    #[serde(serialize_with = "entries_as_object")]
    pub metrics: Vec<(String, KeyMetric)>,
}

impl NormalizedAuditResult {
    pub fn from_raw(raw: &RawAuditResult, device: Device) -> Self {
        Self {
            url: raw.final_displayed_url.clone(),
            fetch_time: raw.fetch_time.clone(),
            version: raw.lighthouse_version.clone(),
            user_agent: raw.user_agent.clone(),
            device,
            categories: format_category_scores(raw),
            metrics: extract_key_metrics(raw),
        }
    }

    pub fn category(&self, key: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    pub fn metric(&self, id: &str) -> Option<&KeyMetric> {
        self.metrics.iter().find(|(k, _)| k == id).map(|(_, m)| m)
    }

    /// Category score, 0 when the category was not audited.
    pub fn category_score(&self, key: &str) -> i64 {
        self.category(key).map_or(0, |c| c.score)
    }
}

/// Every category, scored 0–100. A missing score counts as 0.
pub fn format_category_scores(raw: &RawAuditResult) -> Vec<(String, CategoryScore)> {
    raw.categories
        .iter()
        .map(|(key, category)| {
            (
                key.clone(),
                CategoryScore {
                    title: category.title.clone(),
                    score: to_percent(category.score.unwrap_or(0.0)),
                    description: category.description.clone(),
                },
            )
        })
        .collect()
}

/// The allowlisted metrics that are present. Absent metrics are omitted.
pub fn extract_key_metrics(raw: &RawAuditResult) -> Vec<(String, KeyMetric)> {
    KEY_METRICS
        .iter()
        .filter_map(|&id| {
            let audit = raw.audit(id)?;
            Some((
                id.to_string(),
                KeyMetric {
                    title: audit.title.clone(),
                    value: audit.numeric_value.unwrap_or(0.0),
                    display_value: audit
                        .display_value
                        .clone()
                        .unwrap_or_else(|| "N/A".to_string()),
                    score: audit.score.map(to_percent),
                },
            ))
        })
        .collect()
}

/// One audit referenced by a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub score_display_mode: Option<String>,
    pub display_value: Option<String>,
}

/// Audits referenced by `category_key`, in engine order. Unknown categories
/// and categories without references yield an empty list.
pub fn filter_audits_by_category(raw: &RawAuditResult, category_key: &str) -> Vec<AuditSummary> {
    let Some(category) = raw.category(category_key) else {
        return Vec::new();
    };

    raw.audits
        .iter()
        .filter(|(id, _)| category.references(id))
        .map(|(id, audit)| AuditSummary {
            id: id.clone(),
            title: audit.title.clone(),
            description: audit.description.clone(),
            score: audit.score,
            score_display_mode: audit.score_display_mode.clone(),
            display_value: audit.display_value.clone(),
        })
        .collect()
}
