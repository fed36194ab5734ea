//! Performance-focused derivations: score, Core Web Vitals, device
//! comparison, budgets, and LCP opportunities.

use crate::constants::{BUDGET_METRICS, LARGEST_CONTENTFUL_PAINT, LCP_OPPORTUNITIES};
use crate::error::Result;
use crate::normalize::{entries_as_object, KeyMetric, NormalizedAuditResult};
use crate::options::{Category, Device};
use crate::report::RawAuditResult;
use crate::runner::AuditRunner;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceScore {
    pub url: String,
    pub device: Device,
    pub performance_score: i64,
    #[serde(serialize_with = "entries_as_object")]
    pub metrics: Vec<(String, KeyMetric)>,
    pub fetch_time: String,
}

pub async fn performance_score(runner: &AuditRunner, url: &str, device: Device) -> Result<PerformanceScore> {
    let result = runner
        .run_formatted_audit(url, Some(&[Category::Performance]), device, false)
        .await?;

    Ok(PerformanceScore {
        performance_score: result.category_score(Category::Performance.as_str()),
        url: result.url,
        device: result.device,
        metrics: result.metrics,
        fetch_time: result.fetch_time,
    })
}

/// Optional Core Web Vitals limits. `lcp` is in seconds, `fid` in
/// milliseconds (checked against total blocking time), `cls` unitless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct VitalsThreshold {
    #[validate(range(min = 0.0))]
    #[schemars(description = "Largest Contentful Paint threshold in seconds")]
    pub lcp: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schemars(description = "First Input Delay threshold in milliseconds")]
    pub fid: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schemars(description = "Cumulative Layout Shift threshold")]
    pub cls: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoreWebVitals {
    pub lcp: Option<KeyMetric>,
    pub fcp: Option<KeyMetric>,
    pub cls: Option<KeyMetric>,
    /// Lab stand-in for first input delay.
    pub tbt: Option<KeyMetric>,
}

/// Pass/fail per vital; `None` where no threshold was given.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdResults {
    pub lcp: Option<bool>,
    pub fid: Option<bool>,
    pub cls: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreWebVitalsReport {
    pub url: String,
    pub device: Device,
    pub core_web_vitals: CoreWebVitals,
    pub threshold_results: Option<ThresholdResults>,
    pub fetch_time: String,
}

pub fn core_web_vitals(result: &NormalizedAuditResult, threshold: Option<&VitalsThreshold>) -> CoreWebVitalsReport {
    let vitals = CoreWebVitals {
        lcp: result.metric("largest-contentful-paint").cloned(),
        fcp: result.metric("first-contentful-paint").cloned(),
        cls: result.metric("cumulative-layout-shift").cloned(),
        tbt: result.metric("total-blocking-time").cloned(),
    };

    let value = |metric: &Option<KeyMetric>| metric.as_ref().map_or(0.0, |m| m.value);

    // A zero threshold counts as "not given".
    let given = |t: Option<f64>| t.filter(|t| *t != 0.0);

    let threshold_results = threshold.map(|t| ThresholdResults {
        lcp: given(t.lcp).map(|limit| value(&vitals.lcp) / 1000.0 <= limit),
        fid: given(t.fid).map(|limit| value(&vitals.tbt) <= limit),
        cls: given(t.cls).map(|limit| value(&vitals.cls) <= limit),
    });

    CoreWebVitalsReport {
        url: result.url.clone(),
        device: result.device,
        core_web_vitals: vitals,
        threshold_results,
        fetch_time: result.fetch_time.clone(),
    }
}

pub async fn get_core_web_vitals(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    threshold: Option<&VitalsThreshold>,
) -> Result<CoreWebVitalsReport> {
    let result = runner
        .run_formatted_audit(url, Some(&[Category::Performance]), device, false)
        .await?;
    Ok(core_web_vitals(&result, threshold))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDifference {
    pub mobile: i64,
    pub desktop: i64,
    /// `desktop - mobile`.
    pub difference: i64,
    /// Desktop only when it scored strictly higher; ties go to mobile.
    pub better: Device,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceComparison {
    pub url: String,
    pub mobile: NormalizedAuditResult,
    pub desktop: NormalizedAuditResult,
    /// Categories present in both runs, in mobile order.
    #[serde(serialize_with = "entries_as_object")]
    pub differences: Vec<(String, ScoreDifference)>,
}

pub fn compare_results(mobile: NormalizedAuditResult, desktop: NormalizedAuditResult) -> DeviceComparison {
    let differences = mobile
        .categories
        .iter()
        .filter_map(|(key, m)| {
            let d = desktop.category(key)?;
            let difference = d.score - m.score;
            Some((
                key.clone(),
                ScoreDifference {
                    mobile: m.score,
                    desktop: d.score,
                    difference,
                    better: if difference > 0 { Device::Desktop } else { Device::Mobile },
                },
            ))
        })
        .collect();

    DeviceComparison {
        url: mobile.url.clone(),
        mobile,
        desktop,
        differences,
    }
}

/// Mobile then desktop, one after the other so both never hold the
/// debugging target at once. A mobile failure aborts before desktop runs.
pub async fn compare_mobile_desktop(
    runner: &AuditRunner,
    url: &str,
    categories: Option<&[Category]>,
    throttling: bool,
) -> Result<DeviceComparison> {
    let mobile = runner
        .run_formatted_audit(url, categories, Device::Mobile, throttling)
        .await?;
    let desktop = runner
        .run_formatted_audit(url, categories, Device::Desktop, throttling)
        .await?;
    Ok(compare_results(mobile, desktop))
}

/// Budget limits. Timing budgets are milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schemars(deny_unknown_fields)]
pub struct PerformanceBudget {
    #[validate(range(min = 0.0, max = 100.0))]
    #[schemars(description = "Minimum performance score (0-100)")]
    pub performance_score: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schemars(description = "FCP budget in milliseconds")]
    pub first_contentful_paint: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schemars(description = "LCP budget in milliseconds")]
    pub largest_contentful_paint: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schemars(description = "TBT budget in milliseconds")]
    pub total_blocking_time: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schemars(description = "CLS budget")]
    pub cumulative_layout_shift: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schemars(description = "Speed Index budget in milliseconds")]
    pub speed_index: Option<f64>,
}

impl PerformanceBudget {
    fn metric_budget(&self, key: &str) -> Option<f64> {
        match key {
            "firstContentfulPaint" => self.first_contentful_paint,
            "largestContentfulPaint" => self.largest_contentful_paint,
            "totalBlockingTime" => self.total_blocking_time,
            "cumulativeLayoutShift" => self.cumulative_layout_shift,
            "speedIndex" => self.speed_index,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetCheck {
    pub actual: f64,
    pub budget: f64,
    pub passed: bool,
    pub unit: &'static str,
    /// `actual - budget`.
    pub difference: f64,
}

impl BudgetCheck {
    fn new(actual: f64, budget: f64, passed: bool, unit: &'static str) -> Self {
        Self {
            actual,
            budget,
            passed,
            unit,
            difference: actual - budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
    pub url: String,
    pub device: Device,
    pub fetch_time: String,
    #[serde(serialize_with = "entries_as_object")]
    pub results: Vec<(String, BudgetCheck)>,
    pub overall_passed: bool,
}

impl BudgetReport {
    pub fn check(&self, key: &str) -> Option<&BudgetCheck> {
        self.results.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }
}

/// Score budgets pass at `actual >= budget`; every other budget passes at
/// `actual <= budget`. With no budget fields the report passes.
pub fn evaluate_budget(result: &NormalizedAuditResult, budget: &PerformanceBudget) -> BudgetReport {
    let mut results = Vec::new();

    if let Some(limit) = budget.performance_score {
        let actual = result.category_score(Category::Performance.as_str()) as f64;
        results.push((
            "performanceScore".to_string(),
            BudgetCheck::new(actual, limit, actual >= limit, "score"),
        ));
    }

    for mapping in BUDGET_METRICS {
        if let Some(limit) = budget.metric_budget(mapping.key) {
            let actual = result.metric(mapping.metric).map_or(0.0, |m| m.value);
            results.push((
                mapping.key.to_string(),
                BudgetCheck::new(actual, limit, actual <= limit, mapping.unit),
            ));
        }
    }

    BudgetReport {
        url: result.url.clone(),
        device: result.device,
        fetch_time: result.fetch_time.clone(),
        overall_passed: results.iter().all(|(_, check)| check.passed),
        results,
    }
}

pub async fn check_performance_budget(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    budget: &PerformanceBudget,
) -> Result<BudgetReport> {
    let result = runner
        .run_formatted_audit(url, Some(&[Category::Performance]), device, false)
        .await?;
    Ok(evaluate_budget(&result, budget))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LcpOpportunity {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub score: f64,
    pub display_value: Option<String>,
    pub numeric_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LcpReport {
    pub url: String,
    pub device: Device,
    /// Seconds.
    pub lcp_value: f64,
    pub threshold: f64,
    pub needs_improvement: bool,
    pub opportunities: Vec<LcpOpportunity>,
    pub fetch_time: String,
}

pub fn lcp_opportunities(raw: &RawAuditResult, device: Device, threshold: f64) -> LcpReport {
    let lcp_value = raw
        .audit(LARGEST_CONTENTFUL_PAINT)
        .and_then(|a| a.numeric_value)
        .unwrap_or(0.0)
        / 1000.0;

    let opportunities = LCP_OPPORTUNITIES
        .iter()
        .filter_map(|&id| {
            let audit = raw.audit(id)?;
            let score = audit.score.filter(|s| *s < 1.0)?;
            Some(LcpOpportunity {
                id: id.to_string(),
                title: audit.title.clone(),
                description: audit.description.clone(),
                score,
                display_value: audit.display_value.clone(),
                numeric_value: audit.numeric_value,
            })
        })
        .collect();

    LcpReport {
        url: raw.final_displayed_url.clone(),
        device,
        lcp_value,
        threshold,
        needs_improvement: lcp_value > threshold,
        opportunities,
        fetch_time: raw.fetch_time.clone(),
    }
}

pub async fn get_lcp_opportunities(
    runner: &AuditRunner,
    url: &str,
    device: Device,
    threshold: f64,
) -> Result<LcpReport> {
    let raw = runner
        .run_raw_audit(url, Some(&[Category::Performance]), device, false)
        .await?;
    Ok(lcp_opportunities(&raw, device, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::{attached_runner, FakeEngine, Reply};
    use serde_json::json;
    use std::sync::Arc;

    fn performance_result(lcp_ms: f64, score: f64) -> serde_json::Value {
        json!({
            "finalDisplayedUrl": "https://example.com/",
            "fetchTime": "2024-01-01T00:00:00.000Z",
            "categories": {
                "performance": { "title": "Performance", "score": score }
            },
            "audits": {
                "largest-contentful-paint": { "title": "LCP", "score": 0.6, "numericValue": lcp_ms, "displayValue": "2.5 s" },
                "first-contentful-paint": { "title": "FCP", "score": 0.9, "numericValue": 1200 },
                "cumulative-layout-shift": { "title": "CLS", "score": 1, "numericValue": 0.05 },
                "total-blocking-time": { "title": "TBT", "score": 0.8, "numericValue": 180 }
            }
        })
    }

    fn normalized(value: serde_json::Value, device: Device) -> NormalizedAuditResult {
        let raw: RawAuditResult = serde_json::from_value(value).unwrap();
        NormalizedAuditResult::from_raw(&raw, device)
    }

    #[test]
    fn test_budget_directions() {
        let result = normalized(performance_result(2500.0, 0.85), Device::Desktop);
        let budget = PerformanceBudget {
            performance_score: Some(80.0),
            largest_contentful_paint: Some(2000.0),
            total_blocking_time: Some(200.0),
            ..Default::default()
        };

        let report = evaluate_budget(&result, &budget);

        let score = report.check("performanceScore").unwrap();
        assert_eq!(score.actual, 85.0);
        assert!(score.passed);
        assert_eq!(score.unit, "score");

        let lcp = report.check("largestContentfulPaint").unwrap();
        assert!(!lcp.passed);
        assert_eq!(lcp.difference, 500.0);
        assert_eq!(lcp.unit, "ms");

        assert!(report.check("totalBlockingTime").unwrap().passed);
        assert!(report.check("speedIndex").is_none());
        assert!(!report.overall_passed);
    }

    #[test]
    fn test_budget_boundaries_and_empty_budget() {
        let result = normalized(performance_result(2000.0, 0.8), Device::Desktop);
        let budget = PerformanceBudget {
            performance_score: Some(80.0),
            largest_contentful_paint: Some(2000.0),
            ..Default::default()
        };
        assert!(evaluate_budget(&result, &budget).overall_passed);

        let empty = evaluate_budget(&result, &PerformanceBudget::default());
        assert!(empty.results.is_empty());
        assert!(empty.overall_passed);
    }

    #[test]
    fn test_budget_missing_metric_counts_as_zero() {
        let result = normalized(performance_result(2000.0, 0.8), Device::Desktop);
        let budget = PerformanceBudget {
            speed_index: Some(3000.0),
            ..Default::default()
        };
        let report = evaluate_budget(&result, &budget);
        let check = report.check("speedIndex").unwrap();
        assert_eq!(check.actual, 0.0);
        assert!(check.passed);
    }

    #[test]
    fn test_lcp_opportunities() {
        let raw: RawAuditResult = serde_json::from_value(json!({
            "audits": {
                "largest-contentful-paint": { "title": "LCP", "numericValue": 3000 },
                "render-blocking-resources": { "title": "Render blocking", "score": 0.5, "numericValue": 450 },
                "unused-css-rules": { "title": "Unused CSS", "score": 1 },
                "modern-image-formats": { "title": "Modern images", "score": null },
                "uses-text-compression": { "title": "Compression", "score": 0 }
            }
        }))
        .unwrap();

        let report = lcp_opportunities(&raw, Device::Mobile, 2.5);
        assert_eq!(report.lcp_value, 3.0);
        assert!(report.needs_improvement);

        let ids: Vec<&str> = report.opportunities.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["render-blocking-resources", "uses-text-compression"]);
        assert_eq!(report.opportunities[0].numeric_value, Some(450.0));
    }

    #[test]
    fn test_lcp_without_audit_is_zero() {
        let report = lcp_opportunities(&RawAuditResult::default(), Device::Desktop, 2.5);
        assert_eq!(report.lcp_value, 0.0);
        assert!(!report.needs_improvement);
        assert!(report.opportunities.is_empty());
    }

    #[test]
    fn test_core_web_vitals_thresholds() {
        let result = normalized(performance_result(2400.0, 0.9), Device::Desktop);

        let report = core_web_vitals(
            &result,
            Some(&VitalsThreshold {
                lcp: Some(2.5),
                fid: Some(100.0),
                cls: None,
            }),
        );
        let thresholds = report.threshold_results.unwrap();
        assert_eq!(thresholds.lcp, Some(true));
        assert_eq!(thresholds.fid, Some(false));
        assert_eq!(thresholds.cls, None);
        assert_eq!(report.core_web_vitals.tbt.unwrap().value, 180.0);

        assert!(core_web_vitals(&result, None).threshold_results.is_none());
    }

    #[test]
    fn test_compare_results() {
        let mobile = normalized(
            json!({ "categories": {
                "performance": { "title": "Performance", "score": 0.55 },
                "seo": { "title": "SEO", "score": 0.9 }
            }}),
            Device::Mobile,
        );
        let desktop = normalized(
            json!({ "categories": { "performance": { "title": "Performance", "score": 0.93 } } }),
            Device::Desktop,
        );

        let comparison = compare_results(mobile, desktop);
        assert_eq!(comparison.differences.len(), 1);
        let (key, diff) = &comparison.differences[0];
        assert_eq!(key, "performance");
        assert_eq!((diff.mobile, diff.desktop, diff.difference), (55, 93, 38));
        assert_eq!(diff.better, Device::Desktop);
    }

    #[tokio::test]
    async fn test_compare_runs_mobile_then_desktop() {
        let engine = Arc::new(FakeEngine::returning(performance_result(2000.0, 0.7)));
        let runner = attached_runner(engine.clone());

        let comparison = compare_mobile_desktop(&runner, "https://example.com", None, true)
            .await
            .unwrap();

        let devices: Vec<Device> = engine.calls().iter().map(|(_, o)| o.form_factor).collect();
        assert_eq!(devices, vec![Device::Mobile, Device::Desktop]);
        assert!(engine.calls().iter().all(|(_, o)| o.throttling == crate::options::Throttling::ENABLED));
        assert_eq!(comparison.differences[0].1.difference, 0);
        assert_eq!(comparison.differences[0].1.better, Device::Mobile);
    }

    #[tokio::test]
    async fn test_compare_aborts_when_mobile_fails() {
        let engine = Arc::new(FakeEngine::new(vec![
            Reply::Fail("mobile run failed"),
            Reply::Result(performance_result(2000.0, 0.7)),
        ]));
        let runner = attached_runner(engine.clone());

        assert!(compare_mobile_desktop(&runner, "https://example.com", None, false)
            .await
            .is_err());
        assert_eq!(engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_performance_score() {
        let engine = Arc::new(FakeEngine::returning(performance_result(2000.0, 0.72)));
        let runner = attached_runner(engine);

        let score = performance_score(&runner, "https://example.com", Device::Desktop)
            .await
            .unwrap();
        assert_eq!(score.performance_score, 72);
        assert_eq!(score.metrics.len(), 4);
    }
}
