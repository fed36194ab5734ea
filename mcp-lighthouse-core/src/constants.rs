//! Fixed tables shared by the launcher, the runner, and the analyses.

/// Flags every launched browser starts from.
pub const DEFAULT_CHROME_FLAGS: &[&str] = &["--headless", "--no-sandbox", "--disable-dev-shm-usage"];

pub const HEADLESS_FLAG_PREFIX: &str = "--headless";
pub const USER_DATA_DIR_FLAG_PREFIX: &str = "--user-data-dir";
pub const PROFILE_DIRECTORY_FLAG_PREFIX: &str = "--profile-directory";

/// Audits copied into the key-metrics mapping, in output order.
pub const KEY_METRICS: &[&str] = &[
    "first-contentful-paint",
    "largest-contentful-paint",
    "total-blocking-time",
    "cumulative-layout-shift",
    "speed-index",
    "interactive",
];

/// Audits that can shorten largest-contentful-paint.
pub const LCP_OPPORTUNITIES: &[&str] = &[
    "render-blocking-resources",
    "unused-css-rules",
    "unused-javascript",
    "modern-image-formats",
    "uses-optimized-images",
    "efficient-animated-content",
    "preload-lcp-image",
    "uses-text-compression",
];

pub const SECURITY_AUDITS: &[&str] = &[
    "is-on-https",
    "uses-http2",
    "no-vulnerable-libraries",
    "csp-xss",
    "external-anchors-use-rel-noopener",
];

pub const UNUSED_JAVASCRIPT_AUDIT: &str = "unused-javascript";
pub const NETWORK_REQUESTS_AUDIT: &str = "network-requests";
pub const LARGEST_CONTENTFUL_PAINT: &str = "largest-contentful-paint";

/// Budget field, the audit it reads, and the unit it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetMetric {
    pub key: &'static str,
    pub metric: &'static str,
    pub unit: &'static str,
}

pub const BUDGET_METRICS: &[BudgetMetric] = &[
    BudgetMetric { key: "firstContentfulPaint", metric: "first-contentful-paint", unit: "ms" },
    BudgetMetric { key: "largestContentfulPaint", metric: "largest-contentful-paint", unit: "ms" },
    BudgetMetric { key: "totalBlockingTime", metric: "total-blocking-time", unit: "ms" },
    BudgetMetric { key: "cumulativeLayoutShift", metric: "cumulative-layout-shift", unit: "score" },
    BudgetMetric { key: "speedIndex", metric: "speed-index", unit: "ms" },
];

/// LCP threshold in seconds.
pub const DEFAULT_LCP_THRESHOLD: f64 = 2.5;
pub const DEFAULT_MIN_UNUSED_JS_BYTES: f64 = 2048.0;
pub const DEFAULT_MIN_RESOURCE_SIZE_KB: f64 = 0.0;
