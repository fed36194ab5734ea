//! Read-only reference data served as `lighthouse://` resources.
//!
//! Thresholds, scoring weights and optimization guides a client can pull into
//! context next to audit output. The documents live as JSON under
//! `reference/` and are compiled in.

use pmcp::{ResourceCollection, StaticResource};

const JSON: &str = "application/json";

/// One compiled-in reference document.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceDoc {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub body: &'static str,
}

pub const REFERENCE_DOCS: &[ReferenceDoc] = &[
    ReferenceDoc {
        uri: "lighthouse://performance/core-web-vitals-thresholds",
        name: "core-web-vitals-thresholds",
        description: "Good / needs-improvement / poor bands for LCP, FID, CLS, FCP, TBT and Speed Index",
        body: include_str!("../reference/performance-core-web-vitals-thresholds.json"),
    },
    ReferenceDoc {
        uri: "lighthouse://performance/optimization-techniques",
        name: "optimization-techniques",
        description: "Image, JavaScript, CSS and caching techniques with impact and difficulty",
        body: include_str!("../reference/performance-optimization-techniques.json"),
    },
    ReferenceDoc {
        uri: "lighthouse://accessibility/wcag-guidelines",
        name: "wcag-guidelines",
        description: "WCAG principles, levels and common accessibility issues",
        body: include_str!("../reference/accessibility-wcag-guidelines.json"),
    },
    ReferenceDoc {
        uri: "lighthouse://seo/best-practices",
        name: "seo-best-practices",
        description: "On-page, technical and content SEO practices",
        body: include_str!("../reference/seo-best-practices.json"),
    },
    ReferenceDoc {
        uri: "lighthouse://security/best-practices",
        name: "security-best-practices",
        description: "HTTPS, security headers and common vulnerabilities",
        body: include_str!("../reference/security-best-practices.json"),
    },
    ReferenceDoc {
        uri: "lighthouse://performance/budget-guidelines",
        name: "budget-guidelines",
        description: "Suggested performance budgets by site type and metric",
        body: include_str!("../reference/performance-budget-guidelines.json"),
    },
    ReferenceDoc {
        uri: "lighthouse://audits/categories-scoring",
        name: "categories-scoring",
        description: "How each Lighthouse category is scored and weighted",
        body: include_str!("../reference/audits-categories-scoring.json"),
    },
    ReferenceDoc {
        uri: "lighthouse://frameworks/optimization-guides",
        name: "framework-guides",
        description: "Framework-specific optimization guides",
        body: include_str!("../reference/frameworks-optimization-guides.json"),
    },
];

/// Look up a reference document by URI.
pub fn reference_doc(uri: &str) -> Option<&'static ReferenceDoc> {
    REFERENCE_DOCS.iter().find(|doc| doc.uri == uri)
}

/// All reference documents as a resource handler.
pub fn reference_resources() -> ResourceCollection {
    REFERENCE_DOCS
        .iter()
        .fold(ResourceCollection::new(), |collection, doc| {
            collection.add_resource(
                StaticResource::new_text(doc.uri, doc.body)
                    .with_name(doc.name)
                    .with_description(doc.description)
                    .with_mime_type(JSON),
            )
        })
}
