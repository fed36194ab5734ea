//! Raw audit engine output (the Lighthouse result object).
//!
//! Only the fields the normalizer and analyses read are typed; everything is
//! optional on the way in because engine versions differ and partial results
//! are normal. Category and audit maps keep the engine's key order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuditResult {
    #[serde(default, alias = "finalUrl")]
    pub final_displayed_url: String,
    #[serde(default)]
    pub fetch_time: String,
    #[serde(default)]
    pub lighthouse_version: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default, with = "ordered_map")]
    pub categories: Vec<(String, RawCategory)>,
    #[serde(default, with = "ordered_map")]
    pub audits: Vec<(String, RawAudit)>,
}

impl RawAuditResult {
    pub fn category(&self, key: &str) -> Option<&RawCategory> {
        lookup(&self.categories, key)
    }

    pub fn audit(&self, id: &str) -> Option<&RawAudit> {
        lookup(&self.audits, id)
    }

    /// `details.items` of an audit, or `None` when the audit or its details
    /// are missing.
    pub fn audit_items(&self, id: &str) -> Option<&[Map<String, Value>]> {
        self.audit(id)?.details.as_ref().map(|d| d.items.as_slice())
    }
}

fn lookup<'a, T>(entries: &'a [(String, T)], key: &str) -> Option<&'a T> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategory {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Fraction in `[0, 1]`; `None` when the engine could not score it.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub audit_refs: Option<Vec<AuditRef>>,
}

impl RawCategory {
    pub fn references(&self, audit_id: &str) -> bool {
        self.audit_refs
            .as_ref()
            .is_some_and(|refs| refs.iter().any(|r| r.id == audit_id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAudit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub score_display_mode: Option<String>,
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub numeric_value: Option<f64>,
    #[serde(default)]
    pub details: Option<AuditDetails>,
}

/// Audit details; only the item table is read, the rest is carried through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDetails {
    #[serde(default)]
    pub items: Vec<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Numeric field of a details item, `None` when missing or not a number.
pub fn item_f64(item: &Map<String, Value>, key: &str) -> Option<f64> {
    item.get(key).and_then(Value::as_f64)
}

/// String field of a details item.
pub fn item_str<'a>(item: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

/// (De)serializes a JSON object as an ordered list of entries.
pub(crate) mod ordered_map {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, T>(entries: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Vec<(String, T)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keeps_engine_key_order() {
        let raw: RawAuditResult = serde_json::from_value(json!({
            "finalDisplayedUrl": "https://example.com/",
            "audits": {
                "zeta": { "title": "Z", "score": 1 },
                "alpha": { "title": "A", "score": null },
                "mid": { "title": "M", "score": 0.5 }
            }
        }))
        .unwrap();

        let ids: Vec<&str> = raw.audits.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(raw.audit("alpha").unwrap().score, None);
        assert_eq!(raw.audit("mid").unwrap().score, Some(0.5));

        let back = serde_json::to_value(&raw).unwrap();
        let keys: Vec<&String> = back["audits"].as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_partial_result_parses() {
        let raw: RawAuditResult = serde_json::from_value(json!({
            "finalUrl": "https://legacy.example/",
            "fetchTime": "2024-01-01T00:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(raw.final_displayed_url, "https://legacy.example/");
        assert!(raw.categories.is_empty());
        assert!(raw.audit_items("network-requests").is_none());
    }

    #[test]
    fn test_details_items_and_category_refs() {
        let raw: RawAuditResult = serde_json::from_value(json!({
            "categories": {
                "seo": {
                    "title": "SEO",
                    "score": 0.9,
                    "auditRefs": [{ "id": "document-title", "weight": 1 }]
                }
            },
            "audits": {
                "network-requests": {
                    "title": "Network Requests",
                    "details": { "type": "table", "items": [{ "url": "a.js", "transferSize": 2048 }] }
                }
            }
        }))
        .unwrap();

        let items = raw.audit_items("network-requests").unwrap();
        assert_eq!(item_f64(&items[0], "transferSize"), Some(2048.0));
        assert_eq!(item_str(&items[0], "url"), Some("a.js"));
        assert_eq!(item_str(&items[0], "mimeType"), None);

        let seo = raw.category("seo").unwrap();
        assert!(seo.references("document-title"));
        assert!(!seo.references("viewport"));
    }
}
