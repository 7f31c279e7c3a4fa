//! Update, delete and maintenance messages.

use crate::error::{Result, SolrError};
use crate::response::Document;
use crate::version::ProtocolVersion;
use quick_xml::escape::escape;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;

/// Format used to post documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    /// `update/json` (Solr 3 and later).
    #[default]
    Json,
    /// `<add>` message posted to `update`.
    Xml,
}

/// Options for a `<commit />` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    /// Block until index changes are flushed to disk.
    pub wait_flush: bool,
    /// Block until a new searcher is registered.
    pub wait_searcher: bool,
    /// Merge segments with deletes away.
    pub expunge_deletes: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            wait_flush: true,
            wait_searcher: true,
            expunge_deletes: false,
        }
    }
}

/// Options for an `<optimize />` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Block until index changes are flushed to disk.
    pub wait_flush: bool,
    /// Block until a new searcher is registered.
    pub wait_searcher: bool,
    /// Optimize down to at most this many segments.
    pub max_segments: u32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            wait_flush: true,
            wait_searcher: true,
            max_segments: 1,
        }
    }
}

/// Build an `<add>` message.
///
/// Multi-valued fields repeat the `<field>` element once per value. `null`
/// values are skipped; nested objects cannot be expressed and are rejected.
pub fn add_xml(documents: &[Document], overwrite: bool) -> Result<String> {
    let mut xml = String::new();
    let _ = write!(xml, r#"<add overwrite="{}">"#, overwrite);
    for doc in documents {
        xml.push_str("<doc>");
        for (name, value) in doc {
            match value {
                Value::Array(values) => {
                    for v in values {
                        push_field(&mut xml, name, v)?;
                    }
                }
                v => push_field(&mut xml, name, v)?,
            }
        }
        xml.push_str("</doc>");
    }
    xml.push_str("</add>");
    Ok(xml)
}

fn push_field(xml: &mut String, name: &str, value: &Value) -> Result<()> {
    let text = match value {
        Value::Null => return Ok(()),
        Value::String(s) => escape(s.as_str()).into_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => {
            return Err(SolrError::Validation(format!(
                "field '{}' holds a nested value that XML updates cannot express",
                name
            )));
        }
    };
    let _ = write!(
        xml,
        r#"<field name="{}">{}</field>"#,
        escape(name),
        text
    );
    Ok(())
}

/// Build a delete-by-id message for one or more keys.
pub fn delete_by_id_xml<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut xml = String::from("<delete>");
    for id in ids {
        let _ = write!(xml, "<id>{}</id>", escape(id.as_ref()));
    }
    xml.push_str("</delete>");
    xml
}

/// Build a delete-by-query message.
pub fn delete_by_query_xml(query: &str) -> String {
    format!("<delete><query>{}</query></delete>", escape(query))
}

/// Build a `<commit />` message; `waitFlush` only goes to pre-4.0 servers.
pub fn commit_xml(options: &CommitOptions, version: ProtocolVersion) -> String {
    let mut xml = String::from("<commit ");
    if version.supports_wait_flush() {
        let _ = write!(xml, r#"waitFlush="{}" "#, options.wait_flush);
    }
    let _ = write!(xml, r#"waitSearcher="{}" "#, options.wait_searcher);
    let _ = write!(xml, r#"expungeDeletes="{}" "#, options.expunge_deletes);
    xml.push_str("/>");
    xml
}

/// Build an `<optimize />` message; `waitFlush` only goes to pre-4.0 servers.
pub fn optimize_xml(options: &OptimizeOptions, version: ProtocolVersion) -> String {
    let mut xml = String::from("<optimize ");
    if version.supports_wait_flush() {
        let _ = write!(xml, r#"waitFlush="{}" "#, options.wait_flush);
    }
    let _ = write!(xml, r#"waitSearcher="{}" "#, options.wait_searcher);
    let _ = write!(xml, r#"maxSegments="{}" "#, options.max_segments);
    xml.push_str("/>");
    xml
}

/// Build a `<rollback />` message.
pub fn rollback_xml() -> String {
    "<rollback />".to_string()
}

/// A parsed `<add>` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddMessage {
    /// `overwrite` attribute.
    #[serde(rename = "@overwrite", default = "default_overwrite")]
    pub overwrite: bool,
    /// Documents in order.
    #[serde(rename = "doc", default)]
    pub docs: Vec<AddDoc>,
}

/// One `<doc>` of an add message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddDoc {
    /// Fields in order; multi-valued fields appear once per value.
    #[serde(rename = "field", default)]
    pub fields: Vec<AddField>,
}

/// One `<field>` element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddField {
    /// Field name.
    #[serde(rename = "@name")]
    pub name: String,
    /// Unescaped text.
    #[serde(rename = "$text", default)]
    pub value: String,
}

fn default_overwrite() -> bool {
    true
}

/// Parse an `<add>` message back into its documents.
pub fn parse_add_xml(xml: &str) -> Result<AddMessage> {
    quick_xml::de::from_str(xml).map_err(|e| SolrError::Xml(e.to_string()))
}

/// Serialize documents for `update/json`.
pub fn json_body(documents: &[Document]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(documents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(raw: Value) -> Vec<Document> {
        raw.as_array()
            .unwrap()
            .iter()
            .map(|d| d.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_add_xml() {
        let xml = add_xml(&docs(json!([{ "id": 1, "title": "Solr & Lucene" }])), true).unwrap();
        assert_eq!(
            xml,
            r#"<add overwrite="true"><doc><field name="id">1</field><field name="title">Solr &amp; Lucene</field></doc></add>"#
        );
    }

    #[test]
    fn test_multi_valued_fields_repeat() {
        let xml = add_xml(&docs(json!([{ "tag": ["a", "b<c"], "flag": false }])), false).unwrap();
        assert_eq!(
            xml,
            r#"<add overwrite="false"><doc><field name="tag">a</field><field name="tag">b&lt;c</field><field name="flag">false</field></doc></add>"#
        );
    }

    #[test]
    fn test_nulls_skipped_objects_rejected() {
        let xml = add_xml(&docs(json!([{ "id": "x", "gone": null }])), true).unwrap();
        assert!(!xml.contains("gone"));

        let err = add_xml(&docs(json!([{ "id": "x", "nested": { "set": 1 } }])), true).unwrap_err();
        assert!(matches!(err, SolrError::Validation(_)));
    }

    #[test]
    fn test_round_trip_through_parser() {
        let original = docs(json!([
            { "id": "1", "title": "Tom & Jerry <3", "cat": ["cartoon", "classic"] },
            { "id": "2", "price": 9.5 }
        ]));
        let parsed = parse_add_xml(&add_xml(&original, true).unwrap()).unwrap();

        assert!(parsed.overwrite);
        assert_eq!(parsed.docs.len(), 2);
        let first: Vec<(&str, &str)> = parsed.docs[0]
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            first,
            vec![
                ("id", "1"),
                ("title", "Tom & Jerry <3"),
                ("cat", "cartoon"),
                ("cat", "classic"),
            ]
        );
        assert_eq!(parsed.docs[1].fields[1].value, "9.5");
    }

    #[test]
    fn test_delete_messages() {
        assert_eq!(delete_by_id_xml(["42"]), "<delete><id>42</id></delete>");
        assert_eq!(
            delete_by_id_xml(vec!["a".to_string(), "b".to_string()]),
            "<delete><id>a</id><id>b</id></delete>"
        );
        assert_eq!(
            delete_by_query_xml("price:[* TO 5] && x<y"),
            "<delete><query>price:[* TO 5] &amp;&amp; x&lt;y</query></delete>"
        );
    }

    #[test]
    fn test_commit_xml_by_version() {
        let options = CommitOptions::default();
        assert_eq!(
            commit_xml(&options, ProtocolVersion::Solr3),
            r#"<commit waitFlush="true" waitSearcher="true" expungeDeletes="false" />"#
        );
        assert_eq!(
            commit_xml(&options, ProtocolVersion::Solr4),
            r#"<commit waitSearcher="true" expungeDeletes="false" />"#
        );
    }

    #[test]
    fn test_optimize_xml_by_version() {
        let options = OptimizeOptions {
            max_segments: 4,
            ..Default::default()
        };
        assert_eq!(
            optimize_xml(&options, ProtocolVersion::Solr1),
            r#"<optimize waitFlush="true" waitSearcher="true" maxSegments="4" />"#
        );
        assert_eq!(
            optimize_xml(&options, ProtocolVersion::Solr4),
            r#"<optimize waitSearcher="true" maxSegments="4" />"#
        );
        assert_eq!(rollback_xml(), "<rollback />");
    }

    #[test]
    fn test_json_body() {
        let body = json_body(&docs(json!([{ "id": 1 }]))).unwrap();
        assert_eq!(body, br#"[{"id":1}]"#.to_vec());
    }
}
