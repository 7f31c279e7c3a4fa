//! Decoded Solr replies.

use crate::error::{Result, SolrError};
use crate::facets::{FacetTable, parse_facets};
use crate::spellcheck::{self, SpellcheckResult};
use crate::transport::HttpResponse;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// A result document: field name -> value, in server order.
pub type Document = Map<String, Value>;

static ERROR_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<u>([^<]*)</u>").expect("error message pattern is valid")
});

/// One decoded HTTP exchange with Solr.
///
/// A body is either decoded as a structured JSON envelope (the section
/// fields below are populated from it) or treated as an opaque page, in
/// which case only [`error_message`](Self::error_message) may be set.
#[derive(Debug, Clone)]
pub struct SolrResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// URL the reply came from.
    pub url: Option<String>,
    /// Body exactly as received.
    pub raw_body: Bytes,
    /// Structured body, when it parsed as a JSON object.
    pub body: Option<Value>,
    /// `responseHeader.status` (0 means success).
    pub solr_status: Option<i64>,
    /// `responseHeader.QTime`.
    pub query_time_ms: Option<i64>,
    /// `response.numFound`.
    pub total_results: Option<u64>,
    /// `response.start`.
    pub start: Option<u64>,
    /// `response.maxScore`, when scores were requested.
    pub max_score: Option<f64>,
    /// `nextCursorMark`, when the request used `cursorMark`.
    pub next_cursor_mark: Option<String>,
    /// `response.docs`.
    pub documents: Option<Vec<Document>>,
    /// Decoded `facet_counts`.
    pub facets: Option<FacetTable>,
    /// `stats.stats_fields`.
    pub stats: Option<Map<String, Value>>,
    /// Decoded `spellcheck` section.
    pub spellcheck: Option<SpellcheckResult>,
    /// `highlighting`: document key -> field -> snippets.
    pub highlighting: Option<Map<String, Value>>,
    /// `moreLikeThis`: document key -> similar documents.
    pub more_like_this: Option<Map<String, Value>>,
    /// Message scraped from an unstructured (HTML) body.
    pub error_message: Option<String>,
}

impl SolrResponse {
    /// Decode a raw transport reply.
    ///
    /// Bodies that are not a JSON object never fail here; they produce a
    /// response with every structured field unset. A JSON object without a
    /// usable `responseHeader`, or with a section of the wrong shape, is a
    /// [`SolrError::MalformedResponse`].
    pub fn decode(http: HttpResponse) -> Result<Self> {
        let mut response = Self {
            status: http.status,
            headers: http.headers,
            url: http.url,
            raw_body: http.body,
            body: None,
            solr_status: None,
            query_time_ms: None,
            total_results: None,
            start: None,
            max_score: None,
            next_cursor_mark: None,
            documents: None,
            facets: None,
            stats: None,
            spellcheck: None,
            highlighting: None,
            more_like_this: None,
            error_message: None,
        };

        match serde_json::from_slice::<Value>(&response.raw_body) {
            Ok(Value::Object(envelope)) => {
                response.populate(&envelope)?;
                response.body = Some(Value::Object(envelope));
            }
            _ => {
                if !response.raw_body.is_empty() {
                    response.error_message = extract_error_message(&response.text());
                    warn!(
                        status = response.status.as_u16(),
                        message = ?response.error_message,
                        "Solr returned an unstructured body"
                    );
                }
            }
        }

        Ok(response)
    }

    fn populate(&mut self, envelope: &Map<String, Value>) -> Result<()> {
        let header = envelope
            .get("responseHeader")
            .and_then(Value::as_object)
            .ok_or_else(|| SolrError::malformed("missing responseHeader"))?;
        self.solr_status = Some(required_i64(header, "status", "responseHeader")?);
        self.query_time_ms = Some(required_i64(header, "QTime", "responseHeader")?);

        if let Some(result) = envelope.get("response") {
            let result = result
                .as_object()
                .ok_or_else(|| SolrError::malformed("response is not an object"))?;
            self.total_results = Some(required_u64(result, "numFound", "response")?);
            self.start = Some(required_u64(result, "start", "response")?);
            self.max_score = result.get("maxScore").and_then(Value::as_f64);

            let docs = result
                .get("docs")
                .and_then(Value::as_array)
                .ok_or_else(|| SolrError::malformed("response.docs is not a list"))?;
            let documents = docs
                .iter()
                .map(|doc| {
                    doc.as_object()
                        .cloned()
                        .ok_or_else(|| SolrError::malformed("document is not an object"))
                })
                .collect::<Result<Vec<_>>>()?;
            self.documents = Some(documents);
        }

        self.next_cursor_mark = envelope
            .get("nextCursorMark")
            .and_then(Value::as_str)
            .map(String::from);

        if let Some(raw) = envelope.get("facet_counts") {
            let raw = object(raw, "facet_counts")?;
            self.facets = Some(parse_facets(raw)?);
        }

        if let Some(raw) = envelope.get("stats") {
            let fields = object(raw, "stats")?
                .get("stats_fields")
                .ok_or_else(|| SolrError::malformed("stats section without stats_fields"))?;
            self.stats = Some(object(fields, "stats.stats_fields")?.clone());
        }

        if let Some(raw) = envelope.get("spellcheck") {
            self.spellcheck = Some(spellcheck::parse_section(object(raw, "spellcheck")?)?);
        }

        if let Some(raw) = envelope.get("highlighting") {
            self.highlighting = Some(object(raw, "highlighting")?.clone());
        }

        if let Some(raw) = envelope.get("moreLikeThis") {
            self.more_like_this = Some(object(raw, "moreLikeThis")?.clone());
        }

        Ok(())
    }

    /// Whether the body decoded as a structured envelope.
    pub fn is_structured(&self) -> bool {
        self.body.is_some()
    }

    /// HTTP 200 with a zero Solr status.
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK && self.solr_status == Some(0)
    }

    /// Body as text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw_body).into_owned()
    }

    /// Number of documents in this page (0 when the reply carried none).
    pub fn document_count(&self) -> usize {
        self.documents.as_ref().map_or(0, Vec::len)
    }

    /// Deserialize the documents into a typed structure.
    pub fn documents_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.documents
            .iter()
            .flatten()
            .map(|doc| Ok(serde_json::from_value(Value::Object(doc.clone()))?))
            .collect()
    }

    /// Highlight snippets for one document and field.
    pub fn highlights(&self, doc_key: &str, field: &str) -> Vec<String> {
        self.highlighting
            .as_ref()
            .and_then(|h| h.get(doc_key))
            .and_then(|d| d.get(field))
            .and_then(Value::as_array)
            .map(|snippets| {
                snippets
                    .iter()
                    .filter_map(|s| s.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Last `<u>...</u>` text of an HTML error page, if any.
pub fn extract_error_message(text: &str) -> Option<String> {
    ERROR_MESSAGE
        .captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SolrError::malformed(format!("{} is not an object", what)))
}

fn required_i64(map: &Map<String, Value>, key: &str, section: &str) -> Result<i64> {
    map.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| SolrError::malformed(format!("{}.{} missing or not an integer", section, key)))
}

fn required_u64(map: &Map<String, Value>, key: &str, section: &str) -> Result<u64> {
    map.get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| SolrError::malformed(format!("{}.{} missing or not an integer", section, key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn decode(status: u16, body: &str) -> Result<SolrResponse> {
        SolrResponse::decode(HttpResponse::new(
            StatusCode::from_u16(status).unwrap(),
            body.to_string(),
        ))
    }

    #[test]
    fn test_search_envelope() {
        let body = json!({
            "responseHeader": { "status": 0, "QTime": 3 },
            "response": {
                "numFound": 42, "start": 10,
                "docs": [ { "id": "1", "title": "a" }, { "id": "2", "title": "b" } ]
            }
        });
        let response = decode(200, &body.to_string()).unwrap();

        assert!(response.is_structured());
        assert!(response.is_success());
        assert_eq!(response.query_time_ms, Some(3));
        assert_eq!(response.total_results, Some(42));
        assert_eq!(response.start, Some(10));
        assert_eq!(response.document_count(), 2);
        assert!(response.total_results.unwrap() >= response.document_count() as u64);
        assert!(response.error_message.is_none());
        assert!(response.facets.is_none());
    }

    #[test]
    fn test_document_field_order_is_kept() {
        let body = r#"{"responseHeader":{"status":0,"QTime":1},
            "response":{"numFound":1,"start":0,"docs":[{"zeta":1,"alpha":2,"mid":3}]}}"#;
        let response = decode(200, body).unwrap();

        let fields: Vec<&str> = response.documents.as_ref().unwrap()[0]
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(fields, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_reply_without_response_section() {
        let response = decode(200, r#"{"responseHeader":{"status":0,"QTime":12}}"#).unwrap();

        assert!(response.is_structured());
        assert_eq!(response.solr_status, Some(0));
        assert!(response.total_results.is_none());
        assert!(response.start.is_none());
        assert!(response.documents.is_none());
    }

    #[test]
    fn test_missing_response_header_is_malformed() {
        let err = decode(200, r#"{"response":{"numFound":0,"start":0,"docs":[]}}"#).unwrap_err();
        assert!(matches!(err, SolrError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_qtime_is_malformed() {
        assert!(decode(200, r#"{"responseHeader":{"status":0}}"#).is_err());
    }

    #[test]
    fn test_html_error_page() {
        let body = "<html><head><title>Error 400</title></head><body>\
                    <h2>HTTP ERROR: 400</h2><p>Problem accessing /solr/select. Reason:\
                    <pre>undefined field</pre></p><u>Error: field not found</u></body></html>";
        let response = decode(400, body).unwrap();

        assert!(!response.is_structured());
        assert_eq!(response.error_message.as_deref(), Some("Error: field not found"));
        assert!(response.total_results.is_none());
        assert!(response.solr_status.is_none());
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_last_underlined_text_wins() {
        let body = "<u>first</u> ... <u>second</u>";
        assert_eq!(extract_error_message(body).as_deref(), Some("second"));
        assert_eq!(extract_error_message("<html>no marker</html>"), None);
    }

    #[test]
    fn test_empty_and_non_object_bodies_are_unstructured() {
        let empty = decode(500, "").unwrap();
        assert!(!empty.is_structured());
        assert!(empty.error_message.is_none());

        let list = decode(200, "[1, 2, 3]").unwrap();
        assert!(!list.is_structured());
        assert!(list.error_message.is_none());
    }

    #[test]
    fn test_optional_sections() {
        let body = json!({
            "responseHeader": { "status": 0, "QTime": 1 },
            "response": { "numFound": 1, "start": 0, "docs": [ { "id": "doc1" } ] },
            "facet_counts": {
                "facet_queries": {},
                "facet_fields": { "cat": ["electronics", 3, "memory", 1] }
            },
            "stats": { "stats_fields": { "price": { "min": 1.0, "max": 9.0 } } },
            "spellcheck": { "suggestions": ["correctlySpelled", true] },
            "highlighting": { "doc1": { "title": ["<em>solr</em> rocks"] } },
            "moreLikeThis": { "doc1": { "numFound": 0, "start": 0, "docs": [] } }
        });
        let response = decode(200, &body.to_string()).unwrap();

        let facets = response.facets.as_ref().unwrap();
        assert_eq!(facets.field("cat").unwrap().get_index(0), Some(("electronics", 3)));
        assert_eq!(response.stats.as_ref().unwrap()["price"]["max"], json!(9.0));
        assert_eq!(response.spellcheck.as_ref().unwrap().correctly_spelled(), Some(true));
        assert_eq!(
            response.highlights("doc1", "title"),
            vec!["<em>solr</em> rocks".to_string()]
        );
        assert!(response.more_like_this.as_ref().unwrap().contains_key("doc1"));
    }

    #[test]
    fn test_malformed_section_is_an_error() {
        let body = json!({
            "responseHeader": { "status": 0, "QTime": 1 },
            "facet_counts": { "facet_fields": { "cat": ["a", 1, "b"] } }
        });
        assert!(matches!(
            decode(200, &body.to_string()),
            Err(SolrError::MalformedResponse(_))
        ));

        let body = json!({ "responseHeader": { "status": 0, "QTime": 1 }, "stats": {} });
        assert!(decode(200, &body.to_string()).is_err());
    }

    #[test]
    fn test_solr_error_status_is_reported() {
        let body = json!({
            "responseHeader": { "status": 400, "QTime": 0 },
            "error": { "msg": "undefined field foo", "code": 400 }
        });
        let response = decode(400, &body.to_string()).unwrap();

        assert_eq!(response.solr_status, Some(400));
        assert!(!response.is_success());
        assert_eq!(response.body.as_ref().unwrap()["error"]["code"], json!(400));
    }

    #[test]
    fn test_documents_as() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Book {
            id: String,
            pages: u32,
        }

        let body = json!({
            "responseHeader": { "status": 0, "QTime": 1 },
            "response": { "numFound": 1, "start": 0, "docs": [ { "id": "b1", "pages": 320 } ] }
        });
        let response = decode(200, &body.to_string()).unwrap();
        let books: Vec<Book> = response.documents_as().unwrap();

        assert_eq!(
            books,
            vec![Book {
                id: "b1".into(),
                pages: 320
            }]
        );
    }

    #[test]
    fn test_cursor_mark_and_max_score() {
        let body = json!({
            "responseHeader": { "status": 0, "QTime": 1 },
            "response": { "numFound": 0, "start": 0, "maxScore": 1.5, "docs": [] },
            "nextCursorMark": "AoE/ZG9jMQ=="
        });
        let response = decode(200, &body.to_string()).unwrap();

        assert_eq!(response.max_score, Some(1.5));
        assert_eq!(response.next_cursor_mark.as_deref(), Some("AoE/ZG9jMQ=="));
    }
}
