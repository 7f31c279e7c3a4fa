//! Query parameters and the wire-parameter builder.
//!
//! Parameter names are passed through verbatim; Solr is the authority on
//! which ones exist. The builder only enforces the mandatory `q`, renders
//! values the way Solr expects them and pins the response format.

use crate::error::{Result, SolrError};
use crate::util::to_iso8601;
use crate::version::ProtocolVersion;
use chrono::{DateTime, TimeZone};

/// Name of the parameter carrying the response format.
pub const RESPONSE_FORMAT_PARAM: &str = "wt";

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Text value.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value, rendered as `true`/`false`.
    Bool(bool),
    /// Multi-valued parameter, rendered as one repeated key per entry.
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Render to wire pairs under `key`.
    fn push_wire(&self, key: &str, out: &mut Vec<(String, String)>) {
        match self {
            ParamValue::Text(s) => out.push((key.to_string(), s.clone())),
            ParamValue::Int(i) => out.push((key.to_string(), i.to_string())),
            ParamValue::Float(f) => out.push((key.to_string(), f.to_string())),
            ParamValue::Bool(b) => {
                out.push((key.to_string(), if *b { "true" } else { "false" }.to_string()))
            }
            ParamValue::List(values) => {
                for value in values {
                    value.push_wire(key, out);
                }
            }
        }
    }

    /// Interpret the value as a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::Int(i) => u64::try_from(*i).ok(),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(ParamValue::Int)
            .unwrap_or_else(|_| ParamValue::Text(value.to_string()))
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::from(value as u64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ParamValue {
    fn from(value: DateTime<Tz>) -> Self {
        ParamValue::Text(to_iso8601(&value))
    }
}

/// Ordered set of named query options.
///
/// ```
/// use armature_solr::QueryParams;
///
/// let params = QueryParams::query("title:rust")
///     .set("facet", true)
///     .set("facet.field", vec!["category", "author"])
///     .add("fq", "year:[2020 TO *]")
///     .rows(20);
///
/// assert_eq!(params.len(), 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    params: Vec<(String, ParamValue)>,
}

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parameter set with the given `q`.
    pub fn query(q: impl Into<String>) -> Self {
        let q: String = q.into();
        Self::new().set("q", q)
    }

    /// Set a parameter, replacing any previous value(s) for the same key.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Append a value for a key without replacing existing ones.
    pub fn add(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Set a parameter in place, replacing any previous value(s).
    ///
    /// The parameter keeps the position of its first occurrence.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter().position(|(k, _)| *k == key) {
            Some(pos) => {
                self.params[pos].1 = value;
                let mut index = 0;
                self.params.retain(|(k, _)| {
                    let keep = index <= pos || *k != key;
                    index += 1;
                    keep
                });
            }
            None => self.params.push((key, value)),
        }
    }

    /// Remove every value for a key, returning the first one.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let first = self.get(key).cloned();
        self.params.retain(|(k, _)| k != key);
        first
    }

    /// First value for a key.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set the page size.
    pub fn rows(self, rows: u64) -> Self {
        self.set("rows", rows)
    }

    /// Set the result offset.
    pub fn start(self, start: u64) -> Self {
        self.set("start", start)
    }

    /// Add a filter query.
    pub fn filter(self, fq: impl Into<String>) -> Self {
        self.add("fq", fq.into())
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(QueryParams::new(), |params, (k, v)| params.add(k, v))
    }
}

/// Flatten query options into wire parameters.
///
/// Fails with [`SolrError::InvalidQuery`] when `q` is missing. Booleans become
/// `"true"`/`"false"`, lists become repeated keys and the response format is
/// forced to the one the protocol version expects, overwriting any caller
/// value.
pub fn build_request(
    params: &QueryParams,
    version: ProtocolVersion,
) -> Result<Vec<(String, String)>> {
    if !params.contains("q") {
        return Err(SolrError::InvalidQuery(
            "missing mandatory parameter 'q'".to_string(),
        ));
    }
    Ok(encode_params(params, version))
}

/// Same as [`build_request`] without the `q` requirement.
pub(crate) fn encode_params(
    params: &QueryParams,
    version: ProtocolVersion,
) -> Vec<(String, String)> {
    let mut wire = Vec::with_capacity(params.len() + 1);
    for (key, value) in params.iter() {
        if key != RESPONSE_FORMAT_PARAM {
            value.push_wire(key, &mut wire);
        }
    }
    wire.push((
        RESPONSE_FORMAT_PARAM.to_string(),
        version.response_format().to_string(),
    ));
    wire
}
