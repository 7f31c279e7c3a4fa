//! Facet section decoding.
//!
//! Solr's JSON writer renders named lists as flat `[label, count, ...]`
//! arrays by default. Bucket order carries meaning (`facet.sort`), so every
//! map here preserves the order the server used.

use crate::error::{Result, SolrError};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Ordered label -> count buckets of one facet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetBuckets {
    counts: IndexMap<String, u64>,
    missing: Option<u64>,
}

impl FacetBuckets {
    /// Count for a label.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.counts.get(label).copied()
    }

    /// Count of documents without a value (`facet.missing=true`).
    pub fn missing(&self) -> Option<u64> {
        self.missing
    }

    /// Iterate buckets in server order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Bucket at a position.
    pub fn get_index(&self, index: usize) -> Option<(&str, u64)> {
        self.counts.get_index(index).map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of labelled buckets.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether there are no labelled buckets.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Underlying ordered map.
    pub fn as_map(&self) -> &IndexMap<String, u64> {
        &self.counts
    }
}

/// Decoded value of one named facet.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetValue {
    /// Label/count pairs (field, date and query facets).
    Buckets(FacetBuckets),
    /// Keyed entries copied in order (range facets, intervals, heatmaps).
    Entries(IndexMap<String, Value>),
    /// Single count (one `facet.query`).
    Count(u64),
    /// Pivot tree, kept as returned.
    Pivot(Vec<Value>),
}

impl FacetValue {
    /// Buckets, if this facet decoded to label/count pairs.
    pub fn as_buckets(&self) -> Option<&FacetBuckets> {
        match self {
            FacetValue::Buckets(b) => Some(b),
            _ => None,
        }
    }

    /// Keyed entries, if any.
    pub fn as_entries(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            FacetValue::Entries(e) => Some(e),
            _ => None,
        }
    }

    /// Scalar count, if any.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            FacetValue::Count(c) => Some(*c),
            _ => None,
        }
    }

    /// Pivot tree, if any.
    pub fn as_pivot(&self) -> Option<&[Value]> {
        match self {
            FacetValue::Pivot(p) => Some(p),
            _ => None,
        }
    }
}

/// Facets grouped by category (`facet_fields`, `facet_queries`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetTable {
    categories: IndexMap<String, IndexMap<String, FacetValue>>,
}

impl FacetTable {
    /// All facets of one category.
    pub fn category(&self, name: &str) -> Option<&IndexMap<String, FacetValue>> {
        self.categories.get(name)
    }

    /// One facet by category and name.
    pub fn get(&self, category: &str, name: &str) -> Option<&FacetValue> {
        self.categories.get(category).and_then(|c| c.get(name))
    }

    /// Buckets of a field facet.
    pub fn field(&self, name: &str) -> Option<&FacetBuckets> {
        self.get("facet_fields", name).and_then(FacetValue::as_buckets)
    }

    /// Count of a facet query.
    pub fn query(&self, query: &str) -> Option<u64> {
        self.get("facet_queries", query).and_then(FacetValue::as_count)
    }

    /// Entries of a range facet.
    pub fn range(&self, name: &str) -> Option<&IndexMap<String, Value>> {
        self.get("facet_ranges", name).and_then(FacetValue::as_entries)
    }

    /// Pivot tree for a pivot specification (e.g. `"cat,author"`).
    pub fn pivot(&self, name: &str) -> Option<&[Value]> {
        self.get(PIVOT_CATEGORY, name).and_then(FacetValue::as_pivot)
    }

    /// Iterate categories in server order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, FacetValue>)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no categories were returned.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Decode the `facet_counts` section.
pub fn parse_facets(raw: &Map<String, Value>) -> Result<FacetTable> {
    let mut categories = IndexMap::with_capacity(raw.len());

    for (category, facets) in raw {
        let facets = facets.as_object().ok_or_else(|| {
            SolrError::malformed(format!("facet category '{}' is not an object", category))
        })?;

        let mut decoded = IndexMap::with_capacity(facets.len());
        for (name, facet) in facets {
            let value = parse_facet(category, facet)
                .map_err(|e| SolrError::malformed(format!("facet '{}/{}': {}", category, name, e)))?;
            decoded.insert(name.clone(), value);
        }
        categories.insert(category.clone(), decoded);
    }

    Ok(FacetTable { categories })
}

/// Category whose facets are pivot trees.
const PIVOT_CATEGORY: &str = "facet_pivot";

fn parse_facet(category: &str, raw: &Value) -> std::result::Result<FacetValue, String> {
    match raw {
        Value::Array(items) if category == PIVOT_CATEGORY => Ok(FacetValue::Pivot(items.clone())),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            Ok(FacetValue::Pivot(items.clone()))
        }
        Value::Array(items) => parse_flat(items),
        Value::Object(map) => Ok(FacetValue::Entries(
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )),
        Value::Number(n) => n
            .as_u64()
            .map(FacetValue::Count)
            .ok_or_else(|| format!("count {} is not a non-negative integer", n)),
        other => Err(format!("unexpected facet value {}", other)),
    }
}

fn parse_flat(items: &[Value]) -> std::result::Result<FacetValue, String> {
    if items.len() % 2 != 0 {
        return Err(format!("odd-length flat list ({} items)", items.len()));
    }

    if items.chunks(2).all(|pair| pair[1].as_u64().is_some()) {
        let mut buckets = FacetBuckets::default();
        for pair in items.chunks(2) {
            let count = pair[1].as_u64().unwrap_or_default();
            match label(&pair[0])? {
                Some(label) => {
                    buckets.counts.insert(label, count);
                }
                None => buckets.missing = Some(count),
            }
        }
        return Ok(FacetValue::Buckets(buckets));
    }

    let mut entries = IndexMap::with_capacity(items.len() / 2);
    for pair in items.chunks(2) {
        let key = label(&pair[0])?.ok_or_else(|| "null key in keyed list".to_string())?;
        entries.insert(key, pair[1].clone());
    }
    Ok(FacetValue::Entries(entries))
}

fn label(raw: &Value) -> std::result::Result<Option<String>, String> {
    match raw {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Null => Ok(None),
        other => Err(format!("unexpected bucket label {}", other)),
    }
}
