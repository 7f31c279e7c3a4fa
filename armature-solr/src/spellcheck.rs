//! Spellcheck section decoding.

use crate::error::{Result, SolrError};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Key under which suggestions appear in [`SpellcheckResult::to_value`].
pub const SUGGESTIONS_KEY: &str = "suggestions";

/// Spellcheck metadata plus per-term suggestions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpellcheckResult {
    /// Non-suggestion entries such as `correctlySpelled` or `collation`.
    pub metadata: IndexMap<String, Value>,
    /// Term -> correction record.
    pub suggestions: IndexMap<String, Map<String, Value>>,
}

impl SpellcheckResult {
    /// Whether the server considered the query correctly spelled.
    pub fn correctly_spelled(&self) -> Option<bool> {
        self.metadata.get("correctlySpelled").and_then(Value::as_bool)
    }

    /// Correction record for one term.
    pub fn suggestion(&self, term: &str) -> Option<&Map<String, Value>> {
        self.suggestions.get(term)
    }

    /// Candidate words proposed for a term.
    ///
    /// Handles both plain strings and `{"word": .., "freq": ..}` records
    /// (`spellcheck.extendedResults=true`).
    pub fn alternatives(&self, term: &str) -> Vec<String> {
        self.suggestion(term)
            .and_then(|record| record.get("suggestion"))
            .and_then(Value::as_array)
            .map(|candidates| {
                candidates
                    .iter()
                    .filter_map(|c| match c {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(o) => o.get("word").and_then(Value::as_str).map(String::from),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render as one mapping with suggestions nested under `"suggestions"`.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        for (key, value) in &self.metadata {
            out.insert(key.clone(), value.clone());
        }
        let suggestions: Map<String, Value> = self
            .suggestions
            .iter()
            .map(|(k, v)| (k.clone(), Value::Object(v.clone())))
            .collect();
        out.insert(SUGGESTIONS_KEY.to_string(), Value::Object(suggestions));
        Value::Object(out)
    }

    fn file(&mut self, key: String, value: &Value) {
        match value {
            Value::Object(record) => {
                self.suggestions.insert(key, record.clone());
            }
            other => {
                self.metadata.insert(key, other.clone());
            }
        }
    }
}

/// Split a flat `[key, value, ...]` list into metadata and suggestions.
///
/// Mapping values are correction records; anything else is metadata.
pub fn parse_spellcheck(items: &[Value]) -> Result<SpellcheckResult> {
    if items.len() % 2 != 0 {
        return Err(SolrError::malformed(format!(
            "odd-length spellcheck list ({} items)",
            items.len()
        )));
    }

    let mut result = SpellcheckResult::default();
    for pair in items.chunks(2) {
        let key = pair[0].as_str().ok_or_else(|| {
            SolrError::malformed(format!("spellcheck key {} is not a string", pair[0]))
        })?;
        result.file(key.to_string(), &pair[1]);
    }
    Ok(result)
}

/// Decode a whole `spellcheck` section.
///
/// `suggestions` may be a flat list or a keyed map. Other keys of the
/// section (newer servers put `correctlySpelled` and `collations` there)
/// are folded into the metadata.
pub(crate) fn parse_section(section: &Map<String, Value>) -> Result<SpellcheckResult> {
    let mut result = match section.get(SUGGESTIONS_KEY) {
        Some(Value::Array(items)) => parse_spellcheck(items)?,
        Some(Value::Object(map)) => {
            let mut result = SpellcheckResult::default();
            for (key, value) in map {
                result.file(key.clone(), value);
            }
            result
        }
        Some(other) => {
            return Err(SolrError::malformed(format!(
                "spellcheck.suggestions has unexpected shape: {}",
                other
            )));
        }
        None => return Err(SolrError::malformed("spellcheck section without suggestions")),
    };

    for (key, value) in section {
        if key != SUGGESTIONS_KEY {
            result.metadata.insert(key.clone(), value.clone());
        }
    }
    Ok(result)
}
