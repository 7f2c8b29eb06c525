// src/search/config.rs
// Option records shared by search stages and search operators

use crate::error::{IronPipeError, Result};
use crate::node::{Body, Node, Term};
use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// FUZZY / SCORE
// ============================================================================

/// Typo tolerance for `text` and `autocomplete`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Fuzzy {
    /// 1 or 2
    pub max_edits: u8,
    pub prefix_length: u32,
    pub max_expansions: u32,
}

impl Default for Fuzzy {
    fn default() -> Self {
        Fuzzy {
            max_edits: 2,
            prefix_length: 0,
            max_expansions: 50,
        }
    }
}

impl Fuzzy {
    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.max_edits) {
            return Err(IronPipeError::validation(format!(
                "fuzzy maxEdits must be 1 or 2, got {}",
                self.max_edits
            )));
        }
        Ok(())
    }
}

impl Node for Fuzzy {
    fn expression(&self) -> Term<'_> {
        Body::new()
            .with_value("maxEdits", self.max_edits)
            .with_value("prefixLength", self.prefix_length)
            .with_value("maxExpansions", self.max_expansions)
            .into_term()
    }
}

/// Score modifier, exactly one of boost, constant or function
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Score {
    /// `{"value": 2}` or `{"path": "rating"}`
    Boost(Value),
    /// `{"value": 1}`
    Constant(Value),
    /// Arbitrary score function expression
    Function(Value),
}

impl Score {
    pub fn boost(value: f64) -> Self {
        Score::Boost(serde_json::json!({ "value": value }))
    }

    pub fn constant(value: f64) -> Self {
        Score::Constant(serde_json::json!({ "value": value }))
    }
}

impl Node for Score {
    fn expression(&self) -> Term<'_> {
        match self {
            Score::Boost(body) => Term::keyed("boost", Term::Value(body.clone())),
            Score::Constant(body) => Term::keyed("constant", Term::Value(body.clone())),
            Score::Function(body) => Term::keyed("function", Term::Value(body.clone())),
        }
    }
}

// ============================================================================
// COUNT / HIGHLIGHT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CountType {
    #[default]
    LowerBound,
    Total,
}

impl CountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountType::LowerBound => "lowerBound",
            CountType::Total => "total",
        }
    }
}

/// `count` option of `$search` / `$searchMeta`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CountOptions {
    #[serde(rename = "type", default)]
    pub type_: CountType,
    pub threshold: Option<u64>,
}

impl Node for CountOptions {
    fn expression(&self) -> Term<'_> {
        Body::new()
            .with_value("type", self.type_.as_str())
            .with_value_opt("threshold", self.threshold)
            .into_term()
    }
}

/// `highlight` option of `$search`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HighlightOptions {
    pub path: Value,
    pub max_chars_to_examine: Option<u64>,
    pub max_num_passages: Option<u64>,
}

impl HighlightOptions {
    pub fn new(path: impl Into<Value>) -> Self {
        HighlightOptions {
            path: path.into(),
            max_chars_to_examine: None,
            max_num_passages: None,
        }
    }
}

impl Node for HighlightOptions {
    fn expression(&self) -> Term<'_> {
        Body::new()
            .with_value("path", self.path.clone())
            .with_value_opt("maxCharsToExamine", self.max_chars_to_examine)
            .with_value_opt("maxNumPassages", self.max_num_passages)
            .into_term()
    }
}

// ============================================================================
// SEARCH CONFIG
// ============================================================================

pub const DEFAULT_INDEX: &str = "default";

/// Settings shared by `$search` and `$searchMeta`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub index: String,
    pub count: Option<CountOptions>,
    pub highlight: Option<HighlightOptions>,
    pub return_stored_source: bool,
    pub score_details: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            index: DEFAULT_INDEX.to_string(),
            count: None,
            highlight: None,
            return_stored_source: false,
            score_details: false,
        }
    }
}

impl SearchConfig {
    /// `{index, highlight?, count?, returnStoredSource, scoreDetails}`
    pub(crate) fn body(&self) -> Body<'_> {
        Body::new()
            .with_value("index", self.index.as_str())
            .with_node_opt("highlight", self.highlight.as_ref())
            .with_node_opt("count", self.count.as_ref())
            .with_value("returnStoredSource", self.return_stored_source)
            .with_value("scoreDetails", self.score_details)
    }
}

/// A search path is a field name, a list of field names, or a
/// `{"wildcard": ..}` / `{"value": .., "multi": ..}` object
pub(crate) fn validate_search_path(path: &Value, what: &str) -> Result<()> {
    let valid = match path {
        Value::String(field) => !field.is_empty() && !field.starts_with('$'),
        Value::Array(fields) => {
            !fields.is_empty() && fields.iter().all(|field| validate_search_path(field, what).is_ok())
        }
        Value::Object(spec) => spec.contains_key("wildcard") || spec.contains_key("value"),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(IronPipeError::validation(format!(
            "{} path must be a field name, a list of field names or a path object, got {}",
            what, path
        )))
    }
}
