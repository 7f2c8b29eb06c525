// src/search/clauses.rs
// Leaf search operators (clauses) of $search / $searchMeta
//
// Clauses render without a `$` prefix: {"text": {"query": .., "path": ..}}.
// Unknown options are carried verbatim through `extra`.

use super::config::{validate_search_path, Fuzzy, Score};
use crate::error::{IronPipeError, Result};
use crate::node::{Body, Node, Term};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Append pass-through options after the recognised ones
fn with_extra<'a>(mut body: Body<'a>, extra: &'a Map<String, Value>) -> Body<'a> {
    for (key, value) in extra {
        body.insert(key, Term::Value(value.clone()));
    }
    body
}

fn validate_query(query: &Value, what: &str) -> Result<()> {
    let valid = match query {
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_string),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(IronPipeError::validation(format!(
            "{} query must be a non-empty string or list of strings, got {}",
            what, query
        )))
    }
}

fn validate_fuzzy(fuzzy: Option<&Fuzzy>) -> Result<()> {
    fuzzy.map_or(Ok(()), Fuzzy::validate)
}

// ============================================================================
// AUTOCOMPLETE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenOrder {
    Any,
    Sequential,
}

impl TokenOrder {
    fn as_str(&self) -> &'static str {
        match self {
            TokenOrder::Any => "any",
            TokenOrder::Sequential => "sequential",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteOptions {
    pub query: Value,
    pub path: Value,
    pub token_order: Option<TokenOrder>,
    pub fuzzy: Option<Fuzzy>,
    pub score: Option<Score>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `autocomplete`: search-as-you-type over a single field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "AutocompleteOptions")]
pub struct Autocomplete(AutocompleteOptions);

impl Autocomplete {
    pub const NAME: &'static str = "autocomplete";

    pub fn new(options: AutocompleteOptions) -> Result<Self> {
        validate_query(&options.query, Self::NAME)?;
        if !options.path.is_string() {
            return Err(IronPipeError::validation(format!(
                "autocomplete path must be a single field name, got {}",
                options.path
            )));
        }
        validate_search_path(&options.path, Self::NAME)?;
        validate_fuzzy(options.fuzzy.as_ref())?;
        Ok(Autocomplete(options))
    }

    pub fn options(&self) -> &AutocompleteOptions {
        &self.0
    }
}

impl TryFrom<AutocompleteOptions> for Autocomplete {
    type Error = IronPipeError;

    fn try_from(options: AutocompleteOptions) -> Result<Self> {
        Autocomplete::new(options)
    }
}

impl Node for Autocomplete {
    fn expression(&self) -> Term<'_> {
        let o = &self.0;
        let body = Body::new()
            .with_value("query", o.query.clone())
            .with_value("path", o.path.clone())
            .with_value_opt("tokenOrder", o.token_order.map(|order| order.as_str()))
            .with_node_opt("fuzzy", o.fuzzy.as_ref())
            .with_node_opt("score", o.score.as_ref());
        Term::keyed(Self::NAME, with_extra(body, &o.extra).into_term())
    }
}

// ============================================================================
// EQUALS / EXISTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualsOptions {
    pub path: Value,
    pub value: Value,
    pub score: Option<Score>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `equals`: exact match on booleans, numbers, dates, ids and strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "EqualsOptions")]
pub struct Equals(EqualsOptions);

impl Equals {
    pub const NAME: &'static str = "equals";

    pub fn new(options: EqualsOptions) -> Result<Self> {
        validate_search_path(&options.path, Self::NAME)?;
        if options.value.is_array() || options.value.is_null() {
            return Err(IronPipeError::validation(format!(
                "equals value must be a single non-null value, got {}",
                options.value
            )));
        }
        Ok(Equals(options))
    }

    pub fn field(path: &str, value: impl Into<Value>) -> Result<Self> {
        Equals::new(EqualsOptions {
            path: Value::from(path),
            value: value.into(),
            ..Default::default()
        })
    }

    pub fn options(&self) -> &EqualsOptions {
        &self.0
    }
}

impl TryFrom<EqualsOptions> for Equals {
    type Error = IronPipeError;

    fn try_from(options: EqualsOptions) -> Result<Self> {
        Equals::new(options)
    }
}

impl Node for Equals {
    fn expression(&self) -> Term<'_> {
        let o = &self.0;
        let body = Body::new()
            .with_value("path", o.path.clone())
            .with_value("value", o.value.clone())
            .with_node_opt("score", o.score.as_ref());
        Term::keyed(Self::NAME, with_extra(body, &o.extra).into_term())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistsOptions {
    pub path: Value,
    pub score: Option<Score>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `exists`: documents where the indexed field is present
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ExistsOptions")]
pub struct Exists(ExistsOptions);

impl Exists {
    pub const NAME: &'static str = "exists";

    pub fn new(options: ExistsOptions) -> Result<Self> {
        validate_search_path(&options.path, Self::NAME)?;
        Ok(Exists(options))
    }

    pub fn field(path: &str) -> Result<Self> {
        Exists::new(ExistsOptions {
            path: Value::from(path),
            ..Default::default()
        })
    }

    pub fn options(&self) -> &ExistsOptions {
        &self.0
    }
}

impl TryFrom<ExistsOptions> for Exists {
    type Error = IronPipeError;

    fn try_from(options: ExistsOptions) -> Result<Self> {
        Exists::new(options)
    }
}

impl Node for Exists {
    fn expression(&self) -> Term<'_> {
        let o = &self.0;
        let body = Body::new()
            .with_value("path", o.path.clone())
            .with_node_opt("score", o.score.as_ref());
        Term::keyed(Self::NAME, with_extra(body, &o.extra).into_term())
    }
}

// ============================================================================
// MORE LIKE THIS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoreLikeThisOptions {
    /// One document or a list of documents
    pub like: Value,
    pub score: Option<Score>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `moreLikeThis`: documents similar to the given ones
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "MoreLikeThisOptions")]
pub struct MoreLikeThis(MoreLikeThisOptions);

impl MoreLikeThis {
    pub const NAME: &'static str = "moreLikeThis";

    pub fn new(options: MoreLikeThisOptions) -> Result<Self> {
        let valid = match &options.like {
            Value::Object(doc) => !doc.is_empty(),
            Value::Array(docs) => !docs.is_empty() && docs.iter().all(Value::is_object),
            _ => false,
        };
        if !valid {
            return Err(IronPipeError::validation(format!(
                "moreLikeThis like must be a document or a non-empty list of documents, got {}",
                options.like
            )));
        }
        Ok(MoreLikeThis(options))
    }

    pub fn like(like: Value) -> Result<Self> {
        MoreLikeThis::new(MoreLikeThisOptions {
            like,
            ..Default::default()
        })
    }

    pub fn options(&self) -> &MoreLikeThisOptions {
        &self.0
    }
}

impl TryFrom<MoreLikeThisOptions> for MoreLikeThis {
    type Error = IronPipeError;

    fn try_from(options: MoreLikeThisOptions) -> Result<Self> {
        MoreLikeThis::new(options)
    }
}

impl Node for MoreLikeThis {
    fn expression(&self) -> Term<'_> {
        let o = &self.0;
        let body = Body::new()
            .with_value("like", o.like.clone())
            .with_node_opt("score", o.score.as_ref());
        Term::keyed(Self::NAME, with_extra(body, &o.extra).into_term())
    }
}

// ============================================================================
// RANGE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeOptions {
    pub path: Value,
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
    pub score: Option<Score>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `range`: numbers or dates between a lower and an upper bound
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RangeOptions")]
pub struct Range(RangeOptions);

impl Range {
    pub const NAME: &'static str = "range";

    /// Requires one of `gt`/`gte` and one of `lt`/`lte`
    pub fn new(options: RangeOptions) -> Result<Self> {
        validate_search_path(&options.path, Self::NAME)?;
        if options.gt.is_none() && options.gte.is_none() {
            return Err(IronPipeError::validation(
                "range requires a lower bound: one of gt or gte must be set",
            ));
        }
        if options.lt.is_none() && options.lte.is_none() {
            return Err(IronPipeError::validation(
                "range requires an upper bound: one of lt or lte must be set",
            ));
        }
        Ok(Range(options))
    }

    pub fn options(&self) -> &RangeOptions {
        &self.0
    }
}

impl TryFrom<RangeOptions> for Range {
    type Error = IronPipeError;

    fn try_from(options: RangeOptions) -> Result<Self> {
        Range::new(options)
    }
}

impl Node for Range {
    fn expression(&self) -> Term<'_> {
        let o = &self.0;
        let body = Body::new()
            .with_value("path", o.path.clone())
            .with_value_opt("gt", o.gt.clone())
            .with_value_opt("gte", o.gte.clone())
            .with_value_opt("lt", o.lt.clone())
            .with_value_opt("lte", o.lte.clone())
            .with_node_opt("score", o.score.as_ref());
        Term::keyed(Self::NAME, with_extra(body, &o.extra).into_term())
    }
}

// ============================================================================
// REGEX / WILDCARD
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternOptions {
    pub query: Value,
    pub path: Value,
    #[serde(default)]
    pub allow_analyzed_field: bool,
    pub score: Option<Score>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn pattern_body(o: &PatternOptions) -> Body<'_> {
    let body = Body::new()
        .with_value("query", o.query.clone())
        .with_value("path", o.path.clone())
        .with_value("allowAnalyzedField", o.allow_analyzed_field)
        .with_node_opt("score", o.score.as_ref());
    with_extra(body, &o.extra)
}

/// `regex`: regular-expression match on string fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "PatternOptions")]
pub struct Regex(PatternOptions);

impl Regex {
    pub const NAME: &'static str = "regex";

    pub fn new(options: PatternOptions) -> Result<Self> {
        validate_query(&options.query, Self::NAME)?;
        validate_search_path(&options.path, Self::NAME)?;
        Ok(Regex(options))
    }

    pub fn options(&self) -> &PatternOptions {
        &self.0
    }
}

impl TryFrom<PatternOptions> for Regex {
    type Error = IronPipeError;

    fn try_from(options: PatternOptions) -> Result<Self> {
        Regex::new(options)
    }
}

impl Node for Regex {
    fn expression(&self) -> Term<'_> {
        Term::keyed(Self::NAME, pattern_body(&self.0).into_term())
    }
}

/// `wildcard`: `*` and `?` patterns on string fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "PatternOptions")]
pub struct Wildcard(PatternOptions);

impl Wildcard {
    pub const NAME: &'static str = "wildcard";

    pub fn new(options: PatternOptions) -> Result<Self> {
        validate_query(&options.query, Self::NAME)?;
        validate_search_path(&options.path, Self::NAME)?;
        Ok(Wildcard(options))
    }

    pub fn options(&self) -> &PatternOptions {
        &self.0
    }
}

impl TryFrom<PatternOptions> for Wildcard {
    type Error = IronPipeError;

    fn try_from(options: PatternOptions) -> Result<Self> {
        Wildcard::new(options)
    }
}

impl Node for Wildcard {
    fn expression(&self) -> Term<'_> {
        Term::keyed(Self::NAME, pattern_body(&self.0).into_term())
    }
}

// ============================================================================
// TEXT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    pub query: Value,
    pub path: Value,
    pub fuzzy: Option<Fuzzy>,
    pub score: Option<Score>,
    /// Name of a synonym mapping; excludes `fuzzy`
    pub synonyms: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `text`: analyzed full-text match
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "TextOptions")]
pub struct Text(TextOptions);

impl Text {
    pub const NAME: &'static str = "text";

    pub fn new(options: TextOptions) -> Result<Self> {
        validate_query(&options.query, Self::NAME)?;
        validate_search_path(&options.path, Self::NAME)?;
        validate_fuzzy(options.fuzzy.as_ref())?;
        if options.fuzzy.is_some() && options.synonyms.is_some() {
            return Err(IronPipeError::validation(
                "text accepts either fuzzy or synonyms, not both",
            ));
        }
        Ok(Text(options))
    }

    /// Plain `{"query": query, "path": path}` clause
    pub fn query(query: impl Into<Value>, path: impl Into<Value>) -> Result<Self> {
        Text::new(TextOptions {
            query: query.into(),
            path: path.into(),
            ..Default::default()
        })
    }

    pub fn options(&self) -> &TextOptions {
        &self.0
    }
}

impl TryFrom<TextOptions> for Text {
    type Error = IronPipeError;

    fn try_from(options: TextOptions) -> Result<Self> {
        Text::new(options)
    }
}

impl Node for Text {
    fn expression(&self) -> Term<'_> {
        let o = &self.0;
        let body = Body::new()
            .with_value("query", o.query.clone())
            .with_value("path", o.path.clone())
            .with_node_opt("fuzzy", o.fuzzy.as_ref())
            .with_node_opt("score", o.score.as_ref())
            .with_value_opt("synonyms", o.synonyms.as_deref());
        Term::keyed(Self::NAME, with_extra(body, &o.extra).into_term())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========== Range tests ==========

    #[test]
    fn test_range_requires_lower_bound() {
        let err = Range::new(RangeOptions {
            path: json!("year"),
            lt: Some(json!(2000)),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, IronPipeError::Validation(_)));
        assert!(err.to_string().contains("gt or gte"));
    }

    #[test]
    fn test_range_requires_upper_bound() {
        let err = Range::new(RangeOptions {
            path: json!("year"),
            gte: Some(json!(1990)),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("lt or lte"));
    }

    #[test]
    fn test_range_renders_set_bounds_only() {
        let range = Range::new(RangeOptions {
            path: json!("year"),
            gte: Some(json!(1990)),
            lt: Some(json!(2000)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            range.statement(),
            json!({"range": {"path": "year", "gte": 1990, "lt": 2000}})
        );
    }

    #[test]
    fn test_range_deserialize_validates() {
        let result: std::result::Result<Range, _> =
            serde_json::from_value(json!({"path": "year", "gt": 1}));
        assert!(result.is_err());
    }

    // ========== Text tests ==========

    #[test]
    fn test_text_minimal() {
        assert_eq!(
            Text::query("baseball", "plot").unwrap().statement(),
            json!({"text": {"query": "baseball", "path": "plot"}})
        );
    }

    #[test]
    fn test_text_fuzzy_and_synonyms_conflict() {
        let result = Text::new(TextOptions {
            query: json!("car"),
            path: json!("title"),
            fuzzy: Some(Fuzzy::default()),
            synonyms: Some("transport".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_text_passes_extra_options_through() {
        let text: Text = serde_json::from_value(json!({
            "query": "space",
            "path": ["title", "plot"],
            "matchCriteria": "any"
        }))
        .unwrap();
        assert_eq!(
            text.statement(),
            json!({"text": {"query": "space", "path": ["title", "plot"], "matchCriteria": "any"}})
        );
    }

    #[test]
    fn test_text_empty_query_fails() {
        assert!(Text::query("", "title").is_err());
    }

    // ========== Other clauses ==========

    #[test]
    fn test_autocomplete() {
        let clause = Autocomplete::new(AutocompleteOptions {
            query: json!("off"),
            path: json!("title"),
            token_order: Some(TokenOrder::Sequential),
            fuzzy: Some(Fuzzy::default()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            clause.statement(),
            json!({"autocomplete": {
                "query": "off",
                "path": "title",
                "tokenOrder": "sequential",
                "fuzzy": {"maxEdits": 2, "prefixLength": 0, "maxExpansions": 50}
            }})
        );
        assert!(Autocomplete::new(AutocompleteOptions {
            query: json!("off"),
            path: json!(["a", "b"]),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_equals_and_exists() {
        assert_eq!(
            Equals::field("verified", true).unwrap().statement(),
            json!({"equals": {"path": "verified", "value": true}})
        );
        assert!(Equals::field("verified", Value::Null).is_err());
        assert_eq!(
            Exists::field("awards").unwrap().statement(),
            json!({"exists": {"path": "awards"}})
        );
    }

    #[test]
    fn test_more_like_this() {
        let clause = MoreLikeThis::like(json!({"title": "The Godfather"})).unwrap();
        assert_eq!(
            clause.statement(),
            json!({"moreLikeThis": {"like": {"title": "The Godfather"}}})
        );
        assert!(MoreLikeThis::like(json!([])).is_err());
        assert!(MoreLikeThis::like(json!("text")).is_err());
    }

    #[test]
    fn test_regex_and_wildcard() {
        let options = PatternOptions {
            query: json!("(.*) Seattle"),
            path: json!("title"),
            ..Default::default()
        };
        assert_eq!(
            Regex::new(options.clone()).unwrap().statement(),
            json!({"regex": {"query": "(.*) Seattle", "path": "title", "allowAnalyzedField": false}})
        );
        assert_eq!(
            Wildcard::new(options).unwrap().statement(),
            json!({"wildcard": {"query": "(.*) Seattle", "path": "title", "allowAnalyzedField": false}})
        );
    }
}
