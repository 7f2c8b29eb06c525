// src/stages/match_.rs
// $match: filter documents by a query map or an aggregation expression

use super::{stage, StageName};
use crate::error::{IronPipeError, Result};
use crate::expression::Expression;
use crate::node::{Body, Node, Term};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchOptions {
    /// Query-language filter, e.g. `{"status": "active"}`
    pub query: Option<Map<String, Value>>,
    /// Aggregation expression, wrapped into `{"$expr": ..}`
    pub expr: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Query(Map<String, Value>),
    Expr(Expression),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "MatchOptions")]
pub struct Match {
    filter: Filter,
}

impl StageName for Match {
    const NAME: &'static str = "match";
}

impl Match {
    /// Exactly one of `query` or `expr`
    pub fn new(options: MatchOptions) -> Result<Self> {
        let filter = match (options.query, options.expr) {
            (Some(query), None) => Filter::Query(query),
            (None, Some(expr)) => Filter::Expr(expr),
            (Some(_), Some(_)) => {
                return Err(IronPipeError::validation("$match accepts either query or expr, not both"))
            }
            (None, None) => return Err(IronPipeError::validation("$match requires query or expr")),
        };
        Ok(Match { filter })
    }

    /// `{"$match": query}`; a non-map query is rejected
    pub fn query(query: Value) -> Result<Self> {
        match query {
            Value::Object(query) => Ok(Match {
                filter: Filter::Query(query),
            }),
            other => Err(IronPipeError::validation(format!(
                "$match query must be a document, got {}",
                other
            ))),
        }
    }

    pub fn expr(expr: impl Into<Expression>) -> Self {
        Match {
            filter: Filter::Expr(expr.into()),
        }
    }
}

super::from_options!(Match, MatchOptions);

impl Node for Match {
    fn expression(&self) -> Term<'_> {
        let body = match &self.filter {
            Filter::Query(query) => Term::Value(Value::Object(query.clone())),
            Filter::Expr(expr) => Body::new().with_node("$expr", expr).into_term(),
        };
        stage(Self::NAME, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use serde_json::json;

    #[test]
    fn test_match_query() {
        let stage = Match::query(json!({"status": "active"})).unwrap();
        assert_eq!(stage.statement(), json!({"$match": {"status": "active"}}));
        assert!(Match::query(json!([1])).is_err());
    }

    #[test]
    fn test_match_expr() {
        let stage = Match::expr(ops::gt(ops::field("spent"), ops::field("budget")));
        assert_eq!(
            stage.statement(),
            json!({"$match": {"$expr": {"$gt": ["$spent", "$budget"]}}})
        );
    }

    #[test]
    fn test_match_requires_exactly_one() {
        assert!(Match::new(MatchOptions::default()).is_err());
        let both = MatchOptions {
            query: Some(Map::new()),
            expr: Some(Expression::from(true)),
        };
        assert!(Match::new(both).is_err());
    }

    #[test]
    fn test_match_rejects_unknown_options() {
        let result: std::result::Result<Match, _> =
            serde_json::from_value(json!({"query": {}, "where": 1}));
        assert!(result.is_err());
    }
}
