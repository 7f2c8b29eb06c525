// src/stages/group.rs
// $group and $sortByCount

use super::{stage, StageName};
use crate::error::{IronPipeError, Result};
use crate::expression::{Expression, ExpressionMap};
use crate::fields::{validate_field_name, validate_field_path};
use crate::node::{Node, Term};
use serde::Deserialize;

/// Grouping key given by name(s) or as an expression
///
/// Names get their `$` added; a list of names becomes `{name: "$name", ..}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Field(String),
    Fields(Vec<String>),
    Expression(Expression),
}

impl GroupKey {
    fn validate(&self) -> Result<()> {
        match self {
            GroupKey::Field(name) => validate_field_path(name, "group key"),
            GroupKey::Fields(names) => names
                .iter()
                .try_for_each(|name| validate_field_path(name, "group key")),
            GroupKey::Expression(_) => Ok(()),
        }
    }

    fn into_expression(self) -> Expression {
        match self {
            GroupKey::Field(name) => Expression::field(&name),
            GroupKey::Fields(names) => Expression::object(names.iter().map(|name| {
                let key = name.trim_start_matches('$').to_string();
                (key, Expression::field(name))
            })),
            GroupKey::Expression(expr) => expr,
        }
    }
}

impl From<&str> for GroupKey {
    fn from(name: &str) -> Self {
        GroupKey::Field(name.to_string())
    }
}

impl From<Vec<&str>> for GroupKey {
    fn from(names: Vec<&str>) -> Self {
        GroupKey::Fields(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Expression> for GroupKey {
    fn from(expr: Expression) -> Self {
        GroupKey::Expression(expr)
    }
}

// ============================================================================
// GROUP
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupOptions {
    /// Source of `_id` when `query` has none
    pub by: Option<GroupKey>,
    /// `_id` and accumulator fields
    pub query: Option<ExpressionMap>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "GroupOptions")]
pub struct Group {
    query: ExpressionMap,
}

impl StageName for Group {
    const NAME: &'static str = "group";
}

impl Group {
    /// `_id` comes from `query` if present, otherwise from `by` (null when absent)
    pub fn new(options: GroupOptions) -> Result<Self> {
        let mut query = options.query.unwrap_or_default();
        for key in query.keys() {
            if key != "_id" {
                validate_field_name(key, "group output field")?;
            }
        }
        if !query.contains_key("_id") {
            let id = match options.by {
                Some(by) => {
                    by.validate()?;
                    by.into_expression()
                }
                None => Expression::null(),
            };
            query.prepend("_id", id);
        }
        Ok(Group { query })
    }

    pub fn by(key: impl Into<GroupKey>) -> Result<Self> {
        Group::new(GroupOptions {
            by: Some(key.into()),
            query: None,
        })
    }

    /// Add an accumulator output field
    pub fn with(mut self, field: &str, accumulator: impl Into<Expression>) -> Result<Self> {
        validate_field_name(field, "group output field")?;
        self.query.insert(field, accumulator);
        Ok(self)
    }

    pub fn id(&self) -> Option<&Expression> {
        self.query.get("_id")
    }
}

super::from_options!(Group, GroupOptions);

impl Node for Group {
    fn expression(&self) -> Term<'_> {
        stage(Self::NAME, self.query.term())
    }
}

// ============================================================================
// SORT BY COUNT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SortByCountOptions {
    pub by: GroupKey,
}

/// $sortByCount: group by an expression and sort groups by size
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SortByCountOptions")]
pub struct SortByCount {
    by: Expression,
}

impl StageName for SortByCount {
    const NAME: &'static str = "sortByCount";
}

impl SortByCount {
    pub fn new(options: SortByCountOptions) -> Result<Self> {
        if let GroupKey::Fields(names) = &options.by {
            if names.is_empty() {
                return Err(IronPipeError::validation("$sortByCount requires at least one field"));
            }
        }
        options.by.validate()?;
        Ok(SortByCount {
            by: options.by.into_expression(),
        })
    }

    pub fn by(key: impl Into<GroupKey>) -> Result<Self> {
        SortByCount::new(SortByCountOptions { by: key.into() })
    }
}

super::from_options!(SortByCount, SortByCountOptions);

impl Node for SortByCount {
    fn expression(&self) -> Term<'_> {
        stage(Self::NAME, Term::Node(&self.by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use serde_json::json;

    // ========== Group ==========

    #[test]
    fn test_group_default_id_from_by() {
        assert_eq!(
            Group::by("field").unwrap().statement(),
            json!({"$group": {"_id": "$field"}})
        );
    }

    #[test]
    fn test_group_without_by_has_null_id() {
        let group = Group::new(GroupOptions::default())
            .unwrap()
            .with("total", ops::sum(ops::field("amount")))
            .unwrap();
        assert_eq!(
            group.statement(),
            json!({"$group": {"_id": null, "total": {"$sum": "$amount"}}})
        );
    }

    #[test]
    fn test_group_by_field_list() {
        let group = Group::by(vec!["city", "year"]).unwrap();
        assert_eq!(
            group.statement(),
            json!({"$group": {"_id": {"city": "$city", "year": "$year"}}})
        );
    }

    #[test]
    fn test_group_explicit_id_wins() {
        let group = Group::new(GroupOptions {
            by: Some("ignored".into()),
            query: Some(ExpressionMap::new().with("_id", "$genre").with("n", ops::count())),
        })
        .unwrap();
        assert_eq!(
            group.statement(),
            json!({"$group": {"_id": "$genre", "n": {"$count": {}}}})
        );
    }

    #[test]
    fn test_group_id_injected_first() {
        let group: Group = serde_json::from_value(json!({
            "by": "genre",
            "query": {"total": {"$sum": 1}}
        }))
        .unwrap();
        let statement = group.statement();
        let keys: Vec<&String> = statement["$group"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["_id", "total"]);
    }

    #[test]
    fn test_group_rejects_dotted_output() {
        let group = Group::by("genre").unwrap();
        assert!(group.with("a.b", ops::count()).is_err());
    }

    // ========== SortByCount ==========

    #[test]
    fn test_sort_by_count() {
        assert_eq!(
            SortByCount::by("genre").unwrap().statement(),
            json!({"$sortByCount": "$genre"})
        );
        let expr = SortByCount::by(ops::to_lower(ops::field("genre"))).unwrap();
        assert_eq!(expr.statement(), json!({"$sortByCount": {"$toLower": "$genre"}}));
    }
}
