// src/stages/sort.rs
// $sort: order documents by one or more keys

use super::{stage, Fields, StageName};
use crate::error::{IronPipeError, Result};
use crate::fields::validate_field_path;
use crate::node::{Node, Term};
use serde::Deserialize;
use serde_json::{Map, Value};

/// `ascending` / `descending` argument: a flag applied to `by`, or field names
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SortDirection {
    Flag(bool),
    Fields(Fields),
}

impl From<bool> for SortDirection {
    fn from(flag: bool) -> Self {
        SortDirection::Flag(flag)
    }
}

impl From<Fields> for SortDirection {
    fn from(fields: Fields) -> Self {
        SortDirection::Fields(fields)
    }
}

impl From<&str> for SortDirection {
    fn from(field: &str) -> Self {
        SortDirection::Fields(field.into())
    }
}

impl From<Vec<&str>> for SortDirection {
    fn from(fields: Vec<&str>) -> Self {
        SortDirection::Fields(fields.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SortOptions {
    /// Explicit `{field: 1 | -1 | {"$meta": ..}}` document
    pub query: Option<Map<String, Value>>,
    pub by: Option<Fields>,
    pub ascending: Option<SortDirection>,
    pub descending: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SortOptions")]
pub struct Sort {
    query: Map<String, Value>,
}

impl StageName for Sort {
    const NAME: &'static str = "sort";
}

impl Sort {
    /// Derive the sort document
    ///
    /// 1. an explicit `query` is used as given
    /// 2. `by` fields take the direction of the `ascending`/`descending` flag
    /// 3. fields listed in `ascending` get 1, fields listed in `descending` get -1;
    ///    a `{field: false}` entry takes the opposite direction
    ///
    /// Both directions given as flags is ambiguous and fails. Without any flag
    /// the direction is ascending.
    pub fn new(options: SortOptions) -> Result<Self> {
        let SortOptions {
            query,
            by,
            ascending,
            descending,
        } = options;

        if let Some(query) = query {
            for (field, direction) in &query {
                validate_field_path(field, "sort key")?;
                validate_direction(field, direction)?;
            }
            if query.is_empty() {
                return Err(IronPipeError::validation("$sort query must not be empty"));
            }
            return Ok(Sort { query });
        }

        let direction = match (&ascending, &descending) {
            (Some(SortDirection::Flag(_)), Some(SortDirection::Flag(_))) => {
                return Err(IronPipeError::validation(
                    "$sort accepts ascending or descending as a flag, not both",
                ))
            }
            (Some(SortDirection::Flag(ascending)), _) => direction_of(*ascending),
            (_, Some(SortDirection::Flag(descending))) => direction_of(!*descending),
            _ => 1,
        };

        let mut sorted = Map::new();
        if let Some(by) = &by {
            for field in by.names() {
                validate_field_path(field, "sort key")?;
                sorted.insert(field.to_string(), Value::from(direction));
            }
        }
        for (listed, value) in [(&ascending, 1), (&descending, -1)] {
            if let Some(SortDirection::Fields(fields)) = listed {
                for (field, flag) in fields.flags() {
                    validate_field_path(field, "sort key")?;
                    let value = if flag { value } else { -value };
                    sorted.insert(field.to_string(), Value::from(value));
                }
            }
        }

        if sorted.is_empty() {
            return Err(IronPipeError::validation(
                "$sort requires query, by, or field lists in ascending/descending",
            ));
        }
        Ok(Sort { query: sorted })
    }

    pub fn by(fields: impl Into<Fields>) -> Result<Self> {
        Sort::new(SortOptions {
            by: Some(fields.into()),
            ..Default::default()
        })
    }

    pub fn ascending(fields: impl Into<Fields>) -> Result<Self> {
        Sort::new(SortOptions {
            ascending: Some(SortDirection::Fields(fields.into())),
            ..Default::default()
        })
    }

    pub fn descending(fields: impl Into<Fields>) -> Result<Self> {
        Sort::new(SortOptions {
            descending: Some(SortDirection::Fields(fields.into())),
            ..Default::default()
        })
    }

    /// The derived sort document
    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }
}

fn direction_of(ascending: bool) -> i64 {
    if ascending {
        1
    } else {
        -1
    }
}

fn validate_direction(field: &str, direction: &Value) -> Result<()> {
    let valid = match direction {
        Value::Number(n) => matches!(n.as_i64(), Some(1) | Some(-1)),
        Value::Object(meta) => meta.contains_key("$meta"),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(IronPipeError::validation(format!(
            "$sort direction for {:?} must be 1, -1 or a $meta document, got {}",
            field, direction
        )))
    }
}

super::from_options!(Sort, SortOptions);

impl Node for Sort {
    fn expression(&self) -> Term<'_> {
        stage(Self::NAME, Term::Value(Value::Object(self.query.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_by_defaults_ascending() {
        assert_eq!(
            Sort::by(vec!["year"]).unwrap().statement(),
            json!({"$sort": {"year": 1}})
        );
    }

    #[test]
    fn test_sort_by_with_flags() {
        let descending = Sort::new(SortOptions {
            by: Some(vec!["year", "title"].into()),
            descending: Some(true.into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(descending.statement(), json!({"$sort": {"year": -1, "title": -1}}));

        let not_ascending = Sort::new(SortOptions {
            by: Some("year".into()),
            ascending: Some(false.into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(not_ascending.statement(), json!({"$sort": {"year": -1}}));
    }

    #[test]
    fn test_both_flags_fail() {
        let result = Sort::new(SortOptions {
            by: Some("year".into()),
            ascending: Some(true.into()),
            descending: Some(false.into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(IronPipeError::Validation(_))));
    }

    #[test]
    fn test_direction_field_lists() {
        let sort = Sort::new(SortOptions {
            ascending: Some(vec!["title"].into()),
            descending: Some(vec!["year"].into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sort.statement(), json!({"$sort": {"title": 1, "year": -1}}));
    }

    #[test]
    fn test_direction_flag_maps() {
        let sort: Sort = serde_json::from_value(json!({
            "ascending": {"title": true, "year": false},
            "descending": {"rating": 1, "votes": 0}
        }))
        .unwrap();
        assert_eq!(
            sort.statement(),
            json!({"$sort": {"title": 1, "year": -1, "rating": -1, "votes": 1}})
        );
    }

    #[test]
    fn test_explicit_query() {
        let sort: Sort = serde_json::from_value(json!({
            "query": {"score": {"$meta": "textScore"}, "year": -1}
        }))
        .unwrap();
        assert_eq!(
            sort.statement(),
            json!({"$sort": {"score": {"$meta": "textScore"}, "year": -1}})
        );
        assert!(Sort::new(SortOptions {
            query: Some(json!({"year": 2}).as_object().unwrap().clone()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_nothing_to_sort_fails() {
        assert!(Sort::new(SortOptions::default()).is_err());
    }

    #[test]
    fn test_sort_from_config_flags() {
        let sort: Sort = serde_json::from_value(json!({"by": ["year"], "descending": true})).unwrap();
        assert_eq!(sort.statement(), json!({"$sort": {"year": -1}}));
    }
}
