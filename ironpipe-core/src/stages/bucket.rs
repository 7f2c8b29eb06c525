// src/stages/bucket.rs
// $bucket and $bucketAuto

use super::{stage, StageName};
use crate::error::{IronPipeError, Result};
use crate::expression::{Expression, ExpressionMap};
use crate::node::{Body, Node, Term};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Comparable form of one boundary value
#[derive(Debug, PartialEq)]
enum Boundary<'a> {
    Number(f64),
    Date(DateTime<Utc>),
    Text(&'a str),
}

fn boundary(value: &Value) -> Option<Boundary<'_>> {
    match value {
        Value::Number(n) => n.as_f64().map(Boundary::Number),
        Value::String(text) => Some(match DateTime::parse_from_rfc3339(text) {
            Ok(date) => Boundary::Date(date.with_timezone(&Utc)),
            Err(_) => Boundary::Text(text),
        }),
        Value::Object(extended) => extended
            .get("$date")
            .and_then(Value::as_str)
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
            .map(|date| Boundary::Date(date.with_timezone(&Utc))),
        _ => None,
    }
}

impl PartialOrd for Boundary<'_> {
    /// Values of different types are unordered
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Boundary::Number(a), Boundary::Number(b)) => a.partial_cmp(b),
            (Boundary::Date(a), Boundary::Date(b)) => Some(a.cmp(b)),
            (Boundary::Text(a), Boundary::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// RFC 3339 string or extended JSON `{"$date": ..}`
pub(crate) fn is_date_boundary(value: &Value) -> bool {
    matches!(boundary(value), Some(Boundary::Date(_)))
}

/// Boundaries must be at least two values of one type, strictly ascending
pub(crate) fn validate_boundaries(values: &[Value], what: &str) -> Result<()> {
    if values.len() < 2 {
        return Err(IronPipeError::validation(format!(
            "{} boundaries need at least two values, got {}",
            what,
            values.len()
        )));
    }
    let parsed = values
        .iter()
        .map(|value| {
            boundary(value).ok_or_else(|| {
                IronPipeError::validation(format!(
                    "{} boundary {} is not a number, string or date",
                    what, value
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    for pair in parsed.windows(2) {
        match pair[0].partial_cmp(&pair[1]) {
            Some(Ordering::Less) => {}
            Some(_) => {
                return Err(IronPipeError::validation(format!(
                    "{} boundaries must be unique and sorted ascending",
                    what
                )))
            }
            None => {
                return Err(IronPipeError::validation(format!(
                    "{} boundaries must all have the same type",
                    what
                )))
            }
        }
    }
    Ok(())
}

fn validate_output(output: Option<&ExpressionMap>, what: &str) -> Result<()> {
    if let Some(output) = output {
        for key in output.keys() {
            crate::fields::validate_field_name(key, what)?;
        }
    }
    Ok(())
}

// ============================================================================
// BUCKET
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BucketOptions {
    pub group_by: Expression,
    pub boundaries: Vec<Value>,
    /// Bucket `_id` for values outside the boundaries
    pub default: Option<Value>,
    pub output: Option<ExpressionMap>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BucketOptions")]
pub struct Bucket {
    group_by: Expression,
    boundaries: Vec<Value>,
    default: Option<Value>,
    output: Option<ExpressionMap>,
}

impl StageName for Bucket {
    const NAME: &'static str = "bucket";
}

impl Bucket {
    pub fn new(options: BucketOptions) -> Result<Self> {
        validate_boundaries(&options.boundaries, "$bucket")?;
        validate_output(options.output.as_ref(), "$bucket output field")?;
        Ok(Bucket {
            group_by: options.group_by,
            boundaries: options.boundaries,
            default: options.default,
            output: options.output,
        })
    }
}

super::from_options!(Bucket, BucketOptions);

impl Node for Bucket {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with_node("groupBy", &self.group_by)
            .with_value("boundaries", self.boundaries.clone())
            .with_value_opt("default", self.default.clone())
            .with_node_opt("output", self.output.as_ref());
        stage(Self::NAME, body.into_term())
    }
}

// ============================================================================
// BUCKET AUTO
// ============================================================================

/// Preferred-number series for `$bucketAuto` boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Granularity {
    R5,
    R10,
    R20,
    R40,
    R80,
    #[serde(rename = "1-2-5")]
    OneTwoFive,
    E6,
    E12,
    E24,
    E48,
    E96,
    E192,
    #[serde(rename = "POWERSOF2")]
    PowersOf2,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::R5 => "R5",
            Granularity::R10 => "R10",
            Granularity::R20 => "R20",
            Granularity::R40 => "R40",
            Granularity::R80 => "R80",
            Granularity::OneTwoFive => "1-2-5",
            Granularity::E6 => "E6",
            Granularity::E12 => "E12",
            Granularity::E24 => "E24",
            Granularity::E48 => "E48",
            Granularity::E96 => "E96",
            Granularity::E192 => "E192",
            Granularity::PowersOf2 => "POWERSOF2",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BucketAutoOptions {
    pub group_by: Expression,
    pub buckets: u32,
    pub output: Option<ExpressionMap>,
    pub granularity: Option<Granularity>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BucketAutoOptions")]
pub struct BucketAuto {
    group_by: Expression,
    buckets: u32,
    output: Option<ExpressionMap>,
    granularity: Option<Granularity>,
}

impl StageName for BucketAuto {
    const NAME: &'static str = "bucketAuto";
}

impl BucketAuto {
    pub fn new(options: BucketAutoOptions) -> Result<Self> {
        if options.buckets == 0 {
            return Err(IronPipeError::validation("$bucketAuto buckets must be at least 1"));
        }
        validate_output(options.output.as_ref(), "$bucketAuto output field")?;
        Ok(BucketAuto {
            group_by: options.group_by,
            buckets: options.buckets,
            output: options.output,
            granularity: options.granularity,
        })
    }
}

super::from_options!(BucketAuto, BucketAutoOptions);

impl Node for BucketAuto {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with_node("groupBy", &self.group_by)
            .with_value("buckets", self.buckets)
            .with_node_opt("output", self.output.as_ref())
            .with_value_opt("granularity", self.granularity.map(|series| series.as_str()));
        stage(Self::NAME, body.into_term())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use serde_json::json;

    // ========== Boundaries ==========

    #[test]
    fn test_boundaries_numbers() {
        assert!(validate_boundaries(&[json!(0), json!(10.5), json!(20)], "b").is_ok());
        assert!(validate_boundaries(&[json!(0)], "b").is_err());
        assert!(validate_boundaries(&[json!(0), json!(0)], "b").is_err());
        assert!(validate_boundaries(&[json!(10), json!(0)], "b").is_err());
    }

    #[test]
    fn test_boundaries_dates_and_strings() {
        let dates = [json!({"$date": "2020-01-01T00:00:00Z"}), json!("2021-01-01T00:00:00Z")];
        assert!(validate_boundaries(&dates, "b").is_ok());
        assert!(validate_boundaries(&[json!("a"), json!("b")], "b").is_ok());
        assert!(validate_boundaries(&[json!("b"), json!("a")], "b").is_err());
    }

    #[test]
    fn test_boundaries_mixed_types_fail() {
        let err = validate_boundaries(&[json!(1), json!("b")], "b").unwrap_err();
        assert!(err.to_string().contains("same type"));
        assert!(validate_boundaries(&[json!(1), json!(null)], "b").is_err());
    }

    // ========== Stages ==========

    #[test]
    fn test_bucket() {
        let bucket = Bucket::new(BucketOptions {
            group_by: Expression::field("price"),
            boundaries: vec![json!(0), json!(100), json!(200)],
            default: Some(json!("other")),
            output: Some(ExpressionMap::new().with("count", ops::sum(1))),
        })
        .unwrap();
        assert_eq!(
            bucket.statement(),
            json!({"$bucket": {
                "groupBy": "$price",
                "boundaries": [0, 100, 200],
                "default": "other",
                "output": {"count": {"$sum": 1}}
            }})
        );
    }

    #[test]
    fn test_bucket_auto() {
        let bucket: BucketAuto = serde_json::from_value(json!({
            "groupBy": "$price",
            "buckets": 4,
            "granularity": "1-2-5"
        }))
        .unwrap();
        assert_eq!(
            bucket.statement(),
            json!({"$bucketAuto": {"groupBy": "$price", "buckets": 4, "granularity": "1-2-5"}})
        );
        assert!(serde_json::from_value::<BucketAuto>(json!({"groupBy": "$p", "buckets": 0})).is_err());
        assert!(serde_json::from_value::<BucketAuto>(json!({
            "groupBy": "$p",
            "buckets": 2,
            "granularity": "R7"
        }))
        .is_err());
    }
}
