// src/operators/array.rs
// Array expression operators

use super::{binary_operands, operator, single_operand, taxonomy, validate_positive_literal, OperatorName};
use crate::error::{IronPipeError, Result};
use crate::expression::Expression;
use crate::node::{Body, Node, Term};
use serde_json::Value;

/// $arrayToObject
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayToObject {
    pub operand: Expression,
}

/// $filter: `{input, cond, as?, limit?}`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub input: Expression,
    pub cond: Expression,
    /// Name of the per-element variable (database default: `this`)
    pub as_: Option<String>,
    pub limit: Option<Expression>,
}

/// $first (array form)
#[derive(Debug, Clone, PartialEq)]
pub struct First {
    pub operand: Expression,
}

/// $last (array form)
#[derive(Debug, Clone, PartialEq)]
pub struct Last {
    pub operand: Expression,
}

/// $in, `[element, array]`
#[derive(Debug, Clone, PartialEq)]
pub struct In {
    pub element: Expression,
    pub array: Expression,
}

/// $isArray
#[derive(Debug, Clone, PartialEq)]
pub struct IsArray {
    pub operand: Expression,
}

/// $maxN (array form): `{input, n}`
#[derive(Debug, Clone, PartialEq)]
pub struct MaxN {
    pub input: Expression,
    pub n: Expression,
}

/// $minN (array form): `{input, n}`
#[derive(Debug, Clone, PartialEq)]
pub struct MinN {
    pub input: Expression,
    pub n: Expression,
}

/// $size
#[derive(Debug, Clone, PartialEq)]
pub struct Size {
    pub operand: Expression,
}

/// $sortArray: `{input, sortBy}`
#[derive(Debug, Clone, PartialEq)]
pub struct SortArray {
    pub input: Expression,
    pub sort_by: Value,
}

single_operand!(ArrayToObject, "arrayToObject");
single_operand!(First, "first");
single_operand!(Last, "last");
single_operand!(IsArray, "isArray");
single_operand!(Size, "size");
binary_operands!(In, "in", element, array);

impl OperatorName for Filter {
    const NAME: &'static str = "filter";
}

impl Filter {
    pub fn new(input: impl Into<Expression>, cond: impl Into<Expression>) -> Self {
        Filter {
            input: input.into(),
            cond: cond.into(),
            as_: None,
            limit: None,
        }
    }

    pub fn with_as(mut self, name: impl Into<String>) -> Self {
        self.as_ = Some(name.into());
        self
    }

    pub fn with_limit(mut self, limit: impl Into<Expression>) -> Self {
        self.limit = Some(limit.into());
        self
    }
}

impl Node for Filter {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with_node("input", &self.input)
            .with_node("cond", &self.cond)
            .with_value_opt("as", self.as_.as_deref())
            .with_node_opt("limit", self.limit.as_ref());
        operator(Self::NAME, body.into_term())
    }
}

macro_rules! n_operator {
    ($ty:ident, $name:literal) => {
        impl OperatorName for $ty {
            const NAME: &'static str = $name;
        }

        impl $ty {
            /// Fails when `n` is a literal below one
            pub fn new(input: impl Into<Expression>, n: impl Into<Expression>) -> Result<Self> {
                let n = n.into();
                validate_positive_literal(&n, concat!("$", $name, " n"))?;
                Ok($ty {
                    input: input.into(),
                    n,
                })
            }
        }

        impl Node for $ty {
            fn expression(&self) -> Term<'_> {
                let body = Body::new()
                    .with_node("input", &self.input)
                    .with_node("n", &self.n);
                operator(Self::NAME, body.into_term())
            }
        }
    };
}

n_operator!(MaxN, "maxN");
n_operator!(MinN, "minN");

impl OperatorName for SortArray {
    const NAME: &'static str = "sortArray";
}

impl SortArray {
    /// `sort_by` is either `1`/`-1` (sort scalars) or a map of field to `1`/`-1`
    pub fn new(input: impl Into<Expression>, sort_by: Value) -> Result<Self> {
        let valid_direction = |v: &Value| matches!(v.as_i64(), Some(1) | Some(-1));
        let valid = match &sort_by {
            Value::Object(fields) => !fields.is_empty() && fields.values().all(valid_direction),
            other => valid_direction(other),
        };
        if !valid {
            return Err(IronPipeError::validation(format!(
                "$sortArray sortBy must be 1, -1 or a non-empty map of field to 1/-1, got {}",
                sort_by
            )));
        }
        Ok(SortArray {
            input: input.into(),
            sort_by,
        })
    }
}

impl Node for SortArray {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with_node("input", &self.input)
            .with_value("sortBy", self.sort_by.clone());
        operator(Self::NAME, body.into_term())
    }
}

taxonomy! {
    /// Array operators
    ArrayOperator => Array {
        ArrayToObject(ArrayToObject),
        Filter(Filter),
        First(First),
        Last(Last),
        In(In),
        IsArray(IsArray),
        MaxN(MaxN),
        MinN(MinN),
        Size(Size),
        SortArray(SortArray),
    }
}
