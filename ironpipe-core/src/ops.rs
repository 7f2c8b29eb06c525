// src/ops.rs
//! One function per known operator
//!
//! ```
//! use ironpipe_core::ops;
//! use serde_json::json;
//! use ironpipe_core::Node;
//!
//! let total = ops::sum(ops::multiply([ops::field("price"), ops::field("qty")]));
//! assert_eq!(total.statement(), json!({"$sum": {"$multiply": ["$price", "$qty"]}}));
//! ```

use crate::error::Result;
use crate::expression::Expression;
use crate::operators::{
    accumulators, arithmetic, array, boolean, comparison, conditional, custom, data_size, date,
    objects, strings, type_,
};
use serde_json::Value;

// ============================================================================
// REFERENCES
// ============================================================================

/// `$name` field reference
pub fn field(path: &str) -> Expression {
    Expression::field(path)
}

/// `$$name` variable reference
pub fn var(name: &str) -> Expression {
    Expression::var(name)
}

pub fn lit(value: impl Into<Value>) -> Expression {
    Expression::literal(value)
}

// ============================================================================
// ACCUMULATORS
// ============================================================================

pub fn avg(operand: impl Into<Expression>) -> Expression {
    accumulators::Avg::new(operand).into()
}

pub fn count() -> Expression {
    accumulators::Count.into()
}

pub fn first(operand: impl Into<Expression>) -> Expression {
    accumulators::First::new(operand).into()
}

pub fn last(operand: impl Into<Expression>) -> Expression {
    accumulators::Last::new(operand).into()
}

pub fn max(operand: impl Into<Expression>) -> Expression {
    accumulators::Max::new(operand).into()
}

pub fn min(operand: impl Into<Expression>) -> Expression {
    accumulators::Min::new(operand).into()
}

pub fn push(operand: impl Into<Expression>) -> Expression {
    accumulators::Push::new(operand).into()
}

pub fn sum(operand: impl Into<Expression>) -> Expression {
    accumulators::Sum::new(operand).into()
}

pub fn add_to_set(operand: impl Into<Expression>) -> Expression {
    accumulators::AddToSet::new(operand).into()
}

// ============================================================================
// ARITHMETIC
// ============================================================================

pub fn add<E: Into<Expression>>(operands: impl IntoIterator<Item = E>) -> Expression {
    arithmetic::Add::new(operands).into()
}

pub fn subtract(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    arithmetic::Subtract::new(left, right).into()
}

pub fn multiply<E: Into<Expression>>(operands: impl IntoIterator<Item = E>) -> Expression {
    arithmetic::Multiply::new(operands).into()
}

pub fn divide(numerator: impl Into<Expression>, denominator: impl Into<Expression>) -> Expression {
    arithmetic::Divide::new(numerator, denominator).into()
}

pub fn pow(number: impl Into<Expression>, exponent: impl Into<Expression>) -> Expression {
    arithmetic::Pow::new(number, exponent).into()
}

pub fn abs(operand: impl Into<Expression>) -> Expression {
    arithmetic::Abs::new(operand).into()
}

pub fn modulo(dividend: impl Into<Expression>, divisor: impl Into<Expression>) -> Expression {
    arithmetic::Mod::new(dividend, divisor).into()
}

// ============================================================================
// ARRAY
// ============================================================================

pub fn array_to_object(operand: impl Into<Expression>) -> Expression {
    array::ArrayToObject::new(operand).into()
}

pub fn filter(input: impl Into<Expression>, cond: impl Into<Expression>) -> Expression {
    array::Filter::new(input, cond).into()
}

pub fn in_(element: impl Into<Expression>, array: impl Into<Expression>) -> Expression {
    array::In::new(element, array).into()
}

pub fn is_array(operand: impl Into<Expression>) -> Expression {
    array::IsArray::new(operand).into()
}

pub fn max_n(input: impl Into<Expression>, n: impl Into<Expression>) -> Result<Expression> {
    Ok(array::MaxN::new(input, n)?.into())
}

pub fn min_n(input: impl Into<Expression>, n: impl Into<Expression>) -> Result<Expression> {
    Ok(array::MinN::new(input, n)?.into())
}

pub fn size(operand: impl Into<Expression>) -> Expression {
    array::Size::new(operand).into()
}

pub fn sort_array(input: impl Into<Expression>, sort_by: Value) -> Result<Expression> {
    Ok(array::SortArray::new(input, sort_by)?.into())
}

// ============================================================================
// BOOLEAN
// ============================================================================

pub fn and<E: Into<Expression>>(operands: impl IntoIterator<Item = E>) -> Expression {
    boolean::And::new(operands).into()
}

pub fn or<E: Into<Expression>>(operands: impl IntoIterator<Item = E>) -> Expression {
    boolean::Or::new(operands).into()
}

pub fn not(operand: impl Into<Expression>) -> Expression {
    boolean::Not::new(operand).into()
}

// ============================================================================
// COMPARISON
// ============================================================================

pub fn cmp(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    comparison::Cmp::new(left, right).into()
}

pub fn eq(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    comparison::Eq::new(left, right).into()
}

pub fn gt(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    comparison::Gt::new(left, right).into()
}

pub fn gte(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    comparison::Gte::new(left, right).into()
}

pub fn lt(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    comparison::Lt::new(left, right).into()
}

pub fn lte(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    comparison::Lte::new(left, right).into()
}

pub fn ne(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
    comparison::Ne::new(left, right).into()
}

// ============================================================================
// CONDITIONAL
// ============================================================================

pub fn cond(
    if_: impl Into<Expression>,
    then: impl Into<Expression>,
    else_: impl Into<Expression>,
) -> Expression {
    conditional::Cond::when(if_, then, else_).into()
}

pub fn if_null(expression: impl Into<Expression>, output: impl Into<Expression>) -> Expression {
    conditional::IfNull::new(expression, output).into()
}

pub fn switch(branches: Vec<conditional::Branch>, default: Option<Expression>) -> Result<Expression> {
    Ok(conditional::Switch::new(branches, default)?.into())
}

// ============================================================================
// CUSTOM / DATA SIZE / DATE / OBJECT / STRING / TYPE
// ============================================================================

pub fn let_<K, E, I>(variables: I, in_: impl Into<Expression>) -> Result<Expression>
where
    K: Into<String>,
    E: Into<Expression>,
    I: IntoIterator<Item = (K, E)>,
{
    Ok(custom::Let::new(variables, in_)?.into())
}

pub fn literal(value: impl Into<Value>) -> Expression {
    custom::Literal::new(value).into()
}

pub fn binary_size(operand: impl Into<Expression>) -> Expression {
    data_size::BinarySize::new(operand).into()
}

pub fn bson_size(operand: impl Into<Expression>) -> Expression {
    data_size::BsonSize::new(operand).into()
}

pub fn millisecond(date: impl Into<Expression>) -> Expression {
    date::Millisecond::new(date).into()
}

pub fn merge_objects<E: Into<Expression>>(operands: impl IntoIterator<Item = E>) -> Expression {
    objects::MergeObjects::new(operands).into()
}

pub fn object_to_array(operand: impl Into<Expression>) -> Expression {
    objects::ObjectToArray::new(operand).into()
}

pub fn concat<E: Into<Expression>>(operands: impl IntoIterator<Item = E>) -> Expression {
    strings::Concat::new(operands).into()
}

pub fn date_from_string(date_string: impl Into<Expression>) -> Expression {
    strings::DateFromString::new(date_string).into()
}

pub fn date_to_string(date: impl Into<Expression>, format: impl Into<Expression>) -> Expression {
    strings::DateToString::new(date).with_format(format).into()
}

pub fn to_lower(operand: impl Into<Expression>) -> Expression {
    strings::ToLower::new(operand).into()
}

pub fn to_upper(operand: impl Into<Expression>) -> Expression {
    strings::ToUpper::new(operand).into()
}

pub fn type_(operand: impl Into<Expression>) -> Expression {
    type_::Type::new(operand).into()
}
