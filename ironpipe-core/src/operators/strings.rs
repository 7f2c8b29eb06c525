// src/operators/strings.rs
// String expression operators

use super::{list_operands, operator, single_operand, taxonomy, OperatorName};
use crate::expression::Expression;
use crate::node::{Body, Node, Term};

/// $concat
#[derive(Debug, Clone, PartialEq)]
pub struct Concat {
    pub operands: Vec<Expression>,
}

/// $toLower
#[derive(Debug, Clone, PartialEq)]
pub struct ToLower {
    pub operand: Expression,
}

/// $toUpper
#[derive(Debug, Clone, PartialEq)]
pub struct ToUpper {
    pub operand: Expression,
}

list_operands!(Concat, "concat");
single_operand!(ToLower, "toLower");
single_operand!(ToUpper, "toUpper");

/// $dateFromString: `{dateString, format?, timezone?, onError?, onNull?}`
#[derive(Debug, Clone, PartialEq)]
pub struct DateFromString {
    pub date_string: Expression,
    pub format: Option<Expression>,
    pub timezone: Option<Expression>,
    pub on_error: Option<Expression>,
    pub on_null: Option<Expression>,
}

impl OperatorName for DateFromString {
    const NAME: &'static str = "dateFromString";
}

impl DateFromString {
    pub fn new(date_string: impl Into<Expression>) -> Self {
        DateFromString {
            date_string: date_string.into(),
            format: None,
            timezone: None,
            on_error: None,
            on_null: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<Expression>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<Expression>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_on_error(mut self, on_error: impl Into<Expression>) -> Self {
        self.on_error = Some(on_error.into());
        self
    }

    pub fn with_on_null(mut self, on_null: impl Into<Expression>) -> Self {
        self.on_null = Some(on_null.into());
        self
    }
}

impl Node for DateFromString {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with_node("dateString", &self.date_string)
            .with_node_opt("format", self.format.as_ref())
            .with_node_opt("timezone", self.timezone.as_ref())
            .with_node_opt("onError", self.on_error.as_ref())
            .with_node_opt("onNull", self.on_null.as_ref());
        operator(Self::NAME, body.into_term())
    }
}

/// $dateToString: `{date, format?, timezone?, onNull?}`
#[derive(Debug, Clone, PartialEq)]
pub struct DateToString {
    pub date: Expression,
    pub format: Option<Expression>,
    pub timezone: Option<Expression>,
    pub on_null: Option<Expression>,
}

impl OperatorName for DateToString {
    const NAME: &'static str = "dateToString";
}

impl DateToString {
    pub fn new(date: impl Into<Expression>) -> Self {
        DateToString {
            date: date.into(),
            format: None,
            timezone: None,
            on_null: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<Expression>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<Expression>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_on_null(mut self, on_null: impl Into<Expression>) -> Self {
        self.on_null = Some(on_null.into());
        self
    }
}

impl Node for DateToString {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with_node("date", &self.date)
            .with_node_opt("format", self.format.as_ref())
            .with_node_opt("timezone", self.timezone.as_ref())
            .with_node_opt("onNull", self.on_null.as_ref());
        operator(Self::NAME, body.into_term())
    }
}

taxonomy! {
    /// String operators
    StringOperator => String {
        Concat(Concat),
        DateFromString(DateFromString),
        DateToString(DateToString),
        ToLower(ToLower),
        ToUpper(ToUpper),
    }
}
