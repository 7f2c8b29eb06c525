// src/operators/date.rs
// Date part extraction

use super::{operator, taxonomy, OperatorName};
use crate::expression::Expression;
use crate::node::{Body, Node, Term};

/// $millisecond
///
/// Without a timezone the date is inlined; with one the body becomes
/// `{"date": .., "timezone": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Millisecond {
    pub date: Expression,
    pub timezone: Option<Expression>,
}

impl OperatorName for Millisecond {
    const NAME: &'static str = "millisecond";
}

impl Millisecond {
    pub fn new(date: impl Into<Expression>) -> Self {
        Millisecond {
            date: date.into(),
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<Expression>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

impl Node for Millisecond {
    fn expression(&self) -> Term<'_> {
        let body = match &self.timezone {
            Some(timezone) => Body::new()
                .with_node("date", &self.date)
                .with_node("timezone", timezone)
                .into_term(),
            None => Term::Node(&self.date),
        };
        operator(Self::NAME, body)
    }
}

taxonomy! {
    /// Date operators
    DateOperator => Date {
        Millisecond(Millisecond),
    }
}
