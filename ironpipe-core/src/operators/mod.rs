// src/operators/mod.rs
//! Expression operators
//!
//! Every operator renders as `{"$<name>": <operands>}`. The operand shape
//! depends on the operator:
//!
//! - a single operand is inlined (`{"$sum": "$amount"}`)
//! - a variadic operand list becomes an array (`{"$add": [1, "$x"]}`)
//! - named operands become a sub-map (`{"$cond": {"if": .., "then": .., "else": ..}}`)
//!   or an array in the order the database requires (`{"$divide": [n, d]}`)
//!
//! Operators are grouped into closed taxonomies (`ArithmeticOperator`,
//! `ComparisonOperator`, ...) which are in turn variants of [`Operator`].
//! Invalid operand combinations are rejected by the constructors; rendering
//! never fails.

use crate::expression::Expression;
use crate::node::{Node, Term};

pub use accumulators::AccumulatorOperator;
pub use arithmetic::ArithmeticOperator;
pub use array::ArrayOperator;
pub use boolean::BooleanOperator;
pub use comparison::ComparisonOperator;
pub use conditional::ConditionalOperator;
pub use custom::CustomOperator;
pub use data_size::DataSizeOperator;
pub use date::DateOperator;
pub use objects::ObjectOperator;
pub use strings::StringOperator;
pub use type_::TypeOperator;

/// Fixed database name of an operator, without its `$`
pub trait OperatorName {
    const NAME: &'static str;
}

/// `{"$<name>": body}`
pub(crate) fn operator<'a>(name: &str, body: Term<'a>) -> Term<'a> {
    Term::keyed(format!("${}", name), body)
}

/// Implements [`Node`] for an operator with one inlined operand field
macro_rules! single_operand {
    ($ty:ident, $name:literal) => {
        impl $crate::operators::OperatorName for $ty {
            const NAME: &'static str = $name;
        }

        impl $ty {
            pub fn new(operand: impl Into<$crate::expression::Expression>) -> Self {
                $ty {
                    operand: operand.into(),
                }
            }
        }

        impl $crate::node::Node for $ty {
            fn expression(&self) -> $crate::node::Term<'_> {
                $crate::operators::operator(
                    <$ty as $crate::operators::OperatorName>::NAME,
                    $crate::node::Term::Node(&self.operand),
                )
            }
        }
    };
}

/// Implements [`Node`] for an operator rendered as `[left, right]`
macro_rules! binary_operands {
    ($ty:ident, $name:literal, $left:ident, $right:ident) => {
        impl $crate::operators::OperatorName for $ty {
            const NAME: &'static str = $name;
        }

        impl $ty {
            pub fn new(
                $left: impl Into<$crate::expression::Expression>,
                $right: impl Into<$crate::expression::Expression>,
            ) -> Self {
                $ty {
                    $left: $left.into(),
                    $right: $right.into(),
                }
            }
        }

        impl $crate::node::Node for $ty {
            fn expression(&self) -> $crate::node::Term<'_> {
                $crate::operators::operator(
                    <$ty as $crate::operators::OperatorName>::NAME,
                    $crate::node::Term::List(vec![
                        $crate::node::Term::Node(&self.$left),
                        $crate::node::Term::Node(&self.$right),
                    ]),
                )
            }
        }
    };
}

/// Implements [`Node`] for an operator over a variadic operand list
macro_rules! list_operands {
    ($ty:ident, $name:literal) => {
        impl $crate::operators::OperatorName for $ty {
            const NAME: &'static str = $name;
        }

        impl $ty {
            pub fn new<E, I>(operands: I) -> Self
            where
                E: Into<$crate::expression::Expression>,
                I: IntoIterator<Item = E>,
            {
                $ty {
                    operands: operands.into_iter().map(Into::into).collect(),
                }
            }
        }

        impl $crate::node::Node for $ty {
            fn expression(&self) -> $crate::node::Term<'_> {
                $crate::operators::operator(
                    <$ty as $crate::operators::OperatorName>::NAME,
                    $crate::node::Term::nodes(&self.operands),
                )
            }
        }
    };
}

/// Declares a closed operator taxonomy and wires it into [`Operator`]
macro_rules! taxonomy {
    ($(#[$meta:meta])* $name:ident => $outer:ident { $($variant:ident($ty:ty)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $($variant($ty)),+
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => <$ty as $crate::operators::OperatorName>::NAME),+
                }
            }
        }

        impl $crate::node::Node for $name {
            fn expression(&self) -> $crate::node::Term<'_> {
                match self {
                    $($name::$variant(op) => $crate::node::Node::expression(op)),+
                }
            }
        }

        impl From<$name> for $crate::operators::Operator {
            fn from(op: $name) -> Self {
                $crate::operators::Operator::$outer(op)
            }
        }

        impl From<$name> for $crate::expression::Expression {
            fn from(op: $name) -> Self {
                $crate::operators::Operator::$outer(op).into()
            }
        }

        $(
            impl From<$ty> for $name {
                fn from(op: $ty) -> Self {
                    $name::$variant(op)
                }
            }

            impl From<$ty> for $crate::expression::Expression {
                fn from(op: $ty) -> Self {
                    $crate::operators::Operator::$outer($name::$variant(op)).into()
                }
            }
        )+
    };
}

pub(crate) use binary_operands;
pub(crate) use list_operands;
pub(crate) use single_operand;
pub(crate) use taxonomy;

pub mod accumulators;
pub mod arithmetic;
pub mod array;
pub mod boolean;
pub mod comparison;
pub mod conditional;
pub mod custom;
pub mod data_size;
pub mod date;
pub mod objects;
pub mod strings;
pub mod type_;

// ============================================================================
// OPERATOR UNION
// ============================================================================

/// Any expression operator
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Accumulator(AccumulatorOperator),
    Arithmetic(ArithmeticOperator),
    Array(ArrayOperator),
    Boolean(BooleanOperator),
    Comparison(ComparisonOperator),
    Conditional(ConditionalOperator),
    Custom(CustomOperator),
    DataSize(DataSizeOperator),
    Date(DateOperator),
    Object(ObjectOperator),
    String(StringOperator),
    Type(TypeOperator),
}

impl Operator {
    /// Database name of the operator, without its `$`
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Accumulator(op) => op.name(),
            Operator::Arithmetic(op) => op.name(),
            Operator::Array(op) => op.name(),
            Operator::Boolean(op) => op.name(),
            Operator::Comparison(op) => op.name(),
            Operator::Conditional(op) => op.name(),
            Operator::Custom(op) => op.name(),
            Operator::DataSize(op) => op.name(),
            Operator::Date(op) => op.name(),
            Operator::Object(op) => op.name(),
            Operator::String(op) => op.name(),
            Operator::Type(op) => op.name(),
        }
    }
}

impl Node for Operator {
    fn expression(&self) -> Term<'_> {
        match self {
            Operator::Accumulator(op) => op.expression(),
            Operator::Arithmetic(op) => op.expression(),
            Operator::Array(op) => op.expression(),
            Operator::Boolean(op) => op.expression(),
            Operator::Comparison(op) => op.expression(),
            Operator::Conditional(op) => op.expression(),
            Operator::Custom(op) => op.expression(),
            Operator::DataSize(op) => op.expression(),
            Operator::Date(op) => op.expression(),
            Operator::Object(op) => op.expression(),
            Operator::String(op) => op.expression(),
            Operator::Type(op) => op.expression(),
        }
    }
}

/// Reject a literal `n` below one (`$maxN`, `$minN`)
pub(crate) fn validate_positive_literal(value: &Expression, what: &str) -> crate::error::Result<()> {
    let valid = match value {
        Expression::Literal(serde_json::Value::String(reference)) => reference.starts_with('$'),
        Expression::Literal(literal) => literal.as_i64().map_or(false, |n| n >= 1),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(crate::error::IronPipeError::validation(format!(
            "{} must be a positive integer or an expression, got {:?}",
            what, value
        )))
    }
}
