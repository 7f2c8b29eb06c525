// src/operators/custom.rs
// Variable binding and literal escaping: $let, $literal

use super::{operator, taxonomy, OperatorName};
use crate::error::Result;
use crate::expression::Expression;
use crate::fields::validate_field_name;
use crate::node::{Body, Node, Term};
use serde_json::Value;

/// $let: `{"vars": {...}, "in": ..}`
///
/// Bound names are referenced as `$$name` inside `in_`.
#[derive(Debug, Clone, PartialEq)]
pub struct Let {
    pub variables: Vec<(String, Expression)>,
    pub in_: Expression,
}

impl OperatorName for Let {
    const NAME: &'static str = "let";
}

impl Let {
    pub fn new<K, E, I>(variables: I, in_: impl Into<Expression>) -> Result<Self>
    where
        K: Into<String>,
        E: Into<Expression>,
        I: IntoIterator<Item = (K, E)>,
    {
        let variables = variables
            .into_iter()
            .map(|(name, expr)| {
                let name = name.into();
                validate_field_name(&name, "$let variable name")?;
                Ok((name, expr.into()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Let {
            variables,
            in_: in_.into(),
        })
    }
}

impl Node for Let {
    fn expression(&self) -> Term<'_> {
        let vars = Term::Map(
            self.variables
                .iter()
                .map(|(name, expr)| (name.clone(), Term::Node(expr as &dyn Node)))
                .collect(),
        );
        let body = Body::new().with("vars", vars).with_node("in", &self.in_);
        operator(Self::NAME, body.into_term())
    }
}

/// $literal: value emitted without being parsed as an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
}

impl OperatorName for Literal {
    const NAME: &'static str = "literal";
}

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Literal {
            value: value.into(),
        }
    }
}

impl Node for Literal {
    fn expression(&self) -> Term<'_> {
        operator(Self::NAME, Term::Value(self.value.clone()))
    }
}

taxonomy! {
    /// Variable and literal operators
    CustomOperator => Custom {
        Let(Let),
        Literal(Literal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::arithmetic::Multiply;
    use serde_json::json;

    #[test]
    fn test_let_binds_variables() {
        let expr = Let::new(
            [("total", Expression::field("price"))],
            Multiply::new(["$$total", "$qty"]),
        )
        .unwrap();
        assert_eq!(
            expr.statement(),
            json!({"$let": {
                "vars": {"total": "$price"},
                "in": {"$multiply": ["$$total", "$qty"]}
            }})
        );
    }

    #[test]
    fn test_let_rejects_bad_names() {
        assert!(Let::new([("$x", 1)], "$$x").is_err());
    }

    #[test]
    fn test_literal() {
        assert_eq!(Literal::new("$1").statement(), json!({"$literal": "$1"}));
    }
}
