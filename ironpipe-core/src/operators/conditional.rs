// src/operators/conditional.rs
// Conditional expression operators: $cond, $ifNull, $switch

use super::{operator, taxonomy, OperatorName};
use crate::error::{IronPipeError, Result};
use crate::expression::Expression;
use crate::node::{Body, Node, Term};

/// Arguments accepted by [`Cond::new`]
///
/// Either the triple `(if_, then, else_)` or the triple
/// `(expression, true_, false_)` must be complete. When both are, the first
/// one wins.
#[derive(Debug, Clone, Default)]
pub struct CondOptions {
    pub if_: Option<Expression>,
    pub then: Option<Expression>,
    pub else_: Option<Expression>,
    pub expression: Option<Expression>,
    pub true_: Option<Expression>,
    pub false_: Option<Expression>,
}

/// $cond: `{"if": .., "then": .., "else": ..}`
#[derive(Debug, Clone, PartialEq)]
pub struct Cond {
    pub if_: Expression,
    pub then: Expression,
    pub else_: Expression,
}

impl OperatorName for Cond {
    const NAME: &'static str = "cond";
}

impl Cond {
    pub fn new(options: CondOptions) -> Result<Self> {
        match options {
            CondOptions {
                if_: Some(if_),
                then: Some(then),
                else_: Some(else_),
                ..
            } => Ok(Cond { if_, then, else_ }),
            CondOptions {
                expression: Some(if_),
                true_: Some(then),
                false_: Some(else_),
                ..
            } => Ok(Cond { if_, then, else_ }),
            _ => Err(IronPipeError::validation(
                "$cond requires either (if, then, else) or (expression, true, false)",
            )),
        }
    }

    /// Shorthand for the `(if, then, else)` form
    pub fn when(
        if_: impl Into<Expression>,
        then: impl Into<Expression>,
        else_: impl Into<Expression>,
    ) -> Self {
        Cond {
            if_: if_.into(),
            then: then.into(),
            else_: else_.into(),
        }
    }
}

impl Node for Cond {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with_node("if", &self.if_)
            .with_node("then", &self.then)
            .with_node("else", &self.else_);
        operator(Self::NAME, body.into_term())
    }
}

/// $ifNull: `[expression, output]`
#[derive(Debug, Clone, PartialEq)]
pub struct IfNull {
    pub expression: Expression,
    pub output: Expression,
}

super::binary_operands!(IfNull, "ifNull", expression, output);

/// One `{case, then}` branch of a [`Switch`]
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub case: Expression,
    pub then: Expression,
}

impl Branch {
    pub fn new(case: impl Into<Expression>, then: impl Into<Expression>) -> Self {
        Branch {
            case: case.into(),
            then: then.into(),
        }
    }
}

impl Node for Branch {
    fn expression(&self) -> Term<'_> {
        Body::new()
            .with_node("case", &self.case)
            .with_node("then", &self.then)
            .into_term()
    }
}

/// $switch: `{"branches": [...], "default"?: ..}`
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub branches: Vec<Branch>,
    pub default: Option<Expression>,
}

impl OperatorName for Switch {
    const NAME: &'static str = "switch";
}

impl Switch {
    pub fn new(branches: Vec<Branch>, default: Option<Expression>) -> Result<Self> {
        if branches.is_empty() {
            return Err(IronPipeError::validation(
                "$switch branches must contain at least one branch",
            ));
        }
        Ok(Switch { branches, default })
    }
}

impl Node for Switch {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with("branches", Term::nodes(&self.branches))
            .with_node_opt("default", self.default.as_ref());
        operator(Self::NAME, body.into_term())
    }
}

taxonomy! {
    /// Conditional operators
    ConditionalOperator => Conditional {
        Cond(Cond),
        IfNull(IfNull),
        Switch(Switch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::comparison::Gte;
    use serde_json::json;

    #[test]
    fn test_cond_if_then_else() {
        let cond = Cond::new(CondOptions {
            if_: Some(Gte::new("$qty", 250).into()),
            then: Some(30.into()),
            else_: Some(20.into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            cond.statement(),
            json!({"$cond": {"if": {"$gte": ["$qty", 250]}, "then": 30, "else": 20}})
        );
    }

    #[test]
    fn test_cond_expression_true_false_alias() {
        let cond = Cond::new(CondOptions {
            expression: Some(true.into()),
            true_: Some("yes".into()),
            false_: Some("no".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            cond.statement(),
            json!({"$cond": {"if": true, "then": "yes", "else": "no"}})
        );
    }

    #[test]
    fn test_cond_if_form_takes_precedence() {
        let cond = Cond::new(CondOptions {
            if_: Some(1.into()),
            then: Some(2.into()),
            else_: Some(3.into()),
            expression: Some(4.into()),
            true_: Some(5.into()),
            false_: Some(6.into()),
        })
        .unwrap();
        assert_eq!(cond, Cond::when(1, 2, 3));
    }

    #[test]
    fn test_cond_incomplete_fails() {
        let err = Cond::new(CondOptions {
            if_: Some(1.into()),
            then: Some(2.into()),
            true_: Some(5.into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, IronPipeError::Validation(_)));
    }

    #[test]
    fn test_if_null() {
        assert_eq!(
            IfNull::new("$description", "Unspecified").statement(),
            json!({"$ifNull": ["$description", "Unspecified"]})
        );
    }

    #[test]
    fn test_switch() {
        let switch = Switch::new(
            vec![
                Branch::new(Gte::new("$score", 90), "A"),
                Branch::new(Gte::new("$score", 80), "B"),
            ],
            Some("F".into()),
        )
        .unwrap();
        assert_eq!(
            switch.statement(),
            json!({"$switch": {
                "branches": [
                    {"case": {"$gte": ["$score", 90]}, "then": "A"},
                    {"case": {"$gte": ["$score", 80]}, "then": "B"}
                ],
                "default": "F"
            }})
        );
        assert!(Switch::new(Vec::new(), None).is_err());
    }
}
