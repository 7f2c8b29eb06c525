// src/operators/boolean.rs
// Boolean expression operators

use super::{list_operands, single_operand, taxonomy};
use crate::expression::Expression;

/// $and over zero or more expressions
#[derive(Debug, Clone, PartialEq)]
pub struct And {
    pub operands: Vec<Expression>,
}

/// $or over zero or more expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Or {
    pub operands: Vec<Expression>,
}

/// $not over exactly one expression
#[derive(Debug, Clone, PartialEq)]
pub struct Not {
    pub operand: Expression,
}

list_operands!(And, "and");
list_operands!(Or, "or");
single_operand!(Not, "not");

taxonomy! {
    /// Boolean operators
    BooleanOperator => Boolean {
        And(And),
        Or(Or),
        Not(Not),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::operators::comparison::{Eq, Gt};
    use serde_json::json;

    #[test]
    fn test_and_or() {
        let and = And::new([
            Expression::from(Gt::new("$qty", 100)),
            Expression::from(Eq::new("$status", "A")),
        ]);
        assert_eq!(
            and.statement(),
            json!({"$and": [{"$gt": ["$qty", 100]}, {"$eq": ["$status", "A"]}]})
        );
        assert_eq!(Or::new(Vec::<Expression>::new()).statement(), json!({"$or": []}));
    }

    #[test]
    fn test_not_inlines_operand() {
        assert_eq!(
            Not::new(Gt::new("$qty", 250)).statement(),
            json!({"$not": {"$gt": ["$qty", 250]}})
        );
    }
}
