// src/operators/type_.rs
// BSON type inspection

use super::{single_operand, taxonomy};
use crate::expression::Expression;

/// $type
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub operand: Expression,
}

single_operand!(Type, "type");

taxonomy! {
    /// Type operators
    TypeOperator => Type {
        Type(Type),
    }
}
