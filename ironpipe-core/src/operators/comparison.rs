// src/operators/comparison.rs
// Comparison expression operators, all rendered as `[left, right]`

use super::{binary_operands, taxonomy};
use crate::expression::Expression;

macro_rules! comparison {
    ($($(#[$meta:meta])* $ty:ident => $name:literal),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq)]
            pub struct $ty {
                pub left: Expression,
                pub right: Expression,
            }

            binary_operands!($ty, $name, left, right);
        )+
    };
}

comparison! {
    /// $cmp: -1, 0 or 1
    Cmp => "cmp",
    /// $eq
    Eq => "eq",
    /// $gt
    Gt => "gt",
    /// $gte
    Gte => "gte",
    /// $lt
    Lt => "lt",
    /// $lte
    Lte => "lte",
    /// $ne
    Ne => "ne",
}

taxonomy! {
    /// Comparison operators
    ComparisonOperator => Comparison {
        Cmp(Cmp),
        Eq(Eq),
        Gt(Gt),
        Gte(Gte),
        Lt(Lt),
        Lte(Lte),
        Ne(Ne),
    }
}
