// src/operators/objects.rs
// Object operators

use super::{list_operands, single_operand, taxonomy};
use crate::expression::Expression;

/// $mergeObjects, always rendered as a list of documents
#[derive(Debug, Clone, PartialEq)]
pub struct MergeObjects {
    pub operands: Vec<Expression>,
}

/// $objectToArray
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectToArray {
    pub operand: Expression,
}

list_operands!(MergeObjects, "mergeObjects");
single_operand!(ObjectToArray, "objectToArray");

taxonomy! {
    /// Object operators
    ObjectOperator => Object {
        MergeObjects(MergeObjects),
        ObjectToArray(ObjectToArray),
    }
}
