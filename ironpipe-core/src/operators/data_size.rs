// src/operators/data_size.rs
// Size-of operators

use super::{single_operand, taxonomy};
use crate::expression::Expression;

/// $binarySize
#[derive(Debug, Clone, PartialEq)]
pub struct BinarySize {
    pub operand: Expression,
}

/// $bsonSize
#[derive(Debug, Clone, PartialEq)]
pub struct BsonSize {
    pub operand: Expression,
}

single_operand!(BinarySize, "binarySize");
single_operand!(BsonSize, "bsonSize");

taxonomy! {
    /// Data size operators
    DataSizeOperator => DataSize {
        BinarySize(BinarySize),
        BsonSize(BsonSize),
    }
}
