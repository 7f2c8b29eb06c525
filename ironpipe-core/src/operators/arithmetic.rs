// src/operators/arithmetic.rs
// Arithmetic expression operators

use super::{binary_operands, list_operands, single_operand, taxonomy};
use crate::expression::Expression;

/// $add
#[derive(Debug, Clone, PartialEq)]
pub struct Add {
    pub operands: Vec<Expression>,
}

/// $subtract, `[left, right]`
#[derive(Debug, Clone, PartialEq)]
pub struct Subtract {
    pub left: Expression,
    pub right: Expression,
}

/// $multiply
#[derive(Debug, Clone, PartialEq)]
pub struct Multiply {
    pub operands: Vec<Expression>,
}

/// $divide, rendered as `[numerator, denominator]`
#[derive(Debug, Clone, PartialEq)]
pub struct Divide {
    pub numerator: Expression,
    pub denominator: Expression,
}

/// $pow, `[number, exponent]`
#[derive(Debug, Clone, PartialEq)]
pub struct Pow {
    pub number: Expression,
    pub exponent: Expression,
}

/// $abs
#[derive(Debug, Clone, PartialEq)]
pub struct Abs {
    pub operand: Expression,
}

/// $mod, `[dividend, divisor]`
#[derive(Debug, Clone, PartialEq)]
pub struct Mod {
    pub dividend: Expression,
    pub divisor: Expression,
}

list_operands!(Add, "add");
list_operands!(Multiply, "multiply");
binary_operands!(Subtract, "subtract", left, right);
binary_operands!(Divide, "divide", numerator, denominator);
binary_operands!(Pow, "pow", number, exponent);
binary_operands!(Mod, "mod", dividend, divisor);
single_operand!(Abs, "abs");

taxonomy! {
    /// Arithmetic operators
    ArithmeticOperator => Arithmetic {
        Add(Add),
        Subtract(Subtract),
        Multiply(Multiply),
        Divide(Divide),
        Pow(Pow),
        Abs(Abs),
        Mod(Mod),
    }
}
