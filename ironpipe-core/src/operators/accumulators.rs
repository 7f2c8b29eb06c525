// src/operators/accumulators.rs
// Accumulators used in $group, $bucket and $setWindowFields

use super::{operator, single_operand, taxonomy, OperatorName};
use crate::expression::Expression;
use crate::node::{Node, Term};

/// $avg
#[derive(Debug, Clone, PartialEq)]
pub struct Avg {
    pub operand: Expression,
}

/// $count, takes no argument: `{"$count": {}}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Count;

/// $first
#[derive(Debug, Clone, PartialEq)]
pub struct First {
    pub operand: Expression,
}

/// $last
#[derive(Debug, Clone, PartialEq)]
pub struct Last {
    pub operand: Expression,
}

/// $max
#[derive(Debug, Clone, PartialEq)]
pub struct Max {
    pub operand: Expression,
}

/// $min
#[derive(Debug, Clone, PartialEq)]
pub struct Min {
    pub operand: Expression,
}

/// $push
#[derive(Debug, Clone, PartialEq)]
pub struct Push {
    pub operand: Expression,
}

/// $sum
#[derive(Debug, Clone, PartialEq)]
pub struct Sum {
    pub operand: Expression,
}

/// $addToSet
#[derive(Debug, Clone, PartialEq)]
pub struct AddToSet {
    pub operand: Expression,
}

single_operand!(Avg, "avg");
single_operand!(First, "first");
single_operand!(Last, "last");
single_operand!(Max, "max");
single_operand!(Min, "min");
single_operand!(Push, "push");
single_operand!(Sum, "sum");
single_operand!(AddToSet, "addToSet");

impl OperatorName for Count {
    const NAME: &'static str = "count";
}

impl Node for Count {
    fn expression(&self) -> Term<'_> {
        operator(Self::NAME, Term::Map(Vec::new()))
    }
}

taxonomy! {
    /// Accumulator operators
    AccumulatorOperator => Accumulator {
        Avg(Avg),
        Count(Count),
        First(First),
        Last(Last),
        Max(Max),
        Min(Min),
        Push(Push),
        Sum(Sum),
        AddToSet(AddToSet),
    }
}
