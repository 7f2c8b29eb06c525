// ironpipe-core/src/lib.rs
//! Typed builder for document-database aggregation pipelines
//!
//! Stages, expressions and search operators are plain Rust values that
//! validate themselves when built. A [`Pipeline`] collects stages and
//! [`Pipeline::export`] flattens them into the JSON statement the database
//! expects. Running it is delegated to an [`Executor`].

pub mod error;
pub mod executor;
pub mod expression;
pub mod fields;
pub mod node;
pub mod operators;
pub mod ops;
pub mod pipeline;
pub mod search;
pub mod stages;

// Public exports
pub use error::{IronPipeError, Result};
pub use executor::{AsyncExecutor, Executor};
pub use expression::{Expression, ExpressionMap};
pub use fields::{ensure_field_prefix, field_ref, var_ref};
pub use node::{resolve, Node, Term};
pub use operators::Operator;
pub use pipeline::{JoinHow, JoinOptions, Pipeline};
pub use search::{ClauseRole, Compound, SearchOperator};
pub use stages::{Stage, StageSpec};
