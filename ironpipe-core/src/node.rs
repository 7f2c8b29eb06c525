// src/node.rs
//! Node capability and the recursive resolver
//!
//! Every builder object (expression, operator, search operator, stage)
//! implements [`Node`]. A node describes itself one level deep as a [`Term`]:
//! a tree whose leaves are either finished JSON values or further nodes.
//! [`resolve`] walks that tree and flattens it into the wire form.
//!
//! ```text
//! Stage ──expression()──► Term::Map { "$group": Term::Map { "_id": Term::Node(expr) } }
//!                                                                    │
//!                                      resolve() ◄───expression()────┘
//! ```
//!
//! Lists and maps are treated differently on purpose:
//!
//! - a map is always rebuilt and every value is resolved again
//! - a list is only rebuilt when at least one element is a node; the other
//!   elements are carried across structurally without being dispatched as nodes

use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// TERM
// ============================================================================

/// One level of a node's wire form, possibly still holding child nodes
#[derive(Debug)]
pub enum Term<'a> {
    /// Finished JSON (scalar, string, null or plain container)
    Value(Value),
    /// A child node, resolved lazily by [`resolve`]
    Node(&'a dyn Node),
    /// Ordered list
    List(Vec<Term<'a>>),
    /// Ordered string-keyed map
    Map(Vec<(String, Term<'a>)>),
}

impl<'a> Term<'a> {
    pub fn value(value: impl Into<Value>) -> Self {
        Term::Value(value.into())
    }

    pub fn node(node: &'a dyn Node) -> Self {
        Term::Node(node)
    }

    /// List whose every element is a node
    pub fn nodes<T: Node>(items: &'a [T]) -> Self {
        Term::List(items.iter().map(|item| Term::Node(item as &dyn Node)).collect())
    }

    /// Single-key map `{key: term}`
    pub fn keyed(key: impl Into<String>, term: Term<'a>) -> Self {
        Term::Map(vec![(key.into(), term)])
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Term::Node(_))
    }
}

impl From<Value> for Term<'_> {
    fn from(value: Value) -> Self {
        Term::Value(value)
    }
}

// ============================================================================
// BODY BUILDER
// ============================================================================

/// Ordered map builder used by nodes to assemble their bodies
///
/// `None` values are skipped, which is how optional database keys are left
/// out of the wire form.
#[derive(Debug, Default)]
pub struct Body<'a> {
    entries: Vec<(String, Term<'a>)>,
}

impl<'a> Body<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, term: Term<'a>) -> Self {
        self.insert(key, term);
        self
    }

    pub fn with_node(self, key: &str, node: &'a dyn Node) -> Self {
        self.with(key, Term::Node(node))
    }

    pub fn with_value(self, key: &str, value: impl Into<Value>) -> Self {
        self.with(key, Term::Value(value.into()))
    }

    pub fn with_node_opt<T: Node>(self, key: &str, node: Option<&'a T>) -> Self {
        match node {
            Some(node) => self.with(key, Term::Node(node as &dyn Node)),
            None => self,
        }
    }

    pub fn with_value_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, Term::Value(value.into())),
            None => self,
        }
    }

    pub fn insert(&mut self, key: &str, term: Term<'a>) {
        self.entries.push((key.to_string(), term));
    }

    /// Append every entry of `other`, keeping its order
    pub fn merge(mut self, other: Body<'a>) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Splice in the entries of a map term; any other term lands under `key`
    pub fn splice(mut self, key: &str, term: Term<'a>) -> Self {
        match term {
            Term::Map(entries) => self.entries.extend(entries),
            other => self.insert(key, other),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_term(self) -> Term<'a> {
        Term::Map(self.entries)
    }
}

// ============================================================================
// NODE
// ============================================================================

/// Anything that can describe itself in wire form
///
/// Implementations must be pure: calling `expression()` twice yields the
/// same tree, and never mutates the node.
pub trait Node: fmt::Debug + Send + Sync {
    /// One level of the wire form; child nodes stay unresolved
    fn expression(&self) -> Term<'_>;

    /// Fully resolved wire form
    fn statement(&self) -> Value {
        resolve(self.expression())
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Flatten a term into its wire form
///
/// Total over every term built from valid nodes; terminates on any finite
/// tree, including compounds nested inside compounds.
pub fn resolve(term: Term<'_>) -> Value {
    match term {
        Term::Node(node) => resolve(node.expression()),
        Term::List(items) => {
            if items.iter().any(Term::is_node) {
                Value::Array(
                    items
                        .into_iter()
                        .map(|item| match item {
                            Term::Node(node) => resolve(node.expression()),
                            other => carry(other),
                        })
                        .collect(),
                )
            } else {
                carry(Term::List(items))
            }
        }
        Term::Map(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key, resolve(value)))
                .collect::<Map<String, Value>>(),
        ),
        Term::Value(value) => value,
    }
}

/// Lower a list element that was not flagged as a node
///
/// Plain values pass through untouched. Raw containers are lowered in place
/// since the wire type cannot hold an unresolved node.
fn carry(term: Term<'_>) -> Value {
    match term {
        Term::Value(value) => value,
        Term::List(items) => Value::Array(items.into_iter().map(carry).collect()),
        other => resolve(other),
    }
}
