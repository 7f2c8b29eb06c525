// src/expression.rs
// Value-position expressions: literals, field paths, variables, operators

use crate::fields::{ensure_field_prefix, var_ref};
use crate::node::{Node, Term};
use crate::operators::Operator;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

/// Anything that can stand in a value position of a stage or operator
///
/// Strings given as [`Expression::Literal`] are emitted verbatim, so
/// `"$price"` written as a literal is still a field reference on the wire.
/// Use [`Expression::field`] to have the `$` added for you.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant scalar or plain JSON
    Literal(Value),
    /// Field path, stored with its single `$`
    Field(String),
    /// System or `$let`-bound variable, stored with its `$$`
    Variable(String),
    /// Nested operator
    Operator(Box<Operator>),
    /// Expression object: every value is itself an expression
    Object(Vec<(String, Expression)>),
    /// Array of expressions
    Array(Vec<Expression>),
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn null() -> Self {
        Expression::Literal(Value::Null)
    }

    /// Field reference; a missing `$` is added
    pub fn field(path: &str) -> Self {
        Expression::Field(ensure_field_prefix(path))
    }

    /// Variable reference; accepts `"this"`, `"$this"` or `"$$this"`
    pub fn var(name: &str) -> Self {
        if name.starts_with("$$") {
            Expression::Variable(name.to_string())
        } else {
            Expression::Variable(var_ref(name.trim_start_matches('$')))
        }
    }

    pub fn object<K, E, I>(entries: I) -> Self
    where
        K: Into<String>,
        E: Into<Expression>,
        I: IntoIterator<Item = (K, E)>,
    {
        Expression::Object(
            entries
                .into_iter()
                .map(|(key, expr)| (key.into(), expr.into()))
                .collect(),
        )
    }

    pub fn array<E, I>(items: I) -> Self
    where
        E: Into<Expression>,
        I: IntoIterator<Item = E>,
    {
        Expression::Array(items.into_iter().map(Into::into).collect())
    }
}

impl Default for Expression {
    fn default() -> Self {
        Expression::null()
    }
}

impl Node for Expression {
    fn expression(&self) -> Term<'_> {
        match self {
            Expression::Literal(value) => Term::Value(value.clone()),
            Expression::Field(path) => Term::value(path.as_str()),
            Expression::Variable(name) => Term::value(name.as_str()),
            Expression::Operator(op) => Term::Node(op.as_ref()),
            Expression::Object(entries) => Term::Map(
                entries
                    .iter()
                    .map(|(key, expr)| (key.clone(), Term::Node(expr as &dyn Node)))
                    .collect(),
            ),
            Expression::Array(items) => Term::nodes(items),
        }
    }
}

// ============================================================================
// EXPRESSION MAP
// ============================================================================

/// Ordered `{key: expression}` map used by stage bodies
///
/// Inserting an existing key replaces its expression in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionMap {
    entries: Vec<(String, Expression)>,
}

impl ExpressionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, expr: impl Into<Expression>) {
        let key = key.into();
        let expr = expr.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = expr,
            None => self.entries.push((key, expr)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, expr: impl Into<Expression>) -> Self {
        self.insert(key, expr);
        self
    }

    /// Insert `key` ahead of every other entry
    pub fn prepend(&mut self, key: impl Into<String>, expr: impl Into<Expression>) {
        let key = key.into();
        self.entries.retain(|(existing, _)| *existing != key);
        self.entries.insert(0, (key, expr.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Expression> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, expr)| expr)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.entries.iter().map(|(key, expr)| (key.as_str(), expr))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map term whose values are still unresolved expressions
    pub fn term(&self) -> Term<'_> {
        Term::Map(
            self.entries
                .iter()
                .map(|(key, expr)| (key.clone(), Term::Node(expr as &dyn Node)))
                .collect(),
        )
    }
}

impl Node for ExpressionMap {
    fn expression(&self) -> Term<'_> {
        self.term()
    }
}

impl<K: Into<String>, E: Into<Expression>> FromIterator<(K, E)> for ExpressionMap {
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        let mut map = ExpressionMap::new();
        for (key, expr) in iter {
            map.insert(key, expr);
        }
        map
    }
}

impl<'de> Deserialize<'de> for ExpressionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(map.into_iter().map(|(key, value)| (key, Expression::Literal(value))).collect())
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Literal(value)
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Expression::Literal(Value::from(value))
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Expression::Literal(Value::from(value))
    }
}

macro_rules! literal_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Expression {
                fn from(value: $ty) -> Self {
                    Expression::Literal(Value::from(value))
                }
            }
        )+
    };
}

literal_from!(bool, i32, i64, u32, u64, f64);

/// Dates are emitted as extended JSON: `{"$date": "2024-01-01T00:00:00Z"}`
impl From<DateTime<Utc>> for Expression {
    fn from(value: DateTime<Utc>) -> Self {
        Expression::Literal(json!({"$date": value.to_rfc3339_opts(SecondsFormat::Millis, true)}))
    }
}

impl From<Operator> for Expression {
    fn from(op: Operator) -> Self {
        Expression::Operator(Box::new(op))
    }
}

impl From<Vec<Expression>> for Expression {
    fn from(items: Vec<Expression>) -> Self {
        Expression::Array(items)
    }
}

/// Configuration documents only ever carry plain JSON
impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Expression::Literal)
    }
}
