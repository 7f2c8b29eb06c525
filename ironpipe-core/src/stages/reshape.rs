// src/stages/reshape.rs
// $set, $addFields, $unset and $replaceRoot

use super::{stage, Fields, StageName};
use crate::error::{IronPipeError, Result};
use crate::expression::{Expression, ExpressionMap};
use crate::fields::validate_field_path;
use crate::node::{Body, Node, Term};
use serde::Deserialize;

fn validate_target(field: &str, what: &str) -> Result<()> {
    if field.starts_with('$') {
        return Err(IronPipeError::validation(format!(
            "{} field {:?} must not carry a '$' prefix",
            what, field
        )));
    }
    validate_field_path(field, what)
}

fn validate_assignments(fields: &ExpressionMap, what: &str) -> Result<()> {
    if fields.is_empty() {
        return Err(IronPipeError::validation(format!("{} requires at least one field", what)));
    }
    fields.keys().try_for_each(|field| validate_target(field, what))
}

/// Declares a stage that assigns `{field: expression}` pairs
macro_rules! assignment_stage {
    ($(#[$meta:meta])* $ty:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Deserialize)]
        #[serde(try_from = "ExpressionMap")]
        pub struct $ty {
            fields: ExpressionMap,
        }

        impl StageName for $ty {
            const NAME: &'static str = $name;
        }

        impl $ty {
            pub fn new(fields: ExpressionMap) -> Result<Self> {
                validate_assignments(&fields, concat!("$", $name))?;
                Ok($ty { fields })
            }

            pub fn fields(&self) -> &ExpressionMap {
                &self.fields
            }
        }

        super::from_options!($ty, ExpressionMap);

        impl Node for $ty {
            fn expression(&self) -> Term<'_> {
                stage(Self::NAME, self.fields.term())
            }
        }
    };
}

assignment_stage!(
    /// $set: add or overwrite fields
    Set,
    "set"
);

assignment_stage!(
    /// $addFields: same semantics as `$set` under its original name
    AddFields,
    "addFields"
);

// ============================================================================
// UNSET
// ============================================================================

/// $unset: `"field"` or `["a", "b"]`, following the shape it was given in
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Fields")]
pub struct Unset {
    fields: Fields,
}

impl StageName for Unset {
    const NAME: &'static str = "unset";
}

impl Unset {
    pub fn new(fields: impl Into<Fields>) -> Result<Self> {
        let fields = fields.into();
        let names = fields.names();
        if names.is_empty() {
            return Err(IronPipeError::validation("$unset requires at least one field"));
        }
        names
            .into_iter()
            .try_for_each(|field| validate_target(field, "$unset"))?;
        Ok(Unset { fields })
    }
}

impl TryFrom<Fields> for Unset {
    type Error = IronPipeError;

    fn try_from(fields: Fields) -> Result<Self> {
        Unset::new(fields)
    }
}

impl Node for Unset {
    fn expression(&self) -> Term<'_> {
        let body = match &self.fields {
            Fields::One(field) => Term::value(field.as_str()),
            other => Term::value(other.names()),
        };
        stage(Self::NAME, body)
    }
}

// ============================================================================
// REPLACE ROOT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplaceRootOptions {
    pub new_root: Expression,
}

/// $replaceRoot: `{"newRoot": expression}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ReplaceRootOptions")]
pub struct ReplaceRoot {
    new_root: Expression,
}

impl StageName for ReplaceRoot {
    const NAME: &'static str = "replaceRoot";
}

impl ReplaceRoot {
    /// A bare field name is taken as a field reference
    pub fn new(options: ReplaceRootOptions) -> Result<Self> {
        let new_root = match options.new_root {
            Expression::Literal(serde_json::Value::String(path)) => {
                validate_field_path(&path, "$replaceRoot newRoot")?;
                Expression::field(&path)
            }
            Expression::Literal(literal) if !literal.is_object() => {
                return Err(IronPipeError::validation(format!(
                    "$replaceRoot newRoot must resolve to a document, got {}",
                    literal
                )))
            }
            other => other,
        };
        Ok(ReplaceRoot { new_root })
    }

    pub fn with(new_root: impl Into<Expression>) -> Result<Self> {
        ReplaceRoot::new(ReplaceRootOptions {
            new_root: new_root.into(),
        })
    }
}

super::from_options!(ReplaceRoot, ReplaceRootOptions);

impl Node for ReplaceRoot {
    fn expression(&self) -> Term<'_> {
        stage(
            Self::NAME,
            Body::new().with_node("newRoot", &self.new_root).into_term(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::ROOT;
    use crate::ops;
    use serde_json::json;

    #[test]
    fn test_set_and_add_fields() {
        let fields = ExpressionMap::new().with("total", ops::sum(ops::field("items.price")));
        assert_eq!(
            Set::new(fields.clone()).unwrap().statement(),
            json!({"$set": {"total": {"$sum": "$items.price"}}})
        );
        assert_eq!(
            AddFields::new(fields).unwrap().statement(),
            json!({"$addFields": {"total": {"$sum": "$items.price"}}})
        );
    }

    #[test]
    fn test_set_validation() {
        assert!(Set::new(ExpressionMap::new()).is_err());
        assert!(Set::new(ExpressionMap::new().with("$bad", 1)).is_err());
        let set: Set = serde_json::from_value(json!({"a.b": 1})).unwrap();
        assert_eq!(set.statement(), json!({"$set": {"a.b": 1}}));
    }

    #[test]
    fn test_unset_keeps_shape() {
        assert_eq!(Unset::new("isbn").unwrap().statement(), json!({"$unset": "isbn"}));
        assert_eq!(
            Unset::new(vec!["isbn", "copies"]).unwrap().statement(),
            json!({"$unset": ["isbn", "copies"]})
        );
        assert!(Unset::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_replace_root() {
        assert_eq!(
            ReplaceRoot::with("name").unwrap().statement(),
            json!({"$replaceRoot": {"newRoot": "$name"}})
        );
        let merged = ReplaceRoot::with(ops::merge_objects([ops::var(ROOT), ops::field("extra")])).unwrap();
        assert_eq!(
            merged.statement(),
            json!({"$replaceRoot": {"newRoot": {"$mergeObjects": ["$$ROOT", "$extra"]}}})
        );
        assert!(ReplaceRoot::with(5).is_err());
    }
}
