// src/stages/unwind.rs
// $unwind: one output document per array element

use super::{stage, StageName};
use crate::error::{IronPipeError, Result};
use crate::fields::{ensure_field_prefix, validate_field_name, validate_field_path};
use crate::node::{Body, Node, Term};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnwindOptions {
    pub path: String,
    pub include_array_index: Option<String>,
    #[serde(default)]
    pub preserve_null_and_empty_arrays: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "UnwindOptions")]
pub struct Unwind {
    path: String,
    include_array_index: Option<String>,
    preserve_null_and_empty_arrays: bool,
}

impl StageName for Unwind {
    const NAME: &'static str = "unwind";
}

impl Unwind {
    pub fn new(options: UnwindOptions) -> Result<Self> {
        if options.path.starts_with("$$") {
            return Err(IronPipeError::validation(format!(
                "$unwind path must be a field path, got {:?}",
                options.path
            )));
        }
        validate_field_path(&options.path, "$unwind path")?;
        if let Some(index) = &options.include_array_index {
            validate_field_name(index, "$unwind includeArrayIndex")?;
        }
        Ok(Unwind {
            path: ensure_field_prefix(&options.path),
            include_array_index: options.include_array_index,
            preserve_null_and_empty_arrays: options.preserve_null_and_empty_arrays,
        })
    }

    pub fn path(path: &str) -> Result<Self> {
        Unwind::new(UnwindOptions {
            path: path.to_string(),
            ..Default::default()
        })
    }

    pub fn preserving(path: &str) -> Result<Self> {
        Unwind::new(UnwindOptions {
            path: path.to_string(),
            preserve_null_and_empty_arrays: true,
            ..Default::default()
        })
    }
}

super::from_options!(Unwind, UnwindOptions);

impl Node for Unwind {
    fn expression(&self) -> Term<'_> {
        let body = Body::new()
            .with_value("path", self.path.as_str())
            .with_value_opt("includeArrayIndex", self.include_array_index.as_deref())
            .with_value("preserveNullAndEmptyArrays", self.preserve_null_and_empty_arrays);
        stage(Self::NAME, body.into_term())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwind_prefixes_path() {
        assert_eq!(
            Unwind::path("sizes").unwrap().statement(),
            json!({"$unwind": {"path": "$sizes", "preserveNullAndEmptyArrays": false}})
        );
    }

    #[test]
    fn test_unwind_options() {
        let unwind: Unwind = serde_json::from_value(json!({
            "path": "$items",
            "includeArrayIndex": "idx",
            "preserveNullAndEmptyArrays": true
        }))
        .unwrap();
        assert_eq!(
            unwind.statement(),
            json!({"$unwind": {"path": "$items", "includeArrayIndex": "idx", "preserveNullAndEmptyArrays": true}})
        );
    }

    #[test]
    fn test_unwind_rejects_variables() {
        assert!(Unwind::path("$$ROOT").is_err());
        assert!(Unwind::path("").is_err());
    }
}
