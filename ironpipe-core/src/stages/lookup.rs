// src/stages/lookup.rs
// $lookup: left outer join with another collection

use super::{stage, Stage, StageName};
use crate::error::{IronPipeError, Result};
use crate::expression::ExpressionMap;
use crate::fields::{validate_field_name, validate_field_path};
use crate::node::{Body, Node, Term};
use serde::Deserialize;

/// Which of the three `$lookup` forms a stage takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// Equality match: `from`, `localField`, `foreignField`
    Simple,
    /// Equality match plus a sub-pipeline over `let` variables
    Correlated,
    /// Sub-pipeline only
    Uncorrelated,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LookupOptions {
    #[serde(alias = "from")]
    pub right: Option<String>,
    #[serde(alias = "localField")]
    pub left_on: Option<String>,
    #[serde(alias = "foreignField")]
    pub right_on: Option<String>,
    #[serde(rename = "let")]
    pub let_: Option<ExpressionMap>,
    pub pipeline: Option<Vec<Stage>>,
    /// Output array field
    #[serde(rename = "as", default)]
    pub as_: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "LookupOptions")]
pub struct Lookup {
    kind: LookupKind,
    right: Option<String>,
    left_on: Option<String>,
    right_on: Option<String>,
    let_: Option<ExpressionMap>,
    pipeline: Vec<Stage>,
    as_: String,
}

impl StageName for Lookup {
    const NAME: &'static str = "lookup";
}

impl Lookup {
    /// Classify the given argument combination
    ///
    /// - simple: `right`, `left_on`, `right_on`; no `let`, no `pipeline`
    /// - correlated: `let`, `left_on`, `right_on` and `pipeline`
    /// - uncorrelated: `pipeline` without `let` or join fields
    pub fn new(options: LookupOptions) -> Result<Self> {
        validate_field_path(&options.as_, "$lookup as")?;
        if options.as_.starts_with('$') {
            return Err(IronPipeError::validation(format!(
                "$lookup as must be a bare field name, got {:?}",
                options.as_
            )));
        }
        if let Some(vars) = &options.let_ {
            for name in vars.keys() {
                validate_field_name(name, "$lookup let variable")?;
            }
        }

        let has_join_fields = options.left_on.is_some() && options.right_on.is_some();
        let kind = match (&options.right, has_join_fields, &options.let_, &options.pipeline) {
            (Some(_), true, None, None) => LookupKind::Simple,
            (_, true, Some(_), Some(_)) => LookupKind::Correlated,
            (_, _, None, Some(_)) if options.left_on.is_none() && options.right_on.is_none() => {
                LookupKind::Uncorrelated
            }
            _ => {
                return Err(IronPipeError::validation(
                    "$lookup requires right, left_on and right_on (simple), \
                     let, left_on, right_on and pipeline (correlated), \
                     or a pipeline without let (uncorrelated)",
                ))
            }
        };

        for field in [&options.left_on, &options.right_on].into_iter().flatten() {
            validate_field_path(field, "$lookup join field")?;
        }

        Ok(Lookup {
            kind,
            right: options.right,
            left_on: options.left_on,
            right_on: options.right_on,
            let_: options.let_,
            pipeline: options.pipeline.unwrap_or_default(),
            as_: options.as_,
        })
    }

    /// Simple equality lookup
    pub fn simple(right: &str, left_on: &str, right_on: &str, as_: &str) -> Result<Self> {
        Lookup::new(LookupOptions {
            right: Some(right.to_string()),
            left_on: Some(left_on.to_string()),
            right_on: Some(right_on.to_string()),
            as_: as_.to_string(),
            ..Default::default()
        })
    }

    pub fn kind(&self) -> LookupKind {
        self.kind
    }

    /// Name of the output array field
    pub fn as_field(&self) -> &str {
        &self.as_
    }
}

super::from_options!(Lookup, LookupOptions);

impl Node for Lookup {
    fn expression(&self) -> Term<'_> {
        let mut body = Body::new().with_value_opt("from", self.right.as_deref());
        if self.kind != LookupKind::Uncorrelated {
            body = body
                .with_value_opt("localField", self.left_on.as_deref())
                .with_value_opt("foreignField", self.right_on.as_deref());
        }
        if self.kind == LookupKind::Correlated {
            body = body.with_node_opt("let", self.let_.as_ref());
        }
        if self.kind != LookupKind::Simple {
            body = body.with("pipeline", Term::nodes(&self.pipeline));
        }
        stage(Self::NAME, body.with_value("as", self.as_.as_str()).into_term())
    }
}
