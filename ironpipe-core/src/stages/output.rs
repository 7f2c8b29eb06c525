// src/stages/output.rs
// $count, $out and $unionWith

use super::{stage, Stage, StageName};
use crate::error::{IronPipeError, Result};
use crate::fields::validate_field_name;
use crate::node::{Body, Node, Term};
use serde::Deserialize;

fn validate_collection(name: &str, what: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('$') || name.contains('\0') {
        return Err(IronPipeError::validation(format!(
            "{} must be a collection name, got {:?}",
            what, name
        )));
    }
    Ok(())
}

// ============================================================================
// COUNT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CountStageOptions {
    /// Output field holding the count
    pub field: String,
}

/// $count: `{"$count": "field"}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CountStageOptions")]
pub struct Count {
    field: String,
}

impl StageName for Count {
    const NAME: &'static str = "count";
}

impl Count {
    pub fn new(options: CountStageOptions) -> Result<Self> {
        validate_field_name(&options.field, "$count field")?;
        Ok(Count { field: options.field })
    }

    pub fn field(field: &str) -> Result<Self> {
        Count::new(CountStageOptions {
            field: field.to_string(),
        })
    }
}

super::from_options!(Count, CountStageOptions);

impl Node for Count {
    fn expression(&self) -> Term<'_> {
        stage(Self::NAME, Term::value(self.field.as_str()))
    }
}

// ============================================================================
// OUT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutOptions {
    pub coll: String,
    pub db: Option<String>,
}

/// $out: `"coll"` or `{"db": .., "coll": ..}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "OutOptions")]
pub struct Out {
    coll: String,
    db: Option<String>,
}

impl StageName for Out {
    const NAME: &'static str = "out";
}

impl Out {
    pub fn new(options: OutOptions) -> Result<Self> {
        validate_collection(&options.coll, "$out coll")?;
        if let Some(db) = &options.db {
            if db.is_empty() || db.contains(&['/', '\\', '.', ' ', '"', '$'][..]) {
                return Err(IronPipeError::validation(format!(
                    "$out db must be a database name, got {:?}",
                    db
                )));
            }
        }
        Ok(Out {
            coll: options.coll,
            db: options.db,
        })
    }

    pub fn collection(coll: &str) -> Result<Self> {
        Out::new(OutOptions {
            coll: coll.to_string(),
            db: None,
        })
    }
}

super::from_options!(Out, OutOptions);

impl Node for Out {
    fn expression(&self) -> Term<'_> {
        let body = match &self.db {
            Some(db) => Body::new()
                .with_value("db", db.as_str())
                .with_value("coll", self.coll.as_str())
                .into_term(),
            None => Term::value(self.coll.as_str()),
        };
        stage(Self::NAME, body)
    }
}

// ============================================================================
// UNION WITH
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnionWithOptions {
    pub coll: String,
    pub pipeline: Option<Vec<Stage>>,
}

/// $unionWith: append the documents of another collection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "UnionWithOptions")]
pub struct UnionWith {
    coll: String,
    pipeline: Option<Vec<Stage>>,
}

impl StageName for UnionWith {
    const NAME: &'static str = "unionWith";
}

impl UnionWith {
    pub fn new(options: UnionWithOptions) -> Result<Self> {
        validate_collection(&options.coll, "$unionWith coll")?;
        if let Some(pipeline) = &options.pipeline {
            if let Some(stage) = pipeline.iter().find(|stage| stage.is_output()) {
                return Err(IronPipeError::validation(format!(
                    "$unionWith pipeline cannot contain ${}",
                    stage.name()
                )));
            }
        }
        Ok(UnionWith {
            coll: options.coll,
            pipeline: options.pipeline,
        })
    }

    pub fn collection(coll: &str) -> Result<Self> {
        UnionWith::new(UnionWithOptions {
            coll: coll.to_string(),
            pipeline: None,
        })
    }
}

super::from_options!(UnionWith, UnionWithOptions);

impl Node for UnionWith {
    fn expression(&self) -> Term<'_> {
        let mut body = Body::new().with_value("coll", self.coll.as_str());
        if let Some(pipeline) = &self.pipeline {
            body.insert("pipeline", Term::nodes(pipeline));
        }
        stage(Self::NAME, body.into_term())
    }
}
