// src/stages/paging.rs
// $limit, $skip and $sample

use super::{stage, StageName};
use crate::error::{IronPipeError, Result};
use crate::node::{Body, Node, Term};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LimitOptions {
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "LimitOptions")]
pub struct Limit {
    value: u64,
}

impl StageName for Limit {
    const NAME: &'static str = "limit";
}

impl Limit {
    pub fn new(options: LimitOptions) -> Result<Self> {
        if options.value == 0 {
            return Err(IronPipeError::validation("$limit value must be positive"));
        }
        Ok(Limit { value: options.value })
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

super::from_options!(Limit, LimitOptions);

impl Node for Limit {
    fn expression(&self) -> Term<'_> {
        stage(Self::NAME, Term::value(self.value))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkipOptions {
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SkipOptions")]
pub struct Skip {
    value: u64,
}

impl StageName for Skip {
    const NAME: &'static str = "skip";
}

impl Skip {
    pub fn new(options: SkipOptions) -> Result<Self> {
        Ok(Skip { value: options.value })
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

super::from_options!(Skip, SkipOptions);

impl Node for Skip {
    fn expression(&self) -> Term<'_> {
        stage(Self::NAME, Term::value(self.value))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SampleOptions {
    pub size: u64,
}

/// $sample: `{"size": n}` random documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SampleOptions")]
pub struct Sample {
    size: u64,
}

impl StageName for Sample {
    const NAME: &'static str = "sample";
}

impl Sample {
    pub fn new(options: SampleOptions) -> Result<Self> {
        if options.size == 0 {
            return Err(IronPipeError::validation("$sample size must be at least 1"));
        }
        Ok(Sample { size: options.size })
    }
}

super::from_options!(Sample, SampleOptions);

impl Node for Sample {
    fn expression(&self) -> Term<'_> {
        stage(Self::NAME, Body::new().with_value("size", self.size).into_term())
    }
}
