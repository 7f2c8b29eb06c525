// src/search/compound.rs
// Recursive boolean composite of search clauses

use super::{ClauseRole, SearchOperator};
use crate::error::{IronPipeError, Result};
use crate::node::{Body, Node, Term};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompoundOptions {
    #[serde(default)]
    pub must: Vec<SearchOperator>,
    #[serde(default)]
    pub must_not: Vec<SearchOperator>,
    #[serde(default)]
    pub should: Vec<SearchOperator>,
    #[serde(default)]
    pub filter: Vec<SearchOperator>,
    #[serde(default)]
    pub minimum_should_match: u32,
}

/// `compound`: clauses and nested compounds under must / mustNot / should / filter
///
/// Each compound owns its children, so nesting is an ordinary tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "CompoundOptions")]
pub struct Compound {
    must: Vec<SearchOperator>,
    must_not: Vec<SearchOperator>,
    should: Vec<SearchOperator>,
    filter: Vec<SearchOperator>,
    minimum_should_match: u32,
}

impl Compound {
    pub const NAME: &'static str = "compound";

    pub fn new(options: CompoundOptions) -> Result<Self> {
        if !options.should.is_empty() && options.minimum_should_match as usize > options.should.len() {
            return Err(IronPipeError::validation(format!(
                "compound minimumShouldMatch is {} but only {} should clauses are given",
                options.minimum_should_match,
                options.should.len()
            )));
        }
        Ok(Compound {
            must: options.must,
            must_not: options.must_not,
            should: options.should,
            filter: options.filter,
            minimum_should_match: options.minimum_should_match,
        })
    }

    /// Host a lone operator as the only `should` clause
    pub fn promote(operator: SearchOperator) -> Self {
        Compound {
            should: vec![operator],
            minimum_should_match: 1,
            ..Compound::default()
        }
    }

    /// Append `operator` to the list named by `role`; any operator is accepted
    pub fn register_clause(&mut self, role: ClauseRole, operator: impl Into<SearchOperator>) {
        let operator = operator.into();
        match role {
            ClauseRole::Must => self.must.push(operator),
            ClauseRole::MustNot => self.must_not.push(operator),
            ClauseRole::Should => self.should.push(operator),
            ClauseRole::Filter => self.filter.push(operator),
        }
    }

    pub fn with_clause(mut self, role: ClauseRole, operator: impl Into<SearchOperator>) -> Self {
        self.register_clause(role, operator);
        self
    }

    pub fn with_minimum_should_match(mut self, minimum: u32) -> Self {
        self.minimum_should_match = minimum;
        self
    }

    pub fn clauses(&self, role: ClauseRole) -> &[SearchOperator] {
        match role {
            ClauseRole::Must => &self.must,
            ClauseRole::MustNot => &self.must_not,
            ClauseRole::Should => &self.should,
            ClauseRole::Filter => &self.filter,
        }
    }

    pub fn minimum_should_match(&self) -> u32 {
        self.minimum_should_match
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.should.is_empty() && self.filter.is_empty()
    }
}

impl TryFrom<CompoundOptions> for Compound {
    type Error = IronPipeError;

    fn try_from(options: CompoundOptions) -> Result<Self> {
        Compound::new(options)
    }
}

impl Node for Compound {
    fn expression(&self) -> Term<'_> {
        let mut body = Body::new();
        if !self.must.is_empty() {
            body.insert("must", Term::nodes(&self.must));
        }
        if !self.must_not.is_empty() {
            body.insert("mustNot", Term::nodes(&self.must_not));
        }
        if !self.should.is_empty() {
            body.insert("should", Term::nodes(&self.should));
            body.insert("minimumShouldMatch", Term::value(self.minimum_should_match));
        }
        if !self.filter.is_empty() {
            body.insert("filter", Term::nodes(&self.filter));
        }
        Term::keyed(Self::NAME, body.into_term())
    }
}
