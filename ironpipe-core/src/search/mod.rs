// src/search/mod.rs
//! Full-text search operators and collectors
//!
//! Search operators follow the same [`Node`] contract as expression
//! operators, but render without a `$` prefix (`{"text": {..}}`). They are
//! combined with [`Compound`] and summarised with the [`Facet`] collector.

pub mod clauses;
pub mod compound;
pub mod config;
pub mod facet;

pub use clauses::{Autocomplete, Equals, Exists, MoreLikeThis, Range, Regex, Text, Wildcard};
pub use compound::Compound;
pub use config::{CountOptions, CountType, Fuzzy, HighlightOptions, Score, SearchConfig};
pub use facet::{Facet, FacetDefinition};

use crate::node::{Node, Term};
use serde::Deserialize;

// ============================================================================
// SEARCH OPERATOR
// ============================================================================

/// Any search operator: a clause or a compound of clauses
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchOperator {
    Autocomplete(Autocomplete),
    Compound(Compound),
    Equals(Equals),
    Exists(Exists),
    MoreLikeThis(MoreLikeThis),
    Range(Range),
    Regex(Regex),
    Text(Text),
    Wildcard(Wildcard),
}

impl SearchOperator {
    pub fn name(&self) -> &'static str {
        match self {
            SearchOperator::Autocomplete(_) => Autocomplete::NAME,
            SearchOperator::Compound(_) => Compound::NAME,
            SearchOperator::Equals(_) => Equals::NAME,
            SearchOperator::Exists(_) => Exists::NAME,
            SearchOperator::MoreLikeThis(_) => MoreLikeThis::NAME,
            SearchOperator::Range(_) => Range::NAME,
            SearchOperator::Regex(_) => Regex::NAME,
            SearchOperator::Text(_) => Text::NAME,
            SearchOperator::Wildcard(_) => Wildcard::NAME,
        }
    }
}

impl Node for SearchOperator {
    fn expression(&self) -> Term<'_> {
        match self {
            SearchOperator::Autocomplete(op) => op.expression(),
            SearchOperator::Compound(op) => op.expression(),
            SearchOperator::Equals(op) => op.expression(),
            SearchOperator::Exists(op) => op.expression(),
            SearchOperator::MoreLikeThis(op) => op.expression(),
            SearchOperator::Range(op) => op.expression(),
            SearchOperator::Regex(op) => op.expression(),
            SearchOperator::Text(op) => op.expression(),
            SearchOperator::Wildcard(op) => op.expression(),
        }
    }
}

macro_rules! search_operator_from {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for SearchOperator {
                fn from(op: $variant) -> Self {
                    SearchOperator::$variant(op)
                }
            }
        )+
    };
}

search_operator_from!(Autocomplete, Compound, Equals, Exists, MoreLikeThis, Range, Regex, Text, Wildcard);

// ============================================================================
// CLAUSE ROLE / OPERATOR SLOT
// ============================================================================

/// Role list of a [`Compound`] a clause is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClauseRole {
    Must,
    MustNot,
    #[default]
    Should,
    Filter,
}

/// Operator position of a search stage or facet
///
/// ```text
/// Empty ──should──► Bare(op)
/// Empty ──other───► Composite({role: [op]})
/// Bare(a) ──any───► Composite({should: [a], minimumShouldMatch: 1, role: [op]})
/// Composite(c) ───► Composite(c + op)
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OperatorSlot {
    #[default]
    Empty,
    Bare(SearchOperator),
    Composite(Compound),
}

impl OperatorSlot {
    /// Transition of the slot when one more clause is registered
    pub fn with_clause(self, role: ClauseRole, clause: SearchOperator) -> OperatorSlot {
        match self {
            OperatorSlot::Empty => match role {
                ClauseRole::Should => OperatorSlot::Bare(clause),
                _ => OperatorSlot::Composite(Compound::default().with_clause(role, clause)),
            },
            OperatorSlot::Bare(existing) => {
                OperatorSlot::Composite(Compound::promote(existing).with_clause(role, clause))
            }
            OperatorSlot::Composite(compound) => OperatorSlot::Composite(compound.with_clause(role, clause)),
        }
    }

    /// In-place form of [`OperatorSlot::with_clause`]
    pub fn add_clause(&mut self, role: ClauseRole, clause: SearchOperator) {
        let current = std::mem::take(self);
        *self = current.with_clause(role, clause);
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, OperatorSlot::Empty)
    }

    pub fn node(&self) -> Option<&dyn Node> {
        match self {
            OperatorSlot::Empty => None,
            OperatorSlot::Bare(operator) => Some(operator as &dyn Node),
            OperatorSlot::Composite(compound) => Some(compound as &dyn Node),
        }
    }
}

impl From<SearchOperator> for OperatorSlot {
    fn from(operator: SearchOperator) -> Self {
        OperatorSlot::Bare(operator)
    }
}
