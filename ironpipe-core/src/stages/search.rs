// src/stages/search.rs
// $search, $searchMeta and $vectorSearch

use super::{stage, StageName};
use crate::error::{IronPipeError, Result};
use crate::node::{Body, Node, Term};
use crate::search::config::{validate_search_path, DEFAULT_INDEX};
use crate::search::{
    ClauseRole, CountOptions, Facet, FacetDefinition, HighlightOptions, OperatorSlot, SearchConfig,
    SearchOperator,
};
use serde::Deserialize;
use serde_json::{Map, Value};

// ============================================================================
// SEARCH ARGUMENTS
// ============================================================================

/// One named facet definition
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NamedFacet {
    pub name: String,
    pub definition: FacetDefinition,
}

/// Arguments of one `search` call on a pipeline
///
/// The first call creates the stage; later calls add the clause under `role`
/// or add the facet to the existing stage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchArgs {
    pub index: Option<String>,
    pub count: Option<CountOptions>,
    pub highlight: Option<HighlightOptions>,
    #[serde(default)]
    pub return_stored_source: bool,
    #[serde(default)]
    pub score_details: bool,
    pub operator: Option<SearchOperator>,
    #[serde(default)]
    pub role: ClauseRole,
    pub facet: Option<NamedFacet>,
}

impl SearchArgs {
    /// A clause registered under `should`
    pub fn clause(operator: impl Into<SearchOperator>) -> Self {
        SearchArgs {
            operator: Some(operator.into()),
            ..Default::default()
        }
    }

    pub fn clause_as(role: ClauseRole, operator: impl Into<SearchOperator>) -> Self {
        SearchArgs {
            operator: Some(operator.into()),
            role,
            ..Default::default()
        }
    }

    pub fn facet(name: &str, definition: FacetDefinition) -> Self {
        SearchArgs {
            facet: Some(NamedFacet {
                name: name.to_string(),
                definition,
            }),
            ..Default::default()
        }
    }

    pub fn with_index(mut self, index: &str) -> Self {
        self.index = Some(index.to_string());
        self
    }

    pub fn with_count(mut self, count: CountOptions) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_highlight(mut self, highlight: HighlightOptions) -> Self {
        self.highlight = Some(highlight);
        self
    }
}

// ============================================================================
// SEARCH BODY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchOptions {
    pub index: Option<String>,
    pub count: Option<CountOptions>,
    pub highlight: Option<HighlightOptions>,
    #[serde(default)]
    pub return_stored_source: bool,
    #[serde(default)]
    pub score_details: bool,
    pub operator: Option<SearchOperator>,
    pub collector: Option<Facet>,
}

/// Content shared by `$search` and `$searchMeta`
///
/// Holds exactly one of an operator or a collector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SearchOptions")]
pub struct SearchBody {
    config: SearchConfig,
    operator: OperatorSlot,
    collector: Option<Facet>,
}

impl SearchBody {
    pub fn new(options: SearchOptions) -> Result<Self> {
        let config = SearchConfig {
            index: options.index.unwrap_or_else(|| DEFAULT_INDEX.to_string()),
            count: options.count,
            highlight: options.highlight,
            return_stored_source: options.return_stored_source,
            score_details: options.score_details,
        };
        let operator = options.operator.map(OperatorSlot::Bare).unwrap_or_default();
        SearchBody::assemble(config, operator, options.collector)
    }

    /// Body built by the first `search` call of a pipeline
    pub fn from_args(args: SearchArgs) -> Result<Self> {
        let config = SearchConfig {
            index: args.index.unwrap_or_else(|| DEFAULT_INDEX.to_string()),
            count: args.count,
            highlight: args.highlight,
            return_stored_source: args.return_stored_source,
            score_details: args.score_details,
        };
        let mut operator = OperatorSlot::Empty;
        if let Some(clause) = args.operator {
            operator.add_clause(args.role, clause);
        }
        let collector = match args.facet {
            Some(NamedFacet { name, definition }) => {
                let mut facet = Facet::from_slot(std::mem::take(&mut operator));
                facet.add_facet(name, definition)?;
                Some(facet)
            }
            None => None,
        };
        SearchBody::assemble(config, operator, collector)
    }

    fn assemble(config: SearchConfig, operator: OperatorSlot, collector: Option<Facet>) -> Result<Self> {
        if config.index.is_empty() {
            return Err(IronPipeError::validation("search index name must not be empty"));
        }
        match (operator.is_empty(), collector.is_some()) {
            (false, false) | (true, true) => Ok(SearchBody {
                config,
                operator,
                collector,
            }),
            (false, true) => Err(IronPipeError::validation(
                "search accepts either an operator or a collector, not both",
            )),
            (true, false) => Err(IronPipeError::validation(
                "search requires an operator or a collector",
            )),
        }
    }

    /// Fold a later `search` call into this body
    ///
    /// Facet arguments move the operator into a facet collector the first
    /// time; clauses go to the collector's operator once one exists.
    pub fn apply(&mut self, args: SearchArgs) -> Result<()> {
        if args.operator.is_none() && args.facet.is_none() {
            return Err(IronPipeError::validation(
                "search requires an operator or a facet definition",
            ));
        }
        if args.index.as_deref() == Some("") {
            return Err(IronPipeError::validation("search index name must not be empty"));
        }
        if let Some(NamedFacet { name, definition }) = args.facet {
            self.add_facet(name, definition)?;
        }
        if let Some(clause) = args.operator {
            self.add_clause(args.role, clause);
        }
        if let Some(index) = args.index {
            self.config.index = index;
        }
        if args.count.is_some() {
            self.config.count = args.count;
        }
        if args.highlight.is_some() {
            self.config.highlight = args.highlight;
        }
        self.config.return_stored_source |= args.return_stored_source;
        self.config.score_details |= args.score_details;
        Ok(())
    }

    pub fn add_clause(&mut self, role: ClauseRole, clause: impl Into<SearchOperator>) {
        match &mut self.collector {
            Some(facet) => facet.add_clause(role, clause),
            None => self.operator.add_clause(role, clause.into()),
        }
    }

    pub fn add_facet(&mut self, name: impl Into<String>, definition: FacetDefinition) -> Result<()> {
        if let Some(facet) = &mut self.collector {
            return facet.add_facet(name, definition);
        }
        // the operator only moves once the definition is known to be valid
        definition.validate()?;
        let mut facet = Facet::from_slot(std::mem::take(&mut self.operator));
        facet.add_facet(name, definition)?;
        self.collector = Some(facet);
        Ok(())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn operator(&self) -> &OperatorSlot {
        &self.operator
    }

    pub fn collector(&self) -> Option<&Facet> {
        self.collector.as_ref()
    }

    /// `{index, highlight?, count?, returnStoredSource, scoreDetails, <operator | facet>}`
    fn render(&self) -> Body<'_> {
        let body = self.config.body();
        match (&self.collector, self.operator.node()) {
            (Some(facet), _) => body.splice("collector", facet.expression()),
            (None, Some(operator)) => body.splice("operator", operator.expression()),
            (None, None) => body,
        }
    }
}

impl TryFrom<SearchOptions> for SearchBody {
    type Error = IronPipeError;

    fn try_from(options: SearchOptions) -> Result<Self> {
        SearchBody::new(options)
    }
}

/// Declares a stage wrapping a [`SearchBody`]
macro_rules! search_stage {
    ($(#[$meta:meta])* $ty:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Deserialize)]
        #[serde(try_from = "SearchOptions")]
        pub struct $ty(SearchBody);

        impl StageName for $ty {
            const NAME: &'static str = $name;
        }

        impl $ty {
            pub fn new(options: SearchOptions) -> Result<Self> {
                Ok($ty(SearchBody::new(options)?))
            }

            pub fn from_args(args: SearchArgs) -> Result<Self> {
                Ok($ty(SearchBody::from_args(args)?))
            }

            pub fn body(&self) -> &SearchBody {
                &self.0
            }

            pub fn body_mut(&mut self) -> &mut SearchBody {
                &mut self.0
            }
        }

        super::from_options!($ty, SearchOptions);

        impl Node for $ty {
            fn expression(&self) -> Term<'_> {
                stage(Self::NAME, self.0.render().into_term())
            }
        }
    };
}

search_stage!(
    /// $search: full-text search over an Atlas Search index
    Search,
    "search"
);

search_stage!(
    /// $searchMeta: metadata (counts, facets) of a search, without documents
    SearchMeta,
    "searchMeta"
);

// ============================================================================
// VECTOR SEARCH
// ============================================================================

pub const MAX_VECTOR_LIMIT: u32 = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VectorSearchOptions {
    pub index: String,
    pub path: String,
    pub query_vector: Vec<f64>,
    pub num_candidates: u32,
    pub limit: u32,
    /// Pre-filter on indexed fields
    pub filter: Option<Map<String, Value>>,
}

/// $vectorSearch: approximate nearest neighbours
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "VectorSearchOptions")]
pub struct VectorSearch {
    options: VectorSearchOptions,
}

impl StageName for VectorSearch {
    const NAME: &'static str = "vectorSearch";
}

impl VectorSearch {
    /// `limit` in `1..=10000` and `num_candidates > limit`
    pub fn new(options: VectorSearchOptions) -> Result<Self> {
        if options.index.is_empty() {
            return Err(IronPipeError::validation("$vectorSearch index must not be empty"));
        }
        validate_search_path(&Value::from(options.path.as_str()), "$vectorSearch")?;
        if options.query_vector.is_empty() {
            return Err(IronPipeError::validation("$vectorSearch queryVector must not be empty"));
        }
        if options.limit == 0 || options.limit > MAX_VECTOR_LIMIT {
            return Err(IronPipeError::validation(format!(
                "$vectorSearch limit must be between 1 and {}, got {}",
                MAX_VECTOR_LIMIT, options.limit
            )));
        }
        if options.num_candidates <= options.limit {
            return Err(IronPipeError::validation(format!(
                "$vectorSearch numCandidates ({}) must be greater than limit ({})",
                options.num_candidates, options.limit
            )));
        }
        Ok(VectorSearch { options })
    }
}

super::from_options!(VectorSearch, VectorSearchOptions);

impl Node for VectorSearch {
    fn expression(&self) -> Term<'_> {
        let o = &self.options;
        let body = Body::new()
            .with_value("index", o.index.as_str())
            .with_value("path", o.path.as_str())
            .with_value("queryVector", o.query_vector.clone())
            .with_value("numCandidates", o.num_candidates)
            .with_value("limit", o.limit)
            .with_value_opt("filter", o.filter.clone().map(Value::Object));
        stage(Self::NAME, body.into_term())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Exists, Text};
    use serde_json::json;

    fn text(query: &str) -> SearchOperator {
        Text::query(query, "title").unwrap().into()
    }

    // ========== Search ==========

    #[test]
    fn test_search_with_operator() {
        let search = Search::from_args(SearchArgs::clause(text("baseball"))).unwrap();
        assert_eq!(
            search.statement(),
            json!({"$search": {
                "index": "default",
                "returnStoredSource": false,
                "scoreDetails": false,
                "text": {"query": "baseball", "path": "title"}
            }})
        );
    }

    #[test]
    fn test_search_requires_exactly_one() {
        assert!(Search::new(SearchOptions::default()).is_err());
        let both = SearchOptions {
            operator: Some(text("a")),
            collector: Some(Facet::default()),
            ..Default::default()
        };
        assert!(matches!(Search::new(both), Err(IronPipeError::Validation(_))));
    }

    #[test]
    fn test_search_meta_facet() {
        let args = SearchArgs::facet("genres", FacetDefinition::string("genres", 10).unwrap())
            .with_count(CountOptions::default());
        let meta = SearchMeta::from_args(args).unwrap();
        assert_eq!(
            meta.statement(),
            json!({"$searchMeta": {
                "index": "default",
                "count": {"type": "lowerBound"},
                "returnStoredSource": false,
                "scoreDetails": false,
                "facet": {"facets": {"genres": {"type": "string", "path": "genres", "numBuckets": 10}}}
            }})
        );
    }

    #[test]
    fn test_apply_promotes_operator() {
        let mut search = Search::from_args(SearchArgs::clause(text("a"))).unwrap();
        search
            .body_mut()
            .apply(SearchArgs::clause_as(ClauseRole::Filter, Exists::field("year").unwrap()))
            .unwrap();
        match search.body().operator() {
            OperatorSlot::Composite(compound) => {
                assert_eq!(compound.clauses(ClauseRole::Should).len(), 1);
                assert_eq!(compound.clauses(ClauseRole::Filter).len(), 1);
                assert_eq!(compound.minimum_should_match(), 1);
            }
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_facet_moves_operator_into_collector() {
        let mut search = Search::from_args(SearchArgs::clause(text("a"))).unwrap();
        search
            .body_mut()
            .apply(SearchArgs::facet("years", FacetDefinition::number("year", vec![json!(1), json!(2)], None).unwrap()))
            .unwrap();
        assert!(search.body().operator().is_empty());
        let statement = search.statement();
        assert_eq!(
            statement["$search"]["facet"]["operator"],
            json!({"text": {"query": "a", "path": "title"}})
        );

        search.body_mut().apply(SearchArgs::clause(text("b"))).unwrap();
        let statement = search.statement();
        assert!(statement["$search"]["facet"]["operator"]["compound"].is_object());
    }

    #[test]
    fn test_apply_invalid_facet_keeps_operator() {
        let mut search = Search::from_args(SearchArgs::clause(text("a"))).unwrap();
        let before = search.statement();
        let invalid = FacetDefinition::String {
            path: "genres".to_string(),
            num_buckets: 0,
        };
        assert!(search.body_mut().apply(SearchArgs::facet("genres", invalid)).is_err());
        assert!(search.body().collector().is_none());
        assert!(matches!(search.body().operator(), OperatorSlot::Bare(_)));
        assert_eq!(search.statement(), before);
    }

    #[test]
    fn test_apply_empty_index_fails() {
        let mut search = Search::from_args(SearchArgs::clause(text("a"))).unwrap();
        let before = search.statement();
        let args = SearchArgs {
            index: Some(String::new()),
            ..SearchArgs::clause(text("b"))
        };
        assert!(matches!(search.body_mut().apply(args), Err(IronPipeError::Validation(_))));
        assert_eq!(search.statement(), before);
    }

    #[test]
    fn test_apply_duplicate_facet_fails() {
        let definition = FacetDefinition::string("genres", 5).unwrap();
        let mut meta = SearchMeta::from_args(SearchArgs::facet("genres", definition.clone())).unwrap();
        assert!(meta.body_mut().apply(SearchArgs::facet("genres", definition)).is_err());
    }

    #[test]
    fn test_search_from_config_document() {
        let search: Search = serde_json::from_value(json!({
            "index": "movies",
            "operator": {"compound": {"must": [{"text": {"query": "a", "path": "title"}}]}}
        }))
        .unwrap();
        assert_eq!(search.body().config().index, "movies");
        assert!(matches!(search.body().operator(), OperatorSlot::Bare(SearchOperator::Compound(_))));
    }

    // ========== VectorSearch ==========

    fn vector_options(num_candidates: u32, limit: u32) -> VectorSearchOptions {
        VectorSearchOptions {
            index: "vectors".to_string(),
            path: "embedding".to_string(),
            query_vector: vec![0.1, 0.2],
            num_candidates,
            limit,
            filter: None,
        }
    }

    #[test]
    fn test_vector_search() {
        let stage = VectorSearch::new(vector_options(100, 10)).unwrap();
        assert_eq!(
            stage.statement(),
            json!({"$vectorSearch": {
                "index": "vectors",
                "path": "embedding",
                "queryVector": [0.1, 0.2],
                "numCandidates": 100,
                "limit": 10
            }})
        );
    }

    #[test]
    fn test_vector_search_bounds() {
        assert!(VectorSearch::new(vector_options(10, 10)).is_err());
        assert!(VectorSearch::new(vector_options(20_000, 10_001)).is_err());
        assert!(VectorSearch::new(vector_options(10, 0)).is_err());
        assert!(VectorSearch::new(vector_options(10_001, 10_000)).is_ok());
    }
}
