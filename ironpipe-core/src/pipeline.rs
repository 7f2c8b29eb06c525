// src/pipeline.rs
//! Pipeline composer
//!
//! A [`Pipeline`] is an ordered list of validated [`Stage`]s, plus the
//! collection it runs against and optionally the handle that runs it.
//! Builder methods append one stage each and return the pipeline again:
//!
//! ```
//! use ironpipe_core::stages::{LimitOptions, MatchOptions, SortOptions};
//! use ironpipe_core::Pipeline;
//! use serde_json::json;
//!
//! # fn main() -> ironpipe_core::Result<()> {
//! let mut pipeline = Pipeline::new();
//! pipeline
//!     .match_(MatchOptions {
//!         query: json!({"status": "active"}).as_object().cloned(),
//!         ..Default::default()
//!     })?
//!     .sort(SortOptions {
//!         by: Some(vec!["year"].into()),
//!         ..Default::default()
//!     })?
//!     .limit(LimitOptions { value: 1 })?;
//!
//! assert_eq!(
//!     pipeline.export(),
//!     vec![
//!         json!({"$match": {"status": "active"}}),
//!         json!({"$sort": {"year": 1}}),
//!         json!({"$limit": 1}),
//!     ]
//! );
//! # Ok(())
//! # }
//! ```

use crate::error::{IronPipeError, Result};
use crate::executor::{AsyncExecutor, Executor};
use crate::expression::ExpressionMap;
use crate::fields::ROOT;
use crate::node::Node;
use crate::ops;
use crate::stages::*;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::ops::{Add, AddAssign, Index};
use std::slice::SliceIndex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// ============================================================================
// JOIN
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinHow {
    #[default]
    Left,
    Right,
    Inner,
}

/// Arguments of [`Pipeline::join`]: `on`, or both `left_on` and `right_on`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinOptions {
    pub other: String,
    #[serde(default)]
    pub how: JoinHow,
    pub on: Option<String>,
    pub left_on: Option<String>,
    pub right_on: Option<String>,
}

impl JoinOptions {
    /// Join on a field with the same name on both sides
    pub fn on(other: &str, how: JoinHow, on: &str) -> Self {
        JoinOptions {
            other: other.to_string(),
            how,
            on: Some(on.to_string()),
            ..Default::default()
        }
    }

    pub fn fields(other: &str, how: JoinHow, left_on: &str, right_on: &str) -> Self {
        JoinOptions {
            other: other.to_string(),
            how,
            left_on: Some(left_on.to_string()),
            right_on: Some(right_on.to_string()),
            ..Default::default()
        }
    }

    fn keys(&self) -> Result<(&str, &str)> {
        match (&self.on, &self.left_on, &self.right_on) {
            (Some(on), None, None) => Ok((on, on)),
            (None, Some(left), Some(right)) => Ok((left, right)),
            (Some(_), _, _) => Err(IronPipeError::composition(
                "join accepts either on or left_on/right_on, not both",
            )),
            _ => Err(IronPipeError::composition(
                "join requires on, or both left_on and right_on",
            )),
        }
    }
}

/// Field the joined document is looked up into before being merged
fn join_field(collection: &str) -> String {
    format!("__{}__", collection.to_lowercase())
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Ordered list of stages, plus where and how to run them
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
    collection: Option<String>,
    executor: Option<Arc<dyn Executor>>,
    async_executor: Option<Arc<dyn AsyncExecutor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    /// Build a pipeline from configuration documents, validating every stage
    pub fn from_specs(specs: impl IntoIterator<Item = StageSpec>) -> Result<Self> {
        let mut pipeline = Pipeline::new();
        for spec in specs {
            pipeline.push(Stage::try_from(spec)?)?;
        }
        Ok(pipeline)
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_async_executor(mut self, executor: Arc<dyn AsyncExecutor>) -> Self {
        self.async_executor = Some(executor);
        self
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    fn append(&mut self, stage: impl Into<Stage>) -> &mut Self {
        let stage = stage.into();
        debug!(stage = stage.name(), position = self.stages.len(), "appending stage");
        self.stages.push(stage);
        self
    }

    // ========== Stages ==========

    pub fn add_fields(&mut self, fields: ExpressionMap) -> Result<&mut Self> {
        Ok(self.append(AddFields::new(fields)?))
    }

    pub fn bucket(&mut self, options: BucketOptions) -> Result<&mut Self> {
        Ok(self.append(Bucket::new(options)?))
    }

    pub fn bucket_auto(&mut self, options: BucketAutoOptions) -> Result<&mut Self> {
        Ok(self.append(BucketAuto::new(options)?))
    }

    pub fn count(&mut self, options: CountStageOptions) -> Result<&mut Self> {
        Ok(self.append(Count::new(options)?))
    }

    pub fn group(&mut self, options: GroupOptions) -> Result<&mut Self> {
        Ok(self.append(Group::new(options)?))
    }

    pub fn limit(&mut self, options: LimitOptions) -> Result<&mut Self> {
        Ok(self.append(Limit::new(options)?))
    }

    pub fn lookup(&mut self, options: LookupOptions) -> Result<&mut Self> {
        Ok(self.append(Lookup::new(options)?))
    }

    pub fn match_(&mut self, options: MatchOptions) -> Result<&mut Self> {
        Ok(self.append(Match::new(options)?))
    }

    pub fn out(&mut self, options: OutOptions) -> Result<&mut Self> {
        Ok(self.append(Out::new(options)?))
    }

    pub fn project(&mut self, options: ProjectOptions) -> Result<&mut Self> {
        Ok(self.append(Project::new(options)?))
    }

    pub fn replace_root(&mut self, options: ReplaceRootOptions) -> Result<&mut Self> {
        Ok(self.append(ReplaceRoot::new(options)?))
    }

    pub fn sample(&mut self, options: SampleOptions) -> Result<&mut Self> {
        Ok(self.append(Sample::new(options)?))
    }

    pub fn set(&mut self, fields: ExpressionMap) -> Result<&mut Self> {
        Ok(self.append(Set::new(fields)?))
    }

    pub fn skip(&mut self, options: SkipOptions) -> Result<&mut Self> {
        Ok(self.append(Skip::new(options)?))
    }

    pub fn sort(&mut self, options: SortOptions) -> Result<&mut Self> {
        Ok(self.append(Sort::new(options)?))
    }

    pub fn sort_by_count(&mut self, options: SortByCountOptions) -> Result<&mut Self> {
        Ok(self.append(SortByCount::new(options)?))
    }

    pub fn union_with(&mut self, options: UnionWithOptions) -> Result<&mut Self> {
        Ok(self.append(UnionWith::new(options)?))
    }

    pub fn unset(&mut self, fields: impl Into<Fields>) -> Result<&mut Self> {
        Ok(self.append(Unset::new(fields)?))
    }

    pub fn unwind(&mut self, options: UnwindOptions) -> Result<&mut Self> {
        Ok(self.append(Unwind::new(options)?))
    }

    pub fn vector_search(&mut self, options: VectorSearchOptions) -> Result<&mut Self> {
        Ok(self.append(VectorSearch::new(options)?))
    }

    // ========== Search ==========

    /// Start a `$search` stage, or fold the arguments into the leading one
    ///
    /// On an empty pipeline this appends a new stage. When the pipeline
    /// already starts with `$search` or `$searchMeta`, the clause or facet is
    /// added to that stage instead. Anything else fails: search must be the
    /// first stage.
    pub fn search(&mut self, args: SearchArgs) -> Result<&mut Self> {
        self.search_with(args, Search::from_args)
    }

    /// Same as [`Pipeline::search`], starting a `$searchMeta` stage
    pub fn search_meta(&mut self, args: SearchArgs) -> Result<&mut Self> {
        self.search_with(args, SearchMeta::from_args)
    }

    fn search_with<S: Into<Stage>>(
        &mut self,
        args: SearchArgs,
        build: fn(SearchArgs) -> Result<S>,
    ) -> Result<&mut Self> {
        if self.stages.is_empty() {
            return Ok(self.append(build(args)?));
        }
        let first = &mut self.stages[0];
        let name = first.name();
        match first.search_body_mut() {
            Some(body) => {
                body.apply(args)?;
                debug!(stage = name, "updated leading search stage");
                Ok(self)
            }
            None => Err(IronPipeError::composition(format!(
                "search must be the first stage, pipeline starts with ${}",
                name
            ))),
        }
    }

    // ========== Join ==========

    /// SQL-style join against another collection
    ///
    /// Expands to `$lookup` into a temporary field, `$unwind` of that field,
    /// `$replaceRoot` merging it into the document and `$project` dropping
    /// it. Inner joins add a `$match` right after the `$lookup` that drops
    /// documents without a partner.
    ///
    /// A right join swaps the pipeline's collection with `other`. Fields
    /// present on both sides are not prefixed, so the joined side wins.
    pub fn join(&mut self, options: JoinOptions) -> Result<&mut Self> {
        let (left_on, right_on) = options.keys()?;
        // a right join runs on `other`, so its keys trade sides too
        let (right, local, foreign) = match options.how {
            JoinHow::Right => {
                let collection = self.collection.clone().ok_or_else(|| {
                    IronPipeError::composition("right join requires the pipeline collection to be set")
                })?;
                (collection, right_on, left_on)
            }
            JoinHow::Left | JoinHow::Inner => (options.other.clone(), left_on, right_on),
        };
        let field = join_field(&right);

        let mut stages: Vec<Stage> = vec![
            Lookup::simple(&right, local, foreign, &field)?.into(),
            Unwind::preserving(&field)?.into(),
            ReplaceRoot::with(ops::merge_objects([ops::var(ROOT), ops::field(&field)]))?.into(),
            Project::exclude(field.as_str())?.into(),
        ];
        if options.how == JoinHow::Inner {
            let matched = Match::query(json!({ field.as_str(): {"$ne": []} }))?;
            stages.insert(stages.len() - 3, matched.into());
        }

        if options.how == JoinHow::Right {
            warn!(
                left = %options.other,
                right = %right,
                "right join does not prefix colliding field names; fields of {} overwrite fields of {}",
                right,
                options.other
            );
            self.collection = Some(options.other);
        }
        for stage in stages {
            self.append(stage);
        }
        Ok(self)
    }

    // ========== Stage list ==========

    /// Append an already built stage
    ///
    /// Search stages are only accepted as the first stage.
    pub fn push(&mut self, stage: impl Into<Stage>) -> Result<&mut Self> {
        let stage = stage.into();
        if stage.is_search() && !self.stages.is_empty() {
            return Err(IronPipeError::composition(format!(
                "${} must be the first stage",
                stage.name()
            )));
        }
        Ok(self.append(stage))
    }

    pub fn extend(&mut self, stages: impl IntoIterator<Item = Stage>) -> Result<&mut Self> {
        for stage in stages {
            self.push(stage)?;
        }
        Ok(self)
    }

    /// Insert a stage at `index`, shifting later stages back
    pub fn insert(&mut self, index: usize, stage: impl Into<Stage>) -> Result<&mut Self> {
        let stage = stage.into();
        if index > self.stages.len() {
            return Err(IronPipeError::composition(format!(
                "cannot insert at {} into a pipeline of {} stages",
                index,
                self.stages.len()
            )));
        }
        if stage.is_search() && index != 0 {
            return Err(IronPipeError::composition(format!(
                "${} must be the first stage",
                stage.name()
            )));
        }
        debug!(stage = stage.name(), position = index, "inserting stage");
        self.stages.insert(index, stage);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn first(&self) -> Option<&Stage> {
        self.stages.first()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stage> {
        self.stages.iter()
    }

    /// New pipeline holding a range of the stages, bound to the same collection and handles
    ///
    /// `None` when the range is out of bounds.
    pub fn slice<R>(&self, range: R) -> Option<Pipeline>
    where
        R: SliceIndex<[Stage], Output = [Stage]>,
    {
        let stages = self.stages.get(range)?.to_vec();
        Some(Pipeline {
            stages,
            collection: self.collection.clone(),
            executor: self.executor.clone(),
            async_executor: self.async_executor.clone(),
        })
    }

    // ========== Export & run ==========

    /// Wire form of every stage, in order
    pub fn export(&self) -> Vec<Value> {
        trace!(stages = self.stages.len(), "exporting pipeline");
        self.stages.iter().map(Node::statement).collect()
    }

    /// Run on the blocking executor and collect the resulting documents
    pub fn run(&self) -> Result<Vec<Value>> {
        let collection = self
            .collection
            .as_deref()
            .ok_or(IronPipeError::MissingPrerequisite("collection"))?;
        let executor = self
            .executor
            .as_ref()
            .ok_or(IronPipeError::MissingPrerequisite("db"))?;
        let statement = self.export();
        debug!(collection, stages = statement.len(), "running pipeline");
        Ok(executor.aggregate(collection, &statement)?)
    }

    /// Run on the async executor
    pub async fn run_async(&self) -> Result<Vec<Value>> {
        let collection = self
            .collection
            .as_deref()
            .ok_or(IronPipeError::MissingPrerequisite("collection"))?;
        let executor = self
            .async_executor
            .as_ref()
            .ok_or(IronPipeError::MissingPrerequisite("db"))?;
        let statement = self.export();
        debug!(collection, stages = statement.len(), "running pipeline");
        Ok(executor.aggregate(collection, &statement).await?)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .field("collection", &self.collection)
            .field("executor", &self.executor.is_some())
            .field("async_executor", &self.async_executor.is_some())
            .finish()
    }
}

impl PartialEq for Pipeline {
    /// Same stages against the same collection; handles are not compared
    fn eq(&self, other: &Self) -> bool {
        self.stages == other.stages && self.collection == other.collection
    }
}

impl Serialize for Pipeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.export())
    }
}

impl Index<usize> for Pipeline {
    type Output = Stage;

    fn index(&self, index: usize) -> &Stage {
        &self.stages[index]
    }
}

impl IntoIterator for Pipeline {
    type Item = Stage;
    type IntoIter = std::vec::IntoIter<Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.into_iter()
    }
}

impl<'a> IntoIterator for &'a Pipeline {
    type Item = &'a Stage;
    type IntoIter = std::slice::Iter<'a, Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

/// Left stages first; keeps the left pipeline's collection and handles
impl Add for Pipeline {
    type Output = Pipeline;

    fn add(mut self, rhs: Pipeline) -> Pipeline {
        self += rhs;
        self
    }
}

impl AddAssign for Pipeline {
    fn add_assign(&mut self, rhs: Pipeline) {
        self.stages.extend(rhs.stages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ClauseRole, Exists, FacetDefinition, OperatorSlot, Text};

    fn limit(value: u64) -> Limit {
        Limit::new(LimitOptions { value }).unwrap()
    }

    fn skip(value: u64) -> Skip {
        Skip::new(SkipOptions { value }).unwrap()
    }

    // ========== Builders ==========

    #[test]
    fn test_builders_chain() {
        let mut pipeline = Pipeline::new();
        pipeline
            .group(GroupOptions {
                by: Some("genre".into()),
                ..Default::default()
            })
            .unwrap()
            .skip(SkipOptions { value: 5 })
            .unwrap()
            .unset("rating")
            .unwrap();
        assert_eq!(
            pipeline.export(),
            vec![
                json!({"$group": {"_id": "$genre"}}),
                json!({"$skip": 5}),
                json!({"$unset": "rating"}),
            ]
        );
    }

    #[test]
    fn test_failed_builder_leaves_pipeline_untouched() {
        let mut pipeline = Pipeline::new();
        assert!(pipeline.limit(LimitOptions { value: 0 }).is_err());
        assert!(pipeline.is_empty());
    }

    // ========== Search ==========

    #[test]
    fn test_search_first_call_appends() {
        let mut pipeline = Pipeline::new();
        pipeline
            .search(SearchArgs::clause(Text::query("a", "title").unwrap()))
            .unwrap();
        assert_eq!(pipeline.len(), 1);
        assert!(pipeline[0].is_search());
    }

    #[test]
    fn test_search_second_call_promotes() {
        let mut pipeline = Pipeline::new();
        pipeline
            .search(SearchArgs::clause(Text::query("a", "title").unwrap()))
            .unwrap()
            .search(SearchArgs::clause_as(ClauseRole::Must, Exists::field("year").unwrap()))
            .unwrap();
        assert_eq!(pipeline.len(), 1);
        let exported = pipeline.export();
        assert_eq!(
            exported[0]["$search"]["compound"],
            json!({
                "must": [{"exists": {"path": "year"}}],
                "should": [{"text": {"query": "a", "path": "title"}}],
                "minimumShouldMatch": 1
            })
        );
    }

    #[test]
    fn test_search_not_first_fails() {
        let mut pipeline = Pipeline::new();
        pipeline.push(limit(3)).unwrap();
        let err = pipeline
            .search(SearchArgs::clause(Text::query("a", "title").unwrap()))
            .unwrap_err();
        assert!(matches!(err, IronPipeError::Composition(_)));
        assert!(err.to_string().contains("search must be the first stage"));
    }

    #[test]
    fn test_search_meta_then_search_folds_facet() {
        let mut pipeline = Pipeline::new();
        pipeline
            .search_meta(SearchArgs::facet("genres", FacetDefinition::string("genres", 5).unwrap()))
            .unwrap()
            .search(SearchArgs::facet("years", FacetDefinition::number("year", vec![json!(1990), json!(2000)], None).unwrap()))
            .unwrap();
        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline[0].name(), "searchMeta");
        let exported = pipeline.export();
        let facets = exported[0]["$searchMeta"]["facet"]["facets"].as_object().unwrap();
        assert_eq!(facets.len(), 2);
    }

    #[test]
    fn test_search_facet_keeps_operator() {
        let mut pipeline = Pipeline::new();
        pipeline
            .search(SearchArgs::clause(Text::query("a", "title").unwrap()))
            .unwrap()
            .search(SearchArgs::facet("genres", FacetDefinition::string("genres", 5).unwrap()))
            .unwrap();
        match &pipeline[0] {
            Stage::Search(search) => {
                assert!(search.body().operator().is_empty());
                let collector = search.body().collector().unwrap();
                assert!(matches!(collector.operator(), OperatorSlot::Bare(_)));
            }
            other => panic!("expected $search, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_facet_leaves_search_untouched() {
        let mut pipeline = Pipeline::new();
        pipeline
            .search(SearchArgs::clause(Text::query("a", "title").unwrap()))
            .unwrap();
        let before = pipeline.export();
        let invalid = FacetDefinition::String {
            path: "genres".to_string(),
            num_buckets: 0,
        };
        assert!(pipeline.search(SearchArgs::facet("genres", invalid)).is_err());
        assert_eq!(pipeline.export(), before);
    }

    // ========== Join ==========

    #[test]
    fn test_left_join_stages() {
        let mut pipeline = Pipeline::new().with_collection("orders");
        pipeline.join(JoinOptions::on("Customers", JoinHow::Left, "customer_id")).unwrap();
        assert_eq!(
            pipeline.export(),
            vec![
                json!({"$lookup": {
                    "from": "Customers",
                    "localField": "customer_id",
                    "foreignField": "customer_id",
                    "as": "__customers__"
                }}),
                json!({"$unwind": {"path": "$__customers__", "preserveNullAndEmptyArrays": true}}),
                json!({"$replaceRoot": {"newRoot": {"$mergeObjects": ["$$ROOT", "$__customers__"]}}}),
                json!({"$project": {"__customers__": 0}}),
            ]
        );
    }

    #[test]
    fn test_inner_join_filters_after_lookup() {
        let mut pipeline = Pipeline::new().with_collection("left");
        pipeline.push(limit(10)).unwrap();
        pipeline.join(JoinOptions::on("right", JoinHow::Inner, "zipcode")).unwrap();
        assert_eq!(pipeline.len(), 6);
        assert_eq!(pipeline[1].name(), "lookup");
        assert_eq!(pipeline[2].statement(), json!({"$match": {"__right__": {"$ne": []}}}));
        assert_eq!(pipeline[3].name(), "unwind");
    }

    #[test]
    fn test_right_join_swaps_collection() {
        let mut pipeline = Pipeline::new().with_collection("orders");
        pipeline
            .join(JoinOptions::fields("customers", JoinHow::Right, "customer_id", "id"))
            .unwrap();
        assert_eq!(pipeline.collection(), Some("customers"));
        assert_eq!(pipeline[0].statement()["$lookup"]["from"], json!("orders"));
        assert_eq!(pipeline[0].statement()["$lookup"]["as"], json!("__orders__"));
    }

    #[test]
    fn test_right_join_swaps_keys() {
        let mut pipeline = Pipeline::new().with_collection("orders");
        pipeline
            .join(JoinOptions::fields("customers", JoinHow::Right, "customer_id", "id"))
            .unwrap();
        assert_eq!(
            pipeline[0].statement(),
            json!({"$lookup": {
                "from": "orders",
                "localField": "id",
                "foreignField": "customer_id",
                "as": "__orders__"
            }})
        );
    }

    #[test]
    fn test_right_join_without_collection_fails() {
        let mut pipeline = Pipeline::new();
        let err = pipeline
            .join(JoinOptions::on("customers", JoinHow::Right, "id"))
            .unwrap_err();
        assert!(matches!(err, IronPipeError::Composition(_)));
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_join_key_combinations() {
        let mut pipeline = Pipeline::new();
        let both = JoinOptions {
            left_on: Some("a".to_string()),
            right_on: Some("b".to_string()),
            ..JoinOptions::on("other", JoinHow::Left, "id")
        };
        assert!(matches!(pipeline.join(both), Err(IronPipeError::Composition(_))));
        let half = JoinOptions {
            other: "other".to_string(),
            left_on: Some("a".to_string()),
            ..Default::default()
        };
        assert!(matches!(pipeline.join(half), Err(IronPipeError::Composition(_))));
        assert!(pipeline.is_empty());
    }

    // ========== Stage list ==========

    #[test]
    fn test_push_search_after_first_fails() {
        let search = Search::from_args(SearchArgs::clause(Text::query("a", "t").unwrap())).unwrap();
        let mut pipeline = Pipeline::new();
        pipeline.push(limit(1)).unwrap();
        assert!(pipeline.push(search.clone()).is_err());
        assert!(pipeline.insert(1, search.clone()).is_err());
        pipeline.insert(0, search).unwrap();
        assert!(pipeline[0].is_search());
    }

    #[test]
    fn test_insert_out_of_range_fails() {
        let mut pipeline = Pipeline::new();
        assert!(pipeline.insert(1, limit(1)).is_err());
    }

    #[test]
    fn test_slice_keeps_collection() {
        let mut pipeline = Pipeline::new().with_collection("books");
        let stages: Vec<Stage> = vec![limit(1).into(), skip(2).into(), limit(3).into()];
        pipeline.extend(stages).unwrap();
        let tail = pipeline.slice(1..).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.collection(), Some("books"));
        assert_eq!(tail[0].name(), "skip");
        assert!(pipeline.slice(2..9).is_none());
    }

    #[test]
    fn test_serialize_is_export() {
        let mut pipeline = Pipeline::new();
        pipeline.push(skip(1)).unwrap();
        assert_eq!(serde_json::to_value(&pipeline).unwrap(), json!([{"$skip": 1}]));
    }

    #[test]
    fn test_add_keeps_left_collection() {
        let mut left = Pipeline::new().with_collection("a");
        left.push(limit(1)).unwrap();
        let mut right = Pipeline::new().with_collection("b");
        right.push(skip(1)).unwrap();
        let joined = left + right;
        assert_eq!(joined.collection(), Some("a"));
        assert_eq!(joined.export(), vec![json!({"$limit": 1}), json!({"$skip": 1})]);
    }

    // ========== Run ==========

    #[test]
    fn test_run_prerequisites() {
        let pipeline = Pipeline::new();
        assert_eq!(pipeline.run().unwrap_err().to_string(), "collection is not defined");
        let pipeline = Pipeline::new().with_collection("books");
        assert_eq!(pipeline.run().unwrap_err().to_string(), "db is not defined");
    }

    #[test]
    fn test_run_with_closure_executor() {
        let executor = |collection: &str, stages: &[Value]| -> anyhow::Result<Vec<Value>> {
            Ok(vec![json!({"collection": collection, "stages": stages.len()})])
        };
        let mut pipeline = Pipeline::new()
            .with_collection("books")
            .with_executor(Arc::new(executor));
        pipeline.push(limit(2)).unwrap();
        assert_eq!(pipeline.run().unwrap(), vec![json!({"collection": "books", "stages": 1})]);
    }
}
