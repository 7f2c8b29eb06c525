// src/stages/mod.rs
//! Pipeline stages
//!
//! Every stage renders as `{"$<name>": <body>}` and validates its options
//! when it is built. Each stage has a plain options struct, and the
//! [`StageSpec`] enum gathers them into the configuration form of a stage:
//!
//! ```json
//! [{"match": {"query": {"status": "active"}}}, {"sort": {"by": ["year"]}}]
//! ```
//!
//! Deserializing a [`Stage`] goes through [`StageSpec`], so a configuration
//! document always yields validated stages.

use crate::expression::ExpressionMap;
use crate::node::{Node, Term};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fixed database name of a stage, without its `$`
pub trait StageName {
    const NAME: &'static str;
}

/// `{"$<name>": body}`
pub(crate) fn stage<'a>(name: &str, body: Term<'a>) -> Term<'a> {
    Term::keyed(format!("${}", name), body)
}

/// Implements `TryFrom<options>` through the stage's validating constructor
macro_rules! from_options {
    ($ty:ident, $options:ty) => {
        impl TryFrom<$options> for $ty {
            type Error = $crate::error::IronPipeError;

            fn try_from(options: $options) -> $crate::error::Result<Self> {
                $ty::new(options)
            }
        }
    };
}

pub(crate) use from_options;

pub mod bucket;
pub mod group;
pub mod lookup;
pub mod match_;
pub mod output;
pub mod paging;
pub mod project;
pub mod reshape;
pub mod search;
pub mod sort;
pub mod unwind;

pub use bucket::{Bucket, BucketAuto, BucketAutoOptions, BucketOptions, Granularity};
pub use group::{Group, GroupKey, GroupOptions, SortByCount, SortByCountOptions};
pub use lookup::{Lookup, LookupKind, LookupOptions};
pub use match_::{Match, MatchOptions};
pub use output::{Count, CountStageOptions, Out, OutOptions, UnionWith, UnionWithOptions};
pub use paging::{Limit, LimitOptions, Sample, SampleOptions, Skip, SkipOptions};
pub use project::{Project, ProjectOptions};
pub use reshape::{AddFields, ReplaceRoot, ReplaceRootOptions, Set, Unset};
pub use search::{
    NamedFacet, Search, SearchArgs, SearchBody, SearchMeta, SearchOptions, VectorSearch,
    VectorSearchOptions,
};
pub use sort::{Sort, SortDirection, SortOptions};
pub use unwind::{Unwind, UnwindOptions};

// ============================================================================
// FIELD LISTS
// ============================================================================

/// One field, a list of fields, or a `{field: flag}` map
///
/// In the map form only keys with a truthy flag are selected by [`Fields::names`];
/// [`Fields::flags`] keeps the falsy ones too.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Fields {
    One(String),
    Many(Vec<String>),
    Keys(Map<String, Value>),
}

impl Fields {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Fields::One(field) => vec![field.as_str()],
            Fields::Many(fields) => fields.iter().map(String::as_str).collect(),
            Fields::Keys(_) => self
                .flags()
                .into_iter()
                .filter(|(_, flag)| *flag)
                .map(|(field, _)| field)
                .collect(),
        }
    }

    /// Every field with its flag; names in the list forms are always set
    pub fn flags(&self) -> Vec<(&str, bool)> {
        match self {
            Fields::Keys(flags) => flags
                .iter()
                .map(|(field, flag)| (field.as_str(), is_truthy(flag)))
                .collect(),
            _ => self.names().into_iter().map(|field| (field, true)).collect(),
        }
    }
}

fn is_truthy(flag: &Value) -> bool {
    match flag {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        _ => true,
    }
}

impl From<&str> for Fields {
    fn from(field: &str) -> Self {
        Fields::One(field.to_string())
    }
}

impl From<String> for Fields {
    fn from(field: String) -> Self {
        Fields::One(field)
    }
}

impl From<Vec<&str>> for Fields {
    fn from(fields: Vec<&str>) -> Self {
        Fields::Many(fields.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Fields {
    fn from(fields: Vec<String>) -> Self {
        Fields::Many(fields)
    }
}

// ============================================================================
// STAGE UNION
// ============================================================================

/// Declares [`Stage`], its configuration form [`StageSpec`] and the wiring
macro_rules! stage_union {
    ($($variant:ident($ty:ident, $spec:ty)),+ $(,)?) => {
        /// Any pipeline stage
        #[derive(Debug, Clone, PartialEq, Deserialize)]
        #[serde(try_from = "StageSpec")]
        pub enum Stage {
            $($variant($ty)),+
        }

        /// Configuration form of a stage: `{"<name>": options}`
        #[derive(Debug, Clone, PartialEq, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum StageSpec {
            $($variant($spec)),+
        }

        impl Stage {
            /// Database name of the stage, without its `$`
            pub fn name(&self) -> &'static str {
                match self {
                    $(Stage::$variant(_) => <$ty as StageName>::NAME),+
                }
            }
        }

        impl Node for Stage {
            fn expression(&self) -> Term<'_> {
                match self {
                    $(Stage::$variant(stage) => stage.expression()),+
                }
            }
        }

        impl TryFrom<StageSpec> for Stage {
            type Error = crate::error::IronPipeError;

            fn try_from(spec: StageSpec) -> crate::error::Result<Self> {
                match spec {
                    $(StageSpec::$variant(options) => $ty::try_from(options).map(Stage::$variant)),+
                }
            }
        }

        $(
            impl From<$ty> for Stage {
                fn from(stage: $ty) -> Self {
                    Stage::$variant(stage)
                }
            }
        )+
    };
}

stage_union! {
    AddFields(AddFields, ExpressionMap),
    Bucket(Bucket, BucketOptions),
    BucketAuto(BucketAuto, BucketAutoOptions),
    Count(Count, CountStageOptions),
    Group(Group, GroupOptions),
    Limit(Limit, LimitOptions),
    Lookup(Lookup, LookupOptions),
    Match(Match, MatchOptions),
    Out(Out, OutOptions),
    Project(Project, ProjectOptions),
    ReplaceRoot(ReplaceRoot, ReplaceRootOptions),
    Sample(Sample, SampleOptions),
    Search(Search, SearchOptions),
    SearchMeta(SearchMeta, SearchOptions),
    Set(Set, ExpressionMap),
    Skip(Skip, SkipOptions),
    Sort(Sort, SortOptions),
    SortByCount(SortByCount, SortByCountOptions),
    UnionWith(UnionWith, UnionWithOptions),
    Unset(Unset, Fields),
    Unwind(Unwind, UnwindOptions),
    VectorSearch(VectorSearch, VectorSearchOptions),
}

impl Stage {
    /// `$search` or `$searchMeta`
    pub fn is_search(&self) -> bool {
        matches!(self, Stage::Search(_) | Stage::SearchMeta(_))
    }

    /// Stages that write their input somewhere and must come last
    pub fn is_output(&self) -> bool {
        matches!(self, Stage::Out(_))
    }

    pub fn search_body_mut(&mut self) -> Option<&mut SearchBody> {
        match self {
            Stage::Search(search) => Some(search.body_mut()),
            Stage::SearchMeta(meta) => Some(meta.body_mut()),
            _ => None,
        }
    }
}
