// src/search/facet.rs
// Facet collector: bucketed metadata about search matches

use super::{ClauseRole, OperatorSlot, SearchOperator};
use crate::error::{IronPipeError, Result};
use crate::node::{Body, Node, Term};
use crate::stages::bucket::{is_date_boundary, validate_boundaries};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_NUM_BUCKETS: u32 = 10;
pub const MAX_NUM_BUCKETS: u32 = 1000;

fn default_num_buckets() -> u32 {
    DEFAULT_NUM_BUCKETS
}

/// One named facet of a [`Facet`] collector
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FacetDefinition {
    #[serde(rename_all = "camelCase")]
    String {
        path: String,
        #[serde(default = "default_num_buckets")]
        num_buckets: u32,
    },
    #[serde(rename_all = "camelCase")]
    Number {
        path: String,
        boundaries: Vec<Value>,
        default: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Date {
        path: String,
        boundaries: Vec<Value>,
        default: Option<String>,
    },
}

impl FacetDefinition {
    pub fn string(path: &str, num_buckets: u32) -> Result<Self> {
        let facet = FacetDefinition::String {
            path: path.to_string(),
            num_buckets,
        };
        facet.validate()?;
        Ok(facet)
    }

    pub fn number(path: &str, boundaries: Vec<Value>, default: Option<&str>) -> Result<Self> {
        let facet = FacetDefinition::Number {
            path: path.to_string(),
            boundaries,
            default: default.map(str::to_string),
        };
        facet.validate()?;
        Ok(facet)
    }

    pub fn date(path: &str, boundaries: Vec<Value>, default: Option<&str>) -> Result<Self> {
        let facet = FacetDefinition::Date {
            path: path.to_string(),
            boundaries,
            default: default.map(str::to_string),
        };
        facet.validate()?;
        Ok(facet)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            FacetDefinition::String { path, num_buckets } => {
                validate_facet_path(path)?;
                if *num_buckets == 0 || *num_buckets > MAX_NUM_BUCKETS {
                    return Err(IronPipeError::validation(format!(
                        "string facet numBuckets must be between 1 and {}, got {}",
                        MAX_NUM_BUCKETS, num_buckets
                    )));
                }
                Ok(())
            }
            FacetDefinition::Number { path, boundaries, .. } => {
                validate_facet_path(path)?;
                if !boundaries.iter().all(Value::is_number) {
                    return Err(IronPipeError::validation("number facet boundaries must be numbers"));
                }
                validate_boundaries(boundaries, "number facet")
            }
            FacetDefinition::Date { path, boundaries, .. } => {
                validate_facet_path(path)?;
                if !boundaries.iter().all(is_date_boundary) {
                    return Err(IronPipeError::validation("date facet boundaries must be dates"));
                }
                validate_boundaries(boundaries, "date facet")
            }
        }
    }
}

fn validate_facet_path(path: &str) -> Result<()> {
    if path.is_empty() || path.starts_with('$') {
        return Err(IronPipeError::validation(format!(
            "facet path must be a bare field name, got {:?}",
            path
        )));
    }
    Ok(())
}

impl Node for FacetDefinition {
    fn expression(&self) -> Term<'_> {
        let body = match self {
            FacetDefinition::String { path, num_buckets } => Body::new()
                .with_value("type", "string")
                .with_value("path", path.as_str())
                .with_value("numBuckets", *num_buckets),
            FacetDefinition::Number { path, boundaries, default } => Body::new()
                .with_value("type", "number")
                .with_value("path", path.as_str())
                .with_value("boundaries", boundaries.clone())
                .with_value_opt("default", default.as_deref()),
            FacetDefinition::Date { path, boundaries, default } => Body::new()
                .with_value("type", "date")
                .with_value("path", path.as_str())
                .with_value("boundaries", boundaries.clone())
                .with_value_opt("default", default.as_deref()),
        };
        body.into_term()
    }
}

// ============================================================================
// FACET COLLECTOR
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FacetOptions {
    pub operator: Option<SearchOperator>,
    /// name -> definition, in declaration order
    #[serde(default)]
    pub facets: Map<String, Value>,
}

/// `facet`: optional operator narrowing the matches, plus named facets
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "FacetOptions")]
pub struct Facet {
    operator: OperatorSlot,
    facets: Vec<(String, FacetDefinition)>,
}

impl Facet {
    pub const NAME: &'static str = "facet";

    pub fn new(options: FacetOptions) -> Result<Self> {
        let mut facet = Facet::default();
        if let Some(operator) = options.operator {
            facet.operator = OperatorSlot::Bare(operator);
        }
        for (name, definition) in options.facets {
            let definition: FacetDefinition = serde_json::from_value(definition)?;
            facet.add_facet(name, definition)?;
        }
        Ok(facet)
    }

    /// Facet over the matches of `operator`
    pub fn with_operator(operator: impl Into<SearchOperator>) -> Self {
        Facet {
            operator: OperatorSlot::Bare(operator.into()),
            facets: Vec::new(),
        }
    }

    /// Facet hosting an operator slot taken over from a search stage
    pub(crate) fn from_slot(operator: OperatorSlot) -> Self {
        Facet {
            operator,
            facets: Vec::new(),
        }
    }

    /// Fails when `name` is already defined or the definition is invalid
    pub fn add_facet(&mut self, name: impl Into<String>, definition: FacetDefinition) -> Result<()> {
        let name = name.into();
        definition.validate()?;
        if self.facets.iter().any(|(existing, _)| *existing == name) {
            return Err(IronPipeError::validation(format!(
                "facet {:?} is already defined",
                name
            )));
        }
        self.facets.push((name, definition));
        Ok(())
    }

    pub fn add_clause(&mut self, role: ClauseRole, clause: impl Into<SearchOperator>) {
        self.operator.add_clause(role, clause.into());
    }

    pub fn operator(&self) -> &OperatorSlot {
        &self.operator
    }

    pub fn facet(&self, name: &str) -> Option<&FacetDefinition> {
        self.facets
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, definition)| definition)
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

impl TryFrom<FacetOptions> for Facet {
    type Error = IronPipeError;

    fn try_from(options: FacetOptions) -> Result<Self> {
        Facet::new(options)
    }
}

impl Node for Facet {
    fn expression(&self) -> Term<'_> {
        let mut body = Body::new();
        if let Some(operator) = self.operator.node() {
            body.insert("operator", Term::Node(operator));
        }
        let facets = self
            .facets
            .iter()
            .map(|(name, definition)| (name.clone(), Term::Node(definition as &dyn Node)))
            .collect();
        body.insert("facets", Term::Map(facets));
        Term::keyed(Self::NAME, body.into_term())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::clauses::Text;
    use serde_json::json;

    // ========== Definitions ==========

    #[test]
    fn test_string_facet_bounds() {
        assert!(FacetDefinition::string("genres", 10).is_ok());
        assert!(FacetDefinition::string("genres", 0).is_err());
        assert!(FacetDefinition::string("genres", 1001).is_err());
        assert!(FacetDefinition::string("$genres", 5).is_err());
    }

    #[test]
    fn test_string_facet_default_buckets() {
        let facet: FacetDefinition =
            serde_json::from_value(json!({"type": "string", "path": "genres"})).unwrap();
        assert_eq!(
            facet.statement(),
            json!({"type": "string", "path": "genres", "numBuckets": 10})
        );
    }

    #[test]
    fn test_number_facet_boundaries() {
        assert!(FacetDefinition::number("year", vec![json!(1980), json!(1990)], None).is_ok());
        assert!(FacetDefinition::number("year", vec![json!(1980)], None).is_err());
        assert!(FacetDefinition::number("year", vec![json!(1990), json!(1980)], None).is_err());
        assert!(FacetDefinition::number("year", vec![json!(1980), json!(1980)], None).is_err());
        assert!(FacetDefinition::number("year", vec![json!("a"), json!("b")], None).is_err());
    }

    #[test]
    fn test_date_facet_renders_default() {
        let facet = FacetDefinition::date(
            "released",
            vec![json!("2000-01-01T00:00:00Z"), json!("2010-01-01T00:00:00Z")],
            Some("other"),
        )
        .unwrap();
        assert_eq!(
            facet.statement(),
            json!({
                "type": "date",
                "path": "released",
                "boundaries": ["2000-01-01T00:00:00Z", "2010-01-01T00:00:00Z"],
                "default": "other"
            })
        );
    }

    // ========== Collector ==========

    #[test]
    fn test_duplicate_facet_name_fails() {
        let mut facet = Facet::default();
        facet
            .add_facet("genres", FacetDefinition::string("genres", 5).unwrap())
            .unwrap();
        let err = facet
            .add_facet("genres", FacetDefinition::string("tags", 5).unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("genres"));
        assert_eq!(facet.len(), 1);
    }

    #[test]
    fn test_facet_with_operator() {
        let mut facet = Facet::with_operator(Text::query("space", "plot").unwrap());
        facet
            .add_facet("genres", FacetDefinition::string("genres", 5).unwrap())
            .unwrap();
        assert_eq!(
            facet.statement(),
            json!({"facet": {
                "operator": {"text": {"query": "space", "path": "plot"}},
                "facets": {"genres": {"type": "string", "path": "genres", "numBuckets": 5}}
            }})
        );
    }

    #[test]
    fn test_facet_deserialize() {
        let facet: Facet = serde_json::from_value(json!({
            "facets": {
                "genres": {"type": "string", "path": "genres"},
                "years": {"type": "number", "path": "year", "boundaries": [1990, 2000, 2010]}
            }
        }))
        .unwrap();
        assert_eq!(facet.len(), 2);
        assert!(facet.operator().is_empty());
        assert!(facet.facet("years").is_some());
    }
}
