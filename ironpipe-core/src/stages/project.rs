// src/stages/project.rs
// $project: reshape documents

use super::{stage, Fields, StageName};
use crate::error::{IronPipeError, Result};
use crate::expression::{Expression, ExpressionMap};
use crate::fields::validate_field_path;
use crate::node::{Node, Term};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectOptions {
    /// Raw projection document
    pub projection: Option<ExpressionMap>,
    /// Fields kept, emitted as `{field: 1}`
    pub include: Option<Fields>,
    /// Fields dropped, emitted as `{field: 0}`
    pub exclude: Option<Fields>,
    /// Computed fields
    pub fields: Option<ExpressionMap>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ProjectOptions")]
pub struct Project {
    projection: ExpressionMap,
}

impl StageName for Project {
    const NAME: &'static str = "project";
}

impl Project {
    /// Merges projection, include, exclude and fields in that order
    pub fn new(options: ProjectOptions) -> Result<Self> {
        let mut projection = options.projection.unwrap_or_default();
        for (fields, flag) in [(options.include, 1), (options.exclude, 0)] {
            if let Some(fields) = fields {
                for name in fields.names() {
                    validate_projected(name)?;
                    projection.insert(name, flag);
                }
            }
        }
        if let Some(fields) = options.fields {
            for (key, expr) in fields.iter() {
                projection.insert(key, expr.clone());
            }
        }
        if projection.is_empty() {
            return Err(IronPipeError::validation(
                "$project requires at least one of projection, include, exclude or fields",
            ));
        }
        Ok(Project { projection })
    }

    pub fn include(fields: impl Into<Fields>) -> Result<Self> {
        Project::new(ProjectOptions {
            include: Some(fields.into()),
            ..Default::default()
        })
    }

    pub fn exclude(fields: impl Into<Fields>) -> Result<Self> {
        Project::new(ProjectOptions {
            exclude: Some(fields.into()),
            ..Default::default()
        })
    }

    pub fn get(&self, field: &str) -> Option<&Expression> {
        self.projection.get(field)
    }
}

fn validate_projected(name: &str) -> Result<()> {
    if name.starts_with('$') {
        return Err(IronPipeError::validation(format!(
            "projected field {:?} must not carry a '$' prefix",
            name
        )));
    }
    validate_field_path(name, "projected field")
}

super::from_options!(Project, ProjectOptions);

impl Node for Project {
    fn expression(&self) -> Term<'_> {
        stage(Self::NAME, self.projection.term())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use serde_json::json;

    #[test]
    fn test_include_exclude_merge() {
        let project = Project::new(ProjectOptions {
            include: Some(vec!["title", "year"].into()),
            exclude: Some("_id".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            project.statement(),
            json!({"$project": {"title": 1, "year": 1, "_id": 0}})
        );
    }

    #[test]
    fn test_computed_fields() {
        let project = Project::new(ProjectOptions {
            fields: Some(ExpressionMap::new().with("total", ops::add([ops::field("a"), ops::field("b")]))),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            project.statement(),
            json!({"$project": {"total": {"$add": ["$a", "$b"]}}})
        );
    }

    #[test]
    fn test_empty_projection_fails() {
        assert!(Project::new(ProjectOptions::default()).is_err());
        assert!(Project::include(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_prefixed_field_rejected() {
        let err = Project::exclude("$title").unwrap_err();
        assert!(err.to_string().contains("$title"));
    }

    #[test]
    fn test_project_from_options_document() {
        let project: Project =
            serde_json::from_value(json!({"include": {"title": true}, "projection": {"_id": 0}})).unwrap();
        assert_eq!(project.statement(), json!({"$project": {"_id": 0, "title": 1}}));
    }
}
