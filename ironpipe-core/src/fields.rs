// src/fields.rs
// Field path and variable references: `$field`, `$$var`, name validation

//! Field path and variable reference helpers
//!
//! Field references carry exactly one `$` (`"$address.city"`), variable
//! references carry two (`"$$ROOT"`, `"$$this"`). Builders accept bare names
//! and call [`ensure_field_prefix`] before emitting them.

use crate::error::{IronPipeError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

// ============================================================================
// SYSTEM VARIABLES
// ============================================================================

pub const ROOT: &str = "$$ROOT";
pub const CURRENT: &str = "$$CURRENT";
pub const REMOVE: &str = "$$REMOVE";
pub const NOW: &str = "$$NOW";
pub const CLUSTER_TIME: &str = "$$CLUSTER_TIME";
pub const DESCEND: &str = "$$DESCEND";
pub const PRUNE: &str = "$$PRUNE";
pub const KEEP: &str = "$$KEEP";
pub const SEARCH_META: &str = "$$SEARCH_META";
pub const USER_ROLES: &str = "$$USER_ROLES";

lazy_static! {
    /// Names (without `$$`) of the variables the database binds itself
    static ref SYSTEM_VARIABLES: HashSet<&'static str> = [
        "ROOT",
        "CURRENT",
        "REMOVE",
        "NOW",
        "CLUSTER_TIME",
        "DESCEND",
        "PRUNE",
        "KEEP",
        "SEARCH_META",
        "USER_ROLES",
    ]
    .into_iter()
    .collect();

    /// One path segment: no leading `$`, no dots, no NUL
    static ref FIELD_NAME: Regex = Regex::new(r"^[^$.\x00][^.\x00]*$").expect("valid field name pattern");

    /// Dotted path, optionally already carrying its `$`
    static ref FIELD_PATH: Regex =
        Regex::new(r"^\$?[^$.\x00][^.\x00]*(\.[^.\x00]+)*$").expect("valid field path pattern");
}

// ============================================================================
// PREFIXING
// ============================================================================

/// `"name"` -> `"$name"`
pub fn field_ref(name: &str) -> String {
    format!("${}", name)
}

/// `"name"` -> `"$$name"`
pub fn var_ref(name: &str) -> String {
    format!("$${}", name)
}

/// Prefix a bare field name with `$`, leave references untouched
///
/// ```
/// use ironpipe_core::fields::ensure_field_prefix;
///
/// assert_eq!(ensure_field_prefix("year"), "$year");
/// assert_eq!(ensure_field_prefix("$year"), "$year");
/// assert_eq!(ensure_field_prefix("$$ROOT"), "$$ROOT");
/// ```
pub fn ensure_field_prefix(path: &str) -> String {
    if path.starts_with('$') {
        path.to_string()
    } else {
        field_ref(path)
    }
}

/// `"$a.b"` -> `"a.b"`; variables keep their name without `$$`
pub fn strip_field_prefix(path: &str) -> &str {
    path.trim_start_matches('$')
}

pub fn is_system_variable(name: &str) -> bool {
    SYSTEM_VARIABLES.contains(strip_field_prefix(name))
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate a single output field name (no `$` prefix, no dots)
pub fn validate_field_name(name: &str, what: &str) -> Result<()> {
    if FIELD_NAME.is_match(name) {
        Ok(())
    } else {
        Err(IronPipeError::validation(format!(
            "{} must be a non-empty field name without '$' prefix or '.': {:?}",
            what, name
        )))
    }
}

/// Validate a dotted field path, with or without its `$`
pub fn validate_field_path(path: &str, what: &str) -> Result<()> {
    if FIELD_PATH.is_match(path) {
        Ok(())
    } else {
        Err(IronPipeError::validation(format!(
            "{} must be a valid field path: {:?}",
            what, path
        )))
    }
}
