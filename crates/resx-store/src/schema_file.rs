//! Schema files: extra resource types and search parameters
//!
//! ```yaml
//! extends_builtin: true
//! resource_types:
//!   - name: Device
//!     params:
//!       - { name: identifier, type: token, path: identifier }
//!       - { name: patient, type: reference, path: patient, targets: [Patient] }
//! ```

#![allow(clippy::result_large_err)]

use crate::errors::{schema_validation, Result};
use resx_core::registry::{ResourceSchema, SearchParamDef, ID_PARAM};
use resx_core::SchemaRegistry;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    /// Start from the built-in types instead of an empty registry
    #[serde(default = "default_extends_builtin")]
    pub extends_builtin: bool,
    #[serde(default)]
    pub resource_types: Vec<ResourceTypeDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceTypeDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<SearchParamDef>,
}

fn default_extends_builtin() -> bool {
    true
}

/// Load a registry from a schema file
pub fn load_schema_file(path: &Path) -> Result<SchemaRegistry> {
    let content = fs::read_to_string(path)
        .map_err(|e| schema_validation(&format!("Failed to read schema file: {}", e)))?;
    parse_schema_str(&content)
}

/// Build a registry from schema file contents
pub fn parse_schema_str(content: &str) -> Result<SchemaRegistry> {
    let file: SchemaFile = serde_yaml::from_str(content)
        .map_err(|e| schema_validation(&format!("Schema parse error: {}", e)))?;

    let mut registry = if file.extends_builtin {
        SchemaRegistry::builtin()
    } else {
        SchemaRegistry::new()
    };

    for def in file.resource_types {
        if def.name.is_empty() || !def.name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(schema_validation(&format!(
                "Invalid resource type name '{}'",
                def.name
            )));
        }

        let mut seen = HashSet::new();
        let mut schema = ResourceSchema::new(def.name.as_str());
        for param in def.params {
            if param.name == ID_PARAM {
                return Err(schema_validation(&format!(
                    "{}: {} is implicit and cannot be redefined",
                    def.name, ID_PARAM
                )));
            }
            if param.path_segments().next().is_none() {
                return Err(schema_validation(&format!(
                    "{}: parameter {} has no path",
                    def.name, param.name
                )));
            }
            if !seen.insert(param.name.clone()) {
                return Err(schema_validation(&format!(
                    "{}: duplicate parameter {}",
                    def.name, param.name
                )));
            }
            schema = schema.with_param(param);
        }
        registry.register(schema);
    }

    Ok(registry)
}
