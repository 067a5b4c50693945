//! Schema registry: resource type → search parameter definitions
//!
//! The registry is built once at start-up and passed by reference into the
//! transaction processor and the stores. Every registered type implicitly
//! supports `_id`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the implicit identity parameter
pub const ID_PARAM: &str = "_id";

/// Value type of a search parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchParamType {
    String,
    Token,
    Reference,
    Date,
}

/// A search parameter definition
///
/// `path` is a dotted element path into the resource body (`name.family`).
/// Arrays along the path are flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: SearchParamType,
    #[serde(default)]
    pub path: String,
    /// Allowed target types of a reference parameter (empty = any)
    #[serde(default)]
    pub targets: Vec<String>,
}

impl SearchParamDef {
    pub fn new(name: &str, param_type: SearchParamType, path: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            path: path.to_string(),
            targets: Vec::new(),
        }
    }

    pub fn with_targets(mut self, targets: &[&str]) -> Self {
        self.targets = targets.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Path segments, empty for the implicit `_id`
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.').filter(|s| !s.is_empty())
    }
}

/// Search metadata for one resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    resource_type: String,
    params: BTreeMap<String, SearchParamDef>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        let mut params = BTreeMap::new();
        params.insert(
            ID_PARAM.to_string(),
            SearchParamDef::new(ID_PARAM, SearchParamType::Token, ""),
        );
        Self {
            resource_type: resource_type.into(),
            params,
        }
    }

    pub fn with_param(mut self, def: SearchParamDef) -> Self {
        self.params.insert(def.name.clone(), def);
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn param(&self, name: &str) -> Option<&SearchParamDef> {
        self.params.get(name)
    }

    pub fn params(&self) -> impl Iterator<Item = &SearchParamDef> {
        self.params.values()
    }
}

/// Registry of every resource type the processor accepts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, ResourceSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the schema of a type
    pub fn register(&mut self, schema: ResourceSchema) {
        self.schemas
            .insert(schema.resource_type().to_string(), schema);
    }

    pub fn with_schema(mut self, schema: ResourceSchema) -> Self {
        self.register(schema);
        self
    }

    pub fn is_registered(&self, resource_type: &str) -> bool {
        self.schemas.contains_key(resource_type)
    }

    pub fn schema(&self, resource_type: &str) -> Option<&ResourceSchema> {
        self.schemas.get(resource_type)
    }

    /// Look up a parameter definition for a type
    pub fn lookup(&self, resource_type: &str, param: &str) -> Option<&SearchParamDef> {
        self.schemas.get(resource_type).and_then(|s| s.param(param))
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Definitions for a small set of common clinical types
    pub fn builtin() -> Self {
        use SearchParamType as P;

        Self::new()
            .with_schema(
                ResourceSchema::new("Patient")
                    .with_param(SearchParamDef::new("identifier", P::Token, "identifier"))
                    .with_param(SearchParamDef::new("family", P::String, "name.family"))
                    .with_param(SearchParamDef::new("given", P::String, "name.given"))
                    .with_param(SearchParamDef::new("name", P::String, "name"))
                    .with_param(SearchParamDef::new("gender", P::Token, "gender"))
                    .with_param(SearchParamDef::new("birthdate", P::Date, "birthDate"))
                    .with_param(SearchParamDef::new("active", P::Token, "active"))
                    .with_param(
                        SearchParamDef::new("organization", P::Reference, "managingOrganization")
                            .with_targets(&["Organization"]),
                    ),
            )
            .with_schema(
                ResourceSchema::new("Organization")
                    .with_param(SearchParamDef::new("identifier", P::Token, "identifier"))
                    .with_param(SearchParamDef::new("name", P::String, "name"))
                    .with_param(SearchParamDef::new("active", P::Token, "active")),
            )
            .with_schema(
                ResourceSchema::new("Practitioner")
                    .with_param(SearchParamDef::new("identifier", P::Token, "identifier"))
                    .with_param(SearchParamDef::new("family", P::String, "name.family"))
                    .with_param(SearchParamDef::new("name", P::String, "name")),
            )
            .with_schema(
                ResourceSchema::new("Encounter")
                    .with_param(SearchParamDef::new("identifier", P::Token, "identifier"))
                    .with_param(SearchParamDef::new("status", P::Token, "status"))
                    .with_param(
                        SearchParamDef::new("subject", P::Reference, "subject")
                            .with_targets(&["Patient"]),
                    )
                    .with_param(SearchParamDef::new("date", P::Date, "period.start")),
            )
            .with_schema(
                ResourceSchema::new("Observation")
                    .with_param(SearchParamDef::new("identifier", P::Token, "identifier"))
                    .with_param(SearchParamDef::new("code", P::Token, "code"))
                    .with_param(SearchParamDef::new("status", P::Token, "status"))
                    .with_param(
                        SearchParamDef::new("subject", P::Reference, "subject")
                            .with_targets(&["Patient", "Organization"]),
                    )
                    .with_param(
                        SearchParamDef::new("encounter", P::Reference, "encounter")
                            .with_targets(&["Encounter"]),
                    )
                    .with_param(SearchParamDef::new("date", P::Date, "effectiveDateTime")),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_schema_has_id_param() {
        let registry = SchemaRegistry::builtin();
        for t in registry.resource_types() {
            let def = registry.lookup(t, ID_PARAM).unwrap();
            assert_eq!(def.param_type, SearchParamType::Token);
        }
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = SchemaRegistry::builtin();
        assert!(registry.lookup("Patient", "shoe-size").is_none());
        assert!(registry.lookup("Spaceship", "identifier").is_none());
        assert!(!registry.is_registered("Spaceship"));
    }

    #[test]
    fn test_path_segments() {
        let def = SearchParamDef::new("family", SearchParamType::String, "name.family");
        assert_eq!(def.path_segments().collect::<Vec<_>>(), vec!["name", "family"]);
    }
}
