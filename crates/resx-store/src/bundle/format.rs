//! Serialized bundle layouts

use serde::Deserialize;
use serde_json::Value;

/// Plain batch file
///
/// ```yaml
/// entries:
///   - operation: create
///     match_url: "identifier=http://acme.org/mrn|123"
///     resource:
///       resourceType: Patient
///       id: "urn:uuid:1"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchFile {
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchEntry {
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub match_url: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    pub resource: Value,
}

/// FHIR-style transaction bundle
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FhirBundle {
    pub resource_type: String,
    #[serde(rename = "type", default)]
    pub bundle_type: Option<String>,
    #[serde(default)]
    pub entry: Vec<FhirEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FhirEntry {
    #[serde(default)]
    pub full_url: Option<String>,
    #[serde(default)]
    pub resource: Option<Value>,
    #[serde(default)]
    pub request: Option<FhirRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FhirRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub if_none_exist: Option<String>,
}
