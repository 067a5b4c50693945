//! Bundle parser with validation
//!
//! Turns a bundle file into the mutation list the transaction processor
//! takes. Only shape is checked here; identity and criteria rules belong to
//! the processor.

#![allow(clippy::result_large_err)]

use crate::bundle::format::{BatchEntry, BatchFile, FhirBundle, FhirEntry};
use crate::errors::{bundle_validation, Result};
use resx_core::{Operation, Resource, ResourceId, ResourceMutation};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Parse a bundle file from a path
pub fn parse_bundle_file(path: &Path) -> Result<Vec<ResourceMutation>> {
    let content = fs::read_to_string(path)
        .map_err(|e| bundle_validation(&format!("Failed to read bundle file: {}", e)))?;

    parse_bundle_str(&content)
}

/// Parse a bundle from a YAML or JSON string
pub fn parse_bundle_str(content: &str) -> Result<Vec<ResourceMutation>> {
    // YAML is a superset of JSON, so one parser covers both
    let document: Value = serde_yaml::from_str(content)
        .map_err(|e| bundle_validation(&format!("Bundle parse error: {}", e)))?;

    let is_fhir_bundle = document.get("resourceType").and_then(Value::as_str) == Some("Bundle");
    if is_fhir_bundle {
        let bundle: FhirBundle = serde_json::from_value(document)
            .map_err(|e| bundle_validation(&format!("Invalid Bundle: {}", e)))?;
        parse_fhir_bundle(bundle)
    } else {
        let file: BatchFile = serde_json::from_value(document)
            .map_err(|e| bundle_validation(&format!("Invalid batch file: {}", e)))?;
        file.entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| parse_batch_entry(i, entry))
            .collect()
    }
}

fn parse_batch_entry(index: usize, entry: BatchEntry) -> Result<ResourceMutation> {
    let resource = parse_resource(index, entry.resource)?;
    let operation = entry
        .operation
        .as_deref()
        .map(|op| parse_operation(index, op))
        .transpose()?;

    let mut mutation = ResourceMutation::upsert(resource);
    mutation.operation = operation;
    mutation.match_url = entry.match_url;
    mutation.deleted = entry.deleted;
    Ok(mutation)
}

fn parse_operation(index: usize, op: &str) -> Result<Operation> {
    match op.to_ascii_lowercase().as_str() {
        "create" => Ok(Operation::Create),
        "update" => Ok(Operation::Update),
        "delete" => Ok(Operation::Delete),
        other => Err(bundle_validation(&format!(
            "Entry {}: unsupported operation '{}' (expected create, update or delete)",
            index, other
        ))),
    }
}

fn parse_resource(index: usize, body: Value) -> Result<Resource> {
    Resource::from_json(body)
        .map_err(|e| bundle_validation(&format!("Entry {}: {}", index, e)))
}

fn parse_fhir_bundle(bundle: FhirBundle) -> Result<Vec<ResourceMutation>> {
    if bundle.resource_type != "Bundle" {
        return Err(bundle_validation("resourceType must be Bundle"));
    }
    match bundle.bundle_type.as_deref() {
        None | Some("transaction") => {}
        Some(other) => {
            return Err(bundle_validation(&format!(
                "Unsupported Bundle type '{}', expected transaction",
                other
            )))
        }
    }

    bundle
        .entry
        .into_iter()
        .enumerate()
        .map(|(i, entry)| parse_fhir_entry(i, entry))
        .collect()
}

fn parse_fhir_entry(index: usize, entry: FhirEntry) -> Result<ResourceMutation> {
    let request = entry
        .request
        .ok_or_else(|| bundle_validation(&format!("Entry {}: missing request", index)))?;
    let operation = match request.method.to_ascii_uppercase().as_str() {
        "POST" => Operation::Create,
        "PUT" => Operation::Update,
        "DELETE" => Operation::Delete,
        other => {
            return Err(bundle_validation(&format!(
                "Entry {}: unsupported request method '{}'",
                index, other
            )))
        }
    };

    // "Patient/123" targets an id; "Patient?identifier=x" carries criteria
    let (target, criteria) = match request.url.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (request.url.as_str(), None),
    };
    let target = ResourceId::parse(target);
    let target_type = target
        .resource_type()
        .unwrap_or(target.id_part())
        .to_string();

    let mut resource = match entry.resource {
        Some(body) => parse_resource(index, body)?,
        None if operation == Operation::Delete => Resource::new(target_type.as_str()),
        None => {
            return Err(bundle_validation(&format!(
                "Entry {}: {} without a resource",
                index, request.method
            )))
        }
    };
    if resource.resource_type != target_type {
        return Err(bundle_validation(&format!(
            "Entry {}: request url {} does not match resource type {}",
            index, request.url, resource.resource_type
        )));
    }

    if resource.id.is_none() {
        let addresses_instance = target.has_resource_type();
        resource.id = match operation {
            Operation::Create => entry.full_url.as_deref().map(ResourceId::parse),
            _ if addresses_instance => Some(target),
            _ => None,
        };
    } else if operation == Operation::Create {
        // references inside the bundle point at fullUrl placeholders
        if let Some(full_url) = entry.full_url.as_deref().map(ResourceId::parse) {
            if full_url.is_placeholder() {
                resource.id = Some(full_url);
            }
        }
    }

    let match_url = match operation {
        Operation::Create => request.if_none_exist,
        _ => criteria,
    };

    let mut mutation = ResourceMutation::upsert(resource).with_operation(operation);
    mutation.match_url = match_url;
    Ok(mutation)
}
