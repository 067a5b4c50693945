//! Search index extraction and evaluation
//!
//! Both stores reduce a resource to a flat list of [`IndexEntry`] values and
//! evaluate criteria over those lists, so matching semantics are identical
//! whichever store answers the query.

use crate::model::{Resource, ResourceId};
use crate::registry::{ResourceSchema, SearchParamDef, SearchParamType, ID_PARAM};
use crate::search::criteria::{Comparator, Modifier, SearchParameter, SearchParameterMap};
use serde_json::Value;

/// One indexed value of one parameter
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexEntry {
    pub param: String,
    /// Token system (tokens only)
    pub system: Option<String>,
    pub value: String,
}

impl IndexEntry {
    fn new(param: &str, system: Option<String>, value: String) -> Self {
        Self {
            param: param.to_string(),
            system,
            value,
        }
    }
}

/// Extract every index entry of a resource
///
/// `_id` is indexed from the resource's id part when present.
pub fn extract_index(schema: &ResourceSchema, resource: &Resource) -> Vec<IndexEntry> {
    let mut entries = Vec::new();
    for def in schema.params() {
        if def.name == ID_PARAM {
            if let Some(id) = resource.id.as_ref().filter(|id| id.has_id_part()) {
                entries.push(IndexEntry::new(ID_PARAM, None, id.id_part().to_string()));
            }
            continue;
        }

        let mut nodes = Vec::new();
        collect_path(&resource.payload, def, &mut nodes);
        for node in nodes {
            extract_values(def, node, &mut entries);
        }
    }
    entries.sort();
    entries.dedup();
    entries
}

fn collect_path<'a>(
    payload: &'a serde_json::Map<String, Value>,
    def: &SearchParamDef,
    out: &mut Vec<&'a Value>,
) {
    let mut segments = def.path_segments();
    let Some(first) = segments.next() else {
        return;
    };
    let mut current: Vec<&Value> = payload.get(first).into_iter().collect();
    for segment in segments {
        current = current
            .into_iter()
            .flat_map(flatten)
            .filter_map(|v| v.get(segment))
            .collect();
    }
    out.extend(current.into_iter().flat_map(flatten));
}

fn flatten(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().flat_map(flatten).collect(),
        other => vec![other],
    }
}

fn extract_values(def: &SearchParamDef, node: &Value, out: &mut Vec<IndexEntry>) {
    match def.param_type {
        SearchParamType::String => {
            let mut texts = Vec::new();
            collect_strings(node, &mut texts);
            out.extend(texts.into_iter().map(|t| IndexEntry::new(&def.name, None, t)));
        }
        SearchParamType::Token => match node {
            Value::String(code) => out.push(IndexEntry::new(&def.name, None, code.clone())),
            Value::Bool(b) => out.push(IndexEntry::new(&def.name, None, b.to_string())),
            Value::Object(obj) => {
                if let Some(codings) = obj.get("coding").and_then(Value::as_array) {
                    for coding in codings {
                        push_coding(def, coding, out);
                    }
                } else {
                    push_coding(def, node, out);
                }
            }
            _ => {}
        },
        SearchParamType::Reference => {
            let reference = match node {
                Value::String(r) => Some(r.as_str()),
                Value::Object(obj) => obj.get("reference").and_then(Value::as_str),
                _ => None,
            };
            if let Some(r) = reference {
                out.push(IndexEntry::new(&def.name, None, r.to_string()));
            }
        }
        SearchParamType::Date => {
            if let Some(d) = node.as_str() {
                out.push(IndexEntry::new(&def.name, None, d.to_string()));
            }
        }
    }
}

// Identifier uses system/value, Coding uses system/code
fn push_coding(def: &SearchParamDef, node: &Value, out: &mut Vec<IndexEntry>) {
    let code = node
        .get("value")
        .or_else(|| node.get("code"))
        .and_then(Value::as_str);
    if let Some(code) = code {
        let system = node.get("system").and_then(Value::as_str).map(str::to_string);
        out.push(IndexEntry::new(&def.name, system, code.to_string()));
    }
}

fn collect_strings(node: &Value, out: &mut Vec<String>) {
    match node {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|i| collect_strings(i, out)),
        Value::Object(obj) => obj.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

impl SearchParameterMap {
    /// Whether a resource with these index entries satisfies every clause
    pub fn matches(&self, entries: &[IndexEntry]) -> bool {
        self.params().iter().all(|p| param_matches(p, entries))
    }
}

fn param_matches(param: &SearchParameter, entries: &[IndexEntry]) -> bool {
    let candidates: Vec<&IndexEntry> = entries.iter().filter(|e| e.param == param.name).collect();

    if param.modifier == Some(Modifier::Missing) {
        let want_missing = param.values.first().map(String::as_str) == Some("true");
        return candidates.is_empty() == want_missing;
    }

    param.values.iter().any(|wanted| {
        candidates
            .iter()
            .any(|entry| value_matches(param, wanted, entry))
    })
}

fn value_matches(param: &SearchParameter, wanted: &str, entry: &IndexEntry) -> bool {
    match param.param_type {
        SearchParamType::String => {
            let have = entry.value.to_lowercase();
            match param.modifier {
                Some(Modifier::Exact) => entry.value == wanted,
                Some(Modifier::Contains) => have.contains(&wanted.to_lowercase()),
                _ => have.starts_with(&wanted.to_lowercase()),
            }
        }
        SearchParamType::Token => match wanted.split_once('|') {
            Some(("", code)) => entry.system.is_none() && entry.value == code,
            Some((system, "")) => entry.system.as_deref() == Some(system),
            Some((system, code)) => entry.system.as_deref() == Some(system) && entry.value == code,
            None => entry.value == wanted,
        },
        SearchParamType::Reference => {
            let wanted = match &param.modifier {
                Some(Modifier::TargetType(t)) => ResourceId::new(t.as_str(), wanted),
                _ => ResourceId::parse(wanted),
            };
            let have = ResourceId::parse(&entry.value);
            have.id_part() == wanted.id_part()
                && match wanted.resource_type() {
                    Some(t) => have.resource_type() == Some(t),
                    None => true,
                }
        }
        SearchParamType::Date => {
            let (cmp, wanted) = Comparator::split(wanted);
            let have = entry.value.as_str();
            let same = have.starts_with(wanted);
            match cmp {
                Comparator::Eq => same,
                Comparator::Ne => !same,
                Comparator::Gt => !same && have > wanted,
                Comparator::Lt => !same && have < wanted,
                Comparator::Ge => same || have > wanted,
                Comparator::Le => same || have < wanted,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;
    use serde_json::json;

    fn patient() -> Resource {
        Resource::new("Patient")
            .with_id("Patient/42")
            .with_field(
                "identifier",
                json!([{ "system": "http://acme.org/mrn", "value": "123" }]),
            )
            .with_field("name", json!([{ "family": "Smith", "given": ["Ann", "B"] }]))
            .with_field("birthDate", json!("1990-05-17"))
            .with_field("managingOrganization", json!({ "reference": "Organization/7" }))
            .with_field("active", json!(true))
    }

    fn entries() -> Vec<IndexEntry> {
        let registry = SchemaRegistry::builtin();
        extract_index(registry.schema("Patient").unwrap(), &patient())
    }

    fn matches(url: &str) -> bool {
        let registry = SchemaRegistry::builtin();
        SearchParameterMap::parse(url, "Patient", &registry)
            .unwrap()
            .matches(&entries())
    }

    #[test]
    fn test_extract_index_covers_params() {
        let entries = entries();
        assert!(entries.contains(&IndexEntry::new("_id", None, "42".to_string())));
        assert!(entries.contains(&IndexEntry::new(
            "identifier",
            Some("http://acme.org/mrn".to_string()),
            "123".to_string()
        )));
        assert!(entries.contains(&IndexEntry::new("given", None, "Ann".to_string())));
        assert!(entries.contains(&IndexEntry::new("active", None, "true".to_string())));
    }

    #[test]
    fn test_token_forms() {
        assert!(matches("identifier=http://acme.org/mrn|123"));
        assert!(matches("identifier=123"));
        assert!(matches("identifier=http://acme.org/mrn|"));
        assert!(!matches("identifier=|123"));
        assert!(!matches("identifier=http://other|123"));
        assert!(matches("_id=42"));
    }

    #[test]
    fn test_string_modifiers() {
        assert!(matches("family=smi"));
        assert!(!matches("family:exact=smith"));
        assert!(matches("family:exact=Smith"));
        assert!(matches("name:contains=mit"));
    }

    #[test]
    fn test_and_or_semantics() {
        assert!(matches("family=jones,smith"));
        assert!(!matches("family=smith&gender=female"));
        assert!(matches("family=smith&active=true"));
    }

    #[test]
    fn test_reference_and_missing() {
        assert!(matches("organization=Organization/7"));
        assert!(matches("organization=7"));
        assert!(matches("organization:Organization=7"));
        assert!(matches("gender:missing=true"));
        assert!(!matches("birthdate:missing=true"));
    }

    #[test]
    fn test_date_prefixes() {
        assert!(matches("birthdate=1990"));
        assert!(matches("birthdate=ge1990-01-01"));
        assert!(!matches("birthdate=gt1990-05-17"));
        assert!(matches("birthdate=lt2000"));
        assert!(matches("birthdate=ne1991"));
    }
}
