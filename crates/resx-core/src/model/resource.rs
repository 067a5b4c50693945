use crate::errors::{ResxError, Result};
use crate::model::ResourceId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tag attached to a resource (`meta.tag`)
///
/// Tags are additive: updating a resource never removes a tag it already has.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub scheme: Option<String>,
    pub term: String,
    pub label: Option<String>,
}

impl Tag {
    pub fn new(scheme: Option<&str>, term: impl Into<String>) -> Self {
        Self {
            scheme: scheme.map(str::to_string),
            term: term.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn from_json(value: &Value) -> Result<Self> {
        let term = value
            .get("code")
            .and_then(Value::as_str)
            .ok_or_else(|| ResxError::InvalidResource {
                reason: "meta.tag entry without a code".to_string(),
            })?;
        Ok(Self {
            scheme: value.get("system").and_then(Value::as_str).map(str::to_string),
            term: term.to_string(),
            label: value.get("display").and_then(Value::as_str).map(str::to_string),
        })
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(scheme) = &self.scheme {
            obj.insert("system".to_string(), Value::String(scheme.clone()));
        }
        obj.insert("code".to_string(), Value::String(self.term.clone()));
        if let Some(label) = &self.label {
            obj.insert("display".to_string(), Value::String(label.clone()));
        }
        Value::Object(obj)
    }
}

/// A resource as carried through a transaction
///
/// `payload` holds every element except `resourceType`, `id` and `meta`,
/// which are lifted into typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_type: String,
    pub id: Option<ResourceId>,
    pub payload: Map<String, Value>,
    pub tags: Vec<Tag>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: None,
            payload: Map::new(),
            tags: Vec::new(),
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Set the supplied identifier (`"cid:1"`, `"abc"`, `"Patient/abc"`)
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(ResourceId::parse(id));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.payload.insert(name.into(), value);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_deleted_at(mut self, at: DateTime<Utc>) -> Self {
        self.deleted_at = Some(at);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Version carried by the identifier, if any
    pub fn version(&self) -> Option<u64> {
        self.id.as_ref().and_then(ResourceId::version)
    }

    /// Build from a JSON resource body
    ///
    /// # Errors
    ///
    /// `InvalidResource` when the value is not an object, lacks
    /// `resourceType`, or carries a malformed `meta`.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(mut payload) = value else {
            return Err(ResxError::InvalidResource {
                reason: "resource must be a JSON object".to_string(),
            });
        };

        let resource_type = match payload.remove("resourceType") {
            Some(Value::String(t)) if !t.is_empty() => t,
            _ => {
                return Err(ResxError::InvalidResource {
                    reason: "missing resourceType".to_string(),
                })
            }
        };

        let id = match payload.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(ResourceId::parse(&id)),
            Some(Value::String(_)) | None | Some(Value::Null) => None,
            Some(other) => {
                return Err(ResxError::InvalidResource {
                    reason: format!("id must be a string, got {}", other),
                })
            }
        };

        let mut resource = Resource {
            resource_type,
            id,
            payload: Map::new(),
            tags: Vec::new(),
            updated_at: None,
            deleted_at: None,
        };

        if let Some(meta) = payload.remove("meta") {
            resource.read_meta(&meta)?;
        }
        resource.payload = payload;
        Ok(resource)
    }

    fn read_meta(&mut self, meta: &Value) -> Result<()> {
        if let Some(tags) = meta.get("tag").and_then(Value::as_array) {
            self.tags = tags.iter().map(Tag::from_json).collect::<Result<_>>()?;
        }
        if let Some(updated) = meta.get("lastUpdated").and_then(Value::as_str) {
            let parsed = DateTime::parse_from_rfc3339(updated).map_err(|e| {
                ResxError::InvalidResource {
                    reason: format!("meta.lastUpdated: {}", e),
                }
            })?;
            self.updated_at = Some(parsed.with_timezone(&Utc));
        }
        let version = meta
            .get("versionId")
            .and_then(Value::as_str)
            .and_then(|v| v.parse::<u64>().ok());
        if let Some(version) = version {
            self.id = self.id.take().map(|id| id.with_version(version));
        }
        Ok(())
    }

    /// Render as a JSON resource body, including `meta`
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "resourceType".to_string(),
            Value::String(self.resource_type.clone()),
        );
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), Value::String(id.id_part().to_string()));
        }

        let mut meta = Map::new();
        if let Some(version) = self.version() {
            meta.insert("versionId".to_string(), Value::String(version.to_string()));
        }
        if let Some(updated) = self.updated_at {
            meta.insert(
                "lastUpdated".to_string(),
                Value::String(updated.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        if !self.tags.is_empty() {
            meta.insert(
                "tag".to_string(),
                Value::Array(self.tags.iter().map(Tag::to_json).collect()),
            );
        }
        if !meta.is_empty() {
            obj.insert("meta".to_string(), Value::Object(meta));
        }

        for (key, value) in &self.payload {
            obj.insert(key.clone(), value.clone());
        }
        Value::Object(obj)
    }
}
