use serde::{Deserialize, Serialize};
use std::fmt;

const HISTORY_SEGMENT: &str = "/_history/";

/// Prefixes marking a batch-local placeholder identity
pub const PLACEHOLDER_PREFIXES: [&str; 2] = ["cid:", "urn:uuid:"];

/// A parsed resource identifier: `[Type/]id[/_history/version]`
///
/// Placeholders (`cid:...`, `urn:uuid:...`) and contained references
/// (`#...`) are kept whole in `id_part` and never carry a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    resource_type: Option<String>,
    id_part: String,
    version: Option<u64>,
}

impl ResourceId {
    /// A typed, versionless identifier
    pub fn new(resource_type: impl Into<String>, id_part: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            id_part: id_part.into(),
            version: None,
        }
    }

    /// Parse an identifier or reference value
    ///
    /// Absolute URLs are reduced to their last `Type/id` segments.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with('#') || is_placeholder(value) {
            return Self {
                resource_type: None,
                id_part: value.to_string(),
                version: None,
            };
        }

        let (base, version) = match value.split_once(HISTORY_SEGMENT) {
            Some((base, v)) => (base, v.parse::<u64>().ok()),
            None => (value, None),
        };

        let mut segments = base.rsplit('/');
        let id_part = segments.next().unwrap_or_default().to_string();
        let resource_type = segments
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            resource_type,
            id_part,
            version,
        }
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    pub fn id_part(&self) -> &str {
        &self.id_part
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn has_id_part(&self) -> bool {
        !self.id_part.is_empty()
    }

    pub fn has_resource_type(&self) -> bool {
        self.resource_type.is_some()
    }

    /// `cid:` / `urn:uuid:` batch-local identity
    pub fn is_placeholder(&self) -> bool {
        is_placeholder(&self.id_part)
    }

    /// `#id` reference to a contained resource
    pub fn is_local(&self) -> bool {
        self.id_part.starts_with('#')
    }

    /// Same id with the given type; placeholders and local ids are left as-is
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        if !self.is_placeholder() && !self.is_local() {
            self.resource_type = Some(resource_type.into());
        }
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn to_versionless(&self) -> Self {
        Self {
            resource_type: self.resource_type.clone(),
            id_part: self.id_part.clone(),
            version: None,
        }
    }

    /// `Type/id` (or the bare id part when untyped), without version
    pub fn qualified(&self) -> String {
        match &self.resource_type {
            Some(t) => format!("{}/{}", t, self.id_part),
            None => self.id_part.clone(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())?;
        if let Some(v) = self.version {
            write!(f, "{}{}", HISTORY_SEGMENT, v)?;
        }
        Ok(())
    }
}

pub(crate) fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_PREFIXES.iter().any(|p| value.starts_with(p))
}
