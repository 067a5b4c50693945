//! Batch intake: type checks, id qualification, duplicate detection
//!
//! Runs before any read or write.

#![allow(clippy::result_large_err)]

use crate::errors::{ResxError, Result};
use crate::model::ResourceMutation;
use crate::registry::SchemaRegistry;
use std::collections::HashSet;

/// Validate a batch in place
///
/// Unqualified ids (`abc`) are qualified with the entry's type
/// (`Patient/abc`). Placeholders and `#` ids keep their form.
///
/// # Errors
///
/// - `UnknownResourceType` for a type the registry does not know
/// - `InvalidResource` when a qualified id names a different type
/// - `DuplicateIdInBatch` when two entries carry the same identity
pub fn validate_batch(batch: &mut [ResourceMutation], registry: &SchemaRegistry) -> Result<()> {
    let mut seen: HashSet<String> = HashSet::new();

    for mutation in batch.iter_mut() {
        let resource_type = mutation.resource.resource_type.as_str();
        if !registry.is_registered(resource_type) {
            return Err(ResxError::UnknownResourceType {
                resource_type: resource_type.to_string(),
            });
        }

        let Some(id) = mutation.resource.id.as_ref() else {
            continue;
        };
        let id = if id.has_resource_type() {
            id.clone()
        } else {
            id.clone().with_resource_type(resource_type)
        };

        if let Some(declared) = id.resource_type() {
            if declared != resource_type {
                return Err(ResxError::InvalidResource {
                    reason: format!("id {} does not belong to a {}", id, resource_type),
                });
            }
        }

        if id.has_id_part() && !id.is_local() {
            let identity = id.qualified();
            if !seen.insert(identity.clone()) {
                return Err(ResxError::DuplicateIdInBatch {
                    resource_id: identity,
                });
            }
        }

        mutation.resource.id = Some(id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;

    #[test]
    fn test_unqualified_ids_are_qualified() {
        let registry = SchemaRegistry::builtin();
        let mut batch = vec![
            ResourceMutation::update(Resource::new("Patient").with_id("abc")),
            ResourceMutation::create(Resource::new("Patient").with_id("cid:1")),
        ];
        validate_batch(&mut batch, &registry).unwrap();

        assert_eq!(batch[0].resource.id.as_ref().unwrap().qualified(), "Patient/abc");
        assert_eq!(batch[1].resource.id.as_ref().unwrap().qualified(), "cid:1");
    }

    #[test]
    fn test_duplicate_detected_across_forms() {
        let registry = SchemaRegistry::builtin();
        let mut batch = vec![
            ResourceMutation::update(Resource::new("Patient").with_id("abc")),
            ResourceMutation::update(Resource::new("Patient").with_id("Patient/abc")),
        ];
        let err = validate_batch(&mut batch, &registry).unwrap_err();
        assert_eq!(
            err,
            ResxError::DuplicateIdInBatch {
                resource_id: "Patient/abc".to_string()
            }
        );
    }

    #[test]
    fn test_same_id_part_different_types_is_not_duplicate() {
        let registry = SchemaRegistry::builtin();
        let mut batch = vec![
            ResourceMutation::update(Resource::new("Patient").with_id("1")),
            ResourceMutation::update(Resource::new("Organization").with_id("1")),
        ];
        assert!(validate_batch(&mut batch, &registry).is_ok());
    }

    #[test]
    fn test_unknown_type_and_type_mismatch() {
        let registry = SchemaRegistry::builtin();
        let mut batch = vec![ResourceMutation::create(Resource::new("Spaceship"))];
        assert!(matches!(
            validate_batch(&mut batch, &registry),
            Err(ResxError::UnknownResourceType { .. })
        ));

        let mut batch = vec![ResourceMutation::update(
            Resource::new("Patient").with_id("Observation/1"),
        )];
        assert!(matches!(
            validate_batch(&mut batch, &registry),
            Err(ResxError::InvalidResource { .. })
        ));
    }
}
