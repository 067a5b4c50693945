//! Reference rewriting
//!
//! Built from the identities assigned at flush; every reference slot is
//! looked up exactly once, so a rewritten value is never rewritten again.

use crate::model::ResourceId;
use crate::references::ReferenceSlots;
use crate::transaction::PlannedEntry;
use std::collections::HashMap;

/// Supplied identifier → canonical versionless `Type/id`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMapping {
    targets: HashMap<String, String>,
}

impl IdentifierMapping {
    /// Build the mapping for a planned batch
    ///
    /// Each entry contributes its raw supplied id and its qualified form.
    /// Entries without an id, local (`#`) ids, and ids already canonical
    /// contribute nothing.
    pub fn build(plans: &[PlannedEntry], identities: &[Option<ResourceId>]) -> Self {
        let mut targets = HashMap::new();
        for (plan, identity) in plans.iter().zip(identities) {
            let (Some(supplied), Some(identity)) = (plan.mutation.resource.id.as_ref(), identity)
            else {
                continue;
            };
            if !supplied.has_id_part() || supplied.is_local() {
                continue;
            }

            let canonical = identity.to_versionless().qualified();
            for key in [supplied.to_string(), supplied.qualified()] {
                if key != canonical {
                    targets.insert(key, canonical.clone());
                }
            }
        }
        Self { targets }
    }

    pub fn lookup(&self, reference: &str) -> Option<&str> {
        self.targets.get(reference).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Rewrite every mapped reference slot; returns the number rewritten
pub fn rewrite_references<'a, R, I>(records: I, mapping: &IdentifierMapping) -> usize
where
    R: ReferenceSlots + 'a,
    I: IntoIterator<Item = &'a mut R>,
{
    if mapping.is_empty() {
        return 0;
    }

    let mut rewritten = 0;
    for record in records {
        for mut slot in record.reference_slots() {
            if let Some(target) = mapping.lookup(slot.value()) {
                slot.set(target);
                rewritten += 1;
            }
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, ResourceMutation};
    use crate::transaction::classifier::Classification;
    use serde_json::json;

    fn planned(resource: Resource) -> PlannedEntry {
        PlannedEntry::new(
            ResourceMutation::upsert(resource),
            Classification::Create { forced_id: None },
        )
    }

    #[test]
    fn test_mapping_keys_raw_and_qualified_forms() {
        let plans = vec![
            planned(Resource::new("Patient").with_id("cid:a")),
            planned(Resource::new("Patient").with_id("Patient/abc")),
            planned(Resource::new("Patient")),
        ];
        let identities = vec![
            Some(ResourceId::new("Patient", "1")),
            Some(ResourceId::new("Patient", "abc")),
            Some(ResourceId::new("Patient", "2")),
        ];

        let mapping = IdentifierMapping::build(&plans, &identities);

        assert_eq!(mapping.lookup("cid:a"), Some("Patient/1"));
        assert_eq!(mapping.lookup("Patient/abc"), None);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_rewrite_is_single_pass() {
        // Given: a chain cid:a -> Patient/1 and Patient/1 -> Patient/9
        let mut targets = HashMap::new();
        targets.insert("cid:a".to_string(), "Patient/1".to_string());
        targets.insert("Patient/1".to_string(), "Patient/9".to_string());
        let mapping = IdentifierMapping { targets };

        let mut resources = vec![Resource::new("Observation")
            .with_field("subject", json!({ "reference": "cid:a" }))
            .with_field("focus", json!([{ "reference": "Patient/1" }]))];

        // When
        let count = rewrite_references(resources.iter_mut(), &mapping);

        // Then: each slot looked up once against the original value
        assert_eq!(count, 2);
        assert_eq!(
            resources[0].field("subject"),
            Some(&json!({ "reference": "Patient/1" }))
        );
        assert_eq!(
            resources[0].field("focus"),
            Some(&json!([{ "reference": "Patient/9" }]))
        );
    }

    #[test]
    fn test_unmapped_references_untouched() {
        let mapping = IdentifierMapping::default();
        let mut resources =
            vec![Resource::new("Observation").with_field("subject", json!({ "reference": "Patient/5" }))];
        assert_eq!(rewrite_references(resources.iter_mut(), &mapping), 0);
        assert_eq!(
            resources[0].field("subject"),
            Some(&json!({ "reference": "Patient/5" }))
        );
    }
}
