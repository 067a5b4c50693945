//! Engine transaction command over an on-disk store
//!
//! ## Scenarios Covered
//!
//! 1. A committed batch is visible to the read-only queries
//! 2. A failed batch leaves the store untouched and carries correlation ids
//! 3. The configured delete policy reaches the classifier

#![allow(clippy::unwrap_used, clippy::expect_used)]

use resx_core::errors::ExErrorKind;
use resx_core::{DeletePolicy, EntryOperation, Resource, ResourceMutation, SchemaRegistry, Tag};
use resx_core_types::{RequestContext, TraceId};
use resx_engine::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineCommandResult, EngineQuery,
    EngineQueryResult,
};
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

fn setup_db() -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let conn = resx_store::db::open_store(temp_dir.path().join("store.db")).unwrap();
    (temp_dir, conn)
}

fn patient(mrn: &str) -> Resource {
    Resource::new("Patient").with_field(
        "identifier",
        json!([{ "system": "http://acme.org/mrn", "value": mrn }]),
    )
}

fn counts(conn: &Connection) -> std::collections::BTreeMap<String, u64> {
    match apply_engine_query(EngineQuery::ResourceCounts, conn).unwrap() {
        EngineQueryResult::ResourceCounts(counts) => counts,
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_transaction_commits_and_is_queryable() {
    // GIVEN an empty store
    let (_tmp, mut conn) = setup_db();
    let registry = SchemaRegistry::builtin();

    // WHEN a batch creates a tagged patient and an observation citing it
    let batch = vec![
        ResourceMutation::create(
            patient("1").with_id("cid:p").with_tag(Tag::new(Some("http://acme.org/src"), "intake")),
        ),
        ResourceMutation::create(
            Resource::new("Observation").with_field("subject", json!({ "reference": "cid:p" })),
        ),
    ];
    let result = apply_engine_command(
        EngineCommand::transaction(batch, DeletePolicy::Strict),
        &mut conn,
        &registry,
    )
    .unwrap();

    // THEN the report counts two creations and the reference is rewritten
    let EngineCommandResult::Transaction(outcome) = result;
    assert_eq!(outcome.report.creations, 2);
    let observation = outcome.entries[1].resource.as_ref().unwrap();
    assert_eq!(
        observation.field("subject"),
        Some(&json!({ "reference": "Patient/1" }))
    );

    // AND the read-only queries see the committed data
    let counts = counts(&conn);
    assert_eq!(counts.get("Patient"), Some(&1));
    assert_eq!(counts.get("Observation"), Some(&1));

    let tags = match apply_engine_query(EngineQuery::AllTags, &conn).unwrap() {
        EngineQueryResult::AllTags(tags) => tags,
        other => panic!("unexpected result {:?}", other),
    };
    assert_eq!(tags, vec![Tag::new(Some("http://acme.org/src"), "intake")]);
}

#[test]
fn test_failed_transaction_rolls_back_and_carries_ids() {
    // GIVEN two patients sharing an MRN
    let (_tmp, mut conn) = setup_db();
    let registry = SchemaRegistry::builtin();
    apply_engine_command(
        EngineCommand::transaction(
            vec![
                ResourceMutation::create(patient("7")),
                ResourceMutation::create(patient("7")),
            ],
            DeletePolicy::Strict,
        ),
        &mut conn,
        &registry,
    )
    .unwrap();

    // WHEN a batch creates an organization, then conditionally updates by that MRN
    let context = RequestContext::new().with_trace_id(TraceId::from_string("trace-1".into()));
    let request_id = context.request_id.clone();
    let err = apply_engine_command(
        EngineCommand::Transaction {
            batch: vec![
                ResourceMutation::create(Resource::new("Organization")),
                ResourceMutation::update(patient("7"))
                    .with_match_url("identifier=http://acme.org/mrn|7"),
            ],
            delete_policy: DeletePolicy::Strict,
            context,
        },
        &mut conn,
        &registry,
    )
    .unwrap_err();

    // THEN the batch fails as ambiguous with correlation ids attached
    assert_eq!(err.kind(), ExErrorKind::AmbiguousMatch);
    assert_eq!(err.match_count(), Some(2));
    assert_eq!(err.request_id(), Some(&request_id));
    assert_eq!(err.trace_id().map(TraceId::as_str), Some("trace-1"));

    // AND the organization was not committed
    let counts = counts(&conn);
    assert_eq!(counts.get("Organization"), None);
    assert_eq!(counts.get("Patient"), Some(&2));
}

#[test]
fn test_delete_policy_is_honoured() {
    let (_tmp, mut conn) = setup_db();
    let registry = SchemaRegistry::builtin();
    let missing = || {
        vec![ResourceMutation::delete(Resource::new("Patient"))
            .with_match_url("identifier=http://acme.org/mrn|none")]
    };

    let err = apply_engine_command(
        EngineCommand::transaction(missing(), DeletePolicy::Strict),
        &mut conn,
        &registry,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::UnresolvableTarget);

    let EngineCommandResult::Transaction(outcome) = apply_engine_command(
        EngineCommand::transaction(missing(), DeletePolicy::Idempotent),
        &mut conn,
        &registry,
    )
    .unwrap();
    assert_eq!(outcome.entries[0].operation, EntryOperation::Noop);
    assert_eq!(outcome.report.noops, 1);
}
