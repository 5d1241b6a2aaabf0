use folio_core::{
    decode_collection, CollectingReporter, Diagnostic, IdSeed, KvStore, MemoryKvStore, Outcome,
    PassOptions, ReconcileError, ReconcileService, RecordKey, ReportEvent, DEFAULT_STORE_KEY,
};
use serde_json::json;

const SEED: u64 = 1_700_000_000_000;

fn seeded() -> PassOptions {
    PassOptions {
        dry_run: false,
        seed: Some(IdSeed::fixed(SEED)),
    }
}

fn store_with(value: serde_json::Value) -> MemoryKvStore {
    MemoryKvStore::with_entry(DEFAULT_STORE_KEY, value.to_string())
}

#[test]
fn duplicate_id_is_reassigned_and_saved() {
    let store = store_with(json!([
        { "id": "1", "name": "Acme" },
        { "id": "1", "name": "Beta" },
        { "id": "2", "name": "Gamma" },
    ]));
    let service = ReconcileService::with_default_key(&store);
    let mut reporter = CollectingReporter::new();

    let summary = service.run_pass(&seeded(), &mut reporter).unwrap();

    assert_eq!(summary.outcome, Outcome::ReconciledAndSaved);
    assert_eq!(summary.examined, 3);
    assert_eq!(summary.audit.len(), 1);
    let entry = &summary.audit[0];
    assert_eq!(entry.original_id, RecordKey::from("1"));
    assert_eq!(entry.first_record_name.as_deref(), Some("Acme"));
    assert_eq!(entry.duplicate_record_name.as_deref(), Some("Beta"));
    assert_eq!(entry.assigned_id, RecordKey::from("17000000000001"));
    assert!(summary.diagnostics.is_empty());

    assert_eq!(store.write_count(), 1);
    let saved: serde_json::Value =
        serde_json::from_str(&store.get(DEFAULT_STORE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(
        saved,
        json!([
            { "id": "1", "name": "Acme" },
            { "id": "17000000000001", "name": "Beta" },
            { "id": "2", "name": "Gamma" },
        ])
    );
    assert_eq!(reporter.outcome(), Some(Outcome::ReconciledAndSaved));
    assert_eq!(reporter.audits().len(), 1);
}

#[test]
fn record_without_id_is_reported_and_nothing_is_written() {
    let store = store_with(json!([{ "name": "NoId" }]));
    let service = ReconcileService::with_default_key(&store);
    let mut reporter = CollectingReporter::new();

    let summary = service.run_pass(&seeded(), &mut reporter).unwrap();

    assert_eq!(summary.outcome, Outcome::NoDuplicates);
    assert!(summary.audit.is_empty());
    assert_eq!(
        summary.diagnostics,
        vec![Diagnostic::MissingIdentifier {
            index: 0,
            name: Some("NoId".to_string())
        }]
    );
    assert_eq!(reporter.diagnostics().len(), 1);
    assert_eq!(store.write_count(), 0);
}

#[test]
fn absent_key_ends_pass_with_no_data() {
    let store = MemoryKvStore::new();
    let service = ReconcileService::with_default_key(&store);
    let mut reporter = CollectingReporter::new();

    let summary = service.run_pass(&seeded(), &mut reporter).unwrap();

    assert_eq!(summary.outcome, Outcome::NoData);
    assert_eq!(summary.examined, 0);
    assert!(summary.diagnostics.is_empty());
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.get(DEFAULT_STORE_KEY).unwrap(), None);
}

#[test]
fn malformed_value_aborts_without_writing() {
    let store = MemoryKvStore::with_entry(DEFAULT_STORE_KEY, "[{\"id\": \"1\", ");
    let service = ReconcileService::with_default_key(&store);
    let mut reporter = CollectingReporter::new();

    let err = service.run_pass(&seeded(), &mut reporter).unwrap_err();

    assert!(matches!(err, ReconcileError::Decode(_)));
    assert_eq!(store.write_count(), 0);
    assert_eq!(
        store.get(DEFAULT_STORE_KEY).unwrap().as_deref(),
        Some("[{\"id\": \"1\", ")
    );
    assert_eq!(reporter.outcome(), Some(Outcome::Failed));
    assert!(reporter.audits().is_empty());
    assert!(reporter.diagnostics().is_empty());
}

#[test]
fn failed_write_returns_pending_collection_that_can_be_retried() {
    let store = store_with(json!([
        { "id": "a", "name": "Acme" },
        { "id": "a", "name": "Beta" },
    ]));
    store.set_fail_writes(true);
    let service = ReconcileService::with_default_key(&store);
    let mut reporter = CollectingReporter::new();

    let err = service.run_pass(&seeded(), &mut reporter).unwrap_err();
    assert!(err.to_string().contains("did not take effect"));
    let pending = err.pending_write().expect("write failure carries the collection");
    assert_eq!(pending.audit.len(), 1);
    assert_eq!(pending.collection[1].id(), Some(RecordKey::from("17000000000001")));
    assert_eq!(reporter.outcome(), Some(Outcome::Failed));
    assert!(reporter.audits().is_empty(), "unsaved fixes must not be reported");

    let stored = decode_collection(&store.get(DEFAULT_STORE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored[1].id(), Some(RecordKey::from("a")));

    store.set_fail_writes(false);
    service.persist(&pending.collection).unwrap();
    let stored = decode_collection(&store.get(DEFAULT_STORE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored, pending.collection);
}

#[test]
fn dry_run_reports_fixes_without_writing() {
    let store = store_with(json!([
        { "id": "1", "name": "Acme" },
        { "id": "1", "name": "Beta" },
    ]));
    let service = ReconcileService::with_default_key(&store);
    let options = PassOptions {
        dry_run: true,
        ..seeded()
    };

    let mut reporter = CollectingReporter::new();
    let summary = service.run_pass(&options, &mut reporter).unwrap();

    assert_eq!(summary.outcome, Outcome::DryRun);
    assert_eq!(summary.audit.len(), 1);
    assert_eq!(reporter.audits().len(), 1);
    assert_eq!(store.write_count(), 0);
}

#[test]
fn second_pass_after_reconciliation_finds_nothing() {
    let store = store_with(json!([
        { "id": "1", "name": "Acme" },
        { "id": "1", "name": "Beta" },
        { "id": "1", "name": "Gamma" },
    ]));
    let service = ReconcileService::with_default_key(&store);

    let first = service
        .run_pass(&PassOptions::default(), &mut CollectingReporter::new())
        .unwrap();
    assert_eq!(first.outcome, Outcome::ReconciledAndSaved);
    assert_eq!(first.audit.len(), 2);
    assert_ne!(first.audit[0].assigned_id, first.audit[1].assigned_id);

    let second = service
        .run_pass(&PassOptions::default(), &mut CollectingReporter::new())
        .unwrap();
    assert_eq!(second.outcome, Outcome::NoDuplicates);
    assert_eq!(store.write_count(), 1);
}

#[test]
fn empty_id_is_flagged_even_when_other_records_are_reassigned() {
    let store = store_with(json!([
        { "id": "", "name": "Blank" },
        { "id": "", "name": "Blank too" },
        { "id": "x", "name": "X" },
        { "id": "x" },
    ]));
    let service = ReconcileService::with_default_key(&store);

    let summary = service
        .run_pass(&seeded(), &mut CollectingReporter::new())
        .unwrap();

    assert_eq!(summary.audit.len(), 1);
    assert_eq!(summary.audit[0].index, 3);
    assert_eq!(summary.audit[0].duplicate_record_name, None);
    assert_eq!(
        summary.diagnostics,
        vec![
            Diagnostic::MissingIdentifier {
                index: 0,
                name: Some("Blank".to_string())
            },
            Diagnostic::MissingIdentifier {
                index: 1,
                name: Some("Blank too".to_string())
            },
            Diagnostic::MissingName {
                index: 3,
                id: Some(RecordKey::from("17000000000003"))
            },
        ]
    );

    let stored = decode_collection(&store.get(DEFAULT_STORE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored[0].raw_id(), Some(&json!("")));
    assert_eq!(stored[1].raw_id(), Some(&json!("")));
}

#[test]
fn reporter_sees_start_then_diagnostics_then_saved_fixes_then_one_outcome() {
    let store = store_with(json!([
        { "id": "1", "name": "Acme" },
        { "id": "1" },
    ]));
    let service = ReconcileService::new(&store, DEFAULT_STORE_KEY);
    let mut reporter = CollectingReporter::new();

    let summary = service.run_pass(&seeded(), &mut reporter).unwrap();

    assert_eq!(reporter.events.len(), 4);
    assert!(matches!(
        &reporter.events[0],
        ReportEvent::Started { pass_id, store_key }
            if *pass_id == summary.pass_id && store_key == DEFAULT_STORE_KEY
    ));
    assert!(matches!(reporter.events[1], ReportEvent::Diagnostic(_)));
    assert!(matches!(reporter.events[2], ReportEvent::Audit(_)));
    assert!(matches!(
        &reporter.events[3],
        ReportEvent::Finished { outcome: Outcome::ReconciledAndSaved, message }
            if message.contains("fixed 1 duplicate")
    ));
}

#[test]
fn numeric_ids_spelled_differently_are_reconciled() {
    let store = MemoryKvStore::with_entry(
        DEFAULT_STORE_KEY,
        r#"[{"id":1,"name":"Acme"},{"id":1.0,"name":"Beta"},{"id":100,"name":"C"},{"id":1e2,"name":"D"}]"#,
    );
    let service = ReconcileService::with_default_key(&store);
    let options = PassOptions {
        dry_run: false,
        seed: Some(IdSeed::fixed(7)),
    };

    let summary = service
        .run_pass(&options, &mut CollectingReporter::new())
        .unwrap();

    assert_eq!(summary.outcome, Outcome::ReconciledAndSaved);
    assert_eq!(summary.audit.len(), 2);
    assert_eq!(summary.audit[0].index, 1);
    assert_eq!(summary.audit[0].assigned_id, RecordKey::from("71"));
    assert_eq!(summary.audit[1].index, 3);
    assert_eq!(summary.audit[1].assigned_id, RecordKey::from("73"));

    let stored = decode_collection(&store.get(DEFAULT_STORE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored[0].raw_id(), Some(&json!(1)));
    assert_eq!(stored[2].raw_id(), Some(&json!(100)));
}

#[test]
fn custom_key_is_read_and_written() {
    let store = MemoryKvStore::with_entry(
        "holdings",
        json!([{ "id": 5, "name": "A" }, { "id": 5, "name": "B" }]).to_string(),
    );
    let service = ReconcileService::new(&store, "holdings");

    let summary = service
        .run_pass(&seeded(), &mut CollectingReporter::new())
        .unwrap();

    assert_eq!(summary.store_key, "holdings");
    assert_eq!(summary.outcome, Outcome::ReconciledAndSaved);
    assert_eq!(store.get(DEFAULT_STORE_KEY).unwrap(), None);
    assert!(store.get("holdings").unwrap().is_some());
}

#[test]
fn summary_serializes_for_operators() {
    let store = store_with(json!([
        { "id": "1", "name": "Acme" },
        { "id": "1", "name": "Beta" },
    ]));
    let service = ReconcileService::with_default_key(&store);
    let summary = service
        .run_pass(&seeded(), &mut CollectingReporter::new())
        .unwrap();

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["outcome"], "reconciled_and_saved");
    assert_eq!(value["examined"], 2);
    assert_eq!(value["audit"][0]["original_id"], "1");
    assert_eq!(value["audit"][0]["assigned_id"], "17000000000001");
    assert_eq!(value["pass_id"], summary.pass_id.to_string());
}
