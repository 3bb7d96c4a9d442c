//! Ingestion pipeline tests against in-memory doubles.

use std::sync::atomic::Ordering;

use alloy::primitives::U256;
use serde_json::json;

use measurement_gateway::anchoring::{AnchorOutcome, AnchorState};
use measurement_gateway::blockchain::StoredRecord;
use measurement_gateway::crypto::{self, asymmetric, symmetric, SymmetricKey};
use measurement_gateway::pipeline::IngestError;

mod common;
use common::{CountingStorage, Harness, MemoryLedger, StaticGate};

#[tokio::test]
async fn test_scenario_reaches_priced() {
    let h = Harness::standard();

    let report = h.pipeline.ingest(&common::scenario_measurement()).await.unwrap();

    assert_eq!(report.outcome, AnchorOutcome::Anchored);
    assert_eq!(report.anchor.final_state(), AnchorState::Priced);
    assert_eq!(
        report.anchor.path,
        vec![
            AnchorState::Unsubmitted,
            AnchorState::Submitting,
            AnchorState::AwaitingConfirmation,
            AnchorState::Confirmed,
            AnchorState::SettingPrice,
            AnchorState::Priced,
        ]
    );
    assert_eq!(report.anchor.transactions.len(), 2);

    let record = h.ledger.record(report.hash).expect("record anchored");
    assert_eq!(
        record.description,
        "sensor-1 by gw-test at 2023-01-01T00:00:00Z"
    );
    assert_eq!(h.ledger.price(report.hash), U256::from(5));
    assert_eq!(report.locator.unwrap().as_str(), "cidABC");
}

#[tokio::test]
async fn test_anchored_secret_opens_stored_payload() {
    let h = Harness::standard();
    let measurement = common::scenario_measurement();
    let report = h.pipeline.ingest(&measurement).await.unwrap();

    // Administrator side: decrypt the secret from the ledger.
    let record = h.ledger.record(report.hash).unwrap();
    let sealed = hex::decode(&record.encrypted_uri).unwrap();
    let secret = asymmetric::decrypt(&common::admin_secret(), &sealed).unwrap();
    let (key, locator) = secret.split_at(symmetric::KEY_LEN);
    assert_eq!(locator, b"cidABC");

    // Fetch and open the stored blob.
    let blob = h.storage.blobs.lock().unwrap()[0].clone();
    let key = SymmetricKey::from_slice(key).unwrap();
    let message = symmetric::decrypt(&key, &blob).unwrap();
    let opened = crypto::open(&message).unwrap();

    assert_eq!(opened.hash, report.hash);
    assert_eq!(opened.signer, common::gateway_wallet().address());
    assert_eq!(opened.canonical, crypto::canonicalize(measurement.raw()).unwrap());
}

#[tokio::test]
async fn test_resubmission_short_circuits() {
    let h = Harness::standard();
    let measurement = common::scenario_measurement();

    let first = h.pipeline.ingest(&measurement).await.unwrap();
    let submissions = h.ledger.submissions();
    let stored = h.storage.calls();

    let second = h.pipeline.ingest(&measurement).await.unwrap();

    assert_eq!(second.outcome, AnchorOutcome::AlreadyRecorded);
    assert_eq!(second.hash, first.hash);
    assert!(second.anchor.transactions.is_empty());
    assert!(second.locator.is_none());
    assert_eq!(h.ledger.submissions(), submissions);
    assert_eq!(h.storage.calls(), stored);
    assert_eq!(h.ledger.record_count(), 1);
}

#[tokio::test]
async fn test_field_order_does_not_change_identity() {
    let h = Harness::standard();

    let a = common::measurement(json!({
        "id": "sensor-2",
        "temperature": 20,
        "dateObserved": {"value": "2023-05-01T10:00:00Z", "type": "DateTime"}
    }));
    let b = common::measurement(json!({
        "dateObserved": {"type": "DateTime", "value": "2023-05-01T10:00:00Z"},
        "temperature": 20,
        "id": "sensor-2"
    }));

    let first = h.pipeline.ingest(&a).await.unwrap();
    let second = h.pipeline.ingest(&b).await.unwrap();

    assert_eq!(first.hash, second.hash);
    assert_eq!(second.outcome, AnchorOutcome::AlreadyRecorded);
}

#[tokio::test]
async fn test_record_without_price_resumes_pricing() {
    let h = Harness::standard();
    let measurement = common::scenario_measurement();
    let canonical = crypto::canonicalize(measurement.raw()).unwrap();
    let hash = crypto::content_hash(&canonical);
    h.ledger.seed_record(
        hash,
        StoredRecord {
            encrypted_uri: "aa".into(),
            description: "from an earlier run".into(),
        },
    );

    let report = h.pipeline.ingest(&measurement).await.unwrap();

    assert_eq!(report.outcome, AnchorOutcome::Resumed);
    assert_eq!(h.ledger.record_submissions.load(Ordering::SeqCst), 0);
    assert_eq!(h.ledger.price_submissions.load(Ordering::SeqCst), 1);
    assert_eq!(h.ledger.price(hash), U256::from(5));
    assert_eq!(h.storage.calls(), 0);
    // Write-once: the earlier record is untouched.
    assert_eq!(h.ledger.record(hash).unwrap().description, "from an earlier run");
}

#[tokio::test]
async fn test_storage_unavailable_prevents_ledger_writes() {
    let h = Harness::new(
        MemoryLedger::new(),
        CountingStorage::unavailable(),
        StaticGate::allowing(),
        5,
    );

    let err = h.pipeline.ingest(&common::scenario_measurement()).await.unwrap_err();

    assert!(matches!(err, IngestError::Storage(_)));
    assert_eq!(err.category(), "storage_error");
    assert_eq!(h.storage.calls(), 1);
    assert_eq!(h.ledger.submissions(), 0);
}

#[tokio::test]
async fn test_denied_identity_has_no_side_effects() {
    let h = Harness::new(
        MemoryLedger::new(),
        CountingStorage::new("cidABC"),
        StaticGate::denying(),
        5,
    );

    let err = h.pipeline.ingest(&common::scenario_measurement()).await.unwrap_err();

    assert!(matches!(err, IngestError::AccessDenied { .. }));
    assert_eq!(h.storage.calls(), 0);
    assert_eq!(h.ledger.reads.load(Ordering::SeqCst), 0);
    assert_eq!(h.ledger.submissions(), 0);
}

#[tokio::test]
async fn test_gate_sees_gateway_public_key() {
    let h = Harness::standard();
    h.pipeline.ingest(&common::scenario_measurement()).await.unwrap();

    let identities = h.gate.identities.lock().unwrap().clone();
    assert_eq!(identities, vec![common::gateway_wallet().public_key_hex()]);
    assert_eq!(h.pipeline.identity(), identities[0]);
}

#[tokio::test]
async fn test_missing_date_observed_is_rejected_before_access_check() {
    let h = Harness::standard();

    let err = h
        .pipeline
        .ingest(&common::measurement(json!({"id": "sensor-1"})))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "validation_error");
    assert_eq!(h.gate.checks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_admin_key_fails_before_storage() {
    let h = Harness::new(
        MemoryLedger::new(),
        CountingStorage::new("cidABC"),
        StaticGate::with_admin_key("not-a-key"),
        5,
    );

    let err = h.pipeline.ingest(&common::scenario_measurement()).await.unwrap_err();

    assert_eq!(err.category(), "crypto_error");
    assert_eq!(h.storage.calls(), 0);
    assert_eq!(h.ledger.submissions(), 0);
}

#[tokio::test]
async fn test_delegated_storage_receives_signed_plaintext() {
    let h = Harness::new(
        MemoryLedger::new(),
        CountingStorage::delegated("https://broker.example/m/1"),
        StaticGate::allowing(),
        5,
    );

    let report = h.pipeline.ingest(&common::scenario_measurement()).await.unwrap();

    let blob = h.storage.blobs.lock().unwrap()[0].clone();
    let opened = crypto::open(&blob).unwrap();
    assert_eq!(opened.hash, report.hash);

    let record = h.ledger.record(report.hash).unwrap();
    let secret = asymmetric::decrypt(
        &common::admin_secret(),
        &hex::decode(record.encrypted_uri).unwrap(),
    )
    .unwrap();
    assert_eq!(secret, b"https://broker.example/m/1");
}

#[tokio::test]
async fn test_rejected_submission_is_a_submission_error() {
    let h = Harness::new(
        MemoryLedger::rejecting(),
        CountingStorage::new("cidABC"),
        StaticGate::allowing(),
        5,
    );

    let err = h.pipeline.ingest(&common::scenario_measurement()).await.unwrap_err();

    assert_eq!(err.category(), "ledger_submission_error");
    // Stored blobs are not cleaned up.
    assert_eq!(h.storage.calls(), 1);
    assert_eq!(h.ledger.price_submissions.load(Ordering::SeqCst), 0);
}
