//! Dedupe and repair sweeps over hand-built legacy data

use custos_domain::traits::IngestionStore;
use custos_domain::{
    CaptureKind, Commitment, CommitmentId, Fingerprint, IngestionJob, JobId, JobOutcome, Meeting,
    MeetingId, NewJob, SourceId, SourceRecord,
};
use custos_store::SqliteStore;
use custos_worker::{DedupeSummary, Maintenance, RepairSummary};

fn store() -> SqliteStore {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store
        .upsert_meeting(&Meeting {
            id: MeetingId::from("m_1"),
            title: "Weekly sync".to_string(),
        })
        .unwrap();
    store
}

fn queued(payload: &str, created_at: u64) -> IngestionJob {
    IngestionJob::queued(
        NewJob {
            meeting_id: MeetingId::from("m_1"),
            payload: payload.to_string(),
            capture_kind: CaptureKind::Notes,
            person_ids: Vec::new(),
            relevant_at: None,
            commitment_due_by: None,
            index_in_memory: false,
        },
        created_at,
    )
}

fn source(store: &mut SqliteStore, fingerprint: Fingerprint) -> SourceRecord {
    let source = SourceRecord::new(
        MeetingId::from("m_1"),
        CaptureKind::Notes,
        1_000,
        None,
        fingerprint,
        false,
    );
    store.insert_source(&source).unwrap();
    source
}

/// A job that succeeded against `source_id`, whether or not that source exists
fn linked_job(
    store: &mut SqliteStore,
    job: IngestionJob,
    source_id: &SourceId,
    completed_at: u64,
) -> JobId {
    let mut job = job;
    job.start(job.created_at);
    job.finish(
        JobOutcome::Succeeded {
            source_id: source_id.clone(),
        },
        completed_at,
    );
    store.insert_job(&job).unwrap();
    job.id
}

fn commit(store: &mut SqliteStore, source: &SourceRecord, text: &str, created_at: u64) {
    store
        .insert_commitment(&Commitment {
            id: CommitmentId::new(),
            source_id: source.id.clone(),
            text: text.to_string(),
            rule_id: "commitment_bullet".to_string(),
            due_at: None,
            acknowledged: false,
            created_at,
        })
        .unwrap();
}

#[test]
fn test_dedupe_collapses_onto_first_completed_source() {
    let mut store = store();
    let a = source(&mut store, Fingerprint::from_string("legacy-a"));
    let b = source(&mut store, Fingerprint::from_string("legacy-b"));
    let c = source(&mut store, Fingerprint::from_string("legacy-c"));

    // Created first but completed last, so it is not canonical
    let late = linked_job(&mut store, queued("Send summary", 1_000), &a.id, 1_010);
    let early = linked_job(&mut store, queued("send  SUMMARY", 1_001), &b.id, 1_005);
    let other = linked_job(&mut store, queued("Unrelated capture", 1_002), &c.id, 1_003);

    commit(&mut store, &a, "Send summary", 1);
    commit(&mut store, &a, "Call vendor", 2);
    commit(&mut store, &b, "Send summary", 1);
    commit(&mut store, &b, "send summary ", 2);
    commit(&mut store, &c, "Unrelated capture", 1);

    let summary = Maintenance::new().dedupe_jobs(&mut store).unwrap();
    assert_eq!(
        summary,
        DedupeSummary {
            groups: 1,
            jobs_relinked: 1,
            sources_deleted: 1,
            commitments_deleted: 2,
            commitments_deduped: 1,
        }
    );

    let late = store.get_job(&late).unwrap().unwrap();
    assert_eq!(late.error_code(), Some("deduped"));
    assert_eq!(late.source_id(), Some(&b.id));
    assert_eq!(late.completed_at, Some(1_010));

    let early = store.get_job(&early).unwrap().unwrap();
    assert_eq!(early.error_code(), None);
    assert_eq!(store.get_job(&other).unwrap().unwrap().source_id(), Some(&c.id));

    assert!(store.get_source(&a.id).unwrap().is_none());
    assert_eq!(store.count_sources().unwrap(), 2);

    let kept = store.commitments_for_source(&b.id).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].text, "Send summary");
}

#[test]
fn test_dedupe_is_idempotent() {
    let mut store = store();
    let a = source(&mut store, Fingerprint::from_string("legacy-a"));
    let b = source(&mut store, Fingerprint::from_string("legacy-b"));
    linked_job(&mut store, queued("Send summary", 1_000), &a.id, 1_001);
    linked_job(&mut store, queued("Send summary", 1_002), &b.id, 1_003);

    let maintenance = Maintenance::new();
    let first = maintenance.dedupe_jobs(&mut store).unwrap();
    assert_eq!(first.jobs_relinked, 1);
    assert_eq!(first.sources_deleted, 1);

    let second = maintenance.dedupe_jobs(&mut store).unwrap();
    assert_eq!(second.jobs_relinked, 0);
    assert_eq!(second.sources_deleted, 0);
    assert_eq!(second.commitments_deduped, 0);
    assert_eq!(store.count_sources().unwrap(), 1);
}

#[test]
fn test_dedupe_keeps_distinct_relevance_times_apart() {
    let mut store = store();
    let a = source(&mut store, Fingerprint::from_string("legacy-a"));
    let b = source(&mut store, Fingerprint::from_string("legacy-b"));

    let mut later = queued("Send summary", 1_002);
    later.relevant_at = Some(90_000);
    linked_job(&mut store, queued("Send summary", 1_000), &a.id, 1_001);
    linked_job(&mut store, later, &b.id, 1_003);

    let summary = Maintenance::new().dedupe_jobs(&mut store).unwrap();
    assert_eq!(summary, DedupeSummary::default());
    assert_eq!(store.count_sources().unwrap(), 2);
}

#[test]
fn test_repair_recreates_source_under_original_id() {
    let mut store = store();
    let job = queued("Plan next steps", 1_000);
    let fingerprint = job.fingerprint.clone();
    let lost = source(&mut store, Fingerprint::from_string("lost"));
    let id = linked_job(&mut store, job, &lost.id, 1_020);
    store.delete_source(&lost.id).unwrap();

    let summary = Maintenance::new().repair_missing_sources(&mut store).unwrap();
    assert_eq!(
        summary,
        RepairSummary {
            missing_jobs: 1,
            sources_created: 1,
            jobs_relinked: 0,
        }
    );

    let restored = store.get_source(&lost.id).unwrap().unwrap();
    assert_eq!(restored.captured_at, 1_020);
    assert_eq!(restored.fingerprint, fingerprint);
    assert_eq!(restored.uri, format!("local://sources/{}", lost.id));
    assert_eq!(store.get_job(&id).unwrap().unwrap().source_id(), Some(&lost.id));
}

#[test]
fn test_repair_relinks_to_matching_fingerprint() {
    let mut store = store();
    let job = queued("Plan next steps", 1_000);
    let existing = source(&mut store, job.fingerprint.clone());
    let id = linked_job(&mut store, job, &SourceId::new(), 1_020);

    let summary = Maintenance::new().repair_missing_sources(&mut store).unwrap();
    assert_eq!(summary.missing_jobs, 1);
    assert_eq!(summary.jobs_relinked, 1);
    assert_eq!(summary.sources_created, 0);

    let job = store.get_job(&id).unwrap().unwrap();
    assert_eq!(job.source_id(), Some(&existing.id));
    assert_eq!(job.error_code(), Some("deduped"));
    assert_eq!(store.count_sources().unwrap(), 1);
}

#[test]
fn test_repair_recreates_shared_source_once() {
    let mut store = store();
    let missing = SourceId::new();
    linked_job(&mut store, queued("Plan next steps", 1_000), &missing, 1_001);
    linked_job(&mut store, queued("Plan next steps", 1_005), &missing, 1_006);

    let maintenance = Maintenance::new();
    let summary = maintenance.repair_missing_sources(&mut store).unwrap();
    assert_eq!(summary.missing_jobs, 2);
    assert_eq!(summary.sources_created, 1);

    // Recreated from the oldest job
    assert_eq!(store.get_source(&missing).unwrap().unwrap().captured_at, 1_001);

    let rerun = maintenance.repair_missing_sources(&mut store).unwrap();
    assert_eq!(rerun, RepairSummary::default());
}
