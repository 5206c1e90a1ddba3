//! Admission gate tests against an in-memory SQLite store

use custos_domain::traits::IngestionStore;
use custos_domain::{
    CaptureKind, FailureReason, JobId, JobOutcome, JobStatus, ManualClock, Meeting, MeetingId, Person,
    PersonId,
};
use custos_gatekeeper::{
    ingestion_health, AdmissionConfig, AdmissionGate, GatekeeperError, HealthState, SubmitRequest,
};
use custos_store::SqliteStore;

fn store() -> SqliteStore {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store
        .upsert_meeting(&Meeting {
            id: MeetingId::from("m_1"),
            title: "Weekly sync".to_string(),
        })
        .unwrap();
    store
        .upsert_person(&Person {
            id: PersonId::from("p_1"),
            name: "Ada".to_string(),
            last_interaction_at: None,
        })
        .unwrap();
    store
}

fn request(kind: &str, payload: &str) -> SubmitRequest {
    SubmitRequest {
        meeting_id: "m_1".to_string(),
        capture_kind: kind.to_string(),
        payload: payload.to_string(),
        ..SubmitRequest::default()
    }
}

#[test]
fn test_submit_queues_job() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let admission = gate.submit(&mut store, &clock, request("notes", "Plan next steps")).unwrap();
    assert!(!admission.replayed);

    let report = gate.job_status(&store, &admission.job_id).unwrap();
    assert_eq!(report.status, JobStatus::Queued);
    assert_eq!(report.error, None);
    assert_eq!(report.started_at, None);
}

#[test]
fn test_resubmission_within_window_replays() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let first = gate.submit(&mut store, &clock, request("notes", "Plan next steps")).unwrap();
    clock.advance(60);
    let second = gate
        .submit(&mut store, &clock, request("notes", "  plan   NEXT steps "))
        .unwrap();

    assert_eq!(first.job_id, second.job_id);
    assert!(second.replayed);
    assert_eq!(gate.list_jobs(&store, None, 10).unwrap().len(), 1);
}

#[test]
fn test_resubmission_after_window_creates_job() {
    let mut store = store();
    let gate = AdmissionGate::new(AdmissionConfig { lookback_secs: 120 });
    let clock = ManualClock::new(1_000);

    let first = gate.submit(&mut store, &clock, request("notes", "Plan next steps")).unwrap();
    clock.advance(121);
    let second = gate.submit(&mut store, &clock, request("notes", "Plan next steps")).unwrap();

    assert_ne!(first.job_id, second.job_id);
    assert!(!second.replayed);

    // Both jobs carry the same fingerprint; processing-time dedup handles them
    let first_job = store.get_job(&first.job_id).unwrap().unwrap();
    let second_job = store.get_job(&second.job_id).unwrap().unwrap();
    assert_eq!(first_job.fingerprint, second_job.fingerprint);
}

#[test]
fn test_different_people_do_not_replay() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let first = gate.submit(&mut store, &clock, request("notes", "Plan next steps")).unwrap();
    let second = gate
        .submit(
            &mut store,
            &clock,
            SubmitRequest {
                person_ids: vec!["p_1".to_string()],
                ..request("notes", "Plan next steps")
            },
        )
        .unwrap();

    assert_ne!(first.job_id, second.job_id);
}

#[test]
fn test_empty_payload_never_replays() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let first = gate.submit(&mut store, &clock, request("notes", "")).unwrap();
    let second = gate.submit(&mut store, &clock, request("notes", "")).unwrap();
    assert_ne!(first.job_id, second.job_id);
}

#[test]
fn test_unknown_people_silently_dropped() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let admission = gate
        .submit(
            &mut store,
            &clock,
            SubmitRequest {
                person_ids: vec!["ghost".to_string(), "p_1".to_string()],
                ..request("decision", "Ship it")
            },
        )
        .unwrap();

    let job = store.get_job(&admission.job_id).unwrap().unwrap();
    assert_eq!(job.person_ids, vec![PersonId::from("p_1")]);
}

#[test]
fn test_index_in_memory_defaults() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let reflection = gate.submit(&mut store, &clock, request("reflection", "Felt rushed")).unwrap();
    let notes = gate.submit(&mut store, &clock, request("notes", "Felt rushed")).unwrap();
    let overridden = gate
        .submit(
            &mut store,
            &clock,
            SubmitRequest {
                index_in_memory: Some(false),
                ..request("reflection", "Different reflection")
            },
        )
        .unwrap();

    assert!(store.get_job(&reflection.job_id).unwrap().unwrap().index_in_memory);
    assert!(!store.get_job(&notes.job_id).unwrap().unwrap().index_in_memory);
    assert!(!store.get_job(&overridden.job_id).unwrap().unwrap().index_in_memory);
}

#[test]
fn test_invalid_capture_kind_rejected() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let result = gate.submit(&mut store, &clock, request("memo", "text"));
    assert!(matches!(result, Err(GatekeeperError::InvalidArgument(_))));
    assert!(gate.list_jobs(&store, None, 10).unwrap().is_empty());
}

#[test]
fn test_blank_meeting_rejected() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let result = gate.submit(
        &mut store,
        &clock,
        SubmitRequest {
            meeting_id: "   ".to_string(),
            ..request("notes", "text")
        },
    );
    assert!(matches!(result, Err(GatekeeperError::InvalidArgument(_))));
}

#[test]
fn test_unknown_meeting_not_found() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let result = gate.submit(
        &mut store,
        &clock,
        SubmitRequest {
            meeting_id: "m_missing".to_string(),
            ..request("notes", "text")
        },
    );
    assert!(matches!(result, Err(GatekeeperError::NotFound(_))));
}

#[test]
fn test_job_status_unknown_job() {
    let store = store();
    let gate = AdmissionGate::default_config();
    let result = gate.job_status(&store, &JobId::from_string("j_missing"));
    assert!(matches!(result, Err(GatekeeperError::NotFound(_))));
}

#[test]
fn test_retry_resets_failed_job() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let admission = gate.submit(&mut store, &clock, request("notes", "Plan")).unwrap();
    let mut job = store.get_job(&admission.job_id).unwrap().unwrap();
    job.start(1_001);
    job.finish(
        JobOutcome::Failed {
            reason: FailureReason::ProcessingError,
        },
        1_002,
    );
    store.update_job(&job).unwrap();

    gate.retry_job(&mut store, &admission.job_id).unwrap();

    let report = gate.job_status(&store, &admission.job_id).unwrap();
    assert_eq!(report.status, JobStatus::Queued);
    assert_eq!(report.error, None);
}

#[test]
fn test_retry_unknown_job() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let result = gate.retry_job(&mut store, &JobId::from_string("j_missing"));
    assert!(matches!(result, Err(GatekeeperError::NotFound(_))));
}

#[test]
fn test_health_reports_attention_on_failures() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let health = ingestion_health(&store).unwrap();
    assert_eq!(health.health, HealthState::Healthy);
    assert_eq!(health.last_run, None);

    let admission = gate.submit(&mut store, &clock, request("notes", "Plan")).unwrap();
    let mut job = store.get_job(&admission.job_id).unwrap().unwrap();
    job.start(1_010);
    job.finish(
        JobOutcome::Failed {
            reason: FailureReason::ProcessingError,
        },
        1_020,
    );
    store.update_job(&job).unwrap();

    let health = ingestion_health(&store).unwrap();
    assert_eq!(health.health, HealthState::Attention);
    assert_eq!(health.error_count, 1);
    assert_eq!(health.last_run, Some(1_010));
    assert_eq!(health.last_success, None);
}

#[test]
fn test_follow_up_kind_accepted() {
    let mut store = store();
    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let admission = gate
        .submit(&mut store, &clock, request("follow-up", "Send the deck"))
        .unwrap();
    let job = store.get_job(&admission.job_id).unwrap().unwrap();
    assert_eq!(job.capture_kind, CaptureKind::FollowUp);
    assert_eq!(job.capture_kind.as_str(), "follow-up");

    // The underscore spelling is the same kind and replays
    let again = gate
        .submit(&mut store, &clock, request("follow_up", "Send the deck"))
        .unwrap();
    assert!(again.replayed);
    assert_eq!(again.job_id, admission.job_id);
}

#[test]
fn test_replay_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custos.db");
    let mut first = SqliteStore::new(&path).unwrap();
    first
        .upsert_meeting(&Meeting {
            id: MeetingId::from("m_1"),
            title: "Weekly sync".to_string(),
        })
        .unwrap();
    let mut second = SqliteStore::new(&path).unwrap();

    let gate = AdmissionGate::default_config();
    let clock = ManualClock::new(1_000);

    let original = gate.submit(&mut first, &clock, request("notes", "Plan next steps")).unwrap();
    let replay = gate.submit(&mut second, &clock, request("notes", "plan  NEXT steps")).unwrap();

    assert!(replay.replayed);
    assert_eq!(replay.job_id, original.job_id);
    assert_eq!(gate.list_jobs(&first, None, 10).unwrap().len(), 1);
}
