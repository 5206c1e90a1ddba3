//! Command-level tests against a database file

use custos_cli::cli::{
    AuditArgs, ConfigAction, ConfigArgs, JobArgs, JobsArgs, MeetingAction, MeetingArgs, PersonAction,
    PersonArgs, RunOnceArgs, StatusArg, SubmitArgs,
};
use custos_cli::commands;
use custos_cli::config::OutputFormat;
use custos_cli::{open_store, CliError, Config, Formatter, Store};
use custos_domain::traits::{AuditLog, IngestionStore, JobQuery};
use custos_domain::{JobStatus, PersonId};
use custos_gatekeeper::GatekeeperError;
use tempfile::TempDir;

fn setup() -> (TempDir, String, Store) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custos.db").to_string_lossy().into_owned();
    let mut store = open_store(&path).unwrap();
    let formatter = quiet();

    commands::execute_meeting(
        MeetingArgs {
            action: MeetingAction::Add {
                id: "m_1".to_string(),
                title: "Weekly sync".to_string(),
            },
        },
        &mut store,
        &formatter,
    )
    .unwrap();
    commands::execute_person(
        PersonArgs {
            action: PersonAction::Add {
                id: "p_1".to_string(),
                name: "Avery".to_string(),
            },
        },
        &mut store,
        &formatter,
    )
    .unwrap();

    (dir, path, store)
}

fn quiet() -> Formatter {
    Formatter::new(OutputFormat::Quiet, false)
}

fn submit_args(meeting: &str, payload: &str) -> SubmitArgs {
    SubmitArgs {
        meeting: meeting.to_string(),
        kind: "notes".to_string(),
        payload: Some(payload.to_string()),
        file: None,
        people: vec!["p_1".to_string()],
        relevant_at: None,
        due_by: None,
        index: false,
        no_index: false,
    }
}

fn jobs(store: &Store, status: JobStatus) -> usize {
    store.query_jobs(&JobQuery::with_status(status)).unwrap().len()
}

#[test]
fn test_submit_then_run_once() {
    let (_dir, _path, mut store) = setup();
    let config = Config::default();
    let formatter = quiet();

    commands::execute_submit(submit_args("m_1", "Plan next steps"), &mut store, &config, &formatter)
        .unwrap();
    assert_eq!(jobs(&store, JobStatus::Queued), 1);

    commands::execute_run_once(RunOnceArgs { drain: false }, &mut store, &config, &formatter).unwrap();
    assert_eq!(jobs(&store, JobStatus::Queued), 0);

    let done = store.query_jobs(&JobQuery::with_status(JobStatus::Succeeded)).unwrap();
    assert_eq!(done.len(), 1);
    let source_id = done[0].source_id().unwrap();
    assert!(store.get_source(source_id).unwrap().is_some());

    commands::execute_status(
        JobArgs {
            job_id: done[0].id.to_string(),
        },
        &store,
        &config,
        &formatter,
    )
    .unwrap();

    let person = store.person(&PersonId::from("p_1")).unwrap().unwrap();
    assert!(person.last_interaction_at.is_some());
}

#[test]
fn test_drain_processes_whole_queue() {
    let (_dir, _path, mut store) = setup();
    let config = Config::default();
    let formatter = quiet();

    for payload in ["First capture", "Second capture", "Third capture"] {
        commands::execute_submit(submit_args("m_1", payload), &mut store, &config, &formatter)
            .unwrap();
    }

    commands::execute_run_once(RunOnceArgs { drain: true }, &mut store, &config, &formatter).unwrap();
    assert_eq!(jobs(&store, JobStatus::Queued), 0);
    assert_eq!(jobs(&store, JobStatus::Succeeded), 3);
}

#[test]
fn test_jobs_survive_reopen() {
    let (_dir, path, mut store) = setup();
    let config = Config::default();

    commands::execute_submit(submit_args("m_1", "Plan next steps"), &mut store, &config, &quiet())
        .unwrap();
    drop(store);

    let store = open_store(&path).unwrap();
    assert_eq!(jobs(&store, JobStatus::Queued), 1);
    commands::execute_jobs(
        JobsArgs {
            status: Some(StatusArg::Queued),
            limit: 20,
        },
        &store,
        &config,
        &quiet(),
    )
    .unwrap();
}

#[test]
fn test_submit_unknown_meeting() {
    let (_dir, _path, mut store) = setup();

    let result = commands::execute_submit(
        submit_args("m_missing", "Plan next steps"),
        &mut store,
        &Config::default(),
        &quiet(),
    );
    assert!(matches!(result, Err(CliError::Gatekeeper(GatekeeperError::NotFound(_)))));
    assert_eq!(jobs(&store, JobStatus::Queued), 0);
}

#[test]
fn test_submit_invalid_kind() {
    let (_dir, _path, mut store) = setup();
    let mut args = submit_args("m_1", "Plan next steps");
    args.kind = "memo".to_string();

    let result = commands::execute_submit(args, &mut store, &Config::default(), &quiet());
    assert!(matches!(
        result,
        Err(CliError::Gatekeeper(GatekeeperError::InvalidArgument(_)))
    ));
}

#[test]
fn test_retry_unknown_job() {
    let (_dir, _path, mut store) = setup();

    let result = commands::execute_retry(
        JobArgs {
            job_id: "missing".to_string(),
        },
        &mut store,
        &Config::default(),
        &quiet(),
    );
    assert!(matches!(result, Err(CliError::Gatekeeper(GatekeeperError::NotFound(_)))));
}

#[test]
fn test_person_show_missing() {
    let (_dir, _path, mut store) = setup();

    let result = commands::execute_person(
        PersonArgs {
            action: PersonAction::Show {
                id: "p_missing".to_string(),
            },
        },
        &mut store,
        &quiet(),
    );
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[test]
fn test_maintenance_and_reporting_on_fresh_database() {
    let (_dir, _path, mut store) = setup();
    let formatter = Formatter::new(OutputFormat::Json, false);

    commands::execute_dedupe(&mut store, &formatter).unwrap();
    commands::execute_repair(&mut store, &formatter).unwrap();
    commands::execute_health(&store, &formatter).unwrap();
    commands::execute_audit(AuditArgs { entity: None }, &store, &formatter).unwrap();
}

#[test]
fn test_directory_commands_are_audited() {
    let (_dir, _path, store) = setup();

    let meeting = store.list_audit(Some("m_1")).unwrap();
    assert_eq!(meeting.len(), 1);
    assert_eq!(meeting[0].entity_type, "Meeting");

    let person = store.list_audit(Some("p_1")).unwrap();
    assert_eq!(person.len(), 1);
    assert_eq!(person[0].entity_type, "Person");
}

#[test]
fn test_config_commands_need_no_database() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let mut config = Config::default();
    config.database.path = dir.path().join("never.db").to_string_lossy().into_owned();

    commands::execute_config(
        ConfigArgs {
            action: ConfigAction::Init { force: false },
        },
        &config,
        &config_path,
        &quiet(),
    )
    .unwrap();
    commands::execute_config(ConfigArgs { action: ConfigAction::Show }, &config, &config_path, &quiet())
        .unwrap();

    assert_eq!(Config::load(Some(config_path.as_path())).unwrap(), Config::default());
    assert!(!dir.path().join("never.db").exists());
}
