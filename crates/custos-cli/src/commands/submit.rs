//! Submit command implementation.

use std::fs;
use std::io::Read;
use std::path::Path;

use custos_domain::SystemClock;
use custos_gatekeeper::{AdmissionGate, SubmitRequest};

use crate::cli::SubmitArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Store;

/// Execute the submit command.
pub fn execute_submit(
    args: SubmitArgs,
    store: &mut Store,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let index_in_memory = args.index_override();
    let payload = match (args.payload, args.file.as_deref()) {
        (Some(payload), _) => payload,
        (None, Some(path)) => read_payload_file(path)?,
        (None, None) => read_payload_stdin()?,
    };

    let request = SubmitRequest {
        meeting_id: args.meeting,
        capture_kind: args.kind,
        payload,
        person_ids: args.people,
        relevant_at: args.relevant_at,
        commitment_due_by: args.due_by,
        index_in_memory,
    };

    let gate = AdmissionGate::new(config.admission.clone());
    let admission = gate.submit(store, &SystemClock, request)?;

    println!("{}", formatter.format_admission(&admission)?);
    Ok(())
}

/// Read a payload from a file.
pub fn read_payload_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        CliError::InvalidInput(format!("Cannot read payload file '{}': {}", path.display(), e))
    })
}

fn read_payload_stdin() -> Result<String> {
    let mut payload = String::new();
    std::io::stdin().read_to_string(&mut payload)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "Plan next steps\n- Send summary\n").unwrap();

        assert_eq!(read_payload_file(&path).unwrap(), "Plan next steps\n- Send summary\n");
    }

    #[test]
    fn test_read_missing_payload_file() {
        let result = read_payload_file(Path::new("/nonexistent/notes.txt"));
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }
}
