//! Status and retry command implementations.

use custos_domain::JobId;
use custos_gatekeeper::AdmissionGate;

use crate::cli::JobArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::Store;

/// Execute the status command.
pub fn execute_status(args: JobArgs, store: &Store, config: &Config, formatter: &Formatter) -> Result<()> {
    let gate = AdmissionGate::new(config.admission.clone());
    let report = gate.job_status(store, &JobId::from_string(args.job_id))?;

    println!("{}", formatter.format_status(&report)?);
    Ok(())
}

/// Execute the retry command.
pub fn execute_retry(args: JobArgs, store: &mut Store, config: &Config, formatter: &Formatter) -> Result<()> {
    let gate = AdmissionGate::new(config.admission.clone());
    let job_id = JobId::from_string(args.job_id);
    gate.retry_job(store, &job_id)?;

    println!("{}", formatter.success(&format!("Job requeued: {}", job_id)));
    Ok(())
}
