//! Job listing, health and audit command implementations.

use custos_domain::traits::AuditLog;
use custos_gatekeeper::{ingestion_health, AdmissionGate};

use crate::cli::{AuditArgs, JobsArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::Store;

/// Execute the jobs command.
pub fn execute_jobs(args: JobsArgs, store: &Store, config: &Config, formatter: &Formatter) -> Result<()> {
    let gate = AdmissionGate::new(config.admission.clone());
    let jobs = gate.list_jobs(store, args.status.map(Into::into), args.limit)?;

    println!("{}", formatter.format_jobs(&jobs)?);
    Ok(())
}

/// Execute the health command.
pub fn execute_health(store: &Store, formatter: &Formatter) -> Result<()> {
    let health = ingestion_health(store)?;

    println!("{}", formatter.format_health(&health)?);
    Ok(())
}

/// Execute the audit command.
pub fn execute_audit(args: AuditArgs, store: &Store, formatter: &Formatter) -> Result<()> {
    let entries = store.list_audit(args.entity.as_deref())?;

    println!("{}", formatter.format_audit(&entries)?);
    Ok(())
}
