//! Maintenance command implementations.

use custos_worker::Maintenance;

use crate::error::Result;
use crate::output::Formatter;
use crate::Store;

/// Execute the dedupe command.
pub fn execute_dedupe(store: &mut Store, formatter: &Formatter) -> Result<()> {
    let summary = Maintenance::new().dedupe_jobs(store)?;

    println!("{}", formatter.format_dedupe(&summary)?);
    Ok(())
}

/// Execute the repair command.
pub fn execute_repair(store: &mut Store, formatter: &Formatter) -> Result<()> {
    let summary = Maintenance::new().repair_missing_sources(store)?;

    println!("{}", formatter.format_repair(&summary)?);
    Ok(())
}
