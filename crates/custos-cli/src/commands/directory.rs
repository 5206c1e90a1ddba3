//! Meeting and person command implementations.
//!
//! Meetings and people are owned by other parts of the product; these
//! commands create them so captures can be submitted from the CLI.

use custos_domain::{Meeting, MeetingId, Person, PersonId};

use crate::cli::{MeetingAction, MeetingArgs, PersonAction, PersonArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Store;

fn require(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Execute a meeting subcommand.
pub fn execute_meeting(args: MeetingArgs, store: &mut Store, formatter: &Formatter) -> Result<()> {
    match args.action {
        MeetingAction::Add { id, title } => {
            let meeting = Meeting {
                id: MeetingId::new(require(&id, "Meeting ID")?),
                title: require(&title, "Title")?,
            };
            store.upsert_meeting(&meeting)?;
            println!("{}", formatter.success(&format!("Meeting saved: {}", meeting.id)));
        }
    }
    Ok(())
}

/// Execute a person subcommand.
pub fn execute_person(args: PersonArgs, store: &mut Store, formatter: &Formatter) -> Result<()> {
    match args.action {
        PersonAction::Add { id, name } => {
            let id = PersonId::new(require(&id, "Person ID")?);
            // Keep the interaction timestamp when renaming
            let last_interaction_at = store
                .person(&id)?
                .and_then(|existing| existing.last_interaction_at);
            let person = Person {
                id,
                name: require(&name, "Name")?,
                last_interaction_at,
            };
            store.upsert_person(&person)?;
            println!("{}", formatter.success(&format!("Person saved: {}", person.id)));
        }
        PersonAction::Show { id } => {
            let id = PersonId::new(id);
            let person = store
                .person(&id)?
                .ok_or_else(|| CliError::InvalidInput(format!("Person not found: {}", id)))?;
            println!("{}", formatter.format_person(&person)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_trims() {
        assert_eq!(require("  m_1 ", "Meeting ID").unwrap(), "m_1");
        assert!(matches!(require("   ", "Title"), Err(CliError::InvalidInput(_))));
    }
}
