//! Meeting and person views consumed from external collaborators

use crate::{MeetingId, PersonId};

/// The parts of a meeting the pipeline reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    /// Meeting identifier
    pub id: MeetingId,

    /// Display title (used in memory index metadata)
    pub title: String,
}

/// The parts of a person the pipeline reads and stamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Person identifier
    pub id: PersonId,

    /// Display name
    pub name: String,

    /// Last time any capture touched a meeting this person attends
    pub last_interaction_at: Option<u64>,
}
