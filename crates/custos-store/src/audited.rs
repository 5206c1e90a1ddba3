//! Audit write-through decorator
//!
//! [`Audited`] wraps a store and appends one [`AuditEntry`] per mutation
//! through the wrapped store itself. Because the entry is written on the same
//! connection, it commits or rolls back together with the mutation.

use custos_domain::traits::{AuditLog, IngestionStore, JobQuery, MeetingDirectory, Transactional};
use custos_domain::{
    AuditAction, AuditEntry, Clock, Commitment, CommitmentId, Fingerprint, IngestionJob, JobId,
    Meeting, MeetingId, Person, PersonId, RiskFlag, SourceId, SourceRecord, SystemClock,
};

use crate::{SqliteStore, StoreError};

const JOB_ENTITY: &str = "IngestionJob";
const SOURCE_ENTITY: &str = "SourceRecord";
const COMMITMENT_ENTITY: &str = "Commitment";
const RISK_FLAG_ENTITY: &str = "RiskFlag";
const PARTICIPANT_ENTITY: &str = "MeetingParticipant";
const PERSON_ENTITY: &str = "Person";
const MEETING_ENTITY: &str = "Meeting";

/// Store decorator that records every mutation in the audit log
///
/// Reads pass straight through. Entries are attributed to the `system` actor.
pub struct Audited<S> {
    inner: S,
}

impl<S> Audited<S> {
    /// Wrap a store
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the wrapped store (writes made this way are not audited)
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap the store
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AuditLog> Audited<S> {
    fn record(&mut self, action: AuditAction, entity_type: &str, entity_id: &str) -> Result<(), S::Error> {
        let entry = AuditEntry::system(action, entity_type, entity_id, SystemClock.now());
        self.inner.append_audit(&entry)
    }
}

impl Audited<SqliteStore> {
    /// Insert or rename a meeting, recording a create or update
    pub fn upsert_meeting(&mut self, meeting: &Meeting) -> Result<(), StoreError> {
        self.audited_write(|store| {
            let action = match store.inner.meeting(&meeting.id)? {
                Some(_) => AuditAction::Update,
                None => AuditAction::Create,
            };
            store.inner.upsert_meeting(meeting)?;
            store.record(action, MEETING_ENTITY, meeting.id.as_str())
        })
    }

    /// Insert or rename a person, recording a create or update
    pub fn upsert_person(&mut self, person: &Person) -> Result<(), StoreError> {
        self.audited_write(|store| {
            let action = match store.inner.person(&person.id)? {
                Some(_) => AuditAction::Update,
                None => AuditAction::Create,
            };
            store.inner.upsert_person(person)?;
            store.record(action, PERSON_ENTITY, person.id.as_str())
        })
    }

    /// Get a person by ID
    pub fn person(&self, id: &PersonId) -> Result<Option<Person>, StoreError> {
        self.inner.person(id)
    }

    fn audited_write<F>(&mut self, op: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Self) -> Result<(), StoreError>,
    {
        self.inner.begin()?;
        match op(self) {
            Ok(()) => self.inner.commit(),
            Err(e) => {
                if let Err(rollback) = self.inner.rollback() {
                    tracing::warn!(error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }
}

impl<S: Transactional> Transactional for Audited<S> {
    type Error = S::Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.inner.begin()
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        self.inner.rollback()
    }
}

impl<S: IngestionStore + AuditLog> IngestionStore for Audited<S> {
    fn insert_job(&mut self, job: &IngestionJob) -> Result<(), Self::Error> {
        self.inner.insert_job(job)?;
        self.record(AuditAction::Create, JOB_ENTITY, job.id.as_str())
    }

    fn update_job(&mut self, job: &IngestionJob) -> Result<(), Self::Error> {
        self.inner.update_job(job)?;
        self.record(AuditAction::Update, JOB_ENTITY, job.id.as_str())
    }

    fn get_job(&self, id: &JobId) -> Result<Option<IngestionJob>, Self::Error> {
        self.inner.get_job(id)
    }

    fn query_jobs(&self, query: &JobQuery) -> Result<Vec<IngestionJob>, Self::Error> {
        self.inner.query_jobs(query)
    }

    fn insert_source(&mut self, source: &SourceRecord) -> Result<(), Self::Error> {
        self.inner.insert_source(source)?;
        self.record(AuditAction::Create, SOURCE_ENTITY, source.id.as_str())
    }

    fn get_source(&self, id: &SourceId) -> Result<Option<SourceRecord>, Self::Error> {
        self.inner.get_source(id)
    }

    fn find_source_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<SourceRecord>, Self::Error> {
        self.inner.find_source_by_fingerprint(fingerprint)
    }

    fn delete_source(&mut self, id: &SourceId) -> Result<(), Self::Error> {
        // Cascaded rows are deleted by the store; record them before they disappear
        let commitments = self.inner.commitments_for_source(id)?;
        let flags = self.inner.risk_flags_for_source(id)?;

        self.inner.delete_source(id)?;

        for commitment in &commitments {
            self.record(AuditAction::Delete, COMMITMENT_ENTITY, commitment.id.as_str())?;
        }
        for flag in &flags {
            self.record(AuditAction::Delete, RISK_FLAG_ENTITY, flag.id.as_str())?;
        }
        self.record(AuditAction::Delete, SOURCE_ENTITY, id.as_str())
    }

    fn insert_commitment(&mut self, commitment: &Commitment) -> Result<(), Self::Error> {
        self.inner.insert_commitment(commitment)?;
        self.record(AuditAction::Create, COMMITMENT_ENTITY, commitment.id.as_str())
    }

    fn commitments_for_source(&self, id: &SourceId) -> Result<Vec<Commitment>, Self::Error> {
        self.inner.commitments_for_source(id)
    }

    fn delete_commitment(&mut self, id: &CommitmentId) -> Result<(), Self::Error> {
        self.inner.delete_commitment(id)?;
        self.record(AuditAction::Delete, COMMITMENT_ENTITY, id.as_str())
    }

    fn insert_risk_flag(&mut self, flag: &RiskFlag) -> Result<(), Self::Error> {
        self.inner.insert_risk_flag(flag)?;
        self.record(AuditAction::Create, RISK_FLAG_ENTITY, flag.id.as_str())
    }

    fn risk_flags_for_source(&self, id: &SourceId) -> Result<Vec<RiskFlag>, Self::Error> {
        self.inner.risk_flags_for_source(id)
    }
}

impl<S: MeetingDirectory + AuditLog> MeetingDirectory for Audited<S> {
    fn meeting(&self, id: &MeetingId) -> Result<Option<Meeting>, Self::Error> {
        self.inner.meeting(id)
    }

    fn existing_people(&self, ids: &[PersonId]) -> Result<Vec<PersonId>, Self::Error> {
        self.inner.existing_people(ids)
    }

    fn link_participant(
        &mut self,
        meeting_id: &MeetingId,
        person_id: &PersonId,
    ) -> Result<bool, Self::Error> {
        let created = self.inner.link_participant(meeting_id, person_id)?;
        if created {
            let link = format!("{}:{}", meeting_id, person_id);
            self.record(AuditAction::Create, PARTICIPANT_ENTITY, &link)?;
        }
        Ok(created)
    }

    fn touch_participants(
        &mut self,
        meeting_id: &MeetingId,
        at: u64,
    ) -> Result<Vec<PersonId>, Self::Error> {
        let touched = self.inner.touch_participants(meeting_id, at)?;
        for person_id in &touched {
            self.record(AuditAction::Update, PERSON_ENTITY, person_id.as_str())?;
        }
        Ok(touched)
    }
}

impl<S: AuditLog> AuditLog for Audited<S> {
    fn append_audit(&mut self, entry: &AuditEntry) -> Result<(), Self::Error> {
        self.inner.append_audit(entry)
    }

    fn list_audit(&self, entity_id: Option<&str>) -> Result<Vec<AuditEntry>, Self::Error> {
        self.inner.list_audit(entity_id)
    }
}
