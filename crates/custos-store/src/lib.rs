//! Custos Storage Layer
//!
//! Implements the ingestion store seams using SQLite.
//!
//! # Architecture
//!
//! - One SQLite database holds jobs, sources, extracted artifacts, the audit
//!   trail, and the meeting/person tables owned by external collaborators
//! - Transactions are explicit (`begin`/`commit`/`rollback`) so the worker
//!   controls exactly what survives a failed attempt
//! - [`Audited`] wraps the store and appends audit entries through the same
//!   connection, inside the same transaction
//!
//! # Examples
//!
//! ```no_run
//! use custos_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for ingestion
//! ```

#![warn(missing_docs)]

mod audited;

pub use audited::Audited;

use custos_domain::traits::{AuditLog, IngestionStore, JobQuery, MeetingDirectory, Transactional};
use custos_domain::{
    AuditAction, AuditEntry, AuditId, CaptureKind, Commitment, CommitmentId, FailureReason,
    Fingerprint, IngestionJob, JobId, JobOutcome, JobState, Meeting, MeetingId, Person, PersonId,
    RiskFlag, RiskFlagId, RiskFlagKind, SourceId, SourceRecord,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Person id list could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

const JOB_COLUMNS: &str = "id, meeting_id, payload, capture_kind, person_ids, relevant_at, \
     commitment_due_by, index_in_memory, fingerprint, status, error, source_id, created_at, \
     started_at, completed_at";

const SOURCE_COLUMNS: &str =
    "id, meeting_id, capture_kind, captured_at, relevant_at, fingerprint, indexed, uri";

/// SQLite-based implementation of the ingestion store
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. The admission gate and the worker
/// each open their own `SqliteStore` on the same database file.
pub struct SqliteStore {
    conn: Connection,
}

/// How long a connection waits on a locked database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use custos_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("custos.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        // Other connections wait for a writer instead of failing with SQLITE_BUSY
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Insert or rename a meeting
    pub fn upsert_meeting(&mut self, meeting: &Meeting) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO meetings (id, title) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET title = excluded.title",
            params![meeting.id.as_str(), &meeting.title],
        )?;
        Ok(())
    }

    /// Insert or rename a person (the interaction stamp is kept on conflict)
    pub fn upsert_person(&mut self, person: &Person) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO people (id, name, last_interaction_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![
                person.id.as_str(),
                &person.name,
                person.last_interaction_at.map(|t| t as i64),
            ],
        )?;
        Ok(())
    }

    /// Get a person by ID
    pub fn person(&self, id: &PersonId) -> Result<Option<Person>, StoreError> {
        let person = self
            .conn
            .query_row(
                "SELECT id, name, last_interaction_at FROM people WHERE id = ?1",
                params![id.as_str()],
                Self::row_to_person,
            )
            .optional()?;
        Ok(person)
    }

    /// Participants of a meeting, ordered by id
    pub fn participants(&self, meeting_id: &MeetingId) -> Result<Vec<Person>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.last_interaction_at
             FROM people p JOIN meeting_participants mp ON mp.person_id = p.id
             WHERE mp.meeting_id = ?1 ORDER BY p.id",
        )?;
        let people = stmt
            .query_map(params![meeting_id.as_str()], Self::row_to_person)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(people)
    }

    /// Number of source records
    pub fn count_sources(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sources", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_person(row: &Row<'_>) -> rusqlite::Result<Person> {
        Ok(Person {
            id: PersonId::new(row.get::<_, String>(0)?),
            name: row.get(1)?,
            last_interaction_at: row.get::<_, Option<i64>>(2)?.map(|t| t as u64),
        })
    }

    /// Wrap a decoding failure so it can travel through rusqlite's row mapper
    fn conversion(idx: usize, err: StoreError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
    }

    fn parse_kind(idx: usize, value: &str) -> rusqlite::Result<CaptureKind> {
        CaptureKind::parse(value).ok_or_else(|| {
            Self::conversion(idx, StoreError::InvalidData(format!("Unknown capture kind: {}", value)))
        })
    }

    /// Split a job state into its status, error and source columns
    fn state_columns(state: &JobState) -> (&'static str, Option<&'static str>, Option<&str>) {
        let status = state.status().as_str();
        match state {
            JobState::Finished(outcome) => {
                (status, outcome.error_code(), outcome.source_id().map(|id| id.as_str()))
            }
            _ => (status, None, None),
        }
    }

    /// Rebuild a job state from its status, error and source columns
    fn decode_state(
        status: &str,
        error: Option<String>,
        source_id: Option<String>,
    ) -> Result<JobState, StoreError> {
        match (status, error.as_deref(), source_id) {
            ("queued", _, _) => Ok(JobState::Queued),
            ("running", _, _) => Ok(JobState::Running),
            ("succeeded", Some("deduped"), Some(source)) => Ok(JobState::Finished(JobOutcome::Deduped {
                canonical_source_id: SourceId::from_string(source),
            })),
            ("succeeded", _, Some(source)) => Ok(JobState::Finished(JobOutcome::Succeeded {
                source_id: SourceId::from_string(source),
            })),
            ("succeeded", _, None) => Err(StoreError::InvalidData(
                "Succeeded job without a source".to_string(),
            )),
            ("failed", code, _) => Ok(JobState::Finished(JobOutcome::Failed {
                reason: code
                    .and_then(FailureReason::parse)
                    .unwrap_or(FailureReason::ProcessingError),
            })),
            (other, _, _) => Err(StoreError::InvalidData(format!("Unknown job status: {}", other))),
        }
    }

    fn row_to_job(row: &Row<'_>) -> rusqlite::Result<IngestionJob> {
        let kind: String = row.get(3)?;
        let people_json: String = row.get(4)?;
        let person_ids: Vec<String> = serde_json::from_str(&people_json)
            .map_err(|e| Self::conversion(4, StoreError::Serialization(e)))?;
        let status: String = row.get(9)?;
        let state = Self::decode_state(&status, row.get(10)?, row.get(11)?)
            .map_err(|e| Self::conversion(9, e))?;

        Ok(IngestionJob {
            id: JobId::from_string(row.get::<_, String>(0)?),
            meeting_id: MeetingId::new(row.get::<_, String>(1)?),
            payload: row.get(2)?,
            capture_kind: Self::parse_kind(3, &kind)?,
            person_ids: person_ids.into_iter().map(PersonId::new).collect(),
            relevant_at: row.get::<_, Option<i64>>(5)?.map(|t| t as u64),
            commitment_due_by: row.get::<_, Option<i64>>(6)?.map(|t| t as u64),
            index_in_memory: row.get(7)?,
            fingerprint: Fingerprint::from_string(row.get::<_, String>(8)?),
            state,
            created_at: row.get::<_, i64>(12)? as u64,
            started_at: row.get::<_, Option<i64>>(13)?.map(|t| t as u64),
            completed_at: row.get::<_, Option<i64>>(14)?.map(|t| t as u64),
        })
    }

    fn row_to_source(row: &Row<'_>) -> rusqlite::Result<SourceRecord> {
        let kind: String = row.get(2)?;
        Ok(SourceRecord {
            id: SourceId::from_string(row.get::<_, String>(0)?),
            meeting_id: MeetingId::new(row.get::<_, String>(1)?),
            capture_kind: Self::parse_kind(2, &kind)?,
            captured_at: row.get::<_, i64>(3)? as u64,
            relevant_at: row.get::<_, Option<i64>>(4)?.map(|t| t as u64),
            fingerprint: Fingerprint::from_string(row.get::<_, String>(5)?),
            indexed: row.get(6)?,
            uri: row.get(7)?,
        })
    }

    fn person_ids_json(job: &IngestionJob) -> Result<String, StoreError> {
        let ids: Vec<&str> = job.person_ids.iter().map(|id| id.as_str()).collect();
        Ok(serde_json::to_string(&ids)?)
    }
}

impl Transactional for SqliteStore {
    type Error = StoreError;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

impl IngestionStore for SqliteStore {
    fn insert_job(&mut self, job: &IngestionJob) -> Result<(), Self::Error> {
        let (status, error, source_id) = Self::state_columns(&job.state);
        let person_ids = Self::person_ids_json(job)?;

        self.conn.execute(
            &format!(
                "INSERT INTO ingestion_jobs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                JOB_COLUMNS
            ),
            params![
                job.id.as_str(),
                job.meeting_id.as_str(),
                &job.payload,
                job.capture_kind.as_str(),
                person_ids,
                job.relevant_at.map(|t| t as i64),
                job.commitment_due_by.map(|t| t as i64),
                job.index_in_memory,
                job.fingerprint.as_str(),
                status,
                error,
                source_id,
                job.created_at as i64,
                job.started_at.map(|t| t as i64),
                job.completed_at.map(|t| t as i64),
            ],
        )?;

        debug!(job_id = %job.id, "Inserted ingestion job");
        Ok(())
    }

    fn update_job(&mut self, job: &IngestionJob) -> Result<(), Self::Error> {
        let (status, error, source_id) = Self::state_columns(&job.state);

        let changed = self.conn.execute(
            "UPDATE ingestion_jobs
             SET status = ?2, error = ?3, source_id = ?4, started_at = ?5, completed_at = ?6
             WHERE id = ?1",
            params![
                job.id.as_str(),
                status,
                error,
                source_id,
                job.started_at.map(|t| t as i64),
                job.completed_at.map(|t| t as i64),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::InvalidData(format!("Job not found: {}", job.id)));
        }
        Ok(())
    }

    fn get_job(&self, id: &JobId) -> Result<Option<IngestionJob>, Self::Error> {
        let job = self
            .conn
            .query_row(
                &format!("SELECT {} FROM ingestion_jobs WHERE id = ?1", JOB_COLUMNS),
                params![id.as_str()],
                Self::row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    fn query_jobs(&self, query: &JobQuery) -> Result<Vec<IngestionJob>, Self::Error> {
        let mut sql = format!("SELECT {} FROM ingestion_jobs WHERE 1=1", JOB_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(meeting_id) = &query.meeting_id {
            sql.push_str(" AND meeting_id = ?");
            params.push(Box::new(meeting_id.as_str().to_string()));
        }

        if let Some(kind) = query.capture_kind {
            sql.push_str(" AND capture_kind = ?");
            params.push(Box::new(kind.as_str()));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(fingerprint) = &query.fingerprint {
            sql.push_str(" AND fingerprint = ?");
            params.push(Box::new(fingerprint.as_str().to_string()));
        }

        if let Some(source_id) = &query.source_id {
            sql.push_str(" AND source_id = ?");
            params.push(Box::new(source_id.as_str().to_string()));
        }

        if let Some(since) = query.created_since {
            sql.push_str(" AND created_at >= ?");
            params.push(Box::new(since as i64));
        }

        if let Some(since) = query.completed_since {
            sql.push_str(" AND completed_at >= ?");
            params.push(Box::new(since as i64));
        }

        if let Some(before) = query.completed_before {
            sql.push_str(" AND completed_at <= ?");
            params.push(Box::new(before as i64));
        }

        if query.newest_first {
            sql.push_str(" ORDER BY created_at DESC, id DESC");
        } else {
            sql.push_str(" ORDER BY created_at ASC, id ASC");
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let jobs = stmt
            .query_map(&param_refs[..], Self::row_to_job)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    fn insert_source(&mut self, source: &SourceRecord) -> Result<(), Self::Error> {
        self.conn.execute(
            &format!(
                "INSERT INTO sources ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                SOURCE_COLUMNS
            ),
            params![
                source.id.as_str(),
                source.meeting_id.as_str(),
                source.capture_kind.as_str(),
                source.captured_at as i64,
                source.relevant_at.map(|t| t as i64),
                source.fingerprint.as_str(),
                source.indexed,
                &source.uri,
            ],
        )?;
        Ok(())
    }

    fn get_source(&self, id: &SourceId) -> Result<Option<SourceRecord>, Self::Error> {
        let source = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS),
                params![id.as_str()],
                Self::row_to_source,
            )
            .optional()?;
        Ok(source)
    }

    fn find_source_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<SourceRecord>, Self::Error> {
        let source = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE fingerprint = ?1", SOURCE_COLUMNS),
                params![fingerprint.as_str()],
                Self::row_to_source,
            )
            .optional()?;
        Ok(source)
    }

    fn delete_source(&mut self, id: &SourceId) -> Result<(), Self::Error> {
        // Commitments and risk flags go with it via ON DELETE CASCADE
        self.conn
            .execute("DELETE FROM sources WHERE id = ?1", params![id.as_str()])?;
        Ok(())
    }

    fn insert_commitment(&mut self, commitment: &Commitment) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO commitments (id, source_id, text, rule_id, due_at, acknowledged, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                commitment.id.as_str(),
                commitment.source_id.as_str(),
                &commitment.text,
                &commitment.rule_id,
                commitment.due_at.map(|t| t as i64),
                commitment.acknowledged,
                commitment.created_at as i64,
            ],
        )?;
        Ok(())
    }

    fn commitments_for_source(&self, id: &SourceId) -> Result<Vec<Commitment>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_id, text, rule_id, due_at, acknowledged, created_at
             FROM commitments WHERE source_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;

        let commitments = stmt
            .query_map(params![id.as_str()], |row| {
                Ok(Commitment {
                    id: CommitmentId::from_string(row.get::<_, String>(0)?),
                    source_id: SourceId::from_string(row.get::<_, String>(1)?),
                    text: row.get(2)?,
                    rule_id: row.get(3)?,
                    due_at: row.get::<_, Option<i64>>(4)?.map(|t| t as u64),
                    acknowledged: row.get(5)?,
                    created_at: row.get::<_, i64>(6)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(commitments)
    }

    fn delete_commitment(&mut self, id: &CommitmentId) -> Result<(), Self::Error> {
        self.conn
            .execute("DELETE FROM commitments WHERE id = ?1", params![id.as_str()])?;
        Ok(())
    }

    fn insert_risk_flag(&mut self, flag: &RiskFlag) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO risk_flags (id, source_id, kind, rule_id, excerpt, captured_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                flag.id.as_str(),
                flag.source_id.as_str(),
                flag.kind.as_str(),
                &flag.rule_id,
                &flag.excerpt,
                flag.captured_at as i64,
            ],
        )?;
        Ok(())
    }

    fn risk_flags_for_source(&self, id: &SourceId) -> Result<Vec<RiskFlag>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_id, kind, rule_id, excerpt, captured_at
             FROM risk_flags WHERE source_id = ?1 ORDER BY rowid ASC",
        )?;

        let flags = stmt
            .query_map(params![id.as_str()], |row| {
                let kind: String = row.get(2)?;
                Ok(RiskFlag {
                    id: RiskFlagId::from_string(row.get::<_, String>(0)?),
                    source_id: SourceId::from_string(row.get::<_, String>(1)?),
                    kind: RiskFlagKind::parse(&kind).ok_or_else(|| {
                        Self::conversion(
                            2,
                            StoreError::InvalidData(format!("Unknown risk flag kind: {}", kind)),
                        )
                    })?,
                    rule_id: row.get(3)?,
                    excerpt: row.get(4)?,
                    captured_at: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(flags)
    }
}

impl MeetingDirectory for SqliteStore {
    fn meeting(&self, id: &MeetingId) -> Result<Option<Meeting>, Self::Error> {
        let meeting = self
            .conn
            .query_row(
                "SELECT id, title FROM meetings WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(Meeting {
                        id: MeetingId::new(row.get::<_, String>(0)?),
                        title: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(meeting)
    }

    fn existing_people(&self, ids: &[PersonId]) -> Result<Vec<PersonId>, Self::Error> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM people WHERE id = ?1")?;
        let mut found = Vec::new();
        for id in ids {
            if stmt.exists(params![id.as_str()])? && !found.contains(id) {
                found.push(id.clone());
            }
        }
        Ok(found)
    }

    fn link_participant(
        &mut self,
        meeting_id: &MeetingId,
        person_id: &PersonId,
    ) -> Result<bool, Self::Error> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO meeting_participants (meeting_id, person_id) VALUES (?1, ?2)",
            params![meeting_id.as_str(), person_id.as_str()],
        )?;
        Ok(inserted == 1)
    }

    fn touch_participants(
        &mut self,
        meeting_id: &MeetingId,
        at: u64,
    ) -> Result<Vec<PersonId>, Self::Error> {
        let touched: Vec<PersonId> = {
            let mut stmt = self.conn.prepare(
                "SELECT person_id FROM meeting_participants WHERE meeting_id = ?1 ORDER BY person_id",
            )?;
            let ids = stmt
                .query_map(params![meeting_id.as_str()], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids.into_iter().map(PersonId::new).collect()
        };

        self.conn.execute(
            "UPDATE people SET last_interaction_at = ?2
             WHERE id IN (SELECT person_id FROM meeting_participants WHERE meeting_id = ?1)",
            params![meeting_id.as_str(), at as i64],
        )?;

        Ok(touched)
    }
}

impl AuditLog for SqliteStore {
    fn append_audit(&mut self, entry: &AuditEntry) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO audit_log (id, actor, action, entity_type, entity_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id.as_str(),
                &entry.actor,
                entry.action.as_str(),
                &entry.entity_type,
                &entry.entity_id,
                entry.created_at as i64,
            ],
        )?;
        Ok(())
    }

    fn list_audit(&self, entity_id: Option<&str>) -> Result<Vec<AuditEntry>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor, action, entity_type, entity_id, created_at FROM audit_log
             WHERE ?1 IS NULL OR entity_id = ?1
             ORDER BY rowid ASC",
        )?;

        let entries = stmt
            .query_map(params![entity_id], |row| {
                let action: String = row.get(2)?;
                Ok(AuditEntry {
                    id: AuditId::from_string(row.get::<_, String>(0)?),
                    actor: row.get(1)?,
                    action: AuditAction::parse(&action).ok_or_else(|| {
                        Self::conversion(
                            2,
                            StoreError::InvalidData(format!("Unknown audit action: {}", action)),
                        )
                    })?,
                    entity_type: row.get(3)?,
                    entity_id: row.get(4)?,
                    created_at: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
