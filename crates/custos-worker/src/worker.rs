//! The ingestion worker state machine
//!
//! One call to [`Worker::run_once`] is one polling cycle: requeue failed jobs
//! past their backoff, claim the oldest queued job, and drive it to a
//! terminal outcome. All processing writes for a job share one transaction,
//! so a failed attempt leaves no source, commitment or risk flag behind.

use std::collections::HashSet;
use std::fmt::Display;

use custos_domain::traits::{
    excerpt, IndexMetadata, Indexer, IngestionStore, JobQuery, MeetingDirectory, Transactional,
};
use custos_domain::{
    normalize_payload, normalize_text, people_key, Clock, Commitment, CommitmentId,
    FailureReason, IngestionJob, JobId, JobOutcome, JobStatus, MeetingId, RiskFlag, RiskFlagId,
    SourceId, SourceRecord,
};
use custos_extractor::{extract_commitments, extract_risk_flags};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{WorkerConfig, WorkerError, WorkerMetrics};

pub(crate) fn store_error<E: Display>(err: E) -> WorkerError {
    WorkerError::Store(err.to_string())
}

/// Run `op` inside a store transaction, rolling back on failure
pub(crate) fn in_transaction<S, T, F>(store: &mut S, op: F) -> Result<T, WorkerError>
where
    S: Transactional,
    S::Error: Display,
    F: FnOnce(&mut S) -> Result<T, S::Error>,
{
    store.begin().map_err(store_error)?;
    match op(store) {
        Ok(value) => {
            store.commit().map_err(store_error)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = store.rollback() {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(store_error(e))
        }
    }
}

/// Why one processing attempt was abandoned
#[derive(Error, Debug)]
enum AttemptError {
    #[error("{0}")]
    Store(String),

    #[error("Meeting not found: {0}")]
    MeetingMissing(MeetingId),
}

fn attempt_error<E: Display>(err: E) -> AttemptError {
    AttemptError::Store(err.to_string())
}

/// A job the cycle drove to a terminal outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedJob {
    /// The claimed job
    pub job_id: JobId,

    /// Outcome recorded on the job
    pub outcome: JobOutcome,
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Failed jobs returned to the queue by the backoff sweep
    pub requeued: usize,

    /// The job claimed this cycle, if the queue was not empty
    pub processed: Option<ProcessedJob>,
}

impl CycleOutcome {
    /// Check if the cycle found nothing to claim
    pub fn is_idle(&self) -> bool {
        self.processed.is_none()
    }
}

/// Result of a successful processing attempt, before it is committed
struct Attempt {
    outcome: JobOutcome,
    commitments: usize,
    risk_flags: usize,
}

impl Attempt {
    fn deduped(canonical_source_id: SourceId) -> Self {
        Self {
            outcome: JobOutcome::Deduped {
                canonical_source_id,
            },
            commitments: 0,
            risk_flags: 0,
        }
    }
}

/// Single-consumer ingestion worker
///
/// Holds no store and no clock; both are passed to each cycle so the same
/// worker can be driven by the background loop, a CLI command or a test.
///
/// # Examples
///
/// ```
/// use custos_domain::ManualClock;
/// use custos_domain::traits::{IndexMetadata, Indexer};
/// use custos_store::SqliteStore;
/// use custos_worker::{Worker, WorkerConfig};
///
/// struct Discard;
///
/// impl Indexer for Discard {
///     type Error = std::convert::Infallible;
///
///     fn index(&self, _: &str, _: &IndexMetadata, _: &str) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
///
/// let mut store = SqliteStore::new(":memory:").unwrap();
/// let mut worker = Worker::new(WorkerConfig::default(), Discard);
///
/// let cycle = worker.run_once(&mut store, &ManualClock::new(1_000)).unwrap();
/// assert!(cycle.is_idle());
/// ```
pub struct Worker<I> {
    config: WorkerConfig,
    indexer: I,
    metrics: WorkerMetrics,
}

impl<I> Worker<I>
where
    I: Indexer,
    I::Error: Display,
{
    /// Create a worker submitting to `indexer`
    pub fn new(config: WorkerConfig, indexer: I) -> Self {
        Self {
            config,
            indexer,
            metrics: WorkerMetrics::new(),
        }
    }

    /// Worker configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// The indexer captures are submitted to
    pub fn indexer(&self) -> &I {
        &self.indexer
    }

    /// Get current metrics
    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    /// Reset metrics
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Run one cycle: backoff sweep, then claim and process at most one job
    ///
    /// A job whose processing fails is recorded as failed and the cycle still
    /// succeeds. Errors are returned only when the cycle's own bookkeeping
    /// (the sweep, the claim or the final status write) cannot reach the store.
    pub fn run_once<S, C>(&mut self, store: &mut S, clock: &C) -> Result<CycleOutcome, WorkerError>
    where
        S: IngestionStore + MeetingDirectory,
        S::Error: Display,
        C: Clock,
    {
        let now = clock.now();
        let requeued = self.requeue_failed(store, now)?;

        let claimed = store
            .query_jobs(&JobQuery {
                limit: Some(1),
                ..JobQuery::queued()
            })
            .map_err(store_error)?
            .into_iter()
            .next();

        let Some(mut job) = claimed else {
            self.metrics.record_idle();
            self.metrics.record_cycle();
            return Ok(CycleOutcome {
                requeued,
                processed: None,
            });
        };

        // The running transition is committed on its own
        job.start(now);
        in_transaction(store, |s| s.update_job(&job))?;
        debug!(job_id = %job.id, kind = %job.capture_kind, "Claimed ingestion job");

        store.begin().map_err(store_error)?;
        let attempt = self.process(store, &job, now).and_then(|attempt| {
            let mut finished = job.clone();
            finished.finish(attempt.outcome.clone(), now);
            store.update_job(&finished).map_err(attempt_error)?;
            store.commit().map_err(attempt_error)?;
            Ok(attempt)
        });

        let outcome = match attempt {
            Ok(attempt) => {
                match &attempt.outcome {
                    JobOutcome::Deduped {
                        canonical_source_id,
                    } => {
                        self.metrics.record_dedup();
                        info!(job_id = %job.id, source_id = %canonical_source_id, "Ingestion job deduped");
                    }
                    JobOutcome::Succeeded { source_id } => {
                        self.metrics
                            .record_success(attempt.commitments, attempt.risk_flags);
                        info!(
                            job_id = %job.id,
                            source_id = %source_id,
                            commitments = attempt.commitments,
                            risk_flags = attempt.risk_flags,
                            "Ingestion job succeeded"
                        );
                    }
                    JobOutcome::Failed { .. } => self.metrics.record_failure(),
                }
                attempt.outcome
            }
            Err(e) => {
                if let Err(rollback) = store.rollback() {
                    warn!(job_id = %job.id, error = %rollback, "Rollback failed");
                }
                warn!(job_id = %job.id, error = %e, "Ingestion job failed");

                let outcome = JobOutcome::Failed {
                    reason: FailureReason::ProcessingError,
                };
                job.finish(outcome.clone(), now);
                in_transaction(store, |s| s.update_job(&job))?;
                self.metrics.record_failure();
                outcome
            }
        };

        self.metrics.record_cycle();
        Ok(CycleOutcome {
            requeued,
            processed: Some(ProcessedJob {
                job_id: job.id,
                outcome,
            }),
        })
    }

    /// Reset failed jobs whose last attempt finished at least one backoff ago
    fn requeue_failed<S>(&mut self, store: &mut S, now: u64) -> Result<usize, WorkerError>
    where
        S: IngestionStore,
        S::Error: Display,
    {
        let cutoff = now.saturating_sub(self.config.backoff_secs);
        let due = store
            .query_jobs(&JobQuery {
                completed_before: Some(cutoff),
                ..JobQuery::with_status(JobStatus::Failed)
            })
            .map_err(store_error)?;

        if due.is_empty() {
            return Ok(0);
        }

        let count = due.len();
        in_transaction(store, |s| {
            for mut job in due {
                job.requeue();
                s.update_job(&job)?;
            }
            Ok(())
        })?;

        self.metrics.record_requeued(count);
        info!(count, "Requeued failed ingestion jobs");
        Ok(count)
    }

    /// Steps run inside the job's processing transaction
    fn process<S>(&mut self, store: &mut S, job: &IngestionJob, now: u64) -> Result<Attempt, AttemptError>
    where
        S: IngestionStore + MeetingDirectory,
        S::Error: Display,
    {
        if let Some(canonical) = self.find_recent_success(store, job, now)? {
            debug!(job_id = %job.id, source_id = %canonical, "Matched a recently succeeded job");
            return Ok(Attempt::deduped(canonical));
        }

        let fingerprint = job.derive_fingerprint();
        if let Some(existing) = store
            .find_source_by_fingerprint(&fingerprint)
            .map_err(attempt_error)?
        {
            debug!(job_id = %job.id, source_id = %existing.id, "Matched an existing source fingerprint");
            return Ok(Attempt::deduped(existing.id));
        }

        let source = SourceRecord::new(
            job.meeting_id.clone(),
            job.capture_kind,
            now,
            job.relevant_at,
            fingerprint,
            job.index_in_memory,
        );
        store.insert_source(&source).map_err(attempt_error)?;

        let meeting = store
            .meeting(&job.meeting_id)
            .map_err(attempt_error)?
            .ok_or_else(|| AttemptError::MeetingMissing(job.meeting_id.clone()))?;

        if job.index_in_memory {
            let metadata = IndexMetadata {
                source_id: source.id.clone(),
                meeting_id: meeting.id.clone(),
                meeting_title: meeting.title.clone(),
                captured_at: source.captured_at,
                capture_kind: source.capture_kind,
                excerpt: excerpt(&job.payload, self.config.excerpt_chars),
            };
            if let Err(e) = self.indexer.index(&job.payload, &metadata, source.id.as_str()) {
                self.metrics.record_index_failure();
                warn!(job_id = %job.id, source_id = %source.id, error = %e, "Indexing failed");
            }
        }

        let mut commitments = 0;
        if job.capture_kind.yields_commitments() {
            let mut seen: HashSet<String> = store
                .commitments_for_source(&source.id)
                .map_err(attempt_error)?
                .iter()
                .map(|c| normalize_text(&c.text))
                .collect();

            for candidate in extract_commitments(&job.payload) {
                if !seen.insert(normalize_text(&candidate.text)) {
                    continue;
                }
                store
                    .insert_commitment(&Commitment {
                        id: CommitmentId::new(),
                        source_id: source.id.clone(),
                        text: candidate.text,
                        rule_id: candidate.rule_id.to_string(),
                        due_at: job.commitment_due_by,
                        acknowledged: false,
                        created_at: now,
                    })
                    .map_err(attempt_error)?;
                commitments += 1;
            }
        }

        let mut risk_flags = 0;
        for candidate in extract_risk_flags(&job.payload) {
            store
                .insert_risk_flag(&RiskFlag {
                    id: RiskFlagId::new(),
                    source_id: source.id.clone(),
                    kind: candidate.kind,
                    rule_id: candidate.rule_id.to_string(),
                    excerpt: candidate.excerpt,
                    captured_at: source.captured_at,
                })
                .map_err(attempt_error)?;
            risk_flags += 1;
        }

        for person_id in &job.person_ids {
            store
                .link_participant(&job.meeting_id, person_id)
                .map_err(attempt_error)?;
        }
        let touched = store
            .touch_participants(&job.meeting_id, now)
            .map_err(attempt_error)?;
        debug!(job_id = %job.id, participants = touched.len(), "Touched meeting participants");

        Ok(Attempt {
            outcome: JobOutcome::Succeeded {
                source_id: source.id,
            },
            commitments,
            risk_flags,
        })
    }

    /// Source of a job with the same content that succeeded within the window
    ///
    /// Matches on meeting, kind, referenced people and normalized payload.
    fn find_recent_success<S>(
        &self,
        store: &S,
        job: &IngestionJob,
        now: u64,
    ) -> Result<Option<SourceId>, AttemptError>
    where
        S: IngestionStore,
        S::Error: Display,
    {
        let candidates = store
            .query_jobs(&JobQuery {
                meeting_id: Some(job.meeting_id.clone()),
                capture_kind: Some(job.capture_kind),
                status: Some(JobStatus::Succeeded),
                completed_since: Some(now.saturating_sub(self.config.recent_success_window_secs)),
                newest_first: true,
                ..JobQuery::default()
            })
            .map_err(attempt_error)?;

        let people = people_key(&job.person_ids);
        let payload = normalize_payload(&job.payload);

        Ok(candidates
            .iter()
            .filter(|other| other.id != job.id)
            .filter(|other| people_key(&other.person_ids) == people)
            .filter(|other| normalize_payload(&other.payload) == payload)
            .find_map(|other| other.source_id().cloned()))
    }
}
