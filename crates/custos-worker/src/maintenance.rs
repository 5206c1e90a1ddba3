//! Operator maintenance sweeps
//!
//! These repair data written before the worker enforced its dedup guarantees,
//! or left inconsistent by manual edits. Each sweep runs in one transaction.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;

use custos_domain::traits::{IngestionStore, JobQuery};
use custos_domain::{
    normalize_payload, normalize_text, people_key, IngestionJob, JobOutcome, JobState, JobStatus,
    SourceId, SourceRecord,
};
use tracing::info;

use crate::worker::in_transaction;
use crate::WorkerError;

/// What a dedupe sweep changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupeSummary {
    /// Groups of succeeded jobs describing the same capture
    pub groups: usize,

    /// Jobs relinked to their group's canonical source
    pub jobs_relinked: usize,

    /// Duplicate sources deleted once nothing referenced them
    pub sources_deleted: usize,

    /// Commitments removed together with deleted sources
    pub commitments_deleted: usize,

    /// Commitments removed for repeating text already on their source
    pub commitments_deduped: usize,
}

/// What a missing-source repair changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairSummary {
    /// Jobs whose source link pointed at nothing
    pub missing_jobs: usize,

    /// Sources recreated under their original id
    pub sources_created: usize,

    /// Jobs relinked to an existing source with the same fingerprint
    pub jobs_relinked: usize,
}

type GroupKey = (String, &'static str, String, String, Option<u64>);

fn group_key(job: &IngestionJob) -> GroupKey {
    (
        job.meeting_id.as_str().to_string(),
        job.capture_kind.as_str(),
        normalize_payload(&job.payload),
        people_key(&job.person_ids),
        job.relevant_at,
    )
}

fn deduped(canonical_source_id: SourceId) -> JobState {
    JobState::Finished(JobOutcome::Deduped {
        canonical_source_id,
    })
}

/// Store maintenance operations
#[derive(Debug, Clone, Copy, Default)]
pub struct Maintenance;

impl Maintenance {
    /// Create the maintenance runner
    pub fn new() -> Self {
        Self
    }

    /// Collapse succeeded jobs that describe the same capture onto one source
    ///
    /// Jobs are grouped by meeting, kind, normalized payload, referenced
    /// people and relevance time. The job that completed first (then was
    /// created first) keeps its source; the rest are relinked to it as
    /// deduped, and their old sources are deleted once no job points at them.
    /// Finally, commitments repeating normalized text on the same source are
    /// removed, keeping the oldest.
    pub fn dedupe_jobs<S>(&self, store: &mut S) -> Result<DedupeSummary, WorkerError>
    where
        S: IngestionStore,
        S::Error: Display,
    {
        let summary = in_transaction(store, |s| {
            let succeeded = s.query_jobs(&JobQuery::with_status(JobStatus::Succeeded))?;

            let mut groups: BTreeMap<GroupKey, Vec<IngestionJob>> = BTreeMap::new();
            for job in succeeded.into_iter().filter(|j| j.source_id().is_some()) {
                groups.entry(group_key(&job)).or_default().push(job);
            }

            let mut summary = DedupeSummary::default();
            for mut group in groups.into_values().filter(|g| g.len() > 1) {
                group.sort_by_key(|j| (j.completed_at.unwrap_or(0), j.created_at));

                let Some(canonical) = group[0].source_id().cloned() else {
                    continue;
                };
                // A dangling canonical link is for the repair sweep
                if s.get_source(&canonical)?.is_none() {
                    continue;
                }
                summary.groups += 1;

                let mut retired: Vec<SourceId> = Vec::new();
                for mut job in group.into_iter().skip(1) {
                    let Some(previous) = job.source_id().cloned() else {
                        continue;
                    };
                    let target = deduped(canonical.clone());
                    if job.state == target {
                        continue;
                    }

                    job.state = target;
                    s.update_job(&job)?;
                    summary.jobs_relinked += 1;

                    if previous != canonical && !retired.contains(&previous) {
                        retired.push(previous);
                    }
                }

                for source_id in retired {
                    let still_linked = !s
                        .query_jobs(&JobQuery {
                            source_id: Some(source_id.clone()),
                            limit: Some(1),
                            ..JobQuery::default()
                        })?
                        .is_empty();
                    if still_linked || s.get_source(&source_id)?.is_none() {
                        continue;
                    }

                    summary.commitments_deleted += s.commitments_for_source(&source_id)?.len();
                    s.delete_source(&source_id)?;
                    summary.sources_deleted += 1;
                }
            }

            let mut sources: Vec<SourceId> = s
                .query_jobs(&JobQuery::with_status(JobStatus::Succeeded))?
                .iter()
                .filter_map(|j| j.source_id().cloned())
                .collect();
            sources.sort();
            sources.dedup();

            for source_id in sources {
                let mut seen = HashSet::new();
                for commitment in s.commitments_for_source(&source_id)? {
                    if !seen.insert(normalize_text(&commitment.text)) {
                        s.delete_commitment(&commitment.id)?;
                        summary.commitments_deduped += 1;
                    }
                }
            }

            Ok(summary)
        })?;

        info!(
            groups = summary.groups,
            jobs_relinked = summary.jobs_relinked,
            sources_deleted = summary.sources_deleted,
            commitments_deduped = summary.commitments_deduped,
            "Dedupe sweep finished"
        );
        Ok(summary)
    }

    /// Fix jobs whose source link points at a source that no longer exists
    ///
    /// Jobs are handled oldest first. A job is relinked to an existing source
    /// carrying its fingerprint when there is one; otherwise its source is
    /// recreated under the original id, captured at the job's completion time
    /// (or creation time when it never completed).
    pub fn repair_missing_sources<S>(&self, store: &mut S) -> Result<RepairSummary, WorkerError>
    where
        S: IngestionStore,
        S::Error: Display,
    {
        let summary = in_transaction(store, |s| {
            let mut dangling = Vec::new();
            for job in s.query_jobs(&JobQuery::default())? {
                let Some(source_id) = job.source_id() else {
                    continue;
                };
                if s.get_source(source_id)?.is_none() {
                    dangling.push(job);
                }
            }

            let mut summary = RepairSummary {
                missing_jobs: dangling.len(),
                ..RepairSummary::default()
            };

            for mut job in dangling {
                let Some(missing) = job.source_id().cloned() else {
                    continue;
                };
                // Recreated earlier in this sweep for another job
                if s.get_source(&missing)?.is_some() {
                    continue;
                }

                if let Some(existing) = s.find_source_by_fingerprint(&job.fingerprint)? {
                    job.state = deduped(existing.id);
                    s.update_job(&job)?;
                    summary.jobs_relinked += 1;
                    continue;
                }

                let source = SourceRecord {
                    uri: SourceRecord::local_uri(&missing),
                    id: missing,
                    meeting_id: job.meeting_id.clone(),
                    capture_kind: job.capture_kind,
                    captured_at: job.completed_at.unwrap_or(job.created_at),
                    relevant_at: job.relevant_at,
                    fingerprint: job.fingerprint.clone(),
                    indexed: job.index_in_memory,
                };
                s.insert_source(&source)?;
                summary.sources_created += 1;
            }

            Ok(summary)
        })?;

        info!(
            missing_jobs = summary.missing_jobs,
            sources_created = summary.sources_created,
            jobs_relinked = summary.jobs_relinked,
            "Missing-source repair finished"
        );
        Ok(summary)
    }
}
