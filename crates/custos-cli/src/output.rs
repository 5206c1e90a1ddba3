//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use custos_domain::{AuditEntry, IngestionJob, JobStatusReport, Person};
use custos_gatekeeper::{Admission, HealthState, IngestionHealth};
use custos_worker::{CycleOutcome, DedupeSummary, RepairSummary};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

/// Render an optional timestamp, `-` when absent.
pub fn format_timestamp(at: Option<u64>) -> String {
    at.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
}

fn table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an admission result.
    pub fn format_admission(&self, admission: &Admission) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "job_id": admission.job_id.as_str(),
                "replayed": admission.replayed,
            }))?),
            OutputFormat::Quiet => Ok(admission.job_id.to_string()),
            OutputFormat::Table if admission.replayed => {
                Ok(self.info(&format!("Replayed existing job: {}", admission.job_id)))
            }
            OutputFormat::Table => Ok(self.success(&format!("Job queued: {}", admission.job_id))),
        }
    }

    /// Format a job status report.
    pub fn format_status(&self, report: &JobStatusReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "id": report.id.as_str(),
                "status": report.status.as_str(),
                "started_at": report.started_at,
                "completed_at": report.completed_at,
                "error": report.error,
                "source_id": report.source_id.as_ref().map(|id| id.as_str()),
            }))?),
            OutputFormat::Quiet => Ok(report.status.as_str().to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["ID", report.id.as_str()]);
                builder.push_record(["Status", &self.status_label(report.status.as_str())]);
                builder.push_record(["Started", &format_timestamp(report.started_at)]);
                builder.push_record(["Completed", &format_timestamp(report.completed_at)]);
                builder.push_record(["Error", report.error.as_deref().unwrap_or("-")]);
                builder.push_record([
                    "Source",
                    report.source_id.as_ref().map(|id| id.as_str()).unwrap_or("-"),
                ]);
                Ok(table(builder))
            }
        }
    }

    /// Format a job listing.
    pub fn format_jobs(&self, jobs: &[IngestionJob]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json_jobs: Vec<serde_json::Value> = jobs
                    .iter()
                    .map(|job| {
                        serde_json::json!({
                            "id": job.id.as_str(),
                            "meeting_id": job.meeting_id.as_str(),
                            "capture_kind": job.capture_kind.as_str(),
                            "status": job.status().as_str(),
                            "error": job.error_code(),
                            "source_id": job.source_id().map(|id| id.as_str()),
                            "created_at": job.created_at,
                            "started_at": job.started_at,
                            "completed_at": job.completed_at,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json_jobs)?)
            }
            OutputFormat::Quiet => {
                let ids: Vec<&str> = jobs.iter().map(|job| job.id.as_str()).collect();
                Ok(ids.join("\n"))
            }
            OutputFormat::Table => {
                if jobs.is_empty() {
                    return Ok(self.colorize("No jobs found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Meeting", "Kind", "Status", "Error", "Created"]);
                for job in jobs {
                    builder.push_record([
                        job.id.as_str(),
                        job.meeting_id.as_str(),
                        job.capture_kind.as_str(),
                        &self.status_label(job.status().as_str()),
                        job.error_code().unwrap_or("-"),
                        &job.created_at.to_string(),
                    ]);
                }
                Ok(table(builder))
            }
        }
    }

    /// Format pipeline health.
    pub fn format_health(&self, health: &IngestionHealth) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "last_run": health.last_run,
                "last_success": health.last_success,
                "error_count": health.error_count,
                "health": health.health.as_str(),
            }))?),
            OutputFormat::Quiet => Ok(health.health.as_str().to_string()),
            OutputFormat::Table => {
                let state = match health.health {
                    HealthState::Healthy => self.colorize(health.health.as_str(), "green"),
                    HealthState::Attention => self.colorize(health.health.as_str(), "red"),
                };
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["Health", &state]);
                builder.push_record(["Last run", &format_timestamp(health.last_run)]);
                builder.push_record(["Last success", &format_timestamp(health.last_success)]);
                builder.push_record(["Failed jobs", &health.error_count.to_string()]);
                Ok(table(builder))
            }
        }
    }

    /// Format audit entries.
    pub fn format_audit(&self, entries: &[AuditEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json_entries: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "id": entry.id.as_str(),
                            "actor": entry.actor,
                            "action": entry.action.as_str(),
                            "entity_type": entry.entity_type,
                            "entity_id": entry.entity_id,
                            "created_at": entry.created_at,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json_entries)?)
            }
            OutputFormat::Quiet => {
                let ids: Vec<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();
                Ok(ids.join("\n"))
            }
            OutputFormat::Table => {
                if entries.is_empty() {
                    return Ok(self.colorize("No audit entries found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Time", "Actor", "Action", "Entity", "Entity ID"]);
                for entry in entries {
                    builder.push_record([
                        entry.created_at.to_string().as_str(),
                        &entry.actor,
                        entry.action.as_str(),
                        &entry.entity_type,
                        &entry.entity_id,
                    ]);
                }
                Ok(table(builder))
            }
        }
    }

    /// Format a person record.
    pub fn format_person(&self, person: &Person) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "id": person.id.as_str(),
                "name": person.name,
                "last_interaction_at": person.last_interaction_at,
            }))?),
            OutputFormat::Quiet => Ok(person.id.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["ID", "Name", "Last interaction"]);
                builder.push_record([
                    person.id.as_str(),
                    &person.name,
                    &format_timestamp(person.last_interaction_at),
                ]);
                Ok(table(builder))
            }
        }
    }

    /// Format the result of one worker cycle.
    pub fn format_cycle(&self, cycle: &CycleOutcome) -> Result<String> {
        let processed = cycle.processed.as_ref();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "requeued": cycle.requeued,
                "job_id": processed.map(|p| p.job_id.as_str()),
                "outcome": processed.map(|p| p.outcome.error_code().unwrap_or("succeeded")),
                "source_id": processed.and_then(|p| p.outcome.source_id()).map(|id| id.as_str()),
            }))?),
            OutputFormat::Quiet => Ok(processed.map(|p| p.job_id.to_string()).unwrap_or_default()),
            OutputFormat::Table => {
                let mut lines = Vec::new();
                if cycle.requeued > 0 {
                    lines.push(self.info(&format!("Requeued {} failed job(s)", cycle.requeued)));
                }
                match processed {
                    None => lines.push(self.info("Queue empty")),
                    Some(p) => match p.outcome.error_code() {
                        None => lines.push(self.success(&format!("Job {} succeeded", p.job_id))),
                        Some("deduped") => {
                            lines.push(self.success(&format!("Job {} deduped", p.job_id)))
                        }
                        Some(code) => {
                            lines.push(self.error(&format!("Job {} failed: {}", p.job_id, code)))
                        }
                    },
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a dedupe sweep summary.
    pub fn format_dedupe(&self, summary: &DedupeSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "groups": summary.groups,
                "jobs_relinked": summary.jobs_relinked,
                "sources_deleted": summary.sources_deleted,
                "commitments_deleted": summary.commitments_deleted,
                "commitments_deduped": summary.commitments_deduped,
            }))?),
            OutputFormat::Quiet => Ok(summary.jobs_relinked.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Duplicate groups", "Jobs relinked", "Sources deleted", "Commitments removed"]);
                builder.push_record([
                    summary.groups.to_string(),
                    summary.jobs_relinked.to_string(),
                    summary.sources_deleted.to_string(),
                    (summary.commitments_deleted + summary.commitments_deduped).to_string(),
                ]);
                Ok(table(builder))
            }
        }
    }

    /// Format a missing-source repair summary.
    pub fn format_repair(&self, summary: &RepairSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "missing_jobs": summary.missing_jobs,
                "sources_created": summary.sources_created,
                "jobs_relinked": summary.jobs_relinked,
            }))?),
            OutputFormat::Quiet => Ok(summary.missing_jobs.to_string()),
            OutputFormat::Table => {
                if summary.missing_jobs == 0 {
                    return Ok(self.success("No missing sources"));
                }
                Ok(self.success(&format!(
                    "Repaired {} job(s): {} source(s) recreated, {} job(s) relinked",
                    summary.missing_jobs, summary.sources_created, summary.jobs_relinked
                )))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn status_label(&self, status: &str) -> String {
        match status {
            "succeeded" => self.colorize(status, "green"),
            "failed" => self.colorize(status, "red"),
            "running" => self.colorize(status, "cyan"),
            _ => status.to_string(),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}
