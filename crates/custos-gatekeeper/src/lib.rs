//! Custos Gatekeeper
//!
//! The caller-facing side of the ingestion pipeline.
//!
//! The gatekeeper provides:
//! - Submission admission (validation, fingerprinting, idempotent replay)
//! - Job status polling and forced retry
//! - Job listing and a health summary for operators
//!
//! Admission never processes anything: it writes a queued job (or returns an
//! existing one) and the worker picks it up later.
//!
//! # Examples
//!
//! ```no_run
//! use custos_domain::SystemClock;
//! use custos_gatekeeper::{AdmissionGate, SubmitRequest};
//! use custos_store::SqliteStore;
//!
//! let mut store = SqliteStore::new("custos.db").unwrap();
//! let gate = AdmissionGate::default_config();
//!
//! let admission = gate
//!     .submit(&mut store, &SystemClock, SubmitRequest {
//!         meeting_id: "m_1".to_string(),
//!         capture_kind: "notes".to_string(),
//!         payload: "Plan next steps".to_string(),
//!         ..SubmitRequest::default()
//!     })
//!     .unwrap();
//! println!("queued {}", admission.job_id);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;
mod health;

pub use config::AdmissionConfig;
pub use error::GatekeeperError;
pub use gate::{Admission, AdmissionGate, SubmitRequest};
pub use health::{ingestion_health, HealthState, IngestionHealth};
