//! Command implementations.

pub mod config;
pub mod directory;
pub mod jobs;
pub mod maintenance;
pub mod status;
pub mod submit;
pub mod worker;

pub use self::config::execute_config;
pub use self::directory::{execute_meeting, execute_person};
pub use self::jobs::{execute_audit, execute_health, execute_jobs};
pub use self::maintenance::{execute_dedupe, execute_repair};
pub use self::status::{execute_retry, execute_status};
pub use self::submit::execute_submit;
pub use self::worker::{execute_run_once, execute_work};
