//! Jobs: submission, background processing and status/result aggregation
//!
//! - `Job`: one crawl over a set of root URLs with its own worker pool
//! - `JobRegistry`: id → job, append-only
//! - `JobId`: monotonic, process-unique identifier

mod crawl_job;
mod id;
mod registry;

pub use crawl_job::{Job, JobResult, JobStatus};
pub use id::{JobId, JobIdGenerator};
pub use registry::JobRegistry;
