//! Schema and mapped types for the workforce demo.
//!
//! Two entities live in the store:
//!
//! | Table | Columns |
//! |-------|---------|
//! | `workers` | `id`, `username` |
//! | `resume` | `id`, `title`, `compensation`, `workload`, `worker_id`, `created_at`, `updated_at` |
//!
//! Every resume references a worker; deleting the worker deletes its resumes.
//!
//! The schema is declared twice: once as mapped types ([`Worker`],
//! [`Resume`]) registered in [`metadata`], and once as plain table
//! descriptors registered in [`metadata_obj`] for core-style statements.

mod declarative;
mod imperative;
mod workload;

pub use declarative::{metadata, Resume, Worker, RESUME, TITLE_MAX_LEN, UTC_NOW, WORKERS};
pub use imperative::{metadata_obj, RESUME_TABLE, WORKERS_TABLE};
pub use workload::{ParseWorkloadError, Workload};
