//! Firing detection: the three detectors, the per-tenant orchestrator and
//! the scheduled job that fans a tick out across tenants.

pub mod discussions;
pub mod fetch;
pub mod job;
pub mod review;
pub mod service;
pub mod stale;
pub mod types;

pub use job::{FiringJob, TenantSource, TickReport};
pub use service::{FiringService, TenantReport};
pub use types::{FiringMergeRequest, FiringResult};
