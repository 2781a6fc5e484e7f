//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters through
//! the ports: feed ingestion, strategy evaluation, execution, REST backfill
//! and the read-only views exposed to operators.

pub mod cache;
pub mod execution;
pub mod fallback;
pub mod feed;
pub mod lifecycle;
pub mod metrics;
pub mod snapshot;
pub mod strategy;
