//! cirrus-glue: in-memory data catalog emulator.
//!
//! One [`GlueBackend`] holds the state of one region: databases with their
//! tables and partitions, crawlers, jobs with their run records, and schema
//! registries. Obtain it through a
//! [`BackendRegistry`](cirrus_core::BackendRegistry):
//!
//! ```no_run
//! use cirrus_core::{BackendRegistry, CirrusConfig};
//! use cirrus_glue::{DatabaseInput, GlueBackend};
//!
//! let glue: BackendRegistry<GlueBackend> = BackendRegistry::new(CirrusConfig::default());
//! glue.with_backend("us-east-1", |b| {
//!     b.create_database("analytics", DatabaseInput::default()).map(|_| ())
//! })
//! .unwrap();
//! ```

pub mod backend;
pub mod catalog;
pub mod crawler;
pub mod filter;
pub mod job;
pub mod lifecycle;
pub mod schema_registry;

pub use backend::{GlueBackend, LIST_CRAWLERS, LIST_JOBS};
pub use catalog::{Column, Database, DatabaseInput, Partition, PartitionInput, PartitionKey, Table, TableInput};
pub use crawler::{Crawler, CrawlerInput};
pub use filter::{ColumnType, PartitionFilter};
pub use job::{Job, JobInput, JobRun};
pub use lifecycle::{Action, CrawlerState, JobState};
pub use schema_registry::SchemaRegistry;
