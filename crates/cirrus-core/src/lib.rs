//! cirrus-core: shared building blocks for the Cirrus service emulators.
//!
//! Every emulated service keeps its state in a region-scoped backend: one
//! in-memory store per `{service, region}` pair, handed out by a
//! [`BackendRegistry`]. This crate holds what those backends share:
//!
//! - the error taxonomy ([`CloudError`]) every backend method returns
//! - ARN synthesis ([`Arn`], [`BackendContext`])
//! - the keyed-by-ARN [`TagStore`]
//! - opaque-token pagination ([`Paginator`])
//! - timestamp rendering and configuration
//!
//! # Architecture
//!
//! ```text
//! BackendRegistry<B>  (one per service)
//!   └── region → Arc<Mutex<B>>   (exclusive access per logical operation)
//!         └── B: RegionBackend   (built from a BackendContext)
//! ```

pub mod arn;
pub mod config;
pub mod error;
pub mod pagination;
pub mod registry;
pub mod tagging;
pub mod time;

pub use arn::Arn;
pub use config::CirrusConfig;
pub use error::{CloudError, CloudResult, ErrorKind};
pub use pagination::{Page, PageRequest, PaginationModel, Paginator};
pub use registry::{BackendContext, BackendRegistry, RegionBackend};
pub use tagging::TagStore;
