//! Region-scoped backend registry.
//!
//! Each emulated service owns one `BackendRegistry`. Stores are created on
//! first use of a region and live for the rest of the process. Callers get an
//! `Arc<Mutex<B>>` handle; holding the lock for the duration of one backend
//! call is what serializes concurrent requests against the same region.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::arn::Arn;
use crate::config::CirrusConfig;
use crate::error::{CloudError, CloudResult};

/// Identity of one region-scoped store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendContext {
    pub service: &'static str,
    pub region: String,
    pub account_id: String,
}

impl BackendContext {
    pub fn new(service: &'static str, region: &str, account_id: &str) -> Self {
        Self {
            service,
            region: region.to_string(),
            account_id: account_id.to_string(),
        }
    }

    /// Synthesize the ARN of a resource owned by this store.
    pub fn arn(&self, resource_path: &str) -> Arn {
        Arn::new(self.service, &self.region, &self.account_id, resource_path)
    }
}

/// A per-region service store.
pub trait RegionBackend: Send + 'static {
    /// Service name as it appears in ARNs (`glue`, `greengrass`).
    const SERVICE: &'static str;

    fn new(ctx: BackendContext) -> Self;
}

/// Lazily-populated map from region name to that region's store.
pub struct BackendRegistry<B: RegionBackend> {
    config: CirrusConfig,
    backends: RwLock<HashMap<String, Arc<Mutex<B>>>>,
}

impl<B: RegionBackend> BackendRegistry<B> {
    pub fn new(config: CirrusConfig) -> Self {
        Self {
            config,
            backends: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CirrusConfig {
        &self.config
    }

    /// Acquire the store for `region`, creating it on first use.
    pub fn backend(&self, region: &str) -> CloudResult<Arc<Mutex<B>>> {
        if !self.config.allows_region(region) {
            return Err(CloudError::invalid_input(format!(
                "region '{region}' is not enabled for {}",
                B::SERVICE
            )));
        }

        if let Some(backend) = self.backends.read().get(region) {
            return Ok(Arc::clone(backend));
        }

        let mut backends = self.backends.write();
        // Another caller may have created it between the two lock scopes.
        let backend = backends.entry(region.to_string()).or_insert_with(|| {
            debug!(service = B::SERVICE, %region, "region backend created");
            let ctx = BackendContext::new(B::SERVICE, region, &self.config.account_id);
            Arc::new(Mutex::new(B::new(ctx)))
        });
        Ok(Arc::clone(backend))
    }

    /// Run one logical operation against a region's store under its lock.
    pub fn with_backend<T>(
        &self,
        region: &str,
        op: impl FnOnce(&mut B) -> CloudResult<T>,
    ) -> CloudResult<T> {
        let backend = self.backend(region)?;
        let mut guard = backend.lock();
        op(&mut guard)
    }

    /// Regions that currently have a store, sorted.
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.backends.read().keys().cloned().collect();
        regions.sort();
        regions
    }

    /// Drop every region's state.
    pub fn reset(&self) {
        self.backends.write().clear();
        debug!(service = B::SERVICE, "all region backends reset");
    }
}
