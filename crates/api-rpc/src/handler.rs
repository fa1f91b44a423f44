//! RPC Method Handlers
//!
//! Thin translation between JSON-RPC and `VanityService`: every handler calls
//! one use case and maps its error.

use crate::error::to_rpc_error;
use crate::types::{
    GetJobRequest, GeneratedKeypairs, HealthResponse, Job, JobAccepted, JobSummary,
    KeypairRequest,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use vanity_core::application::VanityService;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<VanityService>,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(service: Arc<VanityService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }

    /// vanity.submit.v1
    pub async fn submit(&self, params: KeypairRequest) -> Result<JobAccepted, ErrorObjectOwned> {
        debug!(suffix = %params.suffix, "vanity.submit.v1");
        self.service.submit_job(params).await.map_err(to_rpc_error)
    }

    /// vanity.get.v1
    pub async fn get(&self, params: GetJobRequest) -> Result<Job, ErrorObjectOwned> {
        self.service.get_job(&params.id).await.map_err(to_rpc_error)
    }

    /// vanity.list.v1
    pub async fn list(&self) -> Result<Vec<JobSummary>, ErrorObjectOwned> {
        self.service.list_jobs().await.map_err(to_rpc_error)
    }

    /// vanity.generate.v1
    pub async fn generate(
        &self,
        params: KeypairRequest,
    ) -> Result<GeneratedKeypairs, ErrorObjectOwned> {
        debug!(suffix = %params.suffix, "vanity.generate.v1");
        self.service.generate_sync(params).await.map_err(to_rpc_error)
    }

    /// admin.health.v1
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            version: vanity_core::VERSION.to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            scheduler: self.service.health(),
        }
    }
}
