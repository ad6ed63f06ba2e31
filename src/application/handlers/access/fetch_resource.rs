//! FetchResourceHandler - Command handler for protected resource
//! retrieval.
//!
//! Thin wrapper over the access gate; all authorization logic lives in
//! the gate so the HTTP adapter and any future transport share exactly
//! one pipeline.

use std::sync::Arc;

use crate::domain::access::{AccessError, AccessGate, Delivery};

/// Command to fetch one protected resource.
#[derive(Debug, Clone)]
pub struct FetchResourceCommand {
    /// Bearer credential from the request, if any.
    pub credential: Option<String>,
    /// Public resource identifier.
    pub resource_id: String,
    pub source_ip: Option<String>,
}

/// Handler for gated resource retrieval.
pub struct FetchResourceHandler {
    gate: Arc<AccessGate>,
}

impl FetchResourceHandler {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        Self { gate }
    }

    pub async fn handle(&self, cmd: FetchResourceCommand) -> Result<Delivery, AccessError> {
        self.gate
            .authorize(
                cmd.credential.as_deref(),
                &cmd.resource_id,
                cmd.source_ip.as_deref(),
            )
            .await
    }
}
