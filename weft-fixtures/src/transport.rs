//! Offline transport backed by the fixture set.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use weft_core::{MutationResponse, Operation, Transport, TransportMode, WeftResult};

use crate::set::FixtureSet;

/// Simulated round-trip applied to every demo call.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(300);

/// Serves reads from fixtures and acknowledges writes without persisting.
#[derive(Debug, Clone)]
pub struct FixtureTransport {
    fixtures: Arc<FixtureSet>,
    latency: Duration,
}

impl FixtureTransport {
    pub fn new(fixtures: FixtureSet) -> Self {
        Self {
            fixtures: Arc::new(fixtures),
            latency: DEFAULT_LATENCY,
        }
    }

    /// Override the simulated latency. Zero disables it.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn fixtures(&self) -> &FixtureSet {
        &self.fixtures
    }
}

impl Default for FixtureTransport {
    fn default() -> Self {
        Self::new(FixtureSet::demo())
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Fixture
    }

    async fn invoke(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if operation.is_mutation() {
            debug!(operation = %operation, "demo write acknowledged, not persisted");
            return Ok(MutationResponse::ok().into_value());
        }
        Ok(self.fixtures.respond(operation, &args)?)
    }
}
