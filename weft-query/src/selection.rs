//! Startup transport selection.
//!
//! Presence of the privileged bridge is the only signal consumed. The choice
//! is made once; call sites never check which transport they are using.

use std::sync::Arc;
use tracing::info;
use weft_bridge::Bridge;
use weft_core::{Transport, TransportMode};
use weft_fixtures::{FixtureSet, FixtureTransport};

use crate::config::DemoConfig;

/// Use the bridge when one was injected, otherwise serve `fixtures`.
pub fn select_transport(
    bridge: Option<Bridge>,
    fixtures: FixtureSet,
    demo: &DemoConfig,
) -> Arc<dyn Transport> {
    match bridge {
        Some(bridge) => {
            info!(
                mode = %TransportMode::Bridge,
                operations = bridge.allow_list().len(),
                "privileged bridge present"
            );
            Arc::new(bridge)
        }
        None => {
            info!(
                mode = %TransportMode::Fixture,
                latency_ms = demo.latency_ms,
                "no privileged bridge, serving demo fixtures"
            );
            Arc::new(FixtureTransport::new(fixtures).with_latency(demo.latency()))
        }
    }
}
