//! The latency oracle collaborator interface. The routing
//! table never measures latency itself; it only consults this trait during
//! eviction tie-breaking and high-latency rejection.

use crate::peer::PeerId;
use std::time::Duration;

/// Estimated round-trip latency provider for a peer.
///
/// Implementations may return a default (e.g. `Duration::MAX` or a fixed
/// fallback) when a peer's latency is unknown; the routing table treats
/// whatever is returned as authoritative.
pub trait LatencyOracle: Send + Sync {
    fn latency(&self, peer: &PeerId) -> Duration;
}

/// An oracle with no data, reporting zero latency for every peer. Useful in
/// tests and for callers that don't yet wire up real measurements.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLatencyData;

impl LatencyOracle for NoLatencyData {
    fn latency(&self, _peer: &PeerId) -> Duration {
        Duration::ZERO
    }
}
