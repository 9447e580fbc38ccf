//! Error kinds surfaced by the routing table.

use thiserror::Error;

/// Errors returned at call sites.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum RoutingTableError {
    /// Construction was attempted with a non-positive `bucket_size`.
    #[error("bucket_size must be positive")]
    InvalidBucketSize,

    /// `gen_rand_peer_id` was called with a CPL outside `[0, KEY_BITS)`.
    #[error("cpl out of range for the key width")]
    InvalidCpl,

    /// Destination bucket is full and no incumbent is eligible for
    /// replacement.
    #[error("peer rejected: no capacity")]
    PeerRejectedNoCapacity,

    /// Destination bucket is full, no incumbent is stale, and the latency
    /// oracle reports the candidate exceeds `latency_tolerance`.
    #[error("peer rejected: latency exceeds tolerance")]
    PeerRejectedHighLatency,
}
