//! Kademlia-style routing table core.
//!
//! This crate implements the in-memory decision structure a DHT peer uses to
//! track a bounded, well-distributed set of other peers by XOR distance: a
//! dynamically splitting bucket list, a capacity/eviction policy driven by
//! per-peer liveness data, and ordered-proximity queries merged across
//! buckets in XOR order. Transport, wire protocol, persistence, and
//! CLI/config are explicitly out of scope.
//!
//! # Example
//!
//! ```
//! use kad_routing_table::{convert_peer, PeerId, RoutingTable, NoLatencyData};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let local_key = convert_peer(b"this-node");
//! let table = RoutingTable::new(
//!     20,
//!     local_key,
//!     Duration::from_millis(500),
//!     Arc::new(NoLatencyData),
//!     Duration::from_secs(3600),
//! )
//! .unwrap();
//!
//! let peer = PeerId::new(b"some-other-node".to_vec());
//! table.try_add_peer(peer.clone(), true).unwrap();
//! assert_eq!(table.find(&peer), Some(peer));
//! ```

mod bucket;
mod error;
mod key;
mod metrics;
mod peer;
mod query;
mod table;

pub use bucket::Bucket;
pub use error::RoutingTableError;
pub use key::{convert_peer, sort_closest, Distance, Key, KEY_BITS};
pub use metrics::{LatencyOracle, NoLatencyData};
pub use peer::{PeerId, PeerInfo};
pub use table::{gen_rand_peer_id, AddResult, PeerAddedCallback, PeerRemovedCallback, RoutingTable};
