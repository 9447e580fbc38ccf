//! Peer identity and the per-peer record held inside a bucket.

use crate::key::{convert_peer, Key};
use std::time::Instant;

/// Opaque peer identifier. The routing table never interprets the bytes of
/// a [`PeerId::new`] identifier; it only hashes them into a [`Key`] via
/// [`convert_peer`].
///
/// [`PeerId::from_key_bytes`] is the exception: it's how the
/// [`crate::table::gen_rand_peer_id`] test/support utility produces an
/// identifier with an exact, pre-chosen key. SHA-256 is one-way, so no
/// identity bytes can be crafted to hash to a chosen prefix; the utility
/// sidesteps that by constructing the key directly and wrapping it as an
/// identifier whose `key()` returns those bytes unhashed, the same way
/// go-libp2p's kbucket test helpers synthesize CPL-exact peer IDs without a
/// brute-force search over the hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerId(Repr);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Repr {
    Raw(Vec<u8>),
    PreHashed(Key),
}

impl PeerId {
    /// Wrap raw identity bytes; `key()` hashes them via [`convert_peer`].
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Repr::Raw(bytes.into()))
    }

    /// Wrap an already-computed key as an identifier. `key()` returns it
    /// unhashed. See the type-level docs for why this exists.
    #[must_use]
    pub fn from_key_bytes(bytes: [u8; 32]) -> Self {
        Self(Repr::PreHashed(Key::from_bytes(bytes)))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Repr::Raw(b) => b,
            Repr::PreHashed(k) => k.as_bytes(),
        }
    }

    /// Derive this peer's keyspace [`Key`].
    #[must_use]
    pub fn key(&self) -> Key {
        match &self.0 {
            Repr::Raw(b) => convert_peer(b),
            Repr::PreHashed(k) => *k,
        }
    }
}

/// Record kept inside a [`crate::bucket::Bucket`] for each admitted peer.
#[derive(Clone, Debug)]
pub struct PeerInfo {
    pub(crate) id: PeerId,
    pub(crate) key: Key,
    /// Zero (`None`) means "never usefully queried". Promoted to `Some` on
    /// admission as a query peer, or on the first query-promotion of a
    /// previously non-query peer.
    pub(crate) last_useful_outbound_query: Option<Instant>,
    pub(crate) added_at: Instant,
}

impl PeerInfo {
    pub(crate) fn new(id: PeerId, is_query_peer: bool, now: Instant) -> Self {
        let key = id.key();
        Self {
            id,
            key,
            last_useful_outbound_query: is_query_peer.then_some(now),
            added_at: now,
        }
    }

    #[must_use]
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    #[must_use]
    pub fn key(&self) -> Key {
        self.key
    }

    #[must_use]
    pub fn last_useful_outbound_query(&self) -> Option<Instant> {
        self.last_useful_outbound_query
    }

    #[must_use]
    pub fn added_at(&self) -> Instant {
        self.added_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_query_peer_has_no_last_useful_query() {
        let p = PeerInfo::new(PeerId::new(b"a".to_vec()), false, Instant::now());
        assert!(p.last_useful_outbound_query().is_none());
    }

    #[test]
    fn query_peer_stamps_last_useful_query() {
        let now = Instant::now();
        let p = PeerInfo::new(PeerId::new(b"a".to_vec()), true, now);
        assert_eq!(p.last_useful_outbound_query(), Some(now));
    }

    #[test]
    fn key_is_cached_from_id() {
        let id = PeerId::new(b"peer".to_vec());
        let p = PeerInfo::new(id.clone(), false, Instant::now());
        assert_eq!(p.key(), id.key());
    }
}
