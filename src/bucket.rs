//! A single k-bucket: an ordered, capacity-bounded run of [`PeerInfo`]
//! records sharing a common-prefix-length class with the local key.

use crate::key::Key;
use crate::peer::{PeerId, PeerInfo};
use std::collections::VecDeque;

/// Ordered collection of peers, front = most-recently-useful, back = the
/// next eviction candidate.
#[derive(Clone, Debug)]
pub struct Bucket {
    peers: VecDeque<PeerInfo>,
    capacity: usize,
}

impl Bucket {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            peers: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.peers.len() >= self.capacity
    }

    /// Insert at the head. Caller must ensure `info.id()` is not already
    /// present.
    pub fn push_front(&mut self, info: PeerInfo) {
        self.peers.push_front(info);
    }

    #[must_use]
    pub fn get_peer(&self, id: &PeerId) -> Option<&PeerInfo> {
        self.peers.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn get_peer_mut(&mut self, id: &PeerId) -> Option<&mut PeerInfo> {
        self.peers.iter_mut().find(|p| &p.id == id)
    }

    /// Remove by identifier, reporting whether an entry was found.
    pub fn remove(&mut self, id: &PeerId) -> bool {
        if let Some(pos) = self.peers.iter().position(|p| &p.id == id) {
            self.peers.remove(pos);
            true
        } else {
            false
        }
    }

    /// Reposition an existing entry to the head. No-op if absent.
    pub fn move_to_front(&mut self, id: &PeerId) {
        if let Some(pos) = self.peers.iter().position(|p| &p.id == id) {
            if let Some(entry) = self.peers.remove(pos) {
                self.peers.push_front(entry);
            }
        }
    }

    /// Snapshot of entries, head-first.
    #[must_use]
    pub fn peers(&self) -> Vec<PeerInfo> {
        self.peers.iter().cloned().collect()
    }

    /// Borrowing iterator over entries, head-first.
    pub fn iter(&self) -> impl Iterator<Item = &PeerInfo> {
        self.peers.iter()
    }

    /// Partition in place on `cpl` relative to `local_key`: entries whose CPL
    /// to `local_key` is strictly greater than `cpl` move into the returned
    /// bucket; entries with CPL `== cpl` stay. Order within each side is
    /// preserved. Capacity of the new bucket matches `self`'s.
    #[must_use]
    pub fn split(&mut self, cpl: usize, local_key: &Key) -> Bucket {
        let mut kept = VecDeque::with_capacity(self.capacity);
        let mut moved = VecDeque::with_capacity(self.capacity);
        for entry in self.peers.drain(..) {
            if entry.key().common_prefix_len(local_key) > cpl {
                moved.push_back(entry);
            } else {
                kept.push_back(entry);
            }
        }
        self.peers = kept;
        Bucket {
            peers: moved,
            capacity: self.capacity,
        }
    }

    /// Return the entry minimising `score`, ties broken by bucket order
    /// (earliest/front-most wins).
    #[must_use]
    pub fn min_by<K: Ord>(&self, score: impl Fn(&PeerInfo) -> K) -> Option<&PeerInfo> {
        self.peers.iter().min_by_key(|p| score(p))
    }
}
