//! The routing table itself: bucket list, admission/eviction policy, and
//! the public API surface.

use crate::bucket::Bucket;
use crate::error::RoutingTableError;
use crate::key::{Key, KEY_BITS};
use crate::metrics::LatencyOracle;
use crate::peer::{PeerId, PeerInfo};
use crate::query;
use parking_lot::RwLock;
use rand::RngCore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Callback invoked after a peer is admitted, outside the table's lock.
pub type PeerAddedCallback = Arc<dyn Fn(&PeerId) + Send + Sync>;
/// Callback invoked after a peer is removed or evicted, outside the table's
/// lock.
pub type PeerRemovedCallback = Arc<dyn Fn(&PeerId) + Send + Sync>;

struct Inner {
    buckets: Vec<Bucket>,
}

/// In-memory Kademlia-style routing table for a single local peer.
///
/// All mutating and reading operations take the table's internal lock for
/// their duration only; lifecycle callbacks fire after the lock is released,
/// in the thread performing the mutation.
pub struct RoutingTable {
    local_key: Key,
    bucket_size: usize,
    latency_tolerance: Duration,
    usefulness_ttl: Duration,
    metrics: Arc<dyn LatencyOracle>,
    inner: RwLock<Inner>,
    peer_added: Option<PeerAddedCallback>,
    peer_removed: Option<PeerRemovedCallback>,
}

/// Outcome of [`RoutingTable::try_add_peer`].
pub type AddResult = Result<bool, RoutingTableError>;

impl RoutingTable {
    /// Construct a new table for `local_key`.
    ///
    /// `usefulness_ttl` set very large (e.g. `Duration::from_secs(100 * 3600)`)
    /// effectively disables stale-peer replacement.
    ///
    /// # Errors
    /// Returns [`RoutingTableError::InvalidBucketSize`] if `bucket_size` is 0.
    pub fn new(
        bucket_size: usize,
        local_key: Key,
        latency_tolerance: Duration,
        metrics: Arc<dyn LatencyOracle>,
        usefulness_ttl: Duration,
    ) -> Result<Self, RoutingTableError> {
        if bucket_size == 0 {
            return Err(RoutingTableError::InvalidBucketSize);
        }
        Ok(Self {
            local_key,
            bucket_size,
            latency_tolerance,
            usefulness_ttl,
            metrics,
            inner: RwLock::new(Inner {
                buckets: vec![Bucket::new(bucket_size)],
            }),
            peer_added: None,
            peer_removed: None,
        })
    }

    /// Register the `peer_added` lifecycle callback.
    #[must_use]
    pub fn with_peer_added(mut self, cb: PeerAddedCallback) -> Self {
        self.peer_added = Some(cb);
        self
    }

    /// Register the `peer_removed` lifecycle callback.
    #[must_use]
    pub fn with_peer_removed(mut self, cb: PeerRemovedCallback) -> Self {
        self.peer_removed = Some(cb);
        self
    }

    #[must_use]
    pub fn local_key(&self) -> Key {
        self.local_key
    }

    #[must_use]
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    fn bucket_id_for_key(&self, key: &Key, num_buckets: usize) -> usize {
        key.common_prefix_len(&self.local_key).min(num_buckets - 1)
    }

    /// Admit `peer`, or report why admission was refused.
    pub fn try_add_peer(&self, peer: PeerId, is_query_peer: bool) -> AddResult {
        let now = Instant::now();
        let key = peer.key();

        let mut guard = self.inner.write();
        let mut idx = self.bucket_id_for_key(&key, guard.buckets.len());

        // Step 1: already present.
        if let Some(existing) = guard.buckets[idx].get_peer_mut(&peer) {
            if is_query_peer && existing.last_useful_outbound_query.is_none() {
                existing.last_useful_outbound_query = Some(now);
            }
            trace!(?idx, "try_add_peer: peer already present");
            return Ok(false);
        }

        // Step 2: room in the destination bucket already.
        if guard.buckets[idx].len() < self.bucket_size {
            guard.buckets[idx].push_front(PeerInfo::new(peer.clone(), is_query_peer, now));
            drop(guard);
            self.fire_added(&peer);
            return Ok(true);
        }

        // Step 3: destination is the last bucket and full -- try splitting.
        let last = guard.buckets.len() - 1;
        if idx == last {
            let new_bucket = guard.buckets[last].split(last, &self.local_key);
            guard.buckets.push(new_bucket);
            debug!(new_last = guard.buckets.len() - 1, "split last bucket");
            idx = self.bucket_id_for_key(&key, guard.buckets.len());
            if guard.buckets[idx].len() < self.bucket_size {
                guard.buckets[idx].push_front(PeerInfo::new(peer.clone(), is_query_peer, now));
                drop(guard);
                self.fire_added(&peer);
                return Ok(true);
            }
        }

        // Step 4/5: eviction, or rejection.
        let incumbent = self.find_replaceable(&guard.buckets[idx], now);
        match incumbent {
            Some(victim_id) => {
                guard.buckets[idx].remove(&victim_id);
                guard.buckets[idx].push_front(PeerInfo::new(peer.clone(), is_query_peer, now));
                drop(guard);
                self.fire_removed(&victim_id);
                self.fire_added(&peer);
                Ok(true)
            }
            None => {
                let err = if self.metrics.latency(&peer) > self.latency_tolerance {
                    RoutingTableError::PeerRejectedHighLatency
                } else {
                    RoutingTableError::PeerRejectedNoCapacity
                };
                warn!(?err, "try_add_peer: rejected");
                Err(err)
            }
        }
    }

    /// Find the best replacement candidate in a full bucket: the stale
    /// incumbent (last useful query older than `now - usefulness_ttl`) with
    /// the oldest `last_useful_outbound_query`, ties broken by lowest
    /// latency, then bucket order.
    fn find_replaceable(&self, bucket: &Bucket, now: Instant) -> Option<PeerId> {
        // A sentinel-large `usefulness_ttl` (spec's "effectively infinite")
        // disables replacement for free here: `now - ttl` underflows
        // `Instant`'s arbitrary epoch and `checked_sub` yields `None`.
        let stale_before = now.checked_sub(self.usefulness_ttl)?;
        let candidates: Vec<&PeerInfo> = bucket
            .iter()
            .filter(|p| matches!(p.last_useful_outbound_query(), Some(t) if t < stale_before))
            .collect();
        candidates
            .into_iter()
            .min_by(|a, b| {
                let ta = a.last_useful_outbound_query().unwrap();
                let tb = b.last_useful_outbound_query().unwrap();
                ta.cmp(&tb).then_with(|| {
                    self.metrics
                        .latency(a.id())
                        .cmp(&self.metrics.latency(b.id()))
                })
            })
            .map(|p| p.id().clone())
    }

    /// Idempotent removal: removing an absent peer is a no-op success.
    pub fn remove_peer(&self, peer: &PeerId) {
        let key = peer.key();
        let mut guard = self.inner.write();
        let idx = self.bucket_id_for_key(&key, guard.buckets.len());
        let removed = guard.buckets[idx].remove(peer);
        drop(guard);
        if removed {
            self.fire_removed(peer);
        }
    }

    /// Update `peer`'s `last_useful_outbound_query` timestamp. Returns
    /// whether the peer was found. Does not reorder buckets.
    pub fn update_last_successful_outbound_query(&self, peer: &PeerId, t: Instant) -> bool {
        let key = peer.key();
        let mut guard = self.inner.write();
        let idx = self.bucket_id_for_key(&key, guard.buckets.len());
        if let Some(info) = guard.buckets[idx].get_peer_mut(peer) {
            info.last_useful_outbound_query = Some(t);
            true
        } else {
            false
        }
    }

    /// Return the stored identifier if `peer` is present.
    #[must_use]
    pub fn find(&self, peer: &PeerId) -> Option<PeerId> {
        let key = peer.key();
        let guard = self.inner.read();
        let idx = self.bucket_id_for_key(&key, guard.buckets.len());
        guard.buckets[idx].get_peer(peer).map(|p| p.id().clone())
    }

    /// Up to `k` peers closest to `target`, ascending distance order.
    #[must_use]
    pub fn nearest_peers(&self, target: &Key, k: usize) -> Vec<PeerId> {
        let guard = self.inner.read();
        query::nearest_peers(&guard.buckets, &self.local_key, target, k)
            .into_iter()
            .map(|p| p.id().clone())
            .collect()
    }

    /// First element of [`Self::nearest_peers`] with `k = 1`.
    #[must_use]
    pub fn nearest_peer(&self, target: &Key) -> Option<PeerId> {
        self.nearest_peers(target, 1).into_iter().next()
    }

    /// Snapshot of every peer identifier across all buckets.
    #[must_use]
    pub fn list_peers(&self) -> Vec<PeerId> {
        let guard = self.inner.read();
        guard
            .buckets
            .iter()
            .flat_map(|b| b.peers())
            .map(|p| p.id().clone())
            .collect()
    }

    /// Total peer count across all buckets.
    #[must_use]
    pub fn size(&self) -> usize {
        let guard = self.inner.read();
        guard.buckets.iter().map(Bucket::len).sum()
    }

    /// Human-readable diagnostic dump. No stability contract.
    pub fn print(&self) {
        let guard = self.inner.read();
        for (i, b) in guard.buckets.iter().enumerate() {
            println!("bucket[{i}] ({}/{}):", b.len(), b.capacity());
            for p in b.peers() {
                println!("  {:?}", p.id());
            }
        }
    }

    fn fire_added(&self, peer: &PeerId) {
        if let Some(cb) = &self.peer_added {
            cb(peer);
        }
    }

    fn fire_removed(&self, peer: &PeerId) {
        if let Some(cb) = &self.peer_removed {
            cb(peer);
        }
    }
}

/// Produce a [`PeerId`] whose key shares exactly `cpl` leading bits with
/// `local_key`: the first `cpl` bits equal, the next bit flipped, the rest
/// random. Testing/support utility for exercising specific buckets.
///
/// # Errors
/// Returns [`RoutingTableError::InvalidCpl`] if `cpl >= KEY_BITS`.
pub fn gen_rand_peer_id(cpl: usize, local_key: &Key) -> Result<PeerId, RoutingTableError> {
    if cpl >= KEY_BITS {
        return Err(RoutingTableError::InvalidCpl);
    }
    let mut bytes = *local_key.as_bytes();
    let flip_byte = cpl / 8;
    let flip_bit = 7 - (cpl % 8);
    bytes[flip_byte] ^= 1 << flip_bit;

    let mut rng = rand::thread_rng();
    let tail_start_byte = flip_byte + 1;
    if tail_start_byte < bytes.len() {
        rng.fill_bytes(&mut bytes[tail_start_byte..]);
    }
    // Randomize bits after the flipped one within `flip_byte` too, keeping
    // the top `7 - flip_bit` bits (the still-matching prefix bits in this
    // byte) untouched.
    let tail_mask_bits = flip_bit; // number of low bits after the flip point
    if tail_mask_bits > 0 {
        let mask = (1u8 << tail_mask_bits) - 1;
        let mut rand_byte = [0u8; 1];
        rng.fill_bytes(&mut rand_byte);
        bytes[flip_byte] = (bytes[flip_byte] & !mask) | (rand_byte[0] & mask);
    }

    Ok(PeerId::from_key_bytes(bytes))
}
