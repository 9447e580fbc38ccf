//! Proximity query engine: given a target key and count `k`, return the `k`
//! peers closest to the target across all buckets, in ascending distance
//! order.

use crate::bucket::Bucket;
use crate::key::{sort_closest, Key};
use crate::peer::PeerInfo;

/// Collect up to `k` peers from `buckets` closest to `target`.
///
/// Fans out from the bucket whose index equals `cpl(target, local_key)`
/// (clamped to the last bucket), then alternates outward (`c+1`, `c-1`,
/// `c+2`, `c-2`, ...), so that the
/// same-distance-class bucket first, then buckets holding closer peers,
/// then farther ones. All candidates are merged and sorted by distance to
/// `target` before truncating to `k`.
pub fn nearest_peers(buckets: &[Bucket], local_key: &Key, target: &Key, k: usize) -> Vec<PeerInfo> {
    if k == 0 || buckets.is_empty() {
        return Vec::new();
    }

    let last = buckets.len() - 1;
    let c = local_key.common_prefix_len(target).min(last);

    let mut order = Vec::with_capacity(buckets.len());
    order.push(c);
    let mut lo = c;
    let mut hi = c;
    loop {
        let mut advanced = false;
        if hi < last {
            hi += 1;
            order.push(hi);
            advanced = true;
        }
        if lo > 0 {
            lo -= 1;
            order.push(lo);
            advanced = true;
        }
        if !advanced {
            break;
        }
    }

    let mut candidates = Vec::new();
    for idx in order {
        candidates.extend(buckets[idx].peers());
    }

    sort_closest(&mut candidates, target, |p| p.key());
    candidates.truncate(k);
    candidates
}

/// First element of [`nearest_peers`] with `k = 1`, if any.
pub fn nearest_peer(buckets: &[Bucket], local_key: &Key, target: &Key) -> Option<PeerInfo> {
    nearest_peers(buckets, local_key, target, 1).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::convert_peer;
    use crate::peer::{PeerId, PeerInfo};
    use std::time::Instant;

    /// Build a single-bucket table for unit-level testing of the fan-out and
    /// sort behaviour; table.rs covers real multi-bucket splits.
    fn single_bucket(peers: &[PeerId], bucket_size: usize) -> Vec<Bucket> {
        let mut b = Bucket::new(bucket_size.max(peers.len()));
        for id in peers {
            b.push_front(PeerInfo::new(id.clone(), false, Instant::now()));
        }
        vec![b]
    }

    #[test]
    fn nearest_peers_respects_k() {
        let local = convert_peer(b"local");
        let ids: Vec<PeerId> = (0..10).map(|i| PeerId::new(format!("peer-{i}").into_bytes())).collect();
        let buckets = single_bucket(&ids, 20);
        let target = convert_peer(b"target");
        let result = nearest_peers(&buckets, &local, &target, 3);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn nearest_peers_sorted_ascending() {
        let local = convert_peer(b"local");
        let ids: Vec<PeerId> = (0..20).map(|i| PeerId::new(format!("peer-{i}").into_bytes())).collect();
        let buckets = single_bucket(&ids, 30);
        let target = convert_peer(b"target");
        let result = nearest_peers(&buckets, &local, &target, 20);
        for w in result.windows(2) {
            assert!(w[0].key().distance(&target) <= w[1].key().distance(&target));
        }
    }

    #[test]
    fn nearest_peer_matches_head_of_nearest_peers() {
        let local = convert_peer(b"local");
        let ids: Vec<PeerId> = (0..5).map(|i| PeerId::new(format!("peer-{i}").into_bytes())).collect();
        let buckets = single_bucket(&ids, 10);
        let target = convert_peer(b"target");
        let top = nearest_peer(&buckets, &local, &target).unwrap();
        let list = nearest_peers(&buckets, &local, &target, 1);
        assert_eq!(top.id(), list[0].id());
    }

    #[test]
    fn empty_table_yields_no_peers() {
        let local = convert_peer(b"local");
        let target = convert_peer(b"target");
        let buckets: Vec<Bucket> = vec![Bucket::new(5)];
        assert!(nearest_peers(&buckets, &local, &target, 5).is_empty());
    }
}
