//! XOR keyspace arithmetic.
//!
//! A [`Key`] is a 256-bit identifier derived from a peer's opaque identity
//! bytes by hashing through SHA-256. Distance between two keys is their
//! bitwise XOR, interpreted as a big-endian unsigned integer; common prefix
//! length (CPL) counts the leading bits two keys share. Together these give
//! the total order Kademlia uses to decide which peers are "close" to a
//! target.

use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;

/// Number of bits in the keyspace.
pub const KEY_BITS: usize = 256;
const KEY_BYTES: usize = KEY_BITS / 8;

/// A 256-bit identifier in the XOR keyspace.
///
/// Keys are produced by [`convert_peer`] and compared only through
/// [`Key::distance`], [`Key::common_prefix_len`], and the `Ord`/`PartialOrd`
/// impls, which order keys lexicographically (byte-by-byte, big-endian) --
/// useful as a deterministic tie-break, not as a distance.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key([u8; KEY_BYTES]);

impl Key {
    /// Wrap raw bytes as a key without hashing. Used by tests and by
    /// [`convert_peer`] itself.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes, most significant byte first.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }

    /// XOR distance to `other`, as a [`Key`]-shaped big-endian unsigned
    /// integer.
    #[must_use]
    pub fn distance(&self, other: &Key) -> Distance {
        let mut out = [0u8; KEY_BYTES];
        for i in 0..KEY_BYTES {
            out[i] = self.0[i] ^ other.0[i];
        }
        Distance(out)
    }

    /// Number of leading bits `self` and `other` share, in `[0, KEY_BITS]`.
    #[must_use]
    pub fn common_prefix_len(&self, other: &Key) -> usize {
        self.distance(other).leading_zeros()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(")?;
        for b in &self.0[..4] {
            write!(f, "{b:02x}")?;
        }
        write!(f, "..)")
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// XOR distance between two [`Key`]s, ordered as a big-endian unsigned
/// integer (smaller means closer).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Distance([u8; KEY_BYTES]);

impl Distance {
    /// Number of leading zero bits, i.e. the common-prefix-length implied by
    /// this distance. `KEY_BITS` iff the distance is zero (identical keys).
    #[must_use]
    pub fn leading_zeros(&self) -> usize {
        let mut count = 0;
        for byte in &self.0 {
            if *byte == 0 {
                count += 8;
            } else {
                count += byte.leading_zeros() as usize;
                break;
            }
        }
        count.min(KEY_BITS)
    }
}

impl fmt::Debug for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Distance(cpl={})", self.leading_zeros())
    }
}

/// Derive the keyspace [`Key`] for an opaque peer identifier by hashing its
/// bytes through SHA-256.
///
/// Two distinct peer identifiers may in principle hash to the same key; that
/// collision is handled at the routing-table level (the later insertion
/// wins), not here.
#[must_use]
pub fn convert_peer(id: &[u8]) -> Key {
    let digest = Sha256::digest(id);
    let mut bytes = [0u8; KEY_BYTES];
    bytes.copy_from_slice(&digest);
    Key(bytes)
}

/// Sort `keyed` ascending by XOR distance to `target`, ties broken by
/// lexicographic key order. `key_fn` extracts the [`Key`] from each element
/// without consuming it, so this works for `PeerId`s, `PeerInfo`s, or any
/// caller type that carries a key.
pub fn sort_closest<T>(items: &mut [T], target: &Key, key_fn: impl Fn(&T) -> Key) {
    items.sort_by(|a, b| {
        let ka = key_fn(a);
        let kb = key_fn(b);
        ka.distance(target)
            .cmp(&kb.distance(target))
            .then_with(|| ka.cmp(&kb))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_identity() {
        let k = convert_peer(b"peer-a");
        assert_eq!(k.distance(&k).leading_zeros(), KEY_BITS);
    }

    #[test]
    fn distance_symmetry() {
        let a = convert_peer(b"peer-a");
        let b = convert_peer(b"peer-b");
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn cpl_matches_leading_zeros_of_distance() {
        let mut a = [0u8; KEY_BYTES];
        let mut b = [0u8; KEY_BYTES];
        a[0] = 0b1010_0000;
        b[0] = 0b1011_0000;
        let ka = Key::from_bytes(a);
        let kb = Key::from_bytes(b);
        // first 3 bits match (101), 4th differs
        assert_eq!(ka.common_prefix_len(&kb), 3);
    }

    #[test]
    fn convert_peer_deterministic() {
        assert_eq!(convert_peer(b"same"), convert_peer(b"same"));
        assert_ne!(convert_peer(b"one"), convert_peer(b"two"));
    }

    #[test]
    fn sort_closest_orders_by_distance() {
        let target = convert_peer(b"target");
        let mut keys = vec![
            convert_peer(b"far"),
            convert_peer(b"near"),
            convert_peer(b"target"),
        ];
        sort_closest(&mut keys, &target, |k| *k);
        assert_eq!(keys[0], target);
        for w in keys.windows(2) {
            assert!(w[0].distance(&target) <= w[1].distance(&target));
        }
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_distance_symmetry(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            let ka = Key::from_bytes(a);
            let kb = Key::from_bytes(b);
            prop_assert_eq!(ka.distance(&kb), kb.distance(&ka));
        }

        #[test]
        fn prop_distance_identity(a in any::<[u8; 32]>()) {
            let ka = Key::from_bytes(a);
            prop_assert_eq!(ka.distance(&ka).leading_zeros(), KEY_BITS);
        }

        #[test]
        fn prop_cpl_bounded(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            let ka = Key::from_bytes(a);
            let kb = Key::from_bytes(b);
            let cpl = ka.common_prefix_len(&kb);
            prop_assert!(cpl <= KEY_BITS);
        }
    }
}
