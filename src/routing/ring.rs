//! Ketama consistent-hash distribution.
//!
//! Each server contributes 40 virtual-node labels (`"<authority>-<n>"`) and
//! each label's MD5 digest contributes four ring points, 160 points per
//! server. Lookup is a binary search for the first point at or after the
//! key's digest, wrapping to the start of the ring. Point construction and
//! lookup are bit-for-bit compatible with libketama, which is what the
//! servers' existing clients hash with.

use tracing::debug;

use crate::digest::{ketama_digest, ketama_points};
use crate::types::{Server, ServerId};

/// Virtual-node labels generated per server.
const VNODES_PER_SERVER: usize = 40;

/// One position on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuumPoint {
    /// Position, compared against the key digest.
    pub point: u32,

    /// Server owning the arc that ends at this point.
    pub server: ServerId,
}

/// The sorted ring of hash points used by consistent-hash routing.
#[derive(Debug)]
pub struct Continuum {
    points: Vec<ContinuumPoint>,
}

impl Continuum {
    /// Build the continuum for an ordered server list.
    ///
    /// Rebuilding replaces the ring wholesale; points are stable-sorted so
    /// equal positions keep generation order and stay deterministic.
    pub(crate) fn build(servers: &[Server]) -> Self {
        let mut points = Vec::with_capacity(servers.len() * VNODES_PER_SERVER * 4);
        for (server, entry) in servers.iter().enumerate() {
            for vnode in 0..VNODES_PER_SERVER {
                let label = format!("{}-{}", entry.authority, vnode);
                for point in ketama_points(label.as_bytes()) {
                    points.push(ContinuumPoint { point, server });
                }
            }
        }
        points.sort_by_key(|item| item.point);
        debug!(
            servers = servers.len(),
            points = points.len(),
            "built ketama continuum"
        );
        Self { points }
    }

    /// Number of points on the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the ring has no points (no servers).
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The sorted ring, ascending by point.
    pub fn points(&self) -> &[ContinuumPoint] {
        &self.points
    }

    /// Server responsible for `key`.
    ///
    /// The parser never produces an empty ring, so lookup always lands on a
    /// server: the first point at or after `md5` word 0 of the key, or the
    /// first point of the ring when the digest is past the last point.
    pub fn lookup(&self, key: &[u8]) -> Option<ServerId> {
        locate(&self.points, ketama_digest(key))
    }
}

/// Binary search for the owner of `digest`: the smallest point >= digest,
/// wrapping to the first point when the digest exceeds every point.
fn locate(points: &[ContinuumPoint], digest: u32) -> Option<ServerId> {
    if points.is_empty() {
        return None;
    }
    let idx = points.partition_point(|item| item.point < digest);
    let idx = if idx == points.len() { 0 } else { idx };
    Some(points[idx].server)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(point: u32, server: ServerId) -> ContinuumPoint {
        ContinuumPoint { point, server }
    }

    #[test]
    fn locate_picks_smallest_point_at_or_after_digest() {
        let ring = [point(10, 0), point(20, 1), point(30, 2)];
        assert_eq!(locate(&ring, 0), Some(0));
        assert_eq!(locate(&ring, 10), Some(0));
        assert_eq!(locate(&ring, 11), Some(1));
        assert_eq!(locate(&ring, 20), Some(1));
        assert_eq!(locate(&ring, 25), Some(2));
        assert_eq!(locate(&ring, 30), Some(2));
        // Past the last point: wrap to the first.
        assert_eq!(locate(&ring, 31), Some(0));
        assert_eq!(locate(&ring, u32::MAX), Some(0));
        assert_eq!(locate(&[], 5), None);
    }

    #[test]
    fn build_yields_160_sorted_points_per_server() {
        let servers: Vec<Server> = (0..8)
            .map(|i| Server::new(format!("10.0.0.{}:11211", i)))
            .collect();
        let ring = Continuum::build(&servers);
        assert_eq!(ring.len(), 8 * 160);
        assert!(ring
            .points()
            .windows(2)
            .all(|w| w[0].point <= w[1].point));
        // Every server contributed exactly 160 points.
        for server in 0..8 {
            let count = ring.points().iter().filter(|p| p.server == server).count();
            assert_eq!(count, 160, "server {server}");
        }
    }

    #[test]
    fn lookup_agrees_with_linear_scan() {
        let servers: Vec<Server> = (0..5)
            .map(|i| Server::new(format!("cache{}.example.com:11210", i)))
            .collect();
        let ring = Continuum::build(&servers);
        for i in 0..2000 {
            let key = format!("{}", i);
            let digest = ketama_digest(key.as_bytes());
            let expected = ring
                .points()
                .iter()
                .find(|p| p.point >= digest)
                .unwrap_or(&ring.points()[0])
                .server;
            assert_eq!(ring.lookup(key.as_bytes()), Some(expected), "key {key}");
        }
    }

    #[test]
    fn rebuild_is_deterministic() {
        let servers: Vec<Server> = (0..3)
            .map(|i| Server::new(format!("s{}:11211", i)))
            .collect();
        let a = Continuum::build(&servers);
        let b = Continuum::build(&servers);
        assert_eq!(a.points(), b.points());
    }
}
