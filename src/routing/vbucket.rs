//! Static partition-map distribution.
//!
//! A vbucket topology routes through a fixed table of `N` rows (one per
//! partition, `N` a power of two) each holding a master plus the replica
//! chain. Routing is an O(1) mask of the key digest. The table is immutable
//! except for [`VbucketMap::report_misroute`], which rewrites one row at a
//! time behind a per-row lock so concurrent corrections never interleave.

use parking_lot::RwLock;
use tracing::warn;

use crate::digest::HashAlgorithm;
use crate::error::{MisuseError, Result};
use crate::types::{ServerId, NO_SERVER};

/// Routing table for the static partition-map distribution.
#[derive(Debug)]
pub struct VbucketMap {
    /// Digest used by `vbucket_for_key`.
    algorithm: HashAlgorithm,

    /// `num_vbuckets - 1`; valid because the partition count is a power of two.
    mask: u32,

    /// Number of servers in the owning topology; masters advance modulo this.
    num_servers: usize,

    /// Configured replica chain length (0..=4).
    num_replicas: usize,

    /// One row per partition: `row[0]` is the master, `row[1..]` the replica
    /// chain, `-1` marks "no server". Each row carries its own lock so the
    /// misroute mutation stays serialized without blocking other rows.
    rows: Vec<RwLock<Vec<i32>>>,

    /// Target table adopted row-by-row while a cluster migration is running.
    forward: Option<Vec<Vec<i32>>>,
}

// Table entries are validated to be NO_SERVER or a valid index at parse time.
fn entry_to_id(entry: i32) -> Option<ServerId> {
    (entry != NO_SERVER).then_some(entry as ServerId)
}

impl VbucketMap {
    /// Build a map from validated rows. The parser is responsible for shape
    /// and range checks; this constructor only wires the pieces together.
    pub(crate) fn new(
        algorithm: HashAlgorithm,
        num_servers: usize,
        num_replicas: usize,
        rows: Vec<Vec<i32>>,
        forward: Option<Vec<Vec<i32>>>,
    ) -> Self {
        debug_assert!(rows.len().is_power_of_two());
        Self {
            algorithm,
            mask: (rows.len() - 1) as u32,
            num_servers,
            num_replicas,
            rows: rows.into_iter().map(RwLock::new).collect(),
            forward,
        }
    }

    /// Number of partitions in the table.
    pub fn num_vbuckets(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Digest the table routes with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Whether a forward (migration target) table is attached.
    pub fn has_forward(&self) -> bool {
        self.forward.is_some()
    }

    /// Partition owning `key`: `digest(key) & (N - 1)`.
    pub fn vbucket_for_key(&self, key: &[u8]) -> u32 {
        self.algorithm.digest(key) & self.mask
    }

    /// Current master of a partition, `None` when the row has no server.
    pub fn master(&self, vbucket: u32) -> Result<Option<ServerId>> {
        let row = self.row(vbucket)?;
        Ok(entry_to_id(row.read()[0]))
    }

    /// Replica `ordinal` (0-based) of a partition. Ordinals at or past the
    /// configured replica count, and sentinel entries, yield `None`.
    pub fn replica(&self, vbucket: u32, ordinal: usize) -> Result<Option<ServerId>> {
        let row = self.row(vbucket)?;
        if ordinal >= self.num_replicas {
            return Ok(None);
        }
        Ok(entry_to_id(row.read()[ordinal + 1]))
    }

    /// Self-healing correction after a client discovered that `observed` is
    /// not in fact serving `vbucket`.
    ///
    /// With a forward table the partition's row is overwritten with the
    /// migration target row and its master returned. Without one, if the
    /// current master is the observed wrong server, the master advances to
    /// the next server index (wrapping) and the replicas stay untouched.
    /// Otherwise the row is left alone. Returns the (possibly new) master.
    pub fn report_misroute(&self, vbucket: u32, observed: ServerId) -> Result<Option<ServerId>> {
        if observed >= self.num_servers {
            return Err(MisuseError::ServerOutOfRange {
                server: observed,
                num_servers: self.num_servers,
            }
            .into());
        }
        let row = self.row(vbucket)?;
        let mut entries = row.write();

        if let Some(forward) = &self.forward {
            let target = &forward[vbucket as usize];
            entries.copy_from_slice(target);
            warn!(vbucket, observed, new_master = target[0], "adopted forward row after misroute");
            return Ok(entry_to_id(target[0]));
        }

        let current = entries[0];
        if current >= 0 && current as ServerId == observed {
            let next = (current as ServerId + 1) % self.num_servers;
            entries[0] = next as i32;
            warn!(vbucket, observed, new_master = next, "advanced master after misroute");
            return Ok(Some(next));
        }
        Ok(entry_to_id(current))
    }

    /// Master entry as stored, sentinel included. Used by the diff.
    pub(crate) fn master_raw(&self, vbucket: usize) -> i32 {
        self.rows[vbucket].read()[0]
    }

    fn row(&self, vbucket: u32) -> Result<&RwLock<Vec<i32>>> {
        self.rows.get(vbucket as usize).ok_or_else(|| {
            MisuseError::VbucketOutOfRange {
                vbucket,
                num_vbuckets: self.num_vbuckets(),
            }
            .into()
        })
    }
}
