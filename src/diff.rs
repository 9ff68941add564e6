//! Structural comparison of two topology snapshots.
//!
//! Clients poll for config changes and re-parse; the diff tells them how
//! disruptive the new snapshot is: which servers appeared or vanished,
//! whether the server sequence (or credentials) shifted under existing
//! indices, and how many partitions changed master.

use crate::topology::Topology;

/// Difference between an older and a newer topology snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyDiff {
    /// Authorities present in the newer topology only, in its order.
    pub servers_added: Vec<String>,

    /// Authorities present in the older topology only, in its order.
    pub servers_removed: Vec<String>,

    /// True when indices no longer mean the same server: counts differ, a
    /// same-index authority differs, or the credentials changed.
    pub sequence_changed: bool,

    /// Number of partitions whose master moved, or -1 when the partition
    /// counts differ and the maps cannot be compared (assume full reroute).
    pub master_changes: i64,
}

/// Compare an older topology against a newer snapshot.
pub fn compare(older: &Topology, newer: &Topology) -> TopologyDiff {
    let servers_added = missing_from(newer, older);
    let servers_removed = missing_from(older, newer);

    let sequence_changed = older.num_servers() != newer.num_servers()
        || older
            .servers()
            .iter()
            .zip(newer.servers())
            .any(|(a, b)| a.authority != b.authority)
        || older.user() != newer.user()
        || older.password() != newer.password();

    let master_changes = match (older.vbucket_map(), newer.vbucket_map()) {
        (Some(a), Some(b)) if a.num_vbuckets() == b.num_vbuckets() => (0..a.num_vbuckets())
            .filter(|&vb| a.master_raw(vb as usize) != b.master_raw(vb as usize))
            .count() as i64,
        // Two ketama topologies have no partitions to disagree about.
        (None, None) => 0,
        _ => -1,
    };

    TopologyDiff {
        servers_added,
        servers_removed,
        sequence_changed,
        master_changes,
    }
}

/// Authorities of `from` that appear nowhere in `other`, in `from`'s order.
fn missing_from(from: &Topology, other: &Topology) -> Vec<String> {
    from.servers()
        .iter()
        .filter(|server| {
            !other
                .servers()
                .iter()
                .any(|candidate| candidate.authority == server.authority)
        })
        .map(|server| server.authority.clone())
        .collect()
}
