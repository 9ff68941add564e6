//! Core types shared across the topology and routing modules.

use std::fmt;

/// Canonical server identity: the index into the topology's ordered
/// server list. Every routing table entry refers to servers by this index.
pub type ServerId = usize;

/// Sentinel used in raw partition tables for "no server assigned".
pub(crate) const NO_SERVER: i32 = -1;

/// Upper bound on the replica chain length per partition.
pub const MAX_REPLICAS: usize = 4;

/// Upper bound on the partition count; the count must also be a power of two.
pub const MAX_VBUCKETS: usize = 65536;

/// One node of the cluster, addressed by its data-port authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    /// `"host:port"` address clients talk to for data operations.
    pub authority: String,

    /// CouchDB-style API base URL, when the cluster advertises one.
    pub couch_api_base: Option<String>,

    /// Management address (same host, REST admin port), when known.
    pub rest_address: Option<String>,
}

impl Server {
    /// Create a server with just a data authority.
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            couch_api_base: None,
            rest_address: None,
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority)
    }
}

/// Which distribution strategy a topology uses to place keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionKind {
    /// Static partition table: digest(key) & mask selects a row of
    /// master + replicas.
    Vbucket,

    /// Ketama consistent-hash ring: binary search over a sorted continuum.
    Ketama,
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionKind::Vbucket => f.write_str("vbucket"),
            DistributionKind::Ketama => f.write_str("ketama"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_display_is_authority() {
        let s = Server::new("cache0.example.com:11210");
        assert_eq!(s.to_string(), "cache0.example.com:11210");
        assert!(s.couch_api_base.is_none());
        assert!(s.rest_address.is_none());
    }
}
