//! Cluster topology: parsed config, accessors, and routing dispatch.
//!
//! A [`Topology`] is the validated in-memory form of a cluster config
//! document. It is fully constructed by the parser or rejected; once built it
//! is read-only, shared freely across routing calls, and only
//! [`Topology::report_misroute`] mutates state (one partition row at a time,
//! behind that row's lock). A refreshed config should be parsed into a new
//! `Topology` and swapped in, never patched into a live one.

mod parser;

use tracing::debug;

use crate::diff::{self, TopologyDiff};
use crate::error::{Error, MisuseError, Result};
use crate::routing::{Continuum, Route, VbucketMap};
use crate::types::{DistributionKind, Server, ServerId};

/// Largest config document accepted by [`Topology::parse_bytes`], 100 MiB.
pub const MAX_CONFIG_SIZE: usize = 100 * 1024 * 1024;

/// Distribution engine a topology routes through.
#[derive(Debug)]
pub(crate) enum Distribution {
    Vbucket(VbucketMap),
    Ketama(Continuum),
}

/// Validated cluster topology and routing table.
#[derive(Debug)]
pub struct Topology {
    pub(crate) servers: Vec<Server>,
    pub(crate) num_replicas: usize,
    pub(crate) user: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) distribution: Distribution,
}

impl Topology {
    /// Build a topology from a parsed config document.
    pub fn parse(doc: &serde_json::Value) -> Result<Topology> {
        let topology = parser::parse(doc)?;
        debug!(
            distribution = %topology.distribution_kind(),
            servers = topology.num_servers(),
            vbuckets = topology.num_vbuckets(),
            replicas = topology.num_replicas(),
            "parsed cluster topology"
        );
        Ok(topology)
    }

    /// Build a topology from raw config bytes, capped at [`MAX_CONFIG_SIZE`].
    pub fn parse_bytes(bytes: &[u8]) -> Result<Topology> {
        Self::parse_bytes_with_limit(bytes, MAX_CONFIG_SIZE)
    }

    /// Build a topology from raw config bytes with an explicit size cap.
    ///
    /// The cap is enforced before any parsing work happens.
    pub fn parse_bytes_with_limit(bytes: &[u8], limit: usize) -> Result<Topology> {
        if bytes.len() > limit {
            return Err(Error::SizeLimit {
                size: bytes.len(),
                limit,
            });
        }
        let doc: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::parse(&doc)
    }

    /// Which distribution strategy this topology uses.
    pub fn distribution_kind(&self) -> DistributionKind {
        match self.distribution {
            Distribution::Vbucket(_) => DistributionKind::Vbucket,
            Distribution::Ketama(_) => DistributionKind::Ketama,
        }
    }

    /// Number of servers in the cluster.
    pub fn num_servers(&self) -> usize {
        self.servers.len()
    }

    /// Configured replica count.
    pub fn num_replicas(&self) -> usize {
        self.num_replicas
    }

    /// Number of partitions; 0 for a ketama topology.
    pub fn num_vbuckets(&self) -> u32 {
        match &self.distribution {
            Distribution::Vbucket(map) => map.num_vbuckets(),
            Distribution::Ketama(_) => 0,
        }
    }

    /// Credential user, when the config carries one.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Credential password, when the config carries one.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The ordered server list.
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Server by index, asserting the index is in range.
    pub fn server(&self, server: ServerId) -> Result<&Server> {
        self.servers.get(server).ok_or_else(|| {
            MisuseError::ServerOutOfRange {
                server,
                num_servers: self.servers.len(),
            }
            .into()
        })
    }

    /// Authority of the server at `server`, asserting the index is in range.
    pub fn server_address(&self, server: ServerId) -> Result<&str> {
        Ok(self.server(server)?.authority.as_str())
    }

    /// The partition table, when this is a vbucket topology.
    pub fn vbucket_map(&self) -> Option<&VbucketMap> {
        match &self.distribution {
            Distribution::Vbucket(map) => Some(map),
            Distribution::Ketama(_) => None,
        }
    }

    /// The continuum, when this is a ketama topology.
    pub fn continuum(&self) -> Option<&Continuum> {
        match &self.distribution {
            Distribution::Ketama(ring) => Some(ring),
            Distribution::Vbucket(_) => None,
        }
    }

    /// Resolve a key to its partition and server.
    ///
    /// Ketama topologies report partition 0; the partition id only means
    /// something for a vbucket topology.
    pub fn map(&self, key: &[u8]) -> Route {
        match &self.distribution {
            Distribution::Vbucket(map) => {
                let vbucket = map.vbucket_for_key(key);
                // In range by construction, so the lookup cannot fail.
                let server = map.master(vbucket).unwrap_or(None);
                Route { vbucket, server }
            }
            Distribution::Ketama(ring) => Route {
                vbucket: 0,
                server: ring.lookup(key),
            },
        }
    }

    /// Current master of a partition. Vbucket topologies only.
    pub fn master(&self, vbucket: u32) -> Result<Option<ServerId>> {
        self.require_vbucket_map()?.master(vbucket)
    }

    /// Replica `ordinal` of a partition. Vbucket topologies only.
    pub fn replica(&self, vbucket: u32, ordinal: usize) -> Result<Option<ServerId>> {
        self.require_vbucket_map()?.replica(vbucket, ordinal)
    }

    /// Authority of the replica at `ordinal`, `None` when the slot is empty.
    pub fn replica_address(&self, vbucket: u32, ordinal: usize) -> Result<Option<&str>> {
        match self.replica(vbucket, ordinal)? {
            Some(server) => Ok(Some(self.server(server)?.authority.as_str())),
            None => Ok(None),
        }
    }

    /// Record that `observed` was found not to be serving `vbucket`, and let
    /// the routing table heal itself. Returns the partition's new master.
    /// Vbucket topologies only.
    pub fn report_misroute(&self, vbucket: u32, observed: ServerId) -> Result<Option<ServerId>> {
        self.require_vbucket_map()?.report_misroute(vbucket, observed)
    }

    /// Structural diff against a newer topology snapshot.
    pub fn compare(&self, newer: &Topology) -> TopologyDiff {
        diff::compare(self, newer)
    }

    fn require_vbucket_map(&self) -> Result<&VbucketMap> {
        self.vbucket_map()
            .ok_or_else(|| MisuseError::NotVbucketDistribution.into())
    }
}
