//! Client-side partition/routing library for sharded key-value clusters.
//!
//! Given a cluster config document this crate builds an immutable in-memory
//! [`Topology`] that maps keys to the servers responsible for them. Two
//! distribution strategies are supported:
//!
//! - **vbucket**: a static partition table; `digest(key) & mask` selects a
//!   row holding the master and its replica chain
//! - **ketama**: a consistent-hash ring, bit-for-bit compatible with
//!   libketama so mixed client fleets agree on placement
//!
//! The crate does no I/O: callers fetch the config however they like and
//! hand the bytes (or a parsed `serde_json::Value`) to [`Topology::parse`].
//! Topology refreshes are handled by parsing a fresh snapshot, using
//! [`Topology::compare`] to judge the damage, and swapping the new snapshot
//! in. The one sanctioned mutation is [`Topology::report_misroute`]: when a
//! client discovers it was routed to the wrong server, the routing table
//! heals the affected partition row in place.
//!
//! # Example
//!
//! ```rust
//! use shardmap::Topology;
//!
//! let config = br#"{
//!     "hashAlgorithm": "CRC",
//!     "numReplicas": 2,
//!     "serverList": ["server1:11211", "server2:11210", "server3:11211"],
//!     "vBucketMap": [[0, 1, 2], [1, 2, 0], [2, 1, -1], [1, 2, 0]]
//! }"#;
//!
//! let topology = Topology::parse_bytes(config)?;
//! let route = topology.map(b"hello");
//! let master = topology.server(route.server.unwrap())?;
//! assert_eq!(master.authority, "server1:11211");
//! # Ok::<(), shardmap::Error>(())
//! ```

pub mod diff;
pub mod digest;
pub mod error;
pub mod routing;
pub mod topology;
pub mod types;

pub use diff::TopologyDiff;
pub use digest::HashAlgorithm;
pub use error::{Error, MisuseError, Result};
pub use routing::{Continuum, ContinuumPoint, Route, VbucketMap};
pub use topology::{Topology, MAX_CONFIG_SIZE};
pub use types::{DistributionKind, Server, ServerId, MAX_REPLICAS, MAX_VBUCKETS};
