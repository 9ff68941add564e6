//! Distribution engines and the unified routing result.
//!
//! A topology routes through exactly one of two engines: the static
//! [`VbucketMap`] partition table or the ketama [`Continuum`]. The dispatch
//! between them lives on [`crate::Topology::map`]; this module owns the
//! engines themselves and the [`Route`] they produce.

mod ring;
mod vbucket;

pub use ring::{Continuum, ContinuumPoint};
pub use vbucket::VbucketMap;

use crate::types::ServerId;

/// Result of resolving a key against a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Partition the key falls into. Always 0 for ketama topologies, where
    /// partitions do not exist.
    pub vbucket: u32,

    /// Server to send the request to, `None` when the partition currently
    /// has no master.
    pub server: Option<ServerId>,
}
