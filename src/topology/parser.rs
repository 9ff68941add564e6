//! Config document validation: JSON tree in, [`Topology`] out.
//!
//! Two document shapes are accepted: the config fields directly at the root,
//! or a root object carrying the config inside a `"vBucketServerMap"`
//! envelope with `nodeLocator`, credentials and the `nodes` descriptor array
//! as root-level siblings. Every violation aborts the parse with a single
//! descriptive error; no partially built topology ever escapes.

use serde_json::{Map, Value};

use crate::digest::HashAlgorithm;
use crate::error::{Error, Result};
use crate::routing::{Continuum, VbucketMap};
use crate::topology::{Distribution, Topology};
use crate::types::{DistributionKind, Server, MAX_REPLICAS, MAX_VBUCKETS};

/// Root field holding the actual config object in enveloped documents.
const ENVELOPE_FIELD: &str = "vBucketServerMap";

type JsonObject = Map<String, Value>;

/// One entry of the root-level `nodes` array.
struct NodeEntry {
    /// `host:direct-port`, the data authority this node serves on.
    authority: String,

    /// The raw `hostname` value, which carries the management port.
    rest_address: String,

    couch_api_base: Option<String>,
}

pub(super) fn parse(doc: &Value) -> Result<Topology> {
    let root = doc
        .as_object()
        .ok_or_else(|| Error::validation("config root must be an object"))?;
    let config = match root.get(ENVELOPE_FIELD) {
        Some(value) => value.as_object().ok_or_else(|| {
            Error::validation(format!("expected object for {ENVELOPE_FIELD}"))
        })?,
        None => root,
    };

    let kind = parse_locator(root)?;
    let num_replicas = parse_num_replicas(config)?;
    let user = opt_string(root, "name")?.filter(|name| name != "default");
    let password = opt_string(root, "saslPassword")?;
    let nodes = parse_nodes(root)?;

    let (servers, distribution) = match kind {
        DistributionKind::Vbucket => parse_vbucket(config, num_replicas, nodes)?,
        DistributionKind::Ketama => parse_ketama(nodes)?,
    };

    Ok(Topology {
        servers,
        num_replicas,
        user,
        password,
        distribution,
    })
}

fn parse_locator(root: &JsonObject) -> Result<DistributionKind> {
    match root.get("nodeLocator") {
        None => Ok(DistributionKind::Vbucket),
        Some(value) => match value.as_str() {
            Some("vbucket") => Ok(DistributionKind::Vbucket),
            Some("ketama") => Ok(DistributionKind::Ketama),
            Some(other) => Err(Error::validation(format!(
                "unrecognized nodeLocator {other:?}"
            ))),
            None => Err(Error::validation("expected string for nodeLocator")),
        },
    }
}

fn parse_num_replicas(config: &JsonObject) -> Result<usize> {
    let value = config
        .get("numReplicas")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::validation("expected integer for numReplicas"))?;
    if !(0..=MAX_REPLICAS as i64).contains(&value) {
        return Err(Error::validation(format!(
            "numReplicas must be between 0 and {MAX_REPLICAS}, got {value}"
        )));
    }
    Ok(value as usize)
}

fn parse_vbucket(
    config: &JsonObject,
    num_replicas: usize,
    nodes: Vec<NodeEntry>,
) -> Result<(Vec<Server>, Distribution)> {
    let algorithm = match config.get("hashAlgorithm") {
        None => HashAlgorithm::default(),
        Some(value) => {
            let name = value
                .as_str()
                .ok_or_else(|| Error::validation("expected string for hashAlgorithm"))?;
            HashAlgorithm::from_name(name).ok_or_else(|| {
                Error::validation(format!("unknown hashAlgorithm {name:?}"))
            })?
        }
    };

    let server_list = config
        .get("serverList")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::validation("expected array for serverList"))?;
    if server_list.is_empty() {
        return Err(Error::validation("serverList must not be empty"));
    }
    let mut servers = Vec::with_capacity(server_list.len());
    for entry in server_list {
        let authority = entry
            .as_str()
            .ok_or_else(|| Error::validation("expected array of strings for serverList"))?;
        servers.push(Server::new(authority));
    }

    // Attach the management address and CouchDB API base of any node whose
    // constructed authority matches a serverList entry.
    for node in nodes {
        if let Some(server) = servers.iter_mut().find(|s| s.authority == node.authority) {
            server.rest_address = Some(node.rest_address);
            server.couch_api_base = node.couch_api_base;
        }
    }

    let rows = parse_table(config, "vBucketMap", servers.len(), num_replicas, None)?
        .ok_or_else(|| Error::validation("expected array for vBucketMap"))?;
    let forward = parse_table(
        config,
        "vBucketMapForward",
        servers.len(),
        num_replicas,
        Some(rows.len()),
    )?;

    let map = VbucketMap::new(algorithm, servers.len(), num_replicas, rows, forward);
    Ok((servers, Distribution::Vbucket(map)))
}

fn parse_ketama(nodes: Vec<NodeEntry>) -> Result<(Vec<Server>, Distribution)> {
    if nodes.is_empty() {
        return Err(Error::validation(
            "ketama topology requires a non-empty nodes array",
        ));
    }
    let servers: Vec<Server> = nodes
        .into_iter()
        .map(|node| Server::new(node.authority))
        .collect();
    let ring = Continuum::build(&servers);
    Ok((servers, Distribution::Ketama(ring)))
}

/// Parse a partition table field. Returns `Ok(None)` when the field is
/// absent, which is only acceptable for the forward table; the caller
/// enforces presence of the primary one.
fn parse_table(
    config: &JsonObject,
    field: &str,
    num_servers: usize,
    num_replicas: usize,
    expected_len: Option<usize>,
) -> Result<Option<Vec<Vec<i32>>>> {
    let Some(value) = config.get(field) else {
        return Ok(None);
    };
    let table = value
        .as_array()
        .ok_or_else(|| Error::validation(format!("expected array for {field}")))?;

    match expected_len {
        // The forward table must mirror the primary table's shape.
        Some(expected) if table.len() != expected => {
            return Err(Error::validation(format!(
                "{field} has {} rows but the primary table has {expected}",
                table.len()
            )));
        }
        Some(_) => {}
        None => {
            if table.is_empty() || !table.len().is_power_of_two() || table.len() > MAX_VBUCKETS {
                return Err(Error::validation(format!(
                    "{field} length must be a power of two between 1 and {MAX_VBUCKETS}, got {}",
                    table.len()
                )));
            }
        }
    }

    let width = num_replicas + 1;
    let mut rows = Vec::with_capacity(table.len());
    for row in table {
        let entries = row.as_array().filter(|row| row.len() == width).ok_or_else(|| {
            Error::validation(format!(
                "each {field} row must be an array of numReplicas + 1 server ids"
            ))
        })?;
        let mut parsed = Vec::with_capacity(width);
        for entry in entries {
            let id = entry
                .as_i64()
                .filter(|&id| id >= -1 && id < num_servers as i64)
                .ok_or_else(|| {
                    Error::validation(format!(
                        "{field} server ids must be -1 or less than {num_servers}"
                    ))
                })?;
            parsed.push(id as i32);
        }
        rows.push(parsed);
    }
    Ok(Some(rows))
}

fn parse_nodes(root: &JsonObject) -> Result<Vec<NodeEntry>> {
    let Some(value) = root.get("nodes") else {
        return Ok(Vec::new());
    };
    let nodes = value
        .as_array()
        .ok_or_else(|| Error::validation("expected array for nodes"))?;
    nodes.iter().map(parse_node).collect()
}

fn parse_node(value: &Value) -> Result<NodeEntry> {
    let node = value
        .as_object()
        .ok_or_else(|| Error::validation("each nodes entry must be an object"))?;
    let hostname = node
        .get("hostname")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::validation("node is missing a hostname string"))?;
    let direct = node
        .get("ports")
        .and_then(Value::as_object)
        .and_then(|ports| ports.get("direct"))
        .and_then(Value::as_u64)
        .filter(|&port| port > 0 && port <= u64::from(u16::MAX))
        .ok_or_else(|| Error::validation("node is missing a direct port"))?;

    // The hostname carries the management port; the data authority swaps it
    // for the direct port.
    let host = hostname.split(':').next().unwrap_or(hostname);
    Ok(NodeEntry {
        authority: format!("{host}:{direct}"),
        rest_address: hostname.to_string(),
        couch_api_base: opt_string(node, "couchApiBase")?,
    })
}

/// Read an optional string field, rejecting a present-but-mistyped value.
fn opt_string(map: &JsonObject, field: &str) -> Result<Option<String>> {
    match map.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| Error::validation(format!("expected string for {field}"))),
    }
}
