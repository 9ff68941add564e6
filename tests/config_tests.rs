//! End-to-end tests over the public surface: raw config bytes in, routing
//! decisions out.

use shardmap::{DistributionKind, Error, Topology};

const CONFIG: &str = r#"{
  "hashAlgorithm": "CRC",
  "numReplicas": 2,
  "serverList": ["server1:11211", "server2:11210", "server3:11211"],
  "vBucketMap":
    [
      [0, 1, 2],
      [1, 2, 0],
      [2, 1, -1],
      [1, 2, 0]
    ]
}"#;

const CONFIG_IN_ENVELOPE: &str = r#"{
  "otherKeyThatIsIgnored": 12345,
  "vBucketServerMap": {
    "hashAlgorithm": "CRC",
    "numReplicas": 2,
    "serverList": ["server1:11211", "server2:11210", "server3:11211"],
    "vBucketMap": [[0, 1, 2], [1, 2, 0], [2, 1, -1], [1, 2, 0]]
  }
}"#;

const CONFIG_IN_FULL_ENVELOPE: &str = r#"{
  "name": "default",
  "uri": "/pools/default/buckets/default",
  "streamingUri": "/pools/default/bucketsStreaming/default",
  "nodes": [{
    "clusterMembership": "inactiveAdded",
    "status": "unhealthy",
    "hostname": "127.0.0.1",
    "version": "unknown",
    "os": "unknown",
    "ports": {"proxy": 11213, "direct": 11212},
    "uptime": "0",
    "memoryTotal": 0
  }],
  "stats": {"uri": "/pools/default/buckets/default/stats"},
  "vBucketServerMap": {
    "hashAlgorithm": "CRC",
    "numReplicas": 2,
    "serverList": ["server1:11211", "server2:11210", "server3:11211"],
    "vBucketMap": [[0, 1, 2], [1, 2, 0], [2, 1, -1], [1, 2, 0]]
  },
  "basicStats": {"cacheSize": 64, "opsPerSec": 0.0}
}"#;

const KEYS: &[(&str, u32)] = &[
    ("hello", 0),
    ("doctor", 0),
    ("name", 3),
    ("continue", 3),
    ("yesterday", 0),
    ("tomorrow", 1),
    ("another key", 2),
];

const SERVERS: &[&str] = &["server1:11211", "server2:11210", "server3:11211"];

const MASTERS: &[(i32, [i32; 2])] = &[(0, [1, 2]), (1, [2, 0]), (2, [1, -1]), (1, [2, 0])];

fn check_config(raw: &str) {
    let topology = Topology::parse_bytes(raw.as_bytes()).unwrap();
    assert_eq!(topology.distribution_kind(), DistributionKind::Vbucket);
    assert_eq!(topology.num_servers(), 3);
    assert_eq!(topology.num_replicas(), 2);
    assert_eq!(topology.num_vbuckets(), 4);

    for (i, authority) in SERVERS.iter().enumerate() {
        assert_eq!(topology.server(i).unwrap().authority, *authority);
    }

    for &(key, vbucket) in KEYS {
        let route = topology.map(key.as_bytes());
        assert_eq!(route.vbucket, vbucket, "key {key:?}");
        // Routing is stable across repeated calls.
        assert_eq!(topology.map(key.as_bytes()), route);
        assert_eq!(route.server, topology.master(vbucket).unwrap());
    }

    for (vbucket, &(master, replicas)) in MASTERS.iter().enumerate() {
        let vbucket = vbucket as u32;
        assert_eq!(topology.master(vbucket).unwrap(), Some(master as usize));
        for (ordinal, &replica) in replicas.iter().enumerate() {
            let expected = (replica >= 0).then_some(replica as usize);
            assert_eq!(topology.replica(vbucket, ordinal).unwrap(), expected);
        }
    }
}

#[test]
fn accepts_all_config_shapes() {
    check_config(CONFIG);
    check_config(CONFIG_IN_ENVELOPE);
    check_config(CONFIG_IN_FULL_ENVELOPE);
}

#[test]
fn replica_addresses_resolve() {
    let topology = Topology::parse_bytes(CONFIG.as_bytes()).unwrap();
    assert_eq!(topology.server_address(0).unwrap(), "server1:11211");
    assert_eq!(
        topology.replica_address(0, 0).unwrap(),
        Some("server2:11210")
    );
    assert_eq!(topology.replica_address(2, 1).unwrap(), None);
}

#[test]
fn misroute_correction_round_robins() {
    let topology = Topology::parse_bytes(CONFIG.as_bytes()).unwrap();
    assert_eq!(topology.master(0).unwrap(), Some(0));
    assert_eq!(topology.report_misroute(0, 1).unwrap(), Some(0));
    assert_eq!(topology.master(0).unwrap(), Some(0));
    assert_eq!(topology.report_misroute(0, 0).unwrap(), Some(1));
    assert_eq!(topology.report_misroute(0, 1).unwrap(), Some(2));
    assert_eq!(topology.report_misroute(0, 2).unwrap(), Some(0));
    assert_eq!(topology.master(0).unwrap(), Some(0));
    // Other partitions never moved.
    assert_eq!(topology.master(1).unwrap(), Some(1));
}

#[test]
fn diff_matches_reference_expectations() {
    let cfg2 = CONFIG
        .replace("server3:11211", "server4:11211")
        .replace("[1, 2, 0]\n    ]", "[0, 2, 0]\n    ]");
    let older = Topology::parse_bytes(CONFIG.as_bytes()).unwrap();
    let newer = Topology::parse_bytes(cfg2.as_bytes()).unwrap();

    let diff = older.compare(&newer);
    assert_eq!(diff.servers_added, vec!["server4:11211"]);
    assert_eq!(diff.servers_removed, vec!["server3:11211"]);
    assert!(diff.sequence_changed);
    assert_eq!(diff.master_changes, 1);

    let same = Topology::parse_bytes(CONFIG.as_bytes()).unwrap();
    let diff = older.compare(&same);
    assert!(diff.servers_added.is_empty());
    assert!(diff.servers_removed.is_empty());
    assert!(!diff.sequence_changed);
    assert_eq!(diff.master_changes, 0);
}

#[test]
fn size_cap_is_enforced_before_parsing() {
    let err = Topology::parse_bytes_with_limit(CONFIG.as_bytes(), 16).unwrap_err();
    assert!(matches!(err, Error::SizeLimit { .. }));
    // Within the cap the same bytes parse fine.
    assert!(Topology::parse_bytes_with_limit(CONFIG.as_bytes(), 4096).is_ok());
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = Topology::parse_bytes(b"{not json").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn caller_indices_are_checked() {
    let topology = Topology::parse_bytes(CONFIG.as_bytes()).unwrap();
    assert!(matches!(topology.master(4), Err(Error::Misuse(_))));
    assert!(matches!(topology.server(3), Err(Error::Misuse(_))));
    assert!(matches!(
        topology.report_misroute(0, 5),
        Err(Error::Misuse(_))
    ));
}
