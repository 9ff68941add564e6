//! Operator CLI: print where keys live under a given cluster config.
//!
//! ```text
//! vbuckettool file.json some_key another_key
//! curl http://HOST:8091/pools/default/buckets/default | vbuckettool - some_key
//! ```

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use shardmap::{DistributionKind, Topology};

/// Map keys to their vbucket and servers under a cluster config.
#[derive(Parser, Debug)]
#[command(name = "vbuckettool", version)]
struct Args {
    /// Config mapfile (vBucketServerMap JSON), or `-` for stdin.
    mapfile: String,

    /// Keys to resolve.
    #[arg(required = true)]
    keys: Vec<String>,
}

fn read_config(mapfile: &str) -> std::io::Result<Vec<u8>> {
    if mapfile == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(mapfile)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let bytes = match read_config(&args.mapfile) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("ERROR: failed to read {}: {err}", args.mapfile);
            return ExitCode::FAILURE;
        }
    };
    let topology = match Topology::parse_bytes(&bytes) {
        Ok(topology) => topology,
        Err(err) => {
            eprintln!("ERROR: {err}");
            return ExitCode::FAILURE;
        }
    };

    for key in &args.keys {
        let route = topology.map(key.as_bytes());
        let master = route
            .server
            .and_then(|id| topology.server(id).ok())
            .map(|s| s.authority.as_str())
            .unwrap_or("(none)");
        print!("key: {key} master: {master}");

        if topology.distribution_kind() == DistributionKind::Vbucket {
            print!(" vBucketId: {}", route.vbucket);
            if let Some(couch) = route
                .server
                .and_then(|id| topology.server(id).ok())
                .and_then(|s| s.couch_api_base.as_deref())
            {
                print!(" couchApiBase: {couch}");
            }
            if topology.num_replicas() > 0 {
                print!(" replicas:");
                for ordinal in 0..topology.num_replicas() {
                    match topology.replica_address(route.vbucket, ordinal) {
                        Ok(Some(authority)) => print!(" {authority}"),
                        _ => break,
                    }
                }
            }
        }
        println!();
    }
    ExitCode::SUCCESS
}
