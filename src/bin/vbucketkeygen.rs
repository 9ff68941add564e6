//! Operator CLI: generate keys that spread evenly across every vbucket.
//!
//! Useful for smoke tests that want to touch each partition a fixed number
//! of times. Prints `key vbucket` pairs and exits nonzero when some vbucket
//! did not collect enough keys.

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use shardmap::Topology;

/// Generate keys covering every vbucket of a cluster config.
#[derive(Parser, Debug)]
#[command(name = "vbucketkeygen", version)]
struct Args {
    /// Config mapfile (vBucketServerMap JSON), or `-` for stdin.
    mapfile: String,

    /// Keys to keep per vbucket.
    keys_per_vbucket: usize,

    /// Candidate keys to generate before giving up.
    keys_to_generate: usize,
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
    let num_vbuckets = topology.num_vbuckets() as usize;
    if num_vbuckets == 0 {
        eprintln!("ERROR: config has no vbuckets, keygen needs a vbucket topology");
        return ExitCode::FAILURE;
    }

    let mut bins: Vec<Vec<String>> = vec![Vec::new(); num_vbuckets];
    for i in 0..args.keys_to_generate {
        let key = format!("key_{i:010}");
        let vbucket = topology.map(key.as_bytes()).vbucket as usize;
        if bins[vbucket].len() < args.keys_per_vbucket {
            bins[vbucket].push(key);
        }
    }

    let mut total = 0;
    for (vbucket, keys) in bins.iter().enumerate() {
        for key in keys {
            println!("{key} {vbucket}");
            total += 1;
        }
    }

    if total < num_vbuckets * args.keys_per_vbucket {
        eprintln!("some vbuckets don't have enough keys");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
