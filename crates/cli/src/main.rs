//! # CLI — interactive demo shell
//!
//! A thin REPL over [`kvcontract::KvEngine`]. The engine family (Bitcask or
//! LSM) is selected once at startup via an environment variable; everything
//! after that talks only to the trait, never to the concrete engine type.
//!
//! ## Commands
//!
//! ```text
//! SET key value      Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Delete a key (writes a tombstone)
//! SCAN [start] [end] Range scan, inclusive on both ends (omit for full scan)
//! COMPACT            Trigger manual compaction, prints reclaimed bytes
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! ```text
//! KV_ENGINE        "bitcask" or "lsm"        (default: "bitcask")
//! KV_DATA_DIR      data directory            (default: "data")
//! ```

use kvcontract::KvEngine;
use std::io::{self, BufRead, Write};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn build_engine(kind: &str, data_dir: &str) -> Result<Box<dyn KvEngine>, kvcontract::KvError> {
    match kind {
        "lsm" => {
            let engine = lsm::LsmEngine::new(config::LsmConfig::new(data_dir))?;
            Ok(Box::new(engine))
        }
        _ => Ok(Box::new(bitcask::BitcaskEngine::new(config::BitcaskConfig::new(data_dir)))),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let kind = env_or("KV_ENGINE", "bitcask");
    let data_dir = env_or("KV_DATA_DIR", "data");

    let engine = build_engine(&kind, &data_dir)?;
    engine.start()?;

    println!("kv store started (engine={kind}, dir={data_dir})");
    println!("Commands: SET key value | GET key | DEL key | SCAN [start] [end] | COMPACT | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "SET" => {
                    if let Some(k) = parts.next() {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: SET key value");
                        } else {
                            match engine.put(k.as_bytes().to_vec(), v.as_bytes().to_vec()) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR set failed: {e}"),
                            }
                        }
                    } else {
                        println!("ERR usage: SET key value");
                    }
                }
                "GET" => {
                    if let Some(k) = parts.next() {
                        match engine.read(k.as_bytes()) {
                            Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
                            Ok(None) => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {e}"),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "DEL" => {
                    if let Some(k) = parts.next() {
                        match engine.delete(k.as_bytes()) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR del failed: {e}"),
                        }
                    } else {
                        println!("ERR usage: DEL key");
                    }
                }
                "SCAN" => {
                    let start = parts.next().unwrap_or("").as_bytes();
                    // read_range's bounds are literal and inclusive on both
                    // ends (no "unbounded" convention) — an omitted end
                    // argument is approximated with a long run of 0xFF,
                    // which sorts after any realistic demo key.
                    let end_owned = parts.next().map(str::as_bytes).map(<[u8]>::to_vec).unwrap_or_else(|| vec![0xFFu8; 256]);
                    match engine.read_range(start, &end_owned, usize::MAX) {
                        Ok(results) if results.is_empty() => println!("(empty)"),
                        Ok(results) => {
                            for (k, v) in &results {
                                println!("{} -> {}", String::from_utf8_lossy(k), String::from_utf8_lossy(v));
                            }
                            println!("({} entries)", results.len());
                        }
                        Err(e) => println!("ERR scan failed: {e}"),
                    }
                }
                "COMPACT" => match engine.compact() {
                    Ok(reclaimed) => println!("OK (reclaimed {reclaimed} bytes)"),
                    Err(e) => println!("ERR compact failed: {e}"),
                },
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => println!("unknown command: {other}"),
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    engine.close()?;
    Ok(())
}
