//! Offline standardization-statistics utility.
//!
//! Computes per-column mean/std over a relational table and writes the
//! standardization table JSON consumed by the serving process. Reaching
//! the store (a local file, a mounted volume, a tunneled copy) is the
//! operator's business; this utility only runs the aggregate queries.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin compute_stats -- --db <path> --table <name> \
//!     [--out <path>] [--column <key>=<db_column>]...
//! ```
//!
//! The column mapping defaults to the request keys themselves (e1..p2);
//! use `--column e1=engagement_index_1` when the store names differ.

use std::collections::BTreeMap;

use bidcast::adapters::sqlite::SqliteStatisticsSource;
use bidcast::domain::{FeatureStats, StandardizationTable, CONTINUOUS_FEATURES};
use bidcast::ports::StatisticsSource;

const USAGE: &str =
    "Usage: compute_stats --db <path> --table <name> [--out <path>] [--column <key>=<db_column>]...";

fn usage_exit() -> ! {
    eprintln!("{USAGE}");
    std::process::exit(2);
}

fn main() {
    let mut args = std::env::args().skip(1);
    let mut db_path: Option<std::path::PathBuf> = None;
    let mut table_name: Option<String> = None;
    let mut out_path = std::path::PathBuf::from("mean_std.json");
    let mut mapping: BTreeMap<String, String> = CONTINUOUS_FEATURES
        .iter()
        .map(|(key, _)| ((*key).to_string(), (*key).to_string()))
        .collect();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let p = args.next().unwrap_or_default();
                if p.is_empty() {
                    usage_exit();
                }
                db_path = Some(std::path::PathBuf::from(p));
            }
            "--table" => {
                let t = args.next().unwrap_or_default();
                if t.is_empty() {
                    usage_exit();
                }
                table_name = Some(t);
            }
            "--out" => {
                let p = args.next().unwrap_or_default();
                if p.is_empty() {
                    usage_exit();
                }
                out_path = std::path::PathBuf::from(p);
            }
            "--column" => {
                let spec = args.next().unwrap_or_default();
                let Some((key, column)) = spec.split_once('=') else {
                    usage_exit();
                };
                if !mapping.contains_key(key) {
                    eprintln!("Unknown index key {key:?} (expected one of e1, b1, p1, e2, b2, p2)");
                    std::process::exit(2);
                }
                mapping.insert(key.to_string(), column.to_string());
            }
            "-h" | "--help" => {
                println!(
                    "{USAGE}\n\nComputes mean/std/count/min/max for the six continuous indices \
                     over the given table and writes the standardization table JSON \
                     (default mean_std.json)."
                );
                return;
            }
            _ => {
                eprintln!("Unknown arg: {arg}\n{USAGE}");
                std::process::exit(2);
            }
        }
    }

    let Some(db_path) = db_path else { usage_exit() };
    let Some(table_name) = table_name else { usage_exit() };

    let source = SqliteStatisticsSource::new(&db_path).unwrap_or_else(|e| {
        eprintln!("Failed to open {db_path:?}: {e}");
        std::process::exit(4);
    });

    let mut table = StandardizationTable::new();
    for (key, canonical) in CONTINUOUS_FEATURES {
        let column = &mapping[key];
        let stats = match source.column_statistics(&table_name, column) {
            Ok(stats) => stats,
            Err(e) => {
                eprintln!("Skipping {key} (column {column:?}): {e}");
                continue;
            }
        };

        println!("[{key} -> {canonical}]");
        println!("  column: {column}");
        println!("  mean:   {:.4}", stats.mean);
        println!("  std:    {:.4}", stats.std);
        println!("  count:  {}", stats.count);
        println!("  min:    {:.2}", stats.min);
        println!("  max:    {:.2}", stats.max);

        // An empty column gets identity-ish constants rather than a hole
        // in the table.
        let entry = if stats.count == 0 {
            FeatureStats { mean: 0.0, std: 1.0 }
        } else {
            FeatureStats {
                mean: stats.mean,
                std: stats.std,
            }
        };
        table.insert(canonical, entry);
    }

    if table.is_empty() {
        eprintln!("No statistics could be computed; check the table and column names.");
        std::process::exit(1);
    }

    let json = match serde_json::to_string_pretty(&table) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize table: {e}");
            std::process::exit(4);
        }
    };
    if let Err(e) = std::fs::write(&out_path, json) {
        eprintln!("Failed to write {out_path:?}: {e}");
        std::process::exit(4);
    }

    println!("Wrote standardization table to {:?}", out_path);
}
