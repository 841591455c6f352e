//! Demo host — feeds table rows, configuration, and a persisted snapshot
//! into the navigator engine, and logs persistence requests.

use std::io::{IsTerminal, Read};

use serde_json::{json, Value};

fn main() {
    let mut headless = false;
    let mut rows_path = None;
    let mut snapshot_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => headless = true,
            "--restore" => snapshot_path = args.next(),
            other => rows_path = Some(other.to_string()),
        }
    }

    let rows = load_rows(rows_path.as_deref()).unwrap_or_else(sample_rows);
    let snapshot = snapshot_path.and_then(|path| {
        let contents = std::fs::read_to_string(&path)
            .map_err(|err| eprintln!("Failed to read {}: {}", path, err))
            .ok()?;
        serde_json::from_str(&contents)
            .map_err(|err| eprintln!("Failed to parse {}: {}", path, err))
            .ok()
    });

    netnav::run(netnav::RunOptions { headless, rows, config: None, snapshot });
}

/// Rows from a file argument, or from stdin when piped. Expects a JSON array
/// of row objects with `source`/`target` columns.
fn load_rows(path: Option<&str>) -> Option<Vec<Value>> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| eprintln!("Failed to read {}: {}", path, err))
            .ok()?,
        None => {
            if std::io::stdin().is_terminal() {
                return None;
            }
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).ok()?;
            buf
        }
    };
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Vec<Value>>(trimmed) {
        Ok(rows) => Some(rows),
        Err(err) => {
            eprintln!("Failed to parse rows as a JSON array: {}", err);
            None
        }
    }
}

/// A small service-dependency table so `cargo run` shows a live graph.
fn sample_rows() -> Vec<Value> {
    vec![
        json!({ "source": "gateway", "target": "auth", "weight": 3.0 }),
        json!({ "source": "gateway", "target": "catalog", "weight": 2.0 }),
        json!({ "source": "catalog", "target": "db-primary", "weight": 4.0 }),
        json!({ "source": "auth", "target": "db-primary" }),
        json!({ "source": "catalog", "target": "cache" }),
        json!({ "source": "billing", "target": "db-primary", "weight": 2.0 }),
        json!({ "source": "gateway", "target": "billing" }),
        json!({ "source": "reports", "target": "db-replica" }),
        json!({ "source": "db-primary", "target": "db-replica", "weight": 5.0 }),
    ]
}
