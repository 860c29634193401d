use std::env;
use std::path::{Path, PathBuf};

use litindex_core::{dataset, BatchDriver, OpenMode, Schema};
use litindex_text::{StoreInspector, TantivyBackend};

// Index a JSON / JSON-lines publication dataset into a Tantivy store without the CLI.
// Usage:
//   cargo run -p litindex-text --example index -- [--data ../dev_data/rows.jsonl] [--index ../dev_data/indexes/tantivy] [--append]
// Notes:
//   - Without --append the target index directory is recreated.
//   - Defaults resolve relative to the workspace root so you can run from anywhere.

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_path: Option<PathBuf> = None;
    let mut index_dir: Option<PathBuf> = None;
    let mut mode = OpenMode::Create;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--data" => {
                if i + 1 >= args.len() { eprintln!("--data requires a path"); std::process::exit(2); }
                data_path = Some(PathBuf::from(&args[i + 1]));
                i += 2; continue;
            }
            "--index" => {
                if i + 1 >= args.len() { eprintln!("--index requires a path"); std::process::exit(2); }
                index_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2; continue;
            }
            "--append" => { mode = OpenMode::Append; }
            s if s.starts_with('-') => {
                eprintln!("Unknown flag: {}", s); std::process::exit(2);
            }
            _ => {}
        }
        i += 1;
    }

    let ws_root = Path::new(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap_or(Path::new("."));

    // Precedence: flag > env var > workspace defaults
    let data_path = data_path
        .or_else(|| env::var("LITINDEX_DATA").ok().map(PathBuf::from))
        .unwrap_or_else(|| ws_root.join("dev_data/rows.jsonl"));
    let index_dir = index_dir
        .or_else(|| env::var("LITINDEX_INDEX_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| ws_root.join("dev_data/indexes/tantivy"));

    println!("Tantivy {}\n==============", mode);
    println!("Data     : {}", data_path.display());
    println!("Index dir: {}", index_dir.display());

    let rows = dataset::load(&data_path)?;
    let backend = TantivyBackend::default();
    let report = BatchDriver::new(&backend).run(rows, &Schema::publications(), &index_dir, mode)?;
    print!("{}", report);
    println!("Store now holds {} documents.", StoreInspector::open(&index_dir)?.num_docs());
    Ok(())
}
