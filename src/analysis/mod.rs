pub mod aggregator;


pub use aggregator::{analyze, load_snapshots, snapshot_paths, summarize, summarize_records, write_summary};
