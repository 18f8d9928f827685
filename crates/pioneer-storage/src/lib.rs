//! pioneer-storage: Persistence for the cross-reference graph.
//!
//! - **writer** — compact streaming serialization of a finalized graph
//! - **reader** — event-driven loader with `Full` / `WithPaths` /
//!   `SymbolsOnly` load modes and schema-version checking
//! - **streaming** — read-only queries that stop parsing as soon as their
//!   region of the file has been consumed

mod reader;
mod streaming;
mod writer;

pub use reader::{load, LoadMode};
pub use streaming::{stream_all_symbols, stream_file_paths, stream_search_symbols};
pub use writer::save;
