//! pioneer-index: Tree-sitter based extraction and the indexing pipeline.
//!
//! # Architecture
//!
//! - **extractor** — trait for per-language extraction of function
//!   definitions, call sites, and variable assignments
//! - **languages** — Python, C, and C++ extractors
//! - **parser** — per-worker parsing coordinator producing flat records
//! - **indexer** — discovery walk, batched parallel extraction, graph
//!   population, finalization

pub mod extractor;
pub mod indexer;
pub mod languages;
pub mod parser;
pub mod record;

pub use extractor::{FunctionCall, FunctionDef, LanguageExtractor, VariableDef};
pub use indexer::{IndexStats, Indexer, IndexerConfig};
pub use parser::{ParsedFile, SourceParser};
pub use record::{CallRecord, FunctionRecord, VariableRecord};
