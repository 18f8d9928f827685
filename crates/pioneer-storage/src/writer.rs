//! Streaming index writer.
//!
//! Emits the compact single-file JSON layout section by section straight
//! into a large buffered writer, so a multi-gigabyte graph never has to be
//! materialized as one in-memory document. Only strings go through
//! serde_json (for escaping); everything else is written as bare digits.

use pioneer_core::version::INDEX_SCHEMA_VERSION;
use pioneer_core::{PioneerError, SymbolUid};
use pioneer_graph::{build_path_trie, CrossRefGraph};
use std::collections::{HashMap, HashSet};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Buffered-writer capacity; bounds peak writer memory for huge graphs.
const WRITE_BUFFER_CAPACITY: usize = 32 * 1024 * 1024;

/// Serialize a finalized graph to the index file at `path`.
pub fn save(graph: &CrossRefGraph, path: &Path) -> Result<(), PioneerError> {
    let file = std::fs::File::create(path)?;
    let mut w = BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, file);

    // metadata
    write!(w, "{{\"metadata\":{{\"version\":\"{INDEX_SCHEMA_VERSION}\",")?;
    write!(w, "\"num_symbols\":{},", graph.num_symbols())?;
    write!(w, "\"num_functions\":{},", graph.num_functions())?;
    write!(w, "\"num_variables\":{},", graph.num_variables())?;
    write!(w, "\"end_uid\":{},", graph.end_uid())?;
    write!(w, "\"num_files\":{},", graph.num_files())?;

    w.write_all(b"\"UIDs\":{")?;
    let mut first = true;
    for (name, uid) in graph.symbols() {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        serde_json::to_writer(&mut w, name)?;
        write!(w, ":{uid}")?;
    }
    w.write_all(b"}},")?;

    // symbol_types
    w.write_all(b"\"symbol_types\":{")?;
    first = true;
    for (uid, ty) in graph.symbol_types_table() {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write!(w, "\"{uid}\":{}", ty.as_u8())?;
    }
    w.write_all(b"},")?;

    write_edge_section(&mut w, "call_mapping", graph.call_table())?;
    w.write_all(b",")?;
    write_edge_section(&mut w, "data_flow", graph.data_flow_table())?;
    w.write_all(b",")?;

    // file_paths
    w.write_all(b"\"file_paths\":{")?;
    first = true;
    for (file_uid, file_path) in graph.files() {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write!(w, "\"{file_uid}\":")?;
        serde_json::to_writer(&mut w, file_path)?;
    }
    w.write_all(b"},")?;

    // file_symbols
    w.write_all(b"\"file_symbols\":{")?;
    first = true;
    for (file_uid, symbols) in graph.file_symbols_table() {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write!(w, "\"{file_uid}\":[")?;
        let mut first_sym = true;
        for sym in symbols {
            if !first_sym {
                w.write_all(b",")?;
            }
            first_sym = false;
            write!(w, "{sym}")?;
        }
        w.write_all(b"]")?;
    }
    w.write_all(b"},")?;

    // symbol_files
    w.write_all(b"\"symbol_files\":{")?;
    first = true;
    for (symbol_uid, file_uid) in graph.symbol_files_table() {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write!(w, "\"{symbol_uid}\":{file_uid}")?;
    }
    w.write_all(b"},")?;

    // path_trie
    w.write_all(b"\"path_trie\":")?;
    let trie = build_path_trie(graph.files());
    serde_json::to_writer(&mut w, &trie)?;
    w.write_all(b"}")?;

    w.flush()?;
    Ok(())
}

fn write_edge_section<W: Write>(
    w: &mut W,
    name: &str,
    table: &HashMap<SymbolUid, HashSet<SymbolUid>>,
) -> Result<(), PioneerError> {
    write!(w, "\"{name}\":{{")?;
    let mut first = true;
    for (src, dsts) in table {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write!(w, "\"{src}\":[")?;
        let mut first_dst = true;
        for dst in dsts {
            if !first_dst {
                w.write_all(b",")?;
            }
            first_dst = false;
            write!(w, "{dst}")?;
        }
        w.write_all(b"]")?;
    }
    w.write_all(b"}")?;
    Ok(())
}
