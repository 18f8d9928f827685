//! Event-driven index loader.
//!
//! The on-disk index is walked by a family of `DeserializeSeed` visitors
//! that dispatch per top-level section and insert straight into the graph.
//! Sections excluded by the load mode are consumed as `IgnoredAny`, so a
//! `SymbolsOnly` load of a multi-gigabyte index never materializes an edge
//! list. The schema check fires on `metadata.version` and aborts the parse
//! before anything else is read.

use pioneer_core::version::{is_schema_compatible, min_compat_version, parse_version};
use pioneer_core::{PioneerError, SymbolType};
use pioneer_graph::CrossRefGraph;
use serde::de::{DeserializeSeed, Error as DeError, IgnoredAny, MapAccess, Visitor};
use std::fmt;
use std::io::BufReader;
use std::path::Path;

/// Which sections of the persisted index are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Everything except `path_trie`.
    Full,
    /// Symbols, types, and the file tables; no edges.
    WithPaths,
    /// Symbol names, UIDs, and types only.
    SymbolsOnly,
}

impl LoadMode {
    fn loads_edges(self) -> bool {
        matches!(self, LoadMode::Full)
    }

    fn loads_files(self) -> bool {
        matches!(self, LoadMode::Full | LoadMode::WithPaths)
    }
}

struct LoadState {
    graph: CrossRefGraph,
    mode: LoadMode,
    /// Typed error squirreled away when the parse is aborted on purpose.
    schema_error: Option<PioneerError>,
}

/// Load the index file at `path`, materializing the sections the mode asks
/// for. A missing file is reported as `IndexMissing`; an incompatible
/// schema as `SchemaIncompatible`; anything structurally wrong as
/// `IndexParse`.
pub fn load(path: &Path, mode: LoadMode) -> Result<CrossRefGraph, PioneerError> {
    let file = open_index(path)?;
    let mut state = LoadState {
        graph: CrossRefGraph::new(),
        mode,
        schema_error: None,
    };

    let mut de = serde_json::Deserializer::from_reader(BufReader::new(file));
    match (RootSeed { state: &mut state }).deserialize(&mut de) {
        Ok(()) => {
            state.graph.shrink_to_fit();
            Ok(state.graph)
        }
        Err(err) => Err(state
            .schema_error
            .take()
            .unwrap_or_else(|| PioneerError::IndexParse(err.to_string()))),
    }
}

pub(crate) fn open_index(path: &Path) -> Result<std::fs::File, PioneerError> {
    match std::fs::File::open(path) {
        Ok(file) => Ok(file),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(PioneerError::IndexMissing(path.display().to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn parse_uid_key<E: DeError>(key: &str) -> Result<u64, E> {
    key.parse()
        .map_err(|_| E::custom(format!("invalid UID key: {key:?}")))
}

// ── Root ────────────────────────────────────────────────────────────────

struct RootSeed<'a> {
    state: &'a mut LoadState,
}

impl<'de> DeserializeSeed<'de> for RootSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for RootSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an index object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            let state = &mut *self.state;
            match key.as_str() {
                "metadata" => map.next_value_seed(MetadataSeed { state })?,
                "symbol_types" => map.next_value_seed(SymbolTypesSeed { state })?,
                "call_mapping" if state.mode.loads_edges() => {
                    map.next_value_seed(EdgeSeed {
                        state,
                        kind: EdgeKind::Call,
                    })?;
                }
                "data_flow" if state.mode.loads_edges() => {
                    map.next_value_seed(EdgeSeed {
                        state,
                        kind: EdgeKind::DataFlow,
                    })?;
                }
                "file_paths" if state.mode.loads_files() => {
                    map.next_value_seed(FilePathsSeed { state })?;
                }
                "file_symbols" if state.mode.loads_files() => {
                    map.next_value_seed(FileSymbolsSeed { state })?;
                }
                "symbol_files" if state.mode.loads_files() => {
                    map.next_value_seed(SymbolFilesSeed { state })?;
                }
                // path_trie is never materialized; skipped sections and
                // unknown keys are consumed without building values.
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

// ── metadata ────────────────────────────────────────────────────────────

struct MetadataSeed<'a> {
    state: &'a mut LoadState,
}

impl<'de> DeserializeSeed<'de> for MetadataSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for MetadataSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an index metadata object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "version" => {
                    let version: String = map.next_value()?;
                    if let Some((major, minor, _)) = parse_version(&version) {
                        if !is_schema_compatible(major, minor) {
                            self.state.schema_error = Some(PioneerError::SchemaIncompatible {
                                found: version,
                                required: min_compat_version(),
                            });
                            return Err(A::Error::custom("incompatible index schema"));
                        }
                    }
                }
                "end_uid" => {
                    let end_uid: u64 = map.next_value()?;
                    self.state.graph.set_end_uid(end_uid);
                }
                "UIDs" => {
                    map.next_value_seed(UidsSeed {
                        state: &mut *self.state,
                    })?;
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

struct UidsSeed<'a> {
    state: &'a mut LoadState,
}

impl<'de> DeserializeSeed<'de> for UidsSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for UidsSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a name-to-UID map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some((name, uid)) = map.next_entry::<String, u64>()? {
            self.state.graph.insert_symbol_raw(&name, uid);
        }
        Ok(())
    }
}

// ── symbol_types ────────────────────────────────────────────────────────

struct SymbolTypesSeed<'a> {
    state: &'a mut LoadState,
}

impl<'de> DeserializeSeed<'de> for SymbolTypesSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for SymbolTypesSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a UID-to-type map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some((key, ty)) = map.next_entry::<String, u8>()? {
            let uid = parse_uid_key(&key)?;
            self.state.graph.set_symbol_type(uid, SymbolType::from_u8(ty));
        }
        Ok(())
    }
}

// ── call_mapping / data_flow ────────────────────────────────────────────

enum EdgeKind {
    Call,
    DataFlow,
}

struct EdgeSeed<'a> {
    state: &'a mut LoadState,
    kind: EdgeKind,
}

impl<'de> DeserializeSeed<'de> for EdgeSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for EdgeSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an adjacency map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some((key, targets)) = map.next_entry::<String, Vec<u64>>()? {
            let src = parse_uid_key(&key)?;
            for target in targets {
                match self.kind {
                    EdgeKind::Call => self.state.graph.add_call(src, target),
                    EdgeKind::DataFlow => self.state.graph.add_data_flow(src, target),
                }
            }
        }
        Ok(())
    }
}

// ── file tables ─────────────────────────────────────────────────────────

struct FilePathsSeed<'a> {
    state: &'a mut LoadState,
}

impl<'de> DeserializeSeed<'de> for FilePathsSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for FilePathsSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a file-UID-to-path map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some((key, path)) = map.next_entry::<String, String>()? {
            let file_uid = parse_uid_key(&key)?;
            self.state.graph.insert_file_raw(file_uid, &path);
        }
        Ok(())
    }
}

struct FileSymbolsSeed<'a> {
    state: &'a mut LoadState,
}

impl<'de> DeserializeSeed<'de> for FileSymbolsSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for FileSymbolsSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a file-UID-to-symbols map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some((key, symbols)) = map.next_entry::<String, Vec<u64>>()? {
            let file_uid = parse_uid_key(&key)?;
            self.state.graph.set_file_symbols(file_uid, symbols);
        }
        Ok(())
    }
}

struct SymbolFilesSeed<'a> {
    state: &'a mut LoadState,
}

impl<'de> DeserializeSeed<'de> for SymbolFilesSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for SymbolFilesSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a symbol-UID-to-file map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some((key, file_uid)) = map.next_entry::<String, u64>()? {
            let symbol_uid = parse_uid_key(&key)?;
            self.state.graph.set_symbol_file(symbol_uid, file_uid);
        }
        Ok(())
    }
}
