//! pioneer-graph: UID-keyed cross-reference graph.
//!
//! Owns the symbol and file UID tables, two string pools, the four
//! adjacency maps (call and data-flow, forward and reverse), and file
//! provenance. Build-time mutable under a single writer, then `finalize`d
//! (END sink allocated, leaves closed, containers compacted) and treated as
//! read-only from that point on.

mod trie;

pub use trie::{build_path_trie, PathNode};

use pioneer_core::{FileUid, StringPool, SymbolType, SymbolUid, INVALID_UID};
use std::collections::{HashMap, HashSet};

/// Qualified name of the synthetic sink every leaf function is wired to.
pub const END_SYMBOL_NAME: &str = "END";

/// The cross-reference graph.
#[derive(Debug)]
pub struct CrossRefGraph {
    symbol_pool: StringPool,
    path_pool: StringPool,

    name_to_uid: HashMap<String, SymbolUid>,
    uid_to_name_idx: HashMap<SymbolUid, u32>,
    symbol_types: HashMap<SymbolUid, SymbolType>,

    symbol_to_file: HashMap<SymbolUid, FileUid>,
    file_to_symbols: HashMap<FileUid, Vec<SymbolUid>>,
    path_to_uid: HashMap<String, FileUid>,
    file_uid_to_path_idx: HashMap<FileUid, u32>,

    call_fwd: HashMap<SymbolUid, HashSet<SymbolUid>>,
    call_rev: HashMap<SymbolUid, HashSet<SymbolUid>>,
    flow_fwd: HashMap<SymbolUid, HashSet<SymbolUid>>,
    flow_rev: HashMap<SymbolUid, HashSet<SymbolUid>>,

    next_uid: SymbolUid,
    next_file_uid: FileUid,
    end_uid: SymbolUid,

    // Returned by adjacency getters on lookup miss so callers can hold
    // iterators into the graph without an Option dance.
    empty_edges: HashSet<SymbolUid>,
}

impl Default for CrossRefGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossRefGraph {
    pub fn new() -> Self {
        Self {
            symbol_pool: StringPool::new(),
            path_pool: StringPool::new(),
            name_to_uid: HashMap::new(),
            uid_to_name_idx: HashMap::new(),
            symbol_types: HashMap::new(),
            symbol_to_file: HashMap::new(),
            file_to_symbols: HashMap::new(),
            path_to_uid: HashMap::new(),
            file_uid_to_path_idx: HashMap::new(),
            call_fwd: HashMap::new(),
            call_rev: HashMap::new(),
            flow_fwd: HashMap::new(),
            flow_rev: HashMap::new(),
            next_uid: 1,
            next_file_uid: 1,
            end_uid: INVALID_UID,
            empty_edges: HashSet::new(),
        }
    }

    // ── Build Operations ────────────────────────────────────────────────

    /// Add a symbol, assigning a fresh UID on first insert.
    ///
    /// Idempotent on the name: a repeated call returns the existing UID.
    /// The type argument always overwrites the stored type (last write
    /// wins), matching how call sites upgrade a placeholder `Function` to
    /// `Variable` on discovering a definition.
    pub fn add_symbol(&mut self, qualified_name: &str, ty: SymbolType) -> SymbolUid {
        let uid = self.get_or_create_uid(qualified_name);
        self.symbol_types.insert(uid, ty);
        uid
    }

    /// Add a symbol and record which file defines it. File provenance is
    /// first-write-wins: a later attachment with a different path is
    /// ignored.
    pub fn add_symbol_in_file(
        &mut self,
        qualified_name: &str,
        filepath: &str,
        ty: SymbolType,
    ) -> SymbolUid {
        let uid = self.add_symbol(qualified_name, ty);
        if !self.symbol_to_file.contains_key(&uid) {
            let file_uid = self.get_or_create_file_uid(filepath);
            self.symbol_to_file.insert(uid, file_uid);
            self.file_to_symbols.entry(file_uid).or_default().push(uid);
        }
        uid
    }

    fn get_or_create_uid(&mut self, qualified_name: &str) -> SymbolUid {
        if let Some(&uid) = self.name_to_uid.get(qualified_name) {
            return uid;
        }
        let uid = self.next_uid;
        self.next_uid += 1;
        let name_idx = self.symbol_pool.intern(qualified_name);
        self.name_to_uid.insert(qualified_name.to_string(), uid);
        self.uid_to_name_idx.insert(uid, name_idx);
        uid
    }

    /// Idempotent file registration in the file UID namespace.
    pub fn get_or_create_file_uid(&mut self, filepath: &str) -> FileUid {
        if let Some(&file_uid) = self.path_to_uid.get(filepath) {
            return file_uid;
        }
        let file_uid = self.next_file_uid;
        self.next_file_uid += 1;
        let path_idx = self.path_pool.intern(filepath);
        self.path_to_uid.insert(filepath.to_string(), file_uid);
        self.file_uid_to_path_idx.insert(file_uid, path_idx);
        file_uid
    }

    /// Insert a call edge into both adjacency directions. Set semantics:
    /// repeated insertion of the same edge is a no-op. Callers must not be
    /// the END sink.
    pub fn add_call(&mut self, caller: SymbolUid, callee: SymbolUid) {
        self.call_fwd.entry(caller).or_default().insert(callee);
        self.call_rev.entry(callee).or_default().insert(caller);
    }

    /// Insert a data-flow edge `source -> variable` into both directions.
    pub fn add_data_flow(&mut self, source: SymbolUid, variable: SymbolUid) {
        self.flow_fwd.entry(source).or_default().insert(variable);
        self.flow_rev.entry(variable).or_default().insert(source);
    }

    /// One-shot transition from build to read.
    ///
    /// Allocates the END sink, wires every function with no outgoing calls
    /// to it, and compacts containers. The graph is treated as read-only
    /// afterwards.
    pub fn finalize(&mut self) {
        let end = self.get_or_create_uid(END_SYMBOL_NAME);
        self.symbol_types.insert(end, SymbolType::End);
        self.end_uid = end;

        let leaves: Vec<SymbolUid> = self
            .symbol_types
            .iter()
            .filter(|(uid, ty)| {
                **ty == SymbolType::Function
                    && self.call_fwd.get(*uid).is_none_or(HashSet::is_empty)
            })
            .map(|(&uid, _)| uid)
            .collect();
        for leaf in leaves {
            self.add_call(leaf, end);
        }

        self.shrink_to_fit();
    }

    pub fn shrink_to_fit(&mut self) {
        self.symbol_pool.shrink_to_fit();
        self.path_pool.shrink_to_fit();
        self.name_to_uid.shrink_to_fit();
        self.uid_to_name_idx.shrink_to_fit();
        self.symbol_types.shrink_to_fit();
        self.symbol_to_file.shrink_to_fit();
        self.file_to_symbols.shrink_to_fit();
        self.path_to_uid.shrink_to_fit();
        self.file_uid_to_path_idx.shrink_to_fit();
        self.call_fwd.shrink_to_fit();
        self.call_rev.shrink_to_fit();
        self.flow_fwd.shrink_to_fit();
        self.flow_rev.shrink_to_fit();
    }

    // ── Loader Operations ───────────────────────────────────────────────
    //
    // Used by the index loader to reconstruct a persisted graph. UIDs come
    // from the file, so the next-UID counters track the observed maximum.

    pub fn insert_symbol_raw(&mut self, qualified_name: &str, uid: SymbolUid) {
        let name_idx = self.symbol_pool.intern(qualified_name);
        self.name_to_uid.insert(qualified_name.to_string(), uid);
        self.uid_to_name_idx.insert(uid, name_idx);
        if uid >= self.next_uid {
            self.next_uid = uid + 1;
        }
    }

    pub fn set_symbol_type(&mut self, uid: SymbolUid, ty: SymbolType) {
        self.symbol_types.insert(uid, ty);
    }

    pub fn set_end_uid(&mut self, uid: SymbolUid) {
        self.end_uid = uid;
    }

    pub fn insert_file_raw(&mut self, file_uid: FileUid, path: &str) {
        let path_idx = self.path_pool.intern(path);
        self.file_uid_to_path_idx.insert(file_uid, path_idx);
        self.path_to_uid.insert(path.to_string(), file_uid);
        if file_uid >= self.next_file_uid {
            self.next_file_uid = file_uid + 1;
        }
    }

    pub fn set_symbol_file(&mut self, symbol_uid: SymbolUid, file_uid: FileUid) {
        self.symbol_to_file.insert(symbol_uid, file_uid);
    }

    pub fn set_file_symbols(&mut self, file_uid: FileUid, symbols: Vec<SymbolUid>) {
        self.file_to_symbols.insert(file_uid, symbols);
    }

    // ── Read Operations ─────────────────────────────────────────────────
    //
    // All total: lookup misses yield `INVALID_UID`, an empty string, or an
    // empty set. None fail.

    pub fn get_uid(&self, qualified_name: &str) -> SymbolUid {
        self.name_to_uid
            .get(qualified_name)
            .copied()
            .unwrap_or(INVALID_UID)
    }

    pub fn get_symbol(&self, uid: SymbolUid) -> &str {
        self.uid_to_name_idx
            .get(&uid)
            .map_or("", |&idx| self.symbol_pool.get(idx))
    }

    pub fn get_type(&self, uid: SymbolUid) -> SymbolType {
        self.symbol_types
            .get(&uid)
            .copied()
            .unwrap_or(SymbolType::Function)
    }

    pub fn is_variable(&self, uid: SymbolUid) -> bool {
        self.get_type(uid) == SymbolType::Variable
    }

    pub fn has_symbol(&self, qualified_name: &str) -> bool {
        self.name_to_uid.contains_key(qualified_name)
    }

    pub fn get_callees(&self, caller: SymbolUid) -> &HashSet<SymbolUid> {
        self.call_fwd.get(&caller).unwrap_or(&self.empty_edges)
    }

    pub fn get_callers(&self, callee: SymbolUid) -> &HashSet<SymbolUid> {
        self.call_rev.get(&callee).unwrap_or(&self.empty_edges)
    }

    /// What a variable is assigned from.
    pub fn get_data_sources(&self, variable: SymbolUid) -> &HashSet<SymbolUid> {
        self.flow_rev.get(&variable).unwrap_or(&self.empty_edges)
    }

    /// What variables a source flows into.
    pub fn get_data_sinks(&self, source: SymbolUid) -> &HashSet<SymbolUid> {
        self.flow_fwd.get(&source).unwrap_or(&self.empty_edges)
    }

    pub fn end_uid(&self) -> SymbolUid {
        self.end_uid
    }

    pub fn get_file_path(&self, file_uid: FileUid) -> &str {
        self.file_uid_to_path_idx
            .get(&file_uid)
            .map_or("", |&idx| self.path_pool.get(idx))
    }

    pub fn get_symbol_file_uid(&self, symbol_uid: SymbolUid) -> FileUid {
        self.symbol_to_file
            .get(&symbol_uid)
            .copied()
            .unwrap_or(INVALID_UID)
    }

    /// Symbols defined in a file, in insertion order.
    pub fn get_file_symbols(&self, file_uid: FileUid) -> &[SymbolUid] {
        self.file_to_symbols
            .get(&file_uid)
            .map_or(&[], Vec::as_slice)
    }

    /// Iterate `(qualified_name, uid)` over all live symbols. Order is
    /// unspecified but stable for one graph instance.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, SymbolUid)> {
        self.name_to_uid.iter().map(|(name, &uid)| (name.as_str(), uid))
    }

    /// Iterate `(file_uid, path)` over all indexed files.
    pub fn files(&self) -> impl Iterator<Item = (FileUid, &str)> {
        self.file_uid_to_path_idx
            .iter()
            .map(|(&uid, &idx)| (uid, self.path_pool.get(idx)))
    }

    // ── Counts ──────────────────────────────────────────────────────────

    /// Number of symbols, excluding the synthetic END sink.
    pub fn num_symbols(&self) -> usize {
        let end = usize::from(self.end_uid != INVALID_UID);
        self.name_to_uid.len() - end
    }

    pub fn num_functions(&self) -> usize {
        self.symbol_types
            .values()
            .filter(|ty| **ty == SymbolType::Function)
            .count()
    }

    pub fn num_variables(&self) -> usize {
        self.symbol_types
            .values()
            .filter(|ty| **ty == SymbolType::Variable)
            .count()
    }

    pub fn num_files(&self) -> usize {
        self.file_uid_to_path_idx.len()
    }

    // ── Table Accessors (persistence) ───────────────────────────────────

    pub fn symbol_types_table(&self) -> &HashMap<SymbolUid, SymbolType> {
        &self.symbol_types
    }

    pub fn call_table(&self) -> &HashMap<SymbolUid, HashSet<SymbolUid>> {
        &self.call_fwd
    }

    pub fn data_flow_table(&self) -> &HashMap<SymbolUid, HashSet<SymbolUid>> {
        &self.flow_fwd
    }

    pub fn file_symbols_table(&self) -> &HashMap<FileUid, Vec<SymbolUid>> {
        &self.file_to_symbols
    }

    pub fn symbol_files_table(&self) -> &HashMap<SymbolUid, FileUid> {
        &self.symbol_to_file
    }
}
