//! The batched indexing pipeline.
//!
//! Discovery walks the root once and sorts the file list; the list is then
//! processed in batches. Each batch is parsed by N workers over contiguous
//! slices, move-appending thread-local record buffers into shared
//! accumulators, and populated into the graph single-threaded before the
//! next batch starts, so peak memory is bounded by one batch.

use crate::parser::SourceParser;
use crate::record::{CallRecord, FunctionRecord, VariableRecord};
use ignore::WalkBuilder;
use pioneer_core::{short_name, Language, PioneerConfig, PioneerError, SymbolType};
use pioneer_graph::CrossRefGraph;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// Thread-local flush thresholds; keep lock acquisitions rare.
const FUNCTIONS_FLUSH: usize = 10_000;
const CALLS_FLUSH: usize = 50_000;
const VARIABLES_FLUSH: usize = 20_000;

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub root: PathBuf,
    /// Worker threads; `0` auto-detects (hardware concurrency, fallback 4).
    pub threads: usize,
    /// Directory names skipped during discovery.
    pub ignore_patterns: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            threads: 0,
            ignore_patterns: PioneerConfig::default().ignore_patterns,
        }
    }
}

/// Counters updated by parse workers with atomic increments.
#[derive(Debug, Default)]
pub struct IndexStats {
    pub files_indexed: AtomicUsize,
    pub functions_found: AtomicUsize,
    pub calls_found: AtomicUsize,
    pub variables_found: AtomicUsize,
}

/// The indexing pipeline: discover, extract in parallel, populate, finalize.
pub struct Indexer {
    config: IndexerConfig,
    threads: usize,
    stats: IndexStats,
    indexed_files: Vec<String>,
}

impl Indexer {
    pub fn new(config: IndexerConfig) -> Self {
        let threads = if config.threads == 0 {
            std::thread::available_parallelism().map_or(4, usize::from)
        } else {
            config.threads
        };
        Self {
            config,
            threads,
            stats: IndexStats::default(),
            indexed_files: Vec::new(),
        }
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Files covered by the last `index` run, in discovery order.
    pub fn indexed_files(&self) -> &[String] {
        &self.indexed_files
    }

    /// Run the full pipeline and return the finalized graph.
    pub fn index(&mut self) -> Result<CrossRefGraph, PioneerError> {
        let files = self.discover_files();
        let mut graph = CrossRefGraph::new();

        if files.is_empty() {
            tracing::info!("no source files found under {}", self.config.root.display());
            graph.finalize();
            return Ok(graph);
        }

        tracing::info!(
            "indexing {} source files with {} threads",
            files.len(),
            self.threads
        );

        // Short-name lookup for callee resolution; first writer wins,
        // persists across batches.
        let mut short_names: HashMap<String, String> = HashMap::new();

        let batch = batch_size(files.len());
        for chunk in files.chunks(batch) {
            let (functions, calls, variables) = self.extract_batch(chunk);
            populate_batch(&mut graph, functions, calls, variables, &mut short_names);
        }

        self.indexed_files = files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        graph.finalize();

        tracing::info!(
            files = self.stats.files_indexed.load(Ordering::Relaxed),
            functions = self.stats.functions_found.load(Ordering::Relaxed),
            calls = self.stats.calls_found.load(Ordering::Relaxed),
            variables = self.stats.variables_found.load(Ordering::Relaxed),
            symbols = graph.num_symbols(),
            "indexing complete"
        );

        Ok(graph)
    }

    /// Phase 1: walk the root and collect supported source files, sorted.
    ///
    /// Skips any entry whose name starts with `.` or equals one of the
    /// ignore patterns.
    fn discover_files(&self) -> Vec<PathBuf> {
        let patterns = self.config.ignore_patterns.clone();
        let walker = WalkBuilder::new(&self.config.root)
            .standard_filters(false)
            .hidden(true)
            .filter_entry(move |entry| {
                let name = entry.file_name().to_string_lossy();
                !patterns.iter().any(|p| p.as_str() == name)
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("walk error: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.into_path();
            let known = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Language::from_extension)
                .is_some();
            if known {
                files.push(path);
            }
        }

        files.sort();
        files
    }

    /// Phase 2: parse one batch with worker threads over contiguous slices.
    fn extract_batch(
        &self,
        batch: &[PathBuf],
    ) -> (Vec<FunctionRecord>, Vec<CallRecord>, Vec<VariableRecord>) {
        let functions = Mutex::new(Vec::new());
        let calls = Mutex::new(Vec::new());
        let variables = Mutex::new(Vec::new());

        let per_worker = batch.len().div_ceil(self.threads).max(1);
        std::thread::scope(|scope| {
            let (functions, calls, variables) = (&functions, &calls, &variables);
            for slice in batch.chunks(per_worker) {
                scope.spawn(move || self.parse_worker(slice, functions, calls, variables));
            }
        });

        (
            functions.into_inner().expect("accumulator mutex poisoned"),
            calls.into_inner().expect("accumulator mutex poisoned"),
            variables.into_inner().expect("accumulator mutex poisoned"),
        )
    }

    fn parse_worker(
        &self,
        files: &[PathBuf],
        functions: &Mutex<Vec<FunctionRecord>>,
        calls: &Mutex<Vec<CallRecord>>,
        variables: &Mutex<Vec<VariableRecord>>,
    ) {
        let parser = SourceParser::new();
        let mut local_functions: Vec<FunctionRecord> = Vec::with_capacity(1024);
        let mut local_calls: Vec<CallRecord> = Vec::with_capacity(4096);
        let mut local_variables: Vec<VariableRecord> = Vec::with_capacity(2048);

        for path in files {
            let content = match std::fs::read(path) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!("failed to read {}: {err}", path.display());
                    continue;
                }
            };

            let path_str = path.to_string_lossy();
            match parser.parse_file(&path_str, &content) {
                Some(mut parsed) => {
                    self.stats.files_indexed.fetch_add(1, Ordering::Relaxed);
                    self.stats
                        .functions_found
                        .fetch_add(parsed.functions.len(), Ordering::Relaxed);
                    self.stats
                        .calls_found
                        .fetch_add(parsed.calls.len(), Ordering::Relaxed);
                    self.stats
                        .variables_found
                        .fetch_add(parsed.variables.len(), Ordering::Relaxed);
                    tracing::debug!("parsed {}", path.display());

                    local_functions.append(&mut parsed.functions);
                    local_calls.append(&mut parsed.calls);
                    local_variables.append(&mut parsed.variables);
                }
                None => {
                    tracing::warn!("failed to parse {}", path.display());
                }
            }

            if local_functions.len() > FUNCTIONS_FLUSH {
                flush(functions, &mut local_functions);
            }
            if local_calls.len() > CALLS_FLUSH {
                flush(calls, &mut local_calls);
            }
            if local_variables.len() > VARIABLES_FLUSH {
                flush(variables, &mut local_variables);
            }
        }

        flush(functions, &mut local_functions);
        flush(calls, &mut local_calls);
        flush(variables, &mut local_variables);
    }
}

/// Move-append a thread-local buffer into a shared accumulator.
fn flush<T>(shared: &Mutex<Vec<T>>, local: &mut Vec<T>) {
    if local.is_empty() {
        return;
    }
    shared
        .lock()
        .expect("accumulator mutex poisoned")
        .append(local);
}

/// Batch size by total file count.
fn batch_size(total_files: usize) -> usize {
    if total_files > 50_000 {
        2_000
    } else if total_files > 10_000 {
        5_000
    } else {
        10_000
    }
}

/// Phase 3: single-threaded graph population for one batch.
fn populate_batch(
    graph: &mut CrossRefGraph,
    functions: Vec<FunctionRecord>,
    calls: Vec<CallRecord>,
    variables: Vec<VariableRecord>,
    short_names: &mut HashMap<String, String>,
) {
    // Overload detection: definitions sharing a qualified name get a
    // parameter-type signature appended.
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for func in &functions {
        *occurrences.entry(func.qualified_name.as_str()).or_insert(0) += 1;
    }

    for func in &functions {
        let final_name = if occurrences[func.qualified_name.as_str()] > 1 {
            format!(
                "{}{}",
                func.qualified_name,
                param_signature(&func.param_types)
            )
        } else {
            func.qualified_name.clone()
        };

        graph.add_symbol_in_file(&final_name, &func.file_path, SymbolType::Function);
        short_names
            .entry(short_name(&func.qualified_name).to_string())
            .or_insert(final_name);
    }

    // Callee resolution is purely textual: a call whose short name matches
    // a defined function binds to the first-registered qualified name,
    // anything else stays as written and becomes a synthetic symbol.
    for call in &calls {
        let callee = short_names
            .get(short_name(&call.callee_name))
            .cloned()
            .unwrap_or_else(|| call.callee_name.clone());

        if !graph.has_symbol(&call.caller_name) {
            graph.add_symbol(&call.caller_name, SymbolType::Function);
        }
        if !graph.has_symbol(&callee) {
            graph.add_symbol(&callee, SymbolType::Function);
        }
        let caller_uid = graph.get_uid(&call.caller_name);
        let callee_uid = graph.get_uid(&callee);
        graph.add_call(caller_uid, callee_uid);
    }

    for var in &variables {
        let var_uid = graph.add_symbol(&var.qualified_name, SymbolType::Variable);
        if var.value_source.is_empty() {
            continue;
        }

        let source = if var.from_function_call {
            short_names
                .get(short_name(&var.value_source))
                .cloned()
                .unwrap_or_else(|| var.value_source.clone())
        } else {
            var.value_source.clone()
        };

        if !graph.has_symbol(&source) {
            let ty = if var.from_function_call {
                SymbolType::Function
            } else {
                SymbolType::Variable
            };
            graph.add_symbol(&source, ty);
        }
        let source_uid = graph.get_uid(&source);
        graph.add_data_flow(source_uid, var_uid);
    }
}

/// Build an overload signature like `"(int, char)"` from parameter type
/// texts: `const` qualifiers dropped, whitespace normalized.
fn param_signature(param_types: &[String]) -> String {
    if param_types.is_empty() {
        return "()".to_string();
    }
    let cleaned: Vec<String> = param_types
        .iter()
        .map(|ty| {
            let without_const: Vec<&str> = ty
                .split_whitespace()
                .filter(|word| *word != "const")
                .collect();
            without_const.join(" ")
        })
        .collect();
    format!("({})", cleaned.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pioneer_core::INVALID_UID;
    use std::fs;
    use std::path::Path;

    fn write_tree(dir: &Path, files: &[(&str, &str)]) {
        let _ = fs::remove_dir_all(dir);
        for (rel, content) in files {
            let path = dir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn index_dir(dir: &Path) -> CrossRefGraph {
        let mut indexer = Indexer::new(IndexerConfig {
            root: dir.to_path_buf(),
            threads: 2,
            ..IndexerConfig::default()
        });
        indexer.index().expect("indexing should succeed")
    }

    #[test]
    fn batch_size_thresholds() {
        assert_eq!(batch_size(100), 10_000);
        assert_eq!(batch_size(10_001), 5_000);
        assert_eq!(batch_size(50_001), 2_000);
    }

    #[test]
    fn param_signature_normalizes_types() {
        assert_eq!(param_signature(&[]), "()");
        assert_eq!(
            param_signature(&["int".to_string(), "char *".to_string()]),
            "(int, char *)"
        );
        assert_eq!(
            param_signature(&["const  char".to_string(), " unsigned   long ".to_string()]),
            "(char, unsigned long)"
        );
    }

    #[test]
    fn trivial_call_chain_across_files() {
        let dir = std::env::temp_dir().join("pioneer_index_chain");
        write_tree(
            &dir,
            &[("a.c", "void a(void){ b(); }\n"), ("b.c", "void b(void){}\n")],
        );
        let graph = index_dir(&dir);

        let a = graph.get_uid("a.c::a");
        let b = graph.get_uid("b.c::b");
        assert_ne!(a, INVALID_UID);
        assert_ne!(b, INVALID_UID);
        assert!(graph.get_callees(a).contains(&b), "a should call b");
        assert!(graph.get_callers(b).contains(&a));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn leaf_functions_are_wired_to_end() {
        let dir = std::env::temp_dir().join("pioneer_index_end");
        write_tree(
            &dir,
            &[("main.c", "void leaf(void){}\nvoid caller(void){ leaf(); }\n")],
        );
        let graph = index_dir(&dir);

        let leaf = graph.get_uid("main.c::leaf");
        let end = graph.end_uid();
        assert!(graph.get_callees(leaf).contains(&end));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn python_data_flow_edge() {
        let dir = std::env::temp_dir().join("pioneer_index_dataflow");
        write_tree(
            &dir,
            &[("m.py", "def make():\n    return 1\n\ndef use():\n    x = make()\n")],
        );
        let graph = index_dir(&dir);

        let make = graph.get_uid("make");
        let var = graph.get_uid("use.x");
        assert_ne!(make, INVALID_UID);
        assert_ne!(var, INVALID_UID);
        assert!(graph.is_variable(var));
        assert!(graph.get_data_sources(var).contains(&make));
        assert!(graph.get_data_sinks(make).contains(&var));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn hidden_and_ignored_directories_are_skipped() {
        let dir = std::env::temp_dir().join("pioneer_index_ignore");
        write_tree(
            &dir,
            &[
                ("src/ok.c", "void ok(void){}\n"),
                (".hidden/skip.c", "void hidden_fn(void){}\n"),
                ("build/skip.c", "void built_fn(void){}\n"),
                ("notes.txt", "not source\n"),
            ],
        );
        let graph = index_dir(&dir);

        assert_ne!(graph.get_uid("ok.c::ok"), INVALID_UID);
        assert_eq!(graph.get_uid("skip.c::hidden_fn"), INVALID_UID);
        assert_eq!(graph.get_uid("skip.c::built_fn"), INVALID_UID);
        assert_eq!(graph.num_files(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn overloads_get_signature_suffixes() {
        let dir = std::env::temp_dir().join("pioneer_index_overload");
        write_tree(
            &dir,
            &[("o.cpp", "void f(int a) {}\nvoid f(float b) {}\n")],
        );
        let graph = index_dir(&dir);

        assert_ne!(graph.get_uid("f(int)"), INVALID_UID);
        assert_ne!(graph.get_uid("f(float)"), INVALID_UID);
        assert_eq!(graph.get_uid("f"), INVALID_UID);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn calls_bind_to_first_short_name_match() {
        let dir = std::env::temp_dir().join("pioneer_index_resolve");
        write_tree(
            &dir,
            &[(
                "app.py",
                "class Service:\n    def handle(self):\n        pass\n\ndef main():\n    handle()\n",
            )],
        );
        let graph = index_dir(&dir);

        let main_uid = graph.get_uid("main");
        let handle = graph.get_uid("Service.handle");
        assert!(graph.get_callees(main_uid).contains(&handle));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unresolved_callee_becomes_synthetic_symbol() {
        let dir = std::env::temp_dir().join("pioneer_index_synthetic");
        write_tree(&dir, &[("x.c", "void f(void){ printf(\"hi\"); }\n")]);
        let graph = index_dir(&dir);

        let printf_uid = graph.get_uid("printf");
        assert_ne!(printf_uid, INVALID_UID);
        assert_eq!(graph.get_symbol_file_uid(printf_uid), INVALID_UID);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_provenance_is_recorded() {
        let dir = std::env::temp_dir().join("pioneer_index_provenance");
        write_tree(&dir, &[("lib.c", "void f(void){}\n")]);
        let graph = index_dir(&dir);

        let f = graph.get_uid("lib.c::f");
        let file_uid = graph.get_symbol_file_uid(f);
        assert_ne!(file_uid, INVALID_UID);
        assert!(graph.get_file_path(file_uid).ends_with("lib.c"));
        assert_eq!(graph.get_file_symbols(file_uid), &[f]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn every_edge_endpoint_is_a_named_symbol() {
        let dir = std::env::temp_dir().join("pioneer_index_endpoints");
        write_tree(
            &dir,
            &[
                ("a.c", "void a(void){ b(); unknown(); int x = b(); }\n"),
                ("b.c", "void b(void){}\n"),
            ],
        );
        let graph = index_dir(&dir);

        for (src, dsts) in graph.call_table().iter().chain(graph.data_flow_table()) {
            assert!(!graph.get_symbol(*src).is_empty(), "unnamed UID {src}");
            for dst in dsts {
                assert!(!graph.get_symbol(*dst).is_empty(), "unnamed UID {dst}");
            }
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_directory_yields_finalized_empty_graph() {
        let dir = std::env::temp_dir().join("pioneer_index_empty");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let graph = index_dir(&dir);

        assert_eq!(graph.num_symbols(), 0);
        assert_ne!(graph.end_uid(), INVALID_UID);

        let _ = fs::remove_dir_all(&dir);
    }
}
