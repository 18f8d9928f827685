//! Command implementations for the pioneer CLI.
//!
//! User-facing output goes to stdout; diagnostics and suggestions go to
//! stderr. Every command exits 1 through `anyhow` on any error.

use anyhow::bail;
use colored::Colorize;
use pioneer_core::{PioneerConfig, INVALID_UID};
use pioneer_graph::CrossRefGraph;
use pioneer_index::{Indexer, IndexerConfig};
use pioneer_query::{QueryEngine, END_SENTINEL, START_SENTINEL};
use pioneer_storage::{
    load, save, stream_all_symbols, stream_file_paths, stream_search_symbols, LoadMode,
};
use regex::RegexBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn index_path(config: &PioneerConfig) -> &Path {
    Path::new(&config.index_file)
}

fn load_graph(config: &PioneerConfig, mode: LoadMode) -> anyhow::Result<CrossRefGraph> {
    Ok(load(index_path(config), mode)?)
}

fn worker_count(requested: usize, config: &PioneerConfig) -> usize {
    let configured = if requested > 0 {
        requested
    } else {
        config.threads
    };
    if configured > 0 {
        configured
    } else {
        std::thread::available_parallelism().map_or(4, usize::from)
    }
}

/// A path element, with its defining file appended when requested.
fn format_path_element(graph: &CrossRefGraph, symbol: &str, show_path: bool) -> String {
    if show_path {
        let file_uid = graph.get_symbol_file_uid(graph.get_uid(symbol));
        if file_uid != INVALID_UID {
            return format!("{symbol} [{}]", graph.get_file_path(file_uid));
        }
    }
    symbol.to_string()
}

/// Check a symbol exists, printing "did you mean" suggestions otherwise.
fn validate_symbol(engine: &QueryEngine, symbol: &str, label: &str, nosort: bool) -> bool {
    if engine.has_symbol(symbol) {
        return true;
    }
    eprintln!("{} {label} not found: {symbol}", "Error:".red());
    let mut matches = engine.find_symbols(std::slice::from_ref(&symbol.to_string()));
    if !nosort {
        matches.sort();
    }
    if !matches.is_empty() {
        eprintln!("Did you mean one of these?");
        for name in matches.iter().take(5) {
            eprintln!("  {name}");
        }
    }
    false
}

// ── index ───────────────────────────────────────────────────────────────

pub fn cmd_index(config: &PioneerConfig, jobs: usize) -> anyhow::Result<()> {
    println!("Indexing current directory...");

    let mut indexer = Indexer::new(IndexerConfig {
        root: PathBuf::from("."),
        threads: if jobs > 0 { jobs } else { config.threads },
        ignore_patterns: config.ignore_patterns.clone(),
    });
    let graph = indexer.index()?;

    let stats = indexer.stats();
    println!("\nIndexing complete.");
    println!(
        "  Files indexed: {}",
        stats.files_indexed.load(Ordering::Relaxed)
    );
    println!(
        "  Functions found: {}",
        stats.functions_found.load(Ordering::Relaxed)
    );
    println!(
        "  Calls found: {}",
        stats.calls_found.load(Ordering::Relaxed)
    );
    println!(
        "  Variables found: {}",
        stats.variables_found.load(Ordering::Relaxed)
    );
    println!("  Symbols created: {}", graph.num_symbols());

    save(&graph, index_path(config))?;
    println!("\nIndex saved to: {}", config.index_file);
    Ok(())
}

// ── list / search ───────────────────────────────────────────────────────

pub fn cmd_list(config: &PioneerConfig, nosort: bool) -> anyhow::Result<()> {
    let mut symbols = stream_all_symbols(index_path(config))?;
    if !nosort {
        symbols.sort();
    }
    println!("Symbols in index ({}):", symbols.len());
    for name in &symbols {
        println!("  {name}");
    }
    Ok(())
}

pub fn cmd_search(
    config: &PioneerConfig,
    patterns: &[String],
    show_path: bool,
    nosort: bool,
) -> anyhow::Result<()> {
    if show_path {
        // Needs the file tables; take the partial load that has them.
        let graph = load_graph(config, LoadMode::WithPaths)?;
        let engine = QueryEngine::new(&graph);
        let mut matches = engine.find_symbols(patterns);
        if !nosort {
            matches.sort();
        }
        println!("{} Matches found", matches.len());
        if matches.is_empty() {
            println!("  (none found)");
        }
        for name in &matches {
            let uid = graph.get_uid(name);
            let file_uid = graph.get_symbol_file_uid(uid);
            if file_uid != INVALID_UID {
                println!("  {name} [{}]", graph.get_file_path(file_uid));
            } else {
                println!("  {name}");
            }
        }
        return Ok(());
    }

    let mut matches = stream_search_symbols(index_path(config), patterns)?;
    if !nosort {
        matches.sort();
    }
    println!("{} Matches found", matches.len());
    if matches.is_empty() {
        println!("  (none found)");
    }
    for name in &matches {
        println!("  {name}");
    }
    Ok(())
}

// ── query ───────────────────────────────────────────────────────────────

pub fn cmd_query(
    config: &PioneerConfig,
    start_chain: Vec<String>,
    end_chain: Vec<String>,
    backtrace: bool,
    pattern_match: bool,
    show_path: bool,
    nosort: bool,
) -> anyhow::Result<()> {
    let graph = load_graph(config, LoadMode::Full)?;
    let engine = QueryEngine::new(&graph);

    let is_backtrace = backtrace || start_chain.first().is_some_and(|s| s == START_SENTINEL);
    let is_forward = end_chain.first().is_some_and(|s| s == END_SENTINEL);

    // Resolve patterns if requested and validate every chain element.
    let resolve_chain = |chain: &[String], label: &str| -> Option<Vec<String>> {
        let mut resolved = Vec::with_capacity(chain.len());
        for sym in chain {
            if sym == START_SENTINEL || sym == END_SENTINEL {
                resolved.push(sym.clone());
                continue;
            }
            let actual = if pattern_match {
                let mut matches = engine.find_symbols(std::slice::from_ref(sym));
                if !nosort {
                    matches.sort();
                }
                if matches.is_empty() {
                    eprintln!("{} No symbols matching pattern: {sym}", "Error:".red());
                    return None;
                }
                if matches.len() > 1 {
                    println!("Pattern '{sym}' matches:");
                    for (i, name) in matches.iter().take(5).enumerate() {
                        println!("  [{}] {name}", i + 1);
                    }
                    println!("Using: {}", matches[0]);
                }
                matches[0].clone()
            } else {
                sym.clone()
            };
            if !validate_symbol(&engine, &actual, label, nosort) {
                return None;
            }
            resolved.push(actual);
        }
        Some(resolved)
    };

    let (start_resolved, end_resolved) = if is_backtrace {
        let Some(end) = resolve_chain(&end_chain, "End chain") else {
            bail!("query failed");
        };
        if end.is_empty() {
            bail!("--end symbol required for backtrace");
        }
        (vec![START_SENTINEL.to_string()], end)
    } else if is_forward {
        let Some(start) = resolve_chain(&start_chain, "Start chain") else {
            bail!("query failed");
        };
        if start.is_empty() {
            bail!("--start symbol required for forward trace");
        }
        (start, vec![END_SENTINEL.to_string()])
    } else {
        let Some(start) = resolve_chain(&start_chain, "Start chain") else {
            bail!("query failed");
        };
        let Some(end) = resolve_chain(&end_chain, "End chain") else {
            bail!("query failed");
        };
        (start, end)
    };

    println!(
        "Finding paths: {} -> ... -> {}:\n",
        start_resolved.join(" -> "),
        end_resolved.join(" -> ")
    );

    // Path finding runs from the last start element to the first end
    // element; the rest of each chain is re-attached around every result.
    let query_start = start_resolved
        .last()
        .cloned()
        .unwrap_or_else(|| START_SENTINEL.to_string());
    let query_end = end_resolved
        .first()
        .cloned()
        .unwrap_or_else(|| END_SENTINEL.to_string());

    let mut path_count = 0usize;
    engine.find_paths(&query_start, &query_end, |middle| {
        path_count += 1;

        let prefix = &start_resolved[..start_resolved.len().saturating_sub(1)];
        let suffix = end_resolved.get(1..).unwrap_or(&[]);
        let full: Vec<String> = prefix
            .iter()
            .map(String::as_str)
            .chain(middle.iter().map(String::as_str))
            .chain(suffix.iter().map(String::as_str))
            .map(|sym| format_path_element(&graph, sym, show_path))
            .collect();

        println!("[{path_count}] {}", full.join(" -> "));
        true
    })?;

    if path_count == 0 {
        println!("No paths found.");
    } else {
        println!("\nTotal paths found: {path_count}");
    }
    Ok(())
}

// ── type / data flow / vars / member ────────────────────────────────────

pub fn cmd_type(config: &PioneerConfig, symbol: &str, nosort: bool) -> anyhow::Result<()> {
    let graph = load_graph(config, LoadMode::SymbolsOnly)?;
    let engine = QueryEngine::new(&graph);

    if !validate_symbol(&engine, symbol, "Symbol", nosort) {
        bail!("symbol not found: {symbol}");
    }
    let uid = graph.get_uid(symbol);
    println!("{symbol}: {}", graph.get_type(uid));
    Ok(())
}

pub fn cmd_data_sources(
    config: &PioneerConfig,
    patterns: &[String],
    nosort: bool,
) -> anyhow::Result<()> {
    let graph = load_graph(config, LoadMode::Full)?;
    let engine = QueryEngine::new(&graph);
    let mut matches = engine.find_symbols(patterns);
    if !nosort {
        matches.sort();
    }

    let sources: BTreeSet<String> = matches
        .iter()
        .flat_map(|var| engine.data_sources(var))
        .collect();

    println!("Data sources ({}):", sources.len());
    if sources.is_empty() {
        println!("  (no sources found)");
    }
    for source in &sources {
        println!("  <- {source}");
    }
    Ok(())
}

pub fn cmd_data_sinks(
    config: &PioneerConfig,
    patterns: &[String],
    nosort: bool,
) -> anyhow::Result<()> {
    let graph = load_graph(config, LoadMode::Full)?;
    let engine = QueryEngine::new(&graph);
    let mut matches = engine.find_symbols(patterns);
    if !nosort {
        matches.sort();
    }

    let sinks: BTreeSet<String> = matches
        .iter()
        .flat_map(|source| engine.data_sinks(source))
        .collect();

    println!("Data sinks ({}):", sinks.len());
    if sinks.is_empty() {
        println!("  (no sinks found)");
    }
    for sink in &sinks {
        println!("  -> {sink}");
    }
    Ok(())
}

pub fn cmd_vars(config: &PioneerConfig, patterns: &[String], nosort: bool) -> anyhow::Result<()> {
    let graph = load_graph(config, LoadMode::SymbolsOnly)?;
    let engine = QueryEngine::new(&graph);

    let mut vars = engine.variables_in(patterns.first().map_or("", String::as_str));
    for pattern in patterns.iter().skip(1) {
        vars.retain(|v| v.contains(pattern.as_str()));
    }
    if !nosort {
        vars.sort();
    }

    println!("Variables ({}):", vars.len());
    if vars.is_empty() {
        println!("  (none found)");
    }
    for var in &vars {
        println!("  {var}");
    }
    Ok(())
}

pub fn cmd_member(config: &PioneerConfig, patterns: &[String], nosort: bool) -> anyhow::Result<()> {
    let graph = load_graph(config, LoadMode::Full)?;
    let engine = QueryEngine::new(&graph);

    let mut matches = engine.member_assignments(patterns);
    if !nosort {
        matches.sort();
    }

    println!("Assignments ({}):", matches.len());
    if matches.is_empty() {
        println!("  (none found)");
    }
    for var in &matches {
        let sources = engine.data_sources(var);
        if sources.is_empty() {
            println!("  {var}");
        } else {
            println!("  {var} <- {}", sources.join(", "));
        }
    }
    Ok(())
}

// ── grep ────────────────────────────────────────────────────────────────

struct GrepMatch {
    filepath: String,
    line_num: usize,
    line: String,
}

enum Matcher {
    Regex(regex::Regex),
    Substring(String),
    SubstringNoCase(String),
}

impl Matcher {
    fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(line),
            Matcher::Substring(pat) => line.contains(pat.as_str()),
            Matcher::SubstringNoCase(pat) => line.to_lowercase().contains(pat.as_str()),
        }
    }
}

/// Fan out over the indexed file list and report matching lines. Reuses
/// the index's `file_paths` section only; no graph state is touched.
pub fn cmd_grep(
    config: &PioneerConfig,
    pattern: &str,
    use_regex: bool,
    ignore_case: bool,
    jobs: usize,
) -> anyhow::Result<()> {
    let files = stream_file_paths(index_path(config))?;
    if files.is_empty() {
        println!("No files found in index.");
        return Ok(());
    }

    println!("Searching {} files for pattern: {pattern}", files.len());

    let matcher = if use_regex {
        match RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
        {
            Ok(re) => Matcher::Regex(re),
            // Invalid patterns match nothing.
            Err(_) => {
                println!("\n0 matches found:");
                return Ok(());
            }
        }
    } else if ignore_case {
        Matcher::SubstringNoCase(pattern.to_lowercase())
    } else {
        Matcher::Substring(pattern.to_string())
    };

    let threads = worker_count(jobs, config);
    let per_worker = files.len().div_ceil(threads).max(1);
    let results: Mutex<Vec<GrepMatch>> = Mutex::new(Vec::new());
    let skipped = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        let (results, matcher, skipped) = (&results, &matcher, &skipped);
        for slice in files.chunks(per_worker) {
            scope.spawn(move || {
                let mut local = Vec::new();
                for filepath in slice {
                    let Ok(content) = std::fs::read_to_string(filepath) else {
                        skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    };
                    for (idx, line) in content.lines().enumerate() {
                        if matcher.matches(line) {
                            local.push(GrepMatch {
                                filepath: filepath.clone(),
                                line_num: idx + 1,
                                line: line.to_string(),
                            });
                        }
                    }
                }
                if !local.is_empty() {
                    results
                        .lock()
                        .expect("grep results mutex poisoned")
                        .append(&mut local);
                }
            });
        }
    });

    let skipped = skipped.load(Ordering::Relaxed);
    if skipped > 0 {
        tracing::warn!("{skipped} indexed files could not be read");
    }

    let mut results = results.into_inner().expect("grep results mutex poisoned");
    results.sort_by(|a, b| {
        a.filepath
            .cmp(&b.filepath)
            .then(a.line_num.cmp(&b.line_num))
    });

    println!("\n{} matches found:", results.len());
    if results.is_empty() {
        println!("  (none found)");
    }
    for m in &results {
        println!("{}:{}: {}", m.filepath, m.line_num, m.line);
    }
    Ok(())
}
