//! End-to-end scenarios: index a fixture tree, persist it, reload it, and
//! query it through the full stack.

use pioneer_index::{Indexer, IndexerConfig};
use pioneer_query::QueryEngine;
use pioneer_storage::{load, save, LoadMode};
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join("pioneer_scenarios").join(name);
    let _ = fs::remove_dir_all(&dir);
    for (rel, content) in files {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn index_and_reload(dir: &Path) -> pioneer_graph::CrossRefGraph {
    let mut indexer = Indexer::new(IndexerConfig {
        root: dir.to_path_buf(),
        threads: 2,
        ..IndexerConfig::default()
    });
    let graph = indexer.index().expect("indexing should succeed");

    let index_file = dir.join(".pioneer.json");
    save(&graph, &index_file).expect("save should succeed");
    load(&index_file, LoadMode::Full).expect("load should succeed")
}

fn paths_between(graph: &pioneer_graph::CrossRefGraph, start: &str, end: &str) -> Vec<Vec<String>> {
    let engine = QueryEngine::new(graph);
    let mut paths = Vec::new();
    engine
        .find_paths(start, end, |path| {
            paths.push(path.to_vec());
            true
        })
        .expect("query should succeed");
    paths
}

#[test]
fn trivial_chain() {
    let dir = fixture(
        "s1",
        &[("a.c", "void a(void){ b(); }\n"), ("b.c", "void b(void){}\n")],
    );
    let graph = index_and_reload(&dir);

    let paths = paths_between(&graph, "a.c::a", "b.c::b");
    assert_eq!(paths, vec![vec!["a.c::a".to_string(), "b.c::b".to_string()]]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn forward_trace_to_end() {
    let dir = fixture(
        "s2",
        &[("main.c", "void leaf(void){}\nvoid caller(void){ leaf(); }\n")],
    );
    let graph = index_and_reload(&dir);

    let paths = paths_between(&graph, "main.c::caller", "END");
    assert_eq!(
        paths,
        vec![vec![
            "main.c::caller".to_string(),
            "main.c::leaf".to_string(),
            "END".to_string(),
        ]]
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn backtrace_finds_both_callers() {
    let dir = fixture(
        "s3",
        &[(
            "x.c",
            "void t(void){}\nvoid p(void){ t(); }\nvoid q(void){ t(); }\n",
        )],
    );
    let graph = index_and_reload(&dir);

    let mut paths = paths_between(&graph, "START", "x.c::t");
    paths.sort();
    assert_eq!(
        paths,
        vec![
            vec!["x.c::p".to_string(), "x.c::t".to_string()],
            vec!["x.c::q".to_string(), "x.c::t".to_string()],
        ]
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn mutual_recursion_terminates() {
    let dir = fixture(
        "s4",
        &[("c.c", "void f(void){ g(); }\nvoid g(void){ f(); }\n")],
    );
    let graph = index_and_reload(&dir);

    let paths = paths_between(&graph, "c.c::f", "c.c::g");
    assert_eq!(paths, vec![vec!["c.c::f".to_string(), "c.c::g".to_string()]]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn python_assignment_data_flow() {
    let dir = fixture(
        "s5",
        &[("m.py", "def make():\n    return 1\n\ndef use():\n    x = make()\n")],
    );
    let graph = index_and_reload(&dir);
    let engine = QueryEngine::new(&graph);

    assert!(engine
        .data_sources("use.x")
        .contains(&"make".to_string()));
    assert!(engine.data_sinks("make").contains(&"use.x".to_string()));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn incompatible_index_rejected_then_reindex_succeeds() {
    let dir = fixture("s6", &[("a.c", "void a(void){}\n")]);
    let index_file = dir.join(".pioneer.json");
    fs::write(
        &index_file,
        r#"{"metadata":{"version":"0.9.0","end_uid":2,"UIDs":{"a":1,"END":2}},"symbol_types":{"1":0,"2":2},"call_mapping":{"1":[2]},"data_flow":{}}"#,
    )
    .unwrap();

    let err = load(&index_file, LoadMode::Full).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("0.9.0"), "message: {message}");
    assert!(message.contains("re-index"), "message: {message}");

    // A fresh index over the same tree loads cleanly.
    let graph = index_and_reload(&dir);
    assert!(graph.has_symbol("a.c::a"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn partial_loads_answer_without_edges() {
    let dir = fixture(
        "partial",
        &[("lib.c", "void f(void){ g(); }\nvoid g(void){}\n")],
    );
    let mut indexer = Indexer::new(IndexerConfig {
        root: dir.to_path_buf(),
        threads: 1,
        ..IndexerConfig::default()
    });
    let graph = indexer.index().unwrap();
    let index_file = dir.join(".pioneer.json");
    save(&graph, &index_file).unwrap();

    let symbols_only = load(&index_file, LoadMode::SymbolsOnly).unwrap();
    assert!(symbols_only.has_symbol("lib.c::f"));
    assert!(symbols_only
        .get_callees(symbols_only.get_uid("lib.c::f"))
        .is_empty());

    let with_paths = load(&index_file, LoadMode::WithPaths).unwrap();
    let f = with_paths.get_uid("lib.c::f");
    let file_uid = with_paths.get_symbol_file_uid(f);
    assert!(with_paths.get_file_path(file_uid).ends_with("lib.c"));

    let _ = fs::remove_dir_all(&dir);
}
