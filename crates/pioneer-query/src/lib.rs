//! pioneer-query: Query engine over a finalized cross-reference graph.
//!
//! Enumerates all simple paths between symbols and streams them through a
//! callback as they are found. `start == "START"` backtraces to call
//! roots, `end == "END"` forward-traces to the synthetic sink, and a
//! specific pair runs a bidirectional search: reverse BFS from the end
//! first, then forward DFS restricted to nodes that can actually reach it.

use pioneer_core::{PioneerError, SymbolUid, INVALID_UID};
use pioneer_graph::CrossRefGraph;
use std::collections::{HashSet, VecDeque};

/// Sentinel accepted as a query start, meaning "all call roots".
pub const START_SENTINEL: &str = "START";
/// Sentinel accepted as a query end, meaning "the synthetic END sink".
pub const END_SENTINEL: &str = "END";

/// Query engine. Holds a non-owning reference to a finalized graph.
pub struct QueryEngine<'g> {
    graph: &'g CrossRefGraph,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g CrossRefGraph) -> Self {
        Self { graph }
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.graph.has_symbol(name)
    }

    /// Every symbol name containing *all* patterns as substrings. An empty
    /// pattern list matches everything.
    pub fn find_symbols(&self, patterns: &[String]) -> Vec<String> {
        self.graph
            .symbols()
            .filter(|(name, _)| patterns.iter().all(|p| name.contains(p.as_str())))
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Direct one-hop lookup: what a variable is assigned from.
    pub fn data_sources(&self, variable: &str) -> Vec<String> {
        let uid = self.graph.get_uid(variable);
        if uid == INVALID_UID {
            return Vec::new();
        }
        self.names_of(self.graph.get_data_sources(uid))
    }

    /// Direct one-hop lookup: what variables a source flows into.
    pub fn data_sinks(&self, source: &str) -> Vec<String> {
        let uid = self.graph.get_uid(source);
        if uid == INVALID_UID {
            return Vec::new();
        }
        self.names_of(self.graph.get_data_sinks(uid))
    }

    /// Every variable whose qualified name contains the pattern.
    pub fn variables_in(&self, pattern: &str) -> Vec<String> {
        self.graph
            .symbols()
            .filter(|(name, uid)| self.graph.is_variable(*uid) && name.contains(pattern))
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Variables whose short name (tail after the last `::`) or full name
    /// matches the first pattern, conjunctively narrowed by the rest.
    pub fn member_assignments(&self, patterns: &[String]) -> Vec<String> {
        let Some(first) = patterns.first() else {
            return Vec::new();
        };
        self.graph
            .symbols()
            .filter(|(name, uid)| {
                if !self.graph.is_variable(*uid) {
                    return false;
                }
                let var_part = name.rsplit_once("::").map_or(*name, |(_, tail)| tail);
                if !var_part.contains(first.as_str()) && !name.contains(first.as_str()) {
                    return false;
                }
                patterns[1..].iter().all(|p| name.contains(p.as_str()))
            })
            .map(|(name, _)| name.to_string())
            .collect()
    }

    // ── Path Enumeration ────────────────────────────────────────────────

    /// Find all simple paths from `start` to `end`, streaming each through
    /// the callback. Return `false` from the callback to stop enumeration.
    pub fn find_paths(
        &self,
        start: &str,
        end: &str,
        mut callback: impl FnMut(&[String]) -> bool,
    ) -> Result<(), PioneerError> {
        if start == START_SENTINEL && end == END_SENTINEL {
            return Err(PioneerError::BadQuery(
                "cannot use both START and END; at least one endpoint must be a symbol".into(),
            ));
        }
        if start == START_SENTINEL {
            return self.backtrace(end, callback);
        }
        if end == END_SENTINEL {
            return self.forward_trace(start, callback);
        }

        let start_uid = self.resolve(start)?;
        let end_uid = self.resolve(end)?;

        // Phase 1: reverse reachability from the end. Anything outside
        // this set can never be part of an answer, so the forward DFS
        // prunes whole branches before descending into them.
        let can_reach_end = self.reverse_reachable(end_uid);
        if !can_reach_end.contains(&start_uid) {
            return Ok(());
        }

        enumerate_paths(
            self.graph,
            start_uid,
            |uid| self.graph.get_callees(uid),
            |node, _| node == end_uid,
            false,
            Some(&can_reach_end),
            &mut callback,
        );
        Ok(())
    }

    /// DFS on the reverse call graph: emits one path per call root (or
    /// per node with no callers) reached from `symbol`, root first.
    pub fn backtrace(
        &self,
        symbol: &str,
        mut callback: impl FnMut(&[String]) -> bool,
    ) -> Result<(), PioneerError> {
        let target = self.resolve(symbol)?;
        enumerate_paths(
            self.graph,
            target,
            |uid| self.graph.get_callers(uid),
            |node, _| self.graph.get_callers(node).is_empty(),
            true,
            None,
            &mut callback,
        );
        Ok(())
    }

    /// DFS on the forward call graph from `symbol` to the END sink.
    pub fn forward_trace(
        &self,
        symbol: &str,
        mut callback: impl FnMut(&[String]) -> bool,
    ) -> Result<(), PioneerError> {
        let start = self.resolve(symbol)?;
        let end = self.graph.end_uid();
        enumerate_paths(
            self.graph,
            start,
            |uid| self.graph.get_callees(uid),
            |node, _| node == end,
            false,
            None,
            &mut callback,
        );
        Ok(())
    }

    /// DFS on the forward data-flow graph from `source` to `variable`.
    pub fn find_data_flow_paths(
        &self,
        source: &str,
        variable: &str,
        mut callback: impl FnMut(&[String]) -> bool,
    ) -> Result<(), PioneerError> {
        let source_uid = self.resolve(source)?;
        let target_uid = self.resolve(variable)?;
        enumerate_paths(
            self.graph,
            source_uid,
            |uid| self.graph.get_data_sinks(uid),
            |node, len| node == target_uid && len > 1,
            false,
            None,
            &mut callback,
        );
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<SymbolUid, PioneerError> {
        let uid = self.graph.get_uid(name);
        if uid == INVALID_UID {
            return Err(PioneerError::SymbolNotFound(name.to_string()));
        }
        Ok(uid)
    }

    /// BFS over the reverse call graph, producing every node from which
    /// `end` is reachable (including `end` itself).
    fn reverse_reachable(&self, end: SymbolUid) -> HashSet<SymbolUid> {
        let mut seen = HashSet::from([end]);
        let mut queue = VecDeque::from([end]);
        while let Some(node) = queue.pop_front() {
            for &caller in self.graph.get_callers(node) {
                if seen.insert(caller) {
                    queue.push_back(caller);
                }
            }
        }
        seen
    }

    fn names_of(&self, uids: &HashSet<SymbolUid>) -> Vec<String> {
        uids.iter()
            .map(|&uid| self.graph.get_symbol(uid))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One DFS frame: the node plus a live iterator into the graph's own
/// adjacency set. No per-frame copy of the neighbor list; on hub nodes
/// with thousands of edges, copying would dominate runtime.
struct Frame<'g> {
    node: SymbolUid,
    neighbors: std::collections::hash_set::Iter<'g, SymbolUid>,
}

/// Iterative DFS emitting every simple path from `start` to a terminal
/// node. Cycle avoidance is an in-path set: a node already on the current
/// stack is never re-entered, which guarantees termination and simplicity.
fn enumerate_paths<'g, N, T, F>(
    graph: &'g CrossRefGraph,
    start: SymbolUid,
    neighbors: N,
    is_terminal: T,
    reverse_output: bool,
    prune: Option<&HashSet<SymbolUid>>,
    callback: &mut F,
) where
    N: Fn(SymbolUid) -> &'g HashSet<SymbolUid>,
    T: Fn(SymbolUid, usize) -> bool,
    F: FnMut(&[String]) -> bool,
{
    let mut stack = vec![Frame {
        node: start,
        neighbors: neighbors(start).iter(),
    }];
    let mut path = vec![start];
    let mut in_path: HashSet<SymbolUid> = HashSet::from([start]);

    while let Some(top) = stack.len().checked_sub(1) {
        if is_terminal(stack[top].node, path.len()) {
            let mut names: Vec<String> = path
                .iter()
                .map(|&uid| graph.get_symbol(uid).to_string())
                .collect();
            if reverse_output {
                names.reverse();
            }
            if !callback(&names) {
                return;
            }
            backtrack(&mut stack, &mut path, &mut in_path);
            continue;
        }

        let mut next = None;
        for &candidate in stack[top].neighbors.by_ref() {
            if in_path.contains(&candidate) {
                continue;
            }
            if prune.is_some_and(|keep| !keep.contains(&candidate)) {
                continue;
            }
            next = Some(candidate);
            break;
        }

        match next {
            Some(node) => {
                stack.push(Frame {
                    node,
                    neighbors: neighbors(node).iter(),
                });
                path.push(node);
                in_path.insert(node);
            }
            None => backtrack(&mut stack, &mut path, &mut in_path),
        }
    }
}

fn backtrack(stack: &mut Vec<Frame>, path: &mut Vec<SymbolUid>, in_path: &mut HashSet<SymbolUid>) {
    if let Some(frame) = stack.pop() {
        in_path.remove(&frame.node);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pioneer_core::SymbolType;

    /// Build a finalized call graph from name pairs.
    fn call_graph(edges: &[(&str, &str)]) -> CrossRefGraph {
        let mut graph = CrossRefGraph::new();
        for (caller, callee) in edges {
            let caller_uid = if graph.has_symbol(caller) {
                graph.get_uid(caller)
            } else {
                graph.add_symbol(caller, SymbolType::Function)
            };
            let callee_uid = if graph.has_symbol(callee) {
                graph.get_uid(callee)
            } else {
                graph.add_symbol(callee, SymbolType::Function)
            };
            graph.add_call(caller_uid, callee_uid);
        }
        graph.finalize();
        graph
    }

    fn collect_paths(
        run: impl FnOnce(&mut dyn FnMut(&[String]) -> bool) -> Result<(), PioneerError>,
    ) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        run(&mut |path: &[String]| {
            paths.push(path.to_vec());
            true
        })
        .expect("query should succeed");
        paths
    }

    #[test]
    fn trivial_chain_yields_one_path() {
        let graph = call_graph(&[("a.c::a", "b.c::b")]);
        let engine = QueryEngine::new(&graph);
        let paths = collect_paths(|cb| engine.find_paths("a.c::a", "b.c::b", cb));
        assert_eq!(paths, vec![vec!["a.c::a".to_string(), "b.c::b".to_string()]]);
    }

    #[test]
    fn forward_trace_reaches_end() {
        let graph = call_graph(&[("caller", "leaf")]);
        let engine = QueryEngine::new(&graph);
        let paths = collect_paths(|cb| engine.forward_trace("caller", cb));
        assert_eq!(
            paths,
            vec![vec![
                "caller".to_string(),
                "leaf".to_string(),
                "END".to_string()
            ]]
        );
    }

    #[test]
    fn backtrace_emits_roots_first() {
        let graph = call_graph(&[("p", "t"), ("q", "t")]);
        let engine = QueryEngine::new(&graph);
        let mut paths = collect_paths(|cb| engine.backtrace("t", cb));
        paths.sort();
        assert_eq!(
            paths,
            vec![
                vec!["p".to_string(), "t".to_string()],
                vec!["q".to_string(), "t".to_string()],
            ]
        );
    }

    #[test]
    fn cycle_does_not_duplicate_or_hang() {
        let graph = call_graph(&[("f", "g"), ("g", "f")]);
        let engine = QueryEngine::new(&graph);
        let paths = collect_paths(|cb| engine.find_paths("f", "g", cb));
        assert_eq!(paths, vec![vec!["f".to_string(), "g".to_string()]]);
    }

    #[test]
    fn every_emitted_path_is_simple_with_correct_endpoints() {
        let graph = call_graph(&[
            ("a", "b"),
            ("a", "c"),
            ("b", "d"),
            ("c", "d"),
            ("d", "a"),
            ("d", "e"),
        ]);
        let engine = QueryEngine::new(&graph);
        let paths = collect_paths(|cb| engine.find_paths("a", "e", cb));

        assert!(!paths.is_empty());
        for path in &paths {
            assert_eq!(path.first().map(String::as_str), Some("a"));
            assert_eq!(path.last().map(String::as_str), Some("e"));
            let unique: HashSet<&String> = path.iter().collect();
            assert_eq!(unique.len(), path.len(), "path repeats a node: {path:?}");
            for pair in path.windows(2) {
                let from = graph.get_uid(&pair[0]);
                let to = graph.get_uid(&pair[1]);
                assert!(graph.get_callees(from).contains(&to));
            }
        }
    }

    #[test]
    fn bidirectional_matches_naive_forward_dfs() {
        let graph = call_graph(&[
            ("a", "b"),
            ("a", "x"),
            ("x", "y"),
            ("b", "c"),
            ("b", "d"),
            ("c", "e"),
            ("d", "e"),
            ("e", "b"),
            ("dead", "x"),
        ]);
        let engine = QueryEngine::new(&graph);

        // Naive recursive enumeration with no pruning.
        fn naive(
            graph: &CrossRefGraph,
            node: SymbolUid,
            end: SymbolUid,
            path: &mut Vec<SymbolUid>,
            out: &mut Vec<Vec<SymbolUid>>,
        ) {
            if node == end {
                out.push(path.clone());
                return;
            }
            for &next in graph.get_callees(node) {
                if path.contains(&next) {
                    continue;
                }
                path.push(next);
                naive(graph, next, end, path, out);
                path.pop();
            }
        }

        let (a, e) = (graph.get_uid("a"), graph.get_uid("e"));
        let mut expected_uids = Vec::new();
        naive(&graph, a, e, &mut vec![a], &mut expected_uids);
        let mut expected: Vec<Vec<String>> = expected_uids
            .into_iter()
            .map(|p| p.iter().map(|&u| graph.get_symbol(u).to_string()).collect())
            .collect();
        expected.sort();

        let mut actual = collect_paths(|cb| engine.find_paths("a", "e", cb));
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[test]
    fn unreachable_end_emits_nothing() {
        let graph = call_graph(&[("a", "b"), ("c", "d")]);
        let engine = QueryEngine::new(&graph);
        let paths = collect_paths(|cb| engine.find_paths("a", "d", cb));
        assert!(paths.is_empty());
    }

    #[test]
    fn callback_false_stops_enumeration() {
        let graph = call_graph(&[("a", "b"), ("a", "c"), ("b", "e"), ("c", "e")]);
        let engine = QueryEngine::new(&graph);

        let mut count = 0;
        engine
            .find_paths("a", "e", |_| {
                count += 1;
                false
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn both_sentinels_is_a_bad_query() {
        let graph = call_graph(&[("a", "b")]);
        let engine = QueryEngine::new(&graph);
        let err = engine
            .find_paths(START_SENTINEL, END_SENTINEL, |_| true)
            .unwrap_err();
        assert!(matches!(err, PioneerError::BadQuery(_)));
    }

    #[test]
    fn unknown_symbol_is_reported() {
        let graph = call_graph(&[("a", "b")]);
        let engine = QueryEngine::new(&graph);
        let err = engine.find_paths("a", "missing", |_| true).unwrap_err();
        assert!(matches!(err, PioneerError::SymbolNotFound(_)));
    }

    #[test]
    fn find_symbols_is_conjunctive() {
        let graph = call_graph(&[("net::send", "net::flush"), ("disk::send", "disk::sync")]);
        let engine = QueryEngine::new(&graph);

        let mut hits = engine.find_symbols(&["send".to_string()]);
        hits.sort();
        assert_eq!(hits, vec!["disk::send", "net::send"]);

        let narrowed = engine.find_symbols(&["send".to_string(), "net".to_string()]);
        assert_eq!(narrowed, vec!["net::send"]);
    }

    #[test]
    fn data_flow_queries_and_paths() {
        let mut graph = CrossRefGraph::new();
        let make = graph.add_symbol("make", SymbolType::Function);
        let x = graph.add_symbol("use::x", SymbolType::Variable);
        let y = graph.add_symbol("use::y", SymbolType::Variable);
        graph.add_data_flow(make, x);
        graph.add_data_flow(x, y);
        graph.finalize();
        let engine = QueryEngine::new(&graph);

        assert_eq!(engine.data_sources("use::x"), vec!["make"]);
        assert_eq!(engine.data_sinks("make"), vec!["use::x"]);
        assert!(engine.data_sources("nonexistent").is_empty());

        let paths = collect_paths(|cb| engine.find_data_flow_paths("make", "use::y", cb));
        assert_eq!(
            paths,
            vec![vec![
                "make".to_string(),
                "use::x".to_string(),
                "use::y".to_string()
            ]]
        );
    }

    #[test]
    fn variables_in_filters_by_type_and_pattern() {
        let mut graph = CrossRefGraph::new();
        graph.add_symbol("Widget::render", SymbolType::Function);
        graph.add_symbol("Widget::render::buf", SymbolType::Variable);
        graph.add_symbol("other::v", SymbolType::Variable);
        graph.finalize();
        let engine = QueryEngine::new(&graph);

        assert_eq!(engine.variables_in("Widget"), vec!["Widget::render::buf"]);
    }

    #[test]
    fn member_assignments_match_short_name() {
        let mut graph = CrossRefGraph::new();
        let src = graph.add_symbol("read_config", SymbolType::Function);
        let field = graph.add_symbol("init::dev->state", SymbolType::Variable);
        graph.add_data_flow(src, field);
        graph.finalize();
        let engine = QueryEngine::new(&graph);

        assert_eq!(
            engine.member_assignments(&["dev->state".to_string()]),
            vec!["init::dev->state"]
        );
        assert!(engine
            .member_assignments(&["dev->state".to_string(), "zzz".to_string()])
            .is_empty());
    }

}
