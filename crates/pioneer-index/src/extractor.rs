//! LanguageExtractor trait: per-language extraction of function
//! definitions, call sites, and variable assignments from tree-sitter ASTs.

use pioneer_core::Language;
use tree_sitter::{Node, Tree};

/// A parsed function definition, with a handle into the syntax tree so
/// call and variable extraction can be scoped to its body.
#[derive(Debug, Clone)]
pub struct FunctionDef<'t> {
    /// Simple name (e.g. `"foo"`).
    pub name: String,
    /// Qualified name (e.g. `"MyClass::foo"`). For C top-level functions
    /// the file prefix is applied later by the parser coordinator.
    pub qualified_name: String,
    /// Innermost containing class or struct, empty for free functions.
    pub containing_class: String,
    /// Namespace/class prefix including trailing separator, empty at
    /// top level.
    pub namespace_path: String,
    /// Parameter type texts for overload disambiguation.
    pub param_types: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub node: Node<'t>,
}

/// A call site inside a function body.
#[derive(Debug, Clone)]
pub struct FunctionCall<'t> {
    /// Callee as written.
    pub name: String,
    /// Best-effort qualified callee; often equal to `name`.
    pub qualified_name: String,
    pub line: usize,
    pub node: Node<'t>,
}

/// A variable assignment inside a function body.
#[derive(Debug, Clone)]
pub struct VariableDef<'t> {
    pub name: String,
    /// `containing_func::name` (C/C++) or `containing_func.name` (Python).
    pub qualified_name: String,
    pub containing_func: String,
    /// Textual right-hand side: function name, variable, or literal.
    /// Empty when the RHS shape is not tracked.
    pub value_source: String,
    pub from_function_call: bool,
    pub line: usize,
    pub node: Node<'t>,
}

/// Trait for per-language extraction from tree-sitter ASTs.
///
/// Each language (Python, C, C++) implements this trait; the parser
/// coordinator selects an implementation by file extension.
pub trait LanguageExtractor: Send + Sync {
    fn language(&self) -> Language;

    /// File extensions this extractor handles, without the dot.
    fn file_extensions(&self) -> &[&str];

    /// The tree-sitter grammar for configuring the parser.
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Extract all function definitions from a parsed tree.
    fn extract_functions<'t>(&self, tree: &'t Tree, source: &[u8]) -> Vec<FunctionDef<'t>>;

    /// Extract all call sites within one function's body.
    fn extract_calls<'t>(&self, func: &FunctionDef<'t>, source: &[u8]) -> Vec<FunctionCall<'t>>;

    /// Extract all variable assignments within one function's body.
    fn extract_variables<'t>(&self, func: &FunctionDef<'t>, source: &[u8])
        -> Vec<VariableDef<'t>>;
}

/// Text of a node, empty on invalid UTF-8 spans.
pub(crate) fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// Iterative pre-order walk over a subtree.
pub(crate) fn visit_nodes<'t>(root: Node<'t>, mut visitor: impl FnMut(Node<'t>)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visitor(node);
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
}
