//! Python extractor using tree-sitter-python.

use crate::extractor::{
    node_text, visit_nodes, FunctionCall, FunctionDef, LanguageExtractor, VariableDef,
};
use pioneer_core::Language;
use tree_sitter::{Node, Tree};

/// Python language extractor.
pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn extract_functions<'t>(&self, tree: &'t Tree, source: &[u8]) -> Vec<FunctionDef<'t>> {
        let mut functions = Vec::new();

        // Innermost enclosing class, tracked by byte range during the walk.
        let mut class_stack: Vec<(String, usize)> = Vec::new();

        visit_nodes(tree.root_node(), |node| {
            let start = node.start_byte();
            while class_stack.last().is_some_and(|(_, end)| start >= *end) {
                class_stack.pop();
            }

            match node.kind() {
                "class_definition" => {
                    if let Some(name_node) = node.child_by_field_name("name") {
                        class_stack.push((node_text(name_node, source), node.end_byte()));
                    }
                }
                "function_definition" => {
                    if let Some(func) = extract_function(node, source, class_stack.last()) {
                        functions.push(func);
                    }
                }
                _ => {}
            }
        });

        functions
    }

    fn extract_calls<'t>(&self, func: &FunctionDef<'t>, source: &[u8]) -> Vec<FunctionCall<'t>> {
        let mut calls = Vec::new();
        visit_nodes(func.node, |node| {
            if node.kind() != "call" {
                return;
            }
            let Some(target) = node.child_by_field_name("function") else {
                return;
            };
            // `foo()` or `obj.method()` - keep the full attribute chain.
            if matches!(target.kind(), "identifier" | "attribute") {
                let name = node_text(target, source);
                if !name.is_empty() {
                    calls.push(FunctionCall {
                        qualified_name: name.clone(),
                        name,
                        line: node.start_position().row + 1,
                        node,
                    });
                }
            }
        });
        calls
    }

    fn extract_variables<'t>(
        &self,
        func: &FunctionDef<'t>,
        source: &[u8],
    ) -> Vec<VariableDef<'t>> {
        let mut variables = Vec::new();
        visit_nodes(func.node, |node| {
            if node.kind() != "assignment" {
                return;
            }
            let Some(left) = node.child_by_field_name("left") else {
                return;
            };
            if !matches!(left.kind(), "identifier" | "attribute") {
                return;
            }
            let name = node_text(left, source);
            if name.is_empty() {
                return;
            }

            let (value_source, from_function_call) = node
                .child_by_field_name("right")
                .map_or((String::new(), false), |right| {
                    classify_value(right, source)
                });

            variables.push(VariableDef {
                qualified_name: format!("{}.{}", func.qualified_name, name),
                name,
                containing_func: func.qualified_name.clone(),
                value_source,
                from_function_call,
                line: node.start_position().row + 1,
                node,
            });
        });
        variables
    }
}

fn extract_function<'t>(
    node: Node<'t>,
    source: &[u8],
    containing_class: Option<&(String, usize)>,
) -> Option<FunctionDef<'t>> {
    let name_node = node.child_by_field_name("name")?;
    let name = node_text(name_node, source);

    let mut param_types = Vec::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        for i in 0..params.named_child_count() {
            let Some(param) = params.named_child(i) else {
                continue;
            };
            if matches!(param.kind(), "typed_parameter" | "typed_default_parameter") {
                if let Some(ty) = param.child_by_field_name("type") {
                    param_types.push(node_text(ty, source));
                }
            }
        }
    }

    let (containing_class, namespace_path, qualified_name) = match containing_class {
        Some((class, _)) => (
            class.clone(),
            format!("{class}."),
            format!("{class}.{name}"),
        ),
        None => (String::new(), String::new(), name.clone()),
    };

    Some(FunctionDef {
        name,
        qualified_name,
        containing_class,
        namespace_path,
        param_types,
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        node,
    })
}

/// Classify an assignment's right-hand side into a data-flow source.
fn classify_value(node: Node, source: &[u8]) -> (String, bool) {
    match node.kind() {
        "call" => {
            let name = node
                .child_by_field_name("function")
                .map(|f| node_text(f, source))
                .unwrap_or_default();
            (name, true)
        }
        "identifier" | "attribute" => (node_text(node, source), false),
        "integer" | "float" | "string" | "concatenated_string" | "true" | "false" | "none" => {
            (node_text(node, source), false)
        }
        _ => (String::new(), false),
    }
}
