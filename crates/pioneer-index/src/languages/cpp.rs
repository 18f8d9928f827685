//! C++ extractor using tree-sitter-cpp.

use crate::extractor::{
    node_text, visit_nodes, FunctionCall, FunctionDef, LanguageExtractor, VariableDef,
};
use crate::languages::c::{call_target_name, extract_c_style_variables};
use pioneer_core::Language;
use tree_sitter::{Node, Tree};

/// C++ language extractor.
pub struct CppExtractor;

impl CppExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CppExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Namespace or class entry on the context stack, scoped by byte range.
struct Context {
    name: String,
    is_class: bool,
    end_byte: usize,
}

impl LanguageExtractor for CppExtractor {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn file_extensions(&self) -> &[&str] {
        &["cpp", "cc", "cxx", "hpp", "hh", "hxx"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_cpp::LANGUAGE.into()
    }

    fn extract_functions<'t>(&self, tree: &'t Tree, source: &[u8]) -> Vec<FunctionDef<'t>> {
        let mut functions = Vec::new();
        let mut context_stack: Vec<Context> = Vec::new();

        visit_nodes(tree.root_node(), |node| {
            let start = node.start_byte();
            while context_stack.last().is_some_and(|ctx| start >= ctx.end_byte) {
                context_stack.pop();
            }

            match node.kind() {
                "namespace_definition" => {
                    if let Some(name_node) = node.child_by_field_name("name") {
                        context_stack.push(Context {
                            name: node_text(name_node, source),
                            is_class: false,
                            end_byte: node.end_byte(),
                        });
                    }
                }
                "class_specifier" | "struct_specifier" => {
                    if let Some(name_node) = node.child_by_field_name("name") {
                        context_stack.push(Context {
                            name: node_text(name_node, source),
                            is_class: true,
                            end_byte: node.end_byte(),
                        });
                    }
                }
                "function_definition" => {
                    if let Some(func) = extract_function(node, source, &context_stack) {
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
        visit_nodes(func.node, |node| match node.kind() {
            "call_expression" => {
                if let Some(name) = cpp_call_target_name(node, source) {
                    calls.push(FunctionCall {
                        qualified_name: name.clone(),
                        name,
                        line: node.start_position().row + 1,
                        node,
                    });
                }
            }
            // Constructor invocations.
            "new_expression" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    let name = node_text(ty, source);
                    if !name.is_empty() {
                        calls.push(FunctionCall {
                            qualified_name: name.clone(),
                            name,
                            line: node.start_position().row + 1,
                            node,
                        });
                    }
                }
            }
            _ => {}
        });
        calls
    }

    fn extract_variables<'t>(
        &self,
        func: &FunctionDef<'t>,
        source: &[u8],
    ) -> Vec<VariableDef<'t>> {
        extract_c_style_variables(func, source, "::")
    }
}

fn extract_function<'t>(
    node: Node<'t>,
    source: &[u8],
    context_stack: &[Context],
) -> Option<FunctionDef<'t>> {
    let declarator = node.child_by_field_name("declarator")?;
    let func_decl = unwrap_to_function_declarator(declarator)?;

    // Covers identifier, field_identifier, qualified_identifier,
    // destructor_name, and operator_name declarators alike.
    let name_decl = func_decl.child_by_field_name("declarator")?;
    let name = node_text(name_decl, source);
    if name.is_empty() {
        return None;
    }

    let mut param_types = Vec::new();
    if let Some(params) = func_decl.child_by_field_name("parameters") {
        for i in 0..params.named_child_count() {
            let Some(param) = params.named_child(i) else {
                continue;
            };
            if matches!(
                param.kind(),
                "parameter_declaration" | "optional_parameter_declaration"
            ) {
                if let Some(ty) = param.child_by_field_name("type") {
                    param_types.push(node_text(ty, source));
                }
            }
        }
    }

    let mut namespace_path = String::new();
    let mut containing_class = String::new();
    for ctx in context_stack {
        namespace_path.push_str(&ctx.name);
        namespace_path.push_str("::");
        if ctx.is_class {
            containing_class = ctx.name.clone();
        }
    }

    // Out-of-line definitions (`Class::method`) arrive already qualified.
    let qualified_name = if name.contains("::") {
        name.clone()
    } else {
        format!("{namespace_path}{name}")
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

fn unwrap_to_function_declarator(mut node: Node) -> Option<Node> {
    while matches!(node.kind(), "pointer_declarator" | "reference_declarator") {
        node = node.child_by_field_name("declarator")?;
    }
    (node.kind() == "function_declarator").then_some(node)
}

/// Callee of a C++ call: extends the C cases with qualified identifiers
/// and template functions.
fn cpp_call_target_name(node: Node, source: &[u8]) -> Option<String> {
    let target = node.child_by_field_name("function")?;
    let name = match target.kind() {
        "qualified_identifier" => node_text(target, source),
        "template_function" => target
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .unwrap_or_default(),
        "identifier" | "field_expression" | "parenthesized_expression" => {
            return call_target_name(node, source)
        }
        _ => node_text(target, source),
    };
    (!name.is_empty()).then_some(name)
}
