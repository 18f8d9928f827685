//! C extractor using tree-sitter-c.

use crate::extractor::{
    node_text, visit_nodes, FunctionCall, FunctionDef, LanguageExtractor, VariableDef,
};
use pioneer_core::Language;
use tree_sitter::{Node, Tree};

/// C language extractor.
pub struct CExtractor;

impl CExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for CExtractor {
    fn language(&self) -> Language {
        Language::C
    }

    fn file_extensions(&self) -> &[&str] {
        &["c", "h"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_c::LANGUAGE.into()
    }

    fn extract_functions<'t>(&self, tree: &'t Tree, source: &[u8]) -> Vec<FunctionDef<'t>> {
        let mut functions = Vec::new();
        visit_nodes(tree.root_node(), |node| {
            if node.kind() != "function_definition" {
                return;
            }
            if let Some(func) = extract_function(node, source) {
                functions.push(func);
            }
        });
        functions
    }

    fn extract_calls<'t>(&self, func: &FunctionDef<'t>, source: &[u8]) -> Vec<FunctionCall<'t>> {
        let mut calls = Vec::new();
        visit_nodes(func.node, |node| {
            if node.kind() != "call_expression" {
                return;
            }
            if let Some(name) = call_target_name(node, source) {
                calls.push(FunctionCall {
                    qualified_name: name.clone(),
                    name,
                    line: node.start_position().row + 1,
                    node,
                });
            }
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

fn extract_function<'t>(node: Node<'t>, source: &[u8]) -> Option<FunctionDef<'t>> {
    let declarator = node.child_by_field_name("declarator")?;
    let func_decl = unwrap_to_function_declarator(declarator)?;

    let name = node_text(func_decl.child_by_field_name("declarator")?, source);
    if name.is_empty() {
        return None;
    }

    let mut param_types = Vec::new();
    if let Some(params) = func_decl.child_by_field_name("parameters") {
        for i in 0..params.named_child_count() {
            let Some(param) = params.named_child(i) else {
                continue;
            };
            if param.kind() == "parameter_declaration" {
                if let Some(ty) = param.child_by_field_name("type") {
                    param_types.push(node_text(ty, source));
                }
            }
        }
    }

    Some(FunctionDef {
        qualified_name: name.clone(),
        name,
        containing_class: String::new(),
        namespace_path: String::new(),
        param_types,
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        node,
    })
}

/// Peel pointer declarators off until the function declarator is reached.
fn unwrap_to_function_declarator(mut node: Node) -> Option<Node> {
    while node.kind() == "pointer_declarator" {
        node = node.child_by_field_name("declarator")?;
    }
    (node.kind() == "function_declarator").then_some(node)
}

/// Callee name of a `call_expression`: a plain identifier, the field of a
/// `s.f()` / `s->f()` expression, or the text of a function-pointer call.
pub(super) fn call_target_name(node: Node, source: &[u8]) -> Option<String> {
    let target = node.child_by_field_name("function")?;
    let name = match target.kind() {
        "identifier" => node_text(target, source),
        "field_expression" => target
            .child_by_field_name("field")
            .map(|f| node_text(f, source))
            .unwrap_or_default(),
        "parenthesized_expression" => node_text(target, source),
        _ => String::new(),
    };
    (!name.is_empty()).then_some(name)
}

/// Shared C/C++ variable-assignment extraction. Both grammars expose
/// `init_declarator` for declarations with initializers and
/// `assignment_expression` for plain assignments; only the qualified-name
/// separator differs.
pub(super) fn extract_c_style_variables<'t>(
    func: &FunctionDef<'t>,
    source: &[u8],
    separator: &str,
) -> Vec<VariableDef<'t>> {
    let mut variables = Vec::new();

    visit_nodes(func.node, |node| {
        let (name, value) = match node.kind() {
            "init_declarator" => {
                let Some(decl) = node.child_by_field_name("declarator") else {
                    return;
                };
                let name = declared_variable_name(decl, source);
                (name, node.child_by_field_name("value"))
            }
            "assignment_expression" => {
                let Some(left) = node.child_by_field_name("left") else {
                    return;
                };
                let name = match left.kind() {
                    "identifier" | "field_expression" | "pointer_expression" => {
                        node_text(left, source)
                    }
                    _ => String::new(),
                };
                (name, node.child_by_field_name("right"))
            }
            _ => return,
        };
        if name.is_empty() {
            return;
        }

        let (value_source, from_function_call) =
            value.map_or((String::new(), false), |v| classify_value(v, source));

        variables.push(VariableDef {
            qualified_name: format!("{}{}{}", func.qualified_name, separator, name),
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

/// Variable name from an init-declarator's declarator, peeling pointers.
fn declared_variable_name(mut node: Node, source: &[u8]) -> String {
    while matches!(node.kind(), "pointer_declarator" | "reference_declarator") {
        match node.child_by_field_name("declarator") {
            Some(inner) => node = inner,
            None => return String::new(),
        }
    }
    if node.kind() == "identifier" {
        node_text(node, source)
    } else {
        String::new()
    }
}

/// Classify an initializer or assignment RHS into a data-flow source.
pub(super) fn classify_value(node: Node, source: &[u8]) -> (String, bool) {
    match node.kind() {
        "call_expression" => (
            call_target_name(node, source).unwrap_or_default(),
            true,
        ),
        "identifier" | "field_expression" => (node_text(node, source), false),
        "number_literal" | "string_literal" | "char_literal" | "concatenated_string" | "true"
        | "false" | "null" | "nullptr" => (node_text(node, source), false),
        _ => (String::new(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .expect("failed to set C language");
        parser.parse(source.as_bytes(), None).expect("failed to parse")
    }

    #[test]
    fn extract_simple_function() {
        let source = "void leaf(void) {}\nint caller(int x) { return x; }\n";
        let tree = parse(source);
        let extractor = CExtractor::new();
        let functions = extractor.extract_functions(&tree, source.as_bytes());

        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].name, "leaf");
        assert_eq!(functions[1].name, "caller");
        assert_eq!(functions[1].param_types, vec!["int"]);
    }

    #[test]
    fn pointer_returning_function_is_found() {
        let source = "char *dup(const char *s) { return 0; }\n";
        let tree = parse(source);
        let extractor = CExtractor::new();
        let functions = extractor.extract_functions(&tree, source.as_bytes());

        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "dup");
    }

    #[test]
    fn extract_direct_and_member_calls() {
        let source = "void f(void) { g(); s.handler(); p->run(); }\n";
        let tree = parse(source);
        let extractor = CExtractor::new();
        let functions = extractor.extract_functions(&tree, source.as_bytes());
        let calls = extractor.extract_calls(&functions[0], source.as_bytes());

        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"g"), "calls: {names:?}");
        assert!(names.contains(&"handler"), "calls: {names:?}");
        assert!(names.contains(&"run"), "calls: {names:?}");
    }

    #[test]
    fn init_declarator_from_call() {
        let source = "void f(void) { int x = get_value(); }\n";
        let tree = parse(source);
        let extractor = CExtractor::new();
        let functions = extractor.extract_functions(&tree, source.as_bytes());
        let vars = extractor.extract_variables(&functions[0], source.as_bytes());

        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].qualified_name, "f::x");
        assert_eq!(vars[0].value_source, "get_value");
        assert!(vars[0].from_function_call);
    }

    #[test]
    fn member_assignment_is_tracked() {
        let source = "void init(struct dev *d) { d->state = 1; }\n";
        let tree = parse(source);
        let extractor = CExtractor::new();
        let functions = extractor.extract_functions(&tree, source.as_bytes());
        let vars = extractor.extract_variables(&functions[0], source.as_bytes());

        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].qualified_name, "init::d->state");
        assert_eq!(vars[0].value_source, "1");
    }

    #[test]
    fn assignment_from_variable() {
        let source = "void f(void) { int a = 1; int b; b = a; }\n";
        let tree = parse(source);
        let extractor = CExtractor::new();
        let functions = extractor.extract_functions(&tree, source.as_bytes());
        let vars = extractor.extract_variables(&functions[0], source.as_bytes());

        let b = vars.iter().find(|v| v.name == "b").unwrap();
        assert_eq!(b.value_source, "a");
        assert!(!b.from_function_call);
    }
}
