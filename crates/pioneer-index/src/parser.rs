//! Parsing coordinator.
//!
//! Detects the language from the file extension, runs the tree-sitter
//! parse, drives the language extractor, and flattens the results into the
//! owned record streams the pipeline accumulates.

use crate::extractor::LanguageExtractor;
use crate::languages;
use crate::record::{CallRecord, FunctionRecord, VariableRecord};
use pioneer_core::Language;
use std::path::Path;
use tree_sitter::Parser;

/// Record streams extracted from one source file.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub functions: Vec<FunctionRecord>,
    pub calls: Vec<CallRecord>,
    pub variables: Vec<VariableRecord>,
}

/// Coordinates tree-sitter parsing across the registered languages.
///
/// Not `Sync`: each parse worker builds its own instance.
pub struct SourceParser {
    extractors: Vec<Box<dyn LanguageExtractor>>,
}

impl SourceParser {
    pub fn new() -> Self {
        Self {
            extractors: languages::all_extractors(),
        }
    }

    pub fn supports_extension(&self, ext: &str) -> bool {
        self.extractors
            .iter()
            .any(|e| e.file_extensions().contains(&ext))
    }

    /// Parse one file and extract its records.
    ///
    /// Returns `None` when the extension is unknown or tree-sitter
    /// produced no tree; the caller skips the file.
    pub fn parse_file(&self, path: &str, content: &[u8]) -> Option<ParsedFile> {
        let ext = Path::new(path).extension().and_then(|e| e.to_str())?;
        let extractor = self
            .extractors
            .iter()
            .find(|e| e.file_extensions().contains(&ext))?;

        let mut parser = Parser::new();
        parser.set_language(&extractor.tree_sitter_language()).ok()?;
        let tree = parser.parse(content, None)?;

        // C top-level functions carry no scope of their own; prefix them
        // with the file name so same-named statics in different translation
        // units stay distinct.
        let file_prefix = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut out = ParsedFile::default();
        for mut func in extractor.extract_functions(&tree, content) {
            if extractor.language() == Language::C
                && !func.qualified_name.contains("::")
                && !func.qualified_name.contains('.')
            {
                func.qualified_name = format!("{file_prefix}::{}", func.qualified_name);
            }

            for call in extractor.extract_calls(&func, content) {
                let callee_name = if call.qualified_name.is_empty() {
                    call.name
                } else {
                    call.qualified_name
                };
                out.calls.push(CallRecord {
                    caller_name: func.qualified_name.clone(),
                    callee_name,
                });
            }

            for var in extractor.extract_variables(&func, content) {
                out.variables.push(VariableRecord {
                    qualified_name: var.qualified_name,
                    containing_func: var.containing_func,
                    value_source: var.value_source,
                    from_function_call: var.from_function_call,
                });
            }

            out.functions.push(FunctionRecord {
                qualified_name: func.qualified_name,
                file_path: path.to_string(),
                param_types: func.param_types,
            });
        }

        Some(out)
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new()
    }
}
