//! Flat extraction records produced by parse workers.
//!
//! These are the only data that crosses the worker/population boundary:
//! plain owned strings, no tree handles, cheap to move-append into the
//! shared accumulators.

/// A function definition found in a source file.
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    /// Qualified name before overload disambiguation.
    pub qualified_name: String,
    pub file_path: String,
    /// Parameter type texts, used to build an overload signature when two
    /// definitions share a qualified name.
    pub param_types: Vec<String>,
}

/// A call site: caller and callee by textual name.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub caller_name: String,
    /// Callee as written; resolved against the short-name lookup during
    /// population.
    pub callee_name: String,
}

/// A variable assignment, the unit of data-flow extraction.
#[derive(Debug, Clone)]
pub struct VariableRecord {
    /// Qualified variable name (`func::var` or `func.var`).
    pub qualified_name: String,
    pub containing_func: String,
    /// Right-hand side of the assignment: a function name, another
    /// variable, or a literal's text. Empty when the RHS is not tracked.
    pub value_source: String,
    /// True when the value comes from a function call's return value.
    pub from_function_call: bool,
}
