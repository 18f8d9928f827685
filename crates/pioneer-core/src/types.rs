//! Core identifier and classification types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Dense 64-bit identifier for a symbol. `0` is reserved as invalid.
pub type SymbolUid = u64;

/// Dense 64-bit identifier for an indexed file. Lives in its own namespace,
/// disjoint from symbol UIDs. `0` is reserved as invalid.
pub type FileUid = u64;

/// The reserved invalid UID, returned by lookups that miss.
pub const INVALID_UID: u64 = 0;

// ── Symbol Classification ───────────────────────────────────────────────────

/// Classification of an indexed symbol.
///
/// The integer values are part of the on-disk schema (`symbol_types` section)
/// and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolType {
    Function = 0,
    Variable = 1,
    End = 2,
}

impl SymbolType {
    /// Schema integer for the `symbol_types` section.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a schema integer. Unknown values fall back to `Function`,
    /// matching the lookup-miss default elsewhere in the graph.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Variable,
            2 => Self::End,
            _ => Self::Function,
        }
    }
}

impl std::fmt::Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Variable => write!(f, "variable"),
            Self::End => write!(f, "end"),
        }
    }
}

// ── Source Languages ────────────────────────────────────────────────────────

/// Source languages the indexer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    C,
    Cpp,
}

impl Language {
    /// Map a file extension (without the dot) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Self::Python),
            "c" | "h" => Some(Self::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Self::Cpp),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::C => "c",
            Self::Cpp => "cpp",
        }
    }

    /// Scope separator used in this language's qualified names.
    pub fn scope_separator(self) -> &'static str {
        match self {
            Self::Python => ".",
            Self::C | Self::Cpp => "::",
        }
    }
}

// ── Qualified Name Helpers ──────────────────────────────────────────────────

/// Tail segment of a qualified name, after the last `::` or `.` separator.
///
/// `"MyClass::foo"` and `"module.foo"` both yield `"foo"`; a name without
/// separators is returned unchanged.
pub fn short_name(qualified: &str) -> &str {
    let tail = match qualified.rfind("::") {
        Some(pos) => &qualified[pos + 2..],
        None => qualified,
    };
    match tail.rfind('.') {
        Some(pos) => &tail[pos + 1..],
        None => tail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_type_schema_roundtrip() {
        for ty in [SymbolType::Function, SymbolType::Variable, SymbolType::End] {
            assert_eq!(SymbolType::from_u8(ty.as_u8()), ty);
        }
    }

    #[test]
    fn unknown_symbol_type_defaults_to_function() {
        assert_eq!(SymbolType::from_u8(99), SymbolType::Function);
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("c"), Some(Language::C));
        assert_eq!(Language::from_extension("h"), Some(Language::C));
        for ext in ["cpp", "cc", "cxx", "hpp", "hh", "hxx"] {
            assert_eq!(Language::from_extension(ext), Some(Language::Cpp));
        }
        assert_eq!(Language::from_extension("rs"), None);
        assert_eq!(Language::from_extension(""), None);
    }

    #[test]
    fn short_name_strips_scopes() {
        assert_eq!(short_name("MyClass::foo"), "foo");
        assert_eq!(short_name("ns::MyClass::foo"), "foo");
        assert_eq!(short_name("module.Class.method"), "method");
        assert_eq!(short_name("bare"), "bare");
        assert_eq!(short_name("file::Class.method"), "method");
    }
}
