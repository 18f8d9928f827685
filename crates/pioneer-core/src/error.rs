/// Unified error type for Pioneer.
#[derive(Debug, thiserror::Error)]
pub enum PioneerError {
    #[error("Index file not found: {0}. Run 'pioneer index' first")]
    IndexMissing(String),

    #[error(
        "Index file version {found} is not compatible with this version of pioneer \
         (requires >= {required}). Please re-index"
    )]
    SchemaIncompatible { found: String, required: String },

    #[error("Failed to parse index file: {0}")]
    IndexParse(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Invalid query: {0}")]
    BadQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
