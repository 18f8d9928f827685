//! pioneer-core: Shared types, errors, and configuration for the Pioneer
//! cross-reference indexer.

pub mod config;
pub mod error;
pub mod intern;
pub mod types;
pub mod version;

pub use config::PioneerConfig;
pub use error::PioneerError;
pub use intern::StringPool;
pub use types::*;
