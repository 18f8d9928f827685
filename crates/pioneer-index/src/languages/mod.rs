//! Language registry for extraction.
//!
//! Each language implements the `LanguageExtractor` trait and is
//! registered here.

pub mod c;
pub mod cpp;
pub mod python;

use crate::extractor::LanguageExtractor;

/// Returns all available language extractors.
pub fn all_extractors() -> Vec<Box<dyn LanguageExtractor>> {
    vec![
        Box::new(python::PythonExtractor::new()),
        Box::new(c::CExtractor::new()),
        Box::new(cpp::CppExtractor::new()),
    ]
}
