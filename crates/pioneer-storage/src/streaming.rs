//! Dedicated streaming reads.
//!
//! Small read-only operations that answer straight off the index file and
//! halt the parse as soon as their region has been consumed, without
//! constructing a graph. `list` and `search` only ever touch the `UIDs`
//! map; `grep` only needs `file_paths`.

use crate::reader::open_index;
use pioneer_core::PioneerError;
use serde::de::{DeserializeSeed, Error as DeError, IgnoredAny, MapAccess, Visitor};
use std::fmt;
use std::io::BufReader;
use std::path::Path;

/// Sentinel error message used to abort the parse once the region of
/// interest has been fully consumed.
const HALT: &str = "halt";

/// Stream symbol names whose qualified name contains every pattern as a
/// substring. An empty pattern list matches everything.
pub fn stream_search_symbols(
    path: &Path,
    patterns: &[String],
) -> Result<Vec<String>, PioneerError> {
    let file = open_index(path)?;
    let mut state = SearchState {
        patterns,
        matches: Vec::new(),
        done: false,
    };

    let mut de = serde_json::Deserializer::from_reader(BufReader::new(file));
    match (SearchRootSeed { state: &mut state }).deserialize(&mut de) {
        Ok(()) => Ok(state.matches),
        Err(_) if state.done => Ok(state.matches),
        Err(err) => Err(PioneerError::IndexParse(err.to_string())),
    }
}

/// Stream every symbol name in the index.
pub fn stream_all_symbols(path: &Path) -> Result<Vec<String>, PioneerError> {
    stream_search_symbols(path, &[])
}

/// Stream the indexed file paths without loading anything else.
pub fn stream_file_paths(path: &Path) -> Result<Vec<String>, PioneerError> {
    let file = open_index(path)?;
    let mut state = FilePathState {
        paths: Vec::new(),
        done: false,
    };

    let mut de = serde_json::Deserializer::from_reader(BufReader::new(file));
    match (FilePathRootSeed { state: &mut state }).deserialize(&mut de) {
        Ok(()) => Ok(state.paths),
        Err(_) if state.done => Ok(state.paths),
        Err(err) => Err(PioneerError::IndexParse(err.to_string())),
    }
}

// ── Symbol search ───────────────────────────────────────────────────────

struct SearchState<'p> {
    patterns: &'p [String],
    matches: Vec<String>,
    done: bool,
}

struct SearchRootSeed<'a, 'p> {
    state: &'a mut SearchState<'p>,
}

impl<'de> DeserializeSeed<'de> for SearchRootSeed<'_, '_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for SearchRootSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an index object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "metadata" {
                map.next_value_seed(SearchMetadataSeed {
                    state: &mut *self.state,
                })?;
                // The UIDs map lives inside metadata; once the section is
                // consumed there is nothing left to read.
                self.state.done = true;
                return Err(A::Error::custom(HALT));
            }
            map.next_value::<IgnoredAny>()?;
        }
        Ok(())
    }
}

struct SearchMetadataSeed<'a, 'p> {
    state: &'a mut SearchState<'p>,
}

impl<'de> DeserializeSeed<'de> for SearchMetadataSeed<'_, '_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for SearchMetadataSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an index metadata object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "UIDs" {
                map.next_value_seed(UidsSearchSeed {
                    state: &mut *self.state,
                })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct UidsSearchSeed<'a, 'p> {
    state: &'a mut SearchState<'p>,
}

impl<'de> DeserializeSeed<'de> for UidsSearchSeed<'_, '_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for UidsSearchSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a name-to-UID map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(name) = map.next_key::<String>()? {
            if self.state.patterns.iter().all(|p| name.contains(p.as_str())) {
                self.state.matches.push(name);
            }
            map.next_value::<IgnoredAny>()?;
        }
        Ok(())
    }
}

// ── File paths ──────────────────────────────────────────────────────────

struct FilePathState {
    paths: Vec<String>,
    done: bool,
}

struct FilePathRootSeed<'a> {
    state: &'a mut FilePathState,
}

impl<'de> DeserializeSeed<'de> for FilePathRootSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for FilePathRootSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an index object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "file_paths" {
                map.next_value_seed(FilePathsCollectSeed {
                    state: &mut *self.state,
                })?;
                self.state.done = true;
                return Err(A::Error::custom(HALT));
            }
            map.next_value::<IgnoredAny>()?;
        }
        Ok(())
    }
}

struct FilePathsCollectSeed<'a> {
    state: &'a mut FilePathState,
}

impl<'de> DeserializeSeed<'de> for FilePathsCollectSeed<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for FilePathsCollectSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a file-UID-to-path map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some((_, path)) = map.next_entry::<String, String>()? {
            self.state.paths.push(path);
        }
        Ok(())
    }
}
