//! Directory trie over indexed file paths.
//!
//! Persisted as the `path_trie` section of the index so directory-scoped
//! tooling can locate files without scanning the whole `file_paths` table.

use pioneer_core::FileUid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One directory in the path trie. Carries the UIDs of files directly in
/// this directory plus a map of subdirectories.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subdirs: BTreeMap<String, PathNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileUid>,
}

/// Build a path trie from `(file_uid, path)` pairs.
///
/// Paths are split on `/` (and `\` for indexes built on Windows); every
/// component but the last names a directory. Input order does not matter:
/// entries are sorted by path so the serialized trie is deterministic.
pub fn build_path_trie<'a>(files: impl Iterator<Item = (FileUid, &'a str)>) -> PathNode {
    let mut entries: Vec<(FileUid, &str)> = files.collect();
    entries.sort_by(|a, b| a.1.cmp(b.1));

    let mut root = PathNode::default();
    for (uid, path) in entries {
        let components: Vec<&str> = path
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();
        if components.is_empty() {
            continue;
        }
        let mut node = &mut root;
        for dir in &components[..components.len() - 1] {
            node = node.subdirs.entry((*dir).to_string()).or_default();
        }
        node.files.push(uid);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_at_root() {
        let trie = build_path_trie([(1, "main.c")].into_iter());
        assert_eq!(trie.files, vec![1]);
        assert!(trie.subdirs.is_empty());
    }

    #[test]
    fn nested_directories() {
        let trie = build_path_trie(
            [
                (1, "src/lib/a.c"),
                (2, "src/lib/b.c"),
                (3, "src/main.c"),
                (4, "README.h"),
            ]
            .into_iter(),
        );

        assert_eq!(trie.files, vec![4]);
        let src = trie.subdirs.get("src").expect("src dir");
        assert_eq!(src.files, vec![3]);
        let lib = src.subdirs.get("lib").expect("lib dir");
        assert_eq!(lib.files, vec![1, 2]);
    }

    #[test]
    fn leading_dot_component_is_dropped() {
        let trie = build_path_trie([(7, "./src/x.py")].into_iter());
        let src = trie.subdirs.get("src").expect("src dir");
        assert_eq!(src.files, vec![7]);
    }

    #[test]
    fn input_order_does_not_change_shape() {
        let a = build_path_trie([(1, "a/x.c"), (2, "b/y.c")].into_iter());
        let b = build_path_trie([(2, "b/y.c"), (1, "a/x.c")].into_iter());
        assert_eq!(a, b);
    }
}
