//! End-to-end comparison tests over real temp directories.

use super::*;
use crate::config::CoreConfig;
use filetime::FileTime;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

fn write_pinned(path: &Path, content: &str, mtime_secs: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    filetime::set_file_mtime(path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
}

fn paths(records: &[FileRecord]) -> Vec<&str> {
    records.iter().map(|r| r.relative_path.as_str()).collect()
}

fn pair_paths(pairs: &[(FileRecord, FileRecord)]) -> Vec<&str> {
    pairs.iter().map(|(l, _)| l.relative_path.as_str()).collect()
}

#[test]
fn self_compare_with_hash_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_pinned(&dir.path().join("a.txt"), "alpha", 1_000);
    write_pinned(&dir.path().join("sub/b.txt"), "beta", 2_000);
    fs::create_dir(dir.path().join("empty")).unwrap();

    let result = compare_dirs(dir.path(), dir.path(), true).unwrap();

    assert!(result.only_left.is_empty());
    assert!(result.only_right.is_empty());
    assert!(result.differing.is_empty());
    assert_eq!(pair_paths(&result.identical), vec!["a.txt", "empty", "sub", "sub/b.txt"]);
    assert!(result.is_identical());
}

#[test]
fn every_path_lands_in_exactly_one_partition() {
    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();

    write_pinned(&left.path().join("same.txt"), "same", 1_000);
    write_pinned(&right.path().join("same.txt"), "same", 1_000);
    write_pinned(&left.path().join("changed.txt"), "old", 1_000);
    write_pinned(&right.path().join("changed.txt"), "newer", 2_000);
    write_pinned(&left.path().join("left_only/x.txt"), "x", 1_000);
    write_pinned(&right.path().join("right_only.txt"), "y", 1_000);
    // Same name, different kind
    write_pinned(&left.path().join("kind"), "file", 1_000);
    write_pinned(&right.path().join("kind/child.txt"), "child", 1_000);

    let left_snapshot = index_tree(left.path(), false, 1000).unwrap();
    let right_snapshot = index_tree(right.path(), false, 1000).unwrap();
    let result = diff_snapshots(&left_snapshot, &right_snapshot, false);

    let union: BTreeSet<&str> = left_snapshot
        .entries
        .keys()
        .chain(right_snapshot.entries.keys())
        .map(String::as_str)
        .collect();

    let mut seen: HashMap<String, usize> = HashMap::new();
    for entry in result.entries() {
        *seen.entry(entry.relative_path().to_string()).or_default() += 1;
    }
    assert_eq!(seen.len(), union.len());
    assert!(seen.values().all(|&count| count == 1));
    assert_eq!(result.total(), union.len());

    assert_eq!(paths(&result.only_left), vec!["left_only", "left_only/x.txt"]);
    assert_eq!(paths(&result.only_right), vec!["kind/child.txt", "right_only.txt"]);
    assert_eq!(pair_paths(&result.differing), vec!["changed.txt", "kind"]);
    assert_eq!(pair_paths(&result.identical), vec!["same.txt"]);
}

#[test]
fn metadata_mode_misses_same_size_content_change_but_hash_mode_catches_it() {
    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();
    write_pinned(&left.path().join("doc.txt"), "aaaa", 5_000);
    write_pinned(&right.path().join("doc.txt"), "bbbb", 5_000);

    let by_metadata = compare_dirs(left.path(), right.path(), false).unwrap();
    assert_eq!(pair_paths(&by_metadata.identical), vec!["doc.txt"]);

    let by_hash = compare_dirs(left.path(), right.path(), true).unwrap();
    assert_eq!(pair_paths(&by_hash.differing), vec!["doc.txt"]);
}

#[test]
fn hash_mode_ignores_mtime_when_content_matches() {
    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();
    write_pinned(&left.path().join("doc.txt"), "content", 1_000);
    write_pinned(&right.path().join("doc.txt"), "content", 9_000);

    assert_eq!(
        pair_paths(&compare_dirs(left.path(), right.path(), false).unwrap().differing),
        vec!["doc.txt"]
    );
    assert_eq!(
        pair_paths(&compare_dirs(left.path(), right.path(), true).unwrap().identical),
        vec!["doc.txt"]
    );
}

#[test]
fn partitions_are_sorted_by_relative_path() {
    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();
    for name in ["zeta.txt", "Alpha.txt", "mid/inner.txt", "beta.txt"] {
        write_pinned(&left.path().join(name), name, 1_000);
    }

    let result = compare_dirs(left.path(), right.path(), false).unwrap();
    let only_left = paths(&result.only_left);
    let mut sorted = only_left.clone();
    sorted.sort();
    assert_eq!(only_left, sorted);
    assert_eq!(only_left.first(), Some(&"Alpha.txt"));
}

#[test]
fn roots_are_reported_canonicalized() {
    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();
    fs::create_dir(left.path().join("sub")).unwrap();

    let dotted = left.path().join("sub").join("..");
    let result = compare_dirs(&dotted, right.path(), false).unwrap();
    assert_eq!(result.left_root, fs::canonicalize(left.path()).unwrap());
    assert_eq!(result.right_root, fs::canonicalize(right.path()).unwrap());
}

#[test]
fn missing_side_is_an_error() {
    let left = tempfile::tempdir().unwrap();
    let result = compare_dirs(left.path(), &left.path().join("missing"), false);
    assert!(matches!(result, Err(IndexError::RootInaccessible { .. })));
}

#[test]
fn config_limit_caps_both_sides() {
    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();
    for i in 0..5 {
        write_pinned(&left.path().join(format!("f{i}.txt")), "x", 1_000);
    }
    let config = CoreConfig {
        index_entry_limit: 2,
        ..CoreConfig::default()
    };

    let result = compare_dirs_with_config(left.path(), right.path(), false, &config).unwrap();
    assert_eq!(result.only_left.len(), 2);
}

#[test]
#[cfg(unix)]
fn non_utf8_names_are_not_matched_across_sides() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();
    write_pinned(&left.path().join(OsStr::from_bytes(b"a\xff")), "same", 1_000);
    write_pinned(&right.path().join(OsStr::from_bytes(b"a\xfe")), "same", 1_000);

    let result = compare_dirs(left.path(), right.path(), true).unwrap();

    assert!(result.identical.is_empty());
    assert_eq!(paths(&result.only_left), vec!["a\\xff"]);
    assert_eq!(paths(&result.only_right), vec!["a\\xfe"]);
}

#[test]
#[cfg(unix)]
fn unreadable_file_compares_as_differing_in_hash_mode() {
    use std::os::unix::fs::PermissionsExt;

    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();
    write_pinned(&left.path().join("doc.txt"), "content", 1_000);
    write_pinned(&right.path().join("doc.txt"), "content", 1_000);
    let locked = left.path().join("doc.txt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users read through mode 000
    if fs::File::open(&locked).is_ok() {
        return;
    }
    let result = compare_dirs(left.path(), right.path(), true).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(pair_paths(&result.differing), vec!["doc.txt"]);
    let (left_record, right_record) = &result.differing[0];
    assert_eq!(left_record.content_hash, None);
    assert!(right_record.content_hash.is_some());
}
