//! The on-disk attribution cache.
//!
//! A single JSON file under `.git/` holding at most [`MAX_RECORDS`] records,
//! oldest first. Each record remembers one full answer — which subtree, which
//! relative paths, which HEAD commit, and the attributed times — so a rerun
//! against an unchanged HEAD can skip the history walk entirely.
//!
//! The cache is an optimization, never a correctness dependency: reads are
//! tolerant (anything that is not a JSON array of objects counts as "no
//! cache") and write failures are swallowed. Records with an alien shape are
//! carried along verbatim when the file is rewritten. No lock is taken;
//! concurrent runs race benignly and the last writer wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

const CACHE_FILE: &str = "gitmit_cached_commit_times.json";

/// Bound on the number of cached answers.
const MAX_RECORDS: usize = 5;

#[derive(Serialize)]
struct CacheRecord<'a> {
    parent_dir: &'a str,
    sorted_relpaths: &'a [String],
    commit: &'a str,
    commit_times: &'a BTreeMap<String, i64>,
}

/// Where the cache lives for a repository rooted at `root`.
#[must_use]
pub fn location(root: &Path) -> PathBuf {
    root.join(".git").join(CACHE_FILE)
}

/// Every record currently in the cache, oldest first.
///
/// A missing file, unparseable content, a non-array top level, or any
/// non-object element all read as an empty cache.
#[must_use]
pub fn all_records(root: &Path) -> Vec<Map<String, Value>> {
    let Ok(bytes) = fs::read(location(root)) else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_slice::<Value>(&bytes) else {
        return Vec::new();
    };
    let Value::Array(items) = value else {
        return Vec::new();
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(record) = item else {
            return Vec::new();
        };
        records.push(record);
    }
    records
}

/// Look up the cached answer for `(parent_dir, sorted_relpaths)`.
///
/// Returns the HEAD commit the answer was computed against (as 40-hex) and
/// the attributed times keyed by repository path. The caller decides whether
/// the recorded commit still matches the current HEAD.
#[must_use]
pub fn get(
    root: &Path,
    parent_dir: &str,
    sorted_relpaths: &[String],
) -> Option<(String, BTreeMap<String, i64>)> {
    for record in all_records(root) {
        if !matches_key(&record, parent_dir, sorted_relpaths) {
            continue;
        }
        let Some(commit) = record.get("commit").and_then(Value::as_str) else {
            continue;
        };
        let Some(times) = record.get("commit_times").and_then(Value::as_object) else {
            continue;
        };
        let commit_times = times
            .iter()
            .filter_map(|(path, seconds)| Some((path.clone(), seconds.as_i64()?)))
            .collect();
        return Some((commit.to_owned(), commit_times));
    }
    None
}

/// Record an answer, updating a record with the same key in place or
/// appending and evicting the oldest past capacity.
///
/// Failures (typically: no `.git` directory to write under) are logged at
/// debug level and otherwise ignored.
pub fn set(
    root: &Path,
    parent_dir: &str,
    commit: &str,
    commit_times: &BTreeMap<String, i64>,
    sorted_relpaths: &[String],
) {
    let record = CacheRecord {
        parent_dir,
        sorted_relpaths,
        commit,
        commit_times,
    };
    let Ok(Value::Object(record)) = serde_json::to_value(&record) else {
        return;
    };

    let mut records = all_records(root);
    if let Some(existing) = records
        .iter_mut()
        .find(|r| matches_key(r, parent_dir, sorted_relpaths))
    {
        *existing = record;
    } else {
        records.push(record);
        if records.len() > MAX_RECORDS {
            records.remove(0);
        }
    }

    let payload = Value::Array(records.into_iter().map(Value::Object).collect());
    match serde_json::to_vec(&payload) {
        Ok(bytes) => {
            if let Err(error) = fs::write(location(root), bytes) {
                debug!(%error, "could not write commit-times cache");
            }
        }
        Err(error) => debug!(%error, "could not serialize commit-times cache"),
    }
}

fn matches_key(record: &Map<String, Value>, parent_dir: &str, sorted_relpaths: &[String]) -> bool {
    if record.get("parent_dir").and_then(Value::as_str) != Some(parent_dir) {
        return false;
    }
    let Some(recorded) = record.get("sorted_relpaths").and_then(Value::as_array) else {
        return false;
    };
    recorded.len() == sorted_relpaths.len()
        && recorded
            .iter()
            .zip(sorted_relpaths)
            .all(|(a, b)| a.as_str() == Some(b))
}
