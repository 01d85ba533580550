//! Log line format.
//!
//! The backing file is a sequence of JSON documents, one per line:
//!
//! ```text
//! {"key":"/api/Fruits/apple","val":{"id":"apple","name":"McIntosh Apple"}}
//! {"key":"/api/Fruits/apple"}
//! ```
//!
//! A line with `val` sets the key. A line without `val` removes it. A `val` of
//! `null` is a set to null, not a removal.

use crate::error::{StoreError, StoreResult};
use crate::{Key, Record};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One entry in the append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub key: Key,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub val: Option<Record>,
}

/// Keeps an explicit `null` distinct from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Record>, D::Error>
where
    D: Deserializer<'de>,
{
    Record::deserialize(deserializer).map(Some)
}

impl LogLine {
    /// A line that sets `key` to `val`.
    pub fn set(key: impl Into<Key>, val: Record) -> Self {
        Self {
            key: key.into(),
            val: Some(val),
        }
    }

    /// A line that removes `key`.
    pub fn remove(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            val: None,
        }
    }

    /// Encode as a newline-terminated JSON document.
    pub fn encode(&self) -> StoreResult<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Decode a single line (without its newline). Bytes that are not valid
    /// UTF-8 are a decode error like any other malformed input.
    pub fn decode(line: impl AsRef<[u8]>) -> serde_json::Result<Self> {
        serde_json::from_slice(line.as_ref())
    }

    /// Apply this line to an in-memory map.
    pub fn apply(self, entries: &mut BTreeMap<Key, Record>) {
        match self.val {
            Some(val) => {
                entries.insert(self.key, val);
            }
            None => {
                entries.remove(&self.key);
            }
        }
    }
}

/// Counts from replaying a log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Lines applied to the map.
    pub applied: usize,
    /// Malformed lines that were skipped.
    pub skipped: usize,
    /// Whether the log ended in a partial line.
    pub torn_tail: bool,
}

/// Replay raw log bytes into `entries`, in file order.
///
/// In strict mode the first malformed line (including invalid UTF-8 and a torn
/// tail) fails the replay. Otherwise malformed lines are skipped with a
/// warning and a torn tail is ignored.
pub fn replay(
    contents: impl AsRef<[u8]>,
    strict: bool,
    entries: &mut BTreeMap<Key, Record>,
) -> StoreResult<ReplayStats> {
    let contents = contents.as_ref();
    let mut stats = ReplayStats::default();

    let (complete, tail) = match contents.iter().rposition(|&b| b == b'\n') {
        Some(end) => contents.split_at(end + 1),
        None => (&contents[..0], contents),
    };

    let mut line_no = 0;
    for raw in complete.split(|&b| b == b'\n') {
        line_no += 1;
        if is_blank(raw) {
            continue;
        }
        match LogLine::decode(raw) {
            Ok(line) => {
                line.apply(entries);
                stats.applied += 1;
            }
            Err(e) if strict => {
                return Err(StoreError::Corrupt {
                    line: line_no,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping malformed log line");
                stats.skipped += 1;
            }
        }
    }

    if !is_blank(tail) {
        if strict {
            return Err(StoreError::Corrupt {
                // The trailing empty split of `complete` already counted this line.
                line: line_no,
                reason: "unterminated final line".to_string(),
            });
        }
        tracing::warn!(bytes = tail.len(), "ignoring torn write at end of log");
        stats.torn_tail = true;
    }

    Ok(stats)
}

fn is_blank(raw: &[u8]) -> bool {
    raw.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIXTURE: &str = concat!(
        r#"{"key":"/api/Fruits/apple","val":{"id":"apple","name":"McIntosh Apple"}}"#,
        "\n",
        r#"{"key":"/api/Fruits/melon","val":{"id":"melon","name":"Cantaloupe"}}"#,
        "\n",
        r#"{"key":"/api/Veggies/broccoli","val":{"id":"broccoli","name":"Broccoli"}}"#,
        "\n",
    );

    #[test]
    fn encode_set_and_remove() {
        let set = LogLine::set("/a", json!({"x": 1})).encode().unwrap();
        assert_eq!(set, "{\"key\":\"/a\",\"val\":{\"x\":1}}\n");

        let rm = LogLine::remove("/a").encode().unwrap();
        assert_eq!(rm, "{\"key\":\"/a\"}\n");
    }

    #[test]
    fn explicit_null_is_not_a_removal() {
        let line = LogLine::decode(r#"{"key":"/a","val":null}"#).unwrap();
        assert_eq!(line.val, Some(serde_json::Value::Null));

        let line = LogLine::decode(r#"{"key":"/a"}"#).unwrap();
        assert_eq!(line.val, None);
    }

    #[test]
    fn replay_fixture() {
        let mut entries = BTreeMap::new();
        let stats = replay(FIXTURE, true, &mut entries).unwrap();

        assert_eq!(stats.applied, 3);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries["/api/Fruits/melon"],
            json!({"id": "melon", "name": "Cantaloupe"})
        );
    }

    #[test]
    fn later_lines_win_and_removals_apply() {
        let log = concat!(
            r#"{"key":"/a","val":1}"#,
            "\n",
            r#"{"key":"/b","val":2}"#,
            "\n",
            r#"{"key":"/a","val":3}"#,
            "\n",
            r#"{"key":"/b"}"#,
            "\n",
        );
        let mut entries = BTreeMap::new();
        replay(log, true, &mut entries).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries["/a"], json!(3));
    }

    #[test]
    fn lenient_replay_skips_garbage() {
        let log = concat!(
            r#"{"key":"/a","val":1}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"key":"/b","val":2}"#,
            "\n",
        );
        let mut entries = BTreeMap::new();
        let stats = replay(log, false, &mut entries).unwrap();

        assert_eq!(stats.applied, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn strict_replay_rejects_garbage() {
        let log = concat!(r#"{"key":"/a","val":1}"#, "\n", "not json\n");
        let mut entries = BTreeMap::new();
        let err = replay(log, true, &mut entries).unwrap_err();

        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn invalid_utf8_line() {
        let log = b"{\"key\":\"/a\",\"val\":1}\n\xff\xfe garbage\n{\"key\":\"/b\",\"val\":2}\n";

        let mut entries = BTreeMap::new();
        let stats = replay(log, false, &mut entries).unwrap();
        assert_eq!(stats.applied, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(entries["/b"], json!(2));

        let mut entries = BTreeMap::new();
        let err = replay(log, true, &mut entries).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn torn_tail() {
        let log = concat!(r#"{"key":"/a","val":1}"#, "\n", r#"{"key":"/b","va"#);

        let mut entries = BTreeMap::new();
        let stats = replay(log, false, &mut entries).unwrap();
        assert!(stats.torn_tail);
        assert_eq!(entries.len(), 1);

        let mut entries = BTreeMap::new();
        let err = replay(log, true, &mut entries).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn empty_log() {
        let mut entries = BTreeMap::new();
        let stats = replay("", true, &mut entries).unwrap();
        assert_eq!(stats, ReplayStats::default());
        assert!(entries.is_empty());
    }
}
