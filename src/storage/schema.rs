//! Versioned upgrades of the stored diary entry list.
//!
//! Version 1 (no version key stored) kept each entry's `deepChat` as a flat
//! list of messages with the primary companion. Version 2 keys threads by
//! companion id, the flat list moving under `"default"`.

use serde_json::{Map, Value};

use crate::models::entry::{DiaryEntry, DEFAULT_THREAD};

/// Current entry schema version. Bump this and add a step to [`upgrade`]
/// whenever the stored shape changes.
pub const CURRENT_VERSION: u32 = 2;

/// Reads the stored version; absent or unreadable means version 1.
pub fn parse_version(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(1)
}

/// v1 -> v2 for a single entry. Idempotent: an entry already keyed by
/// companion is returned unchanged. Returns whether the entry changed.
pub fn upgrade_chat_threads(entry: &mut Value) -> bool {
    let Some(obj) = entry.as_object_mut() else {
        return false;
    };
    match obj.get_mut("deepChat") {
        Some(chat) if chat.is_array() => {
            let flat = chat.take();
            let mut threads = Map::new();
            threads.insert(DEFAULT_THREAD.to_string(), flat);
            *chat = Value::Object(threads);
            true
        }
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct Upgraded {
    pub entries: Vec<DiaryEntry>,
    /// Entries whose shape changed.
    pub upgraded: usize,
    /// Entries that could not be decoded and were dropped.
    pub skipped: usize,
}

impl Upgraded {
    /// Whether the upgraded list differs from what is stored.
    pub fn needs_write_back(&self, from_version: u32) -> bool {
        from_version < CURRENT_VERSION || self.upgraded > 0 || self.skipped > 0
    }
}

/// Decodes a stored entry list written at `from_version`, upgrading it to
/// [`CURRENT_VERSION`]. `None` when the blob is not a JSON array.
pub fn upgrade(raw: &str, from_version: u32) -> Option<Upgraded> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        return None;
    };

    tracing::info!(
        current_version = from_version,
        target_version = CURRENT_VERSION,
        entries = items.len(),
        "checking entry schema"
    );

    let mut out = Upgraded::default();
    for mut item in items {
        if upgrade_chat_threads(&mut item) {
            out.upgraded += 1;
        }
        match serde_json::from_value::<DiaryEntry>(item) {
            Ok(entry) => out.entries.push(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable diary entry");
                out.skipped += 1;
            }
        }
    }

    if out.upgraded > 0 {
        tracing::info!(
            upgraded = out.upgraded,
            "applied entry schema upgrade v001 -> v002 (per-companion chat threads)"
        );
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_entry() -> Value {
        json!({
            "id": "1",
            "content": "old",
            "mood": "😌",
            "timestamp": 1700000000000i64,
            "aiComments": [],
            "deepChat": [
                { "role": "user", "content": "hello" },
                { "role": "model", "content": "hi there" }
            ],
            "privacy": "private"
        })
    }

    #[test]
    fn test_flat_chat_moves_under_default() {
        let mut entry = legacy_entry();
        assert!(upgrade_chat_threads(&mut entry));
        assert_eq!(entry["deepChat"]["default"][1]["content"], "hi there");
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let mut once = json!([legacy_entry(), { "deepChat": { "fan-1": [] } }, 7]);
        for item in once.as_array_mut().unwrap() {
            upgrade_chat_threads(item);
        }
        let mut twice = once.clone();
        for item in twice.as_array_mut().unwrap() {
            assert!(!upgrade_chat_threads(item));
        }
        assert_eq!(once, twice);
    }

    #[test]
    fn test_upgrade_decodes_and_counts() {
        let current = json!({
            "id": "2",
            "content": "new",
            "mood": "😊",
            "timestamp": 1700000100000i64,
            "deepChat": { "default": [] }
        });
        let raw = json!([current, legacy_entry(), { "id": "broken" }]).to_string();

        let out = upgrade(&raw, 1).unwrap();
        assert_eq!(out.entries.len(), 2);
        assert_eq!(out.upgraded, 1);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.entries[1].thread(DEFAULT_THREAD).len(), 2);
        assert!(out.needs_write_back(1));
    }

    #[test]
    fn test_current_list_needs_no_write_back() {
        let raw = json!([{
            "id": "2",
            "content": "new",
            "mood": "😊",
            "timestamp": 0,
            "deepChat": {}
        }])
        .to_string();

        let out = upgrade(&raw, CURRENT_VERSION).unwrap();
        assert!(!out.needs_write_back(CURRENT_VERSION));
    }

    #[test]
    fn test_non_array_blob_is_rejected() {
        assert!(upgrade("{\"id\":1}", 1).is_none());
        assert!(upgrade("garbage", 1).is_none());
    }

    #[test]
    fn test_parse_version_defaults_to_legacy() {
        assert_eq!(parse_version(None), 1);
        assert_eq!(parse_version(Some("x")), 1);
        assert_eq!(parse_version(Some("2")), 2);
    }
}
