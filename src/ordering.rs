// Deterministic ordering helpers: recursive key sort and newest-first record ordering

use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::models::StatusRecord;

/// Sorts object keys ascending at every depth. Scalars and empty objects are left alone.
/// Objects nested in arrays are sorted too; array order itself is kept.
pub fn deep_sort_by_key(value: &mut Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (_, v) in entries.iter_mut() {
                deep_sort_by_key(v);
            }
            *map = entries.into_iter().collect::<Map<String, Value>>();
        }
        Value::Array(items) => items.iter_mut().for_each(deep_sort_by_key),
        _ => {}
    }
}

/// Orders by `last_state_change`, most recent first.
/// `Less` means `a` changed more recently than `b`; equal timestamps are `Equal`.
pub fn compare_by_recency(a: &StatusRecord, b: &StatusRecord) -> Ordering {
    b.last_state_change().cmp(&a.last_state_change())
}

pub fn sort_by_recency(records: &mut [StatusRecord]) {
    records.sort_by(compare_by_recency);
}
