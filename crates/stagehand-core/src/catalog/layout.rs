//! Key order of a rewritten catalog
//!
//! The site owns the catalog too and may keep its own fields anywhere in an
//! object. A save lays every object out in the order of the file it
//! replaces; keys that file did not have follow in serialized order.

use serde_json::{Map, Value};

/// Keys that identify an element of a catalog array (apps, then records)
const IDENTITY_KEYS: [&str; 2] = ["id", "version"];

/// Reorder the keys of `value` to follow `previous`, recursively
pub(crate) fn align_to(value: &mut Value, previous: &Value) {
    match (value, previous) {
        (Value::Object(map), Value::Object(prev)) => {
            for (key, child) in map.iter_mut() {
                if let Some(prev_child) = prev.get(key) {
                    align_to(child, prev_child);
                }
            }
            reorder(map, prev);
        }
        (Value::Array(items), Value::Array(prev)) => {
            for (index, item) in items.iter_mut().enumerate() {
                let found = counterpart(item, prev, index);
                if let Some(found) = found {
                    align_to(item, found);
                }
            }
        }
        _ => {}
    }
}

/// The element of `previous` that `item` was rendered from. Records move
/// when a newer one is inserted, so identity wins over position.
fn counterpart<'a>(item: &Value, previous: &'a [Value], index: usize) -> Option<&'a Value> {
    for key in IDENTITY_KEYS {
        let Some(id) = item.get(key).and_then(Value::as_str) else {
            continue;
        };
        if let Some(found) = previous
            .iter()
            .find(|p| p.get(key).and_then(Value::as_str) == Some(id))
        {
            return Some(found);
        }
    }
    previous.get(index)
}

fn reorder(map: &mut Map<String, Value>, previous: &Map<String, Value>) {
    let mut entries: Vec<(String, Option<Value>)> = std::mem::take(map)
        .into_iter()
        .map(|(k, v)| (k, Some(v)))
        .collect();

    for key in previous.keys() {
        if let Some((k, v)) = entries.iter_mut().find(|(k, _)| k == key) {
            if let Some(v) = v.take() {
                map.insert(k.clone(), v);
            }
        }
    }
    for (k, v) in entries {
        if let Some(v) = v {
            map.insert(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(value: &Value) -> Vec<&str> {
        value
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_previous_order_then_new_keys() {
        let mut value = json!({"id": "a", "name": "A", "new": true, "icon": "i"});
        let previous = json!({"icon": "old", "id": "a", "gone": 1, "name": "A"});
        align_to(&mut value, &previous);
        assert_eq!(keys(&value), vec!["icon", "id", "name", "new"]);
        assert_eq!(value["icon"], "i");
    }

    #[test]
    fn test_array_elements_matched_by_identity() {
        let mut value = json!([
            {"version": "1.0.0-beta.2", "date": "2024-03-01"},
            {"version": "1.0.0-beta.1", "date": "2024-02-01", "pinned": true}
        ]);
        let previous = json!([
            {"pinned": false, "date": "2024-02-01", "version": "1.0.0-beta.1"}
        ]);
        align_to(&mut value, &previous);
        assert_eq!(keys(&value[1]), vec!["pinned", "date", "version"]);
        assert_eq!(keys(&value[0]), vec!["date", "version"]);
    }
}
