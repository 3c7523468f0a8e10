//! Navigating and modifying record documents by dot-joined sub-path.
//!
//! Sub-path segments address object keys, or array indices when the value
//! at that level is an array.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

fn components(sub_path: Option<&str>) -> Vec<&str> {
    sub_path
        .map(|p| p.split('.').filter(|c| !c.is_empty()).collect())
        .unwrap_or_default()
}

/// Get a reference to the value at `sub_path`, or the whole tree for `None`.
pub fn get_path<'a>(tree: &'a Value, sub_path: Option<&str>) -> Option<&'a Value> {
    let mut cursor = tree;
    for component in components(sub_path) {
        cursor = match cursor {
            Value::Object(map) => map.get(component)?,
            Value::Array(arr) => arr.get(component.parse::<usize>().ok()?)?,
            // Can't traverse into primitive values
            _ => return None,
        };
    }
    Some(cursor)
}

/// Set a value at `sub_path`, replacing the whole tree for `None`.
///
/// Missing intermediate levels are created as objects; a `null` on the way is
/// replaced by an object. Arrays accept an index inside the array or one past
/// its end.
pub fn set_path(tree: &mut Value, sub_path: Option<&str>, value: Value) -> Result<()> {
    let components = components(sub_path);
    let Some((last, parents)) = components.split_last() else {
        *tree = value;
        return Ok(());
    };

    let mut cursor = tree;
    for (position, component) in parents.iter().enumerate() {
        cursor = child_mut(cursor, component, position)?;
    }
    set_child(cursor, last, value, parents.len())
}

/// Descend one level, creating an empty object when the key is missing.
fn child_mut<'a>(parent: &'a mut Value, key: &str, position: usize) -> Result<&'a mut Value> {
    if parent.is_null() {
        *parent = Value::Object(Map::new());
    }

    match parent {
        Value::Object(map) => Ok(map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(arr) => {
            let len = arr.len();
            let index = array_index(key, position)?;
            if index == len {
                arr.push(Value::Object(Map::new()));
            }
            arr.get_mut(index).ok_or_else(|| {
                Error::invalid_path(format!(
                    "array index {} out of bounds (len={}) at position {}",
                    index, len, position
                ))
            })
        }
        _ => Err(Error::invalid_path(format!(
            "cannot descend into primitive value at '{}'",
            key
        ))),
    }
}

/// Set a child value on an object or array.
fn set_child(parent: &mut Value, key: &str, value: Value, position: usize) -> Result<()> {
    if parent.is_null() {
        *parent = Value::Object(Map::new());
    }

    match parent {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let index = array_index(key, position)?;
            if index < arr.len() {
                arr[index] = value;
            } else if index == arr.len() {
                arr.push(value);
            } else {
                return Err(Error::invalid_path(format!(
                    "array index {} out of bounds (len={})",
                    index,
                    arr.len()
                )));
            }
            Ok(())
        }
        _ => Err(Error::invalid_path(format!(
            "cannot set child '{}' on primitive value",
            key
        ))),
    }
}

fn array_index(key: &str, position: usize) -> Result<usize> {
    key.parse::<usize>().map_err(|e| {
        Error::invalid_path(format!(
            "expected array index at position {}, got '{}': {}",
            position, key, e
        ))
    })
}

/// Whether a value counts as present: truthy, and non-empty if a container.
///
/// `null`, `false`, `0` and `""` are absent, as are `[]` and `{}`.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Shallow-merge `partial` over `base`; keys of `partial` win.
///
/// A non-object `base` is treated as an empty object.
pub fn shallow_merge(base: Option<Value>, partial: Map<String, Value>) -> Value {
    let mut merged = match base {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    merged.extend(partial);
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_tree() -> Value {
        json!({
            "name": "Alice",
            "age": 30,
            "address": {"city": "NYC"},
            "scores": [90, 85, 95],
        })
    }

    // ==================== get_path tests ====================

    #[test]
    fn get_root() {
        let tree = test_tree();
        assert_eq!(get_path(&tree, None), Some(&tree));
    }

    #[test]
    fn get_direct_child() {
        let tree = test_tree();
        assert_eq!(get_path(&tree, Some("name")), Some(&json!("Alice")));
    }

    #[test]
    fn get_nested_and_indexed() {
        let tree = test_tree();
        assert_eq!(get_path(&tree, Some("address.city")), Some(&json!("NYC")));
        assert_eq!(get_path(&tree, Some("scores.1")), Some(&json!(85)));
    }

    #[test]
    fn get_missing_is_none() {
        let tree = test_tree();
        assert_eq!(get_path(&tree, Some("missing")), None);
        assert_eq!(get_path(&tree, Some("scores.7")), None);
        assert_eq!(get_path(&tree, Some("scores.x")), None);
        assert_eq!(get_path(&tree, Some("name.first")), None);
    }

    // ==================== set_path tests ====================

    #[test]
    fn set_root_replaces_tree() {
        let mut tree = test_tree();
        set_path(&mut tree, None, json!([1, 2])).unwrap();
        assert_eq!(tree, json!([1, 2]));
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut tree = Value::Null;
        set_path(&mut tree, Some("profile.email"), json!("a@b.c")).unwrap();
        assert_eq!(tree, json!({"profile": {"email": "a@b.c"}}));
    }

    #[test]
    fn set_array_element_and_append() {
        let mut tree = test_tree();
        set_path(&mut tree, Some("scores.0"), json!(100)).unwrap();
        set_path(&mut tree, Some("scores.3"), json!(70)).unwrap();
        assert_eq!(tree["scores"], json!([100, 85, 95, 70]));
    }

    #[test]
    fn set_array_out_of_bounds_fails() {
        let mut tree = test_tree();
        let err = set_path(&mut tree, Some("scores.9"), json!(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidPathFormat { .. }));
    }

    #[test]
    fn set_through_primitive_fails() {
        let mut tree = test_tree();
        assert!(set_path(&mut tree, Some("name.first"), json!("A")).is_err());
        assert!(set_path(&mut tree, Some("age.years.value"), json!(1)).is_err());
    }

    // ==================== presence and merge ====================

    #[test]
    fn presence_follows_truthiness() {
        for absent in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!is_present(&absent), "{} should be absent", absent);
        }
        for present in [json!(true), json!(1), json!(-2.5), json!("x"), json!([0]), json!({"a": null})] {
            assert!(is_present(&present), "{} should be present", present);
        }
    }

    #[test]
    fn merge_partial_wins() {
        let partial = json!({"a": 1, "b": 3}).as_object().cloned().unwrap();
        let merged = shallow_merge(Some(json!({"b": 2, "c": 4})), partial);
        assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn merge_over_non_object_starts_empty() {
        let partial = json!({"a": 1}).as_object().cloned().unwrap();
        assert_eq!(shallow_merge(Some(json!(7)), partial.clone()), json!({"a": 1}));
        assert_eq!(shallow_merge(None, partial), json!({"a": 1}));
    }
}
