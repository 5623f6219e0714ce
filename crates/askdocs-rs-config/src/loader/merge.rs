//! JSON merge helpers for layered configuration.

use serde_json::{Map, Value};

/// Merge overlay values into the base; objects merge key by key, everything
/// else is replaced.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) {
        for (key, value) in overlay_map {
            match base_map.get_mut(key) {
                Some(existing) => merge_json_values(existing, value),
                None => {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        return;
    }
    *base = overlay.clone();
}

/// Merge overlay into base, skipping any leaf the constraints value pins.
///
/// A constraint object only locks the keys it names; sibling keys stay
/// overridable.
pub(super) fn merge_json_with_constraints(
    base: &mut Value,
    overlay: &Value,
    constraints: Option<&Value>,
) {
    let Some(constraints) = constraints else {
        merge_json_values(base, overlay);
        return;
    };
    let (Value::Object(base_map), Value::Object(overlay_map), Value::Object(locked)) =
        (&mut *base, overlay, constraints)
    else {
        // Locked leaf.
        return;
    };
    for (key, value) in overlay_map {
        match locked.get(key) {
            None => match base_map.get_mut(key) {
                Some(existing) => merge_json_values(existing, value),
                None => {
                    base_map.insert(key.clone(), value.clone());
                }
            },
            Some(nested @ Value::Object(_)) => {
                let entry = base_map
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                merge_json_with_constraints(entry, value, Some(nested));
            }
            Some(_) => {}
        }
    }
}
