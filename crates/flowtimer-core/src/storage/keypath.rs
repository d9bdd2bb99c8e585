//! Dot-separated key access over a serialized settings tree.
//!
//! Both the TOML config and the persisted settings expose `get`/`set` by
//! key (`runtime.tick_interval_ms`, `focusTime`). Values are round-tripped
//! through `serde_json::Value` so the target type decides how a string
//! argument is parsed.

use serde_json::Value;

use crate::error::ConfigError;

pub(crate) fn get<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return None;
    }

    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Render a leaf value the way a shell user expects to read it back.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn set(root: &mut Value, key: &str, value: &str) -> Result<(), ConfigError> {
    let mut parts = key.split('.').filter(|p| !p.is_empty()).peekable();
    if parts.peek().is_none() {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            let obj = current
                .as_object_mut()
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            let existing = obj
                .get(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

            let new_value = parse_like(existing, key, value)?;
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        current = current
            .get_mut(part)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    }

    Err(ConfigError::UnknownKey(key.to_string()))
}

fn parse_like(existing: &Value, key: &str, value: &str) -> Result<Value, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    match existing {
        Value::Bool(_) => value
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| invalid(e.to_string())),
        Value::Number(_) => {
            if let Ok(n) = value.parse::<u64>() {
                Ok(Value::Number(n.into()))
            } else if let Ok(n) = value.parse::<f64>() {
                serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))
            } else {
                Err(invalid(format!("cannot parse '{value}' as number")))
            }
        }
        Value::Object(_) | Value::Array(_) => {
            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))
        }
        // Optional fields serialize as null; accept either a number or a string.
        Value::Null => Ok(value
            .parse::<u64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|_| Value::String(value.into()))),
        Value::String(_) => Ok(Value::String(value.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_nested_objects() {
        let root = json!({"runtime": {"tick_interval_ms": 1000}});
        assert_eq!(get(&root, "runtime.tick_interval_ms"), Some(&json!(1000)));
        assert!(get(&root, "runtime.missing").is_none());
        assert!(get(&root, "").is_none());
    }

    #[test]
    fn set_parses_by_existing_type() {
        let mut root = json!({"a": true, "b": 5, "c": "x"});
        set(&mut root, "a", "false").unwrap();
        set(&mut root, "b", "75").unwrap();
        set(&mut root, "c", "#FF5733").unwrap();
        assert_eq!(root, json!({"a": false, "b": 75, "c": "#FF5733"}));
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_value() {
        let mut root = json!({"a": true});
        assert!(matches!(
            set(&mut root, "nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            set(&mut root, "a", "not_a_bool"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn display_strips_string_quotes() {
        assert_eq!(display(&json!("dark")), "dark");
        assert_eq!(display(&json!(25)), "25");
    }
}
