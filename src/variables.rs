//! Builds the per-request variable map handed to the template processor.

use serde_json::Value;
use std::collections::HashMap;

/// Placeholder name to substitution value. Built fresh for every request.
pub type Variables = HashMap<String, String>;

/// Tool arguments arrive as arbitrary JSON. Only string values are kept;
/// numbers, booleans, null, arrays and objects are dropped.
pub fn from_tool_arguments(arguments: Option<&Value>) -> Variables {
    let Some(Value::Object(map)) = arguments else {
        return Variables::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            value
                .as_str()
                .map(|text| (key.clone(), text.to_owned()))
        })
        .collect()
}

/// Prompt arguments are already string pairs.
pub fn from_prompt_arguments(arguments: Option<&HashMap<String, String>>) -> Variables {
    arguments.cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_arguments_keep_only_strings() {
        let args = json!({"a": "1", "b": 2, "c": true});
        let variables = from_tool_arguments(Some(&args));

        assert_eq!(variables.len(), 1);
        assert_eq!(variables.get("a").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_tool_arguments_drop_nested_and_null() {
        let args = json!({
            "name": "Ada",
            "empty": "",
            "tags": ["x"],
            "profile": {"age": 36},
            "missing": null
        });
        let variables = from_tool_arguments(Some(&args));

        let mut keys: Vec<_> = variables.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["empty", "name"]);
    }

    #[test]
    fn test_tool_arguments_absent_or_not_an_object() {
        assert!(from_tool_arguments(None).is_empty());
        assert!(from_tool_arguments(Some(&json!(["a", "b"]))).is_empty());
        assert!(from_tool_arguments(Some(&json!("text"))).is_empty());
        assert!(from_tool_arguments(Some(&Value::Null)).is_empty());
    }

    #[test]
    fn test_prompt_arguments_copied() {
        let mut args = HashMap::new();
        args.insert("topic".to_string(), "rust".to_string());
        args.insert("tone".to_string(), "".to_string());

        let variables = from_prompt_arguments(Some(&args));
        assert_eq!(variables, args);
        assert!(from_prompt_arguments(None).is_empty());
    }
}
