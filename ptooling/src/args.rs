//! JSON argument parsing helpers for function and trait-based tools.
//!
//! ```rust
//! use ptooling::{optional_string, parse_json_object, required_string};
//!
//! let args = parse_json_object(r#"{"city":"Paris"}"#).expect("object should parse");
//! assert_eq!(required_string(&args, "city").expect("city should be present"), "Paris");
//! assert_eq!(optional_string(&args, "unit"), None);
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

pub fn parse_json_value(args_json: &str) -> Result<Value, ToolError> {
    Ok(serde_json::from_str(args_json)?)
}

/// Parses an argument object. Models sometimes send an empty string for
/// parameterless calls; that is treated as `{}`.
pub fn parse_json_object(args_json: &str) -> Result<Map<String, Value>, ToolError> {
    if args_json.trim().is_empty() {
        return Ok(Map::new());
    }

    match parse_json_value(args_json)? {
        Value::Object(map) => Ok(map),
        _ => Err(ToolError::invalid_arguments("expected JSON object arguments")),
    }
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    optional_string(args, key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

pub fn optional_string(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

pub fn required_f64(args: &Map<String, Value>, key: &str) -> Result<f64, ToolError> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required number: '{key}'")))
}
