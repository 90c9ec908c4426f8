//! Argument helpers shared by the Graph tool handlers.
//!
//! Handlers run `validate_args` first, so these only deal with constraints
//! the schema cannot express and with turning arguments into query params.

use serde_json::Value;

use crate::error::ToolError;
use crate::model::JsonObject;
use crate::schema::ParametersSchema;

/// A required string argument that must not be blank.
pub fn required_str<'a>(args: &'a JsonObject, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name).and_then(Value::as_str).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ToolError::invalid_field(name, "is required")),
    }
}

pub fn optional_bool(args: &JsonObject, name: &str, default: bool) -> bool {
    args.get(name).and_then(Value::as_bool).unwrap_or(default)
}

pub fn optional_str<'a>(args: &'a JsonObject, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Strings of an array argument, blanks dropped.
pub fn string_list(args: &JsonObject, name: &str) -> Vec<String> {
    args.get(name)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Like [`string_list`] but at least one entry is required.
pub fn non_empty_list(args: &JsonObject, name: &str, what: &str) -> Result<Vec<String>, ToolError> {
    let values = string_list(args, name);
    if values.is_empty() {
        Err(ToolError::invalid_field(
            name,
            format!("at least one {} is required", what),
        ))
    } else {
        Ok(values)
    }
}

/// Reject a numeric argument that is present but not positive.
pub fn ensure_positive(args: &JsonObject, name: &str) -> Result<(), ToolError> {
    match args.get(name).and_then(Value::as_f64) {
        Some(n) if n <= 0.0 => Err(ToolError::invalid_field(name, "must be positive")),
        _ => Ok(()),
    }
}

/// Render one argument as a Graph query value: arrays joined with `,`,
/// objects JSON-encoded, scalars as text. `null` is dropped.
pub fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(param_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

/// Query params for every declared property present in `args`, in schema
/// order, except the names in `skip`.
pub fn forward_params<'s>(
    schema: &'s ParametersSchema,
    args: &JsonObject,
    skip: &[&str],
) -> Vec<(&'s str, String)> {
    schema
        .properties
        .keys()
        .filter(|name| !skip.contains(&name.as_str()))
        .filter_map(|name| {
            args.get(name)
                .and_then(param_value)
                .map(|value| (name.as_str(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertySchema;
    use serde_json::json;

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_param_value_shapes() {
        assert_eq!(param_value(&json!(["a", "b"])).as_deref(), Some("a,b"));
        assert_eq!(
            param_value(&json!({"since": "2024-01-01"})).as_deref(),
            Some("{\"since\":\"2024-01-01\"}")
        );
        assert_eq!(param_value(&json!(25)).as_deref(), Some("25"));
        assert_eq!(param_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(param_value(&Value::Null), None);
    }

    #[test]
    fn test_forward_params_follows_schema_order() {
        let schema = ParametersSchema::default()
            .property("act_id", PropertySchema::string())
            .property("limit", PropertySchema::number())
            .property("after", PropertySchema::string());
        let params = forward_params(
            &schema,
            &args(json!({"after": "cursor", "act_id": "act_1", "limit": 5, "stray": 1})),
            &["act_id"],
        );
        assert_eq!(
            params,
            vec![("limit", "5".to_string()), ("after", "cursor".to_string())]
        );
    }

    #[test]
    fn test_required_str_rejects_blank() {
        let err = required_str(&args(json!({"act_id": "  "})), "act_id").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: act_id: is required");
    }

    #[test]
    fn test_non_empty_list() {
        let err = non_empty_list(&args(json!({"ad_ids": []})), "ad_ids", "ad ID").unwrap_err();
        assert_eq!(
            err,
            ToolError::Validation(vec!["ad_ids: at least one ad ID is required".into()])
        );
        assert!(ensure_positive(&args(json!({"limit": 0})), "limit").is_err());
        assert!(ensure_positive(&args(json!({"limit": 3})), "limit").is_ok());
    }
}
