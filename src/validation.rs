//! Input validation against JSON schemas

use crate::error::PipelineError;
use serde_json::Value;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Validate input against a JSON schema
pub fn validate_input(input: &Value, schema: &Value) -> Result<()> {
    // Get required fields from schema
    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field_name in required {
            let field_str = field_name.as_str().ok_or_else(|| {
                PipelineError::ValidationError(
                    "Invalid schema: required field not a string".to_string(),
                )
            })?;

            if input.get(field_str).is_none() {
                return Err(PipelineError::ValidationError(format!(
                    "Missing required field: {}",
                    field_str
                )));
            }
        }
    }

    // Validate property types
    if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
        if let Some(input_obj) = input.as_object() {
            for (key, value) in input_obj {
                if let Some(prop_schema) = properties.get(key) {
                    validate_type(value, prop_schema)?;
                }
            }
        }
    }

    Ok(())
}

/// Validate that a value matches the expected type
fn validate_type(value: &Value, schema: &Value) -> Result<()> {
    if let Some(expected_type) = schema.get("type").and_then(|t| t.as_str()) {
        let valid = match expected_type {
            "string" => value.is_string(),
            "integer" | "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            "null" => value.is_null(),
            _ => true, // Unknown types pass validation
        };

        if !valid {
            return Err(PipelineError::ValidationError(format!(
                "Type mismatch: expected {}, got {:?}",
                expected_type, value
            )));
        }
    }

    Ok(())
}
