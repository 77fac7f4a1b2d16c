//! Payload validation against command-table JSON Schemas.
//!
//! Schemas are compiled once when the table is registered; validation runs
//! before any request is built, so a payload that fails its declared schema
//! never reaches the network.

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::ClientError;

/// Compile a table entry's schema, attributing failures to the operation.
pub(crate) fn compile(name: &str, schema: &Value) -> Result<JSONSchema, ClientError> {
    JSONSchema::compile(schema).map_err(|err| ClientError::Command {
        name: name.to_string(),
        message: err.to_string(),
    })
}

/// Validate a payload against an optional compiled schema.
///
/// An absent schema always passes. On failure, the first violation's
/// instance path and message are reported.
pub(crate) fn validate(payload: &Value, schema: Option<&JSONSchema>) -> Result<(), ClientError> {
    let schema = match schema {
        Some(schema) => schema,
        None => return Ok(()),
    };
    if let Err(mut errors) = schema.validate(payload) {
        if let Some(err) = errors.next() {
            return Err(ClientError::Validation {
                path: err.instance_path.to_string(),
                message: err.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_schema_always_passes() {
        assert!(validate(&json!({ "anything": [1, 2, 3] }), None).is_ok());
    }

    #[test]
    fn conforming_payload_passes() {
        let schema = compile(
            "demo",
            &json!({
                "type": "object",
                "properties": { "key": { "type": "string" } },
                "required": ["key"],
            }),
        )
        .unwrap();

        assert!(validate(&json!({ "key": "abc" }), Some(&schema)).is_ok());
    }

    #[test]
    fn missing_required_field_fails() {
        let schema = compile(
            "demo",
            &json!({
                "type": "object",
                "properties": { "key": { "type": "string" } },
                "required": ["key"],
            }),
        )
        .unwrap();

        let err = validate(&json!({}), Some(&schema)).unwrap_err();
        match err {
            ClientError::Validation { message, .. } => {
                assert!(message.contains("key"), "unexpected message: {message}");
            }
            other => panic!("expected Validation, got: {other:?}"),
        }
    }

    #[test]
    fn type_mismatch_reports_instance_path() {
        let schema = compile(
            "demo",
            &json!({
                "type": "object",
                "properties": { "count": { "type": "integer" } },
            }),
        )
        .unwrap();

        let err = validate(&json!({ "count": "three" }), Some(&schema)).unwrap_err();
        match err {
            ClientError::Validation { path, .. } => {
                assert!(path.contains("count"), "unexpected path: {path}");
            }
            other => panic!("expected Validation, got: {other:?}"),
        }
    }

    #[test]
    fn malformed_schema_is_a_table_error() {
        let err = compile("demo", &json!({ "type": "not-a-type" })).unwrap_err();
        assert!(matches!(err, ClientError::Command { .. }));
    }
}
