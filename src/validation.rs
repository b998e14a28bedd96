//! Request payload validation against JSON Schema.
//!
//! Handlers call [`check`] with the decoded payload. `None` means the payload
//! is valid and handling continues; otherwise the returned response is sent
//! as-is.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Formatted schema violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}", .0.join("; "))]
pub struct SchemaErrors(pub Vec<String>);

/// A schema that reports violations without panicking.
pub trait SafeParse {
    fn safe_parse(&self, data: &Value) -> Result<(), SchemaErrors>;
}

impl SafeParse for jsonschema::Validator {
    fn safe_parse(&self, data: &Value) -> Result<(), SchemaErrors> {
        let details: Vec<String> = self.iter_errors(data).map(|e| e.to_string()).collect();
        if details.is_empty() {
            Ok(())
        } else {
            Err(SchemaErrors(details))
        }
    }
}

/// A compiled JSON Schema document.
pub struct JsonSchema {
    validator: jsonschema::Validator,
}

impl JsonSchema {
    /// Compile `schema`. An invalid schema document is reported as a string.
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let validator = jsonschema::validator_for(schema).map_err(|e| e.to_string())?;
        Ok(Self { validator })
    }
}

impl SafeParse for JsonSchema {
    fn safe_parse(&self, data: &Value) -> Result<(), SchemaErrors> {
        self.validator.safe_parse(data)
    }
}

/// Validate `data`, returning a 400 response when it does not conform.
pub fn check<S: SafeParse + ?Sized>(data: &Value, schema: &S) -> Option<Response> {
    match schema.safe_parse(data) {
        Ok(()) => None,
        Err(errors) => {
            tracing::debug!(errors = %errors, "Request payload failed validation");
            Some((StatusCode::BAD_REQUEST, Json(json!({ "error": errors }))).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema() -> JsonSchema {
        JsonSchema::compile(&json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "integer", "minimum": 0 }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_payload_continues() {
        assert!(check(&json!({ "name": "ada", "age": 36 }), &user_schema()).is_none());
    }

    #[tokio::test]
    async fn test_invalid_payload_returns_400_with_errors() {
        let res = check(&json!({ "age": -1 }), &user_schema()).unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        let errors = value["error"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.as_str().unwrap().contains("name")));
    }

    #[test]
    fn test_raw_validator_is_safe_parse() {
        let validator = jsonschema::validator_for(&json!({ "type": "string" })).unwrap();
        assert!(validator.safe_parse(&json!("x")).is_ok());
        assert_eq!(validator.safe_parse(&json!(1)).unwrap_err().0.len(), 1);
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        assert!(JsonSchema::compile(&json!({ "type": 12 })).is_err());
    }
}
