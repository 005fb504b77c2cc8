//! Parameter validation against a tool's declared schema.

use crate::{EngineError, Result};
use catalog::ToolSchema;
use jsonschema::{Draft, JSONSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// One violated schema constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer to the offending value; empty for the parameter object.
    pub path: String,
    pub message: String,
}

/// Caller parameters that do not match the tool schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid parameters: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| match v.path.as_str() {
            "" => v.message.clone(),
            path => format!("{path}: {}", v.message),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parameters that passed validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedParams(Map<String, Value>);

impl ValidatedParams {
    /// Look up a parameter, treating JSON `null` as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Validate raw parameters against a tool schema.
///
/// Properties not named in `schema.required` are optional. Unknown
/// properties are rejected. A tool without properties accepts anything and
/// yields an empty parameter set.
pub fn validate(schema: &ToolSchema, raw: &Value) -> Result<ValidatedParams> {
    if schema.properties.is_empty() {
        return Ok(ValidatedParams::default());
    }

    let instance = match raw {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };

    let compiled = compile(schema)?;
    if let Err(errors) = compiled.validate(&instance) {
        let violations = errors
            .map(|err| Violation {
                path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect();
        return Err(ValidationError { violations }.into());
    }

    match instance {
        Value::Object(map) => Ok(ValidatedParams(map)),
        _ => Err(ValidationError {
            violations: vec![Violation {
                path: String::new(),
                message: "parameters must be an object".into(),
            }],
        }
        .into()),
    }
}

fn compile(schema: &ToolSchema) -> Result<JSONSchema> {
    let mut document = json!({
        "type": "object",
        "additionalProperties": false,
        "properties": schema.properties,
    });
    if !schema.required.is_empty() {
        document["required"] = json!(schema.required);
    }

    let mut options = JSONSchema::options();
    options.with_draft(Draft::Draft7);
    options
        .compile(&document)
        .map_err(|err| EngineError::Configuration(format!("invalid tool schema: {err}")))
}
