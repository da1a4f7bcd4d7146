//! Request shape validation

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

/// Accepted request body shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSchema {
    /// Array of string identifiers
    IdentifierList,
    /// Object mapping identifier strings to identifier strings
    HoldingMap,
}

/// Check a request body against a schema
pub fn validate_shape(input: &Value, schema: RequestSchema) -> AppResult<()> {
    match schema {
        RequestSchema::IdentifierList => {
            let values = input
                .as_array()
                .ok_or_else(|| AppError::SchemaViolation("expected an array".to_string()))?;
            if let Some(bad) = values.iter().find(|v| !v.is_string()) {
                return Err(AppError::SchemaViolation(format!("{} is not a string", bad)));
            }
        }
        RequestSchema::HoldingMap => {
            let values = input
                .as_object()
                .ok_or_else(|| AppError::SchemaViolation("expected an object".to_string()))?;
            if let Some((key, _)) = values.iter().find(|(_, v)| !v.is_string()) {
                return Err(AppError::SchemaViolation(format!("value of {} is not a string", key)));
            }
        }
    }
    Ok(())
}

/// Deduplicate identifiers. Ordering is the set's, so repeated requests
/// produce the same upstream query.
pub fn normalize_identifiers<I, S>(identifiers: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    identifiers.into_iter().map(Into::into).collect()
}

/// Validate and normalize an identifier list body
pub fn identifiers_from(input: Value) -> AppResult<BTreeSet<String>> {
    validate_shape(&input, RequestSchema::IdentifierList)?;
    let identifiers: Vec<String> =
        serde_json::from_value(input).map_err(|e| AppError::SchemaViolation(e.to_string()))?;
    Ok(normalize_identifiers(identifiers))
}

/// Validate a holdings body, keeping request order
pub fn holdings_from(input: Value) -> AppResult<IndexMap<String, String>> {
    validate_shape(&input, RequestSchema::HoldingMap)?;
    serde_json::from_value(input).map_err(|e| AppError::SchemaViolation(e.to_string()))
}
