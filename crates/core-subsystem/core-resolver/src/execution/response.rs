// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use serde::Serialize;
use serde_json::Value;

use crate::validation::validation_error::ValidationError;

/// The outcome of a request: `{ "data": ..., "errors": [...] }`.
///
/// `data` is absent when the request failed validation (nothing was executed) and `null` when
/// a failure propagated all the way to the root. `errors` is omitted when empty.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExecutionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExecutionError>,
}

impl ExecutionResponse {
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl From<ValidationError> for ExecutionResponse {
    fn from(error: ValidationError) -> Self {
        ExecutionResponse {
            data: None,
            errors: vec![ExecutionError {
                message: error.to_string(),
                locations: error.positions().into_iter().map(Into::into).collect(),
                path: vec![],
            }],
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExecutionError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>, pos: Pos, path: &[PathSegment]) -> Self {
        Self {
            message: message.into(),
            locations: vec![pos.into()],
            path: path.to_vec(),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for ErrorLocation {
    fn from(pos: Pos) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// A step from the root of the response to the value an error relates to.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serialization() {
        let response = ExecutionResponse {
            data: Some(json!({ "messages": [null] })),
            errors: vec![ExecutionError::new(
                "Not found",
                Pos { line: 3, column: 7 },
                &[PathSegment::Field("messages".into()), PathSegment::Index(0)],
            )],
        };

        assert_eq!(
            response.to_json().unwrap(),
            json!({
                "data": { "messages": [null] },
                "errors": [{
                    "message": "Not found",
                    "locations": [{ "line": 3, "column": 7 }],
                    "path": ["messages", 0]
                }]
            })
        );
    }

    #[test]
    fn validation_failure_has_no_data() {
        let response: ExecutionResponse = ValidationError::MissingQuery.into();

        assert_eq!(
            response.to_json().unwrap(),
            json!({ "errors": [{ "message": "Must provide a query string" }] })
        );
    }
}
