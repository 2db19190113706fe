// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::Deserialize;
use serde_json::{Map, Value};

/// The body of a GraphQL request: `{"query": ..., "operationName": ..., "variables": ...}`.
#[derive(Debug, Deserialize)]
pub struct OperationsPayload {
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,
    pub query: Option<String>,
    pub variables: Option<Map<String, Value>>,
}

impl OperationsPayload {
    pub fn from_json(json: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }
}
