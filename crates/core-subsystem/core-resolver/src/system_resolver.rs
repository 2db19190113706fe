// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use async_graphql_parser::{Pos, types::ExecutableDocument};
use serde_json::{Map, Value};
use tracing::{error, instrument, warn};

use common::operation_payload::OperationsPayload;

use crate::{
    execution::{ExecutionResponse, Executor},
    resolver_table::ResolverTable,
    schema::Schema,
    validation::{
        document_validator::DocumentValidator, operation::ValidatedOperation,
        validation_error::ValidationError,
    },
};

/// The top-level system resolver.
///
/// Validates incoming operations against the schema and executes them using the resolver table.
pub struct SystemResolver<C> {
    pub schema: Arc<Schema>,
    resolvers: ResolverTable<C>,
    query_depth_limit: usize,
}

impl<C: Sync> SystemResolver<C> {
    pub fn new(schema: Arc<Schema>, resolvers: ResolverTable<C>, query_depth_limit: usize) -> Self {
        Self {
            schema,
            resolvers,
            query_depth_limit,
        }
    }

    /// Resolve the provided top-level operation (which may contain multiple queries or
    /// mutations).
    ///
    /// Always produces a response: a request that fails validation yields a response with errors
    /// and no data, and faults during execution are reported alongside the (partial) data.
    #[instrument(
        name = "SystemResolver::resolve_operations"
        skip_all
        )]
    pub async fn resolve_operations(
        &self,
        operations_payload: OperationsPayload,
        context: &C,
    ) -> ExecutionResponse {
        let operation = match operations_payload.query.as_deref() {
            Some(query) => self.validate_operation(
                query,
                operations_payload.operation_name,
                operations_payload.variables,
            ),
            None => Err(ValidationError::MissingQuery),
        };

        match operation {
            Ok(operation) => {
                Executor::new(&self.schema, &self.resolvers, context)
                    .execute(&operation)
                    .await
            }
            Err(error) => {
                warn!(%error, "Invalid operation");
                error.into()
            }
        }
    }

    #[instrument(skip_all)]
    fn validate_operation(
        &self,
        query: &str,
        operation_name: Option<String>,
        variables: Option<Map<String, Value>>,
    ) -> Result<ValidatedOperation, ValidationError> {
        let document = parse_query(query)?;

        let document_validator = DocumentValidator::new(
            &self.schema,
            operation_name,
            variables,
            self.query_depth_limit,
        );

        document_validator.validate(document)
    }
}

#[instrument(name = "system_resolver::parse_query")]
fn parse_query(query: &str) -> Result<ExecutableDocument, ValidationError> {
    async_graphql_parser::parse_query(query).map_err(|error| {
        error!(%error, "Failed to parse query");
        let (message, pos1, pos2) = match error {
            async_graphql_parser::Error::Syntax {
                message,
                start,
                end,
            } => (format!("Syntax error: {}", message.trim()), start, end),
            async_graphql_parser::Error::MultipleOperations {
                anonymous,
                operation,
            } => (
                "Multiple operations".to_string(),
                anonymous,
                Some(operation),
            ),
            async_graphql_parser::Error::OperationDuplicated {
                operation,
                first,
                second,
            } => (
                format!("Operation {operation} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::FragmentDuplicated {
                fragment,
                first,
                second,
            } => (
                format!("Fragment {fragment} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::MissingOperation => {
                ("Missing operation".to_string(), Pos::default(), None)
            }
            _ => ("Unknown error".to_string(), Pos::default(), None),
        };

        ValidationError::QueryParsingFailed(message, pos1, pos2)
    })
}
