// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Positioned,
    types::{FragmentDefinition, OperationDefinition, OperationType, VariableDefinition},
};
use async_graphql_value::{ConstValue, Name};
use serde_json::{Map, Value};

use crate::{schema::Schema, validation::validation_error::ValidationError};

use super::{operation::ValidatedOperation, selection_set_validator::SelectionSetValidator};

/// Context for validating an operation.
pub struct OperationValidator<'a> {
    schema: &'a Schema,
    operation_name: Option<String>,
    variables: Option<Map<String, Value>>,
    fragment_definitions: HashMap<Name, Positioned<FragmentDefinition>>,
    query_depth_limit: usize,
}

impl<'a> OperationValidator<'a> {
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        operation_name: Option<String>,
        variables: Option<Map<String, Value>>,
        fragment_definitions: HashMap<Name, Positioned<FragmentDefinition>>,
        query_depth_limit: usize,
    ) -> Self {
        Self {
            schema,
            operation_name,
            variables,
            fragment_definitions,
            query_depth_limit,
        }
    }

    /// Validate operation. Operation defines a GraphQL top-level operation such
    /// as
    /// ```graphql
    ///    mutation post($text: String!, $authorId: ID!) {
    ///       postMessage(text: $text, authorId: $authorId) {
    ///          id
    ///       }
    ///    }
    /// ```
    ///
    /// Validations performed:
    /// - The schema has a root type for the operation type
    /// - Each variable in [OperationDefinition.variable_definitions] is
    ///   available (see [`validate_variables`] for details)
    /// - The selected fields are valid (see [SelectionSetValidator] for details)
    ///
    /// # Returns
    ///   A validated operation with all variables and fields resolved and normalized.
    pub(super) fn validate(
        self,
        operation: Positioned<OperationDefinition>,
    ) -> Result<ValidatedOperation, ValidationError> {
        let operation_type = operation.node.ty;

        if operation_type == OperationType::Subscription {
            return Err(ValidationError::SubscriptionNotSupported(operation.pos));
        }

        let container_type = self
            .schema
            .root_type_name(operation_type)
            .and_then(|name| self.schema.get_type_definition(name))
            .ok_or_else(|| {
                ValidationError::OperationNotFound(operation_type.to_string(), operation.pos)
            })?;

        let variables = self.validate_variables(operation.node.variable_definitions)?;

        let selection_set_validator = SelectionSetValidator::new(
            self.schema,
            container_type,
            &variables,
            &self.fragment_definitions,
            self.query_depth_limit,
        );

        let fields = selection_set_validator.validate(&operation.node.selection_set, 1)?;

        Ok(ValidatedOperation {
            name: self.operation_name,
            typ: operation_type,
            fields,
        })
    }

    /// Validate variables.
    ///
    /// Validations performed:
    /// - Every variable in [OperationDefinition.variable_definitions] is either supplied, has a
    ///   default value, or is of a nullable type (in which case it is left out)
    ///
    /// Type compatibility is checked where the variable is used (see `ArgumentValidator`).
    ///
    /// # Returns
    ///   Resolved variables (note the output type uses `ConstValue` instead of
    ///   `Value` to indicate that the value has been resolved)
    fn validate_variables(
        &self,
        variable_definitions: Vec<Positioned<VariableDefinition>>,
    ) -> Result<HashMap<Name, ConstValue>, ValidationError> {
        let mut resolved = HashMap::new();

        for variable_definition in variable_definitions {
            let variable_definition = variable_definition.node;
            let variable_name = variable_definition.name;

            match self.var_value(&variable_name)? {
                Some(value) => {
                    resolved.insert(variable_name.node, value);
                }
                None => match variable_definition.default_value {
                    Some(default_value) => {
                        resolved.insert(variable_name.node, default_value.node);
                    }
                    None if variable_definition.var_type.node.nullable => {}
                    None => {
                        return Err(ValidationError::VariableNotFound(
                            variable_name.node.to_string(),
                            variable_name.pos,
                        ));
                    }
                },
            }
        }

        Ok(resolved)
    }

    fn var_value(&self, name: &Positioned<Name>) -> Result<Option<ConstValue>, ValidationError> {
        let supplied = self
            .variables
            .as_ref()
            .and_then(|variables| variables.get(name.node.as_str()));

        supplied
            .map(|value| {
                ConstValue::from_json(value.to_owned()).map_err(|e| {
                    ValidationError::MalformedVariable(name.node.to_string(), name.pos, e)
                })
            })
            .transpose()
    }
}
