// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::types::{BaseType, OperationType, Type};
use async_recursion::async_recursion;
use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use crate::{
    resolver_table::ResolverTable,
    schema::Schema,
    validation::{field::ValidatedField, operation::ValidatedOperation},
};

use super::response::{ExecutionError, ExecutionResponse, PathSegment};

/// Executes validated operations, resolving each field through the [ResolverTable].
pub struct Executor<'e, C> {
    schema: &'e Schema,
    resolvers: &'e ResolverTable<C>,
    context: &'e C,
}

/// A (partially) completed value along with the errors encountered while producing it.
///
/// A `None` value means the failure must propagate to the nearest nullable ancestor.
struct Completion {
    value: Option<Value>,
    errors: Vec<ExecutionError>,
}

impl Completion {
    fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            errors: vec![],
        }
    }

    fn failed(error: ExecutionError) -> Self {
        Self {
            value: None,
            errors: vec![error],
        }
    }

    /// Stop a failure from propagating any further if the position may be null.
    fn absorb_if(self, nullable: bool) -> Self {
        match self.value {
            None if nullable => Self {
                value: Some(Value::Null),
                errors: self.errors,
            },
            _ => self,
        }
    }
}

impl<'e, C: Sync> Executor<'e, C> {
    pub fn new(schema: &'e Schema, resolvers: &'e ResolverTable<C>, context: &'e C) -> Self {
        Self {
            schema,
            resolvers,
            context,
        }
    }

    /// Execute the operation, starting with an empty object as the root value.
    ///
    /// Top-level mutation fields run one after the other in document order. Every other selection
    /// set has its fields resolved concurrently.
    #[instrument(
        name = "Executor::execute"
        skip_all
        fields(operation_name = ?operation.name)
    )]
    pub async fn execute(&self, operation: &ValidatedOperation) -> ExecutionResponse {
        let root_type = self
            .schema
            .root_type_name(operation.typ)
            .map(str::to_string)
            .unwrap_or_default();
        let root_value = Value::Object(Map::new());

        let completion = match operation.typ {
            OperationType::Mutation => {
                self.execute_fields_serially(&root_type, &root_value, &operation.fields)
                    .await
            }
            _ => {
                self.execute_selection_set(&root_type, &root_value, &operation.fields, &[])
                    .await
            }
        };

        ExecutionResponse {
            data: Some(completion.value.unwrap_or(Value::Null)),
            errors: completion.errors,
        }
    }

    async fn execute_fields_serially(
        &self,
        type_name: &str,
        parent: &Value,
        fields: &[ValidatedField],
    ) -> Completion {
        let mut completions = Vec::with_capacity(fields.len());

        for field in fields {
            completions.push(self.execute_field(type_name, parent, field, &[]).await);
        }

        collect_object(fields, completions)
    }

    async fn execute_selection_set(
        &self,
        type_name: &str,
        parent: &Value,
        fields: &[ValidatedField],
        path: &[PathSegment],
    ) -> Completion {
        let completions = join_all(
            fields
                .iter()
                .map(|field| self.execute_field(type_name, parent, field, path)),
        )
        .await;

        collect_object(fields, completions)
    }

    async fn execute_field(
        &self,
        type_name: &str,
        parent: &Value,
        field: &ValidatedField,
        path: &[PathSegment],
    ) -> Completion {
        let mut field_path = path.to_vec();
        field_path.push(PathSegment::Field(field.output_name()));

        if field.name.as_str() == "__typename" {
            return Completion::value(Value::String(type_name.to_string()));
        }

        let resolution = self.resolvers.resolve(
            type_name,
            field.name.as_str(),
            parent,
            &field.arguments,
            self.context,
        );

        match resolution.into_result().await {
            Ok(value) => {
                self.complete_value(&field.ty, type_name, field, value, &field_path)
                    .await
            }
            Err(error) => {
                warn!(%error, type_name, field = %field.name, "Resolver failed");

                Completion::failed(ExecutionError::new(
                    error.user_message(),
                    field.pos,
                    &field_path,
                ))
                .absorb_if(field.ty.nullable)
            }
        }
    }

    /// Shape the resolved value according to the declared type: check nullability, complete list
    /// elements in order, copy leaf values, and resolve the sub-selection of objects.
    #[async_recursion]
    async fn complete_value(
        &self,
        ty: &Type,
        parent_type_name: &str,
        field: &ValidatedField,
        value: Value,
        path: &[PathSegment],
    ) -> Completion {
        let field_error = |message: String| {
            Completion::failed(ExecutionError::new(message, field.pos, path))
        };

        if value.is_null() {
            return if ty.nullable {
                Completion::value(Value::Null)
            } else {
                field_error(format!(
                    "Cannot return null for non-nullable field {parent_type_name}.{}",
                    field.name
                ))
            };
        }

        let completion = match &ty.base {
            BaseType::List(element_type) => match value {
                Value::Array(elements) => {
                    let completions =
                        join_all(elements.into_iter().enumerate().map(|(index, element)| {
                            let mut element_path = path.to_vec();
                            element_path.push(PathSegment::Index(index));

                            async move {
                                self.complete_value(
                                    element_type,
                                    parent_type_name,
                                    field,
                                    element,
                                    &element_path,
                                )
                                .await
                            }
                        }))
                        .await;

                    collect_list(completions)
                }
                other => field_error(format!(
                    "Expected a list for field {parent_type_name}.{}, got {}",
                    field.name,
                    json_kind(&other)
                )),
            },
            BaseType::Named(type_name) => {
                if self.schema.is_leaf_type(type_name.as_str()) {
                    Completion::value(value)
                } else if value.is_object() {
                    self.execute_selection_set(type_name.as_str(), &value, &field.subfields, path)
                        .await
                } else {
                    field_error(format!(
                        "Expected an object of type {type_name} for field {parent_type_name}.{}, got {}",
                        field.name,
                        json_kind(&value)
                    ))
                }
            }
        };

        completion.absorb_if(ty.nullable)
    }
}

fn collect_object(fields: &[ValidatedField], completions: Vec<Completion>) -> Completion {
    let mut object = Map::new();
    let mut errors = vec![];
    let mut failed = false;

    for (field, completion) in fields.iter().zip(completions) {
        errors.extend(completion.errors);

        match completion.value {
            Some(value) => {
                object.insert(field.output_name(), value);
            }
            None => failed = true,
        }
    }

    Completion {
        value: (!failed).then_some(Value::Object(object)),
        errors,
    }
}

fn collect_list(completions: Vec<Completion>) -> Completion {
    let mut elements = Vec::with_capacity(completions.len());
    let mut errors = vec![];
    let mut failed = false;

    for completion in completions {
        errors.extend(completion.errors);

        match completion.value {
            Some(value) => elements.push(value),
            None => failed = true,
        }
    }

    Completion {
        value: (!failed).then_some(Value::Array(elements)),
        errors,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
