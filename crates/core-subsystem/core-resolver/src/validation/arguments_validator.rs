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
    Pos, Positioned,
    types::{BaseType, Field, InputValueDefinition, Type, TypeKind},
};
use async_graphql_value::{ConstValue, Name, Number, Value};
use indexmap::IndexMap;

use crate::{
    resolver_table::Arguments, schema::Schema, validation::validation_error::ValidationError,
};
use common::value::{Val, ValNumber};

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub struct ArgumentValidator<'a> {
    schema: &'a Schema,
    variables: &'a HashMap<Name, ConstValue>,
    field: &'a Positioned<Field>,
}

impl<'a> ArgumentValidator<'a> {
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        variables: &'a HashMap<Name, ConstValue>,
        field: &'a Positioned<Field>,
    ) -> Self {
        Self {
            schema,
            variables,
            field,
        }
    }

    /// Validations performed:
    /// - Ensure that all required arguments are provided
    /// - Ensure that there are no stray arguments (arguments that are not defined in the field)
    /// - Ensure that each argument value is compatible with its declared type
    pub(super) fn validate(
        &self,
        field_argument_definitions: &[&InputValueDefinition],
    ) -> Result<Arguments, ValidationError> {
        self.validate_arguments(
            field_argument_definitions,
            self.field
                .node
                .arguments
                .iter()
                .map(|(name, value)| (&name.node, &value.node, value.pos)),
            self.field.node.name.node.as_str(),
        )
    }

    fn validate_arguments<'v>(
        &self,
        argument_definitions: &[&InputValueDefinition],
        supplied_arguments: impl Iterator<Item = (&'v Name, &'v Value, Pos)>,
        owner_name: &str,
    ) -> Result<Arguments, ValidationError> {
        // Stray arguments tracking: 1. Maintain a map of all the arguments supplied in the query
        let mut supplied_arguments: IndexMap<&str, (&Value, Pos)> = supplied_arguments
            .filter(|(name, _, _)| {
                // Clients often send back a previously queried object (carrying the `__typename`
                // attribute) as an input, so we don't consider it a stray argument.
                name.as_str() != "__typename"
            })
            .map(|(name, value, pos)| (name.as_str(), (value, pos)))
            .collect();

        let mut validated_arguments = Arguments::new();

        for argument_definition in argument_definitions {
            let argument_name = argument_definition.name.node.as_str();
            // Stray arguments tracking: 2. Remove the argument being processed
            let argument_value = supplied_arguments.shift_remove(argument_name);

            if let Some(value) = self.validate_argument(argument_definition, argument_value)? {
                validated_arguments.insert(argument_name.to_string(), value);
            }
        }

        // Stray arguments tracking: 3. If any arguments are left, they are stray arguments (not defined in the field)
        if !supplied_arguments.is_empty() {
            let stray_arguments = supplied_arguments
                .keys()
                .map(|name| name.to_string())
                .collect::<Vec<_>>();

            Err(ValidationError::StrayArguments(
                stray_arguments,
                owner_name.to_string(),
                self.field.pos,
            ))
        } else {
            Ok(validated_arguments)
        }
    }

    /// Validate a single argument.
    ///
    /// An omitted argument (or one bound to an omitted nullable variable) takes its default value
    /// if declared with one. Otherwise, it is left out if nullable and is an error if not.
    fn validate_argument(
        &self,
        argument_definition: &InputValueDefinition,
        argument_value: Option<(&Value, Pos)>,
    ) -> Result<Option<Val>, ValidationError> {
        let argument_name = argument_definition.name.node.as_str();
        let ty = &argument_definition.ty.node;

        let supplied = match argument_value {
            Some((Value::Variable(name), pos)) => match self.variables.get(name) {
                Some(resolved) => Some((resolved.clone().into_value(), pos)),
                None if ty.nullable || argument_definition.default_value.is_some() => None,
                None => return Err(ValidationError::VariableNotFound(name.to_string(), pos)),
            },
            Some((value, pos)) => Some((value.clone(), pos)),
            None => None,
        };

        match supplied {
            Some((value, pos)) => self.validate_value(argument_name, ty, &value, pos).map(Some),
            None => match &argument_definition.default_value {
                Some(default_value) => self
                    .validate_value(
                        argument_name,
                        ty,
                        &default_value.node.clone().into_value(),
                        default_value.pos,
                    )
                    .map(Some),
                None if ty.nullable => Ok(None),
                None => Err(ValidationError::RequiredArgumentNotFound(
                    argument_name.to_string(),
                    self.field.pos,
                )),
            },
        }
    }

    /// Validate a value against a type.
    ///
    /// Validations performed:
    /// - If the value is a variable, the variable is defined
    /// - A null value is specified only for a nullable type
    /// - Scalars match the expected type (integers are acceptable for `Float` and `ID`)
    /// - Enum values are members of the expected enum
    /// - Objects match the expected input object shape (recursively)
    /// - Lists match the expected element type (a single value is coerced to a one-element list)
    /// - Values for custom scalars are accepted as-is
    fn validate_value(
        &self,
        argument_name: &str,
        ty: &Type,
        value: &Value,
        pos: Pos,
    ) -> Result<Val, ValidationError> {
        match value {
            Value::Variable(name) => match self.variables.get(name) {
                Some(resolved) => {
                    self.validate_value(argument_name, ty, &resolved.clone().into_value(), pos)
                }
                None if ty.nullable => Ok(Val::Null),
                None => Err(ValidationError::VariableNotFound(name.to_string(), pos)),
            },
            Value::Null => {
                if ty.nullable {
                    Ok(Val::Null)
                } else {
                    Err(ValidationError::RequiredArgumentNotFound(
                        argument_name.to_string(),
                        pos,
                    ))
                }
            }
            _ => match &ty.base {
                BaseType::List(elem_type) => match value {
                    Value::List(elems) => elems
                        .iter()
                        .map(|elem| self.validate_value(argument_name, elem_type, elem, pos))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Val::List),
                    _ => self
                        .validate_value(argument_name, elem_type, value, pos)
                        .map(|elem| Val::List(vec![elem])),
                },
                BaseType::Named(type_name) => {
                    self.validate_named_value(argument_name, type_name, value, pos)
                }
            },
        }
    }

    fn validate_named_value(
        &self,
        argument_name: &str,
        type_name: &Name,
        value: &Value,
        pos: Pos,
    ) -> Result<Val, ValidationError> {
        let mismatch = || ValidationError::InvalidArgumentType {
            argument_name: argument_name.to_string(),
            expected_type: type_name.to_string(),
            actual_type: value_kind(value).to_string(),
            pos,
        };

        let type_definition = self
            .schema
            .get_type_definition(type_name.as_str())
            .ok_or_else(mismatch)?;

        match (&type_definition.kind, value) {
            (TypeKind::Scalar, _) if !BUILTIN_SCALARS.contains(&type_name.as_str()) => {
                self.opaque_value(value, pos)
            }
            (TypeKind::Scalar, Value::Number(number)) => {
                let is_integer = number.is_i64() || number.is_u64();

                match type_name.as_str() {
                    "Int" if is_int32(number) => Ok(Val::Number(ValNumber::from(number))),
                    "Float" => Ok(Val::Number(ValNumber::from(number))),
                    "ID" if is_integer => Ok(Val::String(number.to_string())),
                    _ => Err(mismatch()),
                }
            }
            (TypeKind::Scalar, Value::String(string))
                if matches!(type_name.as_str(), "String" | "ID") =>
            {
                Ok(Val::String(string.clone()))
            }
            (TypeKind::Scalar, Value::Boolean(boolean)) if type_name.as_str() == "Boolean" => {
                Ok(Val::Bool(*boolean))
            }
            (TypeKind::Enum(enum_type), Value::Enum(variant))
                if enum_type
                    .values
                    .iter()
                    .any(|v| &v.node.value.node == variant) =>
            {
                Ok(Val::Enum(variant.to_string()))
            }
            (TypeKind::InputObject(input_object_type), Value::Object(entries)) => {
                let field_definitions = input_object_type
                    .fields
                    .iter()
                    .map(|d| &d.node)
                    .collect::<Vec<_>>();

                self.validate_arguments(
                    &field_definitions,
                    entries.iter().map(|(name, value)| (name, value, pos)),
                    argument_name,
                )
                .map(Val::Object)
            }
            _ => Err(mismatch()),
        }
    }

    /// Values for custom scalars are passed to resolvers without interpretation.
    fn opaque_value(&self, value: &Value, pos: Pos) -> Result<Val, ValidationError> {
        let resolved = value.clone().into_const_with(|name| {
            self.variables
                .get(&name)
                .cloned()
                .ok_or_else(|| ValidationError::VariableNotFound(name.to_string(), pos))
        })?;

        Val::try_from(resolved).map_err(|e| ValidationError::InvalidArgumentType {
            argument_name: self.field.node.name.node.to_string(),
            expected_type: "a JSON-compatible value".to_string(),
            actual_type: e.to_string(),
            pos,
        })
    }
}

/// GraphQL's `Int` is a signed 32-bit integer.
fn is_int32(number: &Number) -> bool {
    number
        .as_i64()
        .is_some_and(|number| i32::try_from(number).is_ok())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Variable(_) => "Variable",
        Value::Null => "null",
        Value::Number(number) if number.is_f64() => "Float",
        Value::Number(number) if !is_int32(number) => "Int outside the 32-bit range",
        Value::Number(_) => "Int",
        Value::String(_) => "String",
        Value::Boolean(_) => "Boolean",
        Value::Binary(_) => "Binary",
        Value::Enum(_) => "Enum",
        Value::List(_) => "List",
        Value::Object(_) => "Object",
    }
}
