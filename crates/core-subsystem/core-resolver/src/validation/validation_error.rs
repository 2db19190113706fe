// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0}")]
    QueryParsingFailed(String, Pos, Option<Pos>),

    #[error("Must provide a query string")]
    MissingQuery,

    #[error("Variable '{0}' not found")]
    VariableNotFound(String, Pos),

    #[error("Variable '{0}' could not be deserialized: {2}")]
    MalformedVariable(String, Pos, serde_json::Error),

    #[error("Fragment definition '{0}' not found")]
    FragmentDefinitionNotFound(String, Pos),

    #[error("Fragment '{0}' spreads itself")]
    FragmentCycle(String, Pos),

    #[error("Fragment '{0}' cannot be spread on type '{1}' (it is defined on '{2}')")]
    FragmentTypeMismatch(String, String, String, Pos),

    #[error("Inline fragments are not supported")]
    InlineFragmentNotSupported(Pos),

    #[error("No such operation '{0}'")]
    OperationNotFound(String, Pos),

    #[error("Subscriptions are not supported")]
    SubscriptionNotSupported(Pos),

    #[error("Field '{0}' is not valid for type '{1}'")]
    InvalidField(String, String, Pos),

    #[error("Field '{0}' is of a scalar type, which should not specify fields")]
    ScalarWithField(String, Pos),

    #[error("Field '{0}' of type '{1}' must have a selection of subfields")]
    ObjectWithoutSelection(String, String, Pos),

    #[error("Field type '{0}' is not valid")]
    InvalidFieldType(String, Pos),

    #[error("Fields '{0}' conflict because {1}")]
    FieldsConflict(String, String, Pos),

    #[error("Selection set too deep")]
    SelectionSetTooDeep(Pos),

    #[error("Operation selects more than {0} fields")]
    TooManyFields(usize, Pos),

    #[error("Required argument '{0}' not found")]
    RequiredArgumentNotFound(String, Pos),

    #[error("Argument(s) '{0:?}' invalid for '{1}'")]
    StrayArguments(Vec<String>, String, Pos),

    #[error(
        "Argument '{argument_name}' is not of a valid type. Expected '{expected_type}', got '{actual_type}'"
    )]
    InvalidArgumentType {
        argument_name: String,
        expected_type: String,
        actual_type: String,
        pos: Pos,
    },

    #[error("No operation found")]
    NoOperationFound,

    #[error("Must provide operation name if query contains multiple operations")]
    MultipleOperationsNoOperationName,

    #[error("operationName '{0}' doesn't match any operation")]
    MultipleOperationsUnmatchedOperationName(String),
}

impl ValidationError {
    pub fn position1(&self) -> Option<Pos> {
        match self {
            ValidationError::QueryParsingFailed(_, pos, _) => Some(*pos),
            ValidationError::VariableNotFound(_, pos) => Some(*pos),
            ValidationError::MalformedVariable(_, pos, _) => Some(*pos),
            ValidationError::FragmentDefinitionNotFound(_, pos) => Some(*pos),
            ValidationError::FragmentCycle(_, pos) => Some(*pos),
            ValidationError::FragmentTypeMismatch(_, _, _, pos) => Some(*pos),
            ValidationError::InlineFragmentNotSupported(pos) => Some(*pos),
            ValidationError::OperationNotFound(_, pos) => Some(*pos),
            ValidationError::SubscriptionNotSupported(pos) => Some(*pos),
            ValidationError::InvalidField(_, _, pos) => Some(*pos),
            ValidationError::InvalidFieldType(_, pos) => Some(*pos),
            ValidationError::ScalarWithField(_, pos) => Some(*pos),
            ValidationError::ObjectWithoutSelection(_, _, pos) => Some(*pos),
            ValidationError::FieldsConflict(_, _, pos) => Some(*pos),
            ValidationError::SelectionSetTooDeep(pos) => Some(*pos),
            ValidationError::TooManyFields(_, pos) => Some(*pos),
            ValidationError::RequiredArgumentNotFound(_, pos) => Some(*pos),
            ValidationError::StrayArguments(_, _, pos) => Some(*pos),
            ValidationError::InvalidArgumentType { pos, .. } => Some(*pos),
            ValidationError::MissingQuery
            | ValidationError::NoOperationFound
            | ValidationError::MultipleOperationsNoOperationName
            | ValidationError::MultipleOperationsUnmatchedOperationName(_) => None,
        }
    }

    pub fn position2(&self) -> Option<Pos> {
        match self {
            ValidationError::QueryParsingFailed(_, _, pos) => *pos,
            _ => None,
        }
    }

    /// Positions worth reporting to the client (a default `Pos` carries no information).
    pub fn positions(&self) -> Vec<Pos> {
        [self.position1(), self.position2()]
            .into_iter()
            .flatten()
            .filter(|pos| *pos != Pos::default())
            .collect()
    }
}
