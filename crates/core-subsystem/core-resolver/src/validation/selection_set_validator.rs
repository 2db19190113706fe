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
    types::{
        BaseType, Field, FragmentDefinition, FragmentSpread, Selection, SelectionSet, Type,
        TypeDefinition, TypeKind,
    },
};
use async_graphql_value::{ConstValue, Name};
use indexmap::{IndexMap, map::Entry};

use crate::{
    resolver_table::Arguments,
    schema::Schema,
    validation::{field::ValidatedField, validation_error::ValidationError},
};

use super::{arguments_validator::ArgumentValidator, underlying_type};

/// The most fields a single operation may select, counting every copy a fragment spread inlines.
pub const MAX_SELECTED_FIELDS: usize = 10_000;

/// State carried through the whole selection of an operation.
#[derive(Default)]
struct Collection {
    /// Fragments being inlined (outermost first).
    fragment_path: Vec<Name>,
    selected_fields: usize,
}

/// Context for validating a selection set.
pub struct SelectionSetValidator<'a> {
    schema: &'a Schema,
    /// The parent type of this field.
    container_type: &'a TypeDefinition,
    variables: &'a HashMap<Name, ConstValue>,
    fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    query_depth_limit: usize,
}

impl<'a> SelectionSetValidator<'a> {
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        container_type: &'a TypeDefinition,
        variables: &'a HashMap<Name, ConstValue>,
        fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
        query_depth_limit: usize,
    ) -> Self {
        Self {
            schema,
            container_type,
            variables,
            fragment_definitions,
            query_depth_limit,
        }
    }

    /// Validate selection set.
    ///
    /// Validations performed:
    /// - Each field is defined in the `container_type` (or is `__typename`)
    /// - Each fragment referred is defined, applies to the `container_type`, and doesn't
    ///   (directly or indirectly) spread itself
    /// - Leaf fields have no selection and object fields have one
    /// - No field is nested deeper than the query depth limit (fields in this selection set are
    ///   at `depth`)
    /// - No more than [MAX_SELECTED_FIELDS] fields are selected (including those inlined from
    ///   fragments)
    /// - Fields sharing an output name are mergeable
    /// - Arguments to each field are valid (see [ArgumentValidator] for more details)
    ///
    /// # Returns
    ///   A vector of validated fields (any fragment is resolved and inlined, and fields with the
    ///   same output name are merged, thus normalizing the fields)
    pub(super) fn validate(
        &self,
        selection_set: &Positioned<SelectionSet>,
        depth: usize,
    ) -> Result<Vec<ValidatedField>, ValidationError> {
        self.validate_selection_set(selection_set, depth, &mut Collection::default())
    }

    fn validate_selection_set(
        &self,
        selection_set: &Positioned<SelectionSet>,
        depth: usize,
        collection: &mut Collection,
    ) -> Result<Vec<ValidatedField>, ValidationError> {
        let fields = self.collect_fields(selection_set, depth, collection)?;
        merge_fields(fields)
    }

    fn collect_fields(
        &self,
        selection_set: &Positioned<SelectionSet>,
        depth: usize,
        collection: &mut Collection,
    ) -> Result<Vec<ValidatedField>, ValidationError> {
        let mut fields = vec![];

        for selection in &selection_set.node.items {
            match &selection.node {
                Selection::Field(field) => {
                    collection.selected_fields += 1;
                    if collection.selected_fields > MAX_SELECTED_FIELDS {
                        return Err(ValidationError::TooManyFields(
                            MAX_SELECTED_FIELDS,
                            field.pos,
                        ));
                    }

                    fields.push(self.validate_field(field, depth, collection)?)
                }
                Selection::FragmentSpread(fragment_spread) => {
                    let fragment_name = &fragment_spread.node.fragment_name.node;

                    if collection.fragment_path.contains(fragment_name) {
                        return Err(ValidationError::FragmentCycle(
                            fragment_name.to_string(),
                            fragment_spread.pos,
                        ));
                    }

                    let fragment_definition = self.fragment_definition(fragment_spread)?;

                    collection.fragment_path.push(fragment_name.clone());
                    let fragment_fields = self.collect_fields(
                        &fragment_definition.selection_set,
                        depth,
                        collection,
                    );
                    collection.fragment_path.pop();

                    fields.extend(fragment_fields?);
                }
                Selection::InlineFragment(inline_fragment) => {
                    return Err(ValidationError::InlineFragmentNotSupported(
                        inline_fragment.pos,
                    ));
                }
            }
        }

        Ok(fields)
    }

    fn validate_field(
        &self,
        field: &Positioned<Field>,
        depth: usize,
        collection: &mut Collection,
    ) -> Result<ValidatedField, ValidationError> {
        if depth > self.query_depth_limit {
            return Err(ValidationError::SelectionSetTooDeep(field.pos));
        }

        let field_name = &field.node.name.node;

        // Special treatment for the __typename field, since we are not supposed to expose it as
        // a normal field (for example, we should not declare that the "Message" type has a __typename field")
        if field_name.as_str() == "__typename" {
            return if !field.node.arguments.is_empty() {
                Err(ValidationError::StrayArguments(
                    field
                        .node
                        .arguments
                        .iter()
                        .map(|arg| arg.0.node.to_string())
                        .collect(),
                    field_name.to_string(),
                    field.pos,
                ))
            } else if !field.node.selection_set.node.items.is_empty() {
                Err(ValidationError::ScalarWithField(
                    field_name.to_string(),
                    field.pos,
                ))
            } else {
                Ok(ValidatedField {
                    alias: field.node.alias.as_ref().map(|alias| alias.node.clone()),
                    name: field_name.clone(),
                    ty: Type {
                        base: BaseType::Named(Name::new("String")),
                        nullable: false,
                    },
                    arguments: Arguments::new(),
                    subfields: vec![],
                    pos: field.pos,
                })
            };
        }

        let container_type_name = self.container_type.name.node.as_str();

        let field_definition = self
            .schema
            .field_definition(container_type_name, field_name.as_str())
            .ok_or_else(|| {
                ValidationError::InvalidField(
                    field_name.to_string(),
                    container_type_name.to_string(),
                    field.pos,
                )
            })?;

        let field_type_name = underlying_type(&field_definition.ty.node);
        let field_type_definition = self
            .schema
            .get_type_definition(field_type_name.as_str())
            .ok_or_else(|| {
                ValidationError::InvalidFieldType(field_type_name.to_string(), field.pos)
            })?;

        let has_selection = !field.node.selection_set.node.items.is_empty();

        let subfields = match &field_type_definition.kind {
            TypeKind::Scalar | TypeKind::Enum(_) => {
                if has_selection {
                    return Err(ValidationError::ScalarWithField(
                        field_name.to_string(),
                        field.pos,
                    ));
                }
                vec![]
            }
            TypeKind::Object(_) => {
                if !has_selection {
                    return Err(ValidationError::ObjectWithoutSelection(
                        field_name.to_string(),
                        field_type_name.to_string(),
                        field.pos,
                    ));
                }

                let subfield_validator = SelectionSetValidator::new(
                    self.schema,
                    field_type_definition,
                    self.variables,
                    self.fragment_definitions,
                    self.query_depth_limit,
                );

                subfield_validator.validate_selection_set(
                    &field.node.selection_set,
                    depth + 1,
                    collection,
                )?
            }
            // Interfaces and unions would need type resolution at execution time
            _ => {
                return Err(ValidationError::InvalidFieldType(
                    field_type_name.to_string(),
                    field.pos,
                ));
            }
        };

        let argument_validator = ArgumentValidator::new(self.schema, self.variables, field);

        let arguments = argument_validator.validate(
            &field_definition
                .arguments
                .iter()
                .map(|d| &d.node)
                .collect::<Vec<_>>(),
        )?;

        Ok(ValidatedField {
            alias: field.node.alias.as_ref().map(|alias| alias.node.clone()),
            name: field_name.clone(),
            ty: field_definition.ty.node.clone(),
            arguments,
            subfields,
            pos: field.pos,
        })
    }

    fn fragment_definition(
        &self,
        fragment: &Positioned<FragmentSpread>,
    ) -> Result<&'a FragmentDefinition, ValidationError> {
        let fragment_name = &fragment.node.fragment_name.node;

        let fragment_definition = self
            .fragment_definitions
            .get(fragment_name)
            .map(|v| &v.node)
            .ok_or_else(|| {
                ValidationError::FragmentDefinitionNotFound(fragment_name.to_string(), fragment.pos)
            })?;

        let defined_on = &fragment_definition.type_condition.node.on.node;
        let spread_on = &self.container_type.name.node;

        if defined_on != spread_on {
            return Err(ValidationError::FragmentTypeMismatch(
                fragment_name.to_string(),
                spread_on.to_string(),
                defined_on.to_string(),
                fragment.pos,
            ));
        }

        Ok(fragment_definition)
    }
}

/// Merge fields that share an output name (alias, if any, otherwise the field name).
///
/// Two fields may share an output name only if they select the same field with the same
/// arguments. Their selections are combined (recursively merged). The first occurrence of each
/// output name determines its position in the result.
fn merge_fields(fields: Vec<ValidatedField>) -> Result<Vec<ValidatedField>, ValidationError> {
    let mut merged: IndexMap<String, ValidatedField> = IndexMap::new();

    for field in fields {
        match merged.entry(field.output_name()) {
            Entry::Vacant(entry) => {
                entry.insert(field);
            }
            Entry::Occupied(mut entry) => {
                let output_name = entry.key().clone();
                let existing = entry.get_mut();

                if existing.name != field.name {
                    return Err(conflict(
                        output_name,
                        format!(
                            "'{}' and '{}' are different fields",
                            existing.name, field.name
                        ),
                        field.pos,
                    ));
                }

                if existing.arguments != field.arguments {
                    return Err(conflict(
                        output_name,
                        "they have differing arguments".to_string(),
                        field.pos,
                    ));
                }

                existing.subfields.extend(field.subfields);
            }
        }
    }

    merged
        .into_values()
        .map(|mut field| {
            if !field.subfields.is_empty() {
                field.subfields = merge_fields(std::mem::take(&mut field.subfields))?;
            }
            Ok(field)
        })
        .collect()
}

fn conflict(output_name: String, reason: String, pos: Pos) -> ValidationError {
    ValidationError::FieldsConflict(output_name, reason, pos)
}
