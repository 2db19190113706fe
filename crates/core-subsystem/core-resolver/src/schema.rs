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
        FieldDefinition, OperationType, ServiceDocument, TypeDefinition, TypeKind,
        TypeSystemDefinition,
    },
};
use async_graphql_value::Name;
use thiserror::Error;

pub const QUERY_ROOT_TYPENAME: &str = "Query";
pub const MUTATION_ROOT_TYPENAME: &str = "Mutation";

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// The type graph the engine validates and executes against.
///
/// Built from an already-parsed SDL document. Built-in scalars are always present, even if the
/// document doesn't declare them.
#[derive(Debug, Clone)]
pub struct Schema {
    type_definitions: HashMap<String, TypeDefinition>,
    query_type: String,
    mutation_type: String,
}

impl Schema {
    pub fn parse(sdl: &str) -> Result<Schema, SchemaError> {
        let document = async_graphql_parser::parse_schema(sdl)
            .map_err(|e| SchemaError::Parsing(e.to_string()))?;

        Self::new(document)
    }

    pub fn new(document: ServiceDocument) -> Result<Schema, SchemaError> {
        let mut type_definitions: HashMap<String, TypeDefinition> = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), scalar_type_definition(name)))
            .collect();

        let mut query_type = QUERY_ROOT_TYPENAME.to_string();
        let mut mutation_type = MUTATION_ROOT_TYPENAME.to_string();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Type(td) => {
                    let td = td.node;
                    let name = td.name.node.to_string();

                    if td.extend {
                        return Err(SchemaError::UnsupportedExtension(name));
                    }

                    let builtin = BUILTIN_SCALARS.contains(&name.as_str());
                    if type_definitions.insert(name.clone(), td).is_some() && !builtin {
                        return Err(SchemaError::DuplicateType(name));
                    }
                }
                TypeSystemDefinition::Schema(schema) => {
                    if let Some(query) = schema.node.query {
                        query_type = query.node.to_string();
                    }
                    if let Some(mutation) = schema.node.mutation {
                        mutation_type = mutation.node.to_string();
                    }
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        let schema = Schema {
            type_definitions,
            query_type,
            mutation_type,
        };
        schema.check_references()?;

        Ok(schema)
    }

    pub fn get_type_definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.type_definitions.get(type_name)
    }

    pub fn field_definition(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        match &self.get_type_definition(type_name)?.kind {
            TypeKind::Object(object) => object
                .fields
                .iter()
                .map(|f| &f.node)
                .find(|f| f.name.node == field_name),
            TypeKind::Interface(interface) => interface
                .fields
                .iter()
                .map(|f| &f.node)
                .find(|f| f.name.node == field_name),
            _ => None,
        }
    }

    /// Scalars and enums: values of these types are returned as-is, without a selection set.
    pub fn is_leaf_type(&self, type_name: &str) -> bool {
        matches!(
            self.get_type_definition(type_name).map(|td| &td.kind),
            Some(TypeKind::Scalar | TypeKind::Enum(_))
        )
    }

    /// The name of the root type for the operation, if the schema declares one.
    pub fn root_type_name(&self, operation_type: OperationType) -> Option<&str> {
        let name = match operation_type {
            OperationType::Query => &self.query_type,
            OperationType::Mutation => &self.mutation_type,
            OperationType::Subscription => return None,
        };

        self.type_definitions
            .contains_key(name)
            .then_some(name.as_str())
    }

    /// Every field, argument, and input field must refer to a declared type.
    fn check_references(&self) -> Result<(), SchemaError> {
        let known = |name: &Name| self.type_definitions.contains_key(name.as_str());

        for td in self.type_definitions.values() {
            let type_name = td.name.node.as_str();

            let fields = match &td.kind {
                TypeKind::Object(object) => &object.fields,
                TypeKind::Interface(interface) => &interface.fields,
                TypeKind::InputObject(input) => {
                    for field in &input.fields {
                        let referenced = crate::validation::underlying_type(&field.node.ty.node);
                        if !known(referenced) {
                            return Err(SchemaError::UnknownType {
                                type_name: referenced.to_string(),
                                referenced_by: format!("{type_name}.{}", field.node.name.node),
                            });
                        }
                    }
                    continue;
                }
                _ => continue,
            };

            for field in fields {
                let field = &field.node;
                let referenced = crate::validation::underlying_type(&field.ty.node);
                if !known(referenced) {
                    return Err(SchemaError::UnknownType {
                        type_name: referenced.to_string(),
                        referenced_by: format!("{type_name}.{}", field.name.node),
                    });
                }

                for argument in &field.arguments {
                    let referenced = crate::validation::underlying_type(&argument.node.ty.node);
                    if !known(referenced) {
                        return Err(SchemaError::UnknownType {
                            type_name: referenced.to_string(),
                            referenced_by: format!(
                                "{type_name}.{}({})",
                                field.name.node, argument.node.name.node
                            ),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn scalar_type_definition(name: &str) -> TypeDefinition {
    TypeDefinition {
        extend: false,
        description: None,
        name: Positioned::new(Name::new(name), Pos::default()),
        directives: vec![],
        kind: TypeKind::Scalar,
    }
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    Parsing(String),

    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String),

    #[error("Type extensions are not supported (extending '{0}')")]
    UnsupportedExtension(String),

    #[error("Unknown type '{type_name}' referenced by '{referenced_by}'")]
    UnknownType {
        type_name: String,
        referenced_by: String,
    },
}
