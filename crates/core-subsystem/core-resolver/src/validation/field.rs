// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{Pos, types::Type};
use async_graphql_value::Name;

use crate::resolver_table::Arguments;

#[derive(Debug, Clone)]
pub struct ValidatedField {
    pub alias: Option<Name>,
    /// The name of the field.
    pub name: Name,
    /// The declared type of the field (as in the schema), including nullability.
    pub ty: Type,
    /// The arguments to the field, empty if no arguments are provided.
    pub arguments: Arguments,

    /// The subfields being selected in this field, if it is an object. Empty if no fields are
    /// being selected.
    pub subfields: Vec<ValidatedField>,

    /// Where the field appears in the query (reported with execution errors).
    pub pos: Pos,
}

impl ValidatedField {
    pub fn output_name(&self) -> String {
        self.alias.as_ref().unwrap_or(&self.name).to_string()
    }
}
