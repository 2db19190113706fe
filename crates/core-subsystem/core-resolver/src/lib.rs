// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub mod execution;
pub mod resolver_table;
pub mod schema;
pub mod system_resolver;
pub mod validation;

pub use common::operation_payload::OperationsPayload;
pub use execution::{ExecutionError, ExecutionResponse, PathSegment};
pub use resolver_table::{Arguments, FieldError, Resolution, ResolveFieldFn, ResolverTable};
pub use schema::{Schema, SchemaError};
pub use system_resolver::SystemResolver;
