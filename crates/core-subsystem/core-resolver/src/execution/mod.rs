// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Execute a validated operation against a [ResolverTable](crate::ResolverTable), producing the
//! response tree and the list of errors encountered along the way.

mod executor;
mod response;

pub use executor::Executor;
pub use response::{ErrorLocation, ExecutionError, ExecutionResponse, PathSegment};
