// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Provides core functionality for handling incoming GraphQL requests without depending
/// on any specific web framework.
///
/// The router extracts the operation payload from the request body, resolves it with a
/// [core_resolver::SystemResolver], and returns the JSON response.
mod graphql_router;

pub use graphql_router::GraphQLRouter;
