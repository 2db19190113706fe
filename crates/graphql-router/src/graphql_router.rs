// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use tracing::{error, instrument};

use common::env_const::get_graphql_http_path;
use common::http::{Headers, RequestHead, RequestPayload, ResponseBody, ResponsePayload};
use common::router::Router;
use core_resolver::{OperationsPayload, SystemResolver};
use feed_env::Environment;

/// Serves `POST` requests at the GraphQL path by resolving them against a [SystemResolver].
///
/// The router owns the context shared by all requests (for the feed service, the record store
/// and the catalog gateway).
pub struct GraphQLRouter<C> {
    system_resolver: SystemResolver<C>,
    context: C,
    env: Arc<dyn Environment>,
}

impl<C: Send + Sync> GraphQLRouter<C> {
    pub fn new(system_resolver: SystemResolver<C>, context: C, env: Arc<dyn Environment>) -> Self {
        Self {
            system_resolver,
            context,
            env,
        }
    }

    fn suitable(&self, request_head: &(dyn RequestHead + Sync)) -> bool {
        request_head.get_path() == get_graphql_http_path(self.env.as_ref())
            && request_head.get_method() == http::Method::POST
    }
}

#[async_trait]
impl<C: Send + Sync> Router for GraphQLRouter<C> {
    /// Resolves an incoming operation, returning the JSON response (data and/or errors).
    ///
    /// A body that isn't an operation payload is rejected with `400 Bad Request`.
    #[instrument(
        name = "GraphQLRouter::route"
        skip(self, request)
    )]
    async fn route(&self, request: &(dyn RequestPayload + Send + Sync)) -> Option<ResponsePayload> {
        if !self.suitable(request.get_head()) {
            return None;
        }

        let operations_payload = match OperationsPayload::from_json(request.take_body()) {
            Ok(payload) => payload,
            Err(err) => {
                error!(%err, "Invalid request body");
                return Some(empty_response(StatusCode::BAD_REQUEST));
            }
        };

        let response = self
            .system_resolver
            .resolve_operations(operations_payload, &self.context)
            .await;

        match serde_json::to_vec(&response) {
            Ok(body) => {
                let mut headers = Headers::new();
                headers.insert("content-type".into(), "application/json".into());

                Some(ResponsePayload {
                    body: ResponseBody::Bytes(body),
                    headers,
                    status_code: StatusCode::OK,
                })
            }
            Err(err) => {
                error!(%err, "Failed to serialize response");
                Some(empty_response(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }
}

fn empty_response(status_code: StatusCode) -> ResponsePayload {
    ResponsePayload {
        body: ResponseBody::None,
        headers: Headers::new(),
        status_code,
    }
}
