// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod request;

use std::sync::{Arc, Mutex, PoisonError};

use actix_web::{
    HttpRequest, HttpResponse,
    web::{self, ServiceConfig},
};
use serde_json::Value;

use common::http::{RequestHead, RequestPayload, ResponseBody, ResponsePayload};
use common::router::{CompositeRouter, Router};
use feed_env::Environment;
use feed_resolver::FeedSetupError;
use graphql_router::GraphQLRouter;
use request::ActixRequestHead;

macro_rules! error_msg {
    ($msg:literal) => {
        concat!("{\"errors\": [{\"message\":\"", $msg, "\"}]}").as_bytes()
    };
}

/// Build the router serving the feed service (seed data and catalog configured from `env`).
pub fn create_system_router(env: Arc<dyn Environment>) -> Result<CompositeRouter, FeedSetupError> {
    let (system_resolver, context) = feed_resolver::load(env.as_ref())?;

    Ok(CompositeRouter::new(vec![Box::new(GraphQLRouter::new(
        system_resolver,
        context,
        env,
    ))]))
}

pub fn configure_router(
    system_router: web::Data<CompositeRouter>,
) -> impl FnOnce(&mut ServiceConfig) {
    move |app| {
        app.app_data(system_router).default_service(web::to(resolve));
    }
}

struct ActixRequestPayload {
    head: ActixRequestHead,
    body: Mutex<Value>,
}

impl RequestPayload for ActixRequestPayload {
    fn get_head(&self) -> &(dyn RequestHead + Send + Sync) {
        &self.head
    }

    fn take_body(&self) -> Value {
        self.body
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

async fn resolve(
    http_request: HttpRequest,
    body: Option<web::Json<Value>>,
    system_router: web::Data<CompositeRouter>,
) -> HttpResponse {
    let request = ActixRequestPayload {
        head: ActixRequestHead::from_request(&http_request),
        body: Mutex::new(body.map(|b| b.into_inner()).unwrap_or(Value::Null)),
    };

    let response = system_router.route(&request).await;

    match response {
        Some(ResponsePayload {
            body,
            headers,
            status_code,
        }) => {
            let actix_status_code = match to_actix_status_code(status_code) {
                Ok(status_code) => status_code,
                Err(err) => {
                    tracing::error!("Invalid status code: {}", err);
                    return HttpResponse::InternalServerError()
                        .body(error_msg!("Invalid status code"));
                }
            };

            let mut builder = HttpResponse::build(actix_status_code);

            for header in headers.into_iter() {
                builder.append_header(header);
            }

            match body {
                ResponseBody::Bytes(bytes) => builder.body(bytes),
                ResponseBody::None => builder.body(""),
            }
        }
        None => HttpResponse::InternalServerError().body(error_msg!("Error resolving request")),
    }
}

fn to_actix_status_code(
    status_code: http::StatusCode,
) -> Result<actix_web::http::StatusCode, String> {
    actix_web::http::StatusCode::from_u16(status_code.as_u16())
        .map_err(|_| "Invalid status code".to_string())
}
