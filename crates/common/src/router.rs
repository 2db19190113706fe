// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::http::{Headers, RequestPayload, ResponseBody, ResponsePayload};
use async_trait::async_trait;
use http::StatusCode;

#[async_trait]
pub trait Router: Sync {
    /// Route the request, or return `None` if this router doesn't handle it.
    async fn route(&self, request: &(dyn RequestPayload + Send + Sync)) -> Option<ResponsePayload>;
}

/// Tries each router in turn; responds with `404` if none of them accepts the request.
pub struct CompositeRouter {
    routers: Vec<Box<dyn Router + Send + Sync>>,
}

impl CompositeRouter {
    pub fn new(routers: Vec<Box<dyn Router + Send + Sync>>) -> Self {
        Self { routers }
    }
}

#[async_trait]
impl Router for CompositeRouter {
    async fn route(&self, request: &(dyn RequestPayload + Send + Sync)) -> Option<ResponsePayload> {
        for router in self.routers.iter() {
            if let Some(response) = router.route(request).await {
                return Some(response);
            }
        }

        Some(ResponsePayload {
            body: ResponseBody::None,
            headers: Headers::new(),
            status_code: StatusCode::NOT_FOUND,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::http::RequestHead;

    struct TestHead(&'static str);

    impl RequestHead for TestHead {
        fn get_headers(&self, _key: &str) -> Vec<String> {
            vec![]
        }

        fn get_path(&self) -> String {
            self.0.to_string()
        }

        fn get_method(&self) -> http::Method {
            http::Method::GET
        }
    }

    struct TestRequest(TestHead);

    impl RequestPayload for TestRequest {
        fn get_head(&self) -> &(dyn RequestHead + Send + Sync) {
            &self.0
        }

        fn take_body(&self) -> Value {
            Value::Null
        }
    }

    struct PathRouter(&'static str);

    #[async_trait]
    impl Router for PathRouter {
        async fn route(
            &self,
            request: &(dyn RequestPayload + Send + Sync),
        ) -> Option<ResponsePayload> {
            (request.get_head().get_path() == self.0).then(|| ResponsePayload {
                body: ResponseBody::Bytes(self.0.as_bytes().to_vec()),
                headers: Headers::new(),
                status_code: StatusCode::OK,
            })
        }
    }

    #[tokio::test]
    async fn first_accepting_router_wins() {
        let router = CompositeRouter::new(vec![
            Box::new(PathRouter("/a")),
            Box::new(PathRouter("/b")),
        ]);

        let response = router.route(&TestRequest(TestHead("/b"))).await.unwrap();
        assert_eq!(response.status_code, StatusCode::OK);
        assert!(matches!(response.body, ResponseBody::Bytes(ref b) if b == b"/b"));
    }

    #[tokio::test]
    async fn unmatched_path_is_not_found() {
        let router = CompositeRouter::new(vec![Box::new(PathRouter("/a"))]);

        let response = router.route(&TestRequest(TestHead("/c"))).await.unwrap();
        assert_eq!(response.status_code, StatusCode::NOT_FOUND);
    }
}
