// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog URL '{0}' cannot have a path")]
    InvalidUrl(String),

    #[error("Failed to reach the film catalog: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("The film catalog did not respond in time")]
    Timeout,

    #[error("The film catalog responded with status {0}")]
    Status(u16),

    #[error("Failed to parse the film catalog response: {0}")]
    Parsing(#[from] serde_json::Error),

    #[error("The film catalog response has no `{0}`")]
    MissingPath(String),

    #[error("The film catalog response has `{path}` that is not {expected}")]
    UnexpectedShape { path: String, expected: &'static str },
}

impl From<reqwest::Error> for CatalogError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            CatalogError::Timeout
        } else {
            CatalogError::Transport(error)
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: Url,
    /// Applies to every call unless overridden per call. `None` means no timeout.
    pub timeout: Option<Duration>,
}

impl CatalogConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
        }
    }

    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }
}

/// Client for the remote film catalog.
///
/// Stateless: each call makes exactly one request, with no caching and no retries. Dropping the
/// returned future cancels the request.
///
/// Film records are returned as the catalog sent them. Only the enclosing shape (`data.movies`
/// being a list, `data.movie` an object) is checked here; the fields of each record are left to
/// the executor.
pub struct CatalogGateway {
    client: Client,
    config: CatalogConfig,
}

impl CatalogGateway {
    pub fn new(config: CatalogConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: CatalogConfig) -> Self {
        Self { client, config }
    }

    pub async fn list_films(&self, limit: u32) -> Result<Vec<Value>, CatalogError> {
        self.list_films_with_timeout(limit, self.config.timeout)
            .await
    }

    /// `GET <base>/list_movies.json?limit=<limit>`, returning `data.movies`.
    #[instrument(skip(self))]
    pub async fn list_films_with_timeout(
        &self,
        limit: u32,
        timeout: Option<Duration>,
    ) -> Result<Vec<Value>, CatalogError> {
        let url = self.endpoint("list_movies.json", ("limit", &limit.to_string()))?;
        let body = self.fetch(url, timeout).await?;

        match extract(body, &["data", "movies"])? {
            Value::Array(films) => Ok(films),
            _ => Err(unexpected_shape(&["data", "movies"], "a list")),
        }
    }

    pub async fn get_film(&self, id: &str) -> Result<Map<String, Value>, CatalogError> {
        self.get_film_with_timeout(id, self.config.timeout).await
    }

    /// `GET <base>/movie_details.json?movie_id=<id>`, returning `data.movie`.
    #[instrument(skip(self))]
    pub async fn get_film_with_timeout(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<Map<String, Value>, CatalogError> {
        let url = self.endpoint("movie_details.json", ("movie_id", id))?;
        let body = self.fetch(url, timeout).await?;

        match extract(body, &["data", "movie"])? {
            Value::Object(film) => Ok(film),
            _ => Err(unexpected_shape(&["data", "movie"], "an object")),
        }
    }

    fn endpoint(&self, resource: &str, query: (&str, &str)) -> Result<Url, CatalogError> {
        let mut url = self.config.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .push(resource);
        url.query_pairs_mut().append_pair(query.0, query.1);

        Ok(url)
    }

    async fn fetch(&self, url: Url, timeout: Option<Duration>) -> Result<Value, CatalogError> {
        debug!(%url, "Fetching from the film catalog");

        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Take the value at `path` out of the body. A null counts as missing.
fn extract(body: Value, path: &[&str]) -> Result<Value, CatalogError> {
    path
        .iter()
        .try_fold(body, |value, segment| match value {
            Value::Object(mut object) => object.remove(*segment).filter(|v| !v.is_null()),
            _ => None,
        })
        .ok_or_else(|| CatalogError::MissingPath(path.join(".")))
}

fn unexpected_shape(path: &[&str], expected: &'static str) -> CatalogError {
    CatalogError::UnexpectedShape {
        path: path.join("."),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_log::test;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;

    fn film_json(id: i64, title: &str) -> Value {
        json!({
            "id": id,
            "url": format!("https://catalog.example/movies/{id}"),
            "imdb_code": format!("tt{id:07}"),
            "title": title,
            "title_english": title,
            "title_long": format!("{title} (2001)"),
            "slug": title.to_lowercase().replace(' ', "-"),
            "year": 2001,
            "rating": 7.5,
            "runtime": 118.0,
            "genres": ["Drama", null],
            "download_count": 1200,
            "like_count": null,
            "summary": "A summary",
            "synopsis": null,
            "description_intro": null,
            "description_full": "A description",
            "yt_trailer_code": "abc123",
            "language": "en",
            "mpa_rating": "PG",
            "background_image": "bg.jpg",
            "background_image_original": "bg-original.jpg",
            "small_cover_image": "small.jpg",
            "medium_cover_image": "medium.jpg",
            "large_cover_image": "large.jpg",
            "date_uploaded": "2015-11-01 00:00:00",
            "date_uploaded_unix": 1446332400
        })
    }

    fn gateway(server: &MockServer) -> CatalogGateway {
        CatalogGateway::new(CatalogConfig::new(Url::parse(&server.uri()).unwrap()))
    }

    #[test(tokio::test)]
    async fn list_films() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/list_movies.json"))
            .and(query_param("limit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "data": { "movies": [film_json(1, "First"), film_json(2, "Second")] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let films = gateway(&server).list_films(3).await.unwrap();

        assert_eq!(films, vec![film_json(1, "First"), film_json(2, "Second")]);
    }

    #[test(tokio::test)]
    async fn get_film() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/movie_details.json"))
            .and(query_param("movie_id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "movie": film_json(42, "The Answer") }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let film = gateway(&server).get_film("42").await.unwrap();

        assert_eq!(film["id"], json!(42));
        assert_eq!(film["imdb_code"], json!("tt0000042"));
    }

    #[test(tokio::test)]
    async fn records_are_returned_as_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/list_movies.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "movies": [{ "id": 1, "title": "Only Title" }] }
            })))
            .mount(&server)
            .await;

        let films = gateway(&server).list_films(10).await.unwrap();

        assert_eq!(films, vec![json!({ "id": 1, "title": "Only Title" })]);
    }

    #[test(tokio::test)]
    async fn movies_must_be_a_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/list_movies.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "movies": { "id": 1 } } })),
            )
            .mount(&server)
            .await;

        let error = gateway(&server).list_films(10).await.unwrap_err();

        assert!(
            matches!(error, CatalogError::UnexpectedShape { ref path, .. } if path == "data.movies")
        );
    }

    #[test(tokio::test)]
    async fn movie_must_be_an_object() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/movie_details.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "movie": [1, 2] } })),
            )
            .mount(&server)
            .await;

        let error = gateway(&server).get_film("1").await.unwrap_err();

        assert!(matches!(error, CatalogError::UnexpectedShape { expected: "an object", .. }));
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let gateway = CatalogGateway::new(CatalogConfig::new(
            Url::parse("https://catalog.example/api/v2").unwrap(),
        ));

        assert_eq!(
            gateway
                .endpoint("movie_details.json", ("movie_id", "7"))
                .unwrap()
                .as_str(),
            "https://catalog.example/api/v2/movie_details.json?movie_id=7"
        );
    }

    #[test(tokio::test)]
    async fn missing_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/list_movies.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "movie_count": 0 } })),
            )
            .mount(&server)
            .await;

        let error = gateway(&server).list_films(10).await.unwrap_err();

        assert!(matches!(error, CatalogError::MissingPath(ref p) if p == "data.movies"));
    }

    #[test(tokio::test)]
    async fn error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let error = gateway(&server).get_film("1").await.unwrap_err();

        assert!(matches!(error, CatalogError::Status(503)));
    }

    #[test(tokio::test)]
    async fn unparseable_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let error = gateway(&server).list_films(1).await.unwrap_err();

        assert!(matches!(error, CatalogError::Parsing(_)));
    }

    #[test(tokio::test)]
    async fn timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "movie": film_json(1, "Slow") } }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let error = gateway(&server)
            .get_film_with_timeout("1", Some(Duration::from_millis(100)))
            .await
            .unwrap_err();

        assert!(matches!(error, CatalogError::Timeout));
    }

    #[test(tokio::test)]
    async fn unreachable() {
        // Nothing listens on the discard port
        let gateway = CatalogGateway::new(CatalogConfig::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
        ));

        let error = gateway.list_films(1).await.unwrap_err();

        assert!(matches!(error, CatalogError::Transport(_)));
    }
}
