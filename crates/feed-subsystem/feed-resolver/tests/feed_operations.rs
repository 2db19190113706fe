// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde_json::{Value, json};
use test_log::test;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

use core_resolver::{OperationsPayload, SystemResolver};
use feed_resolver::{
    FeedContext,
    catalog_gateway::{CatalogConfig, CatalogGateway},
    create_system_resolver,
    record_store::RecordStore,
};

struct Feed {
    system_resolver: SystemResolver<FeedContext>,
    context: FeedContext,
}

impl Feed {
    fn new() -> Self {
        // Only tests that mock the catalog reach it
        Self::with_catalog("http://127.0.0.1:9")
    }

    fn with_catalog(catalog_url: &str) -> Self {
        let catalog = CatalogGateway::new(CatalogConfig::new(Url::parse(catalog_url).unwrap()));

        Self {
            system_resolver: create_system_resolver(16).unwrap(),
            context: FeedContext::new(RecordStore::seeded(), catalog),
        }
    }

    async fn run(&self, query: &str) -> Value {
        self.run_with(query, json!(null)).await
    }

    async fn run_with(&self, query: &str, variables: Value) -> Value {
        let payload = OperationsPayload::from_json(json!({
            "query": query,
            "variables": variables,
        }))
        .unwrap();

        self.system_resolver
            .resolve_operations(payload, &self.context)
            .await
            .to_json()
            .unwrap()
    }
}

fn film(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "url": format!("https://catalog.example/movies/{id}"),
        "imdb_code": format!("tt{id:07}"),
        "title": title,
        "title_english": title,
        "title_long": format!("{title} (1999)"),
        "slug": title.to_lowercase(),
        "year": 1999,
        "rating": 8.1,
        "runtime": 136.0,
        "genres": ["Action", "Sci-Fi"],
        "download_count": 9000,
        "like_count": 120,
        "summary": "",
        "synopsis": "",
        "description_intro": "",
        "description_full": "",
        "yt_trailer_code": "vKQi3bBA1y8",
        "language": "en",
        "mpa_rating": "R",
        "background_image": "bg.jpg",
        "background_image_original": "bg.jpg",
        "small_cover_image": "s.jpg",
        "medium_cover_image": "m.jpg",
        "large_cover_image": "l.jpg",
        "date_uploaded": "2015-10-31 20:47:45",
        "date_uploaded_unix": 1446320865
    })
}

fn films(count: i64) -> Value {
    json!({
        "status": "ok",
        "data": {
            "movie_count": count,
            "movies": (1..=count).map(|id| film(id, &format!("Film {id}"))).collect::<Vec<_>>()
        }
    })
}

#[test(tokio::test)]
async fn all_messages_with_author_full_names() {
    let response = Feed::new()
        .run("{ allMessages { id text author { fullName } } }")
        .await;

    assert_eq!(
        response,
        json!({
            "data": {
                "allMessages": [
                    { "id": "1", "text": "Hello world", "author": { "fullName": "John Doe" } },
                    { "id": "2", "text": "Second tweet", "author": { "fullName": "Yusung Kim" } }
                ]
            }
        })
    );
}

#[test(tokio::test)]
async fn author_lookup() {
    let feed = Feed::new();

    assert_eq!(
        feed.run(r#"{ author(id: "2") { id firstName lastName fullName } }"#)
            .await,
        json!({
            "data": {
                "author": { "id": "2", "firstName": "Yusung", "lastName": "Kim", "fullName": "Yusung Kim" }
            }
        })
    );

    // No such author is not a fault
    assert_eq!(
        feed.run(r#"{ author(id: "99") { id } }"#).await,
        json!({ "data": { "author": null } })
    );
}

#[test(tokio::test)]
async fn all_authors() {
    let response = Feed::new().run("{ allAuthors { fullName } }").await;

    assert_eq!(
        response,
        json!({
            "data": {
                "allAuthors": [{ "fullName": "John Doe" }, { "fullName": "Yusung Kim" }]
            }
        })
    );
}

#[test(tokio::test)]
async fn post_message_allocates_increasing_ids() {
    let feed = Feed::new();

    let posted = feed
        .run_with(
            r#"
            mutation Post($text: String!, $authorId: ID!) {
                postMessage(text: $text, authorId: $authorId) { id text author { fullName } }
            }
        "#,
            json!({ "text": "Third", "authorId": "2" }),
        )
        .await;

    assert_eq!(
        posted,
        json!({
            "data": {
                "postMessage": { "id": "3", "text": "Third", "author": { "fullName": "Yusung Kim" } }
            }
        })
    );

    let posted = feed
        .run(r#"mutation { postMessage(text: "Fourth", authorId: 1) { id } }"#)
        .await;
    assert_eq!(posted, json!({ "data": { "postMessage": { "id": "4" } } }));

    assert_eq!(
        feed.run(r#"{ message(id: "3") { text } }"#).await,
        json!({ "data": { "message": { "text": "Third" } } })
    );
}

#[test(tokio::test)]
async fn message_author_may_be_missing() {
    let feed = Feed::new();

    // Author ids aren't checked when posting
    let posted = feed
        .run(r#"mutation { postMessage(text: "Orphan", authorId: "42") { id author { id } } }"#)
        .await;

    assert_eq!(
        posted,
        json!({ "data": { "postMessage": { "id": "3", "author": null } } })
    );
}

#[test(tokio::test)]
async fn delete_message_once() {
    let feed = Feed::new();
    let delete = r#"mutation { deleteMessage(id: "1") }"#;

    assert_eq!(
        feed.run(delete).await,
        json!({ "data": { "deleteMessage": true } })
    );
    assert_eq!(
        feed.run(delete).await,
        json!({ "data": { "deleteMessage": false } })
    );
    assert_eq!(
        feed.run(r#"mutation { deleteMessage(id: "nope") }"#).await,
        json!({ "data": { "deleteMessage": false } })
    );

    assert_eq!(
        feed.run(r#"{ message(id: "1") { id } allMessages { id } }"#)
            .await,
        json!({ "data": { "message": null, "allMessages": [{ "id": "2" }] } })
    );
}

#[test(tokio::test)]
async fn mutations_in_one_request_run_in_order() {
    let feed = Feed::new();

    let response = feed
        .run(
            r#"
            mutation {
                first: postMessage(text: "a", authorId: "1") { id }
                removed: deleteMessage(id: "3")
                second: postMessage(text: "b", authorId: "1") { id }
            }
        "#,
        )
        .await;

    assert_eq!(
        response,
        json!({
            "data": {
                "first": { "id": "3" },
                "removed": true,
                "second": { "id": "4" }
            }
        })
    );
}

#[test(tokio::test)]
async fn all_films_default_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list_movies.json"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(films(2)))
        .expect(2)
        .mount(&server)
        .await;

    let feed = Feed::with_catalog(&server.uri());

    let response = feed.run("{ allFilms { id title } }").await;
    assert_eq!(
        response,
        json!({
            "data": {
                "allFilms": [{ "id": 1, "title": "Film 1" }, { "id": 2, "title": "Film 2" }]
            }
        })
    );

    // A non-positive limit is replaced by the default as well
    let response = feed.run("{ allFilms(limit: 0) { id } }").await;
    assert!(response.get("errors").is_none());
}

#[test(tokio::test)]
async fn all_films_with_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list_movies.json"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(films(5)))
        .expect(1)
        .mount(&server)
        .await;

    let response = Feed::with_catalog(&server.uri())
        .run("{ allFilms(limit: 5) { title genres rating runtime like_count } }")
        .await;

    let all_films = response["data"]["allFilms"].as_array().unwrap();
    assert_eq!(all_films.len(), 5);
    assert_eq!(
        all_films[4],
        json!({
            "title": "Film 5",
            "genres": ["Action", "Sci-Fi"],
            "rating": 8.1,
            "runtime": 136.0,
            "like_count": 120
        })
    );
}

#[test(tokio::test)]
async fn film_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie_details.json"))
        .and(query_param("movie_id", "10"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "movie": film(10, "Heat") } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = Feed::with_catalog(&server.uri())
        .run(r#"{ film(id: 10) { id title imdb_code date_uploaded_unix } }"#)
        .await;

    assert_eq!(
        response,
        json!({
            "data": {
                "film": {
                    "id": 10,
                    "title": "Heat",
                    "imdb_code": "tt0000010",
                    "date_uploaded_unix": 1446320865
                }
            }
        })
    );
}

async fn catalog_with_partial_film() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list_movies.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "movies": [film(1, "Complete"), { "id": 2, "title": "Only Title" }] }
        })))
        .mount(&server)
        .await;

    server
}

#[test(tokio::test)]
async fn film_records_need_only_the_selected_fields() {
    let server = catalog_with_partial_film().await;

    let response = Feed::with_catalog(&server.uri())
        .run("{ allFilms { id title like_count } }")
        .await;

    assert_eq!(
        response,
        json!({
            "data": {
                "allFilms": [
                    { "id": 1, "title": "Complete", "like_count": 120 },
                    { "id": 2, "title": "Only Title", "like_count": null }
                ]
            }
        })
    );
}

#[test(tokio::test)]
async fn missing_required_film_field_is_reported_at_that_field() {
    let server = catalog_with_partial_film().await;

    let response = Feed::with_catalog(&server.uri())
        .run("{ allFilms { title yt_trailer_code } }")
        .await;

    assert_eq!(response["data"], Value::Null);

    let errors = response["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0]["message"],
        json!("Cannot return null for non-nullable field FilmRecord.yt_trailer_code")
    );
    assert_eq!(errors[0]["path"], json!(["allFilms", 1, "yt_trailer_code"]));
}

#[test(tokio::test)]
async fn catalog_failure_nulls_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = Feed::with_catalog(&server.uri())
        .run("{ allAuthors { id } allFilms { id } }")
        .await;

    // allFilms is non-null and so is its parent: the failure reaches the root
    assert_eq!(response["data"], Value::Null);

    let errors = response["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0]["message"],
        json!("The film catalog responded with status 500")
    );
    assert_eq!(errors[0]["path"], json!(["allFilms"]));
}

#[test(tokio::test)]
async fn invalid_arguments_are_rejected_before_resolution() {
    let feed = Feed::new();

    let response = feed
        .run(r#"mutation { postMessage(text: "missing author") { id } }"#)
        .await;

    assert_eq!(response.get("data"), None);
    assert_eq!(
        response["errors"][0]["message"],
        json!("Required argument 'authorId' not found")
    );

    // Nothing was posted
    assert_eq!(
        feed.run("{ allMessages { id } }").await,
        json!({ "data": { "allMessages": [{ "id": "1" }, { "id": "2" }] } })
    );
}
