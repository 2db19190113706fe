// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::Serialize;
use serde_json::Value;

use common::value::Val;
use core_resolver::{Arguments, FieldError, Resolution, ResolverTable};

use crate::{FeedContext, catalog_gateway::CatalogError, record_store::read_store};

const DEFAULT_FILM_LIMIT: u32 = 10;

impl From<CatalogError> for FieldError {
    fn from(error: CatalogError) -> Self {
        FieldError::new(error.to_string())
    }
}

/// Resolvers for every field that isn't simply a property of its parent.
pub fn resolver_table() -> ResolverTable<FeedContext> {
    let mut table = ResolverTable::new();

    table
        .register("Author", "fullName", author_full_name)
        .register("Message", "author", message_author)
        .register("Query", "allMessages", all_messages)
        .register("Query", "message", message)
        .register("Query", "allAuthors", all_authors)
        .register("Query", "author", author)
        .register("Query", "allFilms", all_films)
        .register("Query", "film", film)
        .register("Mutation", "postMessage", post_message)
        .register("Mutation", "deleteMessage", delete_message);

    table
}

fn author_full_name<'a>(
    parent: &'a Value,
    _: &'a Arguments,
    _: &'a FeedContext,
) -> Resolution<'a> {
    let full_name = match (parent["firstName"].as_str(), parent["lastName"].as_str()) {
        (Some(first_name), Some(last_name)) => {
            Ok(Value::String(format!("{first_name} {last_name}")))
        }
        _ => Err(FieldError::new("Author is missing a first or last name")),
    };

    Resolution::Ready(full_name)
}

fn message_author<'a>(
    parent: &'a Value,
    _: &'a Arguments,
    context: &'a FeedContext,
) -> Resolution<'a> {
    let store = read_store(&context.store);

    let author = parent["authorId"]
        .as_str()
        .and_then(|author_id| store.author(author_id));

    Resolution::Ready(to_json(author))
}

fn all_messages<'a>(_: &'a Value, _: &'a Arguments, context: &'a FeedContext) -> Resolution<'a> {
    Resolution::Ready(to_json(read_store(&context.store).messages()))
}

fn message<'a>(_: &'a Value, arguments: &'a Arguments, context: &'a FeedContext) -> Resolution<'a> {
    let message = string_argument(arguments, "id")
        .and_then(|id| to_json(read_store(&context.store).message(id)));

    Resolution::Ready(message)
}

fn all_authors<'a>(_: &'a Value, _: &'a Arguments, context: &'a FeedContext) -> Resolution<'a> {
    Resolution::Ready(to_json(read_store(&context.store).authors()))
}

fn author<'a>(_: &'a Value, arguments: &'a Arguments, context: &'a FeedContext) -> Resolution<'a> {
    let author = string_argument(arguments, "id")
        .and_then(|id| to_json(read_store(&context.store).author(id)));

    Resolution::Ready(author)
}

fn all_films<'a>(
    _: &'a Value,
    arguments: &'a Arguments,
    context: &'a FeedContext,
) -> Resolution<'a> {
    let limit = film_limit(arguments.get("limit"));

    Resolution::deferred(async move {
        let films = context.catalog.list_films(limit).await?;
        Ok(Value::Array(films))
    })
}

fn film<'a>(_: &'a Value, arguments: &'a Arguments, context: &'a FeedContext) -> Resolution<'a> {
    let id = match string_argument(arguments, "id") {
        Ok(id) => id,
        Err(error) => return Resolution::Ready(Err(error)),
    };

    Resolution::deferred(async move {
        let film = context.catalog.get_film(id).await?;
        Ok(Value::Object(film))
    })
}

fn post_message<'a>(
    _: &'a Value,
    arguments: &'a Arguments,
    context: &'a FeedContext,
) -> Resolution<'a> {
    let message = string_argument(arguments, "text").and_then(|text| {
        let author_id = string_argument(arguments, "authorId")?;
        to_json(context.mutations.post_message(text, author_id))
    });

    Resolution::Ready(message)
}

fn delete_message<'a>(
    _: &'a Value,
    arguments: &'a Arguments,
    context: &'a FeedContext,
) -> Resolution<'a> {
    let deleted = string_argument(arguments, "id")
        .map(|id| Value::Bool(context.mutations.delete_message(id)));

    Resolution::Ready(deleted)
}

/// The number of films to request: the given limit if positive, 10 otherwise.
fn film_limit(limit: Option<&Val>) -> u32 {
    limit
        .and_then(Val::as_i64)
        .filter(|limit| *limit > 0)
        .map(|limit| u32::try_from(limit).unwrap_or(u32::MAX))
        .unwrap_or(DEFAULT_FILM_LIMIT)
}

fn string_argument<'a>(arguments: &'a Arguments, name: &str) -> Result<&'a str, FieldError> {
    arguments
        .get(name)
        .and_then(Val::as_str)
        .ok_or_else(|| FieldError::new(format!("Missing argument '{name}'")))
}

fn to_json(value: impl Serialize) -> Result<Value, FieldError> {
    serde_json::to_value(value)
        .map_err(|e| FieldError::new(format!("Failed to serialize the result: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn limit_defaults_to_ten() {
        assert_eq!(film_limit(None), 10);
        assert_eq!(film_limit(Some(&Val::Null)), 10);
        assert_eq!(film_limit(Some(&Val::from(json!(0)))), 10);
        assert_eq!(film_limit(Some(&Val::from(json!(-3)))), 10);
        assert_eq!(film_limit(Some(&Val::from(json!(5)))), 5);
        assert_eq!(film_limit(Some(&Val::from(json!(1_u64 << 40)))), u32::MAX);
    }
}
