// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use futures::{FutureExt, future::BoxFuture};
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use common::value::Val;

/// Validated arguments of a field, keyed by argument name. Omitted nullable arguments (without a
/// default) are absent.
pub type Arguments = IndexMap<String, Val>;

/// A resolver for a single (type, field) pair.
///
/// Receives the resolved value of the parent object, the field's arguments, and the
/// application-supplied context.
pub type ResolveFieldFn<C> = for<'a> fn(&'a Value, &'a Arguments, &'a C) -> Resolution<'a>;

/// A fault raised by a resolver. The message is reported to the client.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct FieldError {
    message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> &str {
        &self.message
    }
}

/// The outcome of invoking a resolver: either available right away or still to be awaited.
///
/// A deferred resolution suspends only the branch of the result tree it belongs to.
pub enum Resolution<'a> {
    Ready(Result<Value, FieldError>),
    Deferred(BoxFuture<'a, Result<Value, FieldError>>),
}

impl<'a> Resolution<'a> {
    pub fn value(value: Value) -> Self {
        Resolution::Ready(Ok(value))
    }

    pub fn deferred(
        future: impl Future<Output = Result<Value, FieldError>> + Send + 'a,
    ) -> Self {
        Resolution::Deferred(future.boxed())
    }

    pub async fn into_result(self) -> Result<Value, FieldError> {
        match self {
            Resolution::Ready(result) => result,
            Resolution::Deferred(future) => future.await,
        }
    }
}

impl From<Result<Value, FieldError>> for Resolution<'_> {
    fn from(result: Result<Value, FieldError>) -> Self {
        Resolution::Ready(result)
    }
}

/// Maps (type name, field name) to a resolver.
///
/// Fields without an entry are resolved by [`default_resolve`]. The table is populated before
/// execution starts and only read afterwards.
pub struct ResolverTable<C> {
    resolvers: HashMap<String, HashMap<String, ResolveFieldFn<C>>>,
}

impl<C> Default for ResolverTable<C> {
    fn default() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }
}

impl<C> ResolverTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver, replacing any earlier one for the same (type, field) pair.
    pub fn register(
        &mut self,
        type_name: &str,
        field_name: &str,
        resolver: ResolveFieldFn<C>,
    ) -> &mut Self {
        let replaced = self
            .resolvers
            .entry(type_name.to_string())
            .or_default()
            .insert(field_name.to_string(), resolver);

        if replaced.is_some() {
            warn!(type_name, field_name, "Replacing previously registered resolver");
        }

        self
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<ResolveFieldFn<C>> {
        self.resolvers
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .copied()
    }

    pub fn resolve<'a>(
        &self,
        type_name: &str,
        field_name: &str,
        parent: &'a Value,
        arguments: &'a Arguments,
        context: &'a C,
    ) -> Resolution<'a> {
        match self.get(type_name, field_name) {
            Some(resolver) => resolver(parent, arguments, context),
            None => Resolution::Ready(default_resolve(field_name, parent)),
        }
    }
}

/// Resolve a field as the same-named property of the parent object. A missing property resolves
/// to null.
pub fn default_resolve(field_name: &str, parent: &Value) -> Result<Value, FieldError> {
    match parent {
        Value::Object(object) => Ok(object.get(field_name).cloned().unwrap_or(Value::Null)),
        _ => Err(FieldError::new(format!(
            "Cannot resolve '{field_name}': the parent value is not an object"
        ))),
    }
}
