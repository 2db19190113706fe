// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The message feed service: authors and messages kept in memory, and films fetched from a
//! remote catalog, served through the GraphQL engine in `core-resolver`.

pub mod catalog_gateway;
pub mod mutation_coordinator;
pub mod record_store;
mod resolvers;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use url::Url;

use common::env_const::{get_catalog_timeout, get_catalog_url, get_query_depth_limit};
use core_resolver::{Schema, SchemaError, SystemResolver};
use feed_env::{EnvError, Environment};

use catalog_gateway::{CatalogConfig, CatalogGateway};
use mutation_coordinator::MutationCoordinator;
use record_store::{RecordStore, SharedRecordStore};

pub use resolvers::resolver_table;

/// The service's schema (SDL).
pub const SCHEMA_SDL: &str = include_str!("schema.graphql");

/// Everything resolvers need access to while executing a request.
pub struct FeedContext {
    pub store: SharedRecordStore,
    pub mutations: MutationCoordinator,
    pub catalog: CatalogGateway,
}

impl FeedContext {
    pub fn new(store: RecordStore, catalog: CatalogGateway) -> Self {
        let store = store.into_shared();

        Self {
            mutations: MutationCoordinator::new(store.clone()),
            store,
            catalog,
        }
    }
}

#[derive(Error, Debug)]
pub enum FeedSetupError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("Invalid catalog URL '{url}': {source}")]
    InvalidCatalogUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

pub fn create_system_resolver(
    query_depth_limit: usize,
) -> Result<SystemResolver<FeedContext>, FeedSetupError> {
    let schema = Schema::parse(SCHEMA_SDL)?;

    Ok(SystemResolver::new(
        Arc::new(schema),
        resolver_table(),
        query_depth_limit,
    ))
}

/// Create the system resolver and a context holding the seed data, both configured from the
/// environment.
pub fn load(
    env: &dyn Environment,
) -> Result<(SystemResolver<FeedContext>, FeedContext), FeedSetupError> {
    let system_resolver = create_system_resolver(get_query_depth_limit(env)?)?;

    let catalog_url = get_catalog_url(env);
    let base_url =
        Url::parse(&catalog_url).map_err(|source| FeedSetupError::InvalidCatalogUrl {
            url: catalog_url.clone(),
            source,
        })?;
    let catalog_config = CatalogConfig::new(base_url).with_timeout(get_catalog_timeout(env)?);

    info!(%catalog_url, timeout = ?catalog_config.timeout, "Loaded feed system");

    let context = FeedContext::new(RecordStore::seeded(), CatalogGateway::new(catalog_config));

    Ok((system_resolver, context))
}

#[cfg(test)]
mod tests {
    use common::env_const::{FEED_CATALOG_TIMEOUT_MS, FEED_CATALOG_URL};
    use feed_env::MapEnvironment;

    use super::*;

    #[test]
    fn schema_is_valid() {
        assert!(create_system_resolver(16).is_ok());
    }

    #[test]
    fn load_from_env() {
        let env = MapEnvironment::from([
            (FEED_CATALOG_URL, "http://localhost:8123/api"),
            (FEED_CATALOG_TIMEOUT_MS, "250"),
        ]);

        let (_, context) = load(&env).unwrap();

        assert_eq!(record_store::read_store(&context.store).messages().len(), 2);
    }

    #[test]
    fn invalid_catalog_url() {
        let env = MapEnvironment::from([(FEED_CATALOG_URL, "not a url")]);

        assert!(matches!(
            load(&env),
            Err(FeedSetupError::InvalidCatalogUrl { .. })
        ));
    }
}
