// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use feed_env::{EnvError, Environment, get_parsed};

pub const FEED_LOG: &str = "FEED_LOG";

pub const FEED_SERVER_HOST: &str = "FEED_SERVER_HOST";
pub const FEED_SERVER_PORT: &str = "FEED_SERVER_PORT";

pub const FEED_GRAPHQL_HTTP_PATH: &str = "FEED_GRAPHQL_HTTP_PATH";
pub const FEED_QUERY_DEPTH_LIMIT: &str = "FEED_QUERY_DEPTH_LIMIT";

pub const FEED_CATALOG_URL: &str = "FEED_CATALOG_URL";
pub const FEED_CATALOG_TIMEOUT_MS: &str = "FEED_CATALOG_TIMEOUT_MS";

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 4000;
pub const DEFAULT_QUERY_DEPTH_LIMIT: usize = 16;
pub const DEFAULT_CATALOG_URL: &str = "https://yts.mx/api/v2";

pub fn get_server_host(env: &dyn Environment) -> String {
    env.get_or_else(FEED_SERVER_HOST, DEFAULT_SERVER_HOST)
}

pub fn get_server_port(env: &dyn Environment) -> Result<u16, EnvError> {
    Ok(get_parsed(env, FEED_SERVER_PORT)?.unwrap_or(DEFAULT_SERVER_PORT))
}

pub fn get_graphql_http_path(env: &dyn Environment) -> String {
    env.get_or_else(FEED_GRAPHQL_HTTP_PATH, "/graphql")
}

pub fn get_query_depth_limit(env: &dyn Environment) -> Result<usize, EnvError> {
    Ok(get_parsed(env, FEED_QUERY_DEPTH_LIMIT)?.unwrap_or(DEFAULT_QUERY_DEPTH_LIMIT))
}

pub fn get_catalog_url(env: &dyn Environment) -> String {
    env.get_or_else(FEED_CATALOG_URL, DEFAULT_CATALOG_URL)
}

/// Timeout for catalog calls. Unset means no timeout.
pub fn get_catalog_timeout(env: &dyn Environment) -> Result<Option<Duration>, EnvError> {
    Ok(get_parsed::<u64>(env, FEED_CATALOG_TIMEOUT_MS)?.map(Duration::from_millis))
}
