// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! # Tracing configuration setup.
//!
//! The server code is instrumented with Rust's `tracing` framework.
//!
//! Calling the `init` function will initialize a global tracing subscriber based on the values of
//! the `FEED_LOG` environment variable which follows the same conventions as `RUST_LOG`. This will
//! provide console logging.
//!
//! ```shell
//! $ FEED_LOG=core_resolver=debug,info feed-server
//! ```

use tracing_subscriber::{EnvFilter, filter::LevelFilter, prelude::*};

use crate::env_const::FEED_LOG;

/// Initialize the tracing subscriber.
///
/// Creates a compact `tracing_subscriber::fmt` layer filtered by `FEED_LOG` (default level: `info`).
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer().compact();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(FEED_LOG)
        .from_env_lossy()
        .add_directive(
            "hyper=warn"
                .parse()
                .expect("Hard coded directive shouldn't fail"),
        );

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
