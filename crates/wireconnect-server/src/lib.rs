// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! wireconnect HTTP server.
//!
//! Users authenticate with HTTP Basic credentials and ask the server to
//! install their WireGuard public key as a peer on one of its kernel
//! interfaces. Administrators manage users and peer definitions.

pub mod api;
pub mod auth_middleware;
pub mod bootstrap;
pub mod error;
pub mod rate_limit;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use rate_limit::{PurgeTask, RateLimiter};
pub use wireconnect_server_config::ServerConfig;
