// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod bootstrap;
mod database;
mod http;
mod logging;
mod rate_limit;

pub use bootstrap::{BootstrapConfig, BootstrapConfigLayer, DEFAULT_INTERFACE_NAME};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use rate_limit::{RateLimitConfig, RateLimitConfigLayer};
