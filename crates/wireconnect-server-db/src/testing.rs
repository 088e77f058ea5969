// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for tests in this and downstream crates.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::pool::run_migrations;

/// A migrated in-memory database.
///
/// Every SQLite connection to `:memory:` is its own database, so the pool is
/// capped at a single connection.
pub async fn create_directory_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:")
		.expect("valid in-memory url")
		.foreign_keys(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.expect("Failed to create test pool");

	run_migrations(&pool).await.expect("Failed to run migrations");
	pool
}
