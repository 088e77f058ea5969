// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordering of the rate-limit, authentication and admin gates.

mod common;

use axum::http::{Method, StatusCode};
use common::{json, request, setup_test_app, ADMIN, ALICE};
use std::time::Duration;
use tower::ServiceExt;
use wireconnect_server_config::RateLimitConfig;

fn tight_limits(capacity: u64) -> RateLimitConfig {
	RateLimitConfig {
		capacity,
		quantum: capacity,
		fill_interval: Duration::from_secs(60),
		..Default::default()
	}
}

#[tokio::test]
async fn rate_limit_wins_over_bad_credentials() {
	let app = setup_test_app(tight_limits(1)).await;
	let bad = || request(Method::GET, "/interfaces", Some(("alice", "wrong")), None);

	let response = app.router.clone().oneshot(bad()).await.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let response = app.router.clone().oneshot(bad()).await.unwrap();
	assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(json(response).await["message"], "Rate limit has been reached");
}

#[tokio::test]
async fn exhausted_bucket_blocks_valid_credentials_too() {
	let app = setup_test_app(tight_limits(1)).await;
	let bad = request(Method::GET, "/interfaces", Some(("alice", "wrong")), None);
	app.router.clone().oneshot(bad).await.unwrap();

	let response = app
		.router
		.oneshot(request(Method::GET, "/interfaces", Some(ALICE), None))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn successful_login_resets_bucket() {
	let app = setup_test_app(tight_limits(2)).await;
	let bad = || request(Method::GET, "/interfaces", Some(("alice", "wrong")), None);
	let good = || request(Method::GET, "/interfaces", Some(ALICE), None);

	assert_eq!(
		app.router.clone().oneshot(bad()).await.unwrap().status(),
		StatusCode::UNAUTHORIZED
	);
	assert_eq!(
		app.router.clone().oneshot(good()).await.unwrap().status(),
		StatusCode::OK
	);
	// Without the reset this would be the third request in the window.
	assert_eq!(
		app.router.clone().oneshot(bad()).await.unwrap().status(),
		StatusCode::UNAUTHORIZED
	);
	assert_eq!(
		app.router.clone().oneshot(bad()).await.unwrap().status(),
		StatusCode::UNAUTHORIZED
	);
	assert_eq!(
		app.router.oneshot(bad()).await.unwrap().status(),
		StatusCode::TOO_MANY_REQUESTS
	);
}

#[tokio::test]
async fn health_is_not_rate_limited() {
	let app = setup_test_app(tight_limits(1)).await;
	for _ in 0..3 {
		let response = app
			.router
			.clone()
			.oneshot(request(Method::GET, "/health", None, None))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
	}
	assert!(app.state.rate_limiter.list_recent().await.is_empty());
}

#[tokio::test]
async fn admin_gate_runs_after_authentication() {
	let app = setup_test_app(tight_limits(5)).await;

	let response = app
		.router
		.clone()
		.oneshot(request(Method::GET, "/bans", Some(("admin", "wrong")), None))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let response = app
		.router
		.oneshot(request(Method::GET, "/bans", Some(ADMIN), None))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
}
