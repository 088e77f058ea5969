// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
	body::Body,
	extract::ConnectInfo,
	http::{header, Method, Request, Response},
	Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use http_body_util::BodyExt;
use serde_json::Value;
use wireconnect_common::Address;
use wireconnect_common_secret::SecretString;
use wireconnect_server::{create_app_state, create_router, AppState};
use wireconnect_server_config::RateLimitConfig;
use wireconnect_server_db::testing::create_directory_test_pool;
use wireconnect_server_db::{DirectoryRepository, ServerInterfaceSpec};
use wireconnect_server_wgtunnel::FakeDevices;

pub const ADMIN: (&str, &str) = ("admin", "admin-password");
pub const ALICE: (&str, &str) = ("alice", "alice-password");
pub const CLIENT_IP: [u8; 4] = [192, 0, 2, 10];

pub struct TestApp {
	pub router: Router,
	pub state: AppState,
	pub devices: Arc<FakeDevices>,
}

pub fn generous_limits() -> RateLimitConfig {
	RateLimitConfig {
		capacity: 1000,
		quantum: 1000,
		..Default::default()
	}
}

pub async fn setup_test_app(rate_limit: RateLimitConfig) -> TestApp {
	let repo = DirectoryRepository::new(create_directory_test_pool().await);
	repo.add_user(ADMIN.0, &SecretString::from(ADMIN.1), true)
		.await
		.unwrap();
	repo.add_user(ALICE.0, &SecretString::from(ALICE.1), false)
		.await
		.unwrap();
	repo.add_interface(&ServerInterfaceSpec::new(
		"vpn0",
		vec![Address::parse("10.0.0.1/24").unwrap()],
	))
	.await
	.unwrap();

	let devices = Arc::new(FakeDevices::new());
	let state = create_app_state(Arc::new(repo), devices.clone(), rate_limit);
	TestApp {
		router: create_router(state.clone()),
		state,
		devices,
	}
}

pub fn basic(credentials: (&str, &str)) -> String {
	let encoded = BASE64_STANDARD.encode(format!("{}:{}", credentials.0, credentials.1));
	format!("Basic {encoded}")
}

pub fn request(
	method: Method,
	uri: &str,
	credentials: Option<(&str, &str)>,
	body: Option<Value>,
) -> Request<Body> {
	let mut builder = Request::builder()
		.method(method)
		.uri(uri)
		.extension(ConnectInfo(SocketAddr::from((CLIENT_IP, 40000))));
	if let Some(credentials) = credentials {
		builder = builder.header(header::AUTHORIZATION, basic(credentials));
	}
	match body {
		Some(body) => builder
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	}
}

pub async fn json(response: Response<Body>) -> Value {
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}
