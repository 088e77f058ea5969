// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The HTTP client against a live server bound to a loopback port.

use std::net::SocketAddr;
use std::sync::Arc;

use url::Url;
use wireconnect_cli::{CliError, WireconnectClient};
use wireconnect_common::{Address, CreatePeerRequest, CreateUserRequest, WgKeyPair};
use wireconnect_common_secret::SecretString;
use wireconnect_server::{create_app_state, create_router};
use wireconnect_server_config::RateLimitConfig;
use wireconnect_server_db::testing::create_directory_test_pool;
use wireconnect_server_db::{DirectoryRepository, ServerInterfaceSpec};
use wireconnect_server_wgtunnel::FakeDevices;

async fn spawn_server() -> Url {
	let repo = DirectoryRepository::new(create_directory_test_pool().await);
	repo.add_user("admin", &SecretString::from("admin-pw"), true)
		.await
		.unwrap();
	repo.add_interface(&ServerInterfaceSpec::new(
		"vpn0",
		vec![Address::parse("10.0.0.1/24").unwrap()],
	))
	.await
	.unwrap();

	let state = create_app_state(
		Arc::new(repo),
		Arc::new(FakeDevices::new()),
		RateLimitConfig::default(),
	);
	let app = create_router(state);

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
			.await
			.unwrap();
	});
	Url::parse(&format!("http://{addr}")).unwrap()
}

fn client(url: &Url, user: &str, password: &str) -> WireconnectClient {
	WireconnectClient::new(url.clone(), user.to_string(), SecretString::from(password), false).unwrap()
}

#[tokio::test]
async fn admin_provisions_and_user_connects() {
	let url = spawn_server().await;
	let admin = client(&url, "admin", "admin-pw");

	let reply = admin
		.add_user(&CreateUserRequest {
			user_name: "alice".into(),
			password: "alice-pw".into(),
			is_admin: false,
		})
		.await
		.unwrap();
	assert_eq!(reply.message, "User created");

	admin
		.create_peer(&CreatePeerRequest {
			user_name: "alice".into(),
			peer_name: "laptop".into(),
			address: "10.0.0.5/24".into(),
			endpoint_address: None,
			server_interface: "vpn0".into(),
		})
		.await
		.unwrap();

	let alice = client(&url, "alice", "alice-pw");
	let peers = alice.list_peers().await.unwrap();
	assert_eq!(peers.len(), 1);

	let keypair = WgKeyPair::generate();
	let reply = alice.connect("laptop", keypair.public_key()).await.unwrap();
	assert_eq!(reply.client_address, Address::parse("10.0.0.5/24").unwrap());
	assert_eq!(reply.endpoint_port, Some(51820));

	let reply = alice.disconnect("laptop").await.unwrap();
	assert_eq!(reply.message, "Disconnected peer: laptop");

	match alice.disconnect("laptop").await {
		Err(CliError::Api { status, message }) => {
			assert_eq!(status, 400);
			assert_eq!(message, "Peer is not connected");
		}
		other => panic!("unexpected result {other:?}"),
	}
}

#[tokio::test]
async fn api_errors_carry_server_message() {
	let url = spawn_server().await;
	let intruder = client(&url, "admin", "nope");

	match intruder.list_interfaces().await {
		Err(CliError::Api { status, message }) => {
			assert_eq!(status, 401);
			assert_eq!(message, "Bad username or password");
		}
		other => panic!("unexpected result {other:?}"),
	}

	let admin = client(&url, "admin", "admin-pw");
	let interfaces = admin.list_interfaces().await.unwrap();
	assert_eq!(interfaces[0].name, "vpn0");
	assert!(admin.list_bans().await.unwrap().addresses.is_empty());
}
