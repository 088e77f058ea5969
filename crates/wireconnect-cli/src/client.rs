// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use wireconnect_common::{
	BanList, ConnectionReply, ConnectionRequest, CreatePeerRequest, CreateUserRequest,
	DisconnectionRequest, ErrorBody, MessageBody, PeerSummary, ServerInterface, WgPublicKey,
};
use wireconnect_common_secret::SecretString;
use wireconnect_common_version::BuildInfo;

use crate::error::{CliError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WireconnectClient {
	http: Client,
	base_url: Url,
	username: String,
	password: SecretString,
}

fn user_agent() -> String {
	let info = BuildInfo::current();
	format!("wireconnect/{}/{}", info.platform, info.git_sha)
}

impl WireconnectClient {
	/// `insecure` disables TLS certificate verification.
	pub fn new(base_url: Url, username: String, password: SecretString, insecure: bool) -> Result<Self> {
		let http = Client::builder()
			.user_agent(user_agent())
			.timeout(REQUEST_TIMEOUT)
			.danger_accept_invalid_certs(insecure)
			.build()?;
		Ok(Self {
			http,
			base_url,
			username,
			password,
		})
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn api_url(&self, path: &str) -> Result<Url> {
		Ok(self.base_url.join(path)?)
	}

	fn authed(&self, request: RequestBuilder) -> RequestBuilder {
		request.basic_auth(&self.username, Some(self.password.expose()))
	}

	async fn check(response: Response) -> Result<Response> {
		if response.status().is_success() {
			return Ok(response);
		}
		let status = response.status().as_u16();
		let text = response.text().await.unwrap_or_default();
		let message = serde_json::from_str::<ErrorBody>(&text)
			.map(|body| body.message)
			.unwrap_or(text);
		Err(CliError::Api { status, message })
	}

	async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
		let response = self.authed(self.http.get(self.api_url(path)?)).send().await?;
		Ok(Self::check(response).await?.json().await?)
	}

	async fn post<B: serde::Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
		let response = self
			.authed(self.http.post(self.api_url(path)?))
			.json(body)
			.send()
			.await?;
		Ok(Self::check(response).await?.json().await?)
	}

	#[instrument(skip(self, request), fields(peer = %request.peer_name, user = %request.user_name))]
	pub async fn create_peer(&self, request: &CreatePeerRequest) -> Result<MessageBody> {
		self.post("/peers", request).await
	}

	#[instrument(skip(self, request), fields(user = %request.user_name))]
	pub async fn add_user(&self, request: &CreateUserRequest) -> Result<MessageBody> {
		self.post("/users", request).await
	}

	#[instrument(skip(self, public_key), fields(%public_key))]
	pub async fn connect(&self, peer_name: &str, public_key: &WgPublicKey) -> Result<ConnectionReply> {
		let request = ConnectionRequest {
			peer_name: peer_name.to_string(),
			public_key: public_key.to_base64(),
		};
		self.post("/connect", &request).await
	}

	#[instrument(skip(self))]
	pub async fn disconnect(&self, peer_name: &str) -> Result<MessageBody> {
		let request = DisconnectionRequest {
			peer_name: peer_name.to_string(),
		};
		self.post("/disconnect", &request).await
	}

	pub async fn list_interfaces(&self) -> Result<Vec<ServerInterface>> {
		self.get("/interfaces").await
	}

	pub async fn list_peers(&self) -> Result<Vec<PeerSummary>> {
		self.get("/peers").await
	}

	pub async fn list_bans(&self) -> Result<BanList> {
		self.get("/bans").await
	}
}
