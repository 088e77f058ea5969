// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{rejection::JsonRejection, State},
	Extension, Json,
};
use wireconnect_common::{ConnectionReply, ConnectionRequest, DisconnectionRequest, MessageBody};

use crate::{api::AppState, auth_middleware::CurrentUser, error::Result, routes::json_body};

/// POST /connect - install the caller's public key for one of their peers.
pub async fn connect(
	State(state): State<AppState>,
	Extension(user): Extension<CurrentUser>,
	payload: std::result::Result<Json<ConnectionRequest>, JsonRejection>,
) -> Result<Json<ConnectionReply>> {
	let request = json_body(payload)?;
	request.validate()?;

	let outcome = state
		.wg
		.sessions
		.connect(&user.username, &request.peer_name, &request.public_key)
		.await?;

	Ok(Json(ConnectionReply {
		public_key: outcome.server_public_key,
		client_address: outcome.client_address,
		endpoint_address: outcome.endpoint_address,
		endpoint_port: outcome.endpoint_port,
	}))
}

/// POST /disconnect - remove the caller's active session for a peer.
pub async fn disconnect(
	State(state): State<AppState>,
	Extension(user): Extension<CurrentUser>,
	payload: std::result::Result<Json<DisconnectionRequest>, JsonRejection>,
) -> Result<Json<MessageBody>> {
	let request = json_body(payload)?;
	request.validate()?;

	state
		.wg
		.sessions
		.disconnect(&user.username, &request.peer_name)
		.await?;

	Ok(Json(MessageBody::new(format!(
		"Disconnected peer: {}",
		request.peer_name
	))))
}
