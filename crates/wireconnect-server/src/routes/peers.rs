// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{rejection::JsonRejection, State},
	http::StatusCode,
	Extension, Json,
};
use wireconnect_common::{CreatePeerRequest, MessageBody, PeerSummary};
use wireconnect_server_db::NewPeer;

use crate::{api::AppState, auth_middleware::CurrentUser, error::Result, routes::json_body};

/// POST /peers - define (or redefine) a peer for any user. Admin only.
#[tracing::instrument(skip(state, payload))]
pub async fn create_peer(
	State(state): State<AppState>,
	payload: std::result::Result<Json<CreatePeerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>)> {
	let request = json_body(payload)?;
	let address = request.validate()?;

	state
		.directory
		.create_peer(&NewPeer {
			username: request.user_name.clone(),
			name: request.peer_name.clone(),
			address,
			endpoint_address: request.endpoint_address.filter(|e| !e.trim().is_empty()),
			interface: request.server_interface.clone(),
		})
		.await?;

	tracing::info!(
		user = %request.user_name,
		peer = %request.peer_name,
		interface = %request.server_interface,
		"peer defined"
	);
	Ok((
		StatusCode::CREATED,
		Json(MessageBody::new(format!("Created peer: {}", request.peer_name))),
	))
}

/// GET /peers - the caller's own peers.
pub async fn list_peers(
	State(state): State<AppState>,
	Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<PeerSummary>>> {
	let peers = state.directory.list_peers(&user.username).await?;
	Ok(Json(peers.into_iter().map(PeerSummary::from).collect()))
}
