// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};
use wireconnect_common::ServerInterface;

use crate::{api::AppState, error::Result};

/// GET /interfaces - every defined server interface, live or not.
pub async fn list_interfaces(State(state): State<AppState>) -> Result<Json<Vec<ServerInterface>>> {
	let specs = state.directory.list_interface_specs().await?;
	Ok(Json(specs.into_iter().map(ServerInterface::from).collect()))
}
