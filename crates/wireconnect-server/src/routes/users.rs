// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{rejection::JsonRejection, State},
	http::StatusCode,
	Json,
};
use wireconnect_common::{CreateUserRequest, MessageBody};
use wireconnect_common_secret::SecretString;

use crate::{api::AppState, error::Result, routes::json_body};

/// POST /users - create a user. Admin only.
#[tracing::instrument(skip(state, payload))]
pub async fn add_user(
	State(state): State<AppState>,
	payload: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>)> {
	let request = json_body(payload)?;
	request.validate()?;

	let password = SecretString::from(request.password.clone());
	state
		.directory
		.add_user(&request.user_name, &password, request.is_admin)
		.await?;

	tracing::info!(user = %request.user_name, is_admin = request.is_admin, "user created");
	Ok((StatusCode::CREATED, Json(MessageBody::new("User created"))))
}
