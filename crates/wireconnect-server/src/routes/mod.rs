// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP handlers. Each one validates its request, calls into the directory
//! or the session manager and maps the outcome to a response.

pub mod bans;
pub mod health;
pub mod interfaces;
pub mod peers;
pub mod sessions;
pub mod users;

use axum::{extract::rejection::JsonRejection, Json};

use crate::error::ServerError;

/// Unwrap a JSON body, reporting any decode failure as a malformed request.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
	match payload {
		Ok(Json(body)) => Ok(body),
		Err(rejection) => {
			tracing::debug!(error = %rejection, "rejected request body");
			Err(ServerError::MalformedBody)
		}
	}
}
