// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Translation of core errors into HTTP responses.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use thiserror::Error;
use wireconnect_common::{ErrorBody, ValidationError};
use wireconnect_server_db::DbError;
use wireconnect_server_wgtunnel::WgError;

#[derive(Debug, Error)]
pub enum ServerError {
	#[error("request body is not valid JSON")]
	MalformedBody,

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error("rate limit reached")]
	RateLimited,

	#[error("authentication required")]
	AuthRequired,

	#[error("bad username or password")]
	BadCredentials,

	#[error("administrator required")]
	Forbidden,

	#[error(transparent)]
	Wg(#[from] WgError),

	#[error(transparent)]
	Database(#[from] DbError),
}

impl ServerError {
	fn status_and_message(&self) -> (StatusCode, &'static str, &'static str) {
		match self {
			ServerError::MalformedBody => (
				StatusCode::BAD_REQUEST,
				"bad_request",
				"Improperly-formed request body",
			),
			ServerError::Validation(ValidationError::MissingField(_)) => {
				(StatusCode::BAD_REQUEST, "bad_request", "Incomplete request")
			}
			ServerError::Validation(ValidationError::InvalidAddress(_)) => {
				(StatusCode::BAD_REQUEST, "bad_request", "Invalid address")
			}
			ServerError::RateLimited => (
				StatusCode::TOO_MANY_REQUESTS,
				"rate_limited",
				"Rate limit has been reached",
			),
			ServerError::AuthRequired => (
				StatusCode::UNAUTHORIZED,
				"unauthorized",
				"Authentication required",
			),
			ServerError::BadCredentials => (
				StatusCode::UNAUTHORIZED,
				"unauthorized",
				"Bad username or password",
			),
			ServerError::Forbidden => (
				StatusCode::FORBIDDEN,
				"forbidden",
				"Only administrators can access this resource",
			),
			ServerError::Wg(WgError::PeerNotFound) => (
				StatusCode::NOT_FOUND,
				"not_found",
				"No peer with that name exists",
			),
			ServerError::Wg(WgError::InvalidKey) => {
				(StatusCode::BAD_REQUEST, "bad_request", "Invalid public key")
			}
			ServerError::Wg(WgError::NotActive) => {
				(StatusCode::BAD_REQUEST, "bad_request", "Peer is not connected")
			}
			ServerError::Database(DbError::NotFound(_)) => (
				StatusCode::NOT_FOUND,
				"not_found",
				"User or interface does not exist",
			),
			ServerError::Database(DbError::Conflict(_)) => {
				(StatusCode::CONFLICT, "conflict", "User already exists")
			}
			ServerError::Wg(_) | ServerError::Database(_) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"internal_error",
				"Internal server error",
			),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, error, message) = self.status_and_message();
		if status.is_server_error() {
			tracing::error!(error = %self, source = ?std::error::Error::source(&self), "request failed");
		} else {
			tracing::debug!(%status, reason = %self, "request rejected");
		}

		(
			status,
			Json(ErrorBody {
				error: error.to_string(),
				message: message.to_string(),
			}),
		)
			.into_response()
	}
}

pub type Result<T> = std::result::Result<T, ServerError>;
