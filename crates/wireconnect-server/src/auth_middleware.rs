// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request gates, outermost first: rate limit, Basic authentication, and
//! the administrator check on admin-only routes.

use std::net::SocketAddr;

use axum::{
	extract::{ConnectInfo, Request, State},
	http::{header::AUTHORIZATION, HeaderMap},
	middleware::Next,
	response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use wireconnect_common_secret::SecretString;

use crate::api::AppState;
use crate::error::ServerError;

/// Key used for requests that carry no peer address.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// The authenticated caller, inserted by [`auth_layer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
	pub username: String,
}

pub fn source_address(request: &Request) -> String {
	request
		.extensions()
		.get::<ConnectInfo<SocketAddr>>()
		.map(|ConnectInfo(addr)| addr.ip().to_string())
		.unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

/// Decode `Authorization: Basic <base64(user:password)>`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, SecretString)> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let (scheme, encoded) = value.split_once(' ')?;
	if !scheme.eq_ignore_ascii_case("basic") {
		return None;
	}
	let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
	let decoded = String::from_utf8(decoded).ok()?;
	let (username, password) = decoded.split_once(':')?;
	Some((username.to_string(), SecretString::from(password)))
}

pub async fn rate_limit_layer(State(state): State<AppState>, request: Request, next: Next) -> Response {
	let source = source_address(&request);
	if !state.rate_limiter.allow(&source).await {
		tracing::warn!(%source, "rate limit reached");
		return ServerError::RateLimited.into_response();
	}
	next.run(request).await
}

pub async fn auth_layer(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
	let Some((username, password)) = basic_credentials(request.headers()) else {
		return ServerError::AuthRequired.into_response();
	};

	match state.directory.check_credentials(&username, &password).await {
		Ok(true) => {}
		Ok(false) => {
			tracing::info!(%username, "rejected credentials");
			return ServerError::BadCredentials.into_response();
		}
		Err(e) => return ServerError::Database(e).into_response(),
	}

	let source = source_address(&request);
	state.rate_limiter.reset(&source).await;

	request.extensions_mut().insert(CurrentUser { username });
	next.run(request).await
}

pub async fn require_admin_layer(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Response {
	let Some(user) = request.extensions().get::<CurrentUser>().cloned() else {
		return ServerError::AuthRequired.into_response();
	};

	match state.directory.is_admin(&user.username).await {
		Ok(true) => next.run(request).await,
		Ok(false) => {
			tracing::info!(username = %user.username, "non-admin denied");
			ServerError::Forbidden.into_response()
		}
		Err(e) => ServerError::Database(e).into_response(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	fn headers(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
		headers
	}

	#[test]
	fn decodes_basic_credentials() {
		let encoded = BASE64_STANDARD.encode("alice:s3cret:with-colon");
		let (user, password) = basic_credentials(&headers(&format!("Basic {encoded}"))).unwrap();
		assert_eq!(user, "alice");
		assert_eq!(password.expose(), "s3cret:with-colon");
	}

	#[test]
	fn rejects_other_schemes_and_garbage() {
		assert!(basic_credentials(&headers("Bearer abc")).is_none());
		assert!(basic_credentials(&headers("Basic !!!")).is_none());
		let no_colon = BASE64_STANDARD.encode("alice");
		assert!(basic_credentials(&headers(&format!("Basic {no_colon}"))).is_none());
		assert!(basic_credentials(&HeaderMap::new()).is_none());
	}

	#[test]
	fn source_address_strips_port() {
		let mut request = Request::new(axum::body::Body::empty());
		assert_eq!(source_address(&request), UNKNOWN_SOURCE);

		request
			.extensions_mut()
			.insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 7], 54321))));
		assert_eq!(source_address(&request), "192.0.2.7");
	}
}
