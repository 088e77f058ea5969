// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use axum::{
	middleware::from_fn_with_state,
	routing::{get, post},
	Router,
};
use wireconnect_server_config::RateLimitConfig;
use wireconnect_server_db::DirectoryStore;
use wireconnect_server_wgtunnel::{DeviceControl, WgTunnelServices};

use crate::auth_middleware::{auth_layer, rate_limit_layer, require_admin_layer};
use crate::rate_limit::RateLimiter;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub directory: Arc<dyn DirectoryStore>,
	pub wg: WgTunnelServices,
	pub rate_limiter: Arc<RateLimiter>,
}

pub fn create_app_state(
	directory: Arc<dyn DirectoryStore>,
	devices: Arc<dyn DeviceControl>,
	rate_limit: RateLimitConfig,
) -> AppState {
	AppState {
		wg: WgTunnelServices::new(directory.clone(), devices),
		directory,
		rate_limiter: Arc::new(RateLimiter::new(rate_limit)),
	}
}

pub fn create_router(state: AppState) -> Router {
	let admin = from_fn_with_state(state.clone(), require_admin_layer);

	// Layers added later run first: rate limit, then auth, then the
	// per-route admin gate.
	let api = Router::new()
		.route(
			"/peers",
			post(routes::peers::create_peer)
				.route_layer(admin.clone())
				.get(routes::peers::list_peers),
		)
		.route("/interfaces", get(routes::interfaces::list_interfaces))
		.route("/connect", post(routes::sessions::connect))
		.route("/disconnect", post(routes::sessions::disconnect))
		.route("/bans", get(routes::bans::list_bans).route_layer(admin.clone()))
		.route("/users", post(routes::users::add_user).route_layer(admin))
		.layer(from_fn_with_state(state.clone(), auth_layer))
		.layer(from_fn_with_state(state.clone(), rate_limit_layer));

	Router::new()
		.route("/health", get(routes::health::health_check))
		.merge(api)
		.with_state(state)
}
