// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};
use wireconnect_common::BanList;

use crate::api::AppState;

/// GET /bans - source addresses the rate limiter is tracking. Admin only.
pub async fn list_bans(State(state): State<AppState>) -> Json<BanList> {
	Json(BanList {
		addresses: state.rate_limiter.list_recent().await,
	})
}
