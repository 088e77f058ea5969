// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{response::IntoResponse, Json};
use serde_json::json;

/// GET /health - liveness probe, no authentication.
pub async fn health_check() -> impl IntoResponse {
	Json(json!({ "status": "ok" }))
}
