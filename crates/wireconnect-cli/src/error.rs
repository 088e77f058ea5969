// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use wireconnect_server_wgtunnel::DeviceError;

#[derive(Error, Debug)]
pub enum CliError {
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("server replied {status}: {message}")]
	Api { status: u16, message: String },

	#[error("local device error: {0}")]
	Device(#[from] DeviceError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("URL parse error: {0}")]
	UrlParse(#[from] url::ParseError),

	#[error("{0}")]
	Other(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
