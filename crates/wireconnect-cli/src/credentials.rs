// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `--user` and `--server` argument handling.

use url::Url;
use wireconnect_common_secret::SecretString;

use crate::error::{CliError, Result};

pub const PASSWORD_ENV: &str = "WIRECONNECT_PASSWORD";

/// Split `user[:password]`. The password may itself contain colons.
pub fn split_user(arg: &str) -> Result<(String, Option<SecretString>)> {
	let (username, password) = match arg.split_once(':') {
		Some((user, password)) => (user, Some(SecretString::from(password))),
		None => (arg, None),
	};
	if username.is_empty() {
		return Err(CliError::Other("username not specified".to_string()));
	}
	Ok((username.to_string(), password))
}

/// Resolve the password from `--user` or, failing that, the environment.
pub fn resolve_password(inline: Option<SecretString>) -> Result<SecretString> {
	if let Some(password) = inline {
		return Ok(password);
	}
	match std::env::var(PASSWORD_ENV) {
		Ok(password) if !password.is_empty() => Ok(SecretString::from(password)),
		_ => Err(CliError::Other(format!(
			"no password given; use --user USER:PASSWORD or set {PASSWORD_ENV}"
		))),
	}
}

/// Accept `host[:port]` as well as a full URL. Bare hosts default to https.
pub fn server_url(arg: &str) -> Result<Url> {
	if arg.is_empty() {
		return Err(CliError::Other("server not specified".to_string()));
	}
	if arg.contains("://") {
		return Ok(Url::parse(arg)?);
	}
	Ok(Url::parse(&format!("https://{arg}"))?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_user_and_password() {
		let (user, password) = split_user("alice:pa:ss").unwrap();
		assert_eq!(user, "alice");
		assert_eq!(password.unwrap().expose(), "pa:ss");

		let (user, password) = split_user("bob").unwrap();
		assert_eq!(user, "bob");
		assert!(password.is_none());

		assert!(split_user(":secret").is_err());
	}

	#[test]
	fn inline_password_wins() {
		let password = resolve_password(Some(SecretString::from("inline"))).unwrap();
		assert_eq!(password.expose(), "inline");
	}

	#[test]
	fn server_defaults_to_https() {
		assert_eq!(
			server_url("vpn.example.com:8443").unwrap().as_str(),
			"https://vpn.example.com:8443/"
		);
		assert_eq!(
			server_url("http://127.0.0.1:8080").unwrap().as_str(),
			"http://127.0.0.1:8080/"
		);
		assert!(server_url("").is_err());
	}
}
