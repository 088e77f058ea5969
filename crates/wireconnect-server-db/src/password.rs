// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Argon2id password hashing.
//!
//! Production builds use `Argon2::default()` (19 MiB, 2 iterations). Tests use
//! minimal parameters; verification always follows the parameters encoded in
//! the stored hash, so either kind of hash verifies in either build.

use std::sync::OnceLock;

use argon2::password_hash::{
	rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
#[cfg(test)]
use argon2::{Algorithm, Params, Version};

use crate::error::DbError;

#[inline]
fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		let params = Params::new(1024, 1, 1, None).expect("valid Argon2 params for tests");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		Argon2::default()
	}
}

pub fn hash_password(password: &str) -> Result<String, DbError> {
	let salt = SaltString::generate(&mut OsRng);
	argon2_instance()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| DbError::Internal(format!("failed to hash password: {e}")))
}

/// Returns `false` for a wrong password or an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
	match PasswordHash::new(hash) {
		Ok(parsed) => argon2_instance()
			.verify_password(password.as_bytes(), &parsed)
			.is_ok(),
		Err(_) => false,
	}
}

/// A hash to verify against when the user does not exist, so a missing user
/// costs as much as a wrong password.
pub fn dummy_hash() -> &'static str {
	static DUMMY: OnceLock<String> = OnceLock::new();
	DUMMY.get_or_init(|| {
		hash_password("wireconnect-dummy-password").unwrap_or_default()
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hash_and_verify() {
		let hash = hash_password("correct horse").unwrap();
		assert!(hash.starts_with("$argon2id$"));
		assert!(verify_password("correct horse", &hash));
		assert!(!verify_password("wrong horse", &hash));
	}

	#[test]
	fn same_password_gets_distinct_salts() {
		assert_ne!(hash_password("pw").unwrap(), hash_password("pw").unwrap());
	}

	#[test]
	fn garbage_hash_never_verifies() {
		assert!(!verify_password("pw", "not-a-hash"));
		assert!(!verify_password("pw", ""));
	}

	#[test]
	fn dummy_hash_is_stable_and_valid() {
		assert_eq!(dummy_hash(), dummy_hash());
		assert!(PasswordHash::new(dummy_hash()).is_ok());
	}
}
