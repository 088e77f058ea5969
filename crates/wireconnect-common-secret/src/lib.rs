// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A wrapper for sensitive values.
//!
//! [`Secret`] zeroizes its contents on drop and never prints them: both
//! `Debug` and `Display` render `[REDACTED]`. Callers read the value through
//! [`Secret::expose`], which keeps every access greppable.

use std::fmt;

use zeroize::Zeroize;

pub const REDACTED: &str = "[REDACTED]";

/// A value that must not end up in logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T: Zeroize> {
	inner: T,
}

/// The common case: a secret string such as a password.
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl SecretString {
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.inner.zeroize();
	}
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Secret<T>
where
	T: Zeroize + serde::Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret::new)
	}
}

/// Secrets serialize as the redaction marker, never as their value.
#[cfg(feature = "serde")]
impl<T: Zeroize> serde::Serialize for Secret<T> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(format!("{secret:?}"), REDACTED);
		assert_eq!(format!("{secret}"), REDACTED);
		assert_eq!(secret.expose(), "hunter2");
	}

	#[test]
	fn deserializes_plain_value() {
		let secret: SecretString = serde_json::from_str("\"s3cret\"").unwrap();
		assert_eq!(secret.expose(), "s3cret");
	}

	#[test]
	fn serializes_as_redacted() {
		let secret = SecretString::from("s3cret");
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));
	}

	proptest! {
		#[test]
		fn never_leaks_through_formatting(value in "[a-zA-Z0-9]{1,64}") {
			let secret = SecretString::new(value.clone());
			let rendered = format!("{secret:?} {secret}");
			prop_assert!(!rendered.contains(&value) || REDACTED.contains(&value));
		}
	}
}
