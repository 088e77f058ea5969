// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WireGuard (Curve25519) key material.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use wireconnect_common_secret::SecretString;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

pub const KEY_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
	#[error("key is not valid base64")]
	InvalidBase64,

	#[error("key must be {KEY_LEN} bytes, got {0}")]
	InvalidLength(usize),
}

fn decode_key(s: &str) -> Result<[u8; KEY_LEN], KeyError> {
	let mut bytes = STANDARD
		.decode(s.trim())
		.map_err(|_| KeyError::InvalidBase64)?;
	let len = bytes.len();
	let result = <[u8; KEY_LEN]>::try_from(bytes.as_slice()).map_err(|_| KeyError::InvalidLength(len));
	bytes.zeroize();
	result
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WgPublicKey([u8; KEY_LEN]);

impl WgPublicKey {
	pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
		Self(bytes)
	}

	pub fn from_base64(s: &str) -> Result<Self, KeyError> {
		decode_key(s).map(Self)
	}

	pub fn to_base64(&self) -> String {
		STANDARD.encode(self.0)
	}

	pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
		&self.0
	}
}

impl fmt::Debug for WgPublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "WgPublicKey({})", self.to_base64())
	}
}

impl fmt::Display for WgPublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_base64())
	}
}

impl Serialize for WgPublicKey {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_base64())
	}
}

impl<'de> Deserialize<'de> for WgPublicKey {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Self::from_base64(&s).map_err(serde::de::Error::custom)
	}
}

/// A device or client private key. Zeroized on drop, never printed.
#[derive(Clone)]
pub struct WgPrivateKey(StaticSecret);

impl WgPrivateKey {
	pub fn generate() -> Self {
		Self(StaticSecret::random_from_rng(rand::rngs::OsRng))
	}

	pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
		Self(StaticSecret::from(bytes))
	}

	pub fn from_base64(s: &str) -> Result<Self, KeyError> {
		let mut bytes = decode_key(s)?;
		let key = Self::from_bytes(bytes);
		bytes.zeroize();
		Ok(key)
	}

	pub fn to_base64(&self) -> SecretString {
		SecretString::new(STANDARD.encode(self.0.to_bytes()))
	}

	pub fn to_bytes(&self) -> [u8; KEY_LEN] {
		self.0.to_bytes()
	}

	pub fn public_key(&self) -> WgPublicKey {
		WgPublicKey(PublicKey::from(&self.0).to_bytes())
	}
}

impl fmt::Debug for WgPrivateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("WgPrivateKey([REDACTED])")
	}
}

#[derive(Clone, Debug)]
pub struct WgKeyPair {
	private: WgPrivateKey,
	public: WgPublicKey,
}

impl WgKeyPair {
	pub fn generate() -> Self {
		Self::from_private_key(WgPrivateKey::generate())
	}

	pub fn from_private_key(private: WgPrivateKey) -> Self {
		let public = private.public_key();
		Self { private, public }
	}

	pub fn private_key(&self) -> &WgPrivateKey {
		&self.private
	}

	pub fn public_key(&self) -> &WgPublicKey {
		&self.public
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn public_key_base64_round_trip() {
		let pair = WgKeyPair::generate();
		let encoded = pair.public_key().to_base64();
		assert_eq!(encoded.len(), 44);
		assert_eq!(WgPublicKey::from_base64(&encoded).unwrap(), *pair.public_key());
	}

	#[test]
	fn private_key_derives_same_public_key() {
		let pair = WgKeyPair::generate();
		let restored = WgPrivateKey::from_base64(pair.private_key().to_base64().expose()).unwrap();
		assert_eq!(restored.public_key(), *pair.public_key());
	}

	#[test]
	fn rejects_bad_input() {
		assert_eq!(
			WgPublicKey::from_base64("not base64!!"),
			Err(KeyError::InvalidBase64)
		);
		assert_eq!(
			WgPublicKey::from_base64("AAAA"),
			Err(KeyError::InvalidLength(3))
		);
	}

	#[test]
	fn private_key_debug_is_redacted() {
		let key = WgPrivateKey::generate();
		let rendered = format!("{key:?}");
		assert!(rendered.contains("REDACTED"));
		assert!(!rendered.contains(key.to_base64().expose().as_str()));
	}
}
