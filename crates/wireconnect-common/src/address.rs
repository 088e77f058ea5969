// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! IP addresses with a prefix length.
//!
//! Unlike a plain network, an [`Address`] keeps its host bits: `10.0.0.1/24`
//! is the gateway address `10.0.0.1` on the `10.0.0.0/24` subnet, which is
//! exactly what gets assigned to a tunnel device.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
	#[error("invalid CIDR address '{0}'")]
	Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(IpNet);

impl Address {
	pub fn new(ip: IpAddr, prefix_len: u8) -> Result<Self, AddressError> {
		IpNet::new(ip, prefix_len)
			.map(Self)
			.map_err(|_| AddressError::Invalid(format!("{ip}/{prefix_len}")))
	}

	pub fn parse(s: &str) -> Result<Self, AddressError> {
		s.trim()
			.parse::<IpNet>()
			.map(Self)
			.map_err(|_| AddressError::Invalid(s.to_string()))
	}

	pub fn ip(&self) -> IpAddr {
		self.0.addr()
	}

	pub fn prefix_len(&self) -> u8 {
		self.0.prefix_len()
	}

	/// The same address as a single-host route (/32 or /128).
	pub fn host_route(&self) -> Address {
		let ip = self.ip();
		let max = match ip {
			IpAddr::V4(_) => 32,
			IpAddr::V6(_) => 128,
		};
		Self(IpNet::new(ip, max).unwrap_or(self.0))
	}

	/// The enclosing subnet with host bits cleared.
	pub fn network(&self) -> Address {
		Self(self.0.trunc())
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.0.addr(), self.0.prefix_len())
	}
}

impl FromStr for Address {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl From<IpNet> for Address {
	fn from(net: IpNet) -> Self {
		Self(net)
	}
}

impl From<Address> for IpNet {
	fn from(address: Address) -> Self {
		address.0
	}
}

impl Serialize for Address {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Address {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Address::parse(&s).map_err(serde::de::Error::custom)
	}
}

/// Parses a comma-separated list such as `"10.0.0.1/24, fd00::1/64"`.
///
/// Blank items are skipped; any malformed item fails the whole list.
pub fn parse_address_list(s: &str) -> Result<Vec<Address>, AddressError> {
	s.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(Address::parse)
		.collect()
}
