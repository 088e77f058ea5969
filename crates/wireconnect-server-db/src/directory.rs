// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory repository: users, server interfaces and peer configurations.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use wireconnect_common::Address;
use wireconnect_common_secret::SecretString;

use crate::error::DbError;
use crate::password::{dummy_hash, hash_password, verify_password};
use crate::types::{NewPeer, PeerRecord, ServerInterfaceSpec};

type PeerRow = (String, String, String, Option<String>, String);

#[derive(Clone)]
pub struct DirectoryRepository {
	pool: SqlitePool,
}

impl DirectoryRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	async fn interface_addresses(&self, interface_id: i64) -> Result<Vec<Address>, DbError> {
		let rows: Vec<(String,)> = sqlx::query_as(
			"SELECT address FROM server_interface_addresses WHERE interface_id = ? ORDER BY id",
		)
		.bind(interface_id)
		.fetch_all(&self.pool)
		.await?;

		rows
			.into_iter()
			.map(|(address,)| parse_stored_address(&address))
			.collect()
	}

	// =========================================================================
	// Peers
	// =========================================================================

	#[tracing::instrument(skip(self), fields(%username, %peer_name))]
	pub async fn find_peer(
		&self,
		username: &str,
		peer_name: &str,
	) -> Result<Option<PeerRecord>, DbError> {
		let row: Option<PeerRow> = sqlx::query_as(
			"SELECT u.username, p.name, p.address, p.endpoint_address, i.name
			 FROM peers p
			 JOIN users u ON u.id = p.user_id
			 JOIN server_interfaces i ON i.id = p.server_interface_id
			 WHERE u.username = ? AND p.name = ?",
		)
		.bind(username)
		.bind(peer_name)
		.fetch_optional(&self.pool)
		.await?;

		row.map(peer_from_row).transpose()
	}

	#[tracing::instrument(skip(self), fields(%username))]
	pub async fn list_peers(&self, username: &str) -> Result<Vec<PeerRecord>, DbError> {
		let rows: Vec<PeerRow> = sqlx::query_as(
			"SELECT u.username, p.name, p.address, p.endpoint_address, i.name
			 FROM peers p
			 JOIN users u ON u.id = p.user_id
			 JOIN server_interfaces i ON i.id = p.server_interface_id
			 WHERE u.username = ?
			 ORDER BY p.name",
		)
		.bind(username)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(peer_from_row).collect()
	}

	/// Creates a peer; an existing peer with the same (user, name) is replaced.
	#[tracing::instrument(skip(self, peer), fields(username = %peer.username, peer_name = %peer.name, interface = %peer.interface))]
	pub async fn create_peer(&self, peer: &NewPeer) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		let user_id: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
			.bind(&peer.username)
			.fetch_optional(&mut *tx)
			.await?;
		let Some((user_id,)) = user_id else {
			return Err(DbError::NotFound(format!("user '{}'", peer.username)));
		};

		let interface_id: Option<(i64,)> =
			sqlx::query_as("SELECT id FROM server_interfaces WHERE name = ?")
				.bind(&peer.interface)
				.fetch_optional(&mut *tx)
				.await?;
		let Some((interface_id,)) = interface_id else {
			return Err(DbError::NotFound(format!("interface '{}'", peer.interface)));
		};

		sqlx::query(
			"INSERT INTO peers (name, address, endpoint_address, server_interface_id, user_id)
			 VALUES (?, ?, ?, ?, ?)
			 ON CONFLICT(name, user_id) DO UPDATE SET
				address = excluded.address,
				endpoint_address = excluded.endpoint_address,
				server_interface_id = excluded.server_interface_id",
		)
		.bind(&peer.name)
		.bind(peer.address.to_string())
		.bind(&peer.endpoint_address)
		.bind(interface_id)
		.bind(user_id)
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;
		tracing::debug!("peer stored");
		Ok(())
	}

	// =========================================================================
	// Server interfaces
	// =========================================================================

	#[tracing::instrument(skip(self), fields(%name))]
	pub async fn find_interface_spec(
		&self,
		name: &str,
	) -> Result<Option<ServerInterfaceSpec>, DbError> {
		let row: Option<(i64, String, bool)> = sqlx::query_as(
			"SELECT id, name, create_on_startup FROM server_interfaces WHERE name = ?",
		)
		.bind(name)
		.fetch_optional(&self.pool)
		.await?;

		let Some((id, name, create_on_startup)) = row else {
			return Ok(None);
		};

		Ok(Some(ServerInterfaceSpec {
			name,
			addresses: self.interface_addresses(id).await?,
			create_on_startup,
		}))
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_interface_specs(&self) -> Result<Vec<ServerInterfaceSpec>, DbError> {
		let rows: Vec<(i64, String, bool)> = sqlx::query_as(
			"SELECT id, name, create_on_startup FROM server_interfaces ORDER BY name",
		)
		.fetch_all(&self.pool)
		.await?;

		let mut specs = Vec::with_capacity(rows.len());
		for (id, name, create_on_startup) in rows {
			specs.push(ServerInterfaceSpec {
				name,
				addresses: self.interface_addresses(id).await?,
				create_on_startup,
			});
		}
		Ok(specs)
	}

	/// Adds an interface; re-adding a name only adds missing addresses.
	#[tracing::instrument(skip(self, spec), fields(name = %spec.name))]
	pub async fn add_interface(&self, spec: &ServerInterfaceSpec) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("INSERT OR IGNORE INTO server_interfaces (name, create_on_startup) VALUES (?, ?)")
			.bind(&spec.name)
			.bind(spec.create_on_startup)
			.execute(&mut *tx)
			.await?;

		let (interface_id,): (i64,) = sqlx::query_as("SELECT id FROM server_interfaces WHERE name = ?")
			.bind(&spec.name)
			.fetch_one(&mut *tx)
			.await?;

		for address in &spec.addresses {
			sqlx::query(
				"INSERT OR IGNORE INTO server_interface_addresses (interface_id, address) VALUES (?, ?)",
			)
			.bind(interface_id)
			.bind(address.to_string())
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn interface_count(&self) -> Result<u64, DbError> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM server_interfaces")
			.fetch_one(&self.pool)
			.await?;
		Ok(count as u64)
	}

	// =========================================================================
	// Users
	// =========================================================================

	#[tracing::instrument(skip(self, password), fields(%username))]
	pub async fn add_user(
		&self,
		username: &str,
		password: &SecretString,
		is_admin: bool,
	) -> Result<(), DbError> {
		let password = password.clone();
		let hash = tokio::task::spawn_blocking(move || hash_password(password.expose()))
			.await
			.map_err(|e| DbError::Internal(format!("password hashing task failed: {e}")))??;

		let result = sqlx::query("INSERT INTO users (username, password_hash, is_admin) VALUES (?, ?, ?)")
			.bind(username)
			.bind(hash)
			.bind(is_admin)
			.execute(&self.pool)
			.await;

		match result {
			Ok(_) => Ok(()),
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
				Err(DbError::Conflict(format!("user '{username}' already exists")))
			}
			Err(e) => Err(e.into()),
		}
	}

	/// Verifies a password; unknown users are checked against a dummy hash.
	#[tracing::instrument(skip(self, password), fields(%username))]
	pub async fn check_credentials(
		&self,
		username: &str,
		password: &SecretString,
	) -> Result<bool, DbError> {
		let row: Option<(String,)> = sqlx::query_as("SELECT password_hash FROM users WHERE username = ?")
			.bind(username)
			.fetch_optional(&self.pool)
			.await?;

		let known = row.is_some();
		let hash = row
			.map(|(hash,)| hash)
			.unwrap_or_else(|| dummy_hash().to_string());
		let password = password.clone();

		let verified = tokio::task::spawn_blocking(move || verify_password(password.expose(), &hash))
			.await
			.map_err(|e| DbError::Internal(format!("password verification task failed: {e}")))?;

		Ok(known && verified)
	}

	#[tracing::instrument(skip(self), fields(%username))]
	pub async fn is_admin(&self, username: &str) -> Result<bool, DbError> {
		let row: Option<(bool,)> = sqlx::query_as("SELECT is_admin FROM users WHERE username = ?")
			.bind(username)
			.fetch_optional(&self.pool)
			.await?;
		Ok(row.map(|(is_admin,)| is_admin).unwrap_or(false))
	}

	#[tracing::instrument(skip(self))]
	pub async fn user_count(&self) -> Result<u64, DbError> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
			.fetch_one(&self.pool)
			.await?;
		Ok(count as u64)
	}
}

fn parse_stored_address(address: &str) -> Result<Address, DbError> {
	Address::parse(address).map_err(|e| DbError::Internal(format!("corrupt address in directory: {e}")))
}

fn peer_from_row(row: PeerRow) -> Result<PeerRecord, DbError> {
	let (username, name, address, endpoint_address, interface) = row;
	Ok(PeerRecord {
		username,
		name,
		address: parse_stored_address(&address)?,
		endpoint_address,
		interface,
	})
}

/// The persistence operations the rest of the server depends on.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
	async fn find_peer(&self, username: &str, peer_name: &str) -> Result<Option<PeerRecord>, DbError>;
	async fn list_peers(&self, username: &str) -> Result<Vec<PeerRecord>, DbError>;
	async fn create_peer(&self, peer: &NewPeer) -> Result<(), DbError>;
	async fn find_interface_spec(&self, name: &str) -> Result<Option<ServerInterfaceSpec>, DbError>;
	async fn list_interface_specs(&self) -> Result<Vec<ServerInterfaceSpec>, DbError>;
	async fn add_interface(&self, spec: &ServerInterfaceSpec) -> Result<(), DbError>;
	async fn interface_count(&self) -> Result<u64, DbError>;
	async fn add_user(&self, username: &str, password: &SecretString, is_admin: bool) -> Result<(), DbError>;
	async fn check_credentials(&self, username: &str, password: &SecretString) -> Result<bool, DbError>;
	async fn is_admin(&self, username: &str) -> Result<bool, DbError>;
	async fn user_count(&self) -> Result<u64, DbError>;
}

#[async_trait]
impl DirectoryStore for DirectoryRepository {
	async fn find_peer(&self, username: &str, peer_name: &str) -> Result<Option<PeerRecord>, DbError> {
		self.find_peer(username, peer_name).await
	}

	async fn list_peers(&self, username: &str) -> Result<Vec<PeerRecord>, DbError> {
		self.list_peers(username).await
	}

	async fn create_peer(&self, peer: &NewPeer) -> Result<(), DbError> {
		self.create_peer(peer).await
	}

	async fn find_interface_spec(&self, name: &str) -> Result<Option<ServerInterfaceSpec>, DbError> {
		self.find_interface_spec(name).await
	}

	async fn list_interface_specs(&self) -> Result<Vec<ServerInterfaceSpec>, DbError> {
		self.list_interface_specs().await
	}

	async fn add_interface(&self, spec: &ServerInterfaceSpec) -> Result<(), DbError> {
		self.add_interface(spec).await
	}

	async fn interface_count(&self) -> Result<u64, DbError> {
		self.interface_count().await
	}

	async fn add_user(&self, username: &str, password: &SecretString, is_admin: bool) -> Result<(), DbError> {
		self.add_user(username, password, is_admin).await
	}

	async fn check_credentials(&self, username: &str, password: &SecretString) -> Result<bool, DbError> {
		self.check_credentials(username, password).await
	}

	async fn is_admin(&self, username: &str) -> Result<bool, DbError> {
		self.is_admin(username).await
	}

	async fn user_count(&self) -> Result<u64, DbError> {
		self.user_count().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_directory_test_pool;

	fn addr(s: &str) -> Address {
		Address::parse(s).unwrap()
	}

	async fn seeded_repo() -> DirectoryRepository {
		let repo = DirectoryRepository::new(create_directory_test_pool().await);
		repo.add_user("alice", &SecretString::from("wonderland"), false)
			.await
			.unwrap();
		repo.add_interface(&ServerInterfaceSpec::new("vpn0", vec![addr("10.0.0.1/24")]))
			.await
			.unwrap();
		repo
	}

	fn laptop() -> NewPeer {
		NewPeer {
			username: "alice".to_string(),
			name: "laptop".to_string(),
			address: addr("10.0.0.5/32"),
			endpoint_address: Some("203.0.113.7".to_string()),
			interface: "vpn0".to_string(),
		}
	}

	#[tokio::test]
	async fn create_and_find_peer() {
		let repo = seeded_repo().await;
		repo.create_peer(&laptop()).await.unwrap();

		let peer = repo.find_peer("alice", "laptop").await.unwrap().unwrap();
		assert_eq!(peer.address.to_string(), "10.0.0.5/32");
		assert_eq!(peer.interface, "vpn0");
		assert_eq!(peer.endpoint_address.as_deref(), Some("203.0.113.7"));

		assert!(repo.find_peer("alice", "phone").await.unwrap().is_none());
		assert!(repo.find_peer("bob", "laptop").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn second_create_replaces_peer() {
		let repo = seeded_repo().await;
		repo.create_peer(&laptop()).await.unwrap();
		repo.create_peer(&NewPeer {
			address: addr("10.0.0.9/32"),
			endpoint_address: None,
			..laptop()
		})
		.await
		.unwrap();

		let peers = repo.list_peers("alice").await.unwrap();
		assert_eq!(peers.len(), 1);
		assert_eq!(peers[0].address.to_string(), "10.0.0.9/32");
		assert!(peers[0].endpoint_address.is_none());
	}

	#[tokio::test]
	async fn create_peer_for_unknown_user_or_interface() {
		let repo = seeded_repo().await;

		let err = repo
			.create_peer(&NewPeer {
				username: "mallory".to_string(),
				..laptop()
			})
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));

		let err = repo
			.create_peer(&NewPeer {
				interface: "vpn9".to_string(),
				..laptop()
			})
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));
	}

	#[tokio::test]
	async fn interface_specs_carry_addresses() {
		let repo = seeded_repo().await;
		repo.add_interface(&ServerInterfaceSpec {
			name: "vpn1".to_string(),
			addresses: vec![addr("10.1.0.1/24"), addr("fd00:1::1/64")],
			create_on_startup: false,
		})
		.await
		.unwrap();
		// re-adding is harmless
		repo.add_interface(&ServerInterfaceSpec::new("vpn0", vec![addr("10.0.0.1/24")]))
			.await
			.unwrap();

		assert_eq!(repo.interface_count().await.unwrap(), 2);
		let specs = repo.list_interface_specs().await.unwrap();
		assert_eq!(specs.len(), 2);
		assert_eq!(specs[0].addresses.len(), 1);
		assert_eq!(specs[1].name, "vpn1");
		assert!(!specs[1].create_on_startup);
		assert_eq!(specs[1].addresses[1].to_string(), "fd00:1::1/64");

		let vpn0 = repo.find_interface_spec("vpn0").await.unwrap().unwrap();
		assert!(vpn0.create_on_startup);
		assert!(repo.find_interface_spec("nope").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn credentials_and_admin_flag() {
		let repo = seeded_repo().await;
		repo.add_user("root", &SecretString::from("toor"), true)
			.await
			.unwrap();

		assert!(repo
			.check_credentials("alice", &SecretString::from("wonderland"))
			.await
			.unwrap());
		assert!(!repo
			.check_credentials("alice", &SecretString::from("nope"))
			.await
			.unwrap());
		assert!(!repo
			.check_credentials("ghost", &SecretString::from("wonderland"))
			.await
			.unwrap());

		assert!(repo.is_admin("root").await.unwrap());
		assert!(!repo.is_admin("alice").await.unwrap());
		assert!(!repo.is_admin("ghost").await.unwrap());
		assert_eq!(repo.user_count().await.unwrap(), 2);
	}

	#[tokio::test]
	async fn duplicate_user_is_conflict() {
		let repo = seeded_repo().await;
		let err = repo
			.add_user("alice", &SecretString::from("again"), false)
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}

	#[tokio::test]
	async fn store_trait_delegates() {
		let store: Box<dyn DirectoryStore> = Box::new(seeded_repo().await);
		store.create_peer(&laptop()).await.unwrap();
		assert!(store.find_peer("alice", "laptop").await.unwrap().is_some());
		assert_eq!(store.list_peers("alice").await.unwrap().len(), 1);
	}
}
