// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! First-run seeding of the directory and startup creation of interfaces.

use thiserror::Error;
use wireconnect_server_config::BootstrapConfig;
use wireconnect_server_db::{DbError, DirectoryStore, ServerInterfaceSpec};
use wireconnect_server_wgtunnel::{InterfaceManager, WgError};

#[derive(Debug, Error)]
pub enum BootstrapError {
	#[error("directory bootstrap failed: {0}")]
	Database(#[from] DbError),

	#[error("failed to bring up interfaces: {0}")]
	Interface(#[from] WgError),
}

/// Seed an empty directory with the configured administrator and interface.
pub async fn seed_directory(
	directory: &dyn DirectoryStore,
	config: &BootstrapConfig,
) -> Result<(), BootstrapError> {
	if directory.user_count().await? == 0 {
		match config.admin_credentials() {
			Some((username, password)) => {
				directory.add_user(username, password, true).await?;
				tracing::info!(%username, "created bootstrap administrator");
			}
			None => tracing::warn!(
				"no users exist and no bootstrap administrator is configured; \
				 set WIRECONNECT_SERVER_BOOTSTRAP_ADMIN_USERNAME and _PASSWORD"
			),
		}
	}

	if directory.interface_count().await? == 0 && !config.interface_addresses.is_empty() {
		let spec = ServerInterfaceSpec::new(
			config.interface_name.clone(),
			config.interface_addresses.clone(),
		);
		directory.add_interface(&spec).await?;
		tracing::info!(interface = %spec.name, "created bootstrap interface");
	}

	Ok(())
}

/// Create every interface flagged for startup. On failure, devices created
/// so far are removed before the error is returned.
pub async fn start_interfaces(
	directory: &dyn DirectoryStore,
	interfaces: &InterfaceManager,
) -> Result<(), BootstrapError> {
	let specs = directory.list_interface_specs().await?;
	if let Err(e) = interfaces.start_configured(&specs).await {
		interfaces.shutdown().await;
		return Err(e.into());
	}
	tracing::info!(count = specs.iter().filter(|s| s.create_on_startup).count(), "interfaces started");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use wireconnect_common::Address;
	use wireconnect_common_secret::SecretString;
	use wireconnect_server_db::testing::create_directory_test_pool;
	use wireconnect_server_db::DirectoryRepository;
	use wireconnect_server_wgtunnel::{FakeDevices, FakeOp};

	fn bootstrap_config() -> BootstrapConfig {
		BootstrapConfig {
			admin_username: Some("root".into()),
			admin_password: Some(SecretString::from("hunter2")),
			interface_addresses: vec![Address::parse("10.9.0.1/24").unwrap()],
			..Default::default()
		}
	}

	async fn directory() -> DirectoryRepository {
		DirectoryRepository::new(create_directory_test_pool().await)
	}

	#[tokio::test]
	async fn seeds_admin_and_interface_once() {
		let repo = directory().await;
		let config = bootstrap_config();

		seed_directory(&repo, &config).await.unwrap();
		seed_directory(&repo, &config).await.unwrap();

		assert_eq!(repo.user_count().await.unwrap(), 1);
		assert!(repo.is_admin("root").await.unwrap());
		assert!(repo
			.check_credentials("root", &SecretString::from("hunter2"))
			.await
			.unwrap());

		let specs = repo.list_interface_specs().await.unwrap();
		assert_eq!(specs.len(), 1);
		assert_eq!(specs[0].name, "wireconnect0");
	}

	#[tokio::test]
	async fn unconfigured_bootstrap_leaves_directory_empty() {
		let repo = directory().await;
		seed_directory(&repo, &BootstrapConfig::default()).await.unwrap();
		assert_eq!(repo.user_count().await.unwrap(), 0);
		assert_eq!(repo.interface_count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn failed_startup_cleans_up() {
		let repo = directory().await;
		for name in ["vpn0", "vpn1"] {
			repo.add_interface(&ServerInterfaceSpec::new(
				name,
				vec![Address::parse("10.0.0.1/24").unwrap()],
			))
			.await
			.unwrap();
		}

		let fake = Arc::new(FakeDevices::new());
		let interfaces = InterfaceManager::new(fake.clone());
		fake.plant_device("vpn1", wireconnect_server_wgtunnel::DeviceKind::Other("bridge".into()));
		fake.fail_next(FakeOp::Delete);

		let err = start_interfaces(&repo, &interfaces).await.unwrap_err();
		assert!(matches!(
			err,
			BootstrapError::Interface(WgError::AlreadyExistsWrongType { .. })
		));
		assert!(interfaces.list().await.is_empty());
		assert_eq!(fake.delete_calls(), 1);
		assert!(fake.device("vpn1").is_some());
	}
}
