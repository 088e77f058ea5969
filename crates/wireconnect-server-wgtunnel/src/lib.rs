// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WireGuard interface and peer-session management for wireconnect-server.

pub mod device;
pub mod error;
pub mod fake;
pub mod interfaces;
mod locks;
#[cfg(target_os = "linux")]
pub mod kernel;
pub mod sessions;

use std::sync::Arc;

use wireconnect_server_db::DirectoryStore;

pub use device::{
	DeviceConfig, DeviceControl, DeviceError, DeviceKind, DeviceUpdate, LinkInfo, PeerState,
	PeerUpdate,
};
pub use error::{Result, WgError};
pub use fake::{FakeDevices, FakeOp};
pub use interfaces::{InterfaceManager, LiveInterface};
#[cfg(target_os = "linux")]
pub use kernel::KernelDevices;
pub use locks::KeyedGuard;
pub use sessions::{ActiveSession, ConnectOutcome, SessionKey, SessionManager};

/// The interface registry and session map, sharing one device backend.
#[derive(Clone)]
pub struct WgTunnelServices {
	pub interfaces: Arc<InterfaceManager>,
	pub sessions: SessionManager,
}

impl WgTunnelServices {
	pub fn new(directory: Arc<dyn DirectoryStore>, devices: Arc<dyn DeviceControl>) -> Self {
		let interfaces = Arc::new(InterfaceManager::new(devices.clone()));
		let sessions = SessionManager::new(directory, devices, interfaces.clone());
		Self {
			interfaces,
			sessions,
		}
	}
}
