// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence for wireconnect-server: users, server interfaces and peers.

pub mod directory;
pub mod error;
pub mod password;
pub mod pool;
pub mod testing;
pub mod types;

pub use directory::{DirectoryRepository, DirectoryStore};
pub use error::{DbError, Result};
pub use pool::{create_pool, run_migrations};
pub use types::{NewPeer, PeerRecord, ServerInterfaceSpec};
