// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod client;
pub mod commands;
pub mod credentials;
pub mod error;
pub mod tunnel;

pub use client::WireconnectClient;
pub use commands::{run, Cli, Command};
pub use error::{CliError, Result};
