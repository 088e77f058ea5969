// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! wireconnect-server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wireconnect_server::{bootstrap, create_app_state, create_router};
use wireconnect_server_db::{DirectoryRepository, DirectoryStore};
use wireconnect_server_wgtunnel::DeviceControl;

/// wireconnect-server - hands out WireGuard peer sessions over HTTP.
#[derive(Parser, Debug)]
#[command(name = "wireconnect-server", about = "WireGuard connection broker", version)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/wireconnect/server.toml)
	#[arg(long, env = "WIRECONNECT_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

#[cfg(target_os = "linux")]
fn kernel_devices() -> anyhow::Result<Arc<dyn DeviceControl>> {
	let devices = wireconnect_server_wgtunnel::KernelDevices::new()
		.context("failed to open netlink connection")?;
	Ok(Arc::new(devices))
}

#[cfg(not(target_os = "linux"))]
fn kernel_devices() -> anyhow::Result<Arc<dyn DeviceControl>> {
	anyhow::bail!("wireconnect-server manages kernel WireGuard devices and only runs on Linux")
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {}
		_ = terminate => {}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!(
			"{}",
			wireconnect_common_version::format_version_info("wireconnect-server")
		);
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => wireconnect_server_config::load_config_with_file(path)?,
		None => wireconnect_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting wireconnect-server"
	);

	let pool = wireconnect_server_db::create_pool(&config.database.url).await?;
	wireconnect_server_db::run_migrations(&pool).await?;
	let directory: Arc<dyn DirectoryStore> = Arc::new(DirectoryRepository::new(pool));

	bootstrap::seed_directory(directory.as_ref(), &config.bootstrap).await?;

	let devices = kernel_devices()?;
	let state = create_app_state(directory.clone(), devices, config.rate_limit.clone());
	bootstrap::start_interfaces(directory.as_ref(), &state.wg.interfaces).await?;

	let purge = state.rate_limiter.spawn_purge();

	let app = create_router(state.clone())
		.layer(TimeoutLayer::new(config.http.request_timeout))
		.layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;

	tokio::select! {
		result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = shutdown_signal() => {
			tracing::info!("received shutdown signal");
		}
	}

	purge.shutdown().await;
	state.wg.interfaces.shutdown().await;

	tracing::info!("server shutdown complete");
	Ok(())
}
