// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-source-address token buckets.
//!
//! A bucket starts full and gains `quantum` tokens at every whole multiple of
//! `fill_interval` since it was created, never exceeding `capacity`. Buckets
//! are created lazily and dropped by a periodic purge once they have been
//! idle for `purge_threshold`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, warn};
use wireconnect_server_config::RateLimitConfig;

#[derive(Debug)]
struct Bucket {
	created: Instant,
	last_tick: u64,
	tokens: u64,
	last_access: Instant,
}

impl Bucket {
	fn new(now: Instant, capacity: u64) -> Self {
		Self {
			created: now,
			last_tick: 0,
			tokens: capacity,
			last_access: now,
		}
	}

	fn take(&mut self, now: Instant, config: &RateLimitConfig) -> bool {
		let elapsed = now.saturating_duration_since(self.created).as_nanos();
		let interval = config.fill_interval.as_nanos().max(1);
		let tick = u64::try_from(elapsed / interval).unwrap_or(u64::MAX);

		if tick > self.last_tick {
			let added = (tick - self.last_tick).saturating_mul(config.quantum);
			self.tokens = self.tokens.saturating_add(added).min(config.capacity);
			self.last_tick = tick;
		}
		self.last_access = now;

		if self.tokens == 0 {
			return false;
		}
		self.tokens -= 1;
		true
	}
}

pub struct RateLimiter {
	config: RateLimitConfig,
	buckets: Mutex<HashMap<String, Arc<Mutex<Bucket>>>>,
}

impl RateLimiter {
	pub fn new(config: RateLimitConfig) -> Self {
		Self {
			config,
			buckets: Mutex::new(HashMap::new()),
		}
	}

	pub fn config(&self) -> &RateLimitConfig {
		&self.config
	}

	/// Withdraw one token for `source`, creating its bucket on first sight.
	pub async fn allow(&self, source: &str) -> bool {
		let now = Instant::now();
		let bucket = {
			let mut buckets = self.buckets.lock().await;
			buckets
				.entry(source.to_string())
				.or_insert_with(|| Arc::new(Mutex::new(Bucket::new(now, self.config.capacity))))
				.clone()
		};
		let mut bucket = bucket.lock().await;
		bucket.take(now, &self.config)
	}

	pub async fn reset(&self, source: &str) {
		self.buckets.lock().await.remove(source);
	}

	/// Addresses that currently own a bucket.
	pub async fn list_recent(&self) -> Vec<String> {
		let mut addresses: Vec<String> = self.buckets.lock().await.keys().cloned().collect();
		addresses.sort();
		addresses
	}

	/// Drop buckets idle for at least the purge threshold. Returns how many
	/// were removed.
	pub async fn purge_idle(&self) -> usize {
		let now = Instant::now();
		let threshold = self.config.purge_threshold;
		let mut buckets = self.buckets.lock().await;
		let before = buckets.len();
		// A bucket locked by an in-flight `allow` is in use.
		buckets.retain(|_, bucket| match bucket.try_lock() {
			Ok(b) => now.saturating_duration_since(b.last_access) < threshold,
			Err(_) => true,
		});
		before - buckets.len()
	}

	/// Run [`RateLimiter::purge_idle`] every `purge_check_interval` until the
	/// returned task is shut down.
	pub fn spawn_purge(self: &Arc<Self>) -> PurgeTask {
		let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
		let limiter = Arc::clone(self);
		let period = limiter.config.purge_check_interval;

		let handle = tokio::spawn(async move {
			let mut ticker = time::interval_at(Instant::now() + period, period);
			loop {
				tokio::select! {
					_ = ticker.tick() => {
						let removed = limiter.purge_idle().await;
						if removed > 0 {
							debug!(removed, "purged idle rate-limit buckets");
						}
					}
					changed = shutdown_rx.changed() => {
						if changed.is_err() || *shutdown_rx.borrow() {
							break;
						}
					}
				}
			}
			debug!("rate-limit purge task stopped");
		});

		PurgeTask {
			shutdown: shutdown_tx,
			handle,
		}
	}
}

pub struct PurgeTask {
	shutdown: watch::Sender<bool>,
	handle: JoinHandle<()>,
}

impl PurgeTask {
	pub async fn shutdown(self) {
		let _ = self.shutdown.send(true);
		if let Err(e) = self.handle.await {
			warn!(error = %e, "rate-limit purge task ended abnormally");
		}
	}
}
