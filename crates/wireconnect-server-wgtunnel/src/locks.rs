// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-key async mutexes that are forgotten once nobody holds or awaits them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap<K> = HashMap<K, Arc<Mutex<()>>>;

pub(crate) struct KeyedLocks<K> {
	locks: Arc<StdMutex<LockMap<K>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
	pub(crate) fn new() -> Self {
		Self {
			locks: Arc::new(StdMutex::new(HashMap::new())),
		}
	}

	/// Wait for exclusive use of `key`.
	pub(crate) async fn lock(&self, key: &K) -> KeyedGuard<K> {
		let entry = {
			let mut locks = lock_map(&self.locks);
			locks
				.entry(key.clone())
				.or_insert_with(|| Arc::new(Mutex::new(())))
				.clone()
		};
		let guard = entry.lock_owned().await;
		KeyedGuard {
			key: key.clone(),
			guard: Some(guard),
			locks: Arc::clone(&self.locks),
		}
	}

	pub(crate) fn len(&self) -> usize {
		lock_map(&self.locks).len()
	}
}

fn lock_map<K>(locks: &StdMutex<LockMap<K>>) -> MutexGuard<'_, LockMap<K>> {
	locks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the key on drop and removes its entry when no other task is
/// holding or waiting for it.
pub struct KeyedGuard<K: Eq + Hash> {
	key: K,
	guard: Option<OwnedMutexGuard<()>>,
	locks: Arc<StdMutex<LockMap<K>>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<K> {
	fn drop(&mut self) {
		self.guard.take();
		// Clones of an entry are only taken under the map lock, so a count of
		// one here means nobody else can reach this mutex.
		let mut locks = lock_map(&self.locks);
		if locks
			.get(&self.key)
			.is_some_and(|entry| Arc::strong_count(entry) == 1)
		{
			locks.remove(&self.key);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn entry_is_removed_after_release() {
		let locks = KeyedLocks::new();
		let guard = locks.lock(&"vpn0".to_string()).await;
		assert_eq!(locks.len(), 1);
		drop(guard);
		assert_eq!(locks.len(), 0);
	}

	#[tokio::test]
	async fn waiter_keeps_entry_alive() {
		let locks = Arc::new(KeyedLocks::new());
		let first = locks.lock(&"vpn0".to_string()).await;

		let waiter = {
			let locks = Arc::clone(&locks);
			tokio::spawn(async move {
				let _guard = locks.lock(&"vpn0".to_string()).await;
			})
		};
		tokio::time::sleep(Duration::from_millis(20)).await;
		assert!(!waiter.is_finished());

		drop(first);
		assert_eq!(locks.len(), 1);
		waiter.await.unwrap();
		assert_eq!(locks.len(), 0);
	}

	#[tokio::test]
	async fn different_keys_do_not_block() {
		let locks = KeyedLocks::new();
		let _vpn0 = locks.lock(&"vpn0".to_string()).await;
		let vpn1 = tokio::time::timeout(Duration::from_secs(1), locks.lock(&"vpn1".to_string())).await;
		assert!(vpn1.is_ok());
		assert_eq!(locks.len(), 2);
	}
}
