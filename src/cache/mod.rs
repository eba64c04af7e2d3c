// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::{Duration, Instant},
};

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    #[error("invalid duration")]
    InvalidDuration,
}

/// Concurrent expiring map. Entries live for the configured TTL; expired
/// entries are hidden from `lookup` immediately and purged lazily by a
/// background task.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    inner: Arc<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    data: RwLock<HashMap<String, Item<T>>>,
    expire_after: Duration,
}

#[derive(Debug, Clone)]
struct Item<T> {
    object: T,
    expires_at: Instant,
}

impl<T> Cache<T>
where T: Clone + Send + Sync + 'static
{
    pub fn new(expire_after: Duration) -> Result<Self, CacheError> {
        if expire_after.is_zero() {
            return Err(CacheError::InvalidDuration);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                data: RwLock::new(HashMap::with_capacity(8)),
                expire_after,
            }),
        })
    }

    /// Returns the live value under `name`, if any. An expired entry is
    /// reported as absent and scheduled for removal.
    pub fn lookup(&self, name: &str) -> Option<T> {
        let data = self
            .inner
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let item = data.get(name)?;
        if item.expires_at <= Instant::now() {
            let cache = self.clone();
            let name = name.to_string();
            let captured = item.expires_at;
            tokio::spawn(async move { cache.purge_expired(&name, captured) });

            return None;
        }

        Some(item.object.clone())
    }

    /// Inserts or overwrites; the entry expires `expire_after` from now.
    pub fn set(&self, name: &str, object: T) {
        let mut data = self
            .inner
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        data.insert(name.to_string(), Item {
            object,
            expires_at: Instant::now() + self.inner.expire_after,
        });
    }

    pub fn delete(&self, name: &str) {
        let mut data = self
            .inner
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        data.remove(name);
    }

    /// Removes `name` only if its deadline still matches the one captured at
    /// lookup time, so a racing overwrite survives.
    fn purge_expired(&self, name: &str, captured_expiry: Instant) {
        let mut data = self
            .inner
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(item) = data.get(name)
            && item.expires_at == captured_expiry
        {
            data.remove(name);
        }
    }
}
