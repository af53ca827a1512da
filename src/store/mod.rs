//! # User State Store
//!
//! Per-user learning state behind the [`UserStore`] trait. The map-backed
//! [`InMemoryUserStore`] lives for the process lifetime; [`PgUserStore`]
//! persists records in PostgreSQL so they survive restarts.
//!
//! Stores only guarantee that single `get`/`put` calls are atomic. Callers that
//! read, await something, then write back must hold the user's lock from
//! [`UserLocks`] for the whole sequence.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::errors::AppResult;
use crate::level::CefrLevel;
use crate::word_source::WordEntry;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Learning state of one Telegram user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Selected CEFR level, unset until the user picks one
    pub level: Option<CefrLevel>,
    /// Every word the user has already been shown; only grows
    pub learned_words: HashSet<String>,
    /// Current batch
    pub daily_words: Vec<WordEntry>,
    /// Reference-timezone date of the last daily refresh
    pub last_refresh_date: Option<NaiveDate>,
}

impl UserRecord {
    /// Move the current batch into the learned set
    pub fn mark_daily_as_learned(&mut self) {
        for entry in &self.daily_words {
            self.learned_words.insert(entry.word.clone());
        }
    }

    pub fn is_learned(&self, word: &str) -> bool {
        self.learned_words.contains(word)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Record for `user_id`, created with defaults on first access
    async fn get(&self, user_id: i64) -> AppResult<UserRecord>;

    /// Replace the stored record for `user_id`
    async fn put(&self, user_id: i64, record: &UserRecord) -> AppResult<()>;

    /// Snapshot of every known user id
    async fn user_ids(&self) -> AppResult<Vec<i64>>;
}

/// Read, modify and write back one record. Hold the user's lock when other
/// tasks may touch the same user.
pub async fn mutate<S, F>(store: &S, user_id: i64, f: F) -> AppResult<UserRecord>
where
    S: UserStore + ?Sized,
    F: FnOnce(&mut UserRecord),
{
    let mut record = store.get(user_id).await?;
    f(&mut record);
    store.put(user_id, &record).await?;
    Ok(record)
}

/// One async mutex per user id, serializing read-modify-write sequences
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`
    pub async fn lock(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }
}
