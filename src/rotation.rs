//! # Rotation Engine
//!
//! Decides whether a user's batch is reused or replaced and keeps new batches
//! clear of words the user has already seen.
//!
//! ## Refresh paths
//!
//! | Operation      | Marks old batch learned | Sets `last_refresh_date` |
//! |----------------|-------------------------|--------------------------|
//! | `refresh`      | yes, before fetching    | no                       |
//! | `ensure_daily` | no                      | yes, only when stale     |
//! | `force_daily`  | no                      | yes                      |
//! | `select_level` | no                      | yes                      |
//!
//! Every operation holds the user's lock from read to write-back, so an
//! interactive refresh and the scheduler never interleave on one user.

use chrono::{FixedOffset, NaiveDate};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::{reference_date, Clock};
use crate::errors::{AppError, AppResult};
use crate::level::CefrLevel;
use crate::store::{self, UserLocks, UserRecord, UserStore};
use crate::word_source::{WordEntry, WordSource, MAX_WORDS_PER_REQUEST};

pub struct RotationEngine {
    store: Arc<dyn UserStore>,
    source: Arc<WordSource>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    batch_size: usize,
    locks: UserLocks,
}

impl RotationEngine {
    pub fn new(
        store: Arc<dyn UserStore>,
        source: Arc<WordSource>,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            source,
            clock,
            offset,
            batch_size: batch_size.clamp(1, MAX_WORDS_PER_REQUEST),
            locks: UserLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Current date in the reference timezone
    pub fn today(&self) -> NaiveDate {
        reference_date(self.clock.now(), self.offset)
    }

    /// Set the user's level and hand out a fresh batch for today
    pub async fn select_level(&self, user_id: i64, level: CefrLevel) -> AppResult<Vec<WordEntry>> {
        let _guard = self.locks.lock(user_id).await;
        let mut record = self.store.get(user_id).await?;

        record.level = Some(level);
        let batch = self.fetch_unlearned(level, &record.learned_words).await;
        record.daily_words = batch.clone();
        record.last_refresh_date = Some(self.today());
        self.store.put(user_id, &record).await?;

        info!(user_id = %user_id, level = %level, words = batch.len(), "Level selected");
        Ok(batch)
    }

    /// "More words": retire the current batch into the learned set and fetch a new one
    pub async fn refresh(&self, user_id: i64) -> AppResult<Vec<WordEntry>> {
        let _guard = self.locks.lock(user_id).await;

        // Persisted before fetching so a failed fetch still keeps the words learned
        let mut record =
            store::mutate(self.store.as_ref(), user_id, UserRecord::mark_daily_as_learned).await?;
        let level = record.level.ok_or(AppError::LevelNotSelected(user_id))?;

        let batch = self.fetch_unlearned(level, &record.learned_words).await;
        record.daily_words = batch.clone();
        self.store.put(user_id, &record).await?;

        debug!(
            user_id = %user_id,
            learned = record.learned_words.len(),
            words = batch.len(),
            "Batch refreshed"
        );
        Ok(batch)
    }

    /// Scheduler path: replace the batch only when it was not refreshed today
    pub async fn ensure_daily(&self, user_id: i64) -> AppResult<Vec<WordEntry>> {
        let _guard = self.locks.lock(user_id).await;
        let mut record = self.store.get(user_id).await?;
        let level = record.level.ok_or(AppError::LevelNotSelected(user_id))?;

        let today = self.today();
        if record.last_refresh_date == Some(today) {
            return Ok(record.daily_words);
        }

        let batch = self.fetch_unlearned(level, &record.learned_words).await;
        record.daily_words = batch.clone();
        record.last_refresh_date = Some(today);
        self.store.put(user_id, &record).await?;

        debug!(user_id = %user_id, date = %today, words = batch.len(), "Daily batch replaced");
        Ok(batch)
    }

    /// Replace today's batch regardless of the last refresh date
    pub async fn force_daily(&self, user_id: i64) -> AppResult<Vec<WordEntry>> {
        let _guard = self.locks.lock(user_id).await;
        let mut record = self.store.get(user_id).await?;
        let level = record.level.ok_or(AppError::LevelNotSelected(user_id))?;

        let batch = self.fetch_unlearned(level, &record.learned_words).await;
        record.daily_words = batch.clone();
        record.last_refresh_date = Some(self.today());
        self.store.put(user_id, &record).await?;

        Ok(batch)
    }

    /// Current batch, unchanged
    pub async fn current(&self, user_id: i64) -> AppResult<Vec<WordEntry>> {
        let record = self.store.get(user_id).await?;
        if record.level.is_none() {
            return Err(AppError::LevelNotSelected(user_id));
        }
        Ok(record.daily_words)
    }

    pub async fn level(&self, user_id: i64) -> AppResult<Option<CefrLevel>> {
        Ok(self.store.get(user_id).await?.level)
    }

    pub async fn learned_count(&self, user_id: i64) -> AppResult<usize> {
        Ok(self.store.get(user_id).await?.learned_words.len())
    }

    /// Fetch a batch and drop learned words, keeping the unfiltered batch if
    /// nothing would be left
    async fn fetch_unlearned(
        &self,
        level: CefrLevel,
        learned: &HashSet<String>,
    ) -> Vec<WordEntry> {
        let fetched = self.source.fetch_words(level, self.batch_size).await;
        let fresh: Vec<WordEntry> = fetched
            .iter()
            .filter(|entry| !learned.contains(&entry.word))
            .cloned()
            .collect();

        if fresh.is_empty() {
            debug!(level = %level, fetched = fetched.len(), "Every fetched word already learned, repeating");
            fetched
        } else {
            fresh
        }
    }
}
