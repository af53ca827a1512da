//! Map-backed user store for tests and single-process deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{UserRecord, UserStore};
use crate::errors::AppResult;

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    records: RwLock<HashMap<i64, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, user_id: i64) -> AppResult<UserRecord> {
        if let Some(record) = self.records.read().get(&user_id) {
            return Ok(record.clone());
        }
        Ok(self.records.write().entry(user_id).or_default().clone())
    }

    async fn put(&self, user_id: i64, record: &UserRecord) -> AppResult<()> {
        self.records.write().insert(user_id, record.clone());
        Ok(())
    }

    async fn user_ids(&self) -> AppResult<Vec<i64>> {
        let mut ids: Vec<i64> = self.records.read().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
