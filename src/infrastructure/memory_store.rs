use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::{AppError, AppResult, WatchStore};
use crate::domain::{RewardId, WatchEntry};

/// In-memory `WatchStore`, used by tests and `--dry-run` experiments.
#[derive(Clone, Default)]
pub struct InMemoryWatchStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    entries: BTreeMap<i64, WatchEntry>,
    // chat id -> stored locale
    chats: HashMap<i64, Option<String>>,
}

impl InMemoryWatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Storage("lock poisoned".into()))
    }
}

#[async_trait]
impl WatchStore for InMemoryWatchStore {
    async fn list_entries(&self) -> AppResult<Vec<WatchEntry>> {
        Ok(self.lock()?.entries.values().cloned().collect())
    }

    async fn distinct_reward_ids(&self) -> AppResult<Vec<RewardId>> {
        let inner = self.lock()?;
        let mut ids: Vec<RewardId> = inner.entries.values().map(|e| e.reward_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn entries_for_reward(&self, reward_id: RewardId) -> AppResult<Vec<WatchEntry>> {
        Ok(self
            .lock()?
            .entries
            .values()
            .filter(|e| e.reward_id == reward_id)
            .cloned()
            .collect())
    }

    async fn find_entry(&self, reward_id: RewardId) -> AppResult<Option<WatchEntry>> {
        Ok(self
            .lock()?
            .entries
            .values()
            .find(|e| e.reward_id == reward_id)
            .cloned())
    }

    async fn add_entry(&self, chat_id: i64, reward_id: RewardId) -> AppResult<WatchEntry> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner
            .entries
            .values()
            .find(|e| e.chat_id == chat_id && e.reward_id == reward_id)
        {
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let entry = WatchEntry {
            id: inner.next_id,
            chat_id,
            reward_id,
            available_since: None,
            last_notified: None,
            is_missing: false,
        };
        inner.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn update_entry(&self, entry: &WatchEntry) -> AppResult<()> {
        let mut inner = self.lock()?;
        if let Some(stored) = inner.entries.get_mut(&entry.id) {
            stored.available_since = entry.available_since;
            stored.last_notified = entry.last_notified;
            stored.is_missing = entry.is_missing;
        }
        Ok(())
    }

    async fn delete_entry(&self, entry_id: i64) -> AppResult<()> {
        self.lock()?.entries.remove(&entry_id);
        Ok(())
    }

    async fn set_last_notified(
        &self,
        entry_id: i64,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let mut inner = self.lock()?;
        if let Some(stored) = inner.entries.get_mut(&entry_id) {
            stored.last_notified = at;
        }
        Ok(())
    }

    async fn clear_notification_state(&self, reward_id: RewardId) -> AppResult<()> {
        let mut inner = self.lock()?;
        for entry in inner.entries.values_mut() {
            if entry.reward_id == reward_id {
                entry.is_missing = false;
                entry.available_since = None;
                entry.last_notified = None;
            }
        }
        Ok(())
    }

    async fn add_chat(&self, chat_id: i64) -> AppResult<()> {
        self.lock()?.chats.entry(chat_id).or_insert(None);
        Ok(())
    }

    async fn chat_locale(&self, chat_id: i64) -> AppResult<Option<String>> {
        Ok(self.lock()?.chats.get(&chat_id).cloned().flatten())
    }

    async fn set_chat_locale(&self, chat_id: i64, locale: &str) -> AppResult<()> {
        let mut inner = self.lock()?;
        if let Some(chat) = inner.chats.get_mut(&chat_id) {
            *chat = Some(locale.to_string());
        }
        Ok(())
    }
}
