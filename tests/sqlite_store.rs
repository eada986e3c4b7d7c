use chrono::{TimeZone, Utc};

use rewardpulse::application::WatchStore;
use rewardpulse::domain::RewardId;
use rewardpulse::infrastructure::sqlite_store::SqliteWatchStore;

async fn store() -> SqliteWatchStore {
    SqliteWatchStore::new("sqlite::memory:").await.unwrap()
}

#[tokio::test]
async fn add_and_find_entries() {
    let store = store().await;
    store.add_chat(10).await.unwrap();
    store.add_chat(11).await.unwrap();

    let entry = store.add_entry(10, RewardId(42)).await.unwrap();
    assert_eq!(entry.chat_id, 10);
    assert_eq!(entry.reward_id, RewardId(42));
    assert_eq!(entry.available_since, None);
    assert_eq!(entry.last_notified, None);
    assert!(!entry.is_missing);

    store.add_entry(11, RewardId(42)).await.unwrap();
    store.add_entry(10, RewardId(99)).await.unwrap();

    assert_eq!(store.list_entries().await.unwrap().len(), 3);
    assert_eq!(
        store.distinct_reward_ids().await.unwrap(),
        vec![RewardId(42), RewardId(99)]
    );
    assert_eq!(
        store.entries_for_reward(RewardId(42)).await.unwrap().len(),
        2
    );
    assert!(store.find_entry(RewardId(99)).await.unwrap().is_some());
    assert!(store.find_entry(RewardId(7)).await.unwrap().is_none());
}

#[tokio::test]
async fn adding_the_same_watch_twice_is_a_no_op() {
    let store = store().await;
    store.add_chat(10).await.unwrap();

    let first = store.add_entry(10, RewardId(42)).await.unwrap();
    let second = store.add_entry(10, RewardId(42)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.list_entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_entry_roundtrips_timestamps() {
    let store = store().await;
    store.add_chat(10).await.unwrap();
    let mut entry = store.add_entry(10, RewardId(42)).await.unwrap();

    entry.available_since = Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    entry.last_notified = Some(Utc.timestamp_opt(1_700_000_060, 0).unwrap());
    entry.is_missing = true;
    store.update_entry(&entry).await.unwrap();

    let stored = store.find_entry(RewardId(42)).await.unwrap().unwrap();
    assert_eq!(stored, entry);
}

#[tokio::test]
async fn set_last_notified_touches_only_that_field() {
    let store = store().await;
    store.add_chat(10).await.unwrap();
    let mut entry = store.add_entry(10, RewardId(42)).await.unwrap();
    entry.available_since = Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    store.update_entry(&entry).await.unwrap();

    let at = Utc.timestamp_opt(1_700_000_120, 0).unwrap();
    store.set_last_notified(entry.id, Some(at)).await.unwrap();

    let stored = store.find_entry(RewardId(42)).await.unwrap().unwrap();
    assert_eq!(stored.last_notified, Some(at));
    assert_eq!(stored.available_since, entry.available_since);
}

#[tokio::test]
async fn clear_notification_state_resets_every_entry_of_the_reward() {
    let store = store().await;
    store.add_chat(10).await.unwrap();
    store.add_chat(11).await.unwrap();
    for chat in [10, 11] {
        let mut entry = store.add_entry(chat, RewardId(42)).await.unwrap();
        entry.available_since = Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        entry.last_notified = Some(Utc.timestamp_opt(1_700_000_060, 0).unwrap());
        entry.is_missing = true;
        store.update_entry(&entry).await.unwrap();
    }

    store.clear_notification_state(RewardId(42)).await.unwrap();

    for entry in store.entries_for_reward(RewardId(42)).await.unwrap() {
        assert_eq!(entry.available_since, None);
        assert_eq!(entry.last_notified, None);
        assert!(!entry.is_missing);
    }
}

#[tokio::test]
async fn delete_entry_removes_only_that_entry() {
    let store = store().await;
    store.add_chat(10).await.unwrap();
    let keep = store.add_entry(10, RewardId(1)).await.unwrap();
    let gone = store.add_entry(10, RewardId(2)).await.unwrap();

    store.delete_entry(gone.id).await.unwrap();

    let remaining = store.list_entries().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
}

#[tokio::test]
async fn chat_locale_defaults_to_none_and_is_settable() {
    let store = store().await;
    store.add_chat(10).await.unwrap();

    assert_eq!(store.chat_locale(10).await.unwrap(), None);

    store.set_chat_locale(10, "de").await.unwrap();
    assert_eq!(store.chat_locale(10).await.unwrap(), Some("de".into()));

    // Unknown chat: nothing stored, nothing returned.
    assert_eq!(store.chat_locale(99).await.unwrap(), None);
}
