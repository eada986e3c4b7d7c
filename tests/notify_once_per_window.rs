use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rewardpulse::application::usecases::{CheckRewardsUseCase, DispatchActionsUseCase};
use rewardpulse::application::{AppError, AppResult, ChatNotifier, WatchStore};
use rewardpulse::domain::patreon::{CampaignData, RewardData};
use rewardpulse::domain::{CheckPolicy, FetchError, ResourceKind, RewardId};
use rewardpulse::infrastructure::fake_fetcher::FakeFetcher;
use rewardpulse::infrastructure::memory_store::InMemoryWatchStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sent {
    Available,
    Missing,
    Forbidden,
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(i64, Sent)>>>,
    fail_available: Arc<AtomicBool>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self::default()
    }

    fn count(&self, kind: Sent) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k)| *k == kind)
            .count()
    }

    fn sent_to(&self, chat_id: i64, kind: Sent) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|&&(c, k)| c == chat_id && k == kind)
            .count()
    }

    fn fail_available_sends(&self, fail: bool) {
        self.fail_available.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatNotifier for RecordingNotifier {
    async fn send_available(
        &self,
        chat_id: i64,
        _reward: &RewardData,
        _campaign: &CampaignData,
    ) -> AppResult<()> {
        if self.fail_available.load(Ordering::SeqCst) {
            return Err(AppError::Notifier("chat api unreachable".into()));
        }
        self.sent.lock().unwrap().push((chat_id, Sent::Available));
        Ok(())
    }

    async fn send_missing(&self, chat_id: i64, _reward_id: RewardId) -> AppResult<()> {
        self.sent.lock().unwrap().push((chat_id, Sent::Missing));
        Ok(())
    }

    async fn send_forbidden(&self, chat_id: i64, _reward_id: RewardId) -> AppResult<()> {
        self.sent.lock().unwrap().push((chat_id, Sent::Forbidden));
        Ok(())
    }
}

struct Harness {
    store: InMemoryWatchStore,
    fetcher: FakeFetcher,
    notifier: RecordingNotifier,
    policy: CheckPolicy,
}

impl Harness {
    fn new(policy: CheckPolicy) -> Self {
        Self {
            store: InMemoryWatchStore::new(),
            fetcher: FakeFetcher::new(),
            notifier: RecordingNotifier::new(),
            policy,
        }
    }

    async fn watch(&self, chat_id: i64, reward_id: i64) {
        self.store.add_chat(chat_id).await.unwrap();
        self.store
            .add_entry(chat_id, RewardId(reward_id))
            .await
            .unwrap();
    }

    /// Runs one full check cycle and returns the AVAILABLE action count.
    async fn run_cycle(&self) -> usize {
        let check = CheckRewardsUseCase {
            store: &self.store,
            fetcher: &self.fetcher,
            dispatch: DispatchActionsUseCase {
                store: &self.store,
                notifier: &self.notifier,
            },
            policy: self.policy.clone(),
        };
        check.execute().await.unwrap()
    }

    async fn entry(&self, reward_id: i64) -> rewardpulse::domain::WatchEntry {
        self.store
            .find_entry(RewardId(reward_id))
            .await
            .unwrap()
            .expect("watch entry should exist")
    }
}

#[tokio::test]
async fn available_reward_notifies_exactly_once_per_window() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;
    h.fetcher.set_remaining(RewardId(42), Some(5));

    assert_eq!(h.run_cycle().await, 1);

    let entry = h.entry(42).await;
    assert!(entry.available_since.is_some());
    assert!(entry.last_notified.is_some());
    assert!(!entry.is_missing);

    // Same state next cycle: nothing new to say.
    assert_eq!(h.run_cycle().await, 0);
    assert_eq!(h.notifier.count(Sent::Available), 1);
}

#[tokio::test]
async fn window_reset_produces_a_fresh_notification() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;

    h.fetcher.set_remaining(RewardId(42), Some(3));
    h.run_cycle().await;
    let first_window = h.entry(42).await.available_since.unwrap();

    // Still available: the window start must not move.
    h.run_cycle().await;
    assert_eq!(h.entry(42).await.available_since, Some(first_window));
    assert_eq!(h.notifier.count(Sent::Available), 1);

    // Taken again: window closes, dedup state resets.
    h.fetcher.set_remaining(RewardId(42), Some(0));
    h.run_cycle().await;
    let entry = h.entry(42).await;
    assert_eq!(entry.available_since, None);
    assert_eq!(entry.last_notified, None);

    // Slots reopen: a new window, a second notification.
    h.fetcher.set_remaining(RewardId(42), Some(1));
    assert_eq!(h.run_cycle().await, 1);
    let entry = h.entry(42).await;
    assert!(entry.available_since.unwrap() > first_window);
    assert_eq!(h.notifier.count(Sent::Available), 2);
}

#[tokio::test]
async fn null_remaining_counts_as_taken() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;
    h.fetcher.set_remaining(RewardId(42), None);

    assert_eq!(h.run_cycle().await, 0);
    let entry = h.entry(42).await;
    assert_eq!(entry.available_since, None);
    assert!(!entry.is_missing);
}

#[tokio::test]
async fn not_found_deletes_entry_when_removal_is_enabled() {
    let policy = CheckPolicy {
        remove_missing_rewards: true,
        ..CheckPolicy::default()
    };
    let h = Harness::new(policy);
    h.watch(10, 42).await;
    h.fetcher.set_not_found(RewardId(42));

    h.run_cycle().await;

    assert!(h.store.list_entries().await.unwrap().is_empty());
    assert_eq!(h.notifier.count(Sent::Missing), 0);
}

#[tokio::test]
async fn not_found_notifies_once_until_reward_reappears() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;
    h.fetcher.set_not_found(RewardId(42));

    h.run_cycle().await;
    assert_eq!(h.notifier.count(Sent::Missing), 1);
    assert!(h.entry(42).await.is_missing);

    // Already flagged missing: no repeat while it stays gone.
    h.run_cycle().await;
    assert_eq!(h.notifier.count(Sent::Missing), 1);

    // Reappearing with open slots clears the flag and notifies availability.
    h.fetcher.set_remaining(RewardId(42), Some(2));
    assert_eq!(h.run_cycle().await, 1);
    let entry = h.entry(42).await;
    assert!(!entry.is_missing);
    assert_eq!(h.notifier.count(Sent::Available), 1);
}

#[tokio::test]
async fn forbidden_notifies_once() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;
    h.fetcher.set_forbidden(RewardId(42));

    h.run_cycle().await;
    h.run_cycle().await;

    assert_eq!(h.notifier.count(Sent::Forbidden), 1);
    assert!(h.entry(42).await.is_missing);
}

#[tokio::test]
async fn forbidden_notification_can_be_disabled() {
    let policy = CheckPolicy {
        notify_on_forbidden_rewards: false,
        ..CheckPolicy::default()
    };
    let h = Harness::new(policy);
    h.watch(10, 42).await;
    h.fetcher.set_forbidden(RewardId(42));

    h.run_cycle().await;

    assert_eq!(h.notifier.count(Sent::Forbidden), 0);
    assert!(h.entry(42).await.is_missing);
}

#[tokio::test]
async fn failed_send_leaves_dedup_window_open_for_retry() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;
    h.fetcher.set_remaining(RewardId(42), Some(5));

    h.notifier.fail_available_sends(true);
    assert_eq!(h.run_cycle().await, 1);
    let entry = h.entry(42).await;
    assert!(entry.available_since.is_some());
    assert_eq!(entry.last_notified, None);
    assert_eq!(h.notifier.count(Sent::Available), 0);

    // The channel recovers; the next cycle delivers the same window.
    h.notifier.fail_available_sends(false);
    assert_eq!(h.run_cycle().await, 1);
    assert_eq!(h.notifier.count(Sent::Available), 1);
    assert!(h.entry(42).await.last_notified.is_some());
}

#[tokio::test]
async fn campaign_fetch_failure_postpones_the_notification() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;
    h.fetcher.set_remaining(RewardId(42), Some(5));
    h.fetcher
        .fail_campaign_fetches(Some(FetchError::not_found(ResourceKind::Campaign, 7)));

    assert_eq!(h.run_cycle().await, 0);
    let entry = h.entry(42).await;
    assert!(entry.available_since.is_some());
    assert_eq!(entry.last_notified, None);

    h.fetcher.fail_campaign_fetches(None);
    assert_eq!(h.run_cycle().await, 1);
    assert_eq!(h.notifier.count(Sent::Available), 1);
}

#[tokio::test]
async fn upstream_error_changes_nothing_and_is_retried() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;
    h.fetcher.set_remaining(RewardId(42), Some(5));
    h.run_cycle().await;
    let before = h.entry(42).await;

    h.fetcher.set_upstream_error(RewardId(42), 502);
    assert_eq!(h.run_cycle().await, 0);
    assert_eq!(h.entry(42).await, before);
    assert_eq!(h.notifier.count(Sent::Missing), 0);
    assert_eq!(h.notifier.count(Sent::Forbidden), 0);
}

#[tokio::test]
async fn every_chat_watching_a_reward_is_notified() {
    let h = Harness::new(CheckPolicy::default());
    h.watch(10, 42).await;
    h.watch(11, 42).await;
    h.fetcher.set_remaining(RewardId(42), Some(5));

    assert_eq!(h.run_cycle().await, 2);
    assert_eq!(h.notifier.sent_to(10, Sent::Available), 1);
    assert_eq!(h.notifier.sent_to(11, Sent::Available), 1);
    // One shared reward means one upstream availability check.
    assert_eq!(h.fetcher.availability_checks(), 1);
}

#[tokio::test]
async fn skip_shortcut_resets_state_like_the_slow_path() {
    let policy = CheckPolicy {
        skip_entry_check_if_empty_and_no_error: true,
        ..CheckPolicy::default()
    };
    let h = Harness::new(policy);
    h.watch(10, 42).await;

    h.fetcher.set_remaining(RewardId(42), Some(5));
    h.run_cycle().await;
    assert!(h.entry(42).await.last_notified.is_some());

    h.fetcher.set_remaining(RewardId(42), Some(0));
    h.run_cycle().await;
    let entry = h.entry(42).await;
    assert_eq!(entry.available_since, None);
    assert_eq!(entry.last_notified, None);
    assert!(!entry.is_missing);

    h.fetcher.set_remaining(RewardId(42), Some(1));
    assert_eq!(h.run_cycle().await, 1);
    assert_eq!(h.notifier.count(Sent::Available), 2);
}
