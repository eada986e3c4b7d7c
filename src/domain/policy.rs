use std::time::Duration;

/// Reconciliation policy for one check cycle.
#[derive(Clone, Debug)]
pub struct CheckPolicy {
    /// Delete a watch entry outright when its reward comes back 404.
    pub remove_missing_rewards: bool,
    pub notify_on_missing_rewards: bool,
    pub notify_on_forbidden_rewards: bool,
    /// Short-circuit per-entry reconciliation when a reward has zero remaining
    /// slots and no error; one bulk state reset instead.
    pub skip_entry_check_if_empty_and_no_error: bool,
    /// Delay between dispatching consecutive per-reward checks.
    pub dispatch_stagger: Duration,
}

impl Default for CheckPolicy {
    fn default() -> Self {
        Self {
            remove_missing_rewards: false,
            notify_on_missing_rewards: true,
            notify_on_forbidden_rewards: true,
            skip_entry_check_if_empty_and_no_error: false,
            dispatch_stagger: Duration::from_millis(50),
        }
    }
}
