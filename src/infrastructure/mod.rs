pub mod ttl_cache;
pub mod patreon_fetcher;
pub mod sqlite_store;
pub mod memory_store;
pub mod telegram_notifier;
pub mod console_notifier;
pub mod multi_notifier;
pub mod fake_fetcher;
