//! Pending reconnection table
//!
//! Before a client hops onto this channel, the world tier records which
//! address the character is expected to reconnect from. Admission waits for
//! that record, compares addresses and consumes it. Entries are only ever
//! inserted by the world tier's link; the channel reads and deletes them.

use crate::config::AdmissionPolicy;
use log::debug;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tokio::sync::{Mutex, Notify};
use tokio::time::{sleep, Instant};

/// Outcome of checking the table for one character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingLookup {
    /// An entry with the observed address existed and has been removed
    Matched,
    /// An entry exists for a different address; it is left in place
    Mismatch(Ipv4Addr),
    /// No entry for this character
    Absent,
}

#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: Mutex<HashMap<i32, Ipv4Addr>>,
    registered: Notify,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the address `character_id` will reconnect from, replacing any
    /// previous entry, and wakes admissions waiting on the table.
    pub async fn register(&self, character_id: i32, ip: Ipv4Addr) {
        self.entries.lock().await.insert(character_id, ip);
        debug!("Pending connection for character {} from {}", character_id, ip);
        self.registered.notify_waiters();
    }

    pub async fn expected_ip(&self, character_id: i32) -> Option<Ipv4Addr> {
        self.entries.lock().await.get(&character_id).copied()
    }

    /// Removes the entry for `character_id`. Returns false if there was none.
    pub async fn remove(&self, character_id: i32) -> bool {
        self.entries.lock().await.remove(&character_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Compares and, on a match, consumes the entry under a single lock
    pub async fn try_consume(&self, character_id: i32, observed: Ipv4Addr) -> PendingLookup {
        let mut entries = self.entries.lock().await;
        match entries.get(&character_id).copied() {
            Some(expected) if expected == observed => {
                entries.remove(&character_id);
                PendingLookup::Matched
            }
            Some(expected) => PendingLookup::Mismatch(expected),
            None => PendingLookup::Absent,
        }
    }

    /// Polls for an entry until one shows up or the policy ceiling elapses.
    ///
    /// Wakes early when [`register`](Self::register) is called and otherwise
    /// re-checks every `poll_interval`. The lock is never held while waiting.
    pub async fn await_registration(
        &self,
        character_id: i32,
        observed: Ipv4Addr,
        policy: &AdmissionPolicy,
    ) -> PendingLookup {
        let deadline = Instant::now() + policy.ceiling;

        loop {
            let notified = self.registered.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_consume(character_id, observed).await {
                PendingLookup::Absent => {}
                found => return found,
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(
                    "No pending connection for character {} after {:?}, {} others pending",
                    character_id,
                    policy.ceiling,
                    self.len().await
                );
                return PendingLookup::Absent;
            }

            let wait = policy.poll_interval.min(deadline - now);
            tokio::select! {
                _ = &mut notified => {}
                _ = sleep(wait) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    const HOME: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
    const OTHER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

    #[tokio::test]
    async fn test_try_consume_match_removes_entry() {
        let registry = PendingRegistry::new();
        registry.register(1, HOME).await;

        assert_eq!(registry.try_consume(1, HOME).await, PendingLookup::Matched);
        assert_eq!(registry.expected_ip(1).await, None);
        assert_eq!(registry.try_consume(1, HOME).await, PendingLookup::Absent);
    }

    #[tokio::test]
    async fn test_try_consume_mismatch_keeps_entry() {
        let registry = PendingRegistry::new();
        registry.register(1, HOME).await;

        assert_eq!(
            registry.try_consume(1, OTHER).await,
            PendingLookup::Mismatch(HOME)
        );
        assert_eq!(registry.expected_ip(1).await, Some(HOME));
    }

    #[tokio::test]
    async fn test_register_replaces_entry() {
        let registry = PendingRegistry::new();
        registry.register(1, HOME).await;
        registry.register(1, OTHER).await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.expected_ip(1).await, Some(OTHER));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = PendingRegistry::new();
        registry.register(1, HOME).await;

        assert!(registry.remove(1).await);
        assert!(!registry.remove(1).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_times_out_at_ceiling() {
        let registry = PendingRegistry::new();
        registry.register(2, OTHER).await;
        let policy = AdmissionPolicy::default();
        let start = Instant::now();

        let result = registry.await_registration(1, HOME, &policy).await;

        assert_eq!(result, PendingLookup::Absent);
        // other characters' entries are left alone
        assert_eq!(registry.len().await, 1);
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_wakes_on_late_registration() {
        let registry = Arc::new(PendingRegistry::new());
        let policy = AdmissionPolicy::default();

        let writer = Arc::clone(&registry);
        tokio::spawn(async move {
            sleep(Duration::from_secs(3)).await;
            writer.register(1, HOME).await;
        });

        let start = Instant::now();
        let result = registry.await_registration(1, HOME, &policy).await;

        assert_eq!(result, PendingLookup::Matched);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(30));
        assert!(registry.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_one_waiter_consumes_an_entry() {
        let registry = Arc::new(PendingRegistry::new());
        let policy = AdmissionPolicy::default();
        registry.register(1, HOME).await;

        let a = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.await_registration(1, HOME, &policy).await })
        };
        let b = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.await_registration(1, HOME, &policy).await })
        };

        let mut results = vec![a.await.unwrap(), b.await.unwrap()];
        results.sort_by_key(|r| *r == PendingLookup::Matched);
        assert_eq!(results, vec![PendingLookup::Absent, PendingLookup::Matched]);
    }
}
