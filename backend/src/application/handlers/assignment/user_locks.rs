//! UserLocks - per-user exclusive update region.
//!
//! Every handler that mutates a user's assignment snapshot takes that user's
//! lock first, so observations for one user are scored and committed one at
//! a time while different users proceed in parallel. The store's version
//! check still guards against writers in other processes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::UserId;

/// Idle locks are dropped once the table grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

/// Held for the duration of one user's update.
pub type UserLockGuard = OwnedMutexGuard<()>;

#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `user_id`.
    pub async fn acquire(&self, user_id: &UserId) -> UserLockGuard {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() > PRUNE_THRESHOLD {
                // Only the table holds an idle lock.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(user_id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub async fn tracked_users(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let in_flight = in_flight.clone();
                let max_seen = max_seen.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire(&user("u1")).await;
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_users_do_not_block_each_other() {
        let locks = UserLocks::new();
        let _first = locks.acquire(&user("u1")).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&user("u2"))).await;
        assert!(second.is_ok());
        assert_eq!(locks.tracked_users().await, 2);
    }
}
