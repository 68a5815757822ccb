//! Per-role chat turn serialization.
//!
//! `TurnGate` hands out one permit per role at a time. A send to a role that
//! already has a turn in flight waits for the previous permit to drop.
//! Different roles never contend. Lock entries are removed once no permit
//! holder or waiter references them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use rolechat_types::role::RoleId;

#[derive(Debug, Clone, Default)]
pub struct TurnGate {
    locks: Arc<DashMap<RoleId, Arc<Mutex<()>>>>,
}

impl TurnGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `role_id` has no turn in flight, then claim it.
    pub async fn acquire(&self, role_id: &RoleId) -> TurnPermit {
        // Clone the Arc out so no DashMap guard is held across the await.
        let lock = self
            .locks
            .entry(role_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let guard = lock.lock_owned().await;

        TurnPermit {
            guard: Some(guard),
            role_id: role_id.clone(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of roles with a live lock entry.
    pub fn active_roles(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive right to run one chat turn for a role. Released on drop.
#[derive(Debug)]
pub struct TurnPermit {
    guard: Option<OwnedMutexGuard<()>>,
    role_id: RoleId,
    locks: Arc<DashMap<RoleId, Arc<Mutex<()>>>>,
}

impl Drop for TurnPermit {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.role_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_second_turn_waits_for_first() {
        let gate = TurnGate::new();
        let role = RoleId::new();

        let first = gate.acquire(&role).await;

        let gate2 = gate.clone();
        let role2 = role.clone();
        let mut waiter = tokio::spawn(async move {
            let _permit = gate2.acquire(&role2).await;
        });

        let blocked = tokio::time::timeout(Duration::from_millis(50), &mut waiter).await;
        assert!(blocked.is_err(), "second turn must wait");

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(gate.active_roles(), 0);
    }

    #[tokio::test]
    async fn test_different_roles_do_not_block() {
        let gate = TurnGate::new();
        let _a = gate.acquire(&RoleId::new()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), gate.acquire(&RoleId::new())).await;
        assert!(b.is_ok());
        assert_eq!(gate.active_roles(), 2);
    }

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let gate = TurnGate::new();
        let role = RoleId::new();
        drop(gate.acquire(&role).await);
        assert_eq!(gate.active_roles(), 0);
    }
}
