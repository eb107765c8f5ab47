//! Per cohort-year serialization.
//!
//! Generation reads every teacher commitment of a cohort-year before writing
//! new entries, and an edit checks one teacher before applying. Both are
//! check-then-write sequences, so all writers of one cohort-year take the
//! same async mutex for the whole sequence.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::CohortYearId;

#[derive(Debug, Clone, Default)]
pub struct CohortLocks {
    locks: Arc<Mutex<HashMap<CohortYearId, Arc<AsyncMutex<()>>>>>,
}

impl CohortLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a cohort-year. Released on drop.
    pub async fn acquire(&self, cohort_year_id: CohortYearId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(cohort_year_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of cohort-years that have been locked at least once.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_cohort_is_exclusive() {
        let locks = CohortLocks::new();
        let guard = locks.acquire(CohortYearId(1)).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.acquire(CohortYearId(1)).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_cohorts_do_not_block() {
        let locks = CohortLocks::new();
        let _a = locks.acquire(CohortYearId(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire(CohortYearId(2))).await;
        assert!(b.is_ok());
        assert_eq!(locks.tracked(), 2);
    }
}
