//! Per-patient serialization of local visit writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::{SyncError, SyncResult};

/// Async locks keyed by patient UUID, shared by every component that writes
/// a patient's visits.
///
/// An entry lives only while some task holds or awaits its lock.
#[derive(Debug, Default)]
pub struct PatientLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PatientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a patient's visits.
    pub async fn lock(&self, patient_uuid: &str) -> SyncResult<PatientGuard<'_>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| SyncError::LockPoisoned(e.to_string()))?;
            Arc::clone(locks.entry(patient_uuid.to_string()).or_default())
        };

        let guard = lock.lock_owned().await;
        Ok(PatientGuard {
            locks: self,
            patient_uuid: patient_uuid.to_string(),
            guard: Some(guard),
        })
    }

    /// Number of patients with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the entry once no task holds or awaits it.
    fn release(&self, patient_uuid: &str) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        if locks
            .get(patient_uuid)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(patient_uuid);
        }
    }
}

/// Held while a patient's visits are being written.
pub struct PatientGuard<'a> {
    locks: &'a PatientLocks,
    patient_uuid: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PatientGuard<'_> {
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts as a holder.
        self.guard.take();
        self.locks.release(&self.patient_uuid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_pruned_after_release() {
        let locks = PatientLocks::new();
        {
            let _guard = locks.lock("patient-1").await.unwrap();
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_patients_do_not_block_each_other() {
        let locks = PatientLocks::new();
        let _a = locks.lock("patient-1").await.unwrap();
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("patient-2")).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_same_patient_waits() {
        let locks = Arc::new(PatientLocks::new());
        let guard = locks.lock("patient-1").await.unwrap();

        let waiting =
            tokio::time::timeout(Duration::from_millis(50), locks.lock("patient-1")).await;
        assert!(waiting.is_err());

        drop(guard);
        let _again = locks.lock("patient-1").await.unwrap();
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = Arc::new(PatientLocks::new());
        let guard = locks.lock("patient-1").await.unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("patient-1").await.unwrap();
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        // The waiter still holds a clone, so the entry survives the first release.
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
