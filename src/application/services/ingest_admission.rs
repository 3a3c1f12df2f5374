use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::application::errors::KnowledgeError;

/// Bounds the number of ingests admitted at once, running or waiting on the
/// embedding semaphore. Beyond that depth callers are turned away.
pub struct IngestAdmission {
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl IngestAdmission {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// The slot is released when the permit drops, including on cancellation.
    pub fn try_admit(&self) -> Result<OwnedSemaphorePermit, KnowledgeError> {
        self.slots.clone().try_acquire_owned().map_err(|_| {
            tracing::warn!("Ingest rejected: {} ingests already admitted", self.capacity);
            KnowledgeError::Overloaded
        })
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_beyond_capacity_and_recovers() {
        let admission = IngestAdmission::new(2);

        let first = admission.try_admit().unwrap();
        let _second = admission.try_admit().unwrap();
        assert_eq!(admission.in_flight(), 2);
        assert!(matches!(admission.try_admit(), Err(KnowledgeError::Overloaded)));

        drop(first);
        assert!(admission.try_admit().is_ok());
    }
}
