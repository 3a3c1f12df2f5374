use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Extracting,
    Chunking,
    Embedding,
    Persisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestProgress {
    pub stage: IngestStage,
    pub chunks_embedded: usize,
    pub chunks_total: usize,
}

/// Live progress of running ingests, keyed by ingest or upload id.
#[derive(Default)]
pub struct IngestProgressRegistry {
    entries: Arc<Mutex<HashMap<Uuid, IngestProgress>>>,
}

impl IngestProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, id: Uuid) -> ProgressHandle {
        self.write(|entries| {
            entries.insert(
                id,
                IngestProgress {
                    stage: IngestStage::Extracting,
                    chunks_embedded: 0,
                    chunks_total: 0,
                },
            );
        });
        ProgressHandle {
            id,
            entries: self.entries.clone(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<IngestProgress> {
        self.entries
            .lock()
            .map(|entries| entries.get(&id).copied())
            .unwrap_or(None)
    }

    fn write(&self, update: impl FnOnce(&mut HashMap<Uuid, IngestProgress>)) {
        if let Ok(mut entries) = self.entries.lock() {
            update(&mut entries);
        }
    }
}

/// Updates one entry; removes it when dropped, so a finished, failed or
/// cancelled ingest stops reporting.
pub struct ProgressHandle {
    id: Uuid,
    entries: Arc<Mutex<HashMap<Uuid, IngestProgress>>>,
}

impl ProgressHandle {
    pub fn stage(&self, stage: IngestStage) {
        self.update(|progress| progress.stage = stage);
    }

    pub fn embedded(&self, done: usize, total: usize) {
        self.update(|progress| {
            progress.stage = IngestStage::Embedding;
            progress.chunks_embedded = done;
            progress.chunks_total = total;
        });
    }

    fn update(&self, apply: impl FnOnce(&mut IngestProgress)) {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(progress) = entries.get_mut(&self.id) {
                apply(progress);
            }
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lifecycle() {
        let registry = IngestProgressRegistry::new();
        let id = Uuid::new_v4();

        let handle = registry.track(id);
        assert_eq!(registry.get(id).unwrap().stage, IngestStage::Extracting);

        handle.embedded(4, 10);
        let progress = registry.get(id).unwrap();
        assert_eq!(progress.stage, IngestStage::Embedding);
        assert_eq!((progress.chunks_embedded, progress.chunks_total), (4, 10));

        drop(handle);
        assert!(registry.get(id).is_none());
    }
}
