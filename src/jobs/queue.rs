//! Render queue state management with persistence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::{RenderQueueEntry, RenderQueueStatus};

/// Persistent queue state (saved to queue.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueueState {
    /// Queue format version.
    version: u32,
    /// Jobs in queue order.
    jobs: Vec<RenderQueueEntry>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            version: 1,
            jobs: Vec::new(),
        }
    }
}

/// In-memory render queue with persistence to the temp folder.
#[derive(Debug)]
pub struct RenderQueue {
    /// Jobs in queue order.
    jobs: Vec<RenderQueueEntry>,
    /// Path to queue.json for persistence.
    queue_file: PathBuf,
}

impl RenderQueue {
    /// Create a queue with persistence to the given temp folder, loading
    /// any previously saved state.
    pub fn new(temp_folder: &Path) -> Self {
        let queue_file = temp_folder.join("queue.json");

        let jobs = if queue_file.exists() {
            match fs::read_to_string(&queue_file) {
                Ok(content) => match serde_json::from_str::<QueueState>(&content) {
                    Ok(state) => {
                        tracing::info!("Loaded {} jobs from queue.json", state.jobs.len());
                        state.jobs
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse queue.json: {}", e);
                        Vec::new()
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read queue.json: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self { jobs, queue_file }
    }

    /// Create a queue without persistence (for testing).
    pub fn in_memory() -> Self {
        Self {
            jobs: Vec::new(),
            queue_file: PathBuf::new(),
        }
    }

    /// Persist queue to disk (atomic temp + rename).
    pub fn save(&self) -> Result<(), std::io::Error> {
        if self.queue_file.as_os_str().is_empty() {
            return Ok(()); // In-memory queue, nothing to save
        }

        if let Some(parent) = self.queue_file.parent() {
            fs::create_dir_all(parent)?;
        }

        let state = QueueState {
            version: 1,
            jobs: self.jobs.clone(),
        };

        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        let temp_file = self.queue_file.with_extension("json.tmp");
        fs::write(&temp_file, &json)?;
        fs::rename(&temp_file, &self.queue_file)?;

        tracing::debug!("Saved {} jobs to queue.json", self.jobs.len());
        Ok(())
    }

    /// Get all jobs.
    pub fn jobs(&self) -> &[RenderQueueEntry] {
        &self.jobs
    }

    /// Jobs still waiting to run.
    pub fn queued_jobs(&self) -> Vec<&RenderQueueEntry> {
        self.jobs
            .iter()
            .filter(|j| j.status == RenderQueueStatus::Queued)
            .collect()
    }

    /// Get a job by index.
    pub fn get(&self, index: usize) -> Option<&RenderQueueEntry> {
        self.jobs.get(index)
    }

    /// Get a job by ID.
    pub fn get_by_id(&self, id: &str) -> Option<&RenderQueueEntry> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Get a mutable job by ID.
    pub fn get_by_id_mut(&mut self, id: &str) -> Option<&mut RenderQueueEntry> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Append a job to the queue.
    pub fn add(&mut self, entry: RenderQueueEntry) {
        self.jobs.push(entry);
    }

    /// Remove a job by ID. Returns the removed entry.
    pub fn remove_by_id(&mut self, id: &str) -> Option<RenderQueueEntry> {
        let index = self.jobs.iter().position(|j| j.id == id)?;
        Some(self.jobs.remove(index))
    }

    /// Number of jobs in queue.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// True when the queue holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RenderRequest, VoiceParams};
    use tempfile::tempdir;

    fn entry(id: &str) -> RenderQueueEntry {
        RenderQueueEntry::new(
            id.to_string(),
            format!("job_{}", id),
            RenderRequest::new(
                "hello world",
                VoiceParams::new("mark"),
                "/bg.mp4",
                format!("{}.mp4", id),
            ),
        )
    }

    #[test]
    fn queue_round_trips_through_disk() {
        let dir = tempdir().unwrap();

        {
            let mut queue = RenderQueue::new(dir.path());
            queue.add(entry("a"));
            queue.add(entry("b"));
            queue.save().unwrap();
        }

        let queue = RenderQueue::new(dir.path());
        assert_eq!(queue.len(), 2);
        assert!(queue.get_by_id("a").is_some());
        assert!(queue.get_by_id("b").is_some());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let mut queue = RenderQueue::new(dir.path());
        queue.add(entry("a"));
        queue.save().unwrap();

        assert!(!dir.path().join("queue.json.tmp").exists());
        assert!(dir.path().join("queue.json").exists());
    }

    #[test]
    fn corrupt_queue_file_loads_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("queue.json"), "{not json").unwrap();

        let queue = RenderQueue::new(dir.path());
        assert!(queue.is_empty());
    }

    #[test]
    fn queued_jobs_filters_by_status() {
        let mut queue = RenderQueue::in_memory();
        queue.add(entry("a"));
        queue.add(entry("b"));
        queue
            .get_by_id_mut("a")
            .unwrap()
            .mark_complete(PathBuf::from("/out/a.mp4"));

        let queued = queue.queued_jobs();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].id, "b");
    }

    #[test]
    fn remove_by_id_works() {
        let mut queue = RenderQueue::in_memory();
        queue.add(entry("a"));
        assert!(queue.remove_by_id("a").is_some());
        assert!(queue.remove_by_id("a").is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn in_memory_queue_save_is_a_noop() {
        let queue = RenderQueue::in_memory();
        queue.save().unwrap();
    }
}
