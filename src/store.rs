//! Batch state
//!
//! One mutex guards everything a batch owns: the preview tiles (one slot per
//! submitted file, batch order) and the analysis records keyed by batch
//! index. Files are keyed by position, not name, since names may repeat
//! within a batch.
//!
//! Starting a new batch clears both synchronously and bumps a generation
//! counter. Every asynchronous write carries the generation it belongs to;
//! writes from a superseded batch are refused so a late pipeline completion
//! cannot land in a newer batch's slot.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::ExifSummary;

/// Completed analysis for one file of the current batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub file_name: String,
    pub summary: ExifSummary,
}

/// Counters a caller can poll to observe batch progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub generation: u64,
    pub files: usize,
    pub completed: usize,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct BatchState {
    generation: u64,
    submitted_at: Option<DateTime<Utc>>,
    tiles: Vec<String>,
    records: HashMap<usize, AnalysisRecord>,
}

/// Shared result store, lifetime of one batch.
pub struct BatchStore {
    inner: Mutex<BatchState>,
}

impl BatchStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BatchState::default()),
        }
    }

    /// Start a new batch of `size` files. Clears all prior tiles and
    /// records before returning and hands back the new generation id.
    pub fn begin_batch(&self, size: usize) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.submitted_at = Some(Utc::now());
        state.tiles = vec![String::new(); size];
        state.records.clear();
        state.generation
    }

    /// Replace the tile at `index`. Returns false when the write belongs to
    /// a superseded batch (or the index is out of range) and was dropped.
    pub fn set_tile(&self, generation: u64, index: usize, html: String) -> bool {
        let mut state = self.lock();
        if generation != state.generation || index >= state.tiles.len() {
            return false;
        }
        state.tiles[index] = html;
        true
    }

    /// Store the completed record for `index`, subject to the same
    /// generation guard as tiles.
    pub fn insert_record(&self, generation: u64, index: usize, record: AnalysisRecord) -> bool {
        let mut state = self.lock();
        if generation != state.generation || index >= state.tiles.len() {
            return false;
        }
        state.records.insert(index, record);
        true
    }

    pub fn record(&self, index: usize) -> Option<AnalysisRecord> {
        self.lock().records.get(&index).cloned()
    }

    /// All tiles in batch order as one fragment.
    pub fn tiles_html(&self) -> String {
        self.lock().tiles.join("\n")
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn status(&self) -> StoreStatus {
        let state = self.lock();
        StoreStatus {
            generation: state.generation,
            files: state.tiles.len(),
            completed: state.records.len(),
            submitted_at: state.submitted_at,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BatchState> {
        self.inner.lock().expect("batch state lock poisoned")
    }
}

impl Default for BatchStore {
    fn default() -> Self {
        Self::new()
    }
}
