//! Undo/redo history using compressed snapshots
//!
//! Two bounded stacks of full-session snapshots. Snapshots are
//! zstd-compressed serialized sessions; restoring is a full deserialize,
//! never an incremental diff.
//!
//! Consecutive snapshots must differ: a `record` whose serialized form is
//! identical to the top of the undo stack is a no-op, so no-op edits do
//! not grow the history. The first undo entry is the baseline state and is
//! never popped away.
//!
//! Continuous edits (typing) are coalesced through an explicit pending
//! commit token: each edit rearms the token, and it commits once after a
//! quiet period when the owner pumps [`HistoryManager::take_due`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::{EngineError, Result};

/// Default maximum undo depth
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Default quiet period before a pending edit commits
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(400);

/// One compressed full-session snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    compressed: Vec<u8>,
}

impl Snapshot {
    fn compress(session_json: &[u8]) -> Result<Self> {
        let compressed = zstd::encode_all(session_json, 3)
            .map_err(|e| EngineError::Compression(e.to_string()))?;
        Ok(Self { compressed })
    }

    fn decompress(&self) -> Result<Vec<u8>> {
        zstd::decode_all(&self.compressed[..]).map_err(|e| EngineError::Compression(e.to_string()))
    }
}

/// A pending debounced commit
#[derive(Debug, Clone)]
struct PendingCommit {
    reason: String,
    deadline: Instant,
}

/// Bounded undo/redo stacks over compressed session snapshots
pub struct HistoryManager {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    max_depth: usize,
    quiet_period: Duration,
    restoring: bool,
    pending: Option<PendingCommit>,
}

impl HistoryManager {
    /// Create a new history manager
    pub fn new(max_depth: usize, quiet_period: Duration) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
            quiet_period,
            restoring: false,
            pending: None,
        }
    }

    /// Whether a restore is in progress
    ///
    /// While set, `record` calls are suppressed; this prevents the
    /// deserialize side effects of undo/redo from corrupting the stacks.
    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Mark the start of a restore (suppresses `record`)
    pub fn begin_restore(&mut self) {
        self.restoring = true;
    }

    /// Mark the end of a restore
    pub fn end_restore(&mut self) {
        self.restoring = false;
    }

    /// Push a snapshot of the serialized session
    ///
    /// No-ops (returning `false`) while restoring, or when the snapshot is
    /// textually identical to the top of the undo stack. Otherwise pushes,
    /// clears the redo stack, and evicts the oldest entry on overflow.
    pub fn record(&mut self, session_json: &[u8], reason: &str) -> Result<bool> {
        if self.restoring {
            return Ok(false);
        }
        // An explicit commit covers anything still pending
        self.pending = None;

        let snapshot = Snapshot::compress(session_json)?;
        if self.undo.back() == Some(&snapshot) {
            return Ok(false);
        }

        log::debug!("history: record ({})", reason);
        self.undo.push_back(snapshot);
        self.redo.clear();
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
        Ok(true)
    }

    /// Step back one snapshot
    ///
    /// Returns the serialized session to restore, or `None` when only the
    /// baseline remains. The popped state moves to the redo stack.
    pub fn undo(&mut self) -> Result<Option<Vec<u8>>> {
        if self.undo.len() <= 1 {
            return Ok(None);
        }
        // Decompress the restore target before touching the stacks so a
        // corrupt snapshot leaves them consistent.
        let target = self.undo[self.undo.len() - 2].decompress()?;
        if let Some(popped) = self.undo.pop_back() {
            self.redo.push(popped);
        }
        Ok(Some(target))
    }

    /// Step forward one snapshot
    ///
    /// Returns the serialized session to restore, or `None` when the redo
    /// stack is empty.
    pub fn redo(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(snapshot) = self.redo.last() else {
            return Ok(None);
        };
        let target = snapshot.decompress()?;
        if let Some(snapshot) = self.redo.pop() {
            self.undo.push_back(snapshot);
        }
        Ok(Some(target))
    }

    /// Whether undo is available
    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    /// Whether redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Current undo stack depth
    pub fn depth(&self) -> usize {
        self.undo.len()
    }

    /// Rearm the pending commit token
    ///
    /// Each call pushes the deadline out by the quiet period; the commit
    /// fires once via [`HistoryManager::take_due`] after edits go quiet.
    pub fn schedule(&mut self, reason: &str, now: Instant) {
        self.pending = Some(PendingCommit {
            reason: reason.to_string(),
            deadline: now + self.quiet_period,
        });
    }

    /// Whether a debounced commit is waiting
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending commit if its quiet period has elapsed
    ///
    /// The caller records a snapshot with the returned reason.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        if self.pending.as_ref()?.deadline <= now {
            self.pending.take().map(|p| p.reason)
        } else {
            None
        }
    }

    /// Total compressed size of all retained snapshots
    pub fn compressed_size(&self) -> usize {
        self.undo.iter().chain(self.redo.iter()).map(|s| s.compressed.len()).sum()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n: usize) -> Vec<u8> {
        format!("{{\"state\":{}}}", n).into_bytes()
    }

    fn manager() -> HistoryManager {
        HistoryManager::new(10, Duration::from_millis(100))
    }

    #[test]
    fn test_record_and_undo_redo() {
        let mut history = manager();
        history.record(&state(0), "baseline").unwrap();
        history.record(&state(1), "edit").unwrap();
        history.record(&state(2), "edit").unwrap();

        assert!(history.can_undo());
        let restored = history.undo().unwrap().unwrap();
        assert_eq!(restored, state(1));
        let restored = history.undo().unwrap().unwrap();
        assert_eq!(restored, state(0));

        // Baseline is never popped away
        assert!(history.undo().unwrap().is_none());

        let restored = history.redo().unwrap().unwrap();
        assert_eq!(restored, state(1));
        let restored = history.redo().unwrap().unwrap();
        assert_eq!(restored, state(2));
        assert!(history.redo().unwrap().is_none());
    }

    #[test]
    fn test_identical_snapshots_are_deduplicated() {
        let mut history = manager();
        assert!(history.record(&state(0), "baseline").unwrap());
        assert!(!history.record(&state(0), "no-op edit").unwrap());
        assert_eq!(history.depth(), 1);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = manager();
        history.record(&state(0), "baseline").unwrap();
        history.record(&state(1), "edit").unwrap();
        history.undo().unwrap();
        assert!(history.can_redo());

        history.record(&state(9), "new branch").unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = HistoryManager::new(5, Duration::from_millis(100));
        for n in 0..20 {
            history.record(&state(n), "edit").unwrap();
        }
        assert_eq!(history.depth(), 5);

        // Oldest entries were evicted first
        let mut oldest = None;
        while let Some(json) = history.undo().unwrap() {
            oldest = Some(json);
        }
        assert_eq!(oldest.unwrap(), state(15));
    }

    #[test]
    fn test_restoring_flag_suppresses_record() {
        let mut history = manager();
        history.record(&state(0), "baseline").unwrap();

        history.begin_restore();
        assert!(!history.record(&state(1), "side effect").unwrap());
        history.end_restore();

        assert_eq!(history.depth(), 1);
    }

    #[test]
    fn test_pending_commit_coalesces() {
        let mut history = manager();
        let start = Instant::now();

        history.schedule("typing", start);
        history.schedule("typing", start + Duration::from_millis(50));

        // Still inside the quiet period of the second edit
        assert!(history
            .take_due(start + Duration::from_millis(120))
            .is_none());

        let reason = history.take_due(start + Duration::from_millis(151));
        assert_eq!(reason.as_deref(), Some("typing"));
        assert!(!history.has_pending());
    }

    #[test]
    fn test_explicit_record_clears_pending() {
        let mut history = manager();
        let start = Instant::now();
        history.schedule("typing", start);
        history.record(&state(0), "structural edit").unwrap();
        assert!(!history.has_pending());
    }
}
