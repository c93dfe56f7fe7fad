//! Process-wide shared resource loads
//!
//! Some processors depend on expensive external resources (a spell-check
//! dictionary, an OCR worker). A load is started once per process and
//! shared idempotently: the first trigger begins it, concurrent triggers
//! observe `Loading` and no-op until the completion lands. A failed load
//! is not retried automatically; the user re-triggers.
//!
//! # Example
//!
//! ```
//! use graph_engine::resource::{ResourceState, SharedResource};
//!
//! static DICTIONARY: SharedResource<Vec<String>> = SharedResource::new();
//!
//! if DICTIONARY.begin_load() {
//!     // ... kick off the real load; later:
//!     DICTIONARY.complete(vec!["hello".to_string()]);
//! }
//! assert!(matches!(DICTIONARY.state(), ResourceState::Ready));
//! ```

use std::sync::{Arc, Mutex};

/// Lifecycle of a shared resource load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// No load has been started
    Idle,
    /// A load is in flight
    Loading,
    /// The resource is available
    Ready,
    /// The last load failed; a new trigger may start over
    Failed,
}

enum Slot<T> {
    Idle,
    Loading,
    Ready(Arc<T>),
    Failed(String),
}

/// A process-wide, once-only loaded resource
pub struct SharedResource<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> SharedResource<T> {
    /// Create an empty resource holder (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
        }
    }

    /// Claim the load if nobody has started it
    ///
    /// Returns `true` exactly once per load attempt: the caller that gets
    /// `true` performs the load and must call [`SharedResource::complete`]
    /// or [`SharedResource::fail`]. Callers that get `false` either wait
    /// on `Loading` or already have the value. A prior failure is cleared
    /// and the load starts over.
    pub fn begin_load(&self) -> bool {
        let mut slot = self.slot.lock().unwrap();
        match *slot {
            Slot::Idle | Slot::Failed(_) => {
                *slot = Slot::Loading;
                true
            }
            Slot::Loading | Slot::Ready(_) => false,
        }
    }

    /// Store the loaded value
    pub fn complete(&self, value: T) {
        *self.slot.lock().unwrap() = Slot::Ready(Arc::new(value));
    }

    /// Record a load failure
    pub fn fail(&self, message: impl Into<String>) {
        *self.slot.lock().unwrap() = Slot::Failed(message.into());
    }

    /// Get the loaded value, if ready
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.slot.lock().unwrap() {
            Slot::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The current lifecycle state
    pub fn state(&self) -> ResourceState {
        match &*self.slot.lock().unwrap() {
            Slot::Idle => ResourceState::Idle,
            Slot::Loading => ResourceState::Loading,
            Slot::Ready(_) => ResourceState::Ready,
            Slot::Failed(_) => ResourceState::Failed,
        }
    }

    /// The failure message of the last load, if it failed
    pub fn failure(&self) -> Option<String> {
        match &*self.slot.lock().unwrap() {
            Slot::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }
}

impl<T> Default for SharedResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_trigger_begins_load() {
        let resource: SharedResource<u32> = SharedResource::new();
        assert!(resource.begin_load());
        assert!(!resource.begin_load());
        assert_eq!(resource.state(), ResourceState::Loading);
    }

    #[test]
    fn test_completion_is_shared() {
        let resource: SharedResource<u32> = SharedResource::new();
        assert!(resource.begin_load());
        resource.complete(42);

        assert!(!resource.begin_load());
        assert_eq!(*resource.get().unwrap(), 42);
        assert_eq!(resource.state(), ResourceState::Ready);
    }

    #[test]
    fn test_failure_allows_retrigger() {
        let resource: SharedResource<u32> = SharedResource::new();
        assert!(resource.begin_load());
        resource.fail("worker crashed");

        assert_eq!(resource.state(), ResourceState::Failed);
        assert_eq!(resource.failure().as_deref(), Some("worker crashed"));

        // The user re-triggers; the load starts over
        assert!(resource.begin_load());
        assert_eq!(resource.state(), ResourceState::Loading);
    }
}
