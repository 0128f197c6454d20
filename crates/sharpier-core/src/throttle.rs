//! Per-directory warm-up cooldown.

use crate::clock::Clock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Gate that lets a directory through at most once per window.
///
/// Every admitted attempt records its timestamp before any work starts, so a
/// burst of edit events for one directory results in a single query.
pub struct WarmupThrottle {
    window_millis: i64,
    clock: Arc<dyn Clock>,
    last_warmed: Mutex<HashMap<PathBuf, i64>>,
}

impl WarmupThrottle {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window_millis: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
            clock,
            last_warmed: Mutex::new(HashMap::new()),
        }
    }

    /// Admit `directory` if its window has elapsed, recording the attempt.
    ///
    /// Directories never seen before count as last warmed at time zero.
    pub fn try_acquire(&self, directory: &Path) -> bool {
        let now = self.clock.now_millis();
        let mut last_warmed = self
            .last_warmed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let last = last_warmed.get(directory).copied().unwrap_or(0);
        if now.saturating_sub(last) < self.window_millis {
            return false;
        }

        last_warmed.insert(directory.to_path_buf(), now);
        true
    }

    /// Timestamp of the last admitted attempt, if any.
    pub fn last_warmed(&self, directory: &Path) -> Option<i64> {
        self.last_warmed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(directory)
            .copied()
    }

    /// Forget every directory.
    pub fn reset(&self) {
        self.last_warmed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.last_warmed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const START: i64 = 1_700_000_000_000;

    fn throttle() -> (WarmupThrottle, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let throttle = WarmupThrottle::new(Duration::from_millis(5000), clock.clone());
        (throttle, clock)
    }

    #[test]
    fn test_first_attempt_is_admitted() {
        let (throttle, _) = throttle();
        assert!(throttle.try_acquire(Path::new("/repo/src")));
        assert_eq!(throttle.last_warmed(Path::new("/repo/src")), Some(START));
    }

    #[test]
    fn test_repeat_within_window_is_rejected() {
        let (throttle, clock) = throttle();
        let dir = Path::new("/repo/src");

        assert!(throttle.try_acquire(dir));
        clock.advance(4_999);
        assert!(!throttle.try_acquire(dir));
        // Rejected attempts do not move the window.
        assert_eq!(throttle.last_warmed(dir), Some(START));

        clock.advance(1);
        assert!(throttle.try_acquire(dir));
        assert_eq!(throttle.last_warmed(dir), Some(START + 5_000));
    }

    #[test]
    fn test_directories_are_independent() {
        let (throttle, _) = throttle();
        assert!(throttle.try_acquire(Path::new("/a")));
        assert!(throttle.try_acquire(Path::new("/b")));
        assert!(!throttle.try_acquire(Path::new("/a")));
        assert_eq!(throttle.len(), 2);
    }

    #[test]
    fn test_reset_forgets_directories() {
        let (throttle, _) = throttle();
        let dir = Path::new("/repo");
        assert!(throttle.try_acquire(dir));
        throttle.reset();
        assert!(throttle.is_empty());
        assert!(throttle.try_acquire(dir));
    }
}
