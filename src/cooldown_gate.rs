//! CooldownGate - Detection Admission Control
//!
//! Converts the raw motion signal into admitted detection events by
//! suppressing repeats inside a configurable window. The last-trigger
//! timestamp is the only shared mutable value; the monitor loop marks it
//! after a capture completes, never before, so a second admission cannot
//! occur while a recording is in flight. A failed recording still consumes
//! the window - this suppresses rapid retry storms against a broken camera.

use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default suppression window between admitted detections
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Pure admission decision
///
/// Admits iff the session is active and strictly more than `window` has
/// elapsed since the last admitted detection. A gate that has never fired
/// admits immediately.
pub fn admit(now: Instant, last: Option<Instant>, window: Duration, session_active: bool) -> bool {
    if !session_active {
        return false;
    }
    match last {
        None => true,
        Some(last) => now.duration_since(last) > window,
    }
}

/// CooldownGate instance
///
/// Single-writer discipline: only the monitor loop calls `mark`.
pub struct CooldownGate {
    window: Duration,
    last_trigger: RwLock<Option<Instant>>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_trigger: RwLock::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a detection at `now` would be admitted
    pub async fn admits(&self, now: Instant, session_active: bool) -> bool {
        let last = *self.last_trigger.read().await;
        admit(now, last, self.window, session_active)
    }

    /// Consume the window for an admitted detection
    ///
    /// Called once per admission, after the triggered work finished. The
    /// timestamp is monotonically non-decreasing.
    pub async fn mark(&self, now: Instant) {
        let mut last = self.last_trigger.write().await;
        *last = Some(match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }

    pub async fn last_trigger(&self) -> Option<Instant> {
        *self.last_trigger.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn admits_first_detection() {
        let base = Instant::now();
        assert!(admit(base, None, Duration::from_secs(30), true));
    }

    #[test]
    fn inactive_session_never_admits() {
        let base = Instant::now();
        assert!(!admit(base, None, Duration::from_secs(30), false));
        assert!(!admit(
            at(base, 120),
            Some(base),
            Duration::from_secs(30),
            false
        ));
    }

    #[test]
    fn window_boundary_is_strict() {
        let base = Instant::now();
        let window = Duration::from_secs(30);
        // Exactly the window has elapsed: still suppressed
        assert!(!admit(at(base, 30), Some(base), window, true));
        assert!(admit(
            at(base, 30) + Duration::from_millis(1),
            Some(base),
            window,
            true
        ));
    }

    #[test]
    fn repeated_signals_inside_window_yield_one_admission() {
        let base = Instant::now();
        let window = Duration::from_secs(30);

        let mut last = None;
        let mut admissions = 0;
        for secs in [0u64, 5, 10, 20] {
            let now = at(base, secs);
            if admit(now, last, window, true) {
                admissions += 1;
                last = Some(now);
            }
        }
        assert_eq!(admissions, 1);
    }

    #[test]
    fn gate_rearms_after_window() {
        let base = Instant::now();
        let window = Duration::from_secs(30);

        assert!(admit(base, None, window, true));
        assert!(admit(at(base, 31), Some(base), window, true));
    }

    #[tokio::test]
    async fn mark_is_monotonic() {
        let gate = CooldownGate::new(Duration::from_secs(30));
        let base = Instant::now();

        gate.mark(at(base, 10)).await;
        gate.mark(at(base, 5)).await;
        assert_eq!(gate.last_trigger().await, Some(at(base, 10)));
    }

    #[tokio::test]
    async fn gate_suppresses_until_marked_window_passes() {
        let gate = CooldownGate::new(Duration::from_secs(30));
        let base = Instant::now();

        assert!(gate.admits(base, true).await);
        gate.mark(base).await;
        assert!(!gate.admits(at(base, 10), true).await);
        assert!(gate.admits(at(base, 31), true).await);
    }
}
