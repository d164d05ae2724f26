//! MonitoringSession - Session Control Plane
//!
//! The on/off switch for monitoring, distinct from the always-running poll
//! loop. Mutated only through the explicit start/stop operations invoked by
//! the command frontend; the monitor loop reads it every tick and never
//! writes it. Active flag and destination are read under one lock so a
//! concurrent stop cannot leave an in-flight capture with a stale half of
//! the pair.

use crate::error::{Error, Result};
use serde::Serialize;
use tokio::sync::RwLock;

/// Session control state, read by the loop on each tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub active: bool,
    pub destination: Option<String>,
}

/// MonitoringSession instance
pub struct MonitoringSession {
    inner: RwLock<SessionState>,
}

impl MonitoringSession {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SessionState::default()),
        }
    }

    /// Activate monitoring toward `destination`
    ///
    /// Fails with a conflict when already active; the caller stops first.
    pub async fn start(&self, destination: String) -> Result<()> {
        let mut state = self.inner.write().await;
        if state.active {
            return Err(Error::Conflict("monitoring already active".to_string()));
        }
        state.active = true;
        state.destination = Some(destination);
        Ok(())
    }

    /// Deactivate monitoring; returns whether it was active
    ///
    /// A request, not a preemption: an in-flight capture runs to completion.
    pub async fn stop(&self) -> bool {
        let mut state = self.inner.write().await;
        let was_active = state.active;
        state.active = false;
        was_active
    }

    pub async fn is_active(&self) -> bool {
        self.inner.read().await.active
    }

    /// Consistent read of the full control state
    pub async fn state(&self) -> SessionState {
        self.inner.read().await.clone()
    }
}

impl Default for MonitoringSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_sets_active_and_destination() {
        let session = MonitoringSession::new();
        assert!(!session.is_active().await);

        session.start("https://hooks.example/abc".to_string()).await.unwrap();
        let state = session.state().await;
        assert!(state.active);
        assert_eq!(state.destination.as_deref(), Some("https://hooks.example/abc"));
    }

    #[tokio::test]
    async fn double_start_is_a_conflict() {
        let session = MonitoringSession::new();
        session.start("a".to_string()).await.unwrap();
        assert!(matches!(
            session.start("b".to_string()).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn stop_reports_previous_state() {
        let session = MonitoringSession::new();
        session.start("a".to_string()).await.unwrap();
        assert!(session.stop().await);
        assert!(!session.stop().await);
        assert!(!session.is_active().await);
    }
}
