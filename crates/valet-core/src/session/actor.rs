//! The per-conversation session actor state machine.
//!
//! An actor is an exclusive, reusable worker bound to at most one
//! conversation at a time. Its lifecycle loops through
//! `Unclaimed -> Claimed -> Active -> Unclaimed` with no terminal state.
//! The `occupied` flag is the linearization point for claims: a
//! compare-and-swap on it decides races between concurrent pool scans
//! without any lock spanning the whole pool.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::debug;

use valet_types::error::SessionError;

/// Lifecycle phase of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unclaimed,
    Claimed,
    Active,
}

/// Snapshot answered by the status probe.
#[derive(Debug, Clone, Serialize)]
pub struct ActorStatus {
    pub name: String,
    pub occupied: bool,
    pub session_id: Option<String>,
    pub available: bool,
}

struct Inner {
    phase: Phase,
    session_id: Option<String>,
}

/// One pooled session actor.
pub struct SessionActor {
    name: String,
    occupied: AtomicBool,
    inner: Mutex<Inner>,
}

impl SessionActor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            occupied: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                phase: Phase::Unclaimed,
                session_id: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind this actor to a session.
    ///
    /// Valid only from `Unclaimed`. The compare-and-swap on `occupied`
    /// decides concurrent claims; the loser gets `ActorBusy` with state
    /// unchanged and must retry against a different slot, never this one.
    pub fn claim(&self, session_id: &str) -> Result<(), SessionError> {
        if self
            .occupied
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::ActorBusy);
        }

        let mut inner = self.inner.lock().expect("actor state poisoned");
        inner.phase = Phase::Claimed;
        inner.session_id = Some(session_id.to_string());
        debug!(actor = %self.name, session_id, "actor claimed");
        Ok(())
    }

    /// Mark the persistent connection as established.
    ///
    /// Valid only from `Claimed`.
    pub fn open_connection(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().expect("actor state poisoned");
        if inner.phase != Phase::Claimed {
            return Err(SessionError::InvalidState { expected: "claimed" });
        }
        inner.phase = Phase::Active;
        Ok(())
    }

    /// Return this actor to the pool.
    ///
    /// Idempotent: the second call is a no-op. Invoked on connection close
    /// by any code path; the claim ordering guarantee comes from clearing
    /// `occupied` last, after the session binding is gone.
    pub fn release(&self) {
        let mut inner = self.inner.lock().expect("actor state poisoned");
        if inner.phase == Phase::Unclaimed {
            return;
        }
        let session_id = inner.session_id.take();
        inner.phase = Phase::Unclaimed;
        drop(inner);
        self.occupied.store(false, Ordering::Release);
        debug!(actor = %self.name, ?session_id, "actor released");
    }

    /// The bound session id, if any.
    pub fn session_id(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("actor state poisoned")
            .session_id
            .clone()
    }

    /// Answer the pool's status probe.
    pub fn status(&self) -> ActorStatus {
        let occupied = self.occupied.load(Ordering::Acquire);
        ActorStatus {
            name: self.name.clone(),
            occupied,
            session_id: self.session_id(),
            available: !occupied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    #[test]
    fn lifecycle_loops_back_to_unclaimed() {
        let actor = SessionActor::new("session-0");
        actor.claim("s1").unwrap();
        actor.open_connection().unwrap();
        assert_eq!(actor.session_id().as_deref(), Some("s1"));

        actor.release();
        assert!(actor.session_id().is_none());
        assert!(actor.status().available);

        // Reusable after release.
        actor.claim("s2").unwrap();
        assert_eq!(actor.session_id().as_deref(), Some("s2"));
    }

    #[test]
    fn second_claim_is_rejected_without_state_change() {
        let actor = SessionActor::new("session-0");
        actor.claim("s1").unwrap();
        assert_eq!(actor.claim("s2"), Err(SessionError::ActorBusy));
        assert_eq!(actor.session_id().as_deref(), Some("s1"));
    }

    #[test]
    fn open_connection_requires_claimed() {
        let actor = SessionActor::new("session-0");
        assert!(matches!(
            actor.open_connection(),
            Err(SessionError::InvalidState { expected: "claimed" })
        ));
    }

    #[test]
    fn release_is_idempotent() {
        let actor = SessionActor::new("session-0");
        actor.claim("s1").unwrap();
        actor.open_connection().unwrap();

        actor.release();
        let after_first = actor.status();
        actor.release();
        let after_second = actor.status();

        assert!(!after_first.occupied && !after_second.occupied);
        assert_eq!(after_first.session_id, after_second.session_id);
    }

    #[test]
    fn status_serializes_for_the_pool_endpoint() {
        let actor = SessionActor::new("session-0");
        actor.claim("s1").unwrap();

        let json = serde_json::to_value(actor.status()).unwrap();
        assert_eq!(json["name"], "session-0");
        assert_eq!(json["occupied"], true);
        assert_eq!(json["session_id"], "s1");
        assert_eq!(json["available"], false);
    }

    #[test]
    fn concurrent_claims_admit_exactly_one_winner() {
        let actor = Arc::new(SessionActor::new("session-0"));
        let mut handles = Vec::new();
        for i in 0..8 {
            let actor = Arc::clone(&actor);
            handles.push(std::thread::spawn(move || {
                actor.claim(&format!("s{i}")).is_ok()
            }));
        }
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(wins, 1);
    }
}
