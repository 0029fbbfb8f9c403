//! The fixed-size session pool.
//!
//! The pool holds N named actor slots and hands one to each new
//! conversation. Its scan is advisory only: two concurrent scans may pick
//! the same slot, and the actor's own claim operation resolves the race.
//! There is no wait-list; an exhausted pool is reported to the caller as a
//! retryable busy condition.

use std::sync::Arc;

use tracing::{debug, warn};

use valet_types::error::{PoolError, SessionError};

use crate::session::actor::{ActorStatus, SessionActor};

/// Fixed pool of session actors, scanned in slot order.
pub struct SessionPool {
    slots: Vec<Arc<SessionActor>>,
}

impl SessionPool {
    /// Build a pool of `size` actors named `session-0..session-(size-1)`.
    pub fn new(size: usize) -> Self {
        let slots = (0..size)
            .map(|i| Arc::new(SessionActor::new(format!("session-{i}"))))
            .collect();
        Self { slots }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Claim an actor for `session_id`.
    ///
    /// Probes slots in a fixed order and returns the first whose claim
    /// succeeds. A slot that reports busy is skipped; losing a claim race
    /// on one slot just moves the scan to the next. Returns
    /// `NoneAvailable` after a full scan with no winner.
    pub fn acquire(&self, session_id: &str) -> Result<Arc<SessionActor>, PoolError> {
        for slot in &self.slots {
            match slot.claim(session_id) {
                Ok(()) => {
                    debug!(actor = %slot.name(), session_id, "pool slot acquired");
                    return Ok(Arc::clone(slot));
                }
                Err(SessionError::ActorBusy) => continue,
                Err(err) => {
                    // A slot that cannot answer its probe is skipped, not
                    // treated as free.
                    warn!(actor = %slot.name(), error = %err, "skipping unprobeable slot");
                    continue;
                }
            }
        }
        Err(PoolError::NoneAvailable)
    }

    /// Status of every slot, in slot order.
    pub fn status(&self) -> Vec<ActorStatus> {
        self.slots.iter().map(|s| s.status()).collect()
    }

    /// Number of currently unclaimed slots.
    pub fn available(&self) -> usize {
        self.slots.iter().filter(|s| s.status().available).count()
    }
}
