//! Async shell around [`Core`]: the shared handle and per-match tick drivers.
//!
//! The core itself is synchronous; this module owns the `Arc<Mutex<_>>`
//! sharing and the tokio tasks. One task per active match wakes at the
//! configured tick period and advances that match by exactly one tick,
//! holding the lock only for the duration of the `tick_match` call. The
//! driver exits when the match reports a terminal outcome or has been torn
//! down by a forfeit.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use arena_wire::{ClientEvent, ServerEvent};

use crate::session::{Outbound, SessionId};
use crate::{Core, MatchId, StateError};

/// Cloneable handle to the orchestration core, used by transport adapters.
#[derive(Clone)]
pub struct SharedCore {
    core: Arc<Mutex<Core>>,
    tick_period: Duration,
}

impl SharedCore {
    pub fn new(core: Core) -> Self {
        let tick_period = core.config().tick_period;
        Self {
            core: Arc::new(Mutex::new(core)),
            tick_period,
        }
    }

    /// Register a session. On a duplicate glyph the refusal is sent down
    /// the would-be session's own channel before the error is returned, so
    /// the client sees why it was rejected.
    pub fn connect(&self, glyph: &str, outbound: Outbound) -> Result<SessionId, StateError> {
        let result = self.core.lock().connect(glyph, outbound.clone());
        if let Err(ref conflict) = result {
            let _ = outbound.try_send(ServerEvent::Error {
                message: conflict.to_string(),
            });
        }
        result
    }

    pub fn disconnect(&self, id: SessionId) {
        self.core.lock().disconnect(id);
    }

    /// Dispatch one decoded client event and spawn tick drivers for any
    /// matches it started. Must run inside a tokio runtime.
    pub fn handle_client_event(&self, id: SessionId, event: ClientEvent) {
        let started = self.core.lock().handle_event(id, event);
        for match_id in started {
            self.spawn_tick_driver(match_id);
        }
    }

    fn spawn_tick_driver(&self, match_id: MatchId) {
        let core = Arc::clone(&self.core);
        let period = self.tick_period;
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            // A stalled lock should not cause a burst of catch-up ticks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                if core.lock().tick_match(match_id) {
                    break;
                }
            }
            debug!(match_id, "tick driver stopped");
        });
    }
}
