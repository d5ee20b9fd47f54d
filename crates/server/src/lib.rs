//! Arena Orchestration Core
//!
//! This crate hosts the server-side match orchestration engine: the session
//! registry, the lobby aggregator, the FIFO matchmaking queue and the
//! per-match tick runtime, all behind one mutual-exclusion domain.
//!
//! # Architecture
//!
//! [`Core`] is a plain synchronous state machine. Every externally triggered
//! operation (connect, disconnect, client event, match tick) is one method
//! call that runs to completion under the caller's lock; there is no
//! interior concurrency. The async shell in [`runtime`] wraps the core in
//! `Arc<parking_lot::Mutex>` and spawns one tokio task per active match to
//! drive its tick loop.
//!
//! Outbound delivery never blocks the core: each session registers a bounded
//! `mpsc` sender and all sends are `try_send`. A full or closed channel is
//! treated as a disconnect and reaped before the triggering operation
//! returns, so one stalled subscriber cannot hold up a tick.
//!
//! Transport framing (websocket, socket.io or otherwise) is an external
//! collaborator; the boundary of this crate is [`Core::handle_event`] plus
//! the per-session outbound receiver.

#![deny(unsafe_code)]

pub mod ledger;
pub mod lobby;
pub mod match_runtime;
pub mod matchmaking;
pub mod runtime;
pub mod session;

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use arena_sim::{ConfigError, Direction, Game, MatchConfig, Outcome, PlayerSlot};
use arena_wire::{ClientEvent, GameState, PlayerView, ServerEvent};

use crate::ledger::{MemoryLedger, PointsLedger};
use crate::match_runtime::{MatchPhase, MatchRuntime};
use crate::matchmaking::MatchQueue;
use crate::session::{Outbound, Registry, SessionId, Status};

// ============================================================================
// Configuration
// ============================================================================

/// Match identifier (server-internal, never on the wire).
pub type MatchId = u64;

/// Default tick period. Roughly 6.7 simulation steps per second.
pub const TICK_PERIOD_MS: u64 = 150;

/// Reward credited to the winner of a match.
pub const WIN_POINTS: u32 = 3;

/// Per-session outbound queue depth. At the default tick period this is
/// several seconds of match traffic; a client further behind than that is
/// treated as gone.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Server-owned orchestration settings. Clients never supply any of these.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Template for every match; the per-match seed is derived from the
    /// template seed and the match id.
    pub match_config: MatchConfig,
    pub tick_period: Duration,
    pub win_points: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            tick_period: Duration::from_millis(TICK_PERIOD_MS),
            win_points: WIN_POINTS,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// State conflicts surfaced to the offending client as `error` events.
/// Never fatal for the connection or the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("avatar {0} is already connected")]
    DuplicateGlyphInUse(String),
    #[error("already searching for a game")]
    AlreadySearching,
    #[error("only idle players can search for a game")]
    NotIdle,
    #[error("not currently searching")]
    NotSearching,
    #[error("illegal status transition from {from:?} to {to:?}")]
    InvalidTransition { from: Status, to: Status },
    #[error("unknown session")]
    UnknownSession,
}

// ============================================================================
// Core
// ============================================================================

/// The orchestration state machine: registry, queue, active matches and the
/// points ledger, mutated only under one lock.
pub struct Core {
    config: CoreConfig,
    registry: Registry,
    queue: MatchQueue,
    matches: HashMap<MatchId, MatchRuntime>,
    next_match_id: MatchId,
    ledger: Box<dyn PointsLedger>,
    /// Sessions whose outbound queue failed during the current operation,
    /// reaped before the operation returns.
    dead: Vec<SessionId>,
}

impl Core {
    pub fn new(config: CoreConfig) -> Self {
        Self::with_ledger(config, Box::new(MemoryLedger::new()))
    }

    /// Construct with an externally supplied points ledger.
    pub fn with_ledger(config: CoreConfig, ledger: Box<dyn PointsLedger>) -> Self {
        Self {
            config,
            registry: Registry::new(),
            queue: MatchQueue::new(),
            matches: HashMap::new(),
            next_match_id: 1,
            ledger,
            dead: Vec::new(),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Register a new session under `glyph` with its outbound sender.
    ///
    /// The initial points balance comes from the ledger. On success every
    /// connected session (the new one included) receives a fresh lobby
    /// snapshot.
    pub fn connect(&mut self, glyph: &str, outbound: Outbound) -> Result<SessionId, StateError> {
        let points = self.ledger.balance(glyph);
        let id = self.registry.register(glyph, points, outbound)?;
        info!(id, glyph, "session joined the lobby");
        self.broadcast_lobby();
        self.reap();
        Ok(id)
    }

    /// Idempotent re-activation of a live session. The observed client
    /// re-emits `join_lobby` on reconnect and on visibility changes; the
    /// response is a fresh snapshot push, not an error.
    pub fn rejoin(&mut self, id: SessionId) -> Result<(), StateError> {
        if !self.registry.contains(id) {
            return Err(StateError::UnknownSession);
        }
        let snapshot = lobby::build_snapshot(&self.registry, &self.queue, &self.matches);
        self.send_to(id, ServerEvent::UpdateLobbyState(snapshot));
        self.reap();
        Ok(())
    }

    /// Tear down a session: queue removal, match forfeit, lobby rebroadcast.
    pub fn disconnect(&mut self, id: SessionId) {
        self.disconnect_inner(id);
        self.broadcast_lobby();
        self.reap();
    }

    fn disconnect_inner(&mut self, id: SessionId) {
        let Some(session) = self.registry.deregister(id) else {
            return;
        };
        self.queue.remove(id);
        info!(id, glyph = %session.glyph, "session disconnected");
        if let Some(match_id) = session.match_id {
            self.forfeit(match_id, id);
        }
    }

    /// Resolve a match whose participant dropped mid-game: immediate win
    /// for the remainder, no grace period. The survivor is notified with
    /// `player_disconnected` rather than `game_over`.
    fn forfeit(&mut self, match_id: MatchId, leaver: SessionId) {
        let Some(runtime) = self.matches.remove(&match_id) else {
            return;
        };
        let Some(survivor) = runtime.participants.into_iter().find(|&p| p != leaver) else {
            return;
        };
        let live = self
            .registry
            .get(survivor)
            .filter(|s| !s.outbound.is_closed());
        let Some(glyph) = live.map(|s| s.glyph.clone()) else {
            info!(match_id, "both participants gone, match discarded");
            if self.registry.contains(survivor) {
                self.dead.push(survivor);
            }
            return;
        };
        self.ledger.credit(&glyph, self.config.win_points);
        self.refresh_points(survivor, &glyph);
        self.release_from_combat(survivor);
        self.send_to(survivor, ServerEvent::PlayerDisconnected);
        info!(match_id, winner = %glyph, "match forfeited by disconnect");
    }

    // ------------------------------------------------------------------
    // Matchmaking
    // ------------------------------------------------------------------

    /// Enter the matchmaking queue, then pair as many waiting searchers as
    /// possible. Returns the ids of matches started by this call; the async
    /// shell spawns a tick driver for each.
    pub fn search(&mut self, id: SessionId) -> Result<Vec<MatchId>, StateError> {
        let status = self
            .registry
            .get(id)
            .ok_or(StateError::UnknownSession)?
            .status;
        match status {
            Status::Idle => {}
            Status::Searching => return Err(StateError::AlreadySearching),
            _ => return Err(StateError::NotIdle),
        }
        self.registry.set_status(id, Status::Searching)?;
        self.queue.enqueue(id);
        self.send_to(id, ServerEvent::SearchingStarted);

        let started = self.pair_all();
        self.broadcast_lobby();
        self.reap();
        Ok(started)
    }

    /// Leave the matchmaking queue. `NotSearching` if the entry was already
    /// consumed; a cancel that loses the race to pairing never unwinds the
    /// match.
    pub fn cancel_search(&mut self, id: SessionId) -> Result<(), StateError> {
        if !self.registry.contains(id) {
            return Err(StateError::UnknownSession);
        }
        if !self.queue.remove(id) {
            return Err(StateError::NotSearching);
        }
        self.registry.set_status(id, Status::Idle)?;
        self.send_to(id, ServerEvent::SearchCancelled);
        self.broadcast_lobby();
        self.reap();
        Ok(())
    }

    /// Pair the two oldest searchers while at least two are queued.
    fn pair_all(&mut self) -> Vec<MatchId> {
        let mut started = Vec::new();
        while let Some((first, second)) = self.queue.pop_pair() {
            debug_assert_ne!(first, second);
            match self.start_match(first, second) {
                Ok(match_id) => started.push(match_id),
                Err(fault) => {
                    error!(%fault, "match construction refused");
                    for id in [first, second] {
                        let _ = self.registry.set_status(id, Status::Idle);
                        self.send_to(
                            id,
                            ServerEvent::Error {
                                message: fault.to_string(),
                            },
                        );
                    }
                }
            }
        }
        started
    }

    fn start_match(&mut self, first: SessionId, second: SessionId) -> Result<MatchId, ConfigError> {
        let match_id = self.next_match_id;
        let config = MatchConfig {
            seed: self.config.match_config.seed.wrapping_add(match_id),
            ..self.config.match_config
        };
        let game = Game::new(config)?;
        self.next_match_id += 1;

        let mut runtime = MatchRuntime::new(match_id, [first, second], game);
        for id in [first, second] {
            let prior = self.registry.set_status(id, Status::InCombat);
            debug_assert_eq!(prior, Ok(Status::Searching));
            if let Some(session) = self.registry.get_mut(id) {
                session.match_id = Some(match_id);
            }
        }

        // Each participant sees itself first; cell data is identical.
        let sends: Vec<(SessionId, ServerEvent)> = PlayerSlot::BOTH
            .into_iter()
            .map(|slot| {
                (
                    runtime.participants[slot.index()],
                    ServerEvent::GameStarted(self.game_state(&runtime, Some(slot))),
                )
            })
            .collect();
        runtime.phase = MatchPhase::Running;
        self.matches.insert(match_id, runtime);
        for (id, event) in sends {
            self.send_to(id, event);
        }
        info!(match_id, first, second, "match started");
        Ok(match_id)
    }

    // ------------------------------------------------------------------
    // Match engine
    // ------------------------------------------------------------------

    /// Buffer the latest direction for a running match. Input outside an
    /// active match is a protocol violation: dropped and logged, never
    /// acked or erred.
    pub fn player_input(&mut self, id: SessionId, direction: Direction) {
        let Some(session) = self.registry.get(id) else {
            return;
        };
        let Some(match_id) = session.match_id else {
            debug!(id, "player_input without an active match dropped");
            return;
        };
        if let Some(runtime) = self.matches.get_mut(&match_id)
            && runtime.phase == MatchPhase::Running
        {
            runtime.buffer_input(id, direction);
        }
    }

    /// Advance one match by one tick and broadcast the result. Returns
    /// `true` when the driver should stop: terminal outcome reached, or the
    /// match is already gone (forfeited).
    pub fn tick_match(&mut self, match_id: MatchId) -> bool {
        let outcome = {
            let Some(runtime) = self.matches.get_mut(&match_id) else {
                return true;
            };
            if runtime.phase != MatchPhase::Running {
                return true;
            }
            let inputs = runtime.take_inputs();
            runtime.game.advance(inputs)
        };

        let stop = if outcome.is_terminal() {
            self.finish_match(match_id, outcome);
            true
        } else {
            self.broadcast_match_state(match_id);
            false
        };
        self.reap();
        stop
    }

    fn finish_match(&mut self, match_id: MatchId, outcome: Outcome) {
        let Some(mut runtime) = self.matches.remove(&match_id) else {
            return;
        };
        runtime.phase = MatchPhase::Finished;

        let (winner, points_won) = match outcome {
            Outcome::Win(slot) => {
                let id = runtime.participants[slot.index()];
                match self.registry.get(id).map(|s| s.glyph.clone()) {
                    Some(glyph) => {
                        self.ledger.credit(&glyph, self.config.win_points);
                        self.refresh_points(id, &glyph);
                        (Some(glyph), Some(self.config.win_points))
                    }
                    None => (None, None),
                }
            }
            _ => (None, None),
        };
        info!(
            match_id,
            winner = winner.as_deref().unwrap_or("(draw)"),
            tick = runtime.game.tick(),
            "match finished"
        );

        let mut sends = Vec::new();
        for slot in PlayerSlot::BOTH {
            let state = self.game_state(&runtime, Some(slot));
            sends.push((
                runtime.participants[slot.index()],
                ServerEvent::GameOver {
                    winner: winner.clone(),
                    players: state.players,
                    points_won,
                },
            ));
        }
        let neutral = self.game_state(&runtime, None);
        for id in self.spectator_ids() {
            sends.push((
                id,
                ServerEvent::GameOver {
                    winner: winner.clone(),
                    players: neutral.players.clone(),
                    points_won,
                },
            ));
        }

        for slot in PlayerSlot::BOTH {
            self.release_from_combat(runtime.participants[slot.index()]);
        }
        for (id, event) in sends {
            self.send_to(id, event);
        }
        self.broadcast_lobby();
    }

    fn broadcast_match_state(&mut self, match_id: MatchId) {
        let Some(runtime) = self.matches.get(&match_id) else {
            return;
        };
        let mut sends = Vec::new();
        for slot in PlayerSlot::BOTH {
            sends.push((
                runtime.participants[slot.index()],
                ServerEvent::GameUpdate(self.game_state(runtime, Some(slot))),
            ));
        }
        let neutral = self.game_state(runtime, None);
        for id in self.spectator_ids() {
            sends.push((id, ServerEvent::GameUpdate(neutral.clone())));
        }
        for (id, event) in sends {
            self.send_to(id, event);
        }
    }

    /// Wire-shape one match state. `viewer` mirrors the players array so a
    /// participant sees itself first; `None` keeps slot order (spectators).
    fn game_state(&self, runtime: &MatchRuntime, viewer: Option<PlayerSlot>) -> GameState {
        let snapshot = runtime.game.snapshot();
        let order = match viewer {
            Some(PlayerSlot::Two) => [PlayerSlot::Two, PlayerSlot::One],
            _ => [PlayerSlot::One, PlayerSlot::Two],
        };
        let players = order
            .into_iter()
            .map(|slot| {
                let snake = &snapshot.players[slot.index()];
                let glyph = self
                    .registry
                    .get(runtime.participants[slot.index()])
                    .map(|s| s.glyph.clone())
                    .unwrap_or_default();
                PlayerView {
                    glyph,
                    snake: snake.cells.iter().map(|&c| c.into()).collect(),
                    alive: snake.alive,
                    score: snake.score,
                }
            })
            .collect();
        GameState {
            players,
            food: snapshot.food.into(),
        }
    }

    // ------------------------------------------------------------------
    // Event dispatch
    // ------------------------------------------------------------------

    /// Dispatch one decoded client event. Returns the ids of matches the
    /// event started, for the async shell to drive.
    pub fn handle_event(&mut self, id: SessionId, event: ClientEvent) -> Vec<MatchId> {
        match event {
            ClientEvent::JoinLobby { .. } => {
                if let Err(conflict) = self.rejoin(id) {
                    debug!(id, %conflict, "join_lobby from unknown session dropped");
                }
                Vec::new()
            }
            ClientEvent::SearchForGame => match self.search(id) {
                Ok(started) => started,
                Err(conflict) => {
                    self.report_state_error(id, conflict);
                    Vec::new()
                }
            },
            ClientEvent::CancelSearch => {
                if let Err(conflict) = self.cancel_search(id) {
                    self.report_state_error(id, conflict);
                }
                Vec::new()
            }
            ClientEvent::PlayerInput { direction } => {
                self.player_input(id, direction.into());
                Vec::new()
            }
        }
    }

    fn report_state_error(&mut self, id: SessionId, conflict: StateError) {
        debug!(id, %conflict, "state conflict");
        self.send_to(
            id,
            ServerEvent::Error {
                message: conflict.to_string(),
            },
        );
        self.reap();
    }

    // ------------------------------------------------------------------
    // Delivery
    // ------------------------------------------------------------------

    fn spectator_ids(&self) -> Vec<SessionId> {
        self.registry
            .iter()
            .filter(|s| s.status == Status::Spectating)
            .map(|s| s.id)
            .collect()
    }

    fn send_to(&mut self, id: SessionId, event: ServerEvent) {
        let Some(session) = self.registry.get(id) else {
            return;
        };
        if session.outbound.try_send(event).is_err() {
            warn!(id, "outbound queue unavailable, dropping session");
            self.dead.push(id);
        }
    }

    fn broadcast_lobby(&mut self) {
        let snapshot = lobby::build_snapshot(&self.registry, &self.queue, &self.matches);
        let ids: Vec<SessionId> = self.registry.iter().map(|s| s.id).collect();
        for id in ids {
            self.send_to(id, ServerEvent::UpdateLobbyState(snapshot.clone()));
        }
    }

    /// Disconnect every session whose outbound queue failed during the
    /// current operation. Terminates: each pass removes at least one live
    /// session or finds nothing left to remove.
    fn reap(&mut self) {
        while !self.dead.is_empty() {
            let dead = std::mem::take(&mut self.dead);
            let mut removed_any = false;
            for id in dead {
                if self.registry.contains(id) {
                    self.disconnect_inner(id);
                    removed_any = true;
                }
            }
            if removed_any {
                self.broadcast_lobby();
            }
        }
    }

    fn refresh_points(&mut self, id: SessionId, glyph: &str) {
        let balance = self.ledger.balance(glyph);
        if let Some(session) = self.registry.get_mut(id) {
            session.points = balance;
        }
    }

    fn release_from_combat(&mut self, id: SessionId) {
        if self.registry.set_status(id, Status::Idle).is_ok()
            && let Some(session) = self.registry.get_mut(id)
        {
            session.match_id = None;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
