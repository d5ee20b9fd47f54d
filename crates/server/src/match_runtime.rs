//! Per-match runtime state owned by the orchestrator.
//!
//! Wraps the simulation [`Game`] with the binding from participant slots to
//! session ids and the latest-direction input buffer. Input events overwrite
//! any earlier un-applied direction for the same participant; the engine
//! applies at most one buffered direction per snake per tick, which bounds
//! the effect of input bursts server-side.

use arena_sim::{Direction, Game, PlayerSlot};

use crate::MatchId;
use crate::session::SessionId;

/// Lifecycle of a match from the orchestrator's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Constructed; participants not yet notified.
    Starting,
    /// Tick driver running.
    Running,
    /// Terminal outcome reached and participants notified.
    Finished,
}

/// One active match: simulation state plus participant bookkeeping.
#[derive(Debug)]
pub struct MatchRuntime {
    pub id: MatchId,
    /// Session ids in slot order.
    pub participants: [SessionId; 2],
    pub game: Game,
    pub phase: MatchPhase,
    /// Latest pending direction per slot, consumed once per tick.
    pending_inputs: [Option<Direction>; 2],
}

impl MatchRuntime {
    pub fn new(id: MatchId, participants: [SessionId; 2], game: Game) -> Self {
        Self {
            id,
            participants,
            game,
            phase: MatchPhase::Starting,
            pending_inputs: [None, None],
        }
    }

    /// The slot a session controls, if it is a participant.
    pub fn slot_of(&self, session_id: SessionId) -> Option<PlayerSlot> {
        PlayerSlot::BOTH
            .into_iter()
            .find(|slot| self.participants[slot.index()] == session_id)
    }

    /// Overwrite the pending direction for a participant's slot. Returns
    /// `false` if the session is not a participant of this match.
    pub fn buffer_input(&mut self, session_id: SessionId, direction: Direction) -> bool {
        match self.slot_of(session_id) {
            Some(slot) => {
                self.pending_inputs[slot.index()] = Some(direction);
                true
            }
            None => false,
        }
    }

    /// Drain the buffered directions for one tick.
    pub fn take_inputs(&mut self) -> [Option<Direction>; 2] {
        std::mem::take(&mut self.pending_inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_sim::MatchConfig;

    fn runtime() -> MatchRuntime {
        let game = Game::new(MatchConfig::default()).unwrap();
        MatchRuntime::new(1, [10, 20], game)
    }

    #[test]
    fn test_slot_binding() {
        let runtime = runtime();
        assert_eq!(runtime.slot_of(10), Some(PlayerSlot::One));
        assert_eq!(runtime.slot_of(20), Some(PlayerSlot::Two));
        assert_eq!(runtime.slot_of(30), None);
    }

    #[test]
    fn test_latest_input_overwrites_earlier() {
        let mut runtime = runtime();
        assert!(runtime.buffer_input(10, Direction::Up));
        assert!(runtime.buffer_input(10, Direction::Left));
        assert!(runtime.buffer_input(20, Direction::Down));

        // Only the most recent direction per participant survives.
        assert_eq!(
            runtime.take_inputs(),
            [Some(Direction::Left), Some(Direction::Down)]
        );
        // Drained: the next tick has nothing buffered.
        assert_eq!(runtime.take_inputs(), [None, None]);
    }

    #[test]
    fn test_non_participant_input_rejected() {
        let mut runtime = runtime();
        assert!(!runtime.buffer_input(30, Direction::Up));
        assert_eq!(runtime.take_inputs(), [None, None]);
    }
}
