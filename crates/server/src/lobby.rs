//! Lobby aggregator: derives the full lobby view from live state.
//!
//! The lobby snapshot is never stored; it is recomputed from the registry,
//! the matchmaking queue and the active-match table on every membership
//! change and pushed in full to every connected session. Full-snapshot
//! pushes keep late joiners and clients that missed a delta equally
//! consistent without any per-client reconciliation.

use std::collections::HashMap;

use arena_wire::{CombatPair, LobbyPlayer, LobbySnapshot};

use crate::MatchId;
use crate::match_runtime::MatchRuntime;
use crate::matchmaking::MatchQueue;
use crate::session::{Registry, SessionId, Status};

fn lobby_player(registry: &Registry, id: SessionId) -> Option<LobbyPlayer> {
    registry.get(id).map(|s| LobbyPlayer {
        glyph: s.glyph.clone(),
        points: s.points,
    })
}

/// Build the lobby view.
///
/// Ordering is deterministic: searchers appear in queue order, combat pairs
/// in match-creation order, spectators in session order. Sessions whose
/// status does not place them in a specific bucket (idle or spectating)
/// all land in `spectators`; the client renders them as onlookers.
pub fn build_snapshot(
    registry: &Registry,
    queue: &MatchQueue,
    matches: &HashMap<MatchId, MatchRuntime>,
) -> LobbySnapshot {
    let searching = queue
        .iter_sessions()
        .filter_map(|id| lobby_player(registry, id))
        .collect();

    let mut match_ids: Vec<MatchId> = matches.keys().copied().collect();
    match_ids.sort_unstable();
    let in_combat = match_ids
        .into_iter()
        .filter_map(|mid| {
            let runtime = &matches[&mid];
            let [a, b] = runtime.participants;
            Some(CombatPair {
                player1: lobby_player(registry, a)?,
                player2: lobby_player(registry, b)?,
            })
        })
        .collect();

    let mut onlookers: Vec<_> = registry
        .iter()
        .filter(|s| matches!(s.status, Status::Idle | Status::Spectating))
        .collect();
    onlookers.sort_unstable_by_key(|s| s.id);
    let spectators = onlookers
        .into_iter()
        .map(|s| LobbyPlayer {
            glyph: s.glyph.clone(),
            points: s.points,
        })
        .collect();

    LobbySnapshot {
        searching,
        in_combat,
        spectators,
    }
}
